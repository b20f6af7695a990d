//! Memory and swap usage. Instantaneous values, no state.
//!
//! Memory and swap are queried separately; the collector fails only when
//! both queries do.

use tracing::warn;

use super::{CycleContext, ResourceCollector, ResourceKind};
use crate::collector::traits::{ProviderError, StatProvider};
use crate::model::Metric;

#[derive(Debug, Default)]
pub struct MemCollector;

impl MemCollector {
    pub fn new() -> Self {
        Self
    }
}

impl ResourceCollector for MemCollector {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Mem
    }

    fn collect(
        &mut self,
        ctx: &CycleContext<'_>,
        provider: &dyn StatProvider,
    ) -> Result<Vec<Metric>, ProviderError> {
        let mem = provider.virtual_memory();
        let swap = provider.swap_memory();

        let mut metrics = Vec::with_capacity(7);
        match mem {
            Ok(mem) => metrics.extend([
                ctx.metric("mem_util", mem.used_percent),
                ctx.metric("mem_cache", mem.cached as f64),
                ctx.metric("mem_free", mem.free as f64),
                ctx.metric("mem_available", mem.available as f64),
                ctx.metric("mem_used", mem.used as f64),
                ctx.metric("mem_total", mem.total as f64),
            ]),
            Err(e) if swap.is_err() => return Err(e),
            Err(e) => warn!(error = %e, "failed to read memory usage"),
        }
        match swap {
            Ok(swap) => metrics.push(ctx.metric("mem_swap_util", swap.used_percent)),
            Err(e) => warn!(error = %e, "failed to read swap usage"),
        }
        Ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;
    use crate::collector::procfs::ProcfsProvider;
    use crate::collector::resources::testing::*;

    #[test]
    fn test_memory_metrics_on_first_cycle() {
        let provider = ProcfsProvider::new(MockFs::typical_host(), "/proc");
        let labels = host_labels();

        let metrics = MemCollector::new()
            .collect(&CycleContext::new(at(100), &labels), &provider)
            .unwrap();

        assert_eq!(metrics.len(), 7);
        assert!((value(&metrics, "mem_util").unwrap() - 56.25).abs() < 1e-9);
        assert_eq!(value(&metrics, "mem_total"), Some(16_000_000.0 * 1024.0));
        assert_eq!(value(&metrics, "mem_cache"), Some(2_500_000.0 * 1024.0));
        assert_eq!(value(&metrics, "mem_free"), Some(4_000_000.0 * 1024.0));
        assert_eq!(value(&metrics, "mem_available"), Some(10_000_000.0 * 1024.0));
        assert_eq!(value(&metrics, "mem_used"), Some(9_000_000.0 * 1024.0));
        assert!((value(&metrics, "mem_swap_util").unwrap() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_swap_failure_keeps_memory_metrics() {
        let procfs = ProcfsProvider::new(MockFs::typical_host(), "/proc");
        let provider = FailingProvider {
            inner: &procfs,
            failing: &["swap_memory"],
        };
        let labels = host_labels();

        let metrics = MemCollector::new()
            .collect(&CycleContext::new(at(100), &labels), &provider)
            .unwrap();

        assert_eq!(metrics.len(), 6);
        assert!((value(&metrics, "mem_util").unwrap() - 56.25).abs() < 1e-9);
        assert_eq!(value(&metrics, "mem_swap_util"), None);
    }

    #[test]
    fn test_memory_failure_keeps_swap_metric() {
        let procfs = ProcfsProvider::new(MockFs::typical_host(), "/proc");
        let provider = FailingProvider {
            inner: &procfs,
            failing: &["virtual_memory"],
        };
        let labels = host_labels();

        let metrics = MemCollector::new()
            .collect(&CycleContext::new(at(100), &labels), &provider)
            .unwrap();

        assert_eq!(metrics.len(), 1);
        assert!((value(&metrics, "mem_swap_util").unwrap() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_meminfo_is_error() {
        let provider = ProcfsProvider::new(MockFs::core_only_host(), "/proc");
        let labels = host_labels();
        let result = MemCollector::new().collect(&CycleContext::new(at(100), &labels), &provider);
        assert!(result.is_err());
    }
}
