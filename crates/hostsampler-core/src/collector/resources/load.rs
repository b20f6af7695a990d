//! Load averages and boot time. Always enabled.

use tracing::warn;

use super::{CycleContext, ResourceCollector, ResourceKind};
use crate::collector::traits::{ProviderError, StatProvider};
use crate::model::Metric;

/// Emits `system_load{1,5,15}` and `system_boot_time`.
///
/// Boot time is fetched on the first successful attempt and cached for the
/// lifetime of the collector. It is still emitted when load averages cannot
/// be read.
#[derive(Debug, Default)]
pub struct LoadCollector {
    boot_time: Option<u64>,
}

impl LoadCollector {
    pub fn new() -> Self {
        Self::default()
    }

    fn boot_time(&mut self, provider: &dyn StatProvider) -> Option<u64> {
        if self.boot_time.is_none() {
            match provider.boot_time() {
                Ok(secs) => self.boot_time = Some(secs),
                Err(e) => warn!(error = %e, "failed to read boot time"),
            }
        }
        self.boot_time
    }
}

impl ResourceCollector for LoadCollector {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Core
    }

    fn collect(
        &mut self,
        ctx: &CycleContext<'_>,
        provider: &dyn StatProvider,
    ) -> Result<Vec<Metric>, ProviderError> {
        let load = provider.load_avg();
        let boot_time = self.boot_time(provider);

        let mut metrics = Vec::with_capacity(4);
        match load {
            Ok(load) => metrics.extend([
                ctx.metric("system_load1", load.load1),
                ctx.metric("system_load5", load.load5),
                ctx.metric("system_load15", load.load15),
            ]),
            Err(e) if boot_time.is_none() => return Err(e),
            Err(e) => warn!(error = %e, "failed to read load averages"),
        }
        if let Some(boot_time) = boot_time {
            metrics.push(ctx.metric("system_boot_time", boot_time as f64));
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
    fn test_load_and_boot_time() {
        let provider = ProcfsProvider::new(MockFs::typical_host(), "/proc");
        let labels = host_labels();
        let mut collector = LoadCollector::new();

        let metrics = collector
            .collect(&CycleContext::new(at(100), &labels), &provider)
            .unwrap();

        assert_eq!(metrics.len(), 4);
        assert!((value(&metrics, "system_load1").unwrap() - 0.52).abs() < 1e-9);
        assert!((value(&metrics, "system_load5").unwrap() - 0.41).abs() < 1e-9);
        assert!((value(&metrics, "system_load15").unwrap() - 0.31).abs() < 1e-9);
        assert_eq!(value(&metrics, "system_boot_time"), Some(1_700_000_000.0));
        assert!(metrics.iter().all(|m| m.timestamp == at(100)));
    }

    #[test]
    fn test_boot_time_is_cached() {
        let mut provider = ProcfsProvider::new(MockFs::typical_host(), "/proc");
        let labels = host_labels();
        let mut collector = LoadCollector::new();
        collector
            .collect(&CycleContext::new(at(100), &labels), &provider)
            .unwrap();

        provider
            .fs_mut()
            .add_file("/proc/stat", "cpu 1 1 1 1 1 1 1 0 0 0\nbtime 1800000000\n");
        let metrics = collector
            .collect(&CycleContext::new(at(110), &labels), &provider)
            .unwrap();
        assert_eq!(value(&metrics, "system_boot_time"), Some(1_700_000_000.0));
    }

    #[test]
    fn test_boot_time_failure_is_retried() {
        let mut fs = MockFs::typical_host();
        fs.add_file("/proc/stat", "cpu 1 1 1 1 1 1 1 0 0 0\n");
        let mut provider = ProcfsProvider::new(fs, "/proc");
        let labels = host_labels();
        let mut collector = LoadCollector::new();

        let metrics = collector
            .collect(&CycleContext::new(at(100), &labels), &provider)
            .unwrap();
        assert_eq!(metrics.len(), 3);
        assert_eq!(value(&metrics, "system_boot_time"), None);

        provider
            .fs_mut()
            .add_file("/proc/stat", "cpu 1 1 1 1 1 1 1 0 0 0\nbtime 1700000000\n");
        let metrics = collector
            .collect(&CycleContext::new(at(110), &labels), &provider)
            .unwrap();
        assert_eq!(value(&metrics, "system_boot_time"), Some(1_700_000_000.0));
    }

    #[test]
    fn test_load_failure_keeps_cached_boot_time() {
        let mut provider = ProcfsProvider::new(MockFs::typical_host(), "/proc");
        let labels = host_labels();
        let mut collector = LoadCollector::new();
        collector
            .collect(&CycleContext::new(at(100), &labels), &provider)
            .unwrap();

        provider.fs_mut().remove_file("/proc/loadavg");
        let metrics = collector
            .collect(&CycleContext::new(at(110), &labels), &provider)
            .unwrap();

        assert_eq!(metrics.len(), 1);
        assert_eq!(value(&metrics, "system_boot_time"), Some(1_700_000_000.0));
    }

    #[test]
    fn test_load_and_boot_time_failure_is_error() {
        let mut fs = MockFs::typical_host();
        fs.remove_file("/proc/loadavg");
        fs.remove_file("/proc/stat");
        let provider = ProcfsProvider::new(fs, "/proc");
        let labels = host_labels();

        let result = LoadCollector::new().collect(&CycleContext::new(at(100), &labels), &provider);
        assert!(result.is_err());
    }
}
