//! CPU count and utilization buckets.

use super::{CycleContext, ResourceCollector, ResourceKind};
use crate::collector::traits::{ProviderError, StatProvider};
use crate::delta::{baseline, cpu_share_factor, cpu_utilization};
use crate::model::{CpuTimes, Metric};
use crate::state::ScalarStore;

/// Emits `cpu_count` every cycle and, when percentages are enabled, the
/// `cpu_*_util` buckets from the aggregate CPU times.
#[derive(Debug)]
pub struct CpuCollector {
    percent: bool,
    cpu_request: Option<String>,
    last: ScalarStore<CpuTimes>,
}

impl CpuCollector {
    /// `cpu_request` is a millicore quota that scales every percentage.
    pub fn new(percent: bool, cpu_request: Option<String>) -> Self {
        Self {
            percent,
            cpu_request,
            last: ScalarStore::new(),
        }
    }
}

impl ResourceCollector for CpuCollector {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Cpu
    }

    fn collect(
        &mut self,
        ctx: &CycleContext<'_>,
        provider: &dyn StatProvider,
    ) -> Result<Vec<Metric>, ProviderError> {
        let ncpus = provider.cpu_count()?;
        let times = if self.percent {
            Some(provider.cpu_times()?)
        } else {
            None
        };

        let mut metrics = vec![ctx.metric("cpu_count", ncpus as f64)];

        let Some(times) = times else {
            return Ok(metrics);
        };

        if let Some((prev, _)) = baseline(self.last.get(), ctx.collect_time) {
            let factor = cpu_share_factor(self.cpu_request.as_deref(), ncpus);
            if let Some(u) = cpu_utilization(prev, &times, factor) {
                metrics.extend([
                    ctx.metric("cpu_util", u.busy),
                    ctx.metric("cpu_wait_util", u.iowait),
                    ctx.metric("cpu_sys_util", u.system),
                    ctx.metric("cpu_user_util", u.user),
                    ctx.metric("cpu_irq_util", u.irq),
                    ctx.metric("cpu_softirq_util", u.softirq),
                    ctx.metric("cpu_nice_util", u.nice),
                    ctx.metric("cpu_steal_util", u.steal),
                    ctx.metric("cpu_guest_util", u.guest),
                    ctx.metric("cpu_guestnice_util", u.guest_nice),
                ]);
            }
        }

        self.last.put(times, ctx.collect_time);
        Ok(metrics)
    }
}
