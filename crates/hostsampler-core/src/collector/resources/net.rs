//! Network interface rates and drop/error ratios.

use super::{CycleContext, ResourceCollector, ResourceKind, TOTAL_DEVICE};
use crate::collector::traits::{ProviderError, StatProvider};
use crate::delta::{baseline, counter_rate, delta, ratio_pct};
use crate::model::{Metric, NetIoCounters};
use crate::state::DeltaStore;

/// Emits `net_*` metrics for every interface and their `total`.
#[derive(Debug)]
pub struct NetCollector {
    interfaces: Vec<String>,
    last: DeltaStore<NetIoCounters>,
}

impl NetCollector {
    /// `interfaces` restricts collection to the named interfaces; empty means all.
    pub fn new(interfaces: Vec<String>) -> Self {
        Self {
            interfaces,
            last: DeltaStore::new(),
        }
    }

    fn emit_interface(
        &self,
        ctx: &CycleContext<'_>,
        curr: &NetIoCounters,
        metrics: &mut Vec<Metric>,
    ) {
        let Some((prev, dt)) = baseline(self.last.get(&curr.name), ctx.collect_time) else {
            return;
        };
        let labels = ctx.labels.with("interface", &curr.name);

        let packets = delta(curr.packets_sent, prev.packets_sent)
            + delta(curr.packets_recv, prev.packets_recv);
        let drops = delta(curr.dropin, prev.dropin) + delta(curr.dropout, prev.dropout);
        let errors = delta(curr.errin, prev.errin) + delta(curr.errout, prev.errout);

        metrics.extend([
            ctx.labeled("net_in", &labels, counter_rate(curr.bytes_recv, prev.bytes_recv, dt)),
            ctx.labeled("net_out", &labels, counter_rate(curr.bytes_sent, prev.bytes_sent, dt)),
            ctx.labeled(
                "net_in_pkt",
                &labels,
                counter_rate(curr.packets_recv, prev.packets_recv, dt),
            ),
            ctx.labeled(
                "net_out_pkt",
                &labels,
                counter_rate(curr.packets_sent, prev.packets_sent, dt),
            ),
            ctx.labeled("net_drop_util", &labels, ratio_pct(drops, packets)),
            ctx.labeled("net_err_util", &labels, ratio_pct(errors, packets)),
        ]);
    }
}

impl ResourceCollector for NetCollector {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Net
    }

    fn collect(
        &mut self,
        ctx: &CycleContext<'_>,
        provider: &dyn StatProvider,
    ) -> Result<Vec<Metric>, ProviderError> {
        let interfaces = provider.net_io_counters(&self.interfaces)?;

        let mut total = NetIoCounters {
            name: TOTAL_DEVICE.to_string(),
            ..Default::default()
        };
        for interface in &interfaces {
            total.accumulate(interface);
        }

        let mut metrics = Vec::new();
        self.emit_interface(ctx, &total, &mut metrics);
        for interface in &interfaces {
            self.emit_interface(ctx, interface, &mut metrics);
        }

        self.last.put(TOTAL_DEVICE, total, ctx.collect_time);
        for interface in interfaces {
            self.last
                .put(interface.name.clone(), interface, ctx.collect_time);
        }
        Ok(metrics)
    }
}
