//! TCP segment counters and socket states.

use super::{CycleContext, ResourceCollector, ResourceKind};
use crate::collector::traits::{ProviderError, StatProvider};
use crate::delta::{baseline, ratio_pct};
use crate::model::{Metric, ProtoCounters};
use crate::state::DeltaStore;

const TCP: &str = "tcp";

/// Emits per-cycle TCP segment deltas and, optionally, socket counts per state.
///
/// Only the `tcp` family of the provider's protocol counters is kept. The
/// segment metrics are raw deltas between two cycles, not per-second rates.
#[derive(Debug)]
pub struct ProtocolCollector {
    tcp_states: bool,
    last: DeltaStore<ProtoCounters>,
}

impl ProtocolCollector {
    pub fn new(tcp_states: bool) -> Self {
        Self {
            tcp_states,
            last: DeltaStore::new(),
        }
    }
}

fn stat_delta(curr: &ProtoCounters, prev: &ProtoCounters, key: &str) -> f64 {
    (curr.stat(key) as i128 - prev.stat(key) as i128) as f64
}

impl ResourceCollector for ProtocolCollector {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Protocol
    }

    fn collect(
        &mut self,
        ctx: &CycleContext<'_>,
        provider: &dyn StatProvider,
    ) -> Result<Vec<Metric>, ProviderError> {
        let protos = provider.proto_counters()?;
        let states = if self.tcp_states {
            Some(provider.tcp_conn_states()?)
        } else {
            None
        };

        let mut metrics = Vec::new();

        if let Some(states) = states {
            for (state, count) in states.entries() {
                metrics.push(ctx.metric(&format!("protocol_tcp_{}", state), count as f64));
            }
        }

        let Some(tcp) = protos.into_iter().find(|p| p.protocol == TCP) else {
            return Ok(metrics);
        };

        if let Some((prev, _)) = baseline(self.last.get(TCP), ctx.collect_time)
            && prev.protocol == tcp.protocol
        {
            let out_segs = stat_delta(&tcp, prev, "OutSegs");
            let in_segs = stat_delta(&tcp, prev, "InSegs");
            let retrans_segs = stat_delta(&tcp, prev, "RetransSegs");

            metrics.extend([
                ctx.metric("protocol_tcp_outsegs", out_segs),
                ctx.metric("protocol_tcp_insegs", in_segs),
                ctx.metric("protocol_tcp_retran_segs", retrans_segs),
                ctx.metric("protocol_tcp_retran_util", ratio_pct(retrans_segs, out_segs)),
            ]);
        }

        self.last.put(TCP, tcp, ctx.collect_time);
        Ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;
    use crate::collector::procfs::ProcfsProvider;
    use crate::collector::resources::testing::*;

    fn snmp(in_segs: i64, out_segs: i64, retrans: i64) -> String {
        format!(
            "\
Tcp: RtoAlgorithm RtoMin RtoMax MaxConn ActiveOpens PassiveOpens InSegs OutSegs RetransSegs
Tcp: 1 200 120000 -1 100 50 {} {} {}
Udp: InDatagrams OutDatagrams
Udp: 300 200
",
            in_segs, out_segs, retrans
        )
    }

    #[test]
    fn test_segment_deltas_and_retransmit_ratio() {
        let mut fs = MockFs::typical_host();
        fs.add_file("/proc/net/snmp", snmp(1000, 100, 2));
        let mut provider = ProcfsProvider::new(fs, "/proc");
        let labels = host_labels();
        let mut collector = ProtocolCollector::new(false);

        let first = collector
            .collect(&CycleContext::new(at(100), &labels), &provider)
            .unwrap();
        assert!(first.is_empty());

        provider.fs_mut().add_file("/proc/net/snmp", snmp(1080, 150, 5));
        let metrics = collector
            .collect(&CycleContext::new(at(110), &labels), &provider)
            .unwrap();

        assert_eq!(metrics.len(), 4);
        assert_eq!(value(&metrics, "protocol_tcp_outsegs"), Some(50.0));
        assert_eq!(value(&metrics, "protocol_tcp_insegs"), Some(80.0));
        assert_eq!(value(&metrics, "protocol_tcp_retran_segs"), Some(3.0));
        let util = value(&metrics, "protocol_tcp_retran_util").unwrap();
        assert!((util - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_outgoing_segments_ratio_is_zero() {
        let mut provider = ProcfsProvider::new(MockFs::typical_host(), "/proc");
        let labels = host_labels();
        let mut collector = ProtocolCollector::new(false);
        collector
            .collect(&CycleContext::new(at(100), &labels), &provider)
            .unwrap();

        provider.fs_mut().add_file("/proc/net/snmp", snmp(20000, 10000, 100));
        let metrics = collector
            .collect(&CycleContext::new(at(110), &labels), &provider)
            .unwrap();
        assert_eq!(value(&metrics, "protocol_tcp_outsegs"), Some(0.0));
        assert_eq!(value(&metrics, "protocol_tcp_retran_util"), Some(0.0));
    }

    #[test]
    fn test_socket_states() {
        let provider = ProcfsProvider::new(MockFs::typical_host(), "/proc");
        let labels = host_labels();
        let mut collector = ProtocolCollector::new(true);

        let metrics = collector
            .collect(&CycleContext::new(at(100), &labels), &provider)
            .unwrap();

        assert_eq!(metrics.len(), 11);
        assert_eq!(value(&metrics, "protocol_tcp_listen"), Some(2.0));
        assert_eq!(value(&metrics, "protocol_tcp_established"), Some(2.0));
        assert_eq!(value(&metrics, "protocol_tcp_time_wait"), Some(1.0));
        assert_eq!(value(&metrics, "protocol_tcp_closing"), Some(0.0));
    }

    #[test]
    fn test_without_tcp_section() {
        let mut fs = MockFs::typical_host();
        fs.add_file("/proc/net/snmp", "Udp: InDatagrams\nUdp: 1\n");
        let provider = ProcfsProvider::new(fs, "/proc");
        let labels = host_labels();
        let mut collector = ProtocolCollector::new(false);

        for secs in [100, 110] {
            let metrics = collector
                .collect(&CycleContext::new(at(secs), &labels), &provider)
                .unwrap();
            assert!(metrics.is_empty());
        }
        assert!(collector.last.is_empty());
    }
}
