//! One collector per resource family.
//!
//! Every collector follows the same cycle: query the provider, aggregate a
//! `total` snapshot where the family is per-device, compute deltas against
//! its own state store, emit metrics, then replace the baselines. A
//! collector returns an error only when it has nothing to emit, and then
//! leaves its state untouched. Failed secondary queries are logged and the
//! remaining metrics still go out.

mod cpu;
mod disk;
mod load;
mod mem;
mod net;
mod openfd;
mod protocol;

use std::fmt;

use chrono::{DateTime, Utc};

use crate::collector::traits::{ProviderError, StatProvider};
use crate::labels::Labels;
use crate::model::Metric;

pub use cpu::CpuCollector;
pub use disk::DiskCollector;
pub use load::LoadCollector;
pub use mem::MemCollector;
pub use net::NetCollector;
pub use openfd::OpenFdCollector;
pub use protocol::ProtocolCollector;

/// Device key of the synthetic aggregate over all devices of a family.
pub const TOTAL_DEVICE: &str = "total";

/// Resource families, in the order a cycle runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Core,
    Cpu,
    Mem,
    Disk,
    Net,
    Protocol,
    OpenFd,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 7] = [
        ResourceKind::Core,
        ResourceKind::Cpu,
        ResourceKind::Mem,
        ResourceKind::Disk,
        ResourceKind::Net,
        ResourceKind::Protocol,
        ResourceKind::OpenFd,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ResourceKind::Core => "core",
            ResourceKind::Cpu => "cpu",
            ResourceKind::Mem => "mem",
            ResourceKind::Disk => "disk",
            ResourceKind::Net => "net",
            ResourceKind::Protocol => "protocol",
            ResourceKind::OpenFd => "openfd",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inputs shared by every collector within one cycle.
#[derive(Debug, Clone, Copy)]
pub struct CycleContext<'a> {
    /// Timestamp of every metric and baseline produced in this cycle.
    pub collect_time: DateTime<Utc>,
    /// Common labels (hostname, ip, static labels).
    pub labels: &'a Labels,
}

impl<'a> CycleContext<'a> {
    pub fn new(collect_time: DateTime<Utc>, labels: &'a Labels) -> Self {
        Self {
            collect_time,
            labels,
        }
    }

    /// Metric tagged with the common labels only.
    pub fn metric(&self, name: &str, value: f64) -> Metric {
        Metric::new(name, self.labels.clone(), self.collect_time, value)
    }

    /// Metric tagged with a prepared label set.
    pub fn labeled(&self, name: &str, labels: &Labels, value: f64) -> Metric {
        Metric::new(name, labels.clone(), self.collect_time, value)
    }
}

/// A resource family sampled once per cycle.
pub trait ResourceCollector {
    fn kind(&self) -> ResourceKind;

    /// Runs one cycle. On error nothing is emitted and state is unchanged.
    fn collect(
        &mut self,
        ctx: &CycleContext<'_>,
        provider: &dyn StatProvider,
    ) -> Result<Vec<Metric>, ProviderError>;
}

#[cfg(test)]
pub(crate) mod testing {
    use chrono::TimeZone;

    use super::*;
    use crate::model::{
        CpuTimes, DiskIoCounters, DiskUsage, FileNr, LoadAvg, NetIoCounters, Partition,
        ProtoCounters, SwapMemory, TcpConnStates, VirtualMemory,
    };

    pub fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    pub fn host_labels() -> Labels {
        [("hostname", "web-1")].into_iter().collect()
    }

    /// Value of the single metric named `name` whose labels contain `key=value`.
    pub fn value_of(metrics: &[Metric], name: &str, key: &str, value: &str) -> Option<f64> {
        metrics
            .iter()
            .find(|m| m.name == name && m.labels.get(key) == Some(value))
            .map(|m| m.value)
    }

    pub fn value(metrics: &[Metric], name: &str) -> Option<f64> {
        metrics.iter().find(|m| m.name == name).map(|m| m.value)
    }

    /// Delegates to `inner` except for the queries named in `failing`.
    pub struct FailingProvider<'a> {
        pub inner: &'a dyn StatProvider,
        pub failing: &'a [&'a str],
    }

    impl FailingProvider<'_> {
        fn check(&self, query: &str) -> Result<(), ProviderError> {
            if self.failing.contains(&query) {
                return Err(ProviderError::Parse(format!("{} unavailable", query)));
            }
            Ok(())
        }
    }

    impl StatProvider for FailingProvider<'_> {
        fn hostname(&self) -> Result<String, ProviderError> {
            self.check("hostname")?;
            self.inner.hostname()
        }

        fn boot_time(&self) -> Result<u64, ProviderError> {
            self.check("boot_time")?;
            self.inner.boot_time()
        }

        fn load_avg(&self) -> Result<LoadAvg, ProviderError> {
            self.check("load_avg")?;
            self.inner.load_avg()
        }

        fn cpu_times(&self) -> Result<CpuTimes, ProviderError> {
            self.check("cpu_times")?;
            self.inner.cpu_times()
        }

        fn cpu_count(&self) -> Result<u32, ProviderError> {
            self.check("cpu_count")?;
            self.inner.cpu_count()
        }

        fn virtual_memory(&self) -> Result<VirtualMemory, ProviderError> {
            self.check("virtual_memory")?;
            self.inner.virtual_memory()
        }

        fn swap_memory(&self) -> Result<SwapMemory, ProviderError> {
            self.check("swap_memory")?;
            self.inner.swap_memory()
        }

        fn disk_io_counters(&self, names: &[String]) -> Result<Vec<DiskIoCounters>, ProviderError> {
            self.check("disk_io_counters")?;
            self.inner.disk_io_counters(names)
        }

        fn partitions(&self) -> Result<Vec<Partition>, ProviderError> {
            self.check("partitions")?;
            self.inner.partitions()
        }

        fn disk_usage(&self, mountpoint: &str) -> Result<DiskUsage, ProviderError> {
            self.check("disk_usage")?;
            self.inner.disk_usage(mountpoint)
        }

        fn net_io_counters(&self, names: &[String]) -> Result<Vec<NetIoCounters>, ProviderError> {
            self.check("net_io_counters")?;
            self.inner.net_io_counters(names)
        }

        fn proto_counters(&self) -> Result<Vec<ProtoCounters>, ProviderError> {
            self.check("proto_counters")?;
            self.inner.proto_counters()
        }

        fn tcp_conn_states(&self) -> Result<TcpConnStates, ProviderError> {
            self.check("tcp_conn_states")?;
            self.inner.tcp_conn_states()
        }

        fn file_nr(&self) -> Result<FileNr, ProviderError> {
            self.check("file_nr")?;
            self.inner.file_nr()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn test_kind_order_and_names() {
        let names: Vec<String> = ResourceKind::ALL.iter().map(|k| k.to_string()).collect();
        assert_eq!(
            names,
            ["core", "cpu", "mem", "disk", "net", "protocol", "openfd"]
        );
        assert!(ResourceKind::Core < ResourceKind::OpenFd);
    }

    #[test]
    fn test_context_metric_uses_common_labels() {
        let labels = host_labels();
        let ctx = CycleContext::new(at(100), &labels);
        let m = ctx.metric("system_load1", 0.5);
        assert_eq!(m.timestamp, at(100));
        assert_eq!(m.labels.to_string(), "hostname=web-1");

        let sda = labels.with("disk", "sda");
        let m = ctx.labeled("disk_rbps", &sda, 1.0);
        assert_eq!(m.labels.get("disk"), Some("sda"));
    }
}
