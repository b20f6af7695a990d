//! Data model: raw OS counter snapshots and the metrics derived from them.

mod metric;
mod system;

pub use metric::Metric;
pub use system::{
    CpuTimes, DiskIoCounters, DiskUsage, FileNr, LoadAvg, NetIoCounters, Partition,
    ProtoCounters, SwapMemory, TcpConnStates, VirtualMemory,
};
