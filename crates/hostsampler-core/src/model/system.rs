//! Host-wide counter snapshots collected from the OS statistics provider.
//!
//! Each structure is an immutable capture of raw counters at one instant.
//! Cumulative counters only make sense as deltas between two captures;
//! instantaneous values (load, memory sizes) are emitted as-is.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// System load averages.
///
/// Source: `/proc/loadavg` fields 1-3
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct LoadAvg {
    pub load1: f64,
    pub load5: f64,
    pub load15: f64,
}

/// Aggregate CPU time counters.
///
/// Source: first (`cpu`) line of `/proc/stat`
///
/// Values are cumulative seconds since boot (jiffies / USER_HZ).
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct CpuTimes {
    /// Time spent in user mode.
    pub user: f64,
    /// Time spent in user mode with low priority.
    pub nice: f64,
    /// Time spent in kernel mode.
    pub system: f64,
    /// Time spent idle.
    pub idle: f64,
    /// Time waiting for I/O to complete.
    pub iowait: f64,
    /// Time servicing hardware interrupts.
    pub irq: f64,
    /// Time servicing software interrupts.
    pub softirq: f64,
    /// Time stolen by the hypervisor for other guests.
    pub steal: f64,
    /// Time spent running a guest OS.
    pub guest: f64,
    /// Time spent running a niced guest OS.
    pub guest_nice: f64,
}

impl CpuTimes {
    /// Time the CPU was doing work.
    pub fn busy(&self) -> f64 {
        self.guest_nice
            + self.guest
            + self.nice
            + self.softirq
            + self.irq
            + self.user
            + self.system
    }

    /// Busy time plus idle, iowait and steal.
    pub fn total(&self) -> f64 {
        self.busy() + self.idle + self.iowait + self.steal
    }
}

/// Virtual memory usage.
///
/// Source: `/proc/meminfo`
///
/// All sizes are in bytes.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct VirtualMemory {
    /// Total usable RAM (`MemTotal`).
    pub total: u64,
    /// Memory available for new allocations without swapping (`MemAvailable`).
    pub available: u64,
    /// `total - free - buffers - cached`.
    pub used: u64,
    /// Completely unused memory (`MemFree`).
    pub free: u64,
    /// Page cache plus reclaimable slab (`Cached + SReclaimable`).
    pub cached: u64,
    /// Block device buffers (`Buffers`).
    pub buffers: u64,
    /// `100 * used / total`.
    pub used_percent: f64,
}

/// Swap usage.
///
/// Source: `SwapTotal`/`SwapFree` in `/proc/meminfo`
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct SwapMemory {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub used_percent: f64,
}

/// Block device I/O counters.
///
/// Source: `/proc/diskstats`
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct DiskIoCounters {
    /// Device name (sda, nvme0n1, ...). Empty for aggregates.
    pub name: String,
    /// Reads completed.
    pub read_count: u64,
    /// Writes completed.
    pub write_count: u64,
    /// Bytes read (sectors * 512).
    pub read_bytes: u64,
    /// Bytes written (sectors * 512).
    pub write_bytes: u64,
    /// Time spent reading (ms).
    pub read_time: u64,
    /// Time spent writing (ms).
    pub write_time: u64,
    /// I/Os currently in flight.
    pub iops_in_progress: u64,
    /// Time the device had I/O in flight (ms).
    pub io_time: u64,
}

impl DiskIoCounters {
    /// Adds the raw counters of `other` into `self`. The name is left untouched.
    pub fn accumulate(&mut self, other: &DiskIoCounters) {
        self.read_count += other.read_count;
        self.write_count += other.write_count;
        self.read_bytes += other.read_bytes;
        self.write_bytes += other.write_bytes;
        self.read_time += other.read_time;
        self.write_time += other.write_time;
        self.iops_in_progress += other.iops_in_progress;
        self.io_time += other.io_time;
    }
}

/// A mounted filesystem.
///
/// Source: `/proc/self/mounts`
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct Partition {
    /// Mount source, e.g. `/dev/sda1`.
    pub device: String,
    pub mountpoint: String,
    pub fs_type: String,
}

/// Space and inode usage of one mounted filesystem. Instantaneous.
///
/// Source: `statvfs(3)` on the mountpoint
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct DiskUsage {
    pub mountpoint: String,
    /// Bytes.
    pub total: u64,
    pub used: u64,
    /// Bytes available to unprivileged users.
    pub free: u64,
    /// `used / (used + free)`, so reserved blocks do not count as free.
    pub used_percent: f64,
    pub inodes_total: u64,
    pub inodes_used: u64,
    pub inodes_free: u64,
    pub inodes_used_percent: f64,
}

/// Network interface counters.
///
/// Source: `/proc/net/dev`
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct NetIoCounters {
    /// Interface name (eth0, lo, ...). Empty for aggregates.
    pub name: String,
    pub bytes_sent: u64,
    pub bytes_recv: u64,
    pub packets_sent: u64,
    pub packets_recv: u64,
    pub errin: u64,
    pub errout: u64,
    pub dropin: u64,
    pub dropout: u64,
    pub fifoin: u64,
    pub fifoout: u64,
}

impl NetIoCounters {
    /// Adds the raw counters of `other` into `self`. The name is left untouched.
    pub fn accumulate(&mut self, other: &NetIoCounters) {
        self.bytes_sent += other.bytes_sent;
        self.bytes_recv += other.bytes_recv;
        self.packets_sent += other.packets_sent;
        self.packets_recv += other.packets_recv;
        self.errin += other.errin;
        self.errout += other.errout;
        self.dropin += other.dropin;
        self.dropout += other.dropout;
        self.fifoin += other.fifoin;
        self.fifoout += other.fifoout;
    }
}

/// Per-protocol SNMP counters.
///
/// Source: `/proc/net/snmp` (one entry per `Ip:`, `Tcp:`, `Udp:`, ... section)
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct ProtoCounters {
    /// Lower-case protocol name (`ip`, `tcp`, `udp`, ...).
    pub protocol: String,
    /// Counter name as printed by the kernel (`InSegs`, `RetransSegs`, ...).
    pub stats: BTreeMap<String, i64>,
}

impl ProtoCounters {
    /// Returns a counter value, 0 when the kernel does not report it.
    pub fn stat(&self, key: &str) -> i64 {
        self.stats.get(key).copied().unwrap_or(0)
    }
}

/// Number of TCP sockets per connection state.
///
/// Source: `st` column of `/proc/net/tcp` and `/proc/net/tcp6`
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct TcpConnStates {
    pub established: u64,
    pub syn_sent: u64,
    pub syn_recv: u64,
    pub fin_wait1: u64,
    pub fin_wait2: u64,
    pub time_wait: u64,
    pub close: u64,
    pub close_wait: u64,
    pub last_ack: u64,
    pub listen: u64,
    pub closing: u64,
}

impl TcpConnStates {
    /// Counts one socket in the kernel state `code` (see `include/net/tcp_states.h`).
    /// Unknown codes are ignored.
    pub fn record(&mut self, code: u8) {
        let slot = match code {
            0x01 => &mut self.established,
            0x02 => &mut self.syn_sent,
            0x03 => &mut self.syn_recv,
            0x04 => &mut self.fin_wait1,
            0x05 => &mut self.fin_wait2,
            0x06 => &mut self.time_wait,
            0x07 => &mut self.close,
            0x08 => &mut self.close_wait,
            0x09 => &mut self.last_ack,
            0x0A => &mut self.listen,
            0x0B => &mut self.closing,
            _ => return,
        };
        *slot += 1;
    }

    /// `(state name, count)` pairs in kernel state order.
    pub fn entries(&self) -> [(&'static str, u64); 11] {
        [
            ("established", self.established),
            ("syn_sent", self.syn_sent),
            ("syn_recv", self.syn_recv),
            ("fin_wait1", self.fin_wait1),
            ("fin_wait2", self.fin_wait2),
            ("time_wait", self.time_wait),
            ("close", self.close),
            ("close_wait", self.close_wait),
            ("last_ack", self.last_ack),
            ("listen", self.listen),
            ("closing", self.closing),
        ]
    }
}

/// System-wide file handle usage.
///
/// Source: `/proc/sys/fs/file-nr`
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct FileNr {
    pub allocated: u64,
    pub unused: u64,
    pub max: u64,
}
