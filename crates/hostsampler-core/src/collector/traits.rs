//! Seams between the sampler and the operating system.
//!
//! - [`FileSystem`] lets the `/proc` provider read from the real filesystem
//!   or from an in-memory mock, including `statvfs(3)` of mountpoints.
//! - [`StatProvider`] is the OS statistics interface the resource collectors
//!   consume. Each query is synchronous and either returns a complete
//!   snapshot or an explicit error.

use std::fmt;
use std::io;
use std::path::Path;

use crate::collector::procfs::parser::ParseError;
use crate::model::{
    CpuTimes, DiskIoCounters, DiskUsage, FileNr, LoadAvg, NetIoCounters, Partition,
    ProtoCounters, SwapMemory, TcpConnStates, VirtualMemory,
};

/// Abstraction for filesystem operations.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Checks if a path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Capacity of the filesystem mounted at `path`.
    fn statvfs(&self, path: &Path) -> io::Result<FsStat>;
}

/// Raw `statvfs(3)` counters. Block counts are in units of `block_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FsStat {
    pub block_size: u64,
    pub blocks: u64,
    pub blocks_free: u64,
    /// Free blocks available to unprivileged users.
    pub blocks_available: u64,
    pub files: u64,
    pub files_free: u64,
}

/// Real filesystem implementation that delegates to `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn statvfs(&self, path: &Path) -> io::Result<FsStat> {
        let st = nix::sys::statvfs::statvfs(path)?;
        Ok(FsStat {
            block_size: st.fragment_size() as u64,
            blocks: st.blocks() as u64,
            blocks_free: st.blocks_free() as u64,
            blocks_available: st.blocks_available() as u64,
            files: st.files() as u64,
            files_free: st.files_free() as u64,
        })
    }
}

/// Error returned by a [`StatProvider`] query.
#[derive(Debug)]
pub enum ProviderError {
    /// Reading the underlying source failed.
    Io(io::Error),
    /// The source was read but its content is unusable.
    Parse(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Io(e) => write!(f, "I/O error: {}", e),
            ProviderError::Parse(msg) => write!(f, "parse error: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

impl From<io::Error> for ProviderError {
    fn from(e: io::Error) -> Self {
        ProviderError::Io(e)
    }
}

impl From<ParseError> for ProviderError {
    fn from(e: ParseError) -> Self {
        ProviderError::Parse(e.message)
    }
}

/// Best-effort OS statistics snapshots.
pub trait StatProvider {
    /// Host name used for the `hostname` label.
    fn hostname(&self) -> Result<String, ProviderError>;

    /// Boot time in seconds since the Unix epoch.
    fn boot_time(&self) -> Result<u64, ProviderError>;

    fn load_avg(&self) -> Result<LoadAvg, ProviderError>;

    /// Aggregate CPU times across all cores.
    fn cpu_times(&self) -> Result<CpuTimes, ProviderError>;

    /// Number of logical CPUs.
    fn cpu_count(&self) -> Result<u32, ProviderError>;

    fn virtual_memory(&self) -> Result<VirtualMemory, ProviderError>;

    fn swap_memory(&self) -> Result<SwapMemory, ProviderError>;

    /// Per-device block I/O counters, restricted to `names` unless empty.
    fn disk_io_counters(&self, names: &[String]) -> Result<Vec<DiskIoCounters>, ProviderError>;

    /// Mounted filesystems.
    fn partitions(&self) -> Result<Vec<Partition>, ProviderError>;

    /// Space and inode usage of the filesystem mounted at `mountpoint`.
    fn disk_usage(&self, mountpoint: &str) -> Result<DiskUsage, ProviderError>;

    /// Per-interface counters, restricted to `names` unless empty.
    fn net_io_counters(&self, names: &[String]) -> Result<Vec<NetIoCounters>, ProviderError>;

    /// SNMP counters for every protocol the kernel reports.
    fn proto_counters(&self) -> Result<Vec<ProtoCounters>, ProviderError>;

    /// TCP socket counts per connection state (IPv4 and IPv6).
    fn tcp_conn_states(&self) -> Result<TcpConnStates, ProviderError>;

    fn file_nr(&self) -> Result<FileNr, ProviderError>;
}
