//! [`StatProvider`] backed by the Linux `/proc` filesystem.

use std::path::Path;

use crate::collector::procfs::parser::{
    parse_diskstats, parse_file_nr, parse_global_stat, parse_loadavg, parse_meminfo,
    parse_mounts, parse_net_dev, parse_net_snmp, parse_tcp_states,
};
use crate::collector::traits::{FileSystem, ProviderError, StatProvider};
use crate::model::{
    CpuTimes, DiskIoCounters, DiskUsage, FileNr, LoadAvg, NetIoCounters, Partition,
    ProtoCounters, SwapMemory, TcpConnStates, VirtualMemory,
};

/// Clock ticks per second used by `/proc/stat` (USER_HZ).
pub const CLK_TCK: f64 = 100.0;

/// `/proc/diskstats` sector size in bytes, independent of the device.
pub const SECTOR_SIZE: u64 = 512;

/// Reads host statistics from `/proc`.
pub struct ProcfsProvider<F: FileSystem> {
    fs: F,
    proc_path: String,
}

impl<F: FileSystem> ProcfsProvider<F> {
    /// Creates a provider.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    pub fn new(fs: F, proc_path: impl Into<String>) -> Self {
        Self {
            fs,
            proc_path: proc_path.into(),
        }
    }

    /// Gives mutable access to the filesystem, used by tests to advance mock counters.
    pub fn fs_mut(&mut self) -> &mut F {
        &mut self.fs
    }

    fn read(&self, relative: &str) -> Result<String, ProviderError> {
        let path = format!("{}/{}", self.proc_path, relative);
        Ok(self.fs.read_to_string(Path::new(&path))?)
    }

    fn exists(&self, relative: &str) -> bool {
        let path = format!("{}/{}", self.proc_path, relative);
        self.fs.exists(Path::new(&path))
    }
}

fn selected(names: &[String], name: &str) -> bool {
    names.is_empty() || names.iter().any(|n| n == name)
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        100.0 * part as f64 / whole as f64
    }
}

impl<F: FileSystem> StatProvider for ProcfsProvider<F> {
    fn hostname(&self) -> Result<String, ProviderError> {
        let name = self.read("sys/kernel/hostname")?.trim().to_string();
        if name.is_empty() {
            return Err(ProviderError::Parse("empty hostname".into()));
        }
        Ok(name)
    }

    fn boot_time(&self) -> Result<u64, ProviderError> {
        let stat = parse_global_stat(&self.read("stat")?)?;
        if stat.btime == 0 {
            return Err(ProviderError::Parse("missing btime in stat".into()));
        }
        Ok(stat.btime)
    }

    fn load_avg(&self) -> Result<LoadAvg, ProviderError> {
        let info = parse_loadavg(&self.read("loadavg")?)?;
        Ok(LoadAvg {
            load1: info.load1,
            load5: info.load5,
            load15: info.load15,
        })
    }

    fn cpu_times(&self) -> Result<CpuTimes, ProviderError> {
        let stat = parse_global_stat(&self.read("stat")?)?;
        let cpu = stat
            .aggregate()
            .ok_or_else(|| ProviderError::Parse("missing cpu line in stat".into()))?;

        let secs = |jiffies: u64| jiffies as f64 / CLK_TCK;
        Ok(CpuTimes {
            user: secs(cpu.user),
            nice: secs(cpu.nice),
            system: secs(cpu.system),
            idle: secs(cpu.idle),
            iowait: secs(cpu.iowait),
            irq: secs(cpu.irq),
            softirq: secs(cpu.softirq),
            steal: secs(cpu.steal),
            guest: secs(cpu.guest),
            guest_nice: secs(cpu.guest_nice),
        })
    }

    fn cpu_count(&self) -> Result<u32, ProviderError> {
        let stat = parse_global_stat(&self.read("stat")?)?;
        match stat.core_count() {
            0 => Err(ProviderError::Parse("no per-cpu lines in stat".into())),
            n => Ok(n),
        }
    }

    fn virtual_memory(&self) -> Result<VirtualMemory, ProviderError> {
        let info = parse_meminfo(&self.read("meminfo")?)?;

        let total = info.mem_total * 1024;
        let free = info.mem_free * 1024;
        let buffers = info.buffers * 1024;
        let cached = (info.cached + info.s_reclaimable) * 1024;
        let used = total
            .saturating_sub(free)
            .saturating_sub(buffers)
            .saturating_sub(cached);

        Ok(VirtualMemory {
            total,
            available: info.mem_available * 1024,
            used,
            free,
            cached,
            buffers,
            used_percent: percent(used, total),
        })
    }

    fn swap_memory(&self) -> Result<SwapMemory, ProviderError> {
        let info = parse_meminfo(&self.read("meminfo")?)?;

        let total = info.swap_total * 1024;
        let free = info.swap_free * 1024;
        let used = total.saturating_sub(free);

        Ok(SwapMemory {
            total,
            used,
            free,
            used_percent: percent(used, total),
        })
    }

    fn disk_io_counters(&self, names: &[String]) -> Result<Vec<DiskIoCounters>, ProviderError> {
        let disks = parse_diskstats(&self.read("diskstats")?)?;

        Ok(disks
            .into_iter()
            .filter(|d| selected(names, &d.device))
            .map(|d| DiskIoCounters {
                name: d.device,
                read_count: d.reads,
                write_count: d.writes,
                read_bytes: d.read_sectors * SECTOR_SIZE,
                write_bytes: d.write_sectors * SECTOR_SIZE,
                read_time: d.read_time,
                write_time: d.write_time,
                iops_in_progress: d.io_in_progress,
                io_time: d.io_time,
            })
            .collect())
    }

    fn partitions(&self) -> Result<Vec<Partition>, ProviderError> {
        Ok(parse_mounts(&self.read("self/mounts")?)
            .into_iter()
            .map(|m| Partition {
                device: m.source,
                mountpoint: m.mountpoint,
                fs_type: m.fs_type,
            })
            .collect())
    }

    /// `mountpoint` is a host path, not relative to the proc root.
    fn disk_usage(&self, mountpoint: &str) -> Result<DiskUsage, ProviderError> {
        let st = self.fs.statvfs(Path::new(mountpoint))?;

        let total = st.blocks * st.block_size;
        let free = st.blocks_available * st.block_size;
        let used = st.blocks.saturating_sub(st.blocks_free) * st.block_size;
        let inodes_used = st.files.saturating_sub(st.files_free);

        Ok(DiskUsage {
            mountpoint: mountpoint.to_string(),
            total,
            used,
            free,
            used_percent: percent(used, used + free),
            inodes_total: st.files,
            inodes_used,
            inodes_free: st.files_free,
            inodes_used_percent: percent(inodes_used, st.files),
        })
    }

    fn net_io_counters(&self, names: &[String]) -> Result<Vec<NetIoCounters>, ProviderError> {
        let devices = parse_net_dev(&self.read("net/dev")?)?;

        Ok(devices
            .into_iter()
            .filter(|d| selected(names, &d.interface))
            .map(|d| NetIoCounters {
                name: d.interface,
                bytes_sent: d.tx_bytes,
                bytes_recv: d.rx_bytes,
                packets_sent: d.tx_packets,
                packets_recv: d.rx_packets,
                errin: d.rx_errs,
                errout: d.tx_errs,
                dropin: d.rx_drop,
                dropout: d.tx_drop,
                fifoin: d.rx_fifo,
                fifoout: d.tx_fifo,
            })
            .collect())
    }

    fn proto_counters(&self) -> Result<Vec<ProtoCounters>, ProviderError> {
        Ok(parse_net_snmp(&self.read("net/snmp")?)?
            .into_iter()
            .map(|s| ProtoCounters {
                protocol: s.prefix.to_lowercase(),
                stats: s.values,
            })
            .collect())
    }

    fn tcp_conn_states(&self) -> Result<TcpConnStates, ProviderError> {
        let mut states = TcpConnStates::default();
        parse_tcp_states(&self.read("net/tcp")?, &mut states);
        // IPv6 may be disabled on the host.
        if self.exists("net/tcp6") {
            parse_tcp_states(&self.read("net/tcp6")?, &mut states);
        }
        Ok(states)
    }

    fn file_nr(&self) -> Result<FileNr, ProviderError> {
        let nr = parse_file_nr(&self.read("sys/fs/file-nr")?)?;
        Ok(FileNr {
            allocated: nr.allocated,
            unused: nr.unused,
            max: nr.max,
        })
    }
}
