//! Parsers for `/proc` filesystem files.
//!
//! These are pure functions that parse the content of various `/proc` files
//! into structured data. They are designed to be easily testable with string inputs.

use std::collections::BTreeMap;

use crate::model::TcpConnStates;

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

// ============ Load Average Parser ============

/// Parsed data from `/proc/loadavg`.
#[derive(Debug, Clone, Default)]
pub struct LoadAvgStat {
    pub load1: f64,
    pub load5: f64,
    pub load15: f64,
    pub running: u32,
    pub total: u32,
}

/// Parses `/proc/loadavg` content.
///
/// Format: `load1 load5 load15 running/total last_pid`
pub fn parse_loadavg(content: &str) -> Result<LoadAvgStat, ParseError> {
    let parts: Vec<&str> = content.split_whitespace().collect();
    if parts.len() < 4 {
        return Err(ParseError::new("invalid loadavg format"));
    }

    let load1 = parts[0]
        .parse()
        .map_err(|_| ParseError::new("invalid load1"))?;
    let load5 = parts[1]
        .parse()
        .map_err(|_| ParseError::new("invalid load5"))?;
    let load15 = parts[2]
        .parse()
        .map_err(|_| ParseError::new("invalid load15"))?;

    let (running, total) = if let Some((r, t)) = parts[3].split_once('/') {
        (r.parse().unwrap_or(0), t.parse().unwrap_or(0))
    } else {
        (0, 0)
    };

    Ok(LoadAvgStat {
        load1,
        load5,
        load15,
        running,
        total,
    })
}

// ============ Global Stat Parser ============

/// Single CPU line from `/proc/stat`, in jiffies.
#[derive(Debug, Clone, Default)]
pub struct CpuStat {
    pub cpu_id: Option<u32>, // None for aggregate "cpu" line
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
    pub guest: u64,
    pub guest_nice: u64,
}

/// CPU lines and boot time from `/proc/stat`.
#[derive(Debug, Clone, Default)]
pub struct GlobalStat {
    pub cpus: Vec<CpuStat>,
    pub btime: u64,
}

impl GlobalStat {
    /// The aggregate `cpu` line, if present.
    pub fn aggregate(&self) -> Option<&CpuStat> {
        self.cpus.iter().find(|c| c.cpu_id.is_none())
    }

    /// Number of per-core `cpuN` lines.
    pub fn core_count(&self) -> u32 {
        self.cpus.iter().filter(|c| c.cpu_id.is_some()).count() as u32
    }
}

/// Parses `/proc/stat` content.
pub fn parse_global_stat(content: &str) -> Result<GlobalStat, ParseError> {
    let mut stat = GlobalStat::default();

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        if parts[0].starts_with("cpu") {
            let cpu_id = if parts[0] == "cpu" {
                None
            } else {
                match parts[0].strip_prefix("cpu").and_then(|s| s.parse().ok()) {
                    Some(id) => Some(id),
                    None => continue,
                }
            };

            let get_val =
                |idx: usize| -> u64 { parts.get(idx).and_then(|s| s.parse().ok()).unwrap_or(0) };

            stat.cpus.push(CpuStat {
                cpu_id,
                user: get_val(1),
                nice: get_val(2),
                system: get_val(3),
                idle: get_val(4),
                iowait: get_val(5),
                irq: get_val(6),
                softirq: get_val(7),
                steal: get_val(8),
                guest: get_val(9),
                guest_nice: get_val(10),
            });
        } else if parts[0] == "btime" {
            stat.btime = parts.get(1).and_then(|s| s.parse().ok()).unwrap_or(0);
        }
    }

    Ok(stat)
}

// ============ Meminfo Parser ============

/// Parsed data from `/proc/meminfo`, in kB.
#[derive(Debug, Clone, Default)]
pub struct MemInfo {
    pub mem_total: u64,
    pub mem_free: u64,
    pub mem_available: u64,
    pub buffers: u64,
    pub cached: u64,
    pub s_reclaimable: u64,
    pub swap_total: u64,
    pub swap_free: u64,
}

/// Parses `/proc/meminfo` content.
pub fn parse_meminfo(content: &str) -> Result<MemInfo, ParseError> {
    let mut info = MemInfo::default();
    let mut seen_total = false;

    for line in content.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let value: u64 = rest
            .split_whitespace()
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);

        match key.trim() {
            "MemTotal" => {
                info.mem_total = value;
                seen_total = true;
            }
            "MemFree" => info.mem_free = value,
            "MemAvailable" => info.mem_available = value,
            "Buffers" => info.buffers = value,
            "Cached" => info.cached = value,
            "SReclaimable" => info.s_reclaimable = value,
            "SwapTotal" => info.swap_total = value,
            "SwapFree" => info.swap_free = value,
            _ => {}
        }
    }

    if !seen_total {
        return Err(ParseError::new("missing MemTotal in meminfo"));
    }
    Ok(info)
}

// ============ Disk Stats Parser ============

/// Parsed data from `/proc/diskstats`.
#[derive(Debug, Clone, Default)]
pub struct DiskStats {
    /// Device name (sda, nvme0n1, etc.)
    pub device: String,
    /// Number of reads completed
    pub reads: u64,
    /// Number of sectors read
    pub read_sectors: u64,
    /// Time spent reading (ms)
    pub read_time: u64,
    /// Number of writes completed
    pub writes: u64,
    /// Number of sectors written
    pub write_sectors: u64,
    /// Time spent writing (ms)
    pub write_time: u64,
    /// Number of I/Os currently in progress
    pub io_in_progress: u64,
    /// Time spent doing I/Os (ms)
    pub io_time: u64,
}

/// Parses `/proc/diskstats` content.
///
/// Format: major minor name reads r_merged r_sectors r_time writes w_merged w_sectors w_time io_pending io_time w_io_time [discards ...]
pub fn parse_diskstats(content: &str) -> Result<Vec<DiskStats>, ParseError> {
    let mut disks = Vec::new();

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 14 {
            continue; // Skip malformed lines
        }

        let get_val =
            |idx: usize| -> u64 { parts.get(idx).and_then(|s| s.parse().ok()).unwrap_or(0) };

        disks.push(DiskStats {
            device: parts[2].to_string(),
            reads: get_val(3),
            read_sectors: get_val(5),
            read_time: get_val(6),
            writes: get_val(7),
            write_sectors: get_val(9),
            write_time: get_val(10),
            io_in_progress: get_val(11),
            io_time: get_val(12),
        });
    }

    Ok(disks)
}

// ============ Mounts Parser ============

/// One line of `/proc/self/mounts`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MountEntry {
    pub source: String,
    pub mountpoint: String,
    pub fs_type: String,
}

/// Parses `/proc/self/mounts` content.
///
/// Format: `source mountpoint fstype options dump pass`, with spaces and
/// other special characters escaped as octal (`\040`).
pub fn parse_mounts(content: &str) -> Vec<MountEntry> {
    content
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let source = parts.next()?;
            let mountpoint = parts.next()?;
            let fs_type = parts.next()?;
            Some(MountEntry {
                source: unescape_octal(source),
                mountpoint: unescape_octal(mountpoint),
                fs_type: fs_type.to_string(),
            })
        })
        .collect()
}

/// Decodes `\NNN` octal escapes used by the kernel in mount tables.
fn unescape_octal(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\'
            && i + 3 < bytes.len()
            && bytes[i + 1..i + 4].iter().all(|b| (b'0'..=b'7').contains(b))
        {
            let code = (bytes[i + 1] - b'0') as u32 * 64
                + (bytes[i + 2] - b'0') as u32 * 8
                + (bytes[i + 3] - b'0') as u32;
            if let Ok(b) = u8::try_from(code) {
                out.push(b);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

// ============ Network Device Stats Parser ============

/// Parsed data from `/proc/net/dev`.
#[derive(Debug, Clone, Default)]
pub struct NetDevStats {
    /// Interface name (eth0, lo, etc.)
    pub interface: String,
    pub rx_bytes: u64,
    pub rx_packets: u64,
    pub rx_errs: u64,
    pub rx_drop: u64,
    pub rx_fifo: u64,
    pub tx_bytes: u64,
    pub tx_packets: u64,
    pub tx_errs: u64,
    pub tx_drop: u64,
    pub tx_fifo: u64,
}

/// Parses `/proc/net/dev` content.
///
/// Format:
/// Inter-|   Receive                                                |  Transmit
///  face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
///    lo: 1234567     1234    0    0    0     0          0         0  1234567     1234    0    0    0     0       0          0
pub fn parse_net_dev(content: &str) -> Result<Vec<NetDevStats>, ParseError> {
    let mut devices = Vec::new();

    for line in content.lines() {
        // Skip header lines
        if line.contains('|') || line.trim().is_empty() {
            continue;
        }

        let Some((name, counters)) = line.split_once(':') else {
            continue;
        };

        let values: Vec<&str> = counters.split_whitespace().collect();
        if values.len() < 16 {
            continue;
        }

        let get_val =
            |idx: usize| -> u64 { values.get(idx).and_then(|s| s.parse().ok()).unwrap_or(0) };

        devices.push(NetDevStats {
            interface: name.trim().to_string(),
            rx_bytes: get_val(0),
            rx_packets: get_val(1),
            rx_errs: get_val(2),
            rx_drop: get_val(3),
            rx_fifo: get_val(4),
            tx_bytes: get_val(8),
            tx_packets: get_val(9),
            tx_errs: get_val(10),
            tx_drop: get_val(11),
            tx_fifo: get_val(12),
        });
    }

    Ok(devices)
}

// ============ Network SNMP Parser ============

/// One protocol section of `/proc/net/snmp`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnmpSection {
    /// Section prefix without the colon (`Ip`, `Tcp`, `Udp`, ...).
    pub prefix: String,
    pub values: BTreeMap<String, i64>,
}

/// Parses `/proc/net/snmp` content.
///
/// Format: Each protocol has two lines - keys and values
/// Tcp: key1 key2 key3...
/// Tcp: val1 val2 val3...
///
/// Values are signed: `Tcp: MaxConn` is -1 on Linux.
pub fn parse_net_snmp(content: &str) -> Result<Vec<SnmpSection>, ParseError> {
    let mut sections = Vec::new();
    let lines: Vec<&str> = content.lines().collect();

    let mut i = 0;
    while i + 1 < lines.len() {
        let key_parts: Vec<&str> = lines[i].split_whitespace().collect();
        let val_parts: Vec<&str> = lines[i + 1].split_whitespace().collect();

        if key_parts.is_empty() || val_parts.is_empty() || key_parts[0] != val_parts[0] {
            i += 1;
            continue;
        }

        let prefix = key_parts[0].trim_end_matches(':').to_string();
        let values = key_parts[1..]
            .iter()
            .zip(&val_parts[1..])
            .map(|(key, val)| (key.to_string(), val.parse().unwrap_or(0)))
            .collect();

        sections.push(SnmpSection { prefix, values });
        i += 2;
    }

    if sections.is_empty() && !content.trim().is_empty() {
        return Err(ParseError::new("no protocol sections in snmp"));
    }
    Ok(sections)
}

// ============ TCP Socket Table Parser ============

/// Counts sockets per state from `/proc/net/tcp` or `/proc/net/tcp6` into `states`.
///
/// Format (after a header line):
/// `sl local_address rem_address st tx_queue:rx_queue ...` where `st` is hex.
pub fn parse_tcp_states(content: &str, states: &mut TcpConnStates) {
    for line in content.lines().skip(1) {
        let Some(st) = line.split_whitespace().nth(3) else {
            continue;
        };
        if let Ok(code) = u8::from_str_radix(st, 16) {
            states.record(code);
        }
    }
}

// ============ File Handle Parser ============

/// Parsed data from `/proc/sys/fs/file-nr`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileNrStat {
    pub allocated: u64,
    pub unused: u64,
    pub max: u64,
}

/// Parses `/proc/sys/fs/file-nr` content.
///
/// Format: `allocated unused max`
pub fn parse_file_nr(content: &str) -> Result<FileNrStat, ParseError> {
    let values: Vec<u64> = content
        .split_whitespace()
        .map(|s| s.parse().map_err(|_| ParseError::new("invalid file-nr value")))
        .collect::<Result<_, _>>()?;

    match values.as_slice() {
        [allocated, unused, max, ..] => Ok(FileNrStat {
            allocated: *allocated,
            unused: *unused,
            max: *max,
        }),
        _ => Err(ParseError::new("invalid file-nr format")),
    }
}
