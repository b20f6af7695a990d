//! Pre-built mock filesystem scenarios for testing.
//!
//! These scenarios provide realistic `/proc` states for a small host with
//! two disks and one network interface.

use super::filesystem::MockFs;
use crate::collector::traits::FsStat;

impl MockFs {
    /// Creates a typical host: 4 CPUs, 16 GB RAM, disks `sda` (root on `sda1`)
    /// and `sdb` (mounted as XFS on `/data`), interface `eth0` plus loopback.
    /// Only `/` and `/data` report filesystem capacity.
    pub fn typical_host() -> Self {
        let mut fs = Self::new();

        fs.add_file("/proc/sys/kernel/hostname", "web-1\n");
        fs.add_file("/proc/loadavg", "0.52 0.41 0.31 2/300 4242\n");
        fs.add_file(
            "/proc/stat",
            "\
cpu  10000 500 3000 80000 1000 200 100 0 0 0
cpu0 2500 125 750 20000 250 50 25 0 0 0
cpu1 2500 125 750 20000 250 50 25 0 0 0
cpu2 2500 125 750 20000 250 50 25 0 0 0
cpu3 2500 125 750 20000 250 50 25 0 0 0
intr 1000000 50 0 0 0 0 0 0 0 1 0 0 0 100 0 0 1000
ctxt 500000
btime 1700000000
processes 10000
procs_running 2
procs_blocked 0
",
        );
        fs.add_file(
            "/proc/meminfo",
            "\
MemTotal:       16000000 kB
MemFree:         4000000 kB
MemAvailable:   10000000 kB
Buffers:          500000 kB
Cached:          2000000 kB
SwapCached:            0 kB
Active:          6000000 kB
Inactive:        3000000 kB
SwapTotal:       2000000 kB
SwapFree:        1500000 kB
Dirty:              1024 kB
Slab:             800000 kB
SReclaimable:     500000 kB
",
        );
        fs.add_file(
            "/proc/diskstats",
            "\
   8       0 sda 10 0 2000 50 20 0 4000 80 0 1000 130 0 0 0 0
   8       1 sda1 8 0 1600 40 15 0 3000 60 0 800 100 0 0 0 0
   8      16 sdb 5 0 800 25 5 0 1000 30 0 400 55 0 0 0 0
",
        );
        fs.add_file(
            "/proc/self/mounts",
            "\
/dev/sda1 / ext4 rw,relatime 0 0
proc /proc proc rw,nosuid,nodev,noexec,relatime 0 0
tmpfs /run tmpfs rw,nosuid,nodev 0 0
/dev/sdb /data xfs rw,noatime 0 0
",
        );
        // Root is 62.5% used with 1/6 of its inodes taken.
        fs.add_fs_stat(
            "/",
            FsStat {
                block_size: 4096,
                blocks: 25_000_000,
                blocks_free: 10_000_000,
                blocks_available: 9_000_000,
                files: 6_000_000,
                files_free: 5_000_000,
            },
        );
        fs.add_fs_stat(
            "/data",
            FsStat {
                block_size: 4096,
                blocks: 50_000_000,
                blocks_free: 40_000_000,
                blocks_available: 40_000_000,
                files: 25_000_000,
                files_free: 24_000_000,
            },
        );
        fs.add_file(
            "/proc/net/dev",
            "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo:   20000     200    0    0    0     0          0         0    20000     200    0    0    0     0       0          0
  eth0:  100000    1000    0    1    0     0          0         0    50000     500    2    0    0     0       0          0
",
        );
        fs.add_file(
            "/proc/net/snmp",
            "\
Ip: Forwarding DefaultTTL InReceives InHdrErrors InAddrErrors ForwDatagrams InUnknownProtos InDiscards InDelivers OutRequests OutDiscards OutNoRoutes
Ip: 1 64 30000 0 0 0 0 0 30000 25000 0 0
Tcp: RtoAlgorithm RtoMin RtoMax MaxConn ActiveOpens PassiveOpens AttemptFails EstabResets CurrEstab InSegs OutSegs RetransSegs InErrs OutRsts InCsumErrors
Tcp: 1 200 120000 -1 100 50 1 2 2 20000 10000 100 0 5 0
Udp: InDatagrams NoPorts InErrors OutDatagrams RcvbufErrors SndbufErrors InCsumErrors
Udp: 300 0 0 200 0 0 0
",
        );
        fs.add_file(
            "/proc/net/tcp",
            "\
  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode
   0: 00000000:0016 00000000:0000 0A 00000000:00000000 00:00000000 00000000     0        0 1001 1 0000000000000000 100 0 0 10 0
   1: 0F02000A:0016 0202000A:C5A2 01 00000000:00000000 02:00057E40 00000000     0        0 1002 4 0000000000000000 20 4 29 10 -1
",
        );
        fs.add_file(
            "/proc/net/tcp6",
            "\
  sl  local_address                         remote_address                        st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode
   0: 00000000000000000000000000000000:0050 00000000000000000000000000000000:0000 0A 00000000:00000000 00:00000000 00000000     0        0 2001 1 0000000000000000 100 0 0 10 0
   1: 0000000000000000FFFF00000F02000A:0050 0000000000000000FFFF00000202000A:D1C4 01 00000000:00000000 00:00000000 00000000    33        0 2002 1 0000000000000000 20 4 30 10 -1
   2: 0000000000000000FFFF00000F02000A:0050 0000000000000000FFFF00000202000A:D1C6 06 00000000:00000000 03:00000F2A 00000000     0        0 0 3 0000000000000000
",
        );
        fs.add_file("/proc/sys/fs/file-nr", "2048\t0\t100000\n");

        fs
    }

    /// Creates a host where only the always-on core files are readable.
    ///
    /// Every optional collector fails its provider query.
    pub fn core_only_host() -> Self {
        let mut fs = Self::typical_host();
        for file in [
            "/proc/meminfo",
            "/proc/diskstats",
            "/proc/self/mounts",
            "/proc/net/dev",
            "/proc/net/snmp",
            "/proc/net/tcp",
            "/proc/net/tcp6",
            "/proc/sys/fs/file-nr",
        ] {
            fs.remove_file(file);
        }
        fs
    }
}
