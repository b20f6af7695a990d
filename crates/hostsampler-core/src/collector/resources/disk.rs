//! Block device I/O rates and per-mount space usage.

use tracing::{debug, warn};

use super::{CycleContext, ResourceCollector, ResourceKind, TOTAL_DEVICE};
use crate::collector::traits::{ProviderError, StatProvider};
use crate::delta::{avg_latency, baseline, busy_util, counter_rate};
use crate::filter::DeviceFilter;
use crate::model::{DiskIoCounters, DiskUsage, Metric, Partition};
use crate::state::DeltaStore;

/// Emits `disk_*` I/O metrics for every non-excluded device and their
/// `total`, plus `disk_space_*`/`disk_inode_util` for every non-excluded
/// block-device mount.
///
/// The exclude patterns see `/dev/<name>` and the mount's fs type for I/O
/// devices, and the mountpoint and its fs type for space usage.
#[derive(Debug)]
pub struct DiskCollector {
    disks: Vec<String>,
    filter: DeviceFilter,
    last: DeltaStore<DiskIoCounters>,
}

impl DiskCollector {
    /// `disks` restricts collection to the named devices; empty means all.
    pub fn new(disks: Vec<String>, filter: DeviceFilter) -> Self {
        Self {
            disks,
            filter,
            last: DeltaStore::new(),
        }
    }

    fn is_excluded(&self, device: &DiskIoCounters, partitions: &[Partition]) -> bool {
        let path = format!("/dev/{}", device.name);
        let fs_type = partitions
            .iter()
            .find(|p| p.device == path)
            .map(|p| p.fs_type.as_str())
            .unwrap_or("");
        self.filter.is_excluded(&path, fs_type)
    }

    /// Mounts whose space usage is reported. Pseudo filesystems have no
    /// device path as their source and are skipped.
    fn usage_mounts<'p>(&self, partitions: &'p [Partition]) -> Vec<&'p Partition> {
        let mut mounts: Vec<&Partition> = Vec::new();
        for p in partitions {
            if !p.device.starts_with('/')
                || self.filter.is_excluded(&p.mountpoint, &p.fs_type)
                || mounts.iter().any(|m| m.mountpoint == p.mountpoint)
            {
                continue;
            }
            mounts.push(p);
        }
        mounts
    }

    fn emit_usage(
        ctx: &CycleContext<'_>,
        partition: &Partition,
        usage: &DiskUsage,
        metrics: &mut Vec<Metric>,
    ) {
        let labels = ctx
            .labels
            .with("device", &partition.device)
            .with("mountpoint", &usage.mountpoint);

        metrics.extend([
            ctx.labeled("disk_space_total", &labels, usage.total as f64),
            ctx.labeled("disk_space_used", &labels, usage.used as f64),
            ctx.labeled("disk_space_free", &labels, usage.free as f64),
            ctx.labeled("disk_space_util", &labels, usage.used_percent),
            ctx.labeled("disk_inode_util", &labels, usage.inodes_used_percent),
        ]);
    }

    fn emit_device(
        &self,
        ctx: &CycleContext<'_>,
        curr: &DiskIoCounters,
        metrics: &mut Vec<Metric>,
    ) {
        let Some((prev, dt)) = baseline(self.last.get(&curr.name), ctx.collect_time) else {
            return;
        };
        let labels = ctx.labels.with("disk", &curr.name);

        metrics.extend([
            ctx.labeled("disk_rbps", &labels, counter_rate(curr.read_bytes, prev.read_bytes, dt)),
            ctx.labeled("disk_wbps", &labels, counter_rate(curr.write_bytes, prev.write_bytes, dt)),
            ctx.labeled("disk_riops", &labels, counter_rate(curr.read_count, prev.read_count, dt)),
            ctx.labeled("disk_wiops", &labels, counter_rate(curr.write_count, prev.write_count, dt)),
            ctx.labeled(
                "disk_rlatency",
                &labels,
                avg_latency(curr.read_time, prev.read_time, curr.read_count, prev.read_count),
            ),
            ctx.labeled(
                "disk_wlatency",
                &labels,
                avg_latency(curr.write_time, prev.write_time, curr.write_count, prev.write_count),
            ),
        ]);
        if curr.name != TOTAL_DEVICE {
            metrics.push(ctx.labeled("disk_util", &labels, busy_util(curr.io_time, prev.io_time, dt)));
        }
    }
}

impl ResourceCollector for DiskCollector {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Disk
    }

    fn collect(
        &mut self,
        ctx: &CycleContext<'_>,
        provider: &dyn StatProvider,
    ) -> Result<Vec<Metric>, ProviderError> {
        let counters = provider.disk_io_counters(&self.disks)?;
        let partitions = match provider.partitions() {
            Ok(partitions) => partitions,
            Err(e) if self.filter.needs_fs_type() => return Err(e),
            Err(e) => {
                warn!(error = %e, "failed to read mount table, skipping disk usage");
                Vec::new()
            }
        };

        let mut usages = Vec::new();
        for partition in self.usage_mounts(&partitions) {
            match provider.disk_usage(&partition.mountpoint) {
                Ok(usage) => usages.push((partition, usage)),
                Err(e) => debug!(
                    mountpoint = %partition.mountpoint,
                    error = %e,
                    "skipping disk usage"
                ),
            }
        }

        let devices: Vec<DiskIoCounters> = counters
            .into_iter()
            .filter(|d| !self.is_excluded(d, &partitions))
            .collect();

        let mut total = DiskIoCounters {
            name: TOTAL_DEVICE.to_string(),
            ..Default::default()
        };
        for device in &devices {
            total.accumulate(device);
        }

        let mut metrics = Vec::new();
        for (partition, usage) in &usages {
            Self::emit_usage(ctx, partition, usage, &mut metrics);
        }
        self.emit_device(ctx, &total, &mut metrics);
        for device in &devices {
            self.emit_device(ctx, device, &mut metrics);
        }

        self.last.put(TOTAL_DEVICE, total, ctx.collect_time);
        for device in devices {
            self.last.put(device.name.clone(), device, ctx.collect_time);
        }
        Ok(metrics)
    }
}
