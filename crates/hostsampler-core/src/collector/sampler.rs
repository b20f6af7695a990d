//! Orchestrator that runs the enabled collectors once per cycle.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::collector::resources::{
    CpuCollector, CycleContext, DiskCollector, LoadCollector, MemCollector, NetCollector,
    OpenFdCollector, ProtocolCollector, ResourceCollector, ResourceKind,
};
use crate::collector::traits::StatProvider;
use crate::config::{ConfigError, SamplerConfig};
use crate::filter::DeviceFilter;
use crate::labels::Labels;
use crate::sink::MetricSink;
use crate::util::resolve_host_ip;

/// Hostname label value when the provider cannot report one.
pub const UNKNOWN_HOSTNAME: &str = "unknown";

/// Timing information for one cycle.
///
/// Used for debugging and performance monitoring.
#[derive(Debug, Clone, Default)]
pub struct CollectorTiming {
    /// Total cycle time.
    pub total: Duration,
    /// Time spent in each collector that ran, in run order.
    pub collectors: Vec<(ResourceKind, Duration)>,
}

impl CollectorTiming {
    pub fn get(&self, kind: ResourceKind) -> Option<Duration> {
        self.collectors
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, d)| *d)
    }
}

/// Outcome of one [`Sampler::collect`] call.
#[derive(Debug, Clone)]
pub struct CycleReport {
    /// Timestamp shared by every metric emitted in the cycle.
    pub collect_time: DateTime<Utc>,
    /// Number of metrics handed to the sink.
    pub emitted: usize,
    /// Collectors whose provider query failed. They emitted nothing.
    pub failed: Vec<ResourceKind>,
    pub timing: CollectorTiming,
}

/// Periodic host-resource sampler.
///
/// Owns one collector per enabled resource family together with its state.
/// The caller drives it at a fixed period; `&mut self` guarantees at most one
/// cycle runs at a time per instance.
pub struct Sampler {
    config: SamplerConfig,
    filter: DeviceFilter,
    labels: Labels,
    /// Enabled collectors, sorted by [`ResourceKind`].
    collectors: Vec<Box<dyn ResourceCollector + Send>>,
    last_timing: Option<CollectorTiming>,
}

impl Sampler {
    /// Builds a sampler. Fails only on an invalid exclude pattern.
    ///
    /// Common labels are resolved here, once: `hostname` from the provider,
    /// `ip` from the config or by resolving the hostname, then static labels.
    pub fn new(config: SamplerConfig, provider: &dyn StatProvider) -> Result<Self, ConfigError> {
        let filter = DeviceFilter::new(
            config.exclude_disk_fs_type.as_deref(),
            config.exclude_disk_path.as_deref(),
        )?;
        let labels = common_labels(&config, provider);

        let mut sampler = Self {
            config,
            filter,
            labels,
            collectors: Vec::new(),
            last_timing: None,
        };
        for kind in ResourceKind::ALL {
            if sampler.configured(kind) {
                let collector = sampler.build_collector(kind);
                sampler.collectors.push(collector);
            }
        }
        debug!(labels = %sampler.labels, enabled = ?sampler.enabled(), "sampler ready");
        Ok(sampler)
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Labels attached to every metric.
    pub fn common_labels(&self) -> &Labels {
        &self.labels
    }

    /// Enabled resource families in run order.
    pub fn enabled(&self) -> Vec<ResourceKind> {
        self.collectors.iter().map(|c| c.kind()).collect()
    }

    pub fn is_enabled(&self, kind: ResourceKind) -> bool {
        self.collectors.iter().any(|c| c.kind() == kind)
    }

    /// Enables or disables a resource family between cycles.
    ///
    /// Disabling drops the collector and its baselines; enabling again starts
    /// from an empty state. The core collector cannot be disabled.
    pub fn set_enabled(&mut self, kind: ResourceKind, enabled: bool) {
        let Some(flag) = self.config_flag(kind) else {
            return;
        };
        *flag = enabled;

        let present = self.is_enabled(kind);
        if enabled && !present {
            let collector = self.build_collector(kind);
            let pos = self.collectors.partition_point(|c| c.kind() < kind);
            self.collectors.insert(pos, collector);
        } else if !enabled && present {
            self.collectors.retain(|c| c.kind() != kind);
        }
    }

    /// Timing of the most recent cycle.
    pub fn last_timing(&self) -> Option<&CollectorTiming> {
        self.last_timing.as_ref()
    }

    /// Runs one cycle stamped with the current time.
    pub fn collect(
        &mut self,
        provider: &dyn StatProvider,
        sink: &mut dyn MetricSink,
    ) -> CycleReport {
        self.collect_at(Utc::now(), provider, sink)
    }

    /// Runs one cycle stamped with `collect_time`.
    ///
    /// Collectors run sequentially in [`ResourceKind`] order. A collector
    /// whose provider query fails is logged and skipped; the rest still run.
    pub fn collect_at(
        &mut self,
        collect_time: DateTime<Utc>,
        provider: &dyn StatProvider,
        sink: &mut dyn MetricSink,
    ) -> CycleReport {
        let total_start = Instant::now();
        let ctx = CycleContext::new(collect_time, &self.labels);
        let mut timing = CollectorTiming::default();
        let mut failed = Vec::new();
        let mut emitted = 0;

        for collector in &mut self.collectors {
            let kind = collector.kind();
            let start = Instant::now();
            match collector.collect(&ctx, provider) {
                Ok(metrics) => {
                    emitted += metrics.len();
                    for metric in metrics {
                        sink.emit(metric);
                    }
                }
                Err(e) => {
                    warn!(collector = %kind, error = %e, "collector failed, skipping cycle");
                    failed.push(kind);
                }
            }
            timing.collectors.push((kind, start.elapsed()));
        }

        timing.total = total_start.elapsed();
        debug!(
            emitted,
            failed = failed.len(),
            total_us = timing.total.as_micros() as u64,
            "cycle complete"
        );
        self.last_timing = Some(timing.clone());

        CycleReport {
            collect_time,
            emitted,
            failed,
            timing,
        }
    }

    fn configured(&self, kind: ResourceKind) -> bool {
        match kind {
            ResourceKind::Core => true,
            ResourceKind::Cpu => self.config.cpu,
            ResourceKind::Mem => self.config.mem,
            ResourceKind::Disk => self.config.disk,
            ResourceKind::Net => self.config.net,
            ResourceKind::Protocol => self.config.protocol,
            ResourceKind::OpenFd => self.config.open_fd,
        }
    }

    fn config_flag(&mut self, kind: ResourceKind) -> Option<&mut bool> {
        match kind {
            ResourceKind::Core => None,
            ResourceKind::Cpu => Some(&mut self.config.cpu),
            ResourceKind::Mem => Some(&mut self.config.mem),
            ResourceKind::Disk => Some(&mut self.config.disk),
            ResourceKind::Net => Some(&mut self.config.net),
            ResourceKind::Protocol => Some(&mut self.config.protocol),
            ResourceKind::OpenFd => Some(&mut self.config.open_fd),
        }
    }

    fn build_collector(&self, kind: ResourceKind) -> Box<dyn ResourceCollector + Send> {
        let config = &self.config;
        match kind {
            ResourceKind::Core => Box::new(LoadCollector::new()),
            ResourceKind::Cpu => Box::new(CpuCollector::new(
                config.cpu_percent,
                config.cpu_request.clone(),
            )),
            ResourceKind::Mem => Box::new(MemCollector::new()),
            ResourceKind::Disk => {
                Box::new(DiskCollector::new(config.disks.clone(), self.filter.clone()))
            }
            ResourceKind::Net => Box::new(NetCollector::new(config.net_interfaces.clone())),
            ResourceKind::Protocol => Box::new(ProtocolCollector::new(config.tcp)),
            ResourceKind::OpenFd => Box::new(OpenFdCollector::new()),
        }
    }
}

fn common_labels(config: &SamplerConfig, provider: &dyn StatProvider) -> Labels {
    let hostname = match provider.hostname() {
        Ok(name) => Some(name),
        Err(e) => {
            warn!(error = %e, "failed to read hostname");
            None
        }
    };

    let ip = config
        .host_ip
        .clone()
        .filter(|ip| !ip.is_empty())
        .or_else(|| hostname.as_deref().and_then(resolve_host_ip));

    let mut labels = Labels::new();
    labels.insert("hostname", hostname.as_deref().unwrap_or(UNKNOWN_HOSTNAME));
    if let Some(ip) = ip {
        labels.insert("ip", ip);
    }
    for (key, value) in &config.labels {
        labels.insert(key.as_str(), value.as_str());
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;
    use crate::collector::procfs::ProcfsProvider;
    use crate::model::Metric;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn config() -> SamplerConfig {
        SamplerConfig {
            host_ip: Some("10.0.0.15".to_string()),
            ..Default::default()
        }
    }

    fn provider() -> ProcfsProvider<MockFs> {
        ProcfsProvider::new(MockFs::typical_host(), "/proc")
    }

    fn names(metrics: &[Metric]) -> Vec<&str> {
        metrics.iter().map(|m| m.name.as_str()).collect()
    }

    #[test]
    fn test_default_enabled_set() {
        let sampler = Sampler::new(config(), &provider()).unwrap();
        assert_eq!(sampler.enabled(), ResourceKind::ALL.to_vec());
    }

    #[test]
    fn test_disabled_in_config() {
        let config = SamplerConfig {
            cpu: false,
            net: false,
            ..config()
        };
        let sampler = Sampler::new(config, &provider()).unwrap();
        assert!(!sampler.is_enabled(ResourceKind::Cpu));
        assert!(!sampler.is_enabled(ResourceKind::Net));
        assert!(sampler.is_enabled(ResourceKind::Core));
    }

    #[test]
    fn test_invalid_pattern_fails_construction() {
        let config = SamplerConfig {
            exclude_disk_fs_type: Some("(".to_string()),
            ..config()
        };
        let err = Sampler::new(config, &provider()).err().unwrap();
        assert!(matches!(
            err,
            ConfigError::InvalidPattern {
                option: "exclude_disk_fs_type",
                ..
            }
        ));
    }

    #[test]
    fn test_common_labels() {
        let mut config = config();
        config.labels.insert("cluster".into(), "prod".into());
        let sampler = Sampler::new(config, &provider()).unwrap();
        assert_eq!(
            sampler.common_labels().to_string(),
            "cluster=prod,hostname=web-1,ip=10.0.0.15"
        );
    }

    #[test]
    fn test_static_labels_override() {
        let mut config = config();
        config.labels.insert("hostname".into(), "alias".into());
        let sampler = Sampler::new(config, &provider()).unwrap();
        assert_eq!(sampler.common_labels().get("hostname"), Some("alias"));
    }

    #[test]
    fn test_unknown_hostname() {
        let mut fs = MockFs::typical_host();
        fs.remove_file("/proc/sys/kernel/hostname");
        let sampler = Sampler::new(config(), &ProcfsProvider::new(fs, "/proc")).unwrap();
        assert_eq!(sampler.common_labels().get("hostname"), Some(UNKNOWN_HOSTNAME));
    }

    #[test]
    fn test_first_cycle_emits_only_instantaneous_metrics() {
        let provider = provider();
        let mut sampler = Sampler::new(config(), &provider).unwrap();
        let mut sink: Vec<Metric> = Vec::new();

        let report = sampler.collect_at(at(100), &provider, &mut sink);

        assert!(report.failed.is_empty());
        assert_eq!(report.emitted, sink.len());
        // load 4 + cpu_count 1 + mem 7 + disk usage 2 mounts * 5 + fd 3
        assert_eq!(sink.len(), 25);
        let names = names(&sink);
        assert!(names.contains(&"system_load1"));
        assert!(names.contains(&"cpu_count"));
        assert!(names.contains(&"disk_space_util"));
        assert!(sink.iter().all(|m| m.labels.get("disk").is_none()));
        assert!(!names.iter().any(|n| n.starts_with("net_")));
        assert!(!names.iter().any(|n| n.starts_with("protocol_")));
        assert!(sink.iter().all(|m| m.timestamp == at(100)));
    }

    #[test]
    fn test_metrics_follow_collector_order() {
        let provider = provider();
        let mut sampler = Sampler::new(config(), &provider).unwrap();
        let mut sink: Vec<Metric> = Vec::new();
        sampler.collect_at(at(100), &provider, &mut sink);

        let names = names(&sink);
        let first_mem = names.iter().position(|n| n.starts_with("mem_")).unwrap();
        let first_fd = names.iter().position(|n| n.starts_with("fd_")).unwrap();
        assert_eq!(names[0], "system_load1");
        assert!(names.iter().position(|n| *n == "cpu_count").unwrap() < first_mem);
        assert!(first_mem < first_fd);
    }

    #[test]
    fn test_failure_is_isolated() {
        let provider = ProcfsProvider::new(MockFs::core_only_host(), "/proc");
        let mut sampler = Sampler::new(config(), &provider).unwrap();
        let mut sink: Vec<Metric> = Vec::new();

        let report = sampler.collect_at(at(100), &provider, &mut sink);

        assert_eq!(
            report.failed,
            vec![
                ResourceKind::Mem,
                ResourceKind::Disk,
                ResourceKind::Net,
                ResourceKind::Protocol,
                ResourceKind::OpenFd,
            ]
        );
        // load 4 + cpu_count 1
        assert_eq!(sink.len(), 5);
    }

    #[test]
    fn test_disable_and_reenable_starts_fresh() {
        let mut provider = provider();
        let mut sampler = Sampler::new(config(), &provider).unwrap();
        let mut sink: Vec<Metric> = Vec::new();
        sampler.collect_at(at(100), &provider, &mut sink);

        sampler.set_enabled(ResourceKind::Net, false);
        assert!(!sampler.is_enabled(ResourceKind::Net));
        assert!(!sampler.config().net);
        sink.clear();
        sampler.collect_at(at(110), &provider, &mut sink);
        assert!(!names(&sink).iter().any(|n| n.starts_with("net_")));

        sampler.set_enabled(ResourceKind::Net, true);
        assert_eq!(sampler.enabled(), ResourceKind::ALL.to_vec());
        provider.fs_mut().add_file(
            "/proc/net/dev",
            "  eth0:  200000    2000    0    1    0     0          0         0    50000     500    2    0    0     0       0          0\n",
        );
        sink.clear();
        sampler.collect_at(at(120), &provider, &mut sink);
        assert!(!names(&sink).iter().any(|n| n.starts_with("net_")));

        sink.clear();
        sampler.collect_at(at(130), &provider, &mut sink);
        assert!(names(&sink).contains(&"net_in"));
    }

    #[test]
    fn test_core_cannot_be_disabled() {
        let mut sampler = Sampler::new(config(), &provider()).unwrap();
        sampler.set_enabled(ResourceKind::Core, false);
        assert!(sampler.is_enabled(ResourceKind::Core));
        assert!(sampler.config().cpu);
    }

    #[test]
    fn test_timing_recorded() {
        let provider = provider();
        let mut sampler = Sampler::new(config(), &provider).unwrap();
        assert!(sampler.last_timing().is_none());

        let report = sampler.collect_at(at(100), &provider, &mut Vec::<Metric>::new());
        let timing = sampler.last_timing().unwrap();
        assert_eq!(timing.collectors.len(), 7);
        assert!(timing.get(ResourceKind::Disk).is_some());
        assert_eq!(report.timing.collectors.len(), 7);
    }
}
