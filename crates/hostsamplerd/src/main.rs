//! hostsamplerd - periodic host resource sampler.
//!
//! Samples `/proc` at a fixed interval and writes derived metrics to stdout
//! as JSON lines.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod output;

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use hostsampler_core::collector::{ProcfsProvider, RealFs};
use hostsampler_core::{ConfigError, Sampler, SamplerConfig};

use crate::output::JsonLinesSink;

/// Periodic host resource sampler.
#[derive(Parser, Debug)]
#[command(name = "hostsamplerd", about = "Periodic host resource sampler", version)]
struct Args {
    /// Collection interval in seconds.
    #[arg(short, long, default_value = "10")]
    interval: u64,

    /// Path to /proc filesystem (for testing/mocking).
    #[arg(long, default_value = "/proc")]
    proc_path: String,

    /// JSON config file. Command-line options override its values.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Run a single cycle and exit.
    #[arg(long)]
    once: bool,

    /// Collect CPU count and utilization.
    #[arg(long, value_name = "BOOL")]
    cpu: Option<bool>,

    /// Emit CPU percentage buckets.
    #[arg(long, value_name = "BOOL")]
    cpu_percent: Option<bool>,

    /// Collect memory and swap usage.
    #[arg(long, value_name = "BOOL")]
    mem: Option<bool>,

    /// Collect disk I/O rates.
    #[arg(long, value_name = "BOOL")]
    disk: Option<bool>,

    /// Collect network interface rates.
    #[arg(long, value_name = "BOOL")]
    net: Option<bool>,

    /// Collect TCP segment counters.
    #[arg(long, value_name = "BOOL")]
    protocol: Option<bool>,

    /// Collect TCP socket state counts.
    #[arg(long, value_name = "BOOL")]
    tcp: Option<bool>,

    /// Collect system-wide file handle usage.
    #[arg(long, value_name = "BOOL")]
    open_fd: Option<bool>,

    /// Only collect this disk (repeatable).
    #[arg(long = "disk-name", value_name = "NAME")]
    disks: Vec<String>,

    /// Only collect this network interface (repeatable).
    #[arg(long = "interface", value_name = "NAME")]
    net_interfaces: Vec<String>,

    /// Static label added to every metric (repeatable).
    #[arg(long = "label", value_name = "KEY=VALUE", value_parser = parse_label)]
    labels: Vec<(String, String)>,

    /// Skip disks whose device path matches this regex.
    #[arg(long, value_name = "REGEX")]
    exclude_disk_path: Option<String>,

    /// Skip disks whose mount filesystem type matches this regex.
    #[arg(long, value_name = "REGEX")]
    exclude_disk_fs_type: Option<String>,

    /// Value of the `ip` label. Resolved from the hostname when unset.
    #[arg(long)]
    host_ip: Option<String>,

    /// CPU quota in millicores used to scale CPU percentages.
    #[arg(long, env = "SIGMA_CPU_REQUEST")]
    cpu_request: Option<String>,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Parses a `KEY=VALUE` label.
fn parse_label(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("invalid label '{}': expected KEY=VALUE", s)),
    }
}

impl Args {
    /// Loads the config file, if any, and applies command-line overrides.
    fn sampler_config(&self) -> Result<SamplerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => SamplerConfig::from_file(path)?,
            None => SamplerConfig::default(),
        };

        let flags = [
            (self.cpu, &mut config.cpu),
            (self.cpu_percent, &mut config.cpu_percent),
            (self.mem, &mut config.mem),
            (self.disk, &mut config.disk),
            (self.net, &mut config.net),
            (self.protocol, &mut config.protocol),
            (self.tcp, &mut config.tcp),
            (self.open_fd, &mut config.open_fd),
        ];
        for (value, slot) in flags {
            if let Some(value) = value {
                *slot = value;
            }
        }

        if !self.disks.is_empty() {
            config.disks = self.disks.clone();
        }
        if !self.net_interfaces.is_empty() {
            config.net_interfaces = self.net_interfaces.clone();
        }
        config.labels.extend(self.labels.iter().cloned());

        let overrides = [
            (&self.exclude_disk_path, &mut config.exclude_disk_path),
            (&self.exclude_disk_fs_type, &mut config.exclude_disk_fs_type),
            (&self.host_ip, &mut config.host_ip),
            (&self.cpu_request, &mut config.cpu_request),
        ];
        for (value, slot) in overrides {
            if value.is_some() {
                slot.clone_from(value);
            }
        }

        Ok(config)
    }
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Default level is INFO. Use -q for quiet mode (errors only).
///
/// Logs go to stderr; stdout carries the metrics.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["hostsamplerd", "hostsampler_core"] {
        if let Ok(directive) = format!("{}={}", target, level).parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Time left in the current period once a cycle has taken `elapsed`.
fn sleep_budget(interval: Duration, elapsed: Duration) -> Duration {
    interval.saturating_sub(elapsed)
}

fn main() -> ExitCode {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    info!("hostsamplerd {} starting", env!("CARGO_PKG_VERSION"));

    let config = match args.sampler_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let provider = ProcfsProvider::new(RealFs::new(), &args.proc_path);
    let mut sampler = match Sampler::new(config, &provider) {
        Ok(sampler) => sampler,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!(
        "Config: interval={}s, proc={}, labels={}",
        args.interval,
        args.proc_path,
        sampler.common_labels()
    );
    debug!(enabled = ?sampler.enabled(), "collectors");

    let interval = Duration::from_secs(args.interval.max(1));

    // Setup graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    let mut sink = JsonLinesSink::new(io::stdout().lock());
    let mut cycles: u64 = 0;

    info!("Starting collection loop");

    while running.load(Ordering::SeqCst) {
        let report = sampler.collect(&provider, &mut sink);
        sink.flush();
        cycles += 1;

        if report.failed.is_empty() {
            debug!(
                "Cycle #{}: {} metrics in {:?}",
                cycles, report.emitted, report.timing.total
            );
        } else {
            warn!(
                "Cycle #{}: {} metrics, failed collectors: {:?}",
                cycles, report.emitted, report.failed
            );
        }

        if args.once {
            break;
        }

        // Sleep with periodic checks for shutdown signal
        let sleep_interval = Duration::from_millis(100);
        let mut remaining = sleep_budget(interval, report.timing.total);
        while remaining > Duration::ZERO && running.load(Ordering::SeqCst) {
            let sleep_time = remaining.min(sleep_interval);
            std::thread::sleep(sleep_time);
            remaining = remaining.saturating_sub(sleep_time);
        }
    }

    info!("Shutdown complete after {} cycles", cycles);
    ExitCode::SUCCESS
}
