//! Host resource collection.
//!
//! This module turns raw OS counters into derived metrics, with the OS
//! behind a trait so every collector can be exercised against a mock `/proc`.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           Sampler                            │
//! │   common labels · enabled set · one collect_time per cycle   │
//! │                                                              │
//! │  core → cpu → mem → disk → net → protocol → openfd           │
//! │  (ResourceCollector, each with its own DeltaStore)           │
//! └───────────────┬─────────────────────────────┬────────────────┘
//!                 │                             │
//!          ┌──────▼───────┐              ┌──────▼──────┐
//!          │ StatProvider │ (trait)      │ MetricSink  │ (trait)
//!          └──────┬───────┘              └─────────────┘
//!                 │
//!          ┌──────▼─────────┐
//!          │ ProcfsProvider │
//!          └──────┬─────────┘
//!                 │
//!          ┌──────▼──────┐
//!          │  FileSystem │ (trait)
//!          └──────┬──────┘
//!         ┌───────┴───────┐
//!  ┌──────▼──────┐ ┌──────▼──────┐
//!  │   RealFs    │ │   MockFs    │
//!  │  (Linux)    │ │  (Testing)  │
//!  └─────────────┘ └─────────────┘
//! ```
//!
//! # Usage
//!
//! ## Production (Linux)
//!
//! ```ignore
//! use hostsampler_core::collector::{ProcfsProvider, RealFs, Sampler};
//! use hostsampler_core::{Metric, SamplerConfig};
//!
//! let provider = ProcfsProvider::new(RealFs::new(), "/proc");
//! let mut sampler = Sampler::new(SamplerConfig::default(), &provider)?;
//! let mut sink: Vec<Metric> = Vec::new();
//! sampler.collect(&provider, &mut sink);
//! ```
//!
//! ## Testing (with MockFs)
//!
//! ```
//! use hostsampler_core::collector::{MockFs, ProcfsProvider, Sampler};
//! use hostsampler_core::{Metric, SamplerConfig};
//!
//! let provider = ProcfsProvider::new(MockFs::typical_host(), "/proc");
//! let config = SamplerConfig {
//!     host_ip: Some("10.0.0.15".into()),
//!     ..Default::default()
//! };
//! let mut sampler = Sampler::new(config, &provider).unwrap();
//! let mut sink: Vec<Metric> = Vec::new();
//! let report = sampler.collect(&provider, &mut sink);
//! assert!(report.failed.is_empty());
//! assert!(sink.iter().any(|m| m.name == "system_load1"));
//! ```

pub mod mock;
pub mod procfs;
pub mod resources;
mod sampler;
pub mod traits;

pub use mock::MockFs;
pub use procfs::ProcfsProvider;
pub use resources::{ResourceCollector, ResourceKind};
pub use sampler::{CollectorTiming, CycleReport, Sampler, UNKNOWN_HOSTNAME};
pub use traits::{FileSystem, FsStat, ProviderError, RealFs, StatProvider};
