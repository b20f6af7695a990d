//! hostsampler-core - periodic host-resource sampler.
//!
//! Provides:
//! - `collector`: resource collectors, the `Sampler` orchestrator, and the
//!   `/proc`-backed stat provider (with `MockFs` for tests)
//! - `model`: raw counter snapshots and the emitted `Metric`
//! - `labels`: deterministic label sets
//! - `filter`: disk device exclusion patterns
//! - `state`: per-device baselines between cycles
//! - `delta`: rate/percentage/latency arithmetic
//! - `config`: sampler configuration
//! - `sink`: metric sink abstraction

pub mod collector;
pub mod config;
pub mod delta;
pub mod filter;
pub mod labels;
pub mod model;
pub mod sink;
pub mod state;
pub mod util;

pub use collector::{ResourceKind, Sampler};
pub use config::{ConfigError, SamplerConfig};
pub use labels::Labels;
pub use model::Metric;
pub use sink::MetricSink;
