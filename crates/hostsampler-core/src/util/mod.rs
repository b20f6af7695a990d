//! Utility modules for hostsampler.

mod host;

pub use host::resolve_host_ip;
