//! In-memory `/proc` for tests.

mod filesystem;
mod scenarios;

pub use filesystem::MockFs;
