//! Host statistics from the Linux `/proc` filesystem.
//!
//! [`parser`] holds pure text parsers; [`ProcfsProvider`] reads the files
//! through a [`FileSystem`](crate::collector::traits::FileSystem) and maps
//! parser output to the snapshot types in [`crate::model`].

pub mod parser;
mod provider;

pub use provider::{CLK_TCK, ProcfsProvider, SECTOR_SIZE};
