//! Baselines kept between sampling cycles.
//!
//! Each resource collector owns its own store; stores are never shared
//! across resource families. A missing entry means "no baseline yet".
//! Entries of devices that disappear are left in place and simply never
//! looked up again.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// Last observed snapshot of one device and when it was captured.
#[derive(Debug, Clone, PartialEq)]
pub struct StateEntry<S> {
    pub snapshot: S,
    pub time: DateTime<Utc>,
}

/// Per-device baselines keyed by device name.
#[derive(Debug, Clone)]
pub struct DeltaStore<S> {
    entries: HashMap<String, StateEntry<S>>,
}

impl<S> Default for DeltaStore<S> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<S> DeltaStore<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&StateEntry<S>> {
        self.entries.get(key)
    }

    /// Replaces the baseline for `key`.
    pub fn put(&mut self, key: impl Into<String>, snapshot: S, time: DateTime<Utc>) {
        self.entries
            .insert(key.into(), StateEntry { snapshot, time });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Baseline for a resource with exactly one instance (the CPU aggregate).
#[derive(Debug, Clone)]
pub struct ScalarStore<S> {
    entry: Option<StateEntry<S>>,
}

impl<S> Default for ScalarStore<S> {
    fn default() -> Self {
        Self { entry: None }
    }
}

impl<S> ScalarStore<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&StateEntry<S>> {
        self.entry.as_ref()
    }

    pub fn put(&mut self, snapshot: S, time: DateTime<Utc>) {
        self.entry = Some(StateEntry { snapshot, time });
    }
}
