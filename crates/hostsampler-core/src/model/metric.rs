//! The unit emitted to a metric sink.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::labels::Labels;

/// One derived measurement: `(name, labels, timestamp, value)`.
///
/// `value` may be NaN for latency metrics without completed operations.
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct Metric {
    pub name: String,
    pub labels: Labels,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl Metric {
    pub fn new(
        name: impl Into<String>,
        labels: Labels,
        timestamp: DateTime<Utc>,
        value: f64,
    ) -> Self {
        Self {
            name: name.into(),
            labels,
            timestamp,
            value,
        }
    }
}
