//! Delta and rate arithmetic between two counter snapshots.
//!
//! Every function here is pure. Edge-case policy differs per metric family
//! and must stay that way:
//!
//! | family            | degenerate denominator | result          |
//! |-------------------|------------------------|-----------------|
//! | any delta metric  | no baseline / dt <= 0  | not emitted     |
//! | counter rate      | -                      | may be negative |
//! | latency average   | Δops <= 0              | NaN             |
//! | ratio of deltas   | Δden <= 0              | 0               |
//! | CPU percentage    | Δtotal <= 0            | not emitted     |

use chrono::{DateTime, Utc};
use tracing::error;

use crate::model::CpuTimes;
use crate::state::StateEntry;

// ---------------------------------------------------------------------------
// Guard
// ---------------------------------------------------------------------------

/// Seconds between two captures, `None` unless strictly positive.
pub fn elapsed_secs(last: DateTime<Utc>, now: DateTime<Utc>) -> Option<f64> {
    let dt = now - last;
    let secs = match dt.num_nanoseconds() {
        Some(ns) => ns as f64 / 1e9,
        None => dt.num_milliseconds() as f64 / 1e3,
    };
    (secs > 0.0).then_some(secs)
}

/// Returns the previous snapshot and elapsed seconds when a delta can be
/// computed for this cycle.
pub fn baseline<S>(entry: Option<&StateEntry<S>>, now: DateTime<Utc>) -> Option<(&S, f64)> {
    let entry = entry?;
    let dt = elapsed_secs(entry.time, now)?;
    Some((&entry.snapshot, dt))
}

// ---------------------------------------------------------------------------
// Counter arithmetic
// ---------------------------------------------------------------------------

/// Signed difference of two raw counters. A counter reset yields a negative value.
pub fn delta(curr: u64, prev: u64) -> f64 {
    (curr as i128 - prev as i128) as f64
}

/// Per-second rate of a counter over `dt` seconds.
pub fn counter_rate(curr: u64, prev: u64, dt: f64) -> f64 {
    delta(curr, prev) / dt
}

/// Average time per operation, NaN when no operation completed.
pub fn avg_latency(curr_time: u64, prev_time: u64, curr_ops: u64, prev_ops: u64) -> f64 {
    let ops = delta(curr_ops, prev_ops);
    if ops > 0.0 {
        delta(curr_time, prev_time) / ops
    } else {
        f64::NAN
    }
}

/// `100 * numerator / denominator` for two deltas, 0 when the denominator is not positive.
pub fn ratio_pct(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        100.0 * numerator / denominator
    } else {
        0.0
    }
}

/// Share of wall-clock time a device was busy, from a millisecond busy counter.
pub fn busy_util(curr_ms: u64, prev_ms: u64, dt: f64) -> f64 {
    delta(curr_ms, prev_ms) * 100.0 / 1000.0 / dt
}

// ---------------------------------------------------------------------------
// CPU
// ---------------------------------------------------------------------------

/// CPU time split into percentage buckets over one interval.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuUtilization {
    pub busy: f64,
    pub iowait: f64,
    pub system: f64,
    pub user: f64,
    pub irq: f64,
    pub softirq: f64,
    pub nice: f64,
    pub steal: f64,
    pub guest: f64,
    pub guest_nice: f64,
}

/// Normalizes each bucket delta by the same total delta and scales by `factor`.
///
/// Returns `None` when total CPU time did not advance.
pub fn cpu_utilization(prev: &CpuTimes, curr: &CpuTimes, factor: f64) -> Option<CpuUtilization> {
    let total = curr.total() - prev.total();
    if total <= 0.0 {
        return None;
    }
    let pct = |c: f64, p: f64| 100.0 * (c - p) / total * factor;

    Some(CpuUtilization {
        busy: pct(curr.busy(), prev.busy()),
        iowait: pct(curr.iowait, prev.iowait),
        system: pct(curr.system, prev.system),
        user: pct(curr.user, prev.user),
        irq: pct(curr.irq, prev.irq),
        softirq: pct(curr.softirq, prev.softirq),
        nice: pct(curr.nice, prev.nice),
        steal: pct(curr.steal, prev.steal),
        guest: pct(curr.guest, prev.guest),
        guest_nice: pct(curr.guest_nice, prev.guest_nice),
    })
}

/// Scale factor for CPU percentages from a millicore quota.
///
/// `factor = ncpus / (quota / 1000)`. A malformed or non-positive quota,
/// or an unknown CPU count, is logged and yields 1.
pub fn cpu_share_factor(cpu_request: Option<&str>, ncpus: u32) -> f64 {
    let Some(raw) = cpu_request.map(str::trim).filter(|s| !s.is_empty()) else {
        return 1.0;
    };
    match raw.parse::<i64>() {
        Ok(request) if request > 0 && ncpus > 0 => ncpus as f64 / (request as f64 / 1000.0),
        Ok(request) => {
            error!(cpu_request = request, ncpus, "ignoring CPU quota");
            1.0
        }
        Err(e) => {
            error!(cpu_request = raw, ncpus, error = %e, "ignoring malformed CPU quota");
            1.0
        }
    }
}
