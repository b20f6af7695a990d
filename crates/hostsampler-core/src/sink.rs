//! Destination for emitted metrics.
//!
//! Emission is fire-and-forget: the sampler never learns whether the sink
//! accepted, buffered or dropped a metric.

use crate::model::Metric;

/// Receives metrics produced by a sampling cycle.
pub trait MetricSink {
    fn emit(&mut self, metric: Metric);
}

/// Collects metrics in memory. Used by tests and by callers that post-process
/// a whole cycle at once.
impl MetricSink for Vec<Metric> {
    fn emit(&mut self, metric: Metric) {
        self.push(metric);
    }
}

impl<S: MetricSink + ?Sized> MetricSink for &mut S {
    fn emit(&mut self, metric: Metric) {
        (**self).emit(metric);
    }
}
