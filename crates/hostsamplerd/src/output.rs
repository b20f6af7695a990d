//! JSON-lines metric sink.

use std::io::Write;

use hostsampler_core::{Metric, MetricSink};
use tracing::warn;

/// Writes one JSON object per metric, newline-terminated.
///
/// Write errors are logged once per cycle and otherwise ignored; the sampler
/// never sees them.
pub struct JsonLinesSink<W: Write> {
    out: W,
    write_failed: bool,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            write_failed: false,
        }
    }

    /// Flushes the writer and re-arms error logging. Call once per cycle.
    pub fn flush(&mut self) {
        if let Err(e) = self.out.flush() {
            warn!(error = %e, "failed to flush metrics");
        }
        self.write_failed = false;
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> MetricSink for JsonLinesSink<W> {
    fn emit(&mut self, metric: Metric) {
        let result = serde_json::to_writer(&mut self.out, &metric)
            .map_err(std::io::Error::from)
            .and_then(|_| self.out.write_all(b"\n"));

        if let Err(e) = result
            && !self.write_failed
        {
            self.write_failed = true;
            warn!(metric = %metric.name, error = %e, "failed to write metric");
        }
    }
}
