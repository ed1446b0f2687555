//! Nanosecond scoped timing with an hdrhistogram-backed sink.
//!
//! The sink is an explicit resource handed to whoever needs timing, never a
//! process-wide global: callers own its lifetime and flushing. Raw samples
//! can additionally stream to any writer as `label,start_ns,end_ns` lines,
//! with timestamps measured as offsets from the sink's monotonic origin.

use std::io::{self, Write};
use std::time::Instant;

use hdrhistogram::Histogram;

/// Collects latency samples: percentiles always, raw lines optionally.
pub struct LatencySink {
    hist: Histogram<u64>,
    origin: Instant,
    samples: Option<Box<dyn Write + Send>>,
}

impl LatencySink {
    /// Sink recording percentiles only. Tracks 1ns..100ms at 3 significant
    /// figures, plenty for per-tick engine work.
    pub fn new() -> Self {
        Self {
            hist: Histogram::new_with_bounds(1, 100_000_000, 3)
                .expect("histogram bounds are static"),
            origin: Instant::now(),
            samples: None,
        }
    }

    /// Also stream every raw sample to `writer`.
    pub fn with_sample_log<W: Write + Send + 'static>(writer: W) -> Self {
        let mut sink = Self::new();
        sink.samples = Some(Box::new(writer));
        sink
    }

    /// Record one interval. Out-of-range durations are clamped by the
    /// histogram; a failed sample write is ignored rather than disturbing
    /// the measured path.
    pub fn record(&mut self, label: &str, start: Instant, end: Instant) {
        let nanos = end.duration_since(start).as_nanos() as u64;
        self.hist.record(nanos.max(1)).unwrap_or(());

        if let Some(w) = self.samples.as_mut() {
            let start_ns = start.duration_since(self.origin).as_nanos();
            let end_ns = end.duration_since(self.origin).as_nanos();
            let _ = writeln!(w, "{},{},{}", label, start_ns, end_ns);
        }
    }

    /// Number of recorded samples.
    #[inline]
    pub fn count(&self) -> u64 {
        self.hist.len()
    }

    /// Monotonic origin shared by all samples from this sink.
    #[inline]
    pub fn origin(&self) -> Instant {
        self.origin
    }

    /// Write the percentile table.
    pub fn write_report(&self, w: &mut impl Write) -> io::Result<()> {
        writeln!(w, "=== Latency Report (ns) ===")?;
        writeln!(w, "Samples: {}", self.hist.len())?;
        writeln!(w, "---------------------------")?;
        writeln!(w, "Min:    {:6} ns", self.hist.min())?;
        writeln!(w, "P50:    {:6} ns", self.hist.value_at_quantile(0.50))?;
        writeln!(w, "P90:    {:6} ns", self.hist.value_at_quantile(0.90))?;
        writeln!(w, "P99:    {:6} ns", self.hist.value_at_quantile(0.99))?;
        writeln!(w, "P99.9:  {:6} ns", self.hist.value_at_quantile(0.999))?;
        writeln!(w, "Max:    {:6} ns", self.hist.max())?;
        writeln!(w, "---------------------------")?;
        Ok(())
    }

    /// Flush the raw-sample writer, if any.
    pub fn flush(&mut self) -> io::Result<()> {
        match self.samples.as_mut() {
            Some(w) => w.flush(),
            None => Ok(()),
        }
    }
}

impl Default for LatencySink {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII timer: measures from construction to drop and records into the
/// borrowed sink. Zero work besides two clock reads.
pub struct ScopedTimer<'a> {
    sink: &'a mut LatencySink,
    label: &'static str,
    start: Instant,
}

impl<'a> ScopedTimer<'a> {
    #[inline]
    pub fn new(sink: &'a mut LatencySink, label: &'static str) -> Self {
        Self {
            sink,
            label,
            start: Instant::now(),
        }
    }
}

impl Drop for ScopedTimer<'_> {
    fn drop(&mut self) {
        let end = Instant::now();
        self.sink.record(self.label, self.start, end);
    }
}
