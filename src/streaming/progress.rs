//! Load progress accounting.
//!
//! The accumulator is a small value owned by one load and threaded
//! through the pipeline. It hands out [`LoadProgress`] snapshots by value.

use crate::streaming::header::RecordTarget;

/// A progress snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadProgress {
    pub bytes_loaded: u64,
    /// None when the source does not report a length.
    pub bytes_total: Option<u64>,
    pub records_processed: u64,
    /// None until a positive count has been declared.
    pub records_total: Option<u64>,
    /// Completion in [0, 100].
    pub percentage: f64,
}

impl LoadProgress {
    pub fn is_complete(&self) -> bool {
        self.percentage >= 100.0
    }
}

/// How byte and record counts map onto the percentage range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phasing {
    /// Header bytes fill 0-50, body records fill 50-100.
    HeaderThenBody,
    /// Bytes fill 0-100.
    BytesOnly,
}

/// Where the pipeline currently is, as seen by the accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Header,
    Body(RecordTarget),
}

/// Monotonic percentage computation for one load.
#[derive(Debug, Clone)]
pub struct ProgressAccumulator {
    phasing: Phasing,
    bytes_total: Option<u64>,
    last: f64,
}

impl ProgressAccumulator {
    pub fn new(phasing: Phasing, bytes_total: Option<u64>) -> Self {
        Self {
            phasing,
            // A zero-length report carries no information.
            bytes_total: bytes_total.filter(|&n| n > 0),
            last: 0.0,
        }
    }

    /// Snapshot for the current counts. Never lower than the previous one.
    pub fn observe(&mut self, bytes_loaded: u64, records: u64, phase: Phase) -> LoadProgress {
        let raw = self.raw_percentage(bytes_loaded, records, phase);
        let percentage = clamp(raw).max(self.last);
        self.last = percentage;
        self.snapshot(bytes_loaded, records, phase, percentage)
    }

    /// Final snapshot, always exactly 100.
    pub fn finish(&mut self, bytes_loaded: u64, records: u64, phase: Phase) -> LoadProgress {
        self.last = 100.0;
        self.snapshot(bytes_loaded, records, phase, 100.0)
    }

    fn raw_percentage(&self, bytes_loaded: u64, records: u64, phase: Phase) -> f64 {
        let byte_fraction = self
            .bytes_total
            .map(|total| (bytes_loaded as f64 / total as f64).min(1.0));

        match (self.phasing, phase) {
            (Phasing::BytesOnly, _) => byte_fraction.unwrap_or(0.0) * 100.0,
            (Phasing::HeaderThenBody, Phase::Header) => byte_fraction.unwrap_or(0.0) * 50.0,
            (Phasing::HeaderThenBody, Phase::Body(RecordTarget::Declared(n))) => {
                50.0 + (records as f64 / n as f64).min(1.0) * 50.0
            }
            (Phasing::HeaderThenBody, Phase::Body(RecordTarget::Unknown)) => {
                50.0 + byte_fraction.unwrap_or(0.0) * 50.0
            }
        }
    }

    fn snapshot(&self, bytes_loaded: u64, records: u64, phase: Phase, percentage: f64) -> LoadProgress {
        let records_total = match phase {
            Phase::Body(target) => target.count(),
            Phase::Header => None,
        };
        LoadProgress {
            bytes_loaded,
            bytes_total: self.bytes_total,
            records_processed: records,
            records_total,
            percentage,
        }
    }
}

#[inline]
fn clamp(p: f64) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 100.0)
    }
}
