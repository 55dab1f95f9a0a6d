//! Per-run metrics.
//!
//! One `RunMetrics` is created at run start, mutated only by the
//! orchestrator, and returned at run end. Never shared across runs.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Counters and timings for a single pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
    pub duration_seconds: f64,
    /// Raw rows obtained from the fetcher.
    pub rows_seen: usize,
    /// Rows that normalized with `valid = true`.
    pub rows_valid: usize,
    /// Rows the normalizer refused.
    pub rows_rejected: usize,
    /// Rows kept under the soft mismatch policy with `valid = false`.
    pub rows_flagged: usize,
    /// Records dropped as duplicates of an earlier `(date, time, number)`.
    pub rows_deduplicated: usize,
    /// `rows_valid / rows_seen`, 0 when nothing was seen.
    pub success_rate: f64,
    /// Size of the persisted batch artifact.
    pub bytes_written: u64,
}

impl RunMetrics {
    /// Start the clock for a new run.
    pub fn start(now: NaiveDateTime) -> Self {
        Self {
            start_time: now,
            end_time: None,
            duration_seconds: 0.0,
            rows_seen: 0,
            rows_valid: 0,
            rows_rejected: 0,
            rows_flagged: 0,
            rows_deduplicated: 0,
            success_rate: 0.0,
            bytes_written: 0,
        }
    }

    /// Stop the clock and derive the success rate.
    pub fn finalize(&mut self, now: NaiveDateTime) {
        self.end_time = Some(now);
        self.duration_seconds = (now - self.start_time).num_milliseconds() as f64 / 1000.0;
        self.success_rate = if self.rows_seen == 0 {
            0.0
        } else {
            self.rows_valid as f64 / self.rows_seen as f64
        };
    }
}
