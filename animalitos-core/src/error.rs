//! Structured error types for the pipeline.
//!
//! Per-row rejections are *not* errors — see [`crate::record::RejectionReason`].
//! Everything here aborts the run and propagates to the caller.

use chrono::NaiveDate;
use thiserror::Error;

/// Stage-level pipeline errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Bad caller input (inverted or oversized date range, closed pipeline).
    /// Never retried; no network call is made.
    #[error("validation error: {0}")]
    Validation(String),

    /// Fetch-layer failure after exhausting retries, or an oversize payload.
    #[error("scraping failed after {attempts} attempt(s) for {start}..{end}: {cause}")]
    Scraping {
        attempts: u32,
        start: NaiveDate,
        end: NaiveDate,
        cause: String,
    },

    /// Reserved for systemic normalizer failure (e.g. malformed schema across
    /// all rows). Per-row rejections never raise this.
    #[error("processing error: {0}")]
    Processing(String),

    /// Persistence failure: oversize batch or I/O error. Nothing partial is
    /// ever left at the destination.
    #[error("saving error: {0}")]
    Saving(String),

    /// Cooperative cancellation observed between retry attempts or stages.
    #[error("run cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Shorthand for a scraping error with its range context.
    pub fn scraping(
        attempts: u32,
        start: NaiveDate,
        end: NaiveDate,
        cause: impl Into<String>,
    ) -> Self {
        PipelineError::Scraping {
            attempts,
            start,
            end,
            cause: cause.into(),
        }
    }
}
