//! Retryable fetcher — network retrieval of a date range's raw rows.
//!
//! The fetcher owns the retry/backoff protocol and the failure taxonomy.
//! The actual HTTP capability is behind the [`Transport`] trait so tests can
//! script responses and the pipeline never touches the wire directly.
//!
//! Classification:
//! - connect/timeout transport failures and HTTP 5xx → retryable
//! - other HTTP error statuses → fatal immediately
//! - body with no results table (shape changed) → retryable, then fatal
//! - a table with zero data rows → empty result with a warning, not an error
//! - payload over the size ceiling → fatal before normalization
//!
//! Retry policy is a fixed delay between attempts — the documented baseline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::extract::{extract_rows, ExtractOutcome};
use crate::record::RawRow;

/// Widest range a single fetch may cover, matching the source's historical
/// endpoint limit of one year.
pub const MAX_RANGE_DAYS: i64 = 366;

/// A plain HTTP response, as much as the core needs to know.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Transport-level failures, split by retryability.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection refused, DNS failure, timeout — transient by assumption.
    #[error("connection failed: {0}")]
    Connection(String),
    /// Anything else the HTTP client reports.
    #[error("transport error: {0}")]
    Other(String),
}

/// The single outbound capability the pipeline depends on.
pub trait Transport: Send {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;
}

/// Production transport: blocking reqwest client with a configured timeout
/// and browser-ish headers (the source rejects bare clients).
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36",
            )
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let resp = self.client.get(url).send().map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                TransportError::Connection(e.to_string())
            } else {
                TransportError::Other(e.to_string())
            }
        })?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .map_err(|e| TransportError::Other(e.to_string()))?;
        Ok(HttpResponse { status, body })
    }
}

/// Fetcher over an arbitrary transport.
pub struct Fetcher<'a> {
    transport: &'a dyn Transport,
    config: &'a PipelineConfig,
}

impl<'a> Fetcher<'a> {
    pub fn new(transport: &'a dyn Transport, config: &'a PipelineConfig) -> Self {
        Self { transport, config }
    }

    /// Fetch raw rows for `start..=end` with bounded retries.
    ///
    /// The cancellation flag is checked before every attempt, never
    /// mid-request.
    pub fn fetch(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        cancel: &Arc<AtomicBool>,
    ) -> Result<Vec<RawRow>, PipelineError> {
        validate_range(start, end)?;

        let url = self
            .config
            .endpoint
            .replace("{start}", &start.format("%Y-%m-%d").to_string())
            .replace("{end}", &end.format("%Y-%m-%d").to_string());

        let max_attempts = self.config.max_retries.max(1);
        let mut last_cause = String::new();

        for attempt in 1..=max_attempts {
            if cancel.load(Ordering::Relaxed) {
                return Err(PipelineError::Cancelled);
            }
            if attempt > 1 {
                std::thread::sleep(self.config.retry_delay());
            }

            info!(%url, attempt, max_attempts, "requesting draw history");
            match self.transport.get(&url) {
                Err(TransportError::Connection(cause)) => {
                    warn!(attempt, %cause, "transient transport failure");
                    last_cause = cause;
                }
                Err(TransportError::Other(cause)) => {
                    return Err(PipelineError::scraping(attempt, start, end, cause));
                }
                Ok(resp) if (500..600).contains(&resp.status) => {
                    warn!(attempt, status = resp.status, "server error, will retry");
                    last_cause = format!("HTTP {}", resp.status);
                }
                Ok(resp) if !(200..300).contains(&resp.status) => {
                    return Err(PipelineError::scraping(
                        attempt,
                        start,
                        end,
                        format!("HTTP {}", resp.status),
                    ));
                }
                Ok(resp) => {
                    let size = resp.body.len() as u64;
                    if size > self.config.max_data_size_bytes() {
                        return Err(PipelineError::scraping(
                            attempt,
                            start,
                            end,
                            format!(
                                "payload of {size} bytes exceeds ceiling of {} MB",
                                self.config.max_data_size_mb
                            ),
                        ));
                    }
                    match extract_rows(&resp.body) {
                        ExtractOutcome::Rows(rows) => {
                            if rows.is_empty() {
                                warn!(%url, "no draws found in the requested range");
                            } else {
                                info!(count = rows.len(), "raw rows extracted");
                            }
                            return Ok(rows);
                        }
                        ExtractOutcome::NoTable => {
                            warn!(attempt, "no results table in response, will retry");
                            last_cause = "response has no results table".to_string();
                        }
                    }
                }
            }
        }

        Err(PipelineError::scraping(max_attempts, start, end, last_cause))
    }
}

/// Reject inverted or oversized ranges before any network call.
pub fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<(), PipelineError> {
    if start > end {
        return Err(PipelineError::Validation(format!(
            "start date {start} is after end date {end}"
        )));
    }
    let span = (end - start).num_days();
    if span > MAX_RANGE_DAYS {
        return Err(PipelineError::Validation(format!(
            "range of {span} days exceeds the {MAX_RANGE_DAYS}-day limit"
        )));
    }
    Ok(())
}
