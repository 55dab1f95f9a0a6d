//! Pipeline orchestrator — one bounded run per invocation.
//!
//! Composes fetch → normalize → dedupe → save, tracking the run state
//! machine `Idle → Fetching → Normalizing → Deduplicating → Saving → Done`
//! with `Failed` reachable from any non-terminal state. Only the fetcher
//! retries internally; stage failures propagate and terminate the run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{Days, Local, NaiveDate, NaiveDateTime};
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::dedupe::dedupe;
use crate::error::PipelineError;
use crate::fetch::{Fetcher, ReqwestTransport, Transport};
use crate::metrics::RunMetrics;
use crate::normalize::Normalizer;
use crate::record::{CanonicalRecord, RawRow};
use crate::store::{JsonStore, StorageResult};

/// Run state, for observability. `Failed` is terminal for the run but the
/// pipeline itself is reusable — the next `run()` starts from `Fetching`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Fetching,
    Normalizing,
    Deduplicating,
    Saving,
    Done,
    Failed,
}

/// Everything a caller can learn from one run. A successful run with zero
/// valid records is `Ok` with an empty artifact — distinct from a failure,
/// which is an `Err` from `run()`.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Deduplicated records, including any kept-but-invalid flagged ones.
    pub records: Vec<CanonicalRecord>,
    pub metrics: RunMetrics,
    pub artifact: StorageResult,
}

/// The pipeline. Owns its config and transport; allocates fresh metrics and
/// buffers per run — no state crosses runs.
pub struct Pipeline {
    config: PipelineConfig,
    transport: Option<Box<dyn Transport>>,
    normalizer: Normalizer,
    store: JsonStore,
    cancel: Arc<AtomicBool>,
    state: PipelineState,
}

impl Pipeline {
    /// Pipeline with the production HTTP transport.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        let transport = ReqwestTransport::new(config.timeout())
            .map_err(|e| PipelineError::Validation(format!("http client: {e}")))?;
        Ok(Self::with_transport(config, Box::new(transport)))
    }

    /// Pipeline over an arbitrary transport (tests script this).
    pub fn with_transport(config: PipelineConfig, transport: Box<dyn Transport>) -> Self {
        let store = JsonStore::new(&config.output_dir, config.max_data_size_bytes());
        let normalizer = Normalizer::new(config.mismatch_policy);
        Self {
            config,
            transport: Some(transport),
            normalizer,
            store,
            cancel: Arc::new(AtomicBool::new(false)),
            state: PipelineState::Idle,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Cancellation handle; setting it stops the run at the next stage or
    /// retry boundary.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// One end-to-end run over `start..=end`.
    pub fn run(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RunReport, PipelineError> {
        let run = self.run_inner(start, end);
        self.state = match &run {
            Ok(_) => PipelineState::Done,
            Err(_) => PipelineState::Failed,
        };
        run
    }

    fn run_inner(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RunReport, PipelineError> {
        let mut metrics = RunMetrics::start(now());
        info!(%start, %end, "pipeline run starting");

        self.state = PipelineState::Fetching;
        let transport = self.transport()?;
        let rows = Fetcher::new(transport, &self.config).fetch(start, end, &self.cancel)?;

        self.finish_from_rows(rows, &mut metrics)
    }

    /// Convenience entry point: fetch the last `days` days ending today.
    pub fn get_latest_data(&mut self, days: u64) -> Result<RunReport, PipelineError> {
        let (start, end) = latest_range(Local::now().date_naive(), days);
        self.run(start, end)
    }

    /// Historical backfill: fetch the last `days` days in `chunk_days`-wide
    /// windows, tolerating per-chunk fetch failures, then normalize, dedupe,
    /// and save the consolidated rows once. Fails only if the range is
    /// invalid, every chunk fails, the run is cancelled, or saving fails.
    pub fn run_history(
        &mut self,
        days: u64,
        chunk_days: u64,
    ) -> Result<RunReport, PipelineError> {
        let (start, end) = latest_range(Local::now().date_naive(), days);
        let result = self.run_history_range(start, end, chunk_days);
        self.state = match &result {
            Ok(_) => PipelineState::Done,
            Err(_) => PipelineState::Failed,
        };
        result
    }

    fn run_history_range(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
        chunk_days: u64,
    ) -> Result<RunReport, PipelineError> {
        if chunk_days == 0 {
            return Err(PipelineError::Validation("chunk_days must be positive".into()));
        }
        if start > end {
            return Err(PipelineError::Validation(format!(
                "start date {start} is after end date {end}"
            )));
        }

        let mut metrics = RunMetrics::start(now());
        let mut all_rows: Vec<RawRow> = Vec::new();
        let mut chunks = 0u32;
        let mut failed_chunks = 0u32;
        let mut last_err: Option<PipelineError> = None;

        self.state = PipelineState::Fetching;
        let mut current = start;
        while current <= end {
            let chunk_end = current
                .checked_add_days(Days::new(chunk_days - 1))
                .unwrap_or(end)
                .min(end);
            chunks += 1;
            info!(%current, %chunk_end, "loading history chunk");

            let transport = self.transport()?;
            match Fetcher::new(transport, &self.config).fetch(current, chunk_end, &self.cancel)
            {
                Ok(rows) => all_rows.extend(rows),
                Err(PipelineError::Cancelled) => return Err(PipelineError::Cancelled),
                Err(e) => {
                    warn!(%current, %chunk_end, error = %e, "history chunk failed, continuing");
                    failed_chunks += 1;
                    last_err = Some(e);
                }
            }

            current = match current.checked_add_days(Days::new(chunk_days)) {
                Some(next) => next,
                None => break,
            };
        }

        if chunks > 0 && failed_chunks == chunks {
            // Nothing came back at all; surface the underlying failure.
            return Err(last_err.expect("failed chunks imply a recorded error"));
        }

        // Re-index consolidated rows so traceability survives concatenation.
        for (i, row) in all_rows.iter_mut().enumerate() {
            row.row_index = i;
        }

        self.finish_from_rows(all_rows, &mut metrics)
    }

    /// Shared tail of every run: normalize → dedupe → save.
    fn finish_from_rows(
        &mut self,
        rows: Vec<RawRow>,
        metrics: &mut RunMetrics,
    ) -> Result<RunReport, PipelineError> {
        metrics.rows_seen = rows.len();

        self.check_cancelled()?;
        self.state = PipelineState::Normalizing;
        let mut normalized: Vec<CanonicalRecord> = Vec::with_capacity(rows.len());
        for row in &rows {
            match self.normalizer.normalize(row, now()) {
                Ok(record) => {
                    if record.valid {
                        metrics.rows_valid += 1;
                    } else {
                        metrics.rows_flagged += 1;
                    }
                    normalized.push(record);
                }
                Err(reason) => {
                    metrics.rows_rejected += 1;
                    warn!(row = row.row_index, %reason, "row rejected");
                }
            }
        }
        info!(
            seen = metrics.rows_seen,
            valid = metrics.rows_valid,
            rejected = metrics.rows_rejected,
            flagged = metrics.rows_flagged,
            "normalization finished"
        );

        self.check_cancelled()?;
        self.state = PipelineState::Deduplicating;
        let (records, dropped) = dedupe(normalized);
        metrics.rows_deduplicated = dropped;

        self.check_cancelled()?;
        self.state = PipelineState::Saving;
        let persistable: Vec<CanonicalRecord> =
            records.iter().filter(|r| r.valid).cloned().collect();
        // The store embeds a metrics snapshot in the manifest; counters and
        // the rate must be final before the write.
        metrics.finalize(now());
        let artifact = self.store.save(&persistable, metrics, now())?;
        metrics.bytes_written = artifact.bytes_written;

        // Re-finalize so the reported duration covers the write itself.
        metrics.finalize(now());
        info!(
            records = records.len(),
            persisted = artifact.record_count,
            duration = metrics.duration_seconds,
            "pipeline run done"
        );
        Ok(RunReport {
            records,
            metrics: metrics.clone(),
            artifact,
        })
    }

    /// Release the held connection resources. Idempotent; a later `run()`
    /// fails with a validation error.
    pub fn close(&mut self) {
        if self.transport.take().is_some() {
            info!("pipeline closed");
        }
    }

    fn transport(&self) -> Result<&dyn Transport, PipelineError> {
        self.transport
            .as_deref()
            .ok_or_else(|| PipelineError::Validation("pipeline is closed".into()))
    }

    fn check_cancelled(&self) -> Result<(), PipelineError> {
        if self.cancel.load(Ordering::Relaxed) {
            Err(PipelineError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// `(today - days, today)` — the range used by `get_latest_data`.
pub fn latest_range(today: NaiveDate, days: u64) -> (NaiveDate, NaiveDate) {
    let start = today
        .checked_sub_days(Days::new(days))
        .unwrap_or(NaiveDate::MIN);
    (start, today)
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}
