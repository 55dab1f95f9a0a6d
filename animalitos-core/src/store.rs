//! Bounded JSON store — persists one batch of canonical records per run.
//!
//! Layout: `{output_dir}/lotto_activo_{timestamp}.json` (pretty JSON array
//! of records) with a `.meta.json` manifest sidecar carrying counts, the
//! blake3 content hash, and the run metrics snapshot.
//!
//! Rules:
//! - empty input is a no-op result, not an error
//! - the serialized batch must fit under `max_data_size_mb`, or nothing
//!   is written at all
//! - writes are atomic: serialize fully, write `.tmp`, rename into place
//! - a batch only stays on disk together with its manifest; if the manifest
//!   cannot be written, the batch is removed again
//! - timestamps in filenames are millisecond-precision, so successive
//!   batches sort lexicographically by creation time and never overwrite

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::PipelineError;
use crate::metrics::RunMetrics;
use crate::record::{CanonicalRecord, SOURCE_ID};

/// Outcome of a store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageResult {
    /// Final path of the batch file; `None` for the empty-input no-op.
    pub path: Option<PathBuf>,
    pub bytes_written: u64,
    pub record_count: usize,
}

impl StorageResult {
    fn noop() -> Self {
        Self {
            path: None,
            bytes_written: 0,
            record_count: 0,
        }
    }
}

/// Manifest sidecar written next to every batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchManifest {
    pub source: String,
    pub record_count: usize,
    pub bytes_written: u64,
    pub data_hash: String,
    pub created_at: NaiveDateTime,
    pub metrics: RunMetrics,
}

/// JSON batch store bounded by a size ceiling.
pub struct JsonStore {
    output_dir: PathBuf,
    max_bytes: u64,
}

impl JsonStore {
    pub fn new(output_dir: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self {
            output_dir: output_dir.into(),
            max_bytes,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Persist a batch. All-or-nothing: on any failure no artifact remains
    /// at the destination.
    pub fn save(
        &self,
        records: &[CanonicalRecord],
        metrics: &RunMetrics,
        now: NaiveDateTime,
    ) -> Result<StorageResult, PipelineError> {
        if records.is_empty() {
            info!("no records to persist, skipping write");
            return Ok(StorageResult::noop());
        }

        let payload = serde_json::to_vec_pretty(records)
            .map_err(|e| PipelineError::Saving(format!("batch serialization: {e}")))?;

        let size = payload.len() as u64;
        if size > self.max_bytes {
            return Err(PipelineError::Saving(format!(
                "serialized batch of {size} bytes exceeds ceiling of {} bytes",
                self.max_bytes
            )));
        }

        fs::create_dir_all(&self.output_dir)
            .map_err(|e| PipelineError::Saving(format!("create output dir: {e}")))?;

        let stem = format!("lotto_activo_{}", now.format("%Y%m%dT%H%M%S%3f"));
        let path = self.output_dir.join(format!("{stem}.json"));
        let tmp_path = self.output_dir.join(format!("{stem}.json.tmp"));

        fs::write(&tmp_path, &payload)
            .map_err(|e| PipelineError::Saving(format!("write batch: {e}")))?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            PipelineError::Saving(format!("atomic rename: {e}"))
        })?;

        // The embedded snapshot must describe this write, including its size.
        let mut snapshot = metrics.clone();
        snapshot.bytes_written = size;
        let manifest = BatchManifest {
            source: SOURCE_ID.to_string(),
            record_count: records.len(),
            bytes_written: size,
            data_hash: blake3::hash(&payload).to_hex().to_string(),
            created_at: now,
            metrics: snapshot,
        };
        let write_manifest = || -> Result<(), PipelineError> {
            let manifest_json = serde_json::to_string_pretty(&manifest)
                .map_err(|e| PipelineError::Saving(format!("manifest serialization: {e}")))?;
            fs::write(self.output_dir.join(format!("{stem}.meta.json")), manifest_json)
                .map_err(|e| PipelineError::Saving(format!("write manifest: {e}")))
        };
        if let Err(e) = write_manifest() {
            // A batch without its manifest is a half-pair; take it back out.
            let _ = fs::remove_file(&path);
            return Err(e);
        }

        info!(path = %path.display(), bytes = size, records = records.len(), "batch persisted");
        Ok(StorageResult {
            path: Some(path),
            bytes_written: size,
            record_count: records.len(),
        })
    }

    /// Read a batch file back into records (round-trip/consumer helper).
    pub fn load(path: &Path) -> Result<Vec<CanonicalRecord>, PipelineError> {
        let raw =
            fs::read(path).map_err(|e| PipelineError::Saving(format!("read batch: {e}")))?;
        serde_json::from_slice(&raw)
            .map_err(|e| PipelineError::Saving(format!("decode batch: {e}")))
    }
}
