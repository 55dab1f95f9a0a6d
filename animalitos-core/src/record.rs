//! Raw and canonical draw records.
//!
//! A `RawRow` is the untyped text extracted from one table row of the source
//! page; it only lives long enough to be normalized. A `CanonicalRecord` is
//! the validated unit of value handed to consumers and persisted to disk.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Constant source identifier stamped on every record this pipeline produces.
pub const SOURCE_ID: &str = "lotto-activo";

/// One untyped row scraped from the source table, positionally mapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// Free-text date, e.g. "15 de enero de 2025" or "2025-01-15".
    pub date: String,
    /// Free-text draw number, e.g. "5" or "05".
    pub number: String,
    /// Free-text animal label, e.g. "León".
    pub animal: String,
    /// Free-text draw time, e.g. "2:30 PM". Often absent.
    pub time: Option<String>,
    /// Position of the row in the source table, for traceability.
    pub row_index: usize,
}

/// The validated, normalized representation of one draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Calendar date of the draw (ISO form when serialized).
    pub date: NaiveDate,
    /// Time of day of the draw, 24h form.
    pub time: NaiveTime,
    /// Draw-number key from the fixed table ("0", "00", "01".."36").
    pub number: String,
    /// Upper-cased animal label from the fixed table.
    pub animal: String,
    /// Always [`SOURCE_ID`].
    pub source: String,
    /// When this record was normalized — not when the draw happened.
    pub processed_at: NaiveDateTime,
    /// Original table position, carried through from the raw row.
    pub row_index: usize,
    /// True only if every field passed validation. Invalid records are
    /// counted in metrics but never persisted.
    pub valid: bool,
}

impl CanonicalRecord {
    /// Identity key for deduplication: one draw event per `(date, time, number)`.
    pub fn key(&self) -> (NaiveDate, NaiveTime, String) {
        (self.date, self.time, self.number.clone())
    }
}

/// Why the normalizer refused a raw row. Rejections are data, not errors:
/// they are counted per run and never abort the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionReason {
    /// Date did not parse under any accepted format.
    BadDate,
    /// Number outside the fixed 0/00–36 domain.
    BadNumber,
    /// Animal label not in the fixed table after folding.
    UnknownAnimal,
    /// Number and animal both valid but disagree with the fixed table
    /// (only emitted under `MismatchPolicy::Reject`).
    NumberAnimalMismatch,
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RejectionReason::BadDate => "bad date",
            RejectionReason::BadNumber => "bad number",
            RejectionReason::UnknownAnimal => "unknown animal",
            RejectionReason::NumberAnimalMismatch => "number/animal mismatch",
        };
        f.write_str(s)
    }
}
