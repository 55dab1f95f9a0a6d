//! Animalitos Core — resilient fetch → normalize → dedupe → persist pipeline
//! for historical Lotto Activo draw results.
//!
//! The pipeline runs as a single bounded job per invocation:
//! - [`fetch`] retrieves a date range with bounded retries and a fixed delay
//! - [`normalize`] turns inconsistent scraped text into typed records
//! - [`dedupe`] collapses rows describing the same draw event
//! - [`store`] persists an atomic, size-bounded JSON batch with a manifest
//! - [`pipeline`] composes the stages and accumulates per-run metrics

pub mod animals;
pub mod config;
pub mod dedupe;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod record;
pub mod store;

pub use config::{MismatchPolicy, PipelineConfig};
pub use error::PipelineError;
pub use metrics::RunMetrics;
pub use pipeline::{latest_range, Pipeline, PipelineState, RunReport};
pub use record::{CanonicalRecord, RawRow, RejectionReason, SOURCE_ID};
pub use store::{BatchManifest, JsonStore, StorageResult};
