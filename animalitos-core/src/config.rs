//! Pipeline configuration with documented defaults.
//!
//! Every field has a default; absent config means "use default", never an
//! error. The config is an explicit value passed into [`crate::Pipeline`] —
//! there are no process-wide singletons.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default endpoint template. `{start}` and `{end}` are ISO dates.
pub const DEFAULT_ENDPOINT: &str =
    "https://loteriadehoy.com/animalito/lottoactivo/historico/{start}/{end}/";

/// What to do when a row's number and animal are both valid but disagree
/// with the fixed number→animal table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchPolicy {
    /// Keep the record but mark it `valid = false` (it is counted as
    /// flagged and never persisted).
    #[default]
    Flag,
    /// Reject the row outright with `NumberAnimalMismatch`.
    Reject,
}

/// Configuration consumed by the pipeline. Deserializable from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Endpoint URL template with `{start}`/`{end}` placeholders.
    pub endpoint: String,
    /// Maximum fetch attempts per run (total, not extra retries).
    pub max_retries: u32,
    /// Fixed delay between fetch attempts, in seconds.
    pub retry_delay_secs: f64,
    /// HTTP request timeout, in seconds.
    pub timeout_secs: u64,
    /// Ceiling for both the fetched payload and the serialized batch.
    pub max_data_size_mb: f64,
    /// Directory where batch artifacts land.
    pub output_dir: PathBuf,
    /// Policy for number↔animal disagreements during normalization.
    pub mismatch_policy: MismatchPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            max_retries: 3,
            retry_delay_secs: 2.0,
            timeout_secs: 30,
            max_data_size_mb: 50.0,
            output_dir: PathBuf::from("data"),
            mismatch_policy: MismatchPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Fixed delay between fetch attempts. Negative or non-finite
    /// configured values collapse to zero rather than panicking.
    pub fn retry_delay(&self) -> Duration {
        if self.retry_delay_secs.is_finite() && self.retry_delay_secs > 0.0 {
            Duration::from_secs_f64(self.retry_delay_secs)
        } else {
            Duration::ZERO
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Size ceiling in bytes.
    pub fn max_data_size_bytes(&self) -> u64 {
        (self.max_data_size_mb * 1024.0 * 1024.0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_documented_values() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.max_retries, 3);
        assert_eq!(cfg.retry_delay_secs, 2.0);
        assert_eq!(cfg.timeout_secs, 30);
        assert_eq!(cfg.max_data_size_mb, 50.0);
        assert_eq!(cfg.mismatch_policy, MismatchPolicy::Flag);
        assert!(cfg.endpoint.contains("{start}"));
        assert!(cfg.endpoint.contains("{end}"));
    }

    #[test]
    fn absent_keys_fall_back_to_defaults() {
        // A partial TOML fragment must not be an error.
        let cfg: PipelineConfig = toml::from_str("max_retries = 5").unwrap();
        assert_eq!(cfg.max_retries, 5);
        assert_eq!(cfg.timeout_secs, 30);
        assert_eq!(cfg.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn negative_or_non_finite_retry_delay_is_zero() {
        for bad in [-1.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let cfg = PipelineConfig {
                retry_delay_secs: bad,
                ..PipelineConfig::default()
            };
            assert_eq!(cfg.retry_delay(), Duration::ZERO, "input: {bad}");
        }
        let cfg = PipelineConfig {
            retry_delay_secs: 0.5,
            ..PipelineConfig::default()
        };
        assert_eq!(cfg.retry_delay(), Duration::from_millis(500));
    }

    #[test]
    fn mismatch_policy_round_trips() {
        let cfg: PipelineConfig = toml::from_str("mismatch_policy = \"reject\"").unwrap();
        assert_eq!(cfg.mismatch_policy, MismatchPolicy::Reject);
    }
}
