use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What to do after the first per-leaf mismatch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MismatchPolicy {
    /// Stop scanning at the first mismatch.
    #[default]
    FailFast,
    /// Scan every leaf and report all mismatches.
    CollectAll,
}

/// Verifier settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    pub mismatch_policy: MismatchPolicy,
    /// Seconds between progress log records.
    pub progress_interval_secs: u64,
    /// Leaves folded per parallel batch.
    pub batch_size: usize,
}

impl VerifierConfig {
    pub fn progress_interval(&self) -> Duration {
        Duration::from_secs(self.progress_interval_secs)
    }
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            mismatch_policy: MismatchPolicy::FailFast,
            progress_interval_secs: 10,
            batch_size: 4096,
        }
    }
}
