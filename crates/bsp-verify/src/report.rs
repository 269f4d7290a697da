use std::fmt;

use bsp_codec::CodecError;
use bsp_types::{Amount, AssetSymbol, AssetTotal, Digest, LeafKey};

use crate::error::{VerifyError, VerifyResult};

/// Why one expected leaf failed verification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MismatchKind {
    /// The snapshot has no proof for this leaf.
    MissingProof,
    /// The proof records a different amount than the source holds.
    AmountMismatch { expected: Amount, recorded: Amount },
    /// The sibling path folds to a digest other than the published root.
    RootMismatch { computed: Digest },
}

/// A per-leaf verification failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mismatch {
    pub key: LeafKey,
    pub kind: MismatchKind,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            MismatchKind::MissingProof => write!(f, "{}: no proof in snapshot", self.key),
            MismatchKind::AmountMismatch { expected, recorded } => write!(
                f,
                "{}: source amount {expected}, proof records {recorded}",
                self.key
            ),
            MismatchKind::RootMismatch { computed } => {
                write!(f, "{}: proof folds to {}", self.key, computed.short_hex())
            }
        }
    }
}

/// A per-asset total that differs between the header and the source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SupplyDiscrepancy {
    pub asset: AssetSymbol,
    /// Total recorded in the snapshot header.
    pub recorded: Option<AssetTotal>,
    /// Total recomputed from the source.
    pub computed: Option<AssetTotal>,
}

/// A snapshot stream whose bytes do not hash to the header's checksum.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChecksumFailure {
    pub file: &'static str,
    pub expected: Digest,
    pub actual: Digest,
}

/// Outcome of one verification run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationReport {
    pub root: Digest,
    /// Leaves the source yields under the header's schema and policy.
    pub expected: u64,
    /// Leaves whose proof folded to the root.
    pub matched: u64,
    /// Proofs decoded from the snapshot.
    pub proof_count: u64,
    /// `leaf_count` declared by the header.
    pub declared_leaf_count: u64,
    /// Proofs no source leaf claimed. Only meaningful when the scan completed.
    pub unclaimed_proofs: u64,
    /// False when a fail-fast policy stopped the scan early.
    pub scan_complete: bool,
    pub mismatches: Vec<Mismatch>,
    /// Empty when the header carries no per-asset totals.
    pub supply_discrepancies: Vec<SupplyDiscrepancy>,
    pub checksum_failures: Vec<ChecksumFailure>,
}

impl VerificationReport {
    /// Whether the source, the decoded proofs, and the header agree on the
    /// number of leaves.
    pub fn population_agrees(&self) -> bool {
        self.expected == self.proof_count && self.proof_count == self.declared_leaf_count
    }

    /// Whether every proof was claimed by exactly one source leaf. Leaves
    /// that failed with a per-leaf mismatch still count as claimed.
    ///
    /// `None` while the scan is incomplete.
    pub fn count_reconciled(&self) -> Option<bool> {
        self.scan_complete
            .then(|| self.population_agrees() && self.unclaimed_proofs == 0)
    }

    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
            && self.supply_discrepancies.is_empty()
            && self.checksum_failures.is_empty()
            && self.count_reconciled() == Some(true)
    }

    /// Convert a failed report into the run-level error.
    ///
    /// Precedence: population disagreement, then per-leaf mismatches, then
    /// supply totals, then stream checksums.
    pub fn into_result(self) -> VerifyResult<Self> {
        if !self.population_agrees() || self.count_reconciled() == Some(false) {
            return Err(VerifyError::CountMismatch {
                expected: self.expected,
                matched: self.matched,
                proofs: self.proof_count,
                declared: self.declared_leaf_count,
            });
        }
        if let Some(first) = self.mismatches.first() {
            return Err(VerifyError::ProofMismatch {
                count: self.mismatches.len(),
                first: Box::new(first.clone()),
            });
        }
        if !self.supply_discrepancies.is_empty() {
            return Err(VerifyError::SupplyMismatch {
                assets: self
                    .supply_discrepancies
                    .iter()
                    .map(|d| d.asset.clone())
                    .collect(),
            });
        }
        if let Some(failure) = self.checksum_failures.first() {
            return Err(CodecError::ChecksumMismatch {
                file: failure.file.into(),
                expected: failure.expected,
                actual: failure.actual,
            }
            .into());
        }
        Ok(self)
    }
}
