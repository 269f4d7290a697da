//! Independent verification of balance snapshots.
//!
//! The [`Verifier`] loads a snapshot's proofs into a [`ProofIndex`],
//! re-aggregates a freshly opened ledger source under the header's schema,
//! and folds every expected leaf through its recorded sibling path. Counts
//! are reconciled between the source, the decoded proofs, and the header.

pub mod config;
pub mod error;
pub mod index;
pub mod progress;
pub mod report;
pub mod verifier;

pub use config::{MismatchPolicy, VerifierConfig};
pub use error::{VerifyError, VerifyResult};
pub use index::{IndexedProof, ProofIndex};
pub use progress::ProgressTicker;
pub use report::{ChecksumFailure, Mismatch, MismatchKind, SupplyDiscrepancy, VerificationReport};
pub use verifier::Verifier;
