use bsp_aggregate::AggregateError;
use bsp_codec::CodecError;
use bsp_crypto::CryptoError;
use bsp_source::SourceError;
use bsp_types::{AssetSymbol, LeafKey};
use thiserror::Error;

use crate::report::Mismatch;

#[derive(Debug, Error)]
pub enum VerifyError {
    /// The snapshot was taken from a different ledger state than the one
    /// being scanned.
    #[error("snapshot {field} is {snapshot}, source has {ledger}")]
    SourceMismatch {
        field: &'static str,
        snapshot: String,
        ledger: String,
    },

    #[error("duplicate proof for {0}")]
    DuplicateProof(LeafKey),

    #[error("{count} proof mismatch(es); first: {first}")]
    ProofMismatch { count: usize, first: Box<Mismatch> },

    /// The source and the snapshot disagree on the leaf population.
    #[error(
        "leaf count mismatch: source yields {expected}, {matched} matched, \
         {proofs} proofs decoded, header declares {declared}"
    )]
    CountMismatch {
        expected: u64,
        matched: u64,
        proofs: u64,
        declared: u64,
    },

    #[error("per-asset totals differ from the header for {} asset(s)", .assets.len())]
    SupplyMismatch { assets: Vec<AssetSymbol> },

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error(transparent)]
    Encoding(#[from] CryptoError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type VerifyResult<T> = Result<T, VerifyError>;
