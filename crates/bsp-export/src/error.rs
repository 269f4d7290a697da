use std::path::PathBuf;

use bsp_aggregate::AggregateError;
use bsp_codec::CodecError;
use bsp_crypto::CryptoError;
use bsp_source::SourceError;

/// Errors from an export run. Any of them leaves the output directory
/// without a new snapshot.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("snapshot already exists at {}", .0.display())]
    AlreadyExists(PathBuf),

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

pub type ExportResult<T> = Result<T, ExportError>;
