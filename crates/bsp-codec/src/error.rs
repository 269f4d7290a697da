use bsp_types::Digest;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An element of a streamed array could not be decoded.
    #[error("decode error at element {ordinal}: {reason}")]
    Decode { ordinal: u64, reason: String },

    /// The array structure around the elements is malformed.
    #[error("malformed array at element {ordinal}: expected {expected}, found {found}")]
    Delimiter {
        ordinal: u64,
        expected: &'static str,
        found: String,
    },

    #[error("checksum mismatch for {file}: header records {expected}, file hashes to {actual}")]
    ChecksumMismatch {
        file: String,
        expected: Digest,
        actual: Digest,
    },

    #[error("unsupported snapshot format version: {0}")]
    UnsupportedVersion(u32),

    /// The producer stopped before the array was fully read. The cause, if
    /// any, was delivered in-band before the channel closed.
    #[error("stream ended before the array was complete")]
    StreamAborted,

    #[error("stream producer panicked")]
    ProducerPanicked,
}

pub type CodecResult<T> = Result<T, CodecError>;
