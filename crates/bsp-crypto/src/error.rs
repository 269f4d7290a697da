use bsp_types::LeafSchema;

/// Errors from leaf encoding.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CryptoError {
    /// A fact cannot be canonically encoded under the requested schema.
    #[error("cannot encode leaf under {schema}: {reason}")]
    Encoding { schema: LeafSchema, reason: String },
}

pub type CryptoResult<T> = Result<T, CryptoError>;
