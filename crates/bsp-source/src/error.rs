use bsp_types::{Address, AssetSymbol, TypeError};

/// Errors raised by a ledger source or asset registry.
///
/// Every variant is terminal for the run that observed it.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("asset not registered: {0}")]
    AssetNotFound(AssetSymbol),

    #[error("account iteration failed at {address}: {reason}")]
    Iteration { address: Address, reason: String },

    #[error("duplicate account in source: {0}")]
    DuplicateAccount(Address),

    #[error("source lock poisoned")]
    LockPoisoned,

    #[error("malformed ledger dump: {0}")]
    Malformed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Type(#[from] TypeError),
}

pub type SourceResult<T> = Result<T, SourceError>;
