use bsp_source::SourceError;
use bsp_types::{Address, TypeError};

/// Errors from record aggregation. All of them abort the run.
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// Summing balance categories or totals overflowed.
    #[error("cannot aggregate balances of {address}: {source}")]
    Overflow {
        address: Address,
        #[source]
        source: TypeError,
    },

    #[error("summary sink failed: {0}")]
    Sink(#[from] std::io::Error),
}

pub type AggregateResult<T> = Result<T, AggregateError>;
