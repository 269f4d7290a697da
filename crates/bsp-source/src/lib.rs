//! Ledger source boundary for balance snapshots.
//!
//! Export and verification never touch ledger storage directly. They read
//! through two narrow traits:
//! - [`AccountSource`] iterates every account of one committed state
//! - [`AssetRegistry`] resolves the registered owner of an asset
//!
//! [`InMemoryLedger`] implements both, for tests and for snapshots taken
//! from a JSON ledger dump.

pub mod error;
pub mod json;
pub mod memory;
pub mod record;
pub mod traits;

pub use error::{SourceError, SourceResult};
pub use json::LedgerDump;
pub use memory::InMemoryLedger;
pub use record::AccountRecord;
pub use traits::{AccountSource, AssetRegistry, BalanceAccount, SourceContext, TokenInfo};
