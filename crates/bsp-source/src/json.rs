use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{SourceError, SourceResult};
use crate::memory::InMemoryLedger;
use crate::record::AccountRecord;
use crate::traits::{AssetRegistry, SourceContext, TokenInfo};

/// A ledger state exported to a single JSON document.
///
/// ```json
/// {
///   "chain_id": "bsc-fork",
///   "block_height": 100,
///   "commit_id": { "version": 100, "hash": "0x…" },
///   "tokens": [ { "symbol": "BNB", "owner": "0x…" } ],
///   "accounts": [ { "address": "0x…", "account_number": 1, "coins": [ … ] } ]
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerDump {
    #[serde(flatten)]
    pub context: SourceContext,
    #[serde(default)]
    pub tokens: Vec<TokenInfo>,
    #[serde(default)]
    pub accounts: Vec<AccountRecord>,
}

impl InMemoryLedger {
    /// Build a ledger from a dump. Duplicate account addresses are rejected.
    pub fn from_dump(dump: LedgerDump) -> SourceResult<Self> {
        let ledger = Self::new(dump.context);
        for token in dump.tokens {
            ledger.register_token(token)?;
        }
        for account in dump.accounts {
            ledger.insert_account(account)?;
        }
        Ok(ledger)
    }

    /// Load a ledger dump from a JSON file.
    pub fn load_json(path: impl AsRef<Path>) -> SourceResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let dump: LedgerDump = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| SourceError::Malformed(format!("{}: {e}", path.display())))?;
        let ledger = Self::from_dump(dump)?;
        info!(
            path = %path.display(),
            accounts = ledger.account_count()?,
            "loaded ledger dump"
        );
        Ok(ledger)
    }

    /// The ledger's current state as a dump.
    pub fn to_dump(&self) -> SourceResult<LedgerDump> {
        Ok(LedgerDump {
            context: crate::traits::AccountSource::context(self)?,
            tokens: self.tokens()?,
            accounts: self.accounts()?,
        })
    }
}
