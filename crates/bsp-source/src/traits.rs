use std::ops::ControlFlow;

use bsp_types::{Address, AssetSymbol, BalanceCategory, CommitId, Coins};
use serde::{Deserialize, Serialize};

use crate::error::SourceResult;

/// Any account representation exposing an owner identity and three balance
/// categories.
pub trait BalanceAccount {
    fn address(&self) -> Address;

    fn account_number(&self) -> u64;

    fn sequence(&self) -> u64;

    fn available(&self) -> &Coins;

    fn frozen(&self) -> &Coins;

    fn locked(&self) -> &Coins;

    /// Line items of one category.
    fn category(&self, category: BalanceCategory) -> &Coins {
        match category {
            BalanceCategory::Available => self.available(),
            BalanceCategory::Frozen => self.frozen(),
            BalanceCategory::Locked => self.locked(),
        }
    }
}

/// Identity of the ledger state a source reads from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceContext {
    pub chain_id: String,
    pub block_height: u64,
    pub commit_id: CommitId,
}

/// Registered token metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub symbol: AssetSymbol,
    pub owner: Address,
    /// Set for tokens bridged to an external chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
}

impl TokenInfo {
    pub fn is_bridged(&self) -> bool {
        self.contract_address
            .as_deref()
            .is_some_and(|addr| !addr.is_empty())
    }
}

/// Read-only account iteration over one ledger state.
///
/// Implementations must visit every account exactly once, in a stable order,
/// and must not skip or reorder accounts between calls on the same state.
pub trait AccountSource: Send + Sync {
    /// Chain id, height, and commit of the state being iterated.
    fn context(&self) -> SourceResult<SourceContext>;

    /// Invoke `visitor` once per account. Iteration ends early, without
    /// error, when the visitor returns [`ControlFlow::Break`].
    fn iterate_accounts(
        &self,
        visitor: &mut dyn FnMut(&dyn BalanceAccount) -> ControlFlow<()>,
    ) -> SourceResult<()>;
}

/// Asset metadata lookups.
pub trait AssetRegistry: Send + Sync {
    /// The registered owner (issuer) of `symbol`.
    ///
    /// Returns [`SourceError::AssetNotFound`](crate::SourceError::AssetNotFound)
    /// for unregistered symbols.
    fn resolve_asset_owner(&self, symbol: &AssetSymbol) -> SourceResult<Address>;

    /// Every registered token.
    fn tokens(&self) -> SourceResult<Vec<TokenInfo>>;
}
