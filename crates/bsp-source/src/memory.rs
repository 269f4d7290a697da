use std::collections::{BTreeMap, HashMap};
use std::ops::ControlFlow;
use std::sync::RwLock;

use bsp_types::{Address, AssetSymbol};
use tracing::debug;

use crate::error::{SourceError, SourceResult};
use crate::record::AccountRecord;
use crate::traits::{AccountSource, AssetRegistry, BalanceAccount, SourceContext, TokenInfo};

/// In-memory ledger state for tests, local demos, and JSON dumps.
///
/// Accounts are iterated in insertion order. The visitor runs under the read
/// lock, so it must not call back into this ledger's mutating methods.
pub struct InMemoryLedger {
    context: SourceContext,
    inner: RwLock<LedgerState>,
}

#[derive(Default)]
struct LedgerState {
    accounts: Vec<AccountRecord>,
    positions: HashMap<Address, usize>,
    tokens: BTreeMap<AssetSymbol, TokenInfo>,
}

impl InMemoryLedger {
    pub fn new(context: SourceContext) -> Self {
        Self {
            context,
            inner: RwLock::new(LedgerState::default()),
        }
    }

    /// Append a new account. Addresses must be unique.
    pub fn insert_account(&self, record: AccountRecord) -> SourceResult<()> {
        let mut state = self.inner.write().map_err(|_| SourceError::LockPoisoned)?;
        if state.positions.contains_key(&record.address) {
            return Err(SourceError::DuplicateAccount(record.address));
        }
        let position = state.accounts.len();
        state.positions.insert(record.address, position);
        state.accounts.push(record);
        Ok(())
    }

    /// Replace an existing account in place, or append it.
    pub fn upsert_account(&self, record: AccountRecord) -> SourceResult<()> {
        let mut state = self.inner.write().map_err(|_| SourceError::LockPoisoned)?;
        match state.positions.get(&record.address).copied() {
            Some(position) => state.accounts[position] = record,
            None => {
                let position = state.accounts.len();
                state.positions.insert(record.address, position);
                state.accounts.push(record);
            }
        }
        Ok(())
    }

    pub fn register_token(&self, token: TokenInfo) -> SourceResult<()> {
        let mut state = self.inner.write().map_err(|_| SourceError::LockPoisoned)?;
        state.tokens.insert(token.symbol.clone(), token);
        Ok(())
    }

    pub fn account_count(&self) -> SourceResult<usize> {
        let state = self.inner.read().map_err(|_| SourceError::LockPoisoned)?;
        Ok(state.accounts.len())
    }

    /// Snapshot of all accounts, in iteration order.
    pub fn accounts(&self) -> SourceResult<Vec<AccountRecord>> {
        let state = self.inner.read().map_err(|_| SourceError::LockPoisoned)?;
        Ok(state.accounts.clone())
    }
}

impl AccountSource for InMemoryLedger {
    fn context(&self) -> SourceResult<SourceContext> {
        Ok(self.context.clone())
    }

    fn iterate_accounts(
        &self,
        visitor: &mut dyn FnMut(&dyn BalanceAccount) -> ControlFlow<()>,
    ) -> SourceResult<()> {
        let state = self.inner.read().map_err(|_| SourceError::LockPoisoned)?;
        let mut visited = 0usize;
        for account in &state.accounts {
            visited += 1;
            if visitor(account).is_break() {
                debug!(visited, "account iteration stopped by visitor");
                break;
            }
        }
        Ok(())
    }
}

impl AssetRegistry for InMemoryLedger {
    fn resolve_asset_owner(&self, symbol: &AssetSymbol) -> SourceResult<Address> {
        let state = self.inner.read().map_err(|_| SourceError::LockPoisoned)?;
        state
            .tokens
            .get(symbol)
            .map(|token| token.owner)
            .ok_or_else(|| SourceError::AssetNotFound(symbol.clone()))
    }

    fn tokens(&self) -> SourceResult<Vec<TokenInfo>> {
        let state = self.inner.read().map_err(|_| SourceError::LockPoisoned)?;
        Ok(state.tokens.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bsp_types::{CommitId, Digest};

    fn ctx() -> SourceContext {
        SourceContext {
            chain_id: "test".into(),
            block_height: 10,
            commit_id: CommitId {
                version: 10,
                hash: Digest::ZERO,
            },
        }
    }

    fn addr(seed: u8) -> Address {
        Address::from_raw([seed; 20])
    }

    #[test]
    fn iterates_in_insertion_order() {
        let ledger = InMemoryLedger::new(ctx());
        for seed in [3u8, 1, 2] {
            ledger.insert_account(AccountRecord::new(addr(seed), seed as u64)).unwrap();
        }
        let mut seen = Vec::new();
        ledger
            .iterate_accounts(&mut |acc| {
                seen.push(acc.address());
                ControlFlow::Continue(())
            })
            .unwrap();
        assert_eq!(seen, vec![addr(3), addr(1), addr(2)]);
    }

    #[test]
    fn visitor_can_stop_early() {
        let ledger = InMemoryLedger::new(ctx());
        for seed in 0..5u8 {
            ledger.insert_account(AccountRecord::new(addr(seed), 0)).unwrap();
        }
        let mut count = 0;
        ledger
            .iterate_accounts(&mut |_| {
                count += 1;
                if count == 2 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn duplicate_account_rejected() {
        let ledger = InMemoryLedger::new(ctx());
        ledger.insert_account(AccountRecord::new(addr(1), 0)).unwrap();
        let err = ledger.insert_account(AccountRecord::new(addr(1), 1)).unwrap_err();
        assert!(matches!(err, SourceError::DuplicateAccount(a) if a == addr(1)));
    }

    #[test]
    fn upsert_keeps_position() {
        let ledger = InMemoryLedger::new(ctx());
        ledger.insert_account(AccountRecord::new(addr(1), 0)).unwrap();
        ledger.insert_account(AccountRecord::new(addr(2), 0)).unwrap();
        ledger.upsert_account(AccountRecord::new(addr(1), 42)).unwrap();
        let accounts = ledger.accounts().unwrap();
        assert_eq!(accounts[0].account_number, 42);
        assert_eq!(ledger.account_count().unwrap(), 2);
    }

    #[test]
    fn unknown_asset_owner_is_not_found() {
        let ledger = InMemoryLedger::new(ctx());
        let bnb = AssetSymbol::new("BNB").unwrap();
        assert!(matches!(
            ledger.resolve_asset_owner(&bnb),
            Err(SourceError::AssetNotFound(_))
        ));
        ledger
            .register_token(TokenInfo {
                symbol: bnb.clone(),
                owner: addr(9),
                contract_address: None,
            })
            .unwrap();
        assert_eq!(ledger.resolve_asset_owner(&bnb).unwrap(), addr(9));
    }
}
