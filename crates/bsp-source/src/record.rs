use bsp_types::{Address, Coins};
use serde::{Deserialize, Serialize};

use crate::traits::BalanceAccount;

/// Canonical account representation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub address: Address,
    pub account_number: u64,
    #[serde(default)]
    pub sequence: u64,
    /// Available (spendable) balance.
    #[serde(default)]
    pub coins: Coins,
    #[serde(default)]
    pub frozen_coins: Coins,
    #[serde(default)]
    pub locked_coins: Coins,
}

impl AccountRecord {
    pub fn new(address: Address, account_number: u64) -> Self {
        Self {
            address,
            account_number,
            sequence: 0,
            coins: Coins::empty(),
            frozen_coins: Coins::empty(),
            locked_coins: Coins::empty(),
        }
    }

    pub fn with_available(mut self, coins: Coins) -> Self {
        self.coins = coins;
        self
    }

    pub fn with_frozen(mut self, coins: Coins) -> Self {
        self.frozen_coins = coins;
        self
    }

    pub fn with_locked(mut self, coins: Coins) -> Self {
        self.locked_coins = coins;
        self
    }
}

impl BalanceAccount for AccountRecord {
    fn address(&self) -> Address {
        self.address
    }

    fn account_number(&self) -> u64 {
        self.account_number
    }

    fn sequence(&self) -> u64 {
        self.sequence
    }

    fn available(&self) -> &Coins {
        &self.coins
    }

    fn frozen(&self) -> &Coins {
        &self.frozen_coins
    }

    fn locked(&self) -> &Coins {
        &self.locked_coins
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bsp_types::{AssetSymbol, BalanceCategory, Coin};

    #[test]
    fn category_accessor_dispatches() {
        let bnb = AssetSymbol::new("BNB").unwrap();
        let record = AccountRecord::new(Address::from_raw([1; 20]), 3)
            .with_available(Coins::new(vec![Coin::new(bnb.clone(), 1u64)]).unwrap())
            .with_frozen(Coins::new(vec![Coin::new(bnb.clone(), 2u64)]).unwrap())
            .with_locked(Coins::new(vec![Coin::new(bnb.clone(), 3u64)]).unwrap());
        let amounts: Vec<u128> = BalanceCategory::ALL
            .iter()
            .map(|c| record.category(*c).amount_of(&bnb).get())
            .collect();
        assert_eq!(amounts, vec![1, 2, 3]);
    }

    #[test]
    fn missing_categories_default_empty() {
        let json = r#"{"address":"0x0101010101010101010101010101010101010101","account_number":9}"#;
        let record: AccountRecord = serde_json::from_str(json).unwrap();
        assert!(record.coins.is_empty());
        assert!(record.frozen_coins.is_empty());
        assert_eq!(record.sequence, 0);
    }
}
