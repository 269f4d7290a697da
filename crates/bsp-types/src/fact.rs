use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::asset::{Amount, AssetSymbol};

/// Balance category of a line item on an account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceCategory {
    Available,
    Frozen,
    Locked,
}

impl BalanceCategory {
    pub const ALL: [BalanceCategory; 3] = [Self::Available, Self::Frozen, Self::Locked];

    /// Ordinal used as the positional leaf index in per-category schemas.
    pub fn ordinal(self) -> u64 {
        match self {
            Self::Available => 0,
            Self::Frozen => 1,
            Self::Locked => 2,
        }
    }
}

/// One (owner, asset, amount) tuple eligible for Merkle inclusion.
///
/// `index` is only set by schemas that intentionally emit several leaves per
/// (owner, asset) pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BalanceFact {
    pub owner: Address,
    pub asset: AssetSymbol,
    pub amount: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u64>,
}

impl BalanceFact {
    pub fn new(owner: Address, asset: AssetSymbol, amount: impl Into<Amount>) -> Self {
        Self {
            owner,
            asset,
            amount: amount.into(),
            index: None,
        }
    }

    pub fn with_index(mut self, index: u64) -> Self {
        self.index = Some(index);
        self
    }

    /// The identity of this fact inside a snapshot.
    pub fn key(&self) -> LeafKey {
        LeafKey {
            owner: self.owner,
            asset: self.asset.clone(),
            index: self.index,
        }
    }
}

/// Lookup key for a leaf: owner, asset, and optional positional index.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LeafKey {
    pub owner: Address,
    pub asset: AssetSymbol,
    pub index: Option<u64>,
}

impl fmt::Display for LeafKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(i) => write!(f, "{}/{}#{i}", self.owner, self.asset),
            None => write!(f, "{}/{}", self.owner, self.asset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_ordinals_are_stable() {
        let ordinals: Vec<u64> = BalanceCategory::ALL.iter().map(|c| c.ordinal()).collect();
        assert_eq!(ordinals, vec![0, 1, 2]);
    }

    #[test]
    fn key_carries_index() {
        let fact = BalanceFact::new(Address::from_raw([1; 20]), AssetSymbol::new("BNB").unwrap(), 5u64)
            .with_index(2);
        let key = fact.key();
        assert_eq!(key.index, Some(2));
        assert!(key.to_string().ends_with("/BNB#2"));
    }

    #[test]
    fn serde_omits_absent_index() {
        let fact = BalanceFact::new(Address::ZERO, AssetSymbol::new("X").unwrap(), 1u64);
        let json = serde_json::to_string(&fact).unwrap();
        assert!(!json.contains("index"));
    }
}
