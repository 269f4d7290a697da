use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use bsp_types::{Address, Amount, AssetSymbol, AssetTotal, Coins};

use crate::error::{AggregateError, AggregateResult};

/// Per-asset supply accumulated over one aggregation run.
///
/// Retained accounts add to `amount`; excluded escrow accounts add to
/// `escrowed`. The two are never mixed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssetTotals {
    totals: BTreeMap<AssetSymbol, AssetTotal>,
}

impl AssetTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `asset` has an entry, i.e. its owner is already resolved.
    pub fn contains(&self, asset: &AssetSymbol) -> bool {
        self.totals.contains_key(asset)
    }

    /// Open an entry for `asset` with its registered owner. No-op when the
    /// entry already exists.
    pub fn open(&mut self, asset: AssetSymbol, owner: Address) {
        if let Entry::Vacant(slot) = self.totals.entry(asset) {
            slot.insert(AssetTotal {
                owner,
                amount: Amount::ZERO,
                escrowed: Amount::ZERO,
            });
        }
    }

    /// Add the holdings of a retained account. Every asset must be open.
    pub fn add_retained(&mut self, holder: Address, coins: &Coins) -> AggregateResult<()> {
        self.add(holder, coins, |total| &mut total.amount)
    }

    /// Add the holdings of an excluded account. Every asset must be open.
    pub fn add_escrowed(&mut self, holder: Address, coins: &Coins) -> AggregateResult<()> {
        self.add(holder, coins, |total| &mut total.escrowed)
    }

    fn add(
        &mut self,
        holder: Address,
        coins: &Coins,
        field: impl Fn(&mut AssetTotal) -> &mut Amount,
    ) -> AggregateResult<()> {
        for coin in coins.iter() {
            let Some(total) = self.totals.get_mut(&coin.denom) else {
                continue;
            };
            let slot = field(total);
            *slot = slot
                .checked_add(coin.amount)
                .map_err(|source| AggregateError::Overflow {
                    address: holder,
                    source,
                })?;
        }
        Ok(())
    }

    pub fn get(&self, asset: &AssetSymbol) -> Option<&AssetTotal> {
        self.totals.get(asset)
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AssetSymbol, &AssetTotal)> {
        self.totals.iter()
    }

    pub fn as_map(&self) -> &BTreeMap<AssetSymbol, AssetTotal> {
        &self.totals
    }

    pub fn into_map(self) -> BTreeMap<AssetSymbol, AssetTotal> {
        self.totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bsp_types::Coin;

    fn bnb() -> AssetSymbol {
        AssetSymbol::new("BNB").unwrap()
    }

    fn coins(amount: u128) -> Coins {
        Coins::new(vec![Coin::new(bnb(), amount)]).unwrap()
    }

    #[test]
    fn retained_and_escrowed_tracked_separately() {
        let holder = Address::from_raw([1; 20]);
        let mut totals = AssetTotals::new();
        totals.open(bnb(), Address::from_raw([9; 20]));
        totals.add_retained(holder, &coins(10)).unwrap();
        totals.add_retained(holder, &coins(5)).unwrap();
        totals.add_escrowed(holder, &coins(100)).unwrap();

        let total = totals.get(&bnb()).unwrap();
        assert_eq!(total.amount, Amount::new(15));
        assert_eq!(total.escrowed, Amount::new(100));
        assert_eq!(total.owner, Address::from_raw([9; 20]));
    }

    #[test]
    fn reopening_keeps_accumulated_amount() {
        let holder = Address::from_raw([1; 20]);
        let mut totals = AssetTotals::new();
        totals.open(bnb(), Address::ZERO);
        totals.add_retained(holder, &coins(3)).unwrap();
        totals.open(bnb(), Address::from_raw([2; 20]));
        assert_eq!(totals.get(&bnb()).unwrap().amount, Amount::new(3));
        assert_eq!(totals.get(&bnb()).unwrap().owner, Address::ZERO);
    }

    #[test]
    fn overflow_names_the_holder() {
        let holder = Address::from_raw([4; 20]);
        let mut totals = AssetTotals::new();
        totals.open(bnb(), Address::ZERO);
        totals.add_retained(holder, &coins(u128::MAX)).unwrap();
        let err = totals.add_retained(holder, &coins(1)).unwrap_err();
        assert!(matches!(err, AggregateError::Overflow { address, .. } if address == holder));
    }
}
