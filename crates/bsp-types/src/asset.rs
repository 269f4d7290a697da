use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Maximum accepted length of an asset symbol, in bytes.
pub const MAX_SYMBOL_LEN: usize = 64;

/// Width in bytes of the symbol field inside a leaf encoding.
///
/// Symbols longer than this are truncated when encoded, so two symbols that
/// share their first 32 bytes encode identically.
pub const SYMBOL_FIELD_LEN: usize = 32;

/// Bounded-length asset identifier (denomination).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetSymbol(String);

impl AssetSymbol {
    /// Validate and wrap a symbol: non-empty, printable ASCII, at most
    /// [`MAX_SYMBOL_LEN`] bytes.
    pub fn new(symbol: impl Into<String>) -> Result<Self, TypeError> {
        let symbol = symbol.into();
        let reason = if symbol.is_empty() {
            Some("empty symbol")
        } else if symbol.len() > MAX_SYMBOL_LEN {
            Some("symbol too long")
        } else if !symbol.bytes().all(|b| b.is_ascii_graphic()) {
            Some("symbol must be printable ASCII without spaces")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(TypeError::InvalidSymbol {
                symbol,
                reason: reason.into(),
            }),
            None => Ok(Self(symbol)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Whether the leaf encoding drops part of this symbol.
    pub fn is_truncated_in_leaf(&self) -> bool {
        self.0.len() > SYMBOL_FIELD_LEN
    }
}

impl TryFrom<String> for AssetSymbol {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for AssetSymbol {
    type Error = TypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AssetSymbol> for String {
    fn from(symbol: AssetSymbol) -> Self {
        symbol.0
    }
}

impl fmt::Debug for AssetSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetSymbol({})", self.0)
    }
}

impl fmt::Display for AssetSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Non-negative token amount.
///
/// Held as `u128`; always encoded into a 32-byte big-endian field so the
/// encoding has no leading-zero ambiguity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Self = Self(0);

    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u128 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Addition that reports overflow instead of wrapping.
    pub fn checked_add(self, rhs: Amount) -> Result<Amount, TypeError> {
        self.0
            .checked_add(rhs.0)
            .map(Self)
            .ok_or(TypeError::AmountOverflow {
                lhs: self.0,
                rhs: rhs.0,
            })
    }

    /// The canonical 32-byte big-endian encoding.
    pub fn to_be_bytes_32(self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out[16..].copy_from_slice(&self.0.to_be_bytes());
        out
    }
}

impl From<u128> for Amount {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(value as u128)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One balance line item: an amount of a single asset.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom: AssetSymbol,
    pub amount: Amount,
}

impl Coin {
    pub fn new(denom: AssetSymbol, amount: impl Into<Amount>) -> Self {
        Self {
            denom,
            amount: amount.into(),
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// A normalized set of coins: sorted by denomination, one entry per
/// denomination, no zero amounts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Coin>", into = "Vec<Coin>")]
pub struct Coins(Vec<Coin>);

impl Coins {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Normalize arbitrary line items, summing duplicates.
    pub fn new(coins: Vec<Coin>) -> Result<Self, TypeError> {
        let mut sorted = coins;
        sorted.sort_by(|a, b| a.denom.cmp(&b.denom));
        let mut out: Vec<Coin> = Vec::with_capacity(sorted.len());
        for coin in sorted {
            match out.last_mut() {
                Some(last) if last.denom == coin.denom => {
                    last.amount = last.amount.checked_add(coin.amount)?;
                }
                _ => out.push(coin),
            }
        }
        out.retain(|c| !c.amount.is_zero());
        Ok(Self(out))
    }

    /// Merge two coin sets, summing amounts per denomination.
    pub fn plus(&self, other: &Coins) -> Result<Coins, TypeError> {
        let mut out = Vec::with_capacity(self.0.len() + other.0.len());
        let (mut a, mut b) = (self.0.iter().peekable(), other.0.iter().peekable());
        loop {
            match (a.peek(), b.peek()) {
                (Some(x), Some(y)) => match x.denom.cmp(&y.denom) {
                    Ordering::Less => out.extend(a.next().cloned()),
                    Ordering::Greater => out.extend(b.next().cloned()),
                    Ordering::Equal => {
                        let merged = Coin::new(x.denom.clone(), x.amount.checked_add(y.amount)?);
                        out.push(merged);
                        a.next();
                        b.next();
                    }
                },
                (Some(_), None) => out.extend(a.by_ref().cloned()),
                (None, Some(_)) => out.extend(b.by_ref().cloned()),
                (None, None) => break,
            }
        }
        Ok(Self(out))
    }

    /// Amount held of `denom`, zero if absent.
    pub fn amount_of(&self, denom: &AssetSymbol) -> Amount {
        self.0
            .binary_search_by(|c| c.denom.cmp(denom))
            .map(|i| self.0[i].amount)
            .unwrap_or(Amount::ZERO)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Coin> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Coin] {
        &self.0
    }
}

impl TryFrom<Vec<Coin>> for Coins {
    type Error = TypeError;

    fn try_from(value: Vec<Coin>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Coins> for Vec<Coin> {
    fn from(coins: Coins) -> Self {
        coins.0
    }
}

impl<'a> IntoIterator for &'a Coins {
    type Item = &'a Coin;
    type IntoIter = std::slice::Iter<'a, Coin>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
