use std::collections::BTreeSet;

use bsp_types::{Address, ADDRESS_LEN};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

/// Seeds of the well-known custodial module accounts.
pub const DEFAULT_ESCROW_SEEDS: [&str; 4] = [
    "BinanceChainAtomicSwapCoins",
    "BinanceChainTimeLockCoins",
    "BinanceChainPegAccount",
    "BinanceChainStakeDelegation",
];

/// Additional exclusions on top of the defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExclusionConfig {
    /// Keep the default seeds and the zero address.
    pub include_defaults: bool,
    pub extra_seeds: Vec<String>,
    pub extra_addresses: Vec<Address>,
}

impl Default for ExclusionConfig {
    fn default() -> Self {
        Self {
            include_defaults: true,
            extra_seeds: Vec::new(),
            extra_addresses: Vec::new(),
        }
    }
}

/// Owner identities whose balances are custodial and never become leaves.
///
/// Pure and immutable once built; safe to share read-only across workers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExclusionSet {
    addresses: BTreeSet<Address>,
}

impl ExclusionSet {
    /// Address of a module account: the first 20 bytes of SHA-256(seed).
    pub fn seed_address(seed: &str) -> Address {
        let hash = Sha256::digest(seed.as_bytes());
        let mut raw = [0u8; ADDRESS_LEN];
        raw.copy_from_slice(&hash[..ADDRESS_LEN]);
        Address::from_raw(raw)
    }

    /// An exclusion set with nothing in it.
    pub fn empty() -> Self {
        Self {
            addresses: BTreeSet::new(),
        }
    }

    pub fn from_config(config: &ExclusionConfig) -> Self {
        let mut set = Self::empty();
        if config.include_defaults {
            set.addresses.insert(Address::ZERO);
            set.addresses
                .extend(DEFAULT_ESCROW_SEEDS.iter().map(|seed| Self::seed_address(seed)));
        }
        set.addresses
            .extend(config.extra_seeds.iter().map(|seed| Self::seed_address(seed)));
        set.addresses.extend(config.extra_addresses.iter().copied());
        set
    }

    pub fn insert(&mut self, address: Address) -> bool {
        self.addresses.insert(address)
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.addresses.contains(address)
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.addresses.iter()
    }
}

impl Default for ExclusionSet {
    fn default() -> Self {
        Self::from_config(&ExclusionConfig::default())
    }
}
