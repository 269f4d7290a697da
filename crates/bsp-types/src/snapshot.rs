use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::asset::{Amount, AssetSymbol, Coins};
use crate::digest::Digest;
use crate::error::TypeError;
use crate::fact::LeafKey;

/// Version of the on-disk snapshot layout.
pub const FORMAT_VERSION: u32 = 1;

/// Leaf-encoding scheme, recorded in every snapshot header.
///
/// A snapshot uses exactly one scheme; verifiers select it from the header
/// instead of inferring it from the proofs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LeafSchema {
    /// One leaf per (owner, asset) with all balance categories summed.
    /// Encoding: `address || symbol[32] || amount[32]`.
    #[default]
    SummedV1,
    /// One leaf per (owner, asset, category), disambiguated by the category
    /// ordinal. Encoding: `address || symbol[32] || amount[32] || index[8]`.
    PerCategoryV2,
}

impl LeafSchema {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SummedV1 => "summed-v1",
            Self::PerCategoryV2 => "per-category-v2",
        }
    }

    /// Whether leaves under this schema carry a positional index.
    pub fn is_indexed(self) -> bool {
        matches!(self, Self::PerCategoryV2)
    }
}

impl fmt::Display for LeafSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeafSchema {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "summed-v1" => Ok(Self::SummedV1),
            "per-category-v2" => Ok(Self::PerCategoryV2),
            other => Err(TypeError::UnknownVariant {
                kind: "leaf schema",
                value: other.into(),
            }),
        }
    }
}

/// Which assets are eligible to become leaves.
///
/// Account summaries always list every asset; the policy only restricts leaf
/// emission.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssetPolicy {
    /// Every asset with a positive balance.
    #[default]
    All,
    /// Only assets registered with a contract address, plus the native asset.
    Bridged { native: AssetSymbol },
}

/// Identifier of the ledger commit the snapshot was taken from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitId {
    pub version: u64,
    pub hash: Digest,
}

/// Per-asset supply accumulated across all retained accounts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetTotal {
    /// Registered issuer of the asset.
    pub owner: Address,
    /// Sum over retained (non-excluded) accounts.
    pub amount: Amount,
    /// Sum held by excluded escrow accounts; not part of `amount`.
    #[serde(default, skip_serializing_if = "Amount::is_zero")]
    pub escrowed: Amount,
}

/// BLAKE3 checksums of the streamed files, computed over their exact bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamChecksums {
    pub accounts: Digest,
    pub proofs: Digest,
}

/// The snapshot header, persisted as a single structured record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub format_version: u32,
    pub schema: LeafSchema,
    #[serde(default)]
    pub asset_policy: AssetPolicy,
    pub chain_id: String,
    pub block_height: u64,
    pub commit_id: CommitId,
    /// Merkle root over all leaves, `0x` hex.
    pub state_root: Digest,
    pub leaf_count: u64,
    pub account_count: u64,
    pub max_proof_length: u32,
    pub exported_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets: Option<BTreeMap<AssetSymbol, AssetTotal>>,
    pub checksums: StreamChecksums,
}

/// Per-account summary row, keeping the category breakdown next to the
/// summed totals used for leaves.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub address: Address,
    pub account_number: u64,
    /// Available + frozen + locked, per asset.
    #[serde(default, skip_serializing_if = "Coins::is_empty")]
    pub coins: Coins,
    #[serde(default, skip_serializing_if = "Coins::is_empty")]
    pub available_coins: Coins,
    #[serde(default, skip_serializing_if = "Coins::is_empty")]
    pub frozen_coins: Coins,
    #[serde(default, skip_serializing_if = "Coins::is_empty")]
    pub locked_coins: Coins,
}

/// One per-leaf inclusion proof as persisted in the proofs stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofRecord {
    pub address: Address,
    pub asset: AssetSymbol,
    pub amount: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u64>,
    /// Sibling digests from the leaf-adjacent level up to the root.
    pub proof: Vec<Digest>,
}

impl ProofRecord {
    pub fn key(&self) -> LeafKey {
        LeafKey {
            owner: self.address,
            asset: self.asset.clone(),
            index: self.index,
        }
    }
}
