//! Foundation types for balance snapshots.
//!
//! Every other BSP crate depends on `bsp-types`. The types here fix the data
//! model of a snapshot: who owns what, how much, and how the published
//! artifact (header, account summaries, per-leaf proofs) is shaped on disk.
//!
//! # Key Types
//!
//! - [`Address`]: Opaque 20-byte owner identity
//! - [`AssetSymbol`]: Bounded-length asset denomination
//! - [`Amount`]: Non-negative amount with a 32-byte big-endian encoding
//! - [`Coins`]: Normalized per-asset balance line items
//! - [`Digest`]: 32-byte hash output, `0x` hex on the wire
//! - [`BalanceFact`]: One (owner, asset, amount) leaf candidate
//! - [`SnapshotHeader`], [`AccountSummary`], [`ProofRecord`]: persisted records

pub mod address;
pub mod asset;
pub mod digest;
pub mod error;
pub mod fact;
pub mod snapshot;

pub use address::{Address, ADDRESS_LEN};
pub use asset::{Amount, AssetSymbol, Coin, Coins, MAX_SYMBOL_LEN, SYMBOL_FIELD_LEN};
pub use digest::{Digest, DIGEST_LEN};
pub use error::TypeError;
pub use fact::{BalanceCategory, BalanceFact, LeafKey};
pub use snapshot::{
    AccountSummary, AssetPolicy, AssetTotal, CommitId, LeafSchema, ProofRecord, SnapshotHeader,
    StreamChecksums, FORMAT_VERSION,
};
