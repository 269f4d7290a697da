//! Hashing and tree construction for balance snapshots.
//!
//! Provides the leaf encoder (canonical byte layout of a balance fact plus
//! Keccak-256), the commutative pair-hash, and a binary Merkle builder that
//! carries odd nodes upward instead of duplicating them.
//!
//! All hashing wraps the `sha3` crate; nothing here is custom cryptography.

pub mod error;
pub mod leaf;
pub mod merkle;

pub use error::{CryptoError, CryptoResult};
pub use leaf::{keccak256, keccak256_concat, symbol_field, LeafEncoder};
pub use merkle::{
    fold_proof, pair_hash, verify_proof, MerkleTree, DEFAULT_PARALLEL_THRESHOLD, EMPTY_ROOT,
};
