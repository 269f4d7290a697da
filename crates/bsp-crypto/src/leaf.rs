use bsp_types::{AssetSymbol, BalanceFact, Digest, LeafSchema, ADDRESS_LEN, SYMBOL_FIELD_LEN};
use sha3::{Digest as _, Keccak256};

use crate::error::{CryptoError, CryptoResult};

/// Width of the big-endian amount field.
pub const AMOUNT_FIELD_LEN: usize = 32;

/// Width of the big-endian positional index appended by indexed schemas.
pub const INDEX_FIELD_LEN: usize = 8;

/// Encoded length of a `summed-v1` leaf.
pub const SUMMED_LEAF_LEN: usize = ADDRESS_LEN + SYMBOL_FIELD_LEN + AMOUNT_FIELD_LEN;

/// Encoded length of a `per-category-v2` leaf.
pub const INDEXED_LEAF_LEN: usize = SUMMED_LEAF_LEN + INDEX_FIELD_LEN;

/// Keccak-256 of `data`.
pub fn keccak256(data: &[u8]) -> Digest {
    Digest::from_hash(Keccak256::digest(data).into())
}

/// Keccak-256 of the concatenation of `parts`, without allocating it.
pub fn keccak256_concat(parts: &[&[u8]]) -> Digest {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    Digest::from_hash(hasher.finalize().into())
}

/// The fixed-width symbol field: symbol bytes left-aligned, zero-filled on
/// the right, truncated at [`SYMBOL_FIELD_LEN`].
pub fn symbol_field(symbol: &AssetSymbol) -> [u8; SYMBOL_FIELD_LEN] {
    let mut field = [0u8; SYMBOL_FIELD_LEN];
    let bytes = symbol.as_bytes();
    let n = bytes.len().min(SYMBOL_FIELD_LEN);
    field[..n].copy_from_slice(&bytes[..n]);
    field
}

/// Deterministic leaf encoder for one schema.
///
/// The digest depends only on the fact's fields: never salted, never
/// influenced by the leaf's position in the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LeafEncoder {
    schema: LeafSchema,
}

impl LeafEncoder {
    pub const SUMMED_V1: Self = Self::new(LeafSchema::SummedV1);
    pub const PER_CATEGORY_V2: Self = Self::new(LeafSchema::PerCategoryV2);

    pub const fn new(schema: LeafSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> LeafSchema {
        self.schema
    }

    /// Canonical byte encoding of `fact`.
    pub fn encode(&self, fact: &BalanceFact) -> CryptoResult<Vec<u8>> {
        if fact.amount.is_zero() {
            return Err(self.encoding_error("zero amount cannot become a leaf"));
        }
        let mut out = Vec::with_capacity(INDEXED_LEAF_LEN);
        out.extend_from_slice(fact.owner.as_bytes());
        out.extend_from_slice(&symbol_field(&fact.asset));
        out.extend_from_slice(&fact.amount.to_be_bytes_32());
        match (self.schema.is_indexed(), fact.index) {
            (false, None) => {}
            (true, Some(index)) => out.extend_from_slice(&index.to_be_bytes()),
            (false, Some(_)) => {
                return Err(self.encoding_error("schema does not carry a positional index"));
            }
            (true, None) => return Err(self.encoding_error("missing positional index")),
        }
        Ok(out)
    }

    /// Leaf digest: Keccak-256 of the canonical encoding.
    pub fn digest(&self, fact: &BalanceFact) -> CryptoResult<Digest> {
        Ok(keccak256(&self.encode(fact)?))
    }

    fn encoding_error(&self, reason: &str) -> CryptoError {
        CryptoError::Encoding {
            schema: self.schema,
            reason: reason.into(),
        }
    }
}

impl Default for LeafEncoder {
    fn default() -> Self {
        Self::SUMMED_V1
    }
}
