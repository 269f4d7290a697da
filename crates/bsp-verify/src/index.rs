use std::collections::hash_map::Entry;
use std::collections::HashMap;

use bsp_types::{Amount, Digest, LeafKey, ProofRecord};

use crate::error::{VerifyError, VerifyResult};

/// Recorded amount and sibling path of one proof.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexedProof {
    pub amount: Amount,
    pub siblings: Vec<Digest>,
}

/// Every proof of a snapshot, keyed by (owner, asset, index).
///
/// Proofs are removed as the scan claims them, so whatever is left after a
/// complete scan was claimed by no source leaf.
#[derive(Debug, Default)]
pub struct ProofIndex {
    entries: HashMap<LeafKey, IndexedProof>,
}

impl ProofIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a decoded proof. A second proof for the same key is an error.
    pub fn insert(&mut self, record: ProofRecord) -> VerifyResult<()> {
        match self.entries.entry(record.key()) {
            Entry::Occupied(slot) => Err(VerifyError::DuplicateProof(slot.key().clone())),
            Entry::Vacant(slot) => {
                slot.insert(IndexedProof {
                    amount: record.amount,
                    siblings: record.proof,
                });
                Ok(())
            }
        }
    }

    /// Remove and return the proof for `key`.
    pub fn take(&mut self, key: &LeafKey) -> Option<IndexedProof> {
        self.entries.remove(key)
    }

    pub fn get(&self, key: &LeafKey) -> Option<&IndexedProof> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
