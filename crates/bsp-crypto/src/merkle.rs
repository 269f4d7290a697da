use bsp_types::Digest;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::leaf::keccak256_concat;

/// Root of a tree with no leaves.
///
/// The all-zero digest is a sentinel, not the hash of anything: no leaf
/// encoding can produce it in practice, and verifiers treat a zero root with
/// zero proofs as an empty snapshot.
pub const EMPTY_ROOT: Digest = Digest::ZERO;

/// Levels with fewer pairs than this are reduced on the calling thread.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 1024;

/// Commutative pair-hash: `keccak256(min(a, b) || max(a, b))`.
///
/// Digests are ordered as unsigned byte strings, so a verifier can fold a
/// proof without knowing which side each sibling was on.
pub fn pair_hash(a: &Digest, b: &Digest) -> Digest {
    if a <= b {
        keccak256_concat(&[a.as_bytes(), b.as_bytes()])
    } else {
        keccak256_concat(&[b.as_bytes(), a.as_bytes()])
    }
}

/// Fold a leaf digest through its sibling path.
pub fn fold_proof(leaf: Digest, siblings: &[Digest]) -> Digest {
    siblings
        .iter()
        .fold(leaf, |current, sibling| pair_hash(&current, sibling))
}

/// Returns `true` if `leaf` folded through `siblings` reproduces `root`.
pub fn verify_proof(root: &Digest, leaf: Digest, siblings: &[Digest]) -> bool {
    fold_proof(leaf, siblings) == *root
}

/// Binary Merkle tree over leaf digests with a commutative pair-hash.
///
/// Levels are reduced bottom-up, pairing digests left to right. An odd
/// trailing digest is carried up unchanged to the next level rather than
/// paired with itself. Leaf order is significant: permuting the leaves
/// generally changes the root.
///
/// Only the digests are held; per-leaf sibling paths are derived on demand so
/// callers can stream proofs without materializing all of them.
#[derive(Clone, Debug)]
pub struct MerkleTree {
    /// Level 0 = leaves, last level = `[root]`. Empty for an empty tree.
    levels: Vec<Vec<Digest>>,
}

impl MerkleTree {
    /// Build a tree, reducing large levels in parallel.
    pub fn build(leaves: Vec<Digest>) -> Self {
        Self::build_with_threshold(leaves, DEFAULT_PARALLEL_THRESHOLD)
    }

    /// Build a tree, reducing levels with at least `parallel_threshold` pairs
    /// on the rayon pool. Pairs within a level are independent; levels are
    /// reduced strictly in order.
    pub fn build_with_threshold(leaves: Vec<Digest>, parallel_threshold: usize) -> Self {
        if leaves.is_empty() {
            warn!("building Merkle tree over zero leaves; root is the empty-tree sentinel");
            return Self { levels: vec![] };
        }

        let leaf_count = leaves.len();
        let mut levels = vec![leaves];
        loop {
            let current = &levels[levels.len() - 1];
            if current.len() <= 1 {
                break;
            }
            let next: Vec<Digest> = if current.len() / 2 >= parallel_threshold {
                current.par_chunks(2).map(reduce_chunk).collect()
            } else {
                current.chunks(2).map(reduce_chunk).collect()
            };
            levels.push(next);
        }

        debug!(leaves = leaf_count, depth = levels.len() - 1, "Merkle tree built");
        Self { levels }
    }

    /// Build a tree and materialize every sibling path, in leaf order.
    pub fn build_with_proofs(leaves: Vec<Digest>) -> (Digest, Vec<Vec<Digest>>) {
        let tree = Self::build(leaves);
        let proofs = tree.proofs().collect();
        (tree.root(), proofs)
    }

    /// The root digest, or [`EMPTY_ROOT`] for an empty tree.
    pub fn root(&self) -> Digest {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or(EMPTY_ROOT)
    }

    pub fn leaf_count(&self) -> usize {
        self.levels.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.leaf_count() == 0
    }

    /// The leaf digests in insertion order.
    pub fn leaves(&self) -> &[Digest] {
        self.levels.first().map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of levels above the leaves.
    pub fn depth(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    /// Sibling path for the leaf at `index`, leaf-adjacent sibling first.
    ///
    /// A level where the ancestor was carried up unpaired contributes no
    /// sibling, so paths in the same tree may differ in length.
    pub fn proof(&self, index: usize) -> Option<Vec<Digest>> {
        if index >= self.leaf_count() {
            return None;
        }
        let mut path = Vec::with_capacity(self.depth());
        let mut idx = index;
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling = idx ^ 1;
            if sibling < level.len() {
                path.push(level[sibling]);
            }
            idx /= 2;
        }
        Some(path)
    }

    /// Sibling paths for every leaf, in leaf order, computed lazily.
    pub fn proofs(&self) -> impl Iterator<Item = Vec<Digest>> + '_ {
        (0..self.leaf_count()).filter_map(move |i| self.proof(i))
    }

    /// Length of the longest sibling path.
    pub fn max_proof_len(&self) -> usize {
        // The first leaf is never carried unpaired unless it is alone on a
        // level, so its path is the longest.
        self.proof(0).map_or(0, |p| p.len())
    }
}

fn reduce_chunk(chunk: &[Digest]) -> Digest {
    match chunk {
        [left, right] => pair_hash(left, right),
        _ => chunk[0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaf::{keccak256, LeafEncoder};
    use bsp_types::{Address, AssetSymbol, BalanceFact};
    use proptest::prelude::*;
    use rand::Rng;

    fn leaf(seed: u8) -> Digest {
        keccak256(&[seed])
    }

    fn random_leaves(n: usize) -> Vec<Digest> {
        let mut rng = rand::thread_rng();
        (0..n).map(|_| Digest::from_hash(rng.gen())).collect()
    }

    #[test]
    fn empty_tree_has_sentinel_root() {
        let tree = MerkleTree::build(vec![]);
        assert_eq!(tree.root(), EMPTY_ROOT);
        assert!(tree.is_empty());
        assert!(tree.proof(0).is_none());
        assert_eq!(tree.max_proof_len(), 0);
    }

    #[test]
    fn single_leaf_is_root_with_empty_proof() {
        let l = leaf(1);
        let (root, proofs) = MerkleTree::build_with_proofs(vec![l]);
        assert_eq!(root, l);
        assert_eq!(proofs, vec![Vec::<Digest>::new()]);
    }

    #[test]
    fn pair_hash_is_commutative() {
        assert_eq!(pair_hash(&leaf(1), &leaf(2)), pair_hash(&leaf(2), &leaf(1)));
    }

    #[test]
    fn two_facts_scenario() {
        let enc = LeafEncoder::SUMMED_V1;
        let x = AssetSymbol::new("X").unwrap();
        let a = BalanceFact::new(Address::from_raw([0xA; 20]), x.clone(), 10u64);
        let b = BalanceFact::new(Address::from_raw([0xB; 20]), x, 5u64);
        let la = enc.digest(&a).unwrap();
        let lb = enc.digest(&b).unwrap();

        let (root, proofs) = MerkleTree::build_with_proofs(vec![la, lb]);
        assert_eq!(root, pair_hash(&la, &lb));
        assert_eq!(proofs, vec![vec![lb], vec![la]]);
        assert!(verify_proof(&root, la, &proofs[0]));
        assert!(verify_proof(&root, lb, &proofs[1]));
    }

    #[test]
    fn odd_leaf_is_carried_not_duplicated() {
        let leaves = vec![leaf(1), leaf(2), leaf(3)];
        let tree = MerkleTree::build(leaves.clone());
        let expected = pair_hash(&pair_hash(&leaves[0], &leaves[1]), &leaves[2]);
        assert_eq!(tree.root(), expected);
        assert_eq!(tree.proof(2).unwrap(), vec![pair_hash(&leaves[0], &leaves[1])]);
        assert_eq!(tree.proof(0).unwrap().len(), 2);
    }

    #[test]
    fn proofs_verify_for_all_leaves() {
        for n in [2usize, 3, 5, 7, 8, 13, 64, 100] {
            let leaves = random_leaves(n);
            let tree = MerkleTree::build(leaves.clone());
            for (i, proof) in tree.proofs().enumerate() {
                assert!(verify_proof(&tree.root(), leaves[i], &proof), "n={n} leaf={i}");
            }
        }
    }

    #[test]
    fn power_of_two_paths_have_full_depth() {
        let tree = MerkleTree::build(random_leaves(8));
        for proof in tree.proofs() {
            assert_eq!(proof.len(), 3);
        }
        assert_eq!(tree.max_proof_len(), 3);
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let leaves = random_leaves(5_001);
        let sequential = MerkleTree::build_with_threshold(leaves.clone(), usize::MAX);
        let parallel = MerkleTree::build_with_threshold(leaves, 1);
        assert_eq!(sequential.root(), parallel.root());
        assert_eq!(sequential.proof(4_999), parallel.proof(4_999));
    }

    #[test]
    fn rebuild_is_deterministic() {
        let leaves = random_leaves(33);
        assert_eq!(
            MerkleTree::build(leaves.clone()).root(),
            MerkleTree::build(leaves).root()
        );
    }

    #[test]
    fn leaf_order_is_significant() {
        let leaves: Vec<Digest> = (0..4).map(leaf).collect();
        let mut swapped = leaves.clone();
        swapped.swap(1, 2);
        assert_ne!(MerkleTree::build(leaves).root(), MerkleTree::build(swapped).root());
    }

    #[test]
    fn tampered_sibling_fails() {
        let leaves = random_leaves(10);
        let tree = MerkleTree::build(leaves.clone());
        let mut proof = tree.proof(4).unwrap();
        let mut bytes = *proof[1].as_bytes();
        bytes[0] ^= 0x01;
        proof[1] = Digest::from_hash(bytes);
        assert!(!verify_proof(&tree.root(), leaves[4], &proof));
    }

    #[test]
    fn reference_vector_folds_to_published_root() {
        let root =
            Digest::from_hex("0x59bb94f7047904a8fdaec42e4785295167f7fd63742b309afeb84bd71f8e6554")
                .unwrap();
        let leaf =
            Digest::from_hex("0xe7b660e08a0bf3b78615c3a9d6804c31d6e29371e6dcde4280e5484ac8d18c86")
                .unwrap();
        let mut siblings: Vec<Digest> = [
            "0x061680518f3f97c075a62df766fa55c90b0c415140f737c0d1f7ace5ad2bfee6",
            "0x366f06cef0f1668d848819cb7b5a07b0093ad997da496e60060db2fee754857b",
            "0x6debec5a4272951843cf24f74c30d5ccf1afec9aafbfc45d0b50cb4eb6f89c09",
            "0x5cb2e4d880e2387764df4de9ce49cbabc41b6e4a07b1c2e1d9fc98957b6643d2",
            "0x88c6195b4444035bef3212847f38822c0d509d811de8c9154e7f5f8ec3778b67",
            "0x27c985cced25522043ded2fc8103baa24edc21b6c9f95c5bfff635ab36bdb29d",
            "0x39a0fbfba925ebd0cf4f5fe5ab4c69eb18317fd1bd4373647a53dc339fb764a9",
            "0x61300a7a7fe0932760c1e1edfa4d4450cc378d9b5c538dcb24ffbbc18f249fe5",
            "0x4d49fcf8a1e0b72b535921dea8e02baac18df614e7f7c462749a2b14ee2737ef",
            "0xc10261d3337346f921c4fef13ba1bcb46a531e947ce41c81e54404e970deaaf5",
            "0x3536a24678835b0f7adeae1f27dae7d6bb22598fb8f8578ec0eef5ea5146f85b",
            "0x925aab793d8080c4f8ea5034e195938c5550f7ba80acf7d7e7d8468f5b5dd70a",
            "0xdef2b6210654ac4f48b4556e24907e027e66729045d0c669a53c75a880477b48",
            "0x4bb1aab890245e6a9e1e969ae3f6f0315ea073606fd6fabe9f3d7514c84fee98",
            "0xe096d4b3669b1c7cd8fcff26b2b00029c09c0f38a34ae632b022622fb46ad69a",
            "0x05e63b558cba63f5add60201151f96ff8f5370d2b8280a96b4fa8fd2d519ab9f",
            "0xa2d456e52facaa953bfbc79a5a6ed7647dda59872b9b35c20183887eeb4640eb",
        ]
        .iter()
        .map(|s| Digest::from_hex(s).unwrap())
        .collect();

        assert!(verify_proof(&root, leaf, &siblings));

        let wrong_leaf =
            Digest::from_hex("0x111160e08a0bf3b78615c3a9d6804c31d6e29371e6dcde4280e5484ac8d18c86")
                .unwrap();
        assert!(!verify_proof(&root, wrong_leaf, &siblings));

        siblings[7] =
            Digest::from_hex("0x12344a7a7fe0932760c1e1edfa4d4450cc378d9b5c538dcb24ffbbc18f249fe5")
                .unwrap();
        assert!(!verify_proof(&root, leaf, &siblings));
    }

    proptest! {
        #[test]
        fn pair_hash_commutes(a in any::<[u8; 32]>(), b in any::<[u8; 32]>()) {
            let (a, b) = (Digest::from_hash(a), Digest::from_hash(b));
            prop_assert_eq!(pair_hash(&a, &b), pair_hash(&b, &a));
        }

        #[test]
        fn every_proof_folds_to_root(seeds in proptest::collection::vec(any::<[u8; 32]>(), 1..40)) {
            let leaves: Vec<Digest> = seeds.into_iter().map(Digest::from_hash).collect();
            let (root, proofs) = MerkleTree::build_with_proofs(leaves.clone());
            for (leaf, proof) in leaves.iter().zip(&proofs) {
                prop_assert!(verify_proof(&root, *leaf, proof));
            }
        }
    }
}
