//! Merkle list proofs: the recursive node model and its structural validator.
//!
//! A proof for an append-only list is a tree mirroring the shape of the list's
//! merkle tree: branch nodes own their children, element nodes carry the proven
//! values, and hash nodes stand in for elided subtrees. Verification walks the tree
//! once collecting the depths at which leaves terminate, applies the shape
//! invariants, and only then recomputes the root digest bottom-up.
//!
//! A [`CheckedListProof`] is only half of acceptance: the recomputed digest must
//! also match the independently trusted root, via [`CheckedListProof::matches`].

use crate::hasher::{Hash, ProofHasher};
use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

/// The maximum depth at which an element or hash node may terminate.
///
/// List indices are 64-bit, so no honest proof is ever deeper; the bound also
/// caps the validator's recursion on hostile input.
pub const MAX_NODE_DEPTH: usize = 64;

/// A node in a list proof tree.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "borsh",
    derive(borsh::BorshDeserialize, borsh::BorshSerialize)
)]
pub enum ListProofNode {
    /// An interior node. A missing right child is legal only for the rightmost
    /// node of a level when the list has odd size at that level.
    Branch {
        /// The left subtree.
        left: Box<ListProofNode>,
        /// The right subtree, absent on the odd rightmost edge.
        right: Option<Box<ListProofNode>>,
    },
    /// A proven element of the list.
    Element(Vec<u8>),
    /// A precomputed digest standing in for an elided subtree.
    Hash(Hash),
}

impl ListProofNode {
    /// An element node carrying `value`.
    pub fn element(value: impl Into<Vec<u8>>) -> Self {
        ListProofNode::Element(value.into())
    }

    /// A branch with both children present.
    pub fn branch(left: ListProofNode, right: ListProofNode) -> Self {
        ListProofNode::Branch {
            left: Box::new(left),
            right: Some(Box::new(right)),
        }
    }

    /// A branch with no right child: the rightmost node of an odd-sized level.
    pub fn half_branch(left: ListProofNode) -> Self {
        ListProofNode::Branch {
            left: Box::new(left),
            right: None,
        }
    }
}

/// Structural failures of a list proof. Terminal outcomes, reported as data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListProofError {
    /// The tree contains no element nodes, so it attests to nothing.
    NoElements,
    /// Leaves terminate at depths inconsistent with a complete binary tree.
    UnbalancedDepth,
    /// An element node sits deeper than [`MAX_NODE_DEPTH`].
    ElementDepthOverflow,
    /// A hash node sits deeper than [`MAX_NODE_DEPTH`].
    HashDepthOverflow,
    /// A branch whose children are both hash nodes; a minimal proof would have
    /// collapsed them into a single hash one level up.
    RedundantHashNodes,
}

impl fmt::Display for ListProofError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ListProofError::NoElements => "proof tree contains no elements",
            ListProofError::UnbalancedDepth => "proof tree is unbalanced",
            ListProofError::ElementDepthOverflow => "element node deeper than the depth bound",
            ListProofError::HashDepthOverflow => "hash node deeper than the depth bound",
            ListProofError::RedundantHashNodes => "branch with two sibling hash nodes",
        };
        f.write_str(s)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ListProofError {}

/// A structurally valid list proof and its recomputed root digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedListProof {
    root_hash: Hash,
}

impl CheckedListProof {
    /// The recomputed root digest.
    pub fn root_hash(&self) -> &Hash {
        &self.root_hash
    }

    /// Whether the recomputed digest equals the trusted root. A structurally
    /// valid proof whose digest differs is still a failed proof.
    pub fn matches(&self, trusted_root: &Hash) -> bool {
        &self.root_hash == trusted_root
    }
}

/// Check the structure of a list proof and recompute its root digest.
///
/// Digest recomputation is bottom-up: a branch hashes the concatenation of its
/// children's digests (or its left child's digest alone when the right is
/// absent), an element hashes its value bytes, and a hash node contributes its
/// carried digest verbatim.
pub fn check_list_proof<H: ProofHasher>(
    proof: &ListProofNode,
) -> Result<CheckedListProof, ListProofError> {
    let mut shape = TreeShape::default();
    shape.scan(proof, 0);
    shape.validate()?;
    Ok(CheckedListProof {
        root_hash: node_hash::<H>(proof),
    })
}

/// Observed leaf depths and shape violations, gathered in one walk.
#[derive(Default)]
struct TreeShape {
    element_depths: Option<(usize, usize)>,
    max_hash_depth: usize,
    deep_branch: bool,
    redundant_hash_pair: bool,
}

impl TreeShape {
    fn scan(&mut self, node: &ListProofNode, depth: usize) {
        match node {
            ListProofNode::Element(_) => {
                self.element_depths = Some(match self.element_depths {
                    None => (depth, depth),
                    Some((min, max)) => (min.min(depth), max.max(depth)),
                });
            }
            ListProofNode::Hash(_) => {
                self.max_hash_depth = self.max_hash_depth.max(depth);
            }
            ListProofNode::Branch { left, right } => {
                // Nothing below the depth bound can make the proof valid; stop
                // descending so hostile input cannot exhaust the stack.
                if depth > MAX_NODE_DEPTH {
                    self.deep_branch = true;
                    return;
                }
                if let (ListProofNode::Hash(_), Some(r)) = (left.as_ref(), right.as_deref()) {
                    if matches!(r, ListProofNode::Hash(_)) {
                        self.redundant_hash_pair = true;
                    }
                }
                self.scan(left, depth + 1);
                if let Some(right) = right {
                    self.scan(right, depth + 1);
                }
            }
        }
    }

    fn validate(&self) -> Result<(), ListProofError> {
        let element_level = match self.element_depths {
            Some((min, max)) => {
                if max > MAX_NODE_DEPTH {
                    return Err(ListProofError::ElementDepthOverflow);
                }
                if self.max_hash_depth > MAX_NODE_DEPTH {
                    return Err(ListProofError::HashDepthOverflow);
                }
                if min != max {
                    return Err(ListProofError::UnbalancedDepth);
                }
                max
            }
            None => {
                if self.max_hash_depth > MAX_NODE_DEPTH {
                    return Err(ListProofError::HashDepthOverflow);
                }
                if self.deep_branch {
                    return Err(ListProofError::UnbalancedDepth);
                }
                return Err(ListProofError::NoElements);
            }
        };
        if self.deep_branch {
            return Err(ListProofError::UnbalancedDepth);
        }
        if self.redundant_hash_pair {
            return Err(ListProofError::RedundantHashNodes);
        }
        if self.max_hash_depth > element_level {
            return Err(ListProofError::UnbalancedDepth);
        }
        Ok(())
    }
}

fn node_hash<H: ProofHasher>(node: &ListProofNode) -> Hash {
    match node {
        ListProofNode::Element(value) => H::hash(value),
        ListProofNode::Hash(hash) => *hash,
        ListProofNode::Branch { left, right } => {
            let left_hash = node_hash::<H>(left);
            match right {
                Some(right) => H::hash_parts(&[&left_hash, &node_hash::<H>(right)]),
                None => H::hash(&left_hash),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::Blake3Hasher;

    fn leaf(value: &str) -> ListProofNode {
        ListProofNode::element(value.as_bytes())
    }

    fn hash_node(fill: u8) -> ListProofNode {
        ListProofNode::Hash([fill; 32])
    }

    fn check(proof: &ListProofNode) -> Result<CheckedListProof, ListProofError> {
        check_list_proof::<Blake3Hasher>(proof)
    }

    // A chain of branches descending rightward to `terminal`, with hash nodes
    // filling the left siblings.
    fn right_leaning_tree(depth: usize, terminal: ListProofNode) -> ListProofNode {
        let mut node = terminal;
        for level in (0..depth).rev() {
            node = ListProofNode::branch(hash_node(level as u8), node);
        }
        node
    }

    #[test]
    fn singleton_element_is_valid() {
        let proof = leaf("v1");
        let checked = check(&proof).unwrap();
        assert_eq!(checked.root_hash(), &Blake3Hasher::hash(b"v1"));
        assert!(checked.matches(&Blake3Hasher::hash(b"v1")));
    }

    #[test]
    fn singleton_under_half_branch_is_valid() {
        let proof = ListProofNode::half_branch(leaf("v1"));
        let checked = check(&proof).unwrap();
        // An absent right child hashes the left digest alone.
        let expected = Blake3Hasher::hash(&Blake3Hasher::hash(b"v1"));
        assert_eq!(checked.root_hash(), &expected);
    }

    #[test]
    fn full_two_element_proof() {
        let proof = ListProofNode::branch(leaf("v1"), leaf("v2"));
        let checked = check(&proof).unwrap();
        let expected = Blake3Hasher::hash_parts(&[
            &Blake3Hasher::hash(b"v1"),
            &Blake3Hasher::hash(b"v2"),
        ]);
        assert_eq!(checked.root_hash(), &expected);
    }

    #[test]
    fn full_four_element_proof() {
        let proof = ListProofNode::branch(
            ListProofNode::branch(leaf("v1"), leaf("v2")),
            ListProofNode::branch(leaf("v3"), leaf("v4")),
        );
        let checked = check(&proof).unwrap();
        let left = Blake3Hasher::hash_parts(&[
            &Blake3Hasher::hash(b"v1"),
            &Blake3Hasher::hash(b"v2"),
        ]);
        let right = Blake3Hasher::hash_parts(&[
            &Blake3Hasher::hash(b"v3"),
            &Blake3Hasher::hash(b"v4"),
        ]);
        assert_eq!(checked.root_hash(), &Blake3Hasher::hash_parts(&[&left, &right]));
    }

    #[test]
    fn element_beside_hash_node_is_valid() {
        check(&ListProofNode::branch(leaf("v1"), hash_node(2))).unwrap();
        check(&ListProofNode::branch(hash_node(1), leaf("v2"))).unwrap();
    }

    #[test]
    fn tree_without_elements_is_rejected() {
        let proof = ListProofNode::half_branch(hash_node(1));
        assert_eq!(check(&proof), Err(ListProofError::NoElements));
    }

    #[test]
    fn element_at_wrong_depth_in_right_subtree() {
        let proof = ListProofNode::branch(
            ListProofNode::branch(leaf("v1"), hash_node(2)),
            leaf("v3"), // one level too shallow
        );
        assert_eq!(check(&proof), Err(ListProofError::UnbalancedDepth));
    }

    #[test]
    fn element_at_wrong_depth_in_left_subtree() {
        let proof = ListProofNode::branch(
            leaf("v1"), // one level too shallow
            ListProofNode::branch(leaf("v2"), hash_node(3)),
        );
        assert_eq!(check(&proof), Err(ListProofError::UnbalancedDepth));
    }

    #[test]
    fn hash_node_below_element_level_is_rejected() {
        let proof = ListProofNode::branch(
            leaf("v1"),
            ListProofNode::half_branch(hash_node(1)),
        );
        assert_eq!(check(&proof), Err(ListProofError::UnbalancedDepth));
    }

    #[test]
    fn element_too_deep() {
        let proof = right_leaning_tree(MAX_NODE_DEPTH + 1, leaf("v1"));
        assert_eq!(check(&proof), Err(ListProofError::ElementDepthOverflow));
    }

    #[test]
    fn hash_node_too_deep() {
        let proof = right_leaning_tree(MAX_NODE_DEPTH + 1, hash_node(2));
        assert_eq!(check(&proof), Err(ListProofError::HashDepthOverflow));
    }

    #[test]
    fn max_depth_chain_is_accepted() {
        let proof = right_leaning_tree(MAX_NODE_DEPTH, leaf("v1"));
        check(&proof).unwrap();
    }

    #[test]
    fn scan_survives_very_deep_trees() {
        let proof = right_leaning_tree(10_000, leaf("v1"));
        assert!(check(&proof).is_err());
    }

    #[test]
    fn sibling_hash_nodes_are_rejected() {
        let proof = ListProofNode::branch(
            leaf("v1"),
            ListProofNode::branch(hash_node(1), hash_node(2)),
        );
        assert_eq!(check(&proof), Err(ListProofError::RedundantHashNodes));
    }

    #[test]
    fn verification_is_idempotent() {
        let proof = ListProofNode::branch(leaf("v1"), hash_node(2));
        let first = check(&proof).unwrap();
        let second = check(&proof).unwrap();
        assert_eq!(first, second);
    }
}
