//! Flat map proofs: the entry sequence model, trie reconstruction and the checked
//! lookup view.
//!
//! A proof for the Patricia-trie-backed map is not a recursive tree but a flat
//! sequence of entries, ordered by [`PathKey`]: leaf entries carry proven values,
//! branch entries carry the digest of everything under an elided prefix. Checking
//! rebuilds the implied trie's root digest with an explicit stack fold; the fold
//! is determined by the prefix relationships of the paths alone, with no tree
//! pointers given. Checking also reports which of the requested keys the proof
//! shows present.
//!
//! As with list proofs, acceptance requires both a successful check *and* a root
//! digest matching the trusted one.

use crate::hasher::{Hash, ProofHasher};
use crate::path_key::{KeyPath, PathKey};
use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt;

/// The root digest of an empty map. When the trusted root equals this sentinel,
/// no key has a value.
pub const EMPTY_MAP_HASH: Hash = [0u8; 32];

/// One entry of a flat map proof.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "borsh",
    derive(borsh::BorshDeserialize, borsh::BorshSerialize)
)]
pub enum MapProofEntry {
    /// An elided subtree: a branch-form path plus the digest summarizing
    /// everything under it.
    Branch {
        /// The prefix this entry covers.
        path: PathKey,
        /// The digest of the covered subtree.
        hash: Hash,
    },
    /// A proven map entry: a leaf-form path plus the raw value bytes.
    Leaf {
        /// The full path of the entry.
        path: PathKey,
        /// The value stored under the path.
        value: Vec<u8>,
    },
}

impl MapProofEntry {
    /// The path of this entry.
    pub fn path(&self) -> &PathKey {
        match self {
            MapProofEntry::Branch { path, .. } => path,
            MapProofEntry::Leaf { path, .. } => path,
        }
    }

    fn hash<H: ProofHasher>(&self) -> Hash {
        match self {
            MapProofEntry::Branch { hash, .. } => *hash,
            MapProofEntry::Leaf { path, value } => leaf_hash::<H>(path, value),
        }
    }
}

/// The digest of a leaf node: the encoded path followed by the value's digest.
pub fn leaf_hash<H: ProofHasher>(path: &PathKey, value: &[u8]) -> Hash {
    H::hash_parts(&[&path.to_bytes(), &H::hash(value)])
}

/// Structural failures of a flat map proof. Terminal outcomes, reported as data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapProofError {
    /// Two entries share an identical path.
    DuplicatePath(PathKey),
    /// Adjacent entries violate the ascending path order.
    InvalidOrder {
        /// The earlier entry's path.
        first: PathKey,
        /// The later, not-greater entry's path.
        second: PathKey,
    },
    /// One entry's path is a strict prefix of another's, so the entries cannot
    /// cover disjoint parts of any trie.
    EmbeddedPath {
        /// The shorter path.
        prefix: PathKey,
        /// The path extending it.
        path: PathKey,
    },
    /// A proof consisting of a single branch entry; a whole map is summarized by
    /// its root, never by one interior node.
    NonTerminalNode(PathKey),
    /// An entry whose path form does not match its kind: a leaf entry must
    /// carry a full-length path and a branch entry a strict prefix.
    InvalidPathForm(PathKey),
}

impl fmt::Display for MapProofError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapProofError::DuplicatePath(path) => {
                write!(f, "duplicate path in proof: {:?}", path)
            }
            MapProofError::InvalidOrder { first, second } => {
                write!(f, "invalid entry order: {:?} precedes {:?}", first, second)
            }
            MapProofError::EmbeddedPath { prefix, path } => {
                write!(f, "embedded paths in proof: {:?} is a prefix of {:?}", prefix, path)
            }
            MapProofError::NonTerminalNode(path) => {
                write!(f, "single non-leaf entry: {:?}", path)
            }
            MapProofError::InvalidPathForm(path) => {
                write!(f, "entry path form does not match its kind: {:?}", path)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for MapProofError {}

/// Error of a lookup on a [`CheckedMapProof`] for a key outside the originally
/// requested set. The proof was never checked against such a key, so no answer
/// about it is trustworthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyOutOfScope;

impl fmt::Display for KeyOutOfScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("key not in the set the proof was checked against")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for KeyOutOfScope {}

/// An unverified flat map proof: the ordered entry sequence plus the full-length
/// keys the caller wants answers for.
///
/// Built by the transport layer from wire material and consumed exactly once by
/// [`UncheckedMapProof::check`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "borsh",
    derive(borsh::BorshDeserialize, borsh::BorshSerialize)
)]
pub struct UncheckedMapProof {
    entries: Vec<MapProofEntry>,
    requested: Vec<KeyPath>,
}

impl UncheckedMapProof {
    /// Bundle an entry sequence with the keys to resolve.
    pub fn new(
        entries: Vec<MapProofEntry>,
        requested: impl IntoIterator<Item = KeyPath>,
    ) -> Self {
        UncheckedMapProof {
            entries,
            requested: requested.into_iter().collect(),
        }
    }

    /// The underlying entry sequence.
    pub fn entries(&self) -> &[MapProofEntry] {
        &self.entries
    }

    /// Check the proof: validate entry ordering, rebuild the root digest, and
    /// resolve the requested keys.
    ///
    /// An empty entry sequence is a valid proof of the empty map: the root is
    /// [`EMPTY_MAP_HASH`] and every requested key is absent.
    pub fn check<H: ProofHasher>(self) -> Result<CheckedMapProof, MapProofError> {
        // Entry fields are public (and reachable off the wire), so the form of
        // every path must be re-validated here: a leaf entry with a short path
        // would otherwise resolve a requested key it does not actually prove.
        for entry in &self.entries {
            let leaf_form = entry.path().is_leaf();
            let malformed = match entry {
                MapProofEntry::Branch { .. } => leaf_form,
                MapProofEntry::Leaf { .. } => !leaf_form,
            };
            if malformed {
                return Err(MapProofError::InvalidPathForm(*entry.path()));
            }
        }

        for pair in self.entries.windows(2) {
            let (a, b) = (pair[0].path(), pair[1].path());
            match a.cmp(b) {
                Ordering::Equal => return Err(MapProofError::DuplicatePath(*a)),
                Ordering::Greater => {
                    return Err(MapProofError::InvalidOrder {
                        first: *a,
                        second: *b,
                    })
                }
                // Under this ordering a prefix sorts immediately before its
                // extensions, so any embedded pair shows up as an adjacent pair.
                Ordering::Less if a.is_prefix_of(b) => {
                    return Err(MapProofError::EmbeddedPath {
                        prefix: *a,
                        path: *b,
                    })
                }
                Ordering::Less => {}
            }
        }

        let root_hash = match self.entries.as_slice() {
            [] => EMPTY_MAP_HASH,
            [MapProofEntry::Leaf { path, value }] => leaf_hash::<H>(path, value),
            [MapProofEntry::Branch { path, .. }] => {
                return Err(MapProofError::NonTerminalNode(*path))
            }
            entries => fold_entries::<H>(entries),
        };

        let requested: BTreeSet<KeyPath> = self.requested.into_iter().collect();
        let mut present = BTreeMap::new();
        for entry in self.entries {
            if let MapProofEntry::Leaf { path, value } = entry {
                let key = path.key_path();
                if requested.contains(&key) {
                    present.insert(key, value);
                }
            }
        }

        Ok(CheckedMapProof {
            root_hash,
            present,
            requested,
        })
    }
}

// Rebuild the root digest of the trie implied by two or more ordered,
// prefix-disjoint entries.
//
// Entries are pushed left to right onto a stack. The top two stack items are
// siblings of a common parent exactly when the prefix they share with each other
// is at least as long as what the top shares with the incoming entry; such pairs
// are merged before the push. The leftovers then merge right to left into the
// root.
//
// The stack holds at most one item per distinct shared-prefix length, so its
// depth is bounded by the path length regardless of the entry count.
fn fold_entries<H: ProofHasher>(entries: &[MapProofEntry]) -> Hash {
    let mut stack: Vec<(PathKey, Hash)> = Vec::new();
    for entry in entries {
        let item = (*entry.path(), entry.hash::<H>());
        while stack.len() >= 2 {
            let left = &stack[stack.len() - 2];
            let right = &stack[stack.len() - 1];
            let settled = left.0.common_prefix_len(&right.0);
            let pending = right.0.common_prefix_len(&item.0);
            if settled < pending {
                break;
            }
            merge_top::<H>(&mut stack);
        }
        stack.push(item);
    }
    while stack.len() >= 2 {
        merge_top::<H>(&mut stack);
    }
    // unwrap: the caller passes a non-empty slice and merging preserves
    // non-emptiness.
    stack.pop().map(|(_, hash)| hash).unwrap_or(EMPTY_MAP_HASH)
}

// Replace the two topmost stack items with their common parent:
// the branch key of their shared prefix, and the digest of both children's
// encoded paths and digests in order.
fn merge_top<H: ProofHasher>(stack: &mut Vec<(PathKey, Hash)>) {
    // unwrap: callers check the stack holds at least two items.
    let right = stack.pop().unwrap();
    let left = stack.pop().unwrap();
    let common = left.0.common_prefix_len(&right.0);
    let parent = left.0.truncate(common);
    let hash = H::hash_parts(&[
        &left.0.to_bytes(),
        &left.1,
        &right.0.to_bytes(),
        &right.1,
    ]);
    stack.push((parent, hash));
}

/// A verified flat map proof: the recomputed root digest and the answers for the
/// requested keys.
///
/// Lookups are restricted to the keys the proof was checked against; anything
/// else fails with [`KeyOutOfScope`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedMapProof {
    root_hash: Hash,
    present: BTreeMap<KeyPath, Vec<u8>>,
    requested: BTreeSet<KeyPath>,
}

impl CheckedMapProof {
    /// The recomputed root digest.
    pub fn root_hash(&self) -> &Hash {
        &self.root_hash
    }

    /// Whether the recomputed digest equals the trusted root. A proof that
    /// checked out structurally but hashes to a different root proves nothing.
    pub fn matches(&self, trusted_root: &Hash) -> bool {
        &self.root_hash == trusted_root
    }

    /// Whether the proof shows `key` present in the map.
    pub fn contains_key(&self, key: &KeyPath) -> Result<bool, KeyOutOfScope> {
        self.in_scope(key)?;
        Ok(self.present.contains_key(key))
    }

    /// The proven value for `key`, or `None` if the proof shows it absent.
    pub fn get(&self, key: &KeyPath) -> Result<Option<&[u8]>, KeyOutOfScope> {
        self.in_scope(key)?;
        Ok(self.present.get(key).map(Vec::as_slice))
    }

    /// All requested keys proven present, with their values, in key order.
    pub fn present_entries(&self) -> impl Iterator<Item = (&KeyPath, &[u8])> {
        self.present.iter().map(|(key, value)| (key, value.as_slice()))
    }

    /// All requested keys proven absent, in key order.
    pub fn absent_keys(&self) -> impl Iterator<Item = &KeyPath> {
        self.requested
            .iter()
            .filter(move |key| !self.present.contains_key(*key))
    }

    fn in_scope(&self, key: &KeyPath) -> Result<(), KeyOutOfScope> {
        if self.requested.contains(key) {
            Ok(())
        } else {
            Err(KeyOutOfScope)
        }
    }
}
