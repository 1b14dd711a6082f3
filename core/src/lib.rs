//! Verification of proofs for the authenticated structures of a ledger.
//!
//! A client holding only a trusted root hash (typically taken from a signed block
//! header) can use this crate to confirm that specific values belong to one of two
//! structures the root commits to:
//!
//!   1. An append-only list backed by a binary merkle tree. Its proofs are recursive
//!      trees of branch, element and hash nodes ([`list_proof`]).
//!   2. A key-value map backed by a binary Patricia trie. Its proofs travel as a flat,
//!      ordered sequence of branch and leaf entries rather than a recursive tree
//!      ([`map_proof`]).
//!
//! Both verifiers are pure functions over immutable inputs, generic over the hash
//! function, and report structural failures as values rather than panicking.
//!
//! This crate does not construct proofs and does not talk to storage; it consumes raw
//! proof material produced elsewhere. It does not require the standard library, but
//! does require Rust's alloc crate.

#![cfg_attr(all(not(feature = "std"), not(test)), no_std)]

extern crate alloc;

pub mod encoding;
pub mod hasher;
pub mod list_proof;
pub mod map_proof;
pub mod path_key;

pub use hasher::{Hash, ProofHasher, HASH_SIZE};
pub use list_proof::{check_list_proof, CheckedListProof, ListProofError, ListProofNode};
pub use map_proof::{
    CheckedMapProof, KeyOutOfScope, MapProofEntry, MapProofError, UncheckedMapProof,
};
pub use path_key::{KeyPath, PathKey, KEY_SIZE};
