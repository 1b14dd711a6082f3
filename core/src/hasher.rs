//! Hashers (feature-gated) and the digest capability used by the verifiers.

use alloc::vec::Vec;

/// A digest committing to some data. In this schema, it is always 256 bits.
///
/// Equality and ordering are byte-wise.
pub type Hash = [u8; 32];

/// The byte length of a [`Hash`].
pub const HASH_SIZE: usize = 32;

/// A stateless hash function both verifiers are generic over.
///
/// Passing the hasher as a type parameter rather than relying on a global hash
/// singleton keeps verification deterministic and lets tests substitute a fixed
/// function.
///
/// The function must behave approximately like a random oracle over the space 2^256.
/// Sha2/Blake3/Keccak/Groestl all meet these criteria.
pub trait ProofHasher {
    /// Hash a byte sequence.
    fn hash(input: &[u8]) -> Hash;

    /// Hash several byte sequences as if concatenated in order.
    ///
    /// The default implementation materializes the concatenation; backends with
    /// incremental interfaces should override it.
    fn hash_parts(parts: &[&[u8]]) -> Hash {
        let len: usize = parts.iter().map(|p| p.len()).sum();
        let mut buf = Vec::with_capacity(len);
        for part in parts {
            buf.extend_from_slice(part);
        }
        Self::hash(&buf)
    }
}

#[cfg(any(feature = "blake3-hasher", test))]
pub use self::blake3::Blake3Hasher;

/// A proof hasher making use of blake3.
#[cfg(any(feature = "blake3-hasher", test))]
pub mod blake3 {
    use super::{Hash, ProofHasher};

    /// A [`ProofHasher`] implementation for Blake3.
    pub struct Blake3Hasher;

    impl ProofHasher for Blake3Hasher {
        fn hash(input: &[u8]) -> Hash {
            ::blake3::hash(input).into()
        }

        fn hash_parts(parts: &[&[u8]]) -> Hash {
            let mut hasher = ::blake3::Hasher::new();
            for part in parts {
                hasher.update(part);
            }
            hasher.finalize().into()
        }
    }
}

#[cfg(feature = "sha2-hasher")]
pub use self::sha2::Sha2Hasher;

/// A proof hasher making use of sha2-256.
#[cfg(feature = "sha2-hasher")]
pub mod sha2 {
    use super::{Hash, ProofHasher};
    use sha2::{Digest, Sha256};

    /// A [`ProofHasher`] implementation for Sha2.
    pub struct Sha2Hasher;

    impl ProofHasher for Sha2Hasher {
        fn hash(input: &[u8]) -> Hash {
            let mut hasher = Sha256::new();
            hasher.update(input);
            hasher.finalize().into()
        }

        fn hash_parts(parts: &[&[u8]]) -> Hash {
            let mut hasher = Sha256::new();
            for part in parts {
                hasher.update(part);
            }
            hasher.finalize().into()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_parts_matches_concatenation() {
        let concat = Blake3Hasher::hash(b"hello world");
        let parts = Blake3Hasher::hash_parts(&[b"hello", b" ", b"world"]);
        assert_eq!(concat, parts);
    }

    #[test]
    fn hash_is_order_sensitive() {
        let ab = Blake3Hasher::hash_parts(&[b"a", b"b"]);
        let ba = Blake3Hasher::hash_parts(&[b"b", b"a"]);
        assert_ne!(ab, ba);
    }
}
