//! Bit-path keys addressing positions in the authenticated map's trie.
//!
//! All lookup paths in the trie are 256 bits. A [`PathKey`] owns a fixed-size byte
//! buffer together with a bit-length: a full-length key identifies exactly one map
//! entry (a leaf), while a shorter one identifies the subtree under that prefix
//! (a branch). Map-proof reconstruction leans entirely on the ordering and prefix
//! relations defined here; they must hold exactly or reconstruction silently
//! produces wrong roots.

use bitvec::prelude::*;
use core::cmp::Ordering;
use core::fmt;

/// The byte length of a full lookup path.
pub const KEY_SIZE: usize = 32;

/// The bit length of a full lookup path.
pub const KEY_SIZE_BITS: u16 = (KEY_SIZE * 8) as u16;

/// A raw, full-length lookup path.
pub type KeyPath = [u8; KEY_SIZE];

/// The byte length of [`PathKey::to_bytes`]: a tag byte, the path buffer and a
/// bit-length byte.
pub const PATH_KEY_ENCODED_SIZE: usize = KEY_SIZE + 2;

/// A position in the trie: a bit path plus the number of significant bits.
///
/// Bits beyond the significant length are always zero, so byte-wise equality of the
/// buffer coincides with path equality.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "borsh", derive(borsh::BorshSerialize))]
pub struct PathKey {
    bytes: [u8; KEY_SIZE],
    bits: u16,
}

impl PathKey {
    /// A full-length key, identifying a single map entry.
    pub fn leaf(path: KeyPath) -> Self {
        PathKey {
            bytes: path,
            bits: KEY_SIZE_BITS,
        }
    }

    /// A strict prefix of a full-length key, identifying a subtree.
    ///
    /// Bits of `path` beyond `bits` are cleared. Panics if `bits` is not strictly
    /// less than [`KEY_SIZE_BITS`]; a full-length key must be built with
    /// [`PathKey::leaf`].
    pub fn branch(path: KeyPath, bits: u16) -> Self {
        assert!(
            bits < KEY_SIZE_BITS,
            "branch bit-length {} out of range 0..{}",
            bits,
            KEY_SIZE_BITS,
        );
        let mut bytes = path;
        bytes.view_bits_mut::<Msb0>()[bits as usize..].fill(false);
        PathKey { bytes, bits }
    }

    /// Whether this key is full-length.
    pub fn is_leaf(&self) -> bool {
        self.bits == KEY_SIZE_BITS
    }

    /// The number of significant bits.
    pub fn bits(&self) -> u16 {
        self.bits
    }

    /// The raw path buffer. Bits beyond [`Self::bits`] are zero.
    pub fn key_path(&self) -> KeyPath {
        self.bytes
    }

    /// The significant portion of the path.
    pub fn path(&self) -> &BitSlice<u8, Msb0> {
        &self.bytes.view_bits::<Msb0>()[..self.bits as usize]
    }

    /// The bit at `index`. Panics if `index` is beyond the significant length.
    pub fn bit(&self, index: u16) -> bool {
        self.path()[index as usize]
    }

    /// The number of leading bits shared with `other`.
    pub fn common_prefix_len(&self, other: &Self) -> u16 {
        let shared = self
            .path()
            .iter()
            .zip(other.path().iter())
            .take_while(|(a, b)| a == b)
            .count();
        shared as u16
    }

    /// Whether `other` begins with all of this key's significant bits.
    ///
    /// Two keys are prefix-compatible exactly when one is a prefix of the other;
    /// every key is a prefix of itself.
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.bits <= other.bits && self.common_prefix_len(other) == self.bits
    }

    /// The branch key consisting of the first `bits` bits of this key.
    ///
    /// Panics if `bits` exceeds the significant length or is full-length.
    pub fn truncate(&self, bits: u16) -> Self {
        assert!(bits <= self.bits);
        PathKey::branch(self.bytes, bits)
    }

    /// The canonical byte form hashed into node digests: a tag byte (0 for a
    /// branch, 1 for a leaf), the 32-byte path buffer, and the bit-length byte
    /// (0 for a leaf, where the length is implied by the tag).
    pub fn to_bytes(&self) -> [u8; PATH_KEY_ENCODED_SIZE] {
        let mut out = [0u8; PATH_KEY_ENCODED_SIZE];
        out[0] = self.is_leaf() as u8;
        out[1..1 + KEY_SIZE].copy_from_slice(&self.bytes);
        if !self.is_leaf() {
            out[PATH_KEY_ENCODED_SIZE - 1] = self.bits as u8;
        }
        out
    }
}

/// Bit-lexicographic over the shared region, with ties broken by bit-length, so a
/// branch key sorts immediately before any key extending it.
impl Ord for PathKey {
    fn cmp(&self, other: &Self) -> Ordering {
        let common = self.bits.min(other.bits) as usize;
        match self.path()[..common].cmp(&other.path()[..common]) {
            Ordering::Equal => self.bits.cmp(&other.bits),
            ord => ord,
        }
    }
}

impl PartialOrd for PathKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PathKey(0x{}, {} bits)",
            hex::encode(self.bytes),
            self.bits
        )
    }
}

// Deserialization is manual so that an out-of-range bit-length or set trailing
// bits coming off the wire cannot produce a key violating this module's
// invariants.
#[cfg(feature = "borsh")]
impl borsh::BorshDeserialize for PathKey {
    fn deserialize_reader<R: borsh::io::Read>(reader: &mut R) -> borsh::io::Result<Self> {
        let bytes = <[u8; KEY_SIZE]>::deserialize_reader(reader)?;
        let bits = u16::deserialize_reader(reader)?;
        if bits > KEY_SIZE_BITS {
            return Err(borsh::io::Error::new(
                borsh::io::ErrorKind::InvalidData,
                "path bit-length out of range",
            ));
        }
        Ok(if bits == KEY_SIZE_BITS {
            PathKey::leaf(bytes)
        } else {
            PathKey::branch(bytes, bits)
        })
    }
}
