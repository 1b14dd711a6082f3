//! Fixed-width codecs for primitive values carried by proven entries.
//!
//! Values stored in the authenticated structures are opaque byte strings as far as
//! hashing is concerned; these codecs define the canonical little-endian byte form
//! of the primitive numeric types so that provers and verifiers hash identical
//! bytes. Decoding fails closed: any input whose length differs from the fixed
//! width is rejected, never partially decoded.

use core::fmt;

/// The exact byte width of every codec in this module.
pub const FIXED_WIDTH: usize = 8;

/// A decoding failure. This is a caller error, not a proof failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// The input length differs from the codec's fixed width.
    LengthMismatch {
        /// The width the codec requires.
        expected: usize,
        /// The length of the provided input.
        actual: usize,
    },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::LengthMismatch { expected, actual } => write!(
                f,
                "expected an input of {} bytes, got {}",
                expected, actual
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CodecError {}

/// Encode a 64-bit signed integer as exactly 8 little-endian bytes.
pub fn encode_fixed64(value: i64) -> [u8; FIXED_WIDTH] {
    value.to_le_bytes()
}

/// Decode a 64-bit signed integer from exactly 8 little-endian bytes.
pub fn decode_fixed64(bytes: &[u8]) -> Result<i64, CodecError> {
    Ok(i64::from_le_bytes(fixed_width(bytes)?))
}

/// Encode a 64-bit IEEE float as exactly 8 little-endian bytes.
pub fn encode_f64(value: f64) -> [u8; FIXED_WIDTH] {
    value.to_le_bytes()
}

/// Decode a 64-bit IEEE float from exactly 8 little-endian bytes.
pub fn decode_f64(bytes: &[u8]) -> Result<f64, CodecError> {
    Ok(f64::from_le_bytes(fixed_width(bytes)?))
}

fn fixed_width(bytes: &[u8]) -> Result<[u8; FIXED_WIDTH], CodecError> {
    bytes.try_into().map_err(|_| CodecError::LengthMismatch {
        expected: FIXED_WIDTH,
        actual: bytes.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::quickcheck;

    #[test]
    fn fixed64_known_values() {
        for value in [i64::MIN, -1, 0, 1, i64::MAX] {
            assert_eq!(decode_fixed64(&encode_fixed64(value)), Ok(value));
        }
        // Little-endian: least significant byte first.
        assert_eq!(encode_fixed64(1), [1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(encode_fixed64(-1), [0xff; 8]);
    }

    #[test]
    fn f64_known_values() {
        for value in [f64::MIN, -1.0, 0.0, 1.5, f64::MAX, f64::INFINITY] {
            assert_eq!(decode_f64(&encode_f64(value)), Ok(value));
        }
        let nan = decode_f64(&encode_f64(f64::NAN)).unwrap();
        assert_eq!(nan.to_bits(), f64::NAN.to_bits());
    }

    #[test]
    fn rejects_wrong_lengths() {
        for len in [0usize, 1, 3, 4, 7, 9, 17] {
            let bytes = vec![0u8; len];
            let expected = Err(CodecError::LengthMismatch {
                expected: FIXED_WIDTH,
                actual: len,
            });
            assert_eq!(decode_fixed64(&bytes), expected);
            assert_eq!(decode_f64(&bytes).map(f64::to_bits), Err(CodecError::LengthMismatch {
                expected: FIXED_WIDTH,
                actual: len,
            }));
        }
    }

    quickcheck! {
        fn fixed64_round_trip(value: i64) -> bool {
            decode_fixed64(&encode_fixed64(value)) == Ok(value)
        }

        fn f64_round_trip(value: f64) -> bool {
            // Bit-level comparison so that NaN round trips count as equal.
            decode_f64(&encode_f64(value)).map(f64::to_bits) == Ok(value.to_bits())
        }

        fn wrong_length_fails(bytes: Vec<u8>) -> bool {
            let decoded = decode_fixed64(&bytes);
            if bytes.len() == FIXED_WIDTH {
                decoded.is_ok()
            } else {
                decoded
                    == Err(CodecError::LengthMismatch {
                        expected: FIXED_WIDTH,
                        actual: bytes.len(),
                    })
            }
        }
    }
}
