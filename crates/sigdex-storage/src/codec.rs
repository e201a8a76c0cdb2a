//! Superimposed codeword generation.
//!
//! Every attribute value maps to a sparse codeword: a bit-vector of width
//! `m` with exactly `k` bits set, chosen by a pseudo-random sequence seeded
//! from a stable hash of the value. Tuple and page descriptors are the
//! bitwise OR of their attribute codewords.

use crate::bits::BitVector;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::hash::Hasher;
use twox_hash::XxHash64;

/// The wildcard marker: attribute positions equal to this contribute no
/// bits to a descriptor and match any value during verification.
pub const WILDCARD: &str = "?";

/// Deterministic mapping from attribute values to sparse codewords.
///
/// A relation keeps two instances sharing the same algorithm: one at the
/// tuple signature width, one at the page signature width. Identical
/// `(value, width, bits_per_value)` always reproduce an identical codeword;
/// index construction and query-time lookups rely on this.
#[derive(Debug, Clone, Copy)]
pub struct SignatureCodec {
    width: usize,
    bits_per_value: usize,
}

impl SignatureCodec {
    /// Creates a codec producing codewords of `width` bits with
    /// `bits_per_value` bits set each.
    pub fn new(width: usize, bits_per_value: usize) -> Self {
        assert!(
            bits_per_value < width,
            "bits per value {} must be less than signature width {}",
            bits_per_value,
            width
        );
        Self {
            width,
            bits_per_value,
        }
    }

    /// Returns the codeword width in bits.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the number of bits set per codeword.
    pub fn bits_per_value(&self) -> usize {
        self.bits_per_value
    }

    /// Derives the codeword for one attribute value.
    ///
    /// The generator is constructed fresh from the value hash on every
    /// call; no generator state is shared between calls.
    pub fn codeword(&self, value: &str) -> BitVector {
        let mut cw = BitVector::new(self.width);
        let mut rng = ChaCha8Rng::seed_from_u64(hash_value(value));
        let mut nset = 0;
        while nset < self.bits_per_value {
            let position = (rng.next_u64() % self.width as u64) as usize;
            if !cw.is_set(position) {
                cw.set(position);
                nset += 1;
            }
        }
        cw
    }

    /// Builds a descriptor by OR-ing the codewords of all non-wildcard
    /// values. Wildcard positions contribute no bits.
    pub fn descriptor<S: AsRef<str>>(&self, values: &[S]) -> BitVector {
        let mut desc = BitVector::new(self.width);
        for value in values {
            let value = value.as_ref();
            if value != WILDCARD {
                desc.or_with(&self.codeword(value));
            }
        }
        desc
    }
}

/// Stable 64-bit hash of an attribute value, used only to seed the
/// codeword generator.
fn hash_value(value: &str) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(value.as_bytes());
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codeword_deterministic() {
        let codec = SignatureCodec::new(128, 5);
        let a = codec.codeword("Perryridge");
        let b = codec.codeword("Perryridge");
        assert_eq!(a, b);
    }

    #[test]
    fn test_codeword_exactly_k_bits() {
        let codec = SignatureCodec::new(64, 7);
        for value in ["a", "b", "quite a long attribute value", "1234"] {
            let cw = codec.codeword(value);
            assert_eq!(cw.count_ones(), 7, "value {:?}", value);
            assert_eq!(cw.nbits(), 64);
            assert_eq!(cw.nbytes(), 8);
        }
    }

    #[test]
    fn test_codeword_width_not_multiple_of_eight() {
        let codec = SignatureCodec::new(61, 4);
        let cw = codec.codeword("x");
        assert_eq!(cw.nbytes(), 8);
        assert_eq!(cw.count_ones(), 4);
        for pos in cw.ones() {
            assert!(pos < 61);
        }
    }

    #[test]
    fn test_different_values_usually_differ() {
        let codec = SignatureCodec::new(256, 8);
        let a = codec.codeword("alpha");
        let b = codec.codeword("beta");
        assert_ne!(a, b);
    }

    #[test]
    fn test_descriptor_contains_every_codeword() {
        let codec = SignatureCodec::new(128, 4);
        let values = ["A", "1", "x", "p"];
        let desc = codec.descriptor(&values);
        for value in values {
            assert!(
                codec.codeword(value).is_subset_of(&desc),
                "codeword for {:?} missing from descriptor",
                value
            );
        }
    }

    #[test]
    fn test_descriptor_skips_wildcards() {
        let codec = SignatureCodec::new(128, 4);
        let partial = codec.descriptor(&["A", "?", "?", "?"]);
        assert_eq!(partial, codec.codeword("A"));

        let all_wild = codec.descriptor(&["?", "?", "?", "?"]);
        assert_eq!(all_wild.count_ones(), 0);
    }

    #[test]
    fn test_partial_descriptor_subset_of_full() {
        let codec = SignatureCodec::new(128, 4);
        let full = codec.descriptor(&["A", "1", "x", "p"]);
        let partial = codec.descriptor(&["A", "?", "x", "?"]);
        assert!(partial.is_subset_of(&full));
    }

    #[test]
    #[should_panic(expected = "must be less than signature width")]
    fn test_k_not_less_than_width_panics() {
        SignatureCodec::new(8, 8);
    }
}
