//! Relation creation options.

use serde::{Deserialize, Serialize};

/// Signature encoding scheme.
///
/// Only superimposed coding is implemented; the tag is persisted in the
/// info file for format compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SigEncoding {
    /// Superimposed coding: descriptors are the OR of sparse codewords.
    #[default]
    Simc,
}

impl SigEncoding {
    /// On-disk tag byte for this encoding.
    pub fn tag(self) -> u8 {
        match self {
            SigEncoding::Simc => b's',
        }
    }

    /// Decodes an on-disk tag byte.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            b's' => Some(SigEncoding::Simc),
            _ => None,
        }
    }
}

/// Options fixed at relation creation time.
///
/// Signature widths are rounded up to multiples of 8 during creation;
/// per-page capacities are derived from the page size.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationOptions {
    /// Number of attributes per tuple.
    pub nattrs: usize,
    /// Fixed byte size of an encoded tuple.
    pub tuple_size: usize,
    /// Bits set per attribute codeword (k).
    pub bits_per_value: usize,
    /// Tuple signature width in bits (tm).
    pub tsig_bits: usize,
    /// Page signature width in bits (pm).
    pub psig_bits: usize,
    /// Bit-slice width in bits (bm); the maximum number of data pages.
    pub bsig_bits: usize,
    /// Signature encoding scheme.
    pub encoding: SigEncoding,
}

impl Default for RelationOptions {
    fn default() -> Self {
        Self {
            nattrs: 4,
            tuple_size: 64,
            bits_per_value: 4,
            tsig_bits: 128,
            psig_bits: 256,
            bsig_bits: 1024,
            encoding: SigEncoding::Simc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = RelationOptions::default();
        assert_eq!(opts.nattrs, 4);
        assert_eq!(opts.tuple_size, 64);
        assert_eq!(opts.bits_per_value, 4);
        assert_eq!(opts.tsig_bits, 128);
        assert_eq!(opts.psig_bits, 256);
        assert_eq!(opts.bsig_bits, 1024);
        assert_eq!(opts.encoding, SigEncoding::Simc);
    }

    #[test]
    fn test_encoding_tag_roundtrip() {
        let enc = SigEncoding::Simc;
        assert_eq!(enc.tag(), b's');
        assert_eq!(SigEncoding::from_tag(b's'), Some(SigEncoding::Simc));
        assert_eq!(SigEncoding::from_tag(b'x'), None);
    }

    #[test]
    fn test_options_serde_roundtrip() {
        let original = RelationOptions {
            nattrs: 6,
            tuple_size: 96,
            bits_per_value: 8,
            tsig_bits: 256,
            psig_bits: 512,
            bsig_bits: 2048,
            encoding: SigEncoding::Simc,
        };
        let serialized = serde_json::to_string(&original).unwrap();
        let deserialized: RelationOptions = serde_json::from_str(&serialized).unwrap();

        assert_eq!(original.nattrs, deserialized.nattrs);
        assert_eq!(original.tuple_size, deserialized.tuple_size);
        assert_eq!(original.bits_per_value, deserialized.bits_per_value);
        assert_eq!(original.tsig_bits, deserialized.tsig_bits);
        assert_eq!(original.psig_bits, deserialized.psig_bits);
        assert_eq!(original.bsig_bits, deserialized.bsig_bits);
        assert_eq!(original.encoding, deserialized.encoding);
    }

    #[test]
    fn test_options_clone() {
        let opts1 = RelationOptions::default();
        let opts2 = opts1.clone();
        assert_eq!(opts1.tsig_bits, opts2.tsig_bits);
        assert_eq!(opts1.nattrs, opts2.nattrs);
    }
}
