//! Fixed-size tuple encoding and partial-match testing.
//!
//! Tuples are sequences of attribute values stored as comma-joined strings,
//! zero-padded to the relation's fixed tuple size. A query pattern is a
//! tuple whose wildcard positions match any value.

use crate::codec::WILDCARD;
use sigdex_common::{Result, SigdexError};
use std::fmt;

/// A tuple of attribute values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tuple {
    values: Vec<String>,
}

impl Tuple {
    /// Creates a tuple from owned attribute values.
    pub fn new(values: Vec<String>) -> Self {
        Self { values }
    }

    /// Parses a comma-separated tuple string, e.g. `"1234,?,abc,?"`.
    pub fn parse(s: &str) -> Self {
        Self {
            values: s.split(',').map(str::to_string).collect(),
        }
    }

    /// Returns the attribute values.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Returns the number of attributes.
    pub fn nattrs(&self) -> usize {
        self.values.len()
    }

    /// Encodes the tuple as a fixed-size byte-string: values joined with
    /// commas, zero-padded to `size` bytes.
    pub fn to_bytes(&self, size: usize) -> Result<Vec<u8>> {
        let joined = self.values.join(",");
        if joined.len() > size {
            return Err(SigdexError::TupleTooLarge {
                size: joined.len(),
                max: size,
            });
        }
        let mut bytes = joined.into_bytes();
        bytes.resize(size, 0);
        Ok(bytes)
    }

    /// Decodes a tuple from a fixed-size byte-string, ignoring padding.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Self::parse(&String::from_utf8_lossy(&bytes[..end]))
    }

    /// Tests this tuple against a query pattern: every non-wildcard
    /// pattern attribute must equal the corresponding attribute literally.
    pub fn matches(&self, pattern: &Tuple) -> bool {
        self.values.len() == pattern.values.len()
            && pattern
                .values
                .iter()
                .zip(self.values.iter())
                .all(|(p, v)| p == WILDCARD || p == v)
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.values.join(","))
    }
}
