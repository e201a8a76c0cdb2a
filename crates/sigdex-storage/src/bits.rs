//! Bit-vector operations for signatures.
//!
//! Bit-vectors are arbitrarily long byte-packed bit-strings. Bit 0 is the
//! least-significant bit of byte 0; the most-significant bits live in the
//! last byte. Widths need not be byte-aligned; the unused high bits of the
//! last byte carry no guarantees and callers must not rely on them.

use sigdex_common::ItemPage;
use std::fmt;

/// A fixed-bit-length byte-packed bit-string.
///
/// Operations that take two vectors (AND, OR, subset) require equal byte
/// lengths; position-taking operations require the position to be within
/// `[0, nbits)`. Violations are programmer errors and panic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitVector {
    nbits: usize,
    bytes: Vec<u8>,
}

impl BitVector {
    /// Creates a zeroed bit-vector of the given bit width.
    pub fn new(nbits: usize) -> Self {
        Self {
            nbits,
            bytes: vec![0u8; (nbits + 7) / 8],
        }
    }

    /// Returns the bit width.
    pub fn nbits(&self) -> usize {
        self.nbits
    }

    /// Returns the byte length (`ceil(nbits / 8)`).
    pub fn nbytes(&self) -> usize {
        self.bytes.len()
    }

    /// Returns the packed bytes, least-significant bit first within a byte.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn check_position(&self, position: usize) {
        assert!(
            position < self.nbits,
            "bit position {} out of range for width {}",
            position,
            self.nbits
        );
    }

    /// Returns true if the bit at `position` is 1.
    pub fn is_set(&self, position: usize) -> bool {
        self.check_position(position);
        self.bytes[position / 8] & (1 << (position % 8)) != 0
    }

    /// Sets the bit at `position` to 1.
    pub fn set(&mut self, position: usize) {
        self.check_position(position);
        self.bytes[position / 8] |= 1 << (position % 8);
    }

    /// Sets the bit at `position` to 0.
    pub fn clear(&mut self, position: usize) {
        self.check_position(position);
        self.bytes[position / 8] &= !(1 << (position % 8));
    }

    /// Sets every bit to 1, including any unused high bits.
    pub fn set_all(&mut self) {
        for b in &mut self.bytes {
            *b = 0xFF;
        }
    }

    /// Sets every bit to 0.
    pub fn clear_all(&mut self) {
        for b in &mut self.bytes {
            *b = 0;
        }
    }

    /// Returns the number of 1 bits.
    pub fn count_ones(&self) -> usize {
        self.bytes.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Iterates over the positions of all 1 bits, in ascending order.
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.nbits).filter(move |&i| self.is_set(i))
    }

    fn check_same_length(&self, other: &BitVector) {
        assert_eq!(
            self.bytes.len(),
            other.bytes.len(),
            "bit-vector byte length mismatch"
        );
    }

    /// Returns true iff every 1 bit of `self` is also 1 in `other`.
    pub fn is_subset_of(&self, other: &BitVector) -> bool {
        self.check_same_length(other);
        self.bytes
            .iter()
            .zip(other.bytes.iter())
            .all(|(a, b)| a & !b == 0)
    }

    /// In-place bitwise AND: `self &= other`.
    pub fn and_with(&mut self, other: &BitVector) {
        self.check_same_length(other);
        for (a, b) in self.bytes.iter_mut().zip(other.bytes.iter()) {
            *a &= b;
        }
    }

    /// In-place bitwise OR: `self |= other`.
    pub fn or_with(&mut self, other: &BitVector) {
        self.check_same_length(other);
        for (a, b) in self.bytes.iter_mut().zip(other.bytes.iter()) {
            *a |= b;
        }
    }

    /// Logical shift: left for positive `n`, right for negative `n`.
    ///
    /// Arbitrary magnitudes are supported, decomposed into whole-byte moves
    /// plus a sub-byte carry shift. Bits shifted past either end are lost.
    pub fn shift(&mut self, n: i32) {
        let magnitude = n.unsigned_abs() as usize;
        if magnitude == 0 {
            return;
        }
        if magnitude >= self.bytes.len() * 8 {
            self.clear_all();
            return;
        }
        let byte_shift = magnitude / 8;
        let bit_shift = (magnitude % 8) as u32;
        let len = self.bytes.len();

        if n > 0 {
            if byte_shift > 0 {
                for i in (byte_shift..len).rev() {
                    self.bytes[i] = self.bytes[i - byte_shift];
                }
                for b in &mut self.bytes[..byte_shift] {
                    *b = 0;
                }
            }
            if bit_shift > 0 {
                let mut carry = 0u8;
                for b in &mut self.bytes {
                    let next = *b >> (8 - bit_shift);
                    *b = (*b << bit_shift) | carry;
                    carry = next;
                }
            }
        } else {
            if byte_shift > 0 {
                for i in 0..len - byte_shift {
                    self.bytes[i] = self.bytes[i + byte_shift];
                }
                for b in &mut self.bytes[len - byte_shift..] {
                    *b = 0;
                }
            }
            if bit_shift > 0 {
                let mut carry = 0u8;
                for b in self.bytes.iter_mut().rev() {
                    let next = *b << (8 - bit_shift);
                    *b = (*b >> bit_shift) | carry;
                    carry = next;
                }
            }
        }
    }

    /// Fills this vector from the slot'th item of a page.
    ///
    /// The item width is this vector's byte length.
    pub fn read_from_page(&mut self, page: &ItemPage, slot: usize) {
        let n = self.bytes.len();
        self.bytes.copy_from_slice(page.item(slot, n));
    }

    /// Writes this vector into the slot'th item of a page.
    pub fn write_to_page(&self, page: &mut ItemPage, slot: usize) {
        page.item_mut(slot, self.bytes.len())
            .copy_from_slice(&self.bytes);
    }
}

/// Renders the bit pattern most-significant-bit first, no separators, no
/// trailing newline. All `nbytes * 8` stored bits are shown.
impl fmt::Display for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.bytes.iter().rev() {
            for j in (0..8).rev() {
                f.write_str(if byte & (1 << j) != 0 { "1" } else { "0" })?;
            }
        }
        Ok(())
    }
}
