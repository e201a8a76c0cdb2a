//! Raw fixed-size pages holding a packed array of fixed-size items.
//!
//! Page layout:
//! ```text
//! +-------------------+
//! | item count (4)    |
//! +-------------------+
//! | item 0            |
//! | item 1            |  <- fixed-size items, packed back to back
//! | ...               |
//! +-------------------+
//! | unused            |
//! +-------------------+
//! ```
//!
//! The same layout is used for every sigdex file: the data file packs
//! fixed-size tuple byte-strings, the signature files pack byte-aligned
//! bit-vectors.

/// Page size in bytes (4 KB).
pub const PAGE_SIZE: usize = 4096;

/// Size of the page header (little-endian item count).
pub const PAGE_HEADER_SIZE: usize = 4;

/// Number of items of the given byte size that fit on one page.
pub fn items_per_page(item_size: usize) -> usize {
    (PAGE_SIZE - PAGE_HEADER_SIZE) / item_size
}

/// A transient in-memory page buffer.
///
/// Pages are read from a file, mutated in memory, and explicitly written
/// back. Each buffer is exclusively owned by its creator; there is no
/// caching layer.
#[derive(Debug, Clone)]
pub struct ItemPage {
    data: Box<[u8; PAGE_SIZE]>,
}

impl ItemPage {
    /// Creates a new zeroed page (item count 0).
    pub fn new() -> Self {
        Self {
            data: Box::new([0u8; PAGE_SIZE]),
        }
    }

    /// Creates a page from raw page data.
    pub fn from_bytes(data: [u8; PAGE_SIZE]) -> Self {
        Self {
            data: Box::new(data),
        }
    }

    /// Returns the raw page data.
    pub fn as_bytes(&self) -> &[u8; PAGE_SIZE] {
        &self.data
    }

    /// Returns the number of items on this page.
    pub fn nitems(&self) -> u32 {
        u32::from_le_bytes([self.data[0], self.data[1], self.data[2], self.data[3]])
    }

    /// Sets the number of items on this page.
    pub fn set_nitems(&mut self, n: u32) {
        self.data[0..PAGE_HEADER_SIZE].copy_from_slice(&n.to_le_bytes());
    }

    /// Byte offset of the slot'th item of the given size.
    fn item_offset(slot: usize, item_size: usize) -> usize {
        let offset = PAGE_HEADER_SIZE + slot * item_size;
        assert!(
            offset + item_size <= PAGE_SIZE,
            "item slot {} of size {} exceeds page bounds",
            slot,
            item_size
        );
        offset
    }

    /// Returns the bytes of the slot'th item of the given size.
    pub fn item(&self, slot: usize, item_size: usize) -> &[u8] {
        let offset = Self::item_offset(slot, item_size);
        &self.data[offset..offset + item_size]
    }

    /// Returns the bytes of the slot'th item of the given size, mutably.
    pub fn item_mut(&mut self, slot: usize, item_size: usize) -> &mut [u8] {
        let offset = Self::item_offset(slot, item_size);
        &mut self.data[offset..offset + item_size]
    }
}

impl Default for ItemPage {
    fn default() -> Self {
        Self::new()
    }
}
