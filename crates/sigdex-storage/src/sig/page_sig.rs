//! Page signature index (psig).
//!
//! One descriptor bit-vector per data page, in data-page order. Page
//! signatures are built incrementally: each inserted tuple's descriptor is
//! OR-ed into the signature of the data page it landed on.

use crate::bits::BitVector;
use crate::disk::PagedFile;
use crate::query::QueryStats;
use sigdex_common::{ItemPage, Result};

/// The page signature file and its layout parameters.
#[derive(Debug)]
pub struct PageSignatures {
    file: PagedFile,
    /// Signature width in bits (pm).
    bits: usize,
    /// Signatures per page.
    per_page: usize,
}

impl PageSignatures {
    /// Wraps an open psig file.
    pub fn new(file: PagedFile, bits: usize, per_page: usize) -> Self {
        Self {
            file,
            bits,
            per_page,
        }
    }

    /// Returns the number of pages in the psig file.
    pub fn num_pages(&self) -> u32 {
        self.file.num_pages()
    }

    /// Returns the underlying file.
    pub fn file(&self) -> &PagedFile {
        &self.file
    }

    /// Folds a tuple's page descriptor into the index.
    ///
    /// When `start_new` is set (the tuple opened a fresh data page, or no
    /// signature exists yet) the descriptor starts a new slot, allocating a
    /// new psig page if the last one is full. Otherwise it is OR-ed into
    /// the last slot in place.
    ///
    /// Returns true when a new slot was started.
    pub fn append_or_merge(&self, sig: &BitVector, start_new: bool) -> Result<bool> {
        let last = self.file.num_pages() - 1;
        let mut page = self.file.read_page(last)?;

        if start_new {
            if page.nitems() as usize == self.per_page {
                let pid = self.file.append_page()?;
                let mut page = ItemPage::new();
                sig.write_to_page(&mut page, 0);
                page.set_nitems(1);
                self.file.write_page(pid, &page)?;
                return Ok(true);
            }
            let slot = page.nitems() as usize;
            sig.write_to_page(&mut page, slot);
            page.set_nitems(page.nitems() + 1);
            self.file.write_page(last, &page)?;
            return Ok(true);
        }

        let slot = page.nitems() as usize - 1;
        let mut current = BitVector::new(self.bits);
        current.read_from_page(&page, slot);
        current.or_with(sig);
        current.write_to_page(&mut page, slot);
        self.file.write_page(last, &page)?;
        Ok(false)
    }

    /// Reads the signature of the given data page.
    pub fn signature(&self, data_page: u32) -> Result<BitVector> {
        let pid = data_page / self.per_page as u32;
        let slot = data_page as usize % self.per_page;
        let page = self.file.read_page(pid)?;
        let mut sig = BitVector::new(self.bits);
        sig.read_from_page(&page, slot);
        Ok(sig)
    }

    /// Scans every stored page signature in page order; the slot's
    /// sequential index is the data page id. A page is a candidate iff the
    /// query descriptor is a subset of its signature. Guarantees zero
    /// false negatives.
    pub fn probe(
        &self,
        query_sig: &BitVector,
        npages: usize,
        stats: &mut QueryStats,
    ) -> Result<BitVector> {
        let mut pages = BitVector::new(npages);
        let mut stored = BitVector::new(self.bits);
        let mut seq = 0usize;

        for pid in 0..self.file.num_pages() {
            let page = self.file.read_page(pid)?;
            stats.sig_pages_read += 1;
            for slot in 0..page.nitems() as usize {
                stored.read_from_page(&page, slot);
                stats.sigs_read += 1;
                if seq < npages && query_sig.is_subset_of(&stored) {
                    pages.set(seq);
                }
                seq += 1;
            }
        }
        Ok(pages)
    }
}
