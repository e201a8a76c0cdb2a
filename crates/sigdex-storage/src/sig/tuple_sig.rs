//! Tuple signature index (tsig).
//!
//! One descriptor bit-vector per tuple, stored densely in fixed-capacity
//! pages parallel to the data file, in insertion order.

use crate::bits::BitVector;
use crate::disk::PagedFile;
use crate::query::QueryStats;
use sigdex_common::{ItemPage, Result};

/// The tuple signature file and its layout parameters.
#[derive(Debug)]
pub struct TupleSignatures {
    file: PagedFile,
    /// Signature width in bits (tm).
    bits: usize,
    /// Signatures per page.
    per_page: usize,
}

impl TupleSignatures {
    /// Wraps an open tsig file.
    pub fn new(file: PagedFile, bits: usize, per_page: usize) -> Self {
        Self {
            file,
            bits,
            per_page,
        }
    }

    /// Returns the number of pages in the tsig file.
    pub fn num_pages(&self) -> u32 {
        self.file.num_pages()
    }

    /// Returns the underlying file.
    pub fn file(&self) -> &PagedFile {
        &self.file
    }

    /// Appends a tuple descriptor to the last page, allocating a new page
    /// first when the last page is full.
    ///
    /// Returns true when a new page was allocated.
    pub fn append(&self, sig: &BitVector) -> Result<bool> {
        let last = self.file.num_pages() - 1;
        let mut page = self.file.read_page(last)?;

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
        Ok(false)
    }

    /// Scans every stored tuple signature and marks the data page of each
    /// superset match as a candidate.
    ///
    /// A tuple can only match the query if every query-contributed bit is
    /// present in its signature; the owning data page is inferred from the
    /// signature's sequential position and the data-page tuple capacity.
    /// Guarantees zero false negatives.
    pub fn probe(
        &self,
        query_sig: &BitVector,
        tuples_per_page: usize,
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
                if query_sig.is_subset_of(&stored) {
                    let data_page = seq / tuples_per_page;
                    if data_page < npages {
                        pages.set(data_page);
                    }
                }
                seq += 1;
            }
        }
        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_index(per_page: usize) -> (TupleSignatures, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let file = PagedFile::create(&dir.path().join("t.tsig")).unwrap();
        file.append_page().unwrap();
        (TupleSignatures::new(file, 64, per_page), dir)
    }

    fn sig_with(bits: &[usize]) -> BitVector {
        let mut v = BitVector::new(64);
        for &b in bits {
            v.set(b);
        }
        v
    }

    #[test]
    fn test_append_fills_page_then_allocates() {
        let (idx, _dir) = make_index(2);

        assert!(!idx.append(&sig_with(&[1])).unwrap());
        assert!(!idx.append(&sig_with(&[2])).unwrap());
        assert_eq!(idx.num_pages(), 1);

        // third signature does not fit on the first page
        assert!(idx.append(&sig_with(&[3])).unwrap());
        assert_eq!(idx.num_pages(), 2);
    }

    #[test]
    fn test_probe_marks_matching_data_pages() {
        let (idx, _dir) = make_index(10);

        // three tuples, two tuples per data page: seq 0,1 -> page 0, seq 2 -> page 1
        idx.append(&sig_with(&[1, 5])).unwrap();
        idx.append(&sig_with(&[2, 6])).unwrap();
        idx.append(&sig_with(&[1, 7])).unwrap();

        let mut stats = QueryStats::default();
        let pages = idx.probe(&sig_with(&[1]), 2, 2, &mut stats).unwrap();

        assert!(pages.is_set(0));
        assert!(pages.is_set(1));
        assert_eq!(stats.sigs_read, 3);
        assert_eq!(stats.sig_pages_read, 1);

        let mut stats = QueryStats::default();
        let pages = idx.probe(&sig_with(&[6]), 2, 2, &mut stats).unwrap();
        assert!(pages.is_set(0));
        assert!(!pages.is_set(1));
    }

    #[test]
    fn test_probe_empty_query_matches_everything() {
        let (idx, _dir) = make_index(10);
        idx.append(&sig_with(&[1])).unwrap();

        let mut stats = QueryStats::default();
        let pages = idx
            .probe(&BitVector::new(64), 2, 1, &mut stats)
            .unwrap();
        assert!(pages.is_set(0));
    }
}
