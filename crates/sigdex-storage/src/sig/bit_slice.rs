//! Bit-slice index (bsig).
//!
//! The page-signature matrix transposed: column `i` is a bit-vector of
//! width `bm` (the maximum data page count) where bit `j` is set iff data
//! page `j` has bit `i` of its page signature set. The `pm` columns are
//! laid out across pages at a fixed capacity and their count never changes
//! after relation creation.

use crate::bits::BitVector;
use crate::disk::PagedFile;
use crate::query::QueryStats;
use sigdex_common::{ItemPage, Result};

/// The bit-slice file and its layout parameters.
#[derive(Debug)]
pub struct BitSlices {
    file: PagedFile,
    /// Column width in bits (bm); the maximum number of data pages.
    bits: usize,
    /// Columns per page.
    per_page: usize,
    /// Total number of columns (pm, the page signature width).
    columns: usize,
}

impl BitSlices {
    /// Wraps an open bsig file.
    pub fn new(file: PagedFile, bits: usize, per_page: usize, columns: usize) -> Self {
        Self {
            file,
            bits,
            per_page,
            columns,
        }
    }

    /// Returns the number of pages in the bsig file.
    pub fn num_pages(&self) -> u32 {
        self.file.num_pages()
    }

    /// Returns the total number of columns.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Returns the underlying file.
    pub fn file(&self) -> &PagedFile {
        &self.file
    }

    /// Writes all `columns` zeroed column vectors across the file.
    ///
    /// Called once at relation creation; the first (empty) page must
    /// already exist.
    pub fn init_columns(&self) -> Result<()> {
        let zero = BitVector::new(self.bits);
        let mut pid = self.file.num_pages() - 1;
        let mut page = self.file.read_page(pid)?;

        for _ in 0..self.columns {
            if page.nitems() as usize == self.per_page {
                self.file.write_page(pid, &page)?;
                pid = self.file.append_page()?;
                page = ItemPage::new();
            }
            let slot = page.nitems() as usize;
            zero.write_to_page(&mut page, slot);
            page.set_nitems(page.nitems() + 1);
        }
        self.file.write_page(pid, &page)?;
        Ok(())
    }

    /// Reads column `i` of the transposed page-signature matrix.
    pub fn column(&self, i: usize) -> Result<BitVector> {
        let pid = (i / self.per_page) as u32;
        let page = self.file.read_page(pid)?;
        let mut col = BitVector::new(self.bits);
        col.read_from_page(&page, i % self.per_page);
        Ok(col)
    }

    /// Records that `data_page` gained every bit set in `page_sig`.
    ///
    /// For each set bit `i` of the page descriptor, column `i` gets bit
    /// `data_page` set. Consecutive columns on the same bsig page share one
    /// load/store.
    pub fn update_columns(&self, page_sig: &BitVector, data_page: u32) -> Result<()> {
        let mut current: Option<(u32, ItemPage)> = None;

        for i in page_sig.ones() {
            let pid = (i / self.per_page) as u32;
            let reload = current.as_ref().map_or(true, |(cur, _)| *cur != pid);
            if reload {
                if let Some((cur, page)) = current.take() {
                    self.file.write_page(cur, &page)?;
                }
                current = Some((pid, self.file.read_page(pid)?));
            }
            if let Some((_, page)) = current.as_mut() {
                let slot = i % self.per_page;
                let mut col = BitVector::new(self.bits);
                col.read_from_page(page, slot);
                col.set(data_page as usize);
                col.write_to_page(page, slot);
            }
        }

        if let Some((cur, page)) = current {
            self.file.write_page(cur, &page)?;
        }
        Ok(())
    }

    /// Probes by column scanning: start from all candidates and intersect
    /// with the column of every set query bit. A page survives only if it
    /// has every queried bit set in its page signature. Guarantees zero
    /// false negatives; reads one column page per distinct page touched.
    pub fn probe(
        &self,
        query_sig: &BitVector,
        npages: usize,
        stats: &mut QueryStats,
    ) -> Result<BitVector> {
        let mut pages = BitVector::new(npages);
        pages.set_all();

        let mut current: Option<(u32, ItemPage)> = None;
        let mut col = BitVector::new(self.bits);

        for i in query_sig.ones() {
            let pid = (i / self.per_page) as u32;
            let reload = current.as_ref().map_or(true, |(cur, _)| *cur != pid);
            if reload {
                current = Some((pid, self.file.read_page(pid)?));
                stats.sig_pages_read += 1;
            }
            if let Some((_, page)) = current.as_ref() {
                col.read_from_page(page, i % self.per_page);
                for p in 0..npages {
                    if !col.is_set(p) {
                        pages.clear(p);
                    }
                }
            }
            stats.sigs_read += 1;
        }
        Ok(pages)
    }
}
