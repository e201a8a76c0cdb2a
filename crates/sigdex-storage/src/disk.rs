//! Page-level file I/O.
//!
//! A `PagedFile` is a flat sequence of fixed-size pages, each holding a
//! header (item count) followed by a packed array of fixed-size items.
//! There is no caching layer: every page access re-reads from the file.

use parking_lot::Mutex;
use sigdex_common::{ItemPage, Result, SigdexError, PAGE_SIZE};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A single open page file.
///
/// The file handle sits behind a mutex so reads can share `&self`; the
/// design still assumes a single process operating on a relation's files
/// at a time.
#[derive(Debug)]
pub struct PagedFile {
    path: PathBuf,
    inner: Mutex<FileInner>,
}

#[derive(Debug)]
struct FileInner {
    file: File,
    num_pages: u32,
}

impl PagedFile {
    /// Creates a new empty page file, truncating any existing one.
    pub fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            inner: Mutex::new(FileInner { file, num_pages: 0 }),
        })
    }

    /// Opens an existing page file.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let file_size = file.metadata()?.len();
        if file_size % PAGE_SIZE as u64 != 0 {
            return Err(SigdexError::RelationCorrupted(format!(
                "{} is not a whole number of pages",
                path.display()
            )));
        }
        let num_pages = (file_size / PAGE_SIZE as u64) as u32;
        Ok(Self {
            path: path.to_path_buf(),
            inner: Mutex::new(FileInner { file, num_pages }),
        })
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of pages in the file.
    pub fn num_pages(&self) -> u32 {
        self.inner.lock().num_pages
    }

    /// Reads a page from the file.
    pub fn read_page(&self, page: u32) -> Result<ItemPage> {
        let mut inner = self.inner.lock();
        if page >= inner.num_pages {
            return Err(SigdexError::PageOutOfBounds {
                page,
                npages: inner.num_pages,
            });
        }
        let offset = (page as u64) * (PAGE_SIZE as u64);
        inner.file.seek(SeekFrom::Start(offset))?;
        let mut buffer = [0u8; PAGE_SIZE];
        inner.file.read_exact(&mut buffer)?;
        Ok(ItemPage::from_bytes(buffer))
    }

    /// Writes a page back to the file.
    pub fn write_page(&self, page: u32, data: &ItemPage) -> Result<()> {
        let mut inner = self.inner.lock();
        if page > inner.num_pages {
            return Err(SigdexError::PageOutOfBounds {
                page,
                npages: inner.num_pages,
            });
        }
        let offset = (page as u64) * (PAGE_SIZE as u64);
        inner.file.seek(SeekFrom::Start(offset))?;
        inner.file.write_all(data.as_bytes())?;
        if page == inner.num_pages {
            inner.num_pages = page + 1;
        }
        Ok(())
    }

    /// Appends a zeroed page to the end of the file.
    ///
    /// Returns the new page's id.
    pub fn append_page(&self) -> Result<u32> {
        let mut inner = self.inner.lock();
        let page = inner.num_pages;
        let offset = (page as u64) * (PAGE_SIZE as u64);
        inner.file.seek(SeekFrom::Start(offset))?;
        inner.file.write_all(&[0u8; PAGE_SIZE])?;
        inner.num_pages = page + 1;
        Ok(page)
    }

    /// Flushes pending writes to stable storage.
    pub fn flush(&self) -> Result<()> {
        self.inner.lock().file.sync_all()?;
        Ok(())
    }
}
