//! Relation lifecycle: the five side files and their parameters.
//!
//! A relation is a set of files sharing a base path: `<base>.info` holds
//! one fixed-size parameter record, `<base>.data` the tuples, and
//! `<base>.tsig` / `<base>.psig` / `<base>.bsig` the three signature
//! indexes. The parameter record is rewritten wholesale on close; a crash
//! before close can lose counter updates.

use crate::codec::SignatureCodec;
use crate::disk::PagedFile;
use crate::sig::{BitSlices, PageSignatures, TupleSignatures};
use crate::tuple::Tuple;
use sigdex_common::{
    items_per_page, ItemPage, RelationOptions, Result, SigEncoding, SigdexError,
};
use std::ffi::OsString;
use std::fmt;
use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Magic tag at the start of the info record ("SIGX").
const INFO_MAGIC: u32 = 0x5349_4758;

/// Static and dynamic relation parameters, persisted as one fixed-size
/// record in the info file.
///
/// Static fields are fixed at creation; dynamic counters mutate on every
/// insert and are written back on close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationParams {
    // static
    /// Number of attributes per tuple.
    pub nattrs: u32,
    /// Fixed byte size of an encoded tuple.
    pub tup_size: u32,
    /// Tuples per data page.
    pub tup_pp: u32,
    /// Bits set per attribute codeword (tk).
    pub tk: u32,
    /// Tuple signature width in bits (tm).
    pub tm: u32,
    /// Tuple signatures per tsig page.
    pub tsig_pp: u32,
    /// Page signature width in bits (pm).
    pub pm: u32,
    /// Page signatures per psig page.
    pub psig_pp: u32,
    /// Bit-slice width in bits (bm); maximum data page count.
    pub bm: u32,
    /// Bit slices per bsig page.
    pub bsig_pp: u32,
    /// Signature encoding scheme tag.
    pub encoding: SigEncoding,
    // dynamic
    /// Number of tuples.
    pub ntups: u32,
    /// Number of data pages.
    pub npages: u32,
    /// Number of tuple signatures.
    pub ntsigs: u32,
    /// Number of tsig pages.
    pub tsig_npages: u32,
    /// Number of page signatures.
    pub npsigs: u32,
    /// Number of psig pages.
    pub psig_npages: u32,
    /// Number of bit slices (fixed at pm for the life of the relation).
    pub nbsigs: u32,
    /// Number of bsig pages.
    pub bsig_npages: u32,
}

impl RelationParams {
    /// Size of the info record in bytes.
    pub const SIZE: usize = 80;

    /// Byte size of one tuple signature.
    pub fn tsig_bytes(&self) -> usize {
        self.tm as usize / 8
    }

    /// Byte size of one page signature.
    pub fn psig_bytes(&self) -> usize {
        self.pm as usize / 8
    }

    /// Byte size of one bit slice.
    pub fn bsig_bytes(&self) -> usize {
        self.bm as usize / 8
    }

    /// Serializes the record.
    ///
    /// Layout (80 bytes, little-endian): magic, then ten static u32
    /// fields, the encoding tag byte plus 3 reserved bytes, then eight
    /// dynamic u32 counters.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        let fields = [
            INFO_MAGIC,
            self.nattrs,
            self.tup_size,
            self.tup_pp,
            self.tk,
            self.tm,
            self.tsig_pp,
            self.pm,
            self.psig_pp,
            self.bm,
            self.bsig_pp,
        ];
        for (i, f) in fields.iter().enumerate() {
            buf[i * 4..i * 4 + 4].copy_from_slice(&f.to_le_bytes());
        }
        buf[44] = self.encoding.tag();
        // bytes 45-47 reserved
        let counters = [
            self.ntups,
            self.npages,
            self.ntsigs,
            self.tsig_npages,
            self.npsigs,
            self.psig_npages,
            self.nbsigs,
            self.bsig_npages,
        ];
        for (i, c) in counters.iter().enumerate() {
            let at = 48 + i * 4;
            buf[at..at + 4].copy_from_slice(&c.to_le_bytes());
        }
        buf
    }

    /// Deserializes the record, validating magic and encoding tag.
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        if buf.len() < Self::SIZE {
            return Err(SigdexError::RelationCorrupted(format!(
                "info record is {} bytes, expected {}",
                buf.len(),
                Self::SIZE
            )));
        }
        let read_u32 =
            |at: usize| u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]);
        if read_u32(0) != INFO_MAGIC {
            return Err(SigdexError::RelationCorrupted(
                "bad info magic".to_string(),
            ));
        }
        let encoding = SigEncoding::from_tag(buf[44]).ok_or_else(|| {
            SigdexError::RelationCorrupted(format!("unknown encoding tag {:#x}", buf[44]))
        })?;
        Ok(Self {
            nattrs: read_u32(4),
            tup_size: read_u32(8),
            tup_pp: read_u32(12),
            tk: read_u32(16),
            tm: read_u32(20),
            tsig_pp: read_u32(24),
            pm: read_u32(28),
            psig_pp: read_u32(32),
            bm: read_u32(36),
            bsig_pp: read_u32(40),
            encoding,
            ntups: read_u32(48),
            npages: read_u32(52),
            ntsigs: read_u32(56),
            tsig_npages: read_u32(60),
            npsigs: read_u32(64),
            psig_npages: read_u32(68),
            nbsigs: read_u32(72),
            bsig_npages: read_u32(76),
        })
    }
}

impl fmt::Display for RelationParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dynamic:")?;
        writeln!(
            f,
            "  #items:  tuples: {}  tsigs: {}  psigs: {}  bsigs: {}",
            self.ntups, self.ntsigs, self.npsigs, self.nbsigs
        )?;
        writeln!(
            f,
            "  #pages:  tuples: {}  tsigs: {}  psigs: {}  bsigs: {}",
            self.npages, self.tsig_npages, self.psig_npages, self.bsig_npages
        )?;
        writeln!(f, "Static:")?;
        writeln!(
            f,
            "  tups   #attrs: {}  size: {} bytes  max/page: {}",
            self.nattrs, self.tup_size, self.tup_pp
        )?;
        writeln!(f, "  sigs   simc  bits/attr: {}", self.tk)?;
        writeln!(
            f,
            "  tsigs  size: {} bits ({} bytes)  max/page: {}",
            self.tm,
            self.tsig_bytes(),
            self.tsig_pp
        )?;
        writeln!(
            f,
            "  psigs  size: {} bits ({} bytes)  max/page: {}",
            self.pm,
            self.psig_bytes(),
            self.psig_pp
        )?;
        write!(
            f,
            "  bsigs  size: {} bits ({} bytes)  max/page: {}",
            self.bm,
            self.bsig_bytes(),
            self.bsig_pp
        )
    }
}

/// Rounds a signature width up to a whole number of bytes.
fn round_to_byte(bits: usize) -> usize {
    (bits + 7) / 8 * 8
}

fn side_path(base: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

fn invalid(name: &str, value: impl fmt::Display) -> SigdexError {
    SigdexError::InvalidParameter {
        name: name.to_string(),
        value: value.to_string(),
    }
}

/// An open signature-indexed relation.
///
/// Single writer/reader; all index structures grow monotonically and no
/// deletion or in-place update of tuples is supported.
#[derive(Debug)]
pub struct Relation {
    base: PathBuf,
    pub(crate) params: RelationParams,
    pub(crate) data: PagedFile,
    pub(crate) tsig: TupleSignatures,
    pub(crate) psig: PageSignatures,
    pub(crate) bsig: BitSlices,
    pub(crate) tuple_codec: SignatureCodec,
    pub(crate) page_codec: SignatureCodec,
}

impl Relation {
    /// Returns true if a relation already exists at the base path.
    pub fn exists(base: impl AsRef<Path>) -> bool {
        side_path(base.as_ref(), "info").exists()
    }

    /// Creates a new relation: validates the options, creates the five
    /// files (the data and signature files start with one empty page), and
    /// pre-populates the bit-slice file with `pm` zeroed columns.
    pub fn create(base: impl AsRef<Path>, options: &RelationOptions) -> Result<Relation> {
        let base = base.as_ref();
        if Self::exists(base) {
            return Err(SigdexError::RelationExists(base.display().to_string()));
        }

        if options.nattrs == 0 {
            return Err(invalid("nattrs", options.nattrs));
        }
        // every attribute needs at least one byte, plus separators
        if options.tuple_size < 2 * options.nattrs - 1 {
            return Err(invalid("tuple_size", options.tuple_size));
        }
        let tup_pp = items_per_page(options.tuple_size);
        if tup_pp == 0 {
            return Err(invalid("tuple_size", options.tuple_size));
        }

        let tm = round_to_byte(options.tsig_bits);
        let pm = round_to_byte(options.psig_bits);
        let bm = round_to_byte(options.bsig_bits);
        if options.bits_per_value == 0 {
            return Err(invalid("bits_per_value", options.bits_per_value));
        }
        if options.bits_per_value >= tm {
            return Err(invalid("tsig_bits", options.tsig_bits));
        }
        if options.bits_per_value >= pm {
            return Err(invalid("psig_bits", options.psig_bits));
        }

        let tsig_pp = items_per_page(tm / 8);
        if tsig_pp == 0 {
            return Err(invalid("tsig_bits", options.tsig_bits));
        }
        let psig_pp = items_per_page(pm / 8);
        if psig_pp < 2 {
            return Err(invalid("psig_bits", options.psig_bits));
        }
        let bsig_pp = items_per_page(bm / 8);
        if bsig_pp < 2 {
            return Err(invalid("bsig_bits", options.bsig_bits));
        }

        let data = PagedFile::create(&side_path(base, "data"))?;
        let tsig_file = PagedFile::create(&side_path(base, "tsig"))?;
        let psig_file = PagedFile::create(&side_path(base, "psig"))?;
        let bsig_file = PagedFile::create(&side_path(base, "bsig"))?;
        data.append_page()?;
        tsig_file.append_page()?;
        psig_file.append_page()?;
        bsig_file.append_page()?;

        let bsig = BitSlices::new(bsig_file, bm, bsig_pp, pm);
        bsig.init_columns()?;

        let params = RelationParams {
            nattrs: options.nattrs as u32,
            tup_size: options.tuple_size as u32,
            tup_pp: tup_pp as u32,
            tk: options.bits_per_value as u32,
            tm: tm as u32,
            tsig_pp: tsig_pp as u32,
            pm: pm as u32,
            psig_pp: psig_pp as u32,
            bm: bm as u32,
            bsig_pp: bsig_pp as u32,
            encoding: options.encoding,
            ntups: 0,
            npages: 1,
            ntsigs: 0,
            tsig_npages: 1,
            npsigs: 0,
            psig_npages: 1,
            nbsigs: pm as u32,
            bsig_npages: bsig.num_pages(),
        };

        let rel = Relation {
            base: base.to_path_buf(),
            tuple_codec: SignatureCodec::new(tm, options.bits_per_value),
            page_codec: SignatureCodec::new(pm, options.bits_per_value),
            data,
            tsig: TupleSignatures::new(tsig_file, tm, tsig_pp),
            psig: PageSignatures::new(psig_file, pm, psig_pp),
            bsig,
            params,
        };
        rel.write_info()?;
        Ok(rel)
    }

    /// Opens an existing relation, reading its parameters from the info
    /// file.
    pub fn open(base: impl AsRef<Path>) -> Result<Relation> {
        let base = base.as_ref();
        let mut buf = [0u8; RelationParams::SIZE];
        let mut info = OpenOptions::new()
            .read(true)
            .open(side_path(base, "info"))?;
        info.read_exact(&mut buf)?;
        let params = RelationParams::from_bytes(&buf)?;

        let data = PagedFile::open(&side_path(base, "data"))?;
        let tsig_file = PagedFile::open(&side_path(base, "tsig"))?;
        let psig_file = PagedFile::open(&side_path(base, "psig"))?;
        let bsig_file = PagedFile::open(&side_path(base, "bsig"))?;

        Ok(Relation {
            base: base.to_path_buf(),
            tuple_codec: SignatureCodec::new(params.tm as usize, params.tk as usize),
            page_codec: SignatureCodec::new(params.pm as usize, params.tk as usize),
            data,
            tsig: TupleSignatures::new(tsig_file, params.tm as usize, params.tsig_pp as usize),
            psig: PageSignatures::new(psig_file, params.pm as usize, params.psig_pp as usize),
            bsig: BitSlices::new(
                bsig_file,
                params.bm as usize,
                params.bsig_pp as usize,
                params.pm as usize,
            ),
            params,
        })
    }

    /// Returns the relation parameters.
    pub fn params(&self) -> &RelationParams {
        &self.params
    }

    /// Returns the base path.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Inserts a tuple, updating all three signature indexes.
    ///
    /// Returns the id of the data page the tuple landed on. There is no
    /// partial-insert rollback: a failure mid-way leaves the relation
    /// inconsistent.
    pub fn insert<S: AsRef<str>>(&mut self, values: &[S]) -> Result<u32> {
        if values.len() != self.params.nattrs as usize {
            return Err(SigdexError::ArityMismatch {
                expected: self.params.nattrs as usize,
                actual: values.len(),
            });
        }
        let tuple = Tuple::new(values.iter().map(|v| v.as_ref().to_string()).collect());
        let bytes = tuple.to_bytes(self.params.tup_size as usize)?;

        // append to the last data page, or open a new one
        let mut pid = self.params.npages - 1;
        let mut page = self.data.read_page(pid)?;
        let mut new_page = false;
        if page.nitems() as usize == self.params.tup_pp as usize {
            if self.params.npages >= self.params.bm {
                return Err(SigdexError::RelationFull {
                    max_pages: self.params.bm,
                });
            }
            pid = self.data.append_page()?;
            self.params.npages += 1;
            page = ItemPage::new();
            new_page = true;
        }
        let slot = page.nitems() as usize;
        page.item_mut(slot, self.params.tup_size as usize)
            .copy_from_slice(&bytes);
        page.set_nitems(page.nitems() + 1);
        self.data.write_page(pid, &page)?;
        self.params.ntups += 1;

        // tuple signature
        let tsig = self.tuple_codec.descriptor(tuple.values());
        self.tsig.append(&tsig)?;
        self.params.ntsigs += 1;
        self.params.tsig_npages = self.tsig.num_pages();

        // page signature: merge into the current page's slot unless the
        // tuple opened a new data page
        let psig = self.page_codec.descriptor(tuple.values());
        let start_new = new_page || self.params.npsigs == 0;
        if self.psig.append_or_merge(&psig, start_new)? {
            self.params.npsigs += 1;
        }
        self.params.psig_npages = self.psig.num_pages();

        // bit slices: column i gains bit pid for every set bit i
        self.bsig.update_columns(&psig, pid)?;

        Ok(pid)
    }

    /// Writes the parameter record to the info file.
    fn write_info(&self) -> Result<()> {
        let mut info = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(side_path(&self.base, "info"))?;
        info.write_all(&self.params.to_bytes())?;
        info.sync_all()?;
        Ok(())
    }

    /// Writes back the parameter record and flushes all files.
    pub fn close(&mut self) -> Result<()> {
        self.write_info()?;
        self.data.flush()?;
        self.tsig.file().flush()?;
        self.psig.file().flush()?;
        self.bsig.file().flush()?;
        Ok(())
    }
}

impl Drop for Relation {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
