//! Selection queries over a signature-indexed relation.
//!
//! A query is a comma-separated pattern with one value or `?` per
//! attribute. The chosen signature scheme prunes the set of candidate data
//! pages; the verification pass then reads each candidate page and keeps
//! the tuples that literally match the pattern. Pruning never drops a
//! matching page, so verification only ever discards false positives.

use crate::bits::BitVector;
use crate::relation::Relation;
use crate::tuple::Tuple;
use sigdex_common::{Result, SigdexError};
use std::fmt;

/// Which signature index answers the probe phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigScheme {
    /// Scan tuple signatures.
    Tuple,
    /// Scan page signatures.
    Page,
    /// Intersect bit-slice columns.
    BitSlice,
    /// No pruning: every data page is a candidate.
    None,
}

/// Work counters accumulated over one query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryStats {
    /// Signature file pages read during the probe.
    pub sig_pages_read: u64,
    /// Signatures (or bit-slice columns) examined during the probe.
    pub sigs_read: u64,
    /// Data pages read during verification.
    pub data_pages_read: u64,
    /// Tuples compared against the pattern.
    pub tuples_examined: u64,
    /// Candidate pages that contained no matching tuple.
    pub false_positive_pages: u64,
}

impl fmt::Display for QueryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "# sig pages read:   {}\n\
             # signatures read:  {}\n\
             # data pages read:  {}\n\
             # tuples examined:  {}\n\
             # false match pages: {}",
            self.sig_pages_read,
            self.sigs_read,
            self.data_pages_read,
            self.tuples_examined,
            self.false_positive_pages
        )
    }
}

/// One selection query, bound to an open relation.
#[derive(Debug)]
pub struct Query<'a> {
    rel: &'a Relation,
    pattern: Tuple,
    scheme: SigScheme,
    stats: QueryStats,
}

impl Relation {
    /// Starts a query over this relation.
    ///
    /// The pattern must have exactly one value or `?` per attribute.
    pub fn query(&self, pattern: &str, scheme: SigScheme) -> Result<Query<'_>> {
        let pattern = Tuple::parse(pattern);
        if pattern.nattrs() != self.params.nattrs as usize {
            return Err(SigdexError::InvalidQuery {
                expected: self.params.nattrs as usize,
                actual: pattern.nattrs(),
            });
        }
        Ok(Query {
            rel: self,
            pattern,
            scheme,
            stats: QueryStats::default(),
        })
    }
}

impl<'a> Query<'a> {
    /// Runs the query: probe, then verify. Returns the matching tuples in
    /// page order.
    pub fn run(&mut self) -> Result<Vec<Tuple>> {
        let pages = self.probe()?;
        self.verify(&pages)
    }

    /// Computes the candidate page set without reading any data pages.
    pub fn candidate_pages(&mut self) -> Result<BitVector> {
        self.probe()
    }

    /// Returns the counters accumulated so far.
    pub fn stats(&self) -> &QueryStats {
        &self.stats
    }

    fn probe(&mut self) -> Result<BitVector> {
        let npages = self.rel.params.npages as usize;
        match self.scheme {
            SigScheme::Tuple => {
                let sig = self.rel.tuple_codec.descriptor(self.pattern.values());
                self.rel.tsig.probe(
                    &sig,
                    self.rel.params.tup_pp as usize,
                    npages,
                    &mut self.stats,
                )
            }
            SigScheme::Page => {
                let sig = self.rel.page_codec.descriptor(self.pattern.values());
                self.rel.psig.probe(&sig, npages, &mut self.stats)
            }
            SigScheme::BitSlice => {
                let sig = self.rel.page_codec.descriptor(self.pattern.values());
                self.rel.bsig.probe(&sig, npages, &mut self.stats)
            }
            SigScheme::None => {
                let mut pages = BitVector::new(npages);
                pages.set_all();
                Ok(pages)
            }
        }
    }

    fn verify(&mut self, pages: &BitVector) -> Result<Vec<Tuple>> {
        let npages = self.rel.params.npages as usize;
        let tup_size = self.rel.params.tup_size as usize;
        let mut results = Vec::new();

        for pid in 0..npages {
            if !pages.is_set(pid) {
                continue;
            }
            let page = self.rel.data.read_page(pid as u32)?;
            self.stats.data_pages_read += 1;
            let mut matched = false;
            for slot in 0..page.nitems() as usize {
                let tuple = Tuple::from_bytes(page.item(slot, tup_size));
                self.stats.tuples_examined += 1;
                if tuple.matches(&self.pattern) {
                    results.push(tuple);
                    matched = true;
                }
            }
            if !matched {
                self.stats.false_positive_pages += 1;
            }
        }
        Ok(results)
    }
}
