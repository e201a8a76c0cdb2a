//! Signature-indexed flat-file tuple storage.
//!
//! A relation stores fixed-size tuples in a paged data file and maintains
//! three superimposed-coding indexes over it: per-tuple signatures, per-page
//! signatures, and a bit-sliced transposition of the page signatures.
//! Selection queries with wildcards probe one of the indexes for candidate
//! data pages and then verify candidates against the literal pattern, so
//! results never contain false drops.
//!
//! ```no_run
//! use sigdex_common::RelationOptions;
//! use sigdex_storage::{Relation, SigScheme};
//!
//! # fn main() -> sigdex_common::Result<()> {
//! let mut rel = Relation::create("accounts", &RelationOptions::default())?;
//! rel.insert(&["1234", "Perryridge", "Fowler", "6000"])?;
//! let mut query = rel.query("?,Perryridge,?,?", SigScheme::Page)?;
//! for tuple in query.run()? {
//!     println!("{}", tuple);
//! }
//! # Ok(())
//! # }
//! ```

pub mod bits;
pub mod codec;
pub mod disk;
pub mod query;
pub mod relation;
pub mod sig;
pub mod tuple;

pub use bits::BitVector;
pub use codec::{SignatureCodec, WILDCARD};
pub use disk::PagedFile;
pub use query::{Query, QueryStats, SigScheme};
pub use relation::{Relation, RelationParams};
pub use sig::{BitSlices, PageSignatures, TupleSignatures};
pub use tuple::Tuple;
