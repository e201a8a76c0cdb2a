//! The three signature index structures.
//!
//! - tuple signatures: one descriptor per tuple, dense, insertion order
//! - page signatures: one descriptor per data page, built incrementally
//! - bit slices: the page-signature matrix transposed into columns

mod bit_slice;
mod page_sig;
mod tuple_sig;

pub use bit_slice::BitSlices;
pub use page_sig::PageSignatures;
pub use tuple_sig::TupleSignatures;
