//! Sigdex common types, errors, and page layout.
//!
//! This crate provides shared definitions used across all sigdex components.

pub mod config;
pub mod error;
pub mod page;

pub use config::{RelationOptions, SigEncoding};
pub use error::{Result, SigdexError};
pub use page::{items_per_page, ItemPage, PAGE_HEADER_SIZE, PAGE_SIZE};
