//! # Reading BCF files.
//!
//! This crate layers the everyday reading surface on top of the codec:
//! opening files or streams, scanning all records, rewinding, and
//! CSI-index-assisted coordinate range queries.
//!
pub mod index;
pub mod reader;

// re-expose core functions
pub use index::*;
pub use reader::*;
