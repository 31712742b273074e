//! # Core data models for bcfrs.
//!
//! This crate holds everything the binary codec produces or consumes that is
//! not itself byte-level decoding: the parsed VCF header model, the decoded
//! variant and genotype records, genomic loci, and the shared error type.
//! The codec and reader crates build on top of these.
//!
pub mod errors;
pub mod models;

// re-expose core types
pub use errors::*;
pub use models::*;
