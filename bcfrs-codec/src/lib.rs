//! # Binary codec for BCF 2.2.
//!
//! BCF is the binary sibling of the VCF text format: records reference
//! header-declared FILTER/INFO/FORMAT keys and contigs by small integer
//! indices, and every value is framed as a self-describing typed unit with
//! per-width missing and end-of-vector sentinels.
//!
//! The codec decodes one record per call from a block-compressed (or plain)
//! byte stream. Writing BCF is not supported.
//!
pub mod codec;
pub mod consts;
pub mod dictionary;
pub mod record;
pub mod stream;
pub mod typed;

// re-expose core functions
pub use codec::*;
pub use dictionary::*;
pub use record::*;
pub use stream::*;
pub use typed::*;
