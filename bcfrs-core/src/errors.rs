use std::io;
use thiserror::Error;

/// Error type for bcfrs operations.
///
/// Every variant is fatal for the decode it interrupted: a record either
/// decodes completely or the call fails, and a format error means the byte
/// stream can no longer be trusted from that point on.
#[derive(Error, Debug)]
pub enum BcfError {
    /// IO error from the underlying stream.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The stream does not start with the `BCF` magic bytes.
    #[error("not a BCF stream: bad magic bytes")]
    BadMagic,

    /// The (major, minor) version pair is not one this codec understands.
    #[error("unsupported BCF version {0}.{1}")]
    UnsupportedVersion(u8, u8),

    /// A typed-value descriptor carried an undefined 4-bit type code.
    #[error("undefined typed-value type code: {0:#x}")]
    InvalidTypeCode(u8),

    /// The header declares no contigs; records encode the contig as an
    /// index into the sequence dictionary, so an empty dictionary makes
    /// every record undecodable.
    #[error("header declares no contig lines")]
    MissingContigs,

    /// A record referenced a contig index outside the sequence dictionary.
    #[error("contig index {0} is not in the sequence dictionary")]
    UnknownContig(i32),

    /// A record referenced a FILTER/INFO/FORMAT index outside the header
    /// dictionary.
    #[error("dictionary index {0} out of range")]
    InvalidDictionaryIndex(i32),

    /// An INFO key appeared in a record without a header declaration.
    #[error("INFO/{0} used but not declared in header")]
    UndeclaredInfoTag(String),

    /// A FORMAT key appeared in a record without a header declaration.
    #[error("FORMAT/{0} used but not declared in header")]
    UndeclaredFormatTag(String),

    /// A typed value that must be a scalar integer was something else.
    #[error("expected a scalar integer typed value")]
    ExpectedScalarInt,

    /// A typed value that must be integer-kinded was something else.
    #[error("expected an integer typed value")]
    ExpectedIntValue,

    /// A typed value that must be character-kinded was something else.
    #[error("expected a character typed value")]
    ExpectedCharValue,

    /// A per-sample field broke its arity or type contract (e.g. more than
    /// one DP value for a sample).
    #[error("malformed per-sample field: {0}")]
    MalformedGenotypeField(String),

    /// The embedded text header could not be parsed.
    #[error("can't parse header: {0}")]
    HeaderParse(String),

    /// End of stream in the middle of a record. The only sanctioned EOF
    /// point is immediately before a record's first length word.
    #[error("unexpected end of stream while reading {0}")]
    Truncated(&'static str),

    /// Seek or rewind requested on a stream without random access.
    #[error("underlying stream does not support random access")]
    NotSeekable,

    /// A range query was requested but no index is loaded.
    #[error("no index is available for range queries")]
    NoIndex,

    /// Records were requested before the header was read.
    #[error("header was not read yet")]
    HeaderNotRead,
}

/// Result type alias for bcfrs operations.
pub type Result<T> = std::result::Result<T, BcfError>;
