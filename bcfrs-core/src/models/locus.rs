use std::fmt::{self, Display};

///
/// Locus struct, a 1-based inclusive genomic interval on a named contig.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Locus {
    pub contig: String,
    pub start: u32,
    pub end: u32,
}

impl Locus {
    ///
    /// Number of reference bases covered by this locus.
    ///
    pub fn length(&self) -> u32 {
        self.end - self.start + 1
    }

    /// True when the two loci share at least one base on the same contig.
    pub fn overlaps(&self, other: &Locus) -> bool {
        self.contig == other.contig && self.overlaps_interval(other.start, other.end)
    }

    /// True when this locus shares at least one base with `[start, end]`.
    pub fn overlaps_interval(&self, start: u32, end: u32) -> bool {
        self.start <= end && self.end >= start
    }
}

impl Display for Locus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.contig, self.start, self.end)
    }
}
