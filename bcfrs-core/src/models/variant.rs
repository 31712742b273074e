use std::fmt::{self, Display};

use crate::models::genotype::Genotype;
use crate::models::locus::Locus;

/// Record-level filter status. The three states are distinct: filters may
/// never have been evaluated, evaluated and all passed, or evaluated with
/// named failures.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Filters {
    /// No FILTER data present on the record.
    Unevaluated,
    /// The record explicitly passed all filters.
    Pass,
    /// The record was filtered for these named reasons.
    Named(Vec<String>),
}

impl Filters {
    pub fn were_applied(&self) -> bool {
        !matches!(self, Filters::Unevaluated)
    }

    pub fn is_filtered(&self) -> bool {
        matches!(self, Filters::Named(_))
    }
}

/// A decoded, type-coerced INFO value.
///
/// Vector elements are `None` where the stream carried the per-width
/// missing sentinel; the sentinel's numeric value never leaks through.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InfoValue {
    /// A FLAG key, present and therefore true.
    Flag,
    Int(i32),
    Float(f32),
    String(String),
    /// A single-element vector whose only element was the missing sentinel.
    Missing,
    Ints(Vec<Option<i32>>),
    Floats(Vec<Option<f32>>),
    Strings(Vec<String>),
}

///
/// Variant struct, one fully decoded record: locus, alleles, site
/// annotations and one genotype per header sample.
///
/// The first allele is the reference allele. A variant is immutable once
/// returned by the decoder; the decoder only reuses its internal scratch
/// space, never the returned record.
///
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Variant {
    pub locus: Locus,
    pub id: Option<String>,
    pub alleles: Vec<String>,
    pub qual: Option<f32>,
    pub filters: Filters,
    pub info: Vec<(String, InfoValue)>,
    pub genotypes: Vec<Genotype>,
}

impl Variant {
    pub fn contig(&self) -> &str {
        &self.locus.contig
    }

    /// 1-based start position.
    pub fn start(&self) -> u32 {
        self.locus.start
    }

    /// 1-based inclusive end position.
    pub fn end(&self) -> u32 {
        self.locus.end
    }

    pub fn reference_allele(&self) -> Option<&str> {
        self.alleles.first().map(String::as_str)
    }

    pub fn alternate_alleles(&self) -> &[String] {
        if self.alleles.is_empty() {
            &[]
        } else {
            &self.alleles[1..]
        }
    }

    /// Look up an INFO value by key. Keys keep record order in `info`.
    pub fn info_value(&self, key: &str) -> Option<&InfoValue> {
        self.info
            .iter()
            .find_map(|(k, v)| if k == key { Some(v) } else { None })
    }

    pub fn sample_count(&self) -> usize {
        self.genotypes.len()
    }
}

impl Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.locus,
            self.id.as_deref().unwrap_or("."),
            self.alleles.join("/"),
        )
    }
}
