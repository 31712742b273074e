/// Per-sample filter state. Unlike record-level [`Filters`], a genotype is
/// either unfiltered or filtered for exactly one named reason.
///
/// [`Filters`]: crate::models::variant::Filters
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GenotypeFilter {
    Unfiltered,
    Filtered(String),
}

/// A decoded per-sample value for a FORMAT key without dedicated handling.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GenotypeValue {
    Int(i32),
    Float(f32),
    String(String),
    Ints(Vec<Option<i32>>),
    Floats(Vec<Option<f32>>),
}

///
/// Genotype struct, the per-sample slice of one decoded record.
///
/// Called alleles are resolved to their bases; `None` is a no-call. The
/// phased flag comes from the low bit of the last genotype token read for
/// the sample.
///
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Genotype {
    pub sample: String,
    pub alleles: Vec<Option<String>>,
    pub phased: bool,
    pub depth: Option<i32>,
    pub quality: Option<i32>,
    pub allele_depths: Option<Vec<Option<i32>>>,
    pub likelihoods: Option<Vec<Option<i32>>>,
    pub filter: GenotypeFilter,
    pub attributes: Vec<(String, GenotypeValue)>,
}

impl Genotype {
    /// Number of allele calls, no-calls included.
    pub fn ploidy(&self) -> usize {
        self.alleles.len()
    }

    /// True when at least one allele resolved to bases.
    pub fn is_called(&self) -> bool {
        self.alleles.iter().any(Option::is_some)
    }

    pub fn is_filtered(&self) -> bool {
        matches!(self.filter, GenotypeFilter::Filtered(_))
    }

    /// Look up a generic FORMAT value by key.
    pub fn attribute(&self, key: &str) -> Option<&GenotypeValue> {
        self.attributes
            .iter()
            .find_map(|(k, v)| if k == key { Some(v) } else { None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ploidy_and_calls() {
        let g = Genotype {
            sample: "S1".to_string(),
            alleles: vec![Some("A".to_string()), None],
            phased: false,
            depth: Some(10),
            quality: None,
            allele_depths: None,
            likelihoods: None,
            filter: GenotypeFilter::Unfiltered,
            attributes: vec![("HQ".to_string(), GenotypeValue::Int(50))],
        };
        assert_eq!(g.ploidy(), 2);
        assert!(g.is_called());
        assert!(!g.is_filtered());
        assert_eq!(g.attribute("HQ"), Some(&GenotypeValue::Int(50)));
        assert_eq!(g.attribute("GL"), None);
    }
}
