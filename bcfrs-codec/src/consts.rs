/// Magic bytes opening every BCF stream.
pub const BCF_MAGIC: &[u8; 3] = b"BCF";

/// The one (major, minor) version pair this codec decodes.
pub const SUPPORTED_VERSION: (u8, u8) = (2, 2);

/// FORMAT key holding the encoded genotype call.
pub const GENOTYPE_KEY: &str = "GT";
/// FORMAT key holding the conditional genotype quality.
pub const GENOTYPE_QUALITY_KEY: &str = "GQ";
/// FORMAT key holding the per-sample read depth.
pub const DEPTH_KEY: &str = "DP";
/// FORMAT key holding the per-allele read depths.
pub const ALLELE_DEPTHS_KEY: &str = "AD";
/// FORMAT key holding the phred-scaled genotype likelihoods.
pub const LIKELIHOODS_KEY: &str = "PL";
/// FORMAT key holding the per-sample filter.
pub const GENOTYPE_FILTER_KEY: &str = "FT";

/// Filter name occupying dictionary slot 0.
pub const PASS_FILTER: &str = "PASS";
/// VCF spelling of "this sample is unfiltered".
pub const UNFILTERED: &str = ".";
