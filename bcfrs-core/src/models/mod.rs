pub mod genotype;
pub mod header;
pub mod locus;
pub mod variant;

// re-export for cleaner imports
pub use self::genotype::{Genotype, GenotypeFilter, GenotypeValue};
pub use self::header::{Arity, Contig, FieldDecl, Header, HeaderLine, ValueType};
pub use self::locus::Locus;
pub use self::variant::{Filters, InfoValue, Variant};
