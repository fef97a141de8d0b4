pub mod feature_set;
pub mod filter;
pub mod interval;
pub mod region;
pub mod repeat;
pub mod taxonomy;
pub mod tss;

// re-export for cleaner imports
pub use self::feature_set::{Feature, FeatureSet};
pub use self::filter::{FilterField, MatchMode, RepeatFilter};
pub use self::interval::Interval;
pub use self::region::{Region, Strand};
pub use self::repeat::{AgeLabels, RepeatElement, element_totals};
pub use self::taxonomy::{AgeScheme, Granularity, TaxonKey, TaxonomyPath};
pub use self::tss::{Tss, TssIndex};
