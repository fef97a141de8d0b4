//! Repeat classification keys.
//!
//! Every repeat element resolves to a small set of [`TaxonomyPath`]s: the
//! genome-wide total, its class, its family, its name and, when age data is
//! available, one path per age scheme. Aggregates are expressed with
//! [`TaxonKey::Total`] so they can never collide with a real category name.

use std::fmt::{self, Display};

/// Printed form of [`TaxonKey::Total`].
pub const TOTAL_LABEL: &str = "tot";

/// Printed form of the class column for age paths.
pub const AGE_LABEL: &str = "age";

/// One level of a taxonomy path.
#[derive(Eq, PartialEq, Hash, Debug, Clone, PartialOrd, Ord)]
pub enum TaxonKey {
    /// Aggregate across this level.
    Total,
    Named(String),
}

impl TaxonKey {
    pub fn named(value: &str) -> Self {
        TaxonKey::Named(value.to_string())
    }

    pub fn is_total(&self) -> bool {
        matches!(self, TaxonKey::Total)
    }
}

impl Display for TaxonKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaxonKey::Total => write!(f, "{}", TOTAL_LABEL),
            TaxonKey::Named(s) => write!(f, "{}", s),
        }
    }
}

/// The two independent age classification schemes.
#[derive(Eq, PartialEq, Hash, Debug, Clone, Copy, PartialOrd, Ord)]
pub enum AgeScheme {
    Primary,
    Secondary,
}

impl AgeScheme {
    pub const ALL: [AgeScheme; 2] = [AgeScheme::Primary, AgeScheme::Secondary];
}

impl Display for AgeScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgeScheme::Primary => write!(f, "age1"),
            AgeScheme::Secondary => write!(f, "age2"),
        }
    }
}

/// Report granularity of a path.
#[derive(Eq, PartialEq, Hash, Debug, Clone, Copy, PartialOrd, Ord)]
pub enum Granularity {
    Class,
    Family,
    Name,
    Age(AgeScheme),
}

impl Granularity {
    pub const ALL: [Granularity; 5] = [
        Granularity::Class,
        Granularity::Family,
        Granularity::Name,
        Granularity::Age(AgeScheme::Primary),
        Granularity::Age(AgeScheme::Secondary),
    ];
}

impl Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Class => write!(f, "class"),
            Granularity::Family => write!(f, "family"),
            Granularity::Name => write!(f, "name"),
            Granularity::Age(scheme) => write!(f, "{}", scheme),
        }
    }
}

/// A map key identifying one node of the repeat classification.
#[derive(Eq, PartialEq, Hash, Debug, Clone, PartialOrd, Ord)]
pub enum TaxonomyPath {
    Rank {
        class: TaxonKey,
        family: TaxonKey,
        name: TaxonKey,
    },
    Age {
        scheme: AgeScheme,
        category: TaxonKey,
    },
}

impl TaxonomyPath {
    /// The genome-wide aggregate ("tot", "tot", "tot").
    pub fn total() -> Self {
        TaxonomyPath::Rank {
            class: TaxonKey::Total,
            family: TaxonKey::Total,
            name: TaxonKey::Total,
        }
    }

    pub fn class(class: &str) -> Self {
        TaxonomyPath::Rank {
            class: TaxonKey::named(class),
            family: TaxonKey::Total,
            name: TaxonKey::Total,
        }
    }

    pub fn family(class: &str, family: &str) -> Self {
        TaxonomyPath::Rank {
            class: TaxonKey::named(class),
            family: TaxonKey::named(family),
            name: TaxonKey::Total,
        }
    }

    pub fn name(class: &str, family: &str, name: &str) -> Self {
        TaxonomyPath::Rank {
            class: TaxonKey::named(class),
            family: TaxonKey::named(family),
            name: TaxonKey::named(name),
        }
    }

    pub fn age(scheme: AgeScheme, category: &str) -> Self {
        TaxonomyPath::Age {
            scheme,
            category: TaxonKey::named(category),
        }
    }

    pub fn is_total(&self) -> bool {
        *self == TaxonomyPath::total()
    }

    /// The report stream this path belongs to. The genome-wide total is reported
    /// with the classes.
    pub fn granularity(&self) -> Granularity {
        match self {
            TaxonomyPath::Age { scheme, .. } => Granularity::Age(*scheme),
            TaxonomyPath::Rank { family, name, .. } => {
                if family.is_total() {
                    Granularity::Class
                } else if name.is_total() {
                    Granularity::Family
                } else {
                    Granularity::Name
                }
            }
        }
    }

    /// The three printed columns: (class, family, name). Age paths print as
    /// ("age", scheme, category).
    pub fn columns(&self) -> (String, String, String) {
        match self {
            TaxonomyPath::Rank {
                class,
                family,
                name,
            } => (class.to_string(), family.to_string(), name.to_string()),
            TaxonomyPath::Age { scheme, category } => {
                (AGE_LABEL.to_string(), scheme.to_string(), category.to_string())
            }
        }
    }
}

impl Display for TaxonomyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (a, b, c) = self.columns();
        write!(f, "{}/{}/{}", a, b, c)
    }
}
