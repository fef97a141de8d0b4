use std::fmt::{self, Display};
use std::str::FromStr;

use crate::errors::CoreError;
use crate::models::RepeatElement;

/// Which classification field a [`RepeatFilter`] looks at.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(rename_all = "lowercase"))]
pub enum FilterField {
    Name,
    Class,
    Family,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(rename_all = "lowercase"))]
pub enum MatchMode {
    #[default]
    Exact,
    Contains,
}

///
/// Restrict the repeat set to elements whose `field` matches `value`.
///
#[derive(Eq, PartialEq, Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct RepeatFilter {
    pub field: FilterField,
    pub value: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub mode: MatchMode,
}

impl RepeatFilter {
    pub fn matches(&self, element: &RepeatElement) -> bool {
        let target = match self.field {
            FilterField::Name => &element.name,
            FilterField::Class => &element.class,
            FilterField::Family => &element.family,
        };
        match self.mode {
            MatchMode::Exact => *target == self.value,
            MatchMode::Contains => target.contains(&self.value),
        }
    }

    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Keep only matching elements.
    pub fn apply(&self, elements: Vec<RepeatElement>) -> Vec<RepeatElement> {
        elements.into_iter().filter(|e| self.matches(e)).collect()
    }
}

impl Display for RepeatFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = match self.field {
            FilterField::Name => "name",
            FilterField::Class => "class",
            FilterField::Family => "family",
        };
        match self.mode {
            MatchMode::Exact => write!(f, "{}={}", field, self.value),
            MatchMode::Contains => write!(f, "{}~{}", field, self.value),
        }
    }
}

impl FromStr for RepeatFilter {
    type Err = CoreError;

    /// Parse `field=value`, e.g. `class=DNA`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, value) = s
            .split_once('=')
            .ok_or_else(|| CoreError::InvalidFilter(s.to_string()))?;
        let field = match field.trim().to_lowercase().as_str() {
            "name" => FilterField::Name,
            "class" => FilterField::Class,
            "family" | "fam" => FilterField::Family,
            _ => return Err(CoreError::InvalidFilter(s.to_string())),
        };
        let value = value.trim();
        if value.is_empty() {
            return Err(CoreError::InvalidFilter(s.to_string()));
        }
        Ok(RepeatFilter {
            field,
            value: value.to_string(),
            mode: MatchMode::Exact,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Region;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn element(name: &str, class: &str, family: &str) -> RepeatElement {
        RepeatElement::new(Region::new("chr1", 0, 10), "1", name, class, family)
    }

    #[rstest]
    #[case("class=DNA", MatchMode::Exact, element("MER1", "DNA", "hAT"), true)]
    #[case("class=DNA", MatchMode::Exact, element("AluY", "SINE", "Alu"), false)]
    #[case("family=ERV", MatchMode::Exact, element("LTR12", "LTR", "ERV1"), false)]
    #[case("family=ERV", MatchMode::Contains, element("LTR12", "LTR", "ERV1"), true)]
    #[case("name=L1", MatchMode::Contains, element("L1PA2", "LINE", "L1"), true)]
    fn test_matches(
        #[case] raw: &str,
        #[case] mode: MatchMode,
        #[case] el: RepeatElement,
        #[case] expected: bool,
    ) {
        let filter = raw.parse::<RepeatFilter>().unwrap().with_mode(mode);
        assert_eq!(filter.matches(&el), expected);
    }

    #[rstest]
    #[case("DNA")]
    #[case("order=DNA")]
    #[case("class=")]
    fn test_invalid(#[case] raw: &str) {
        assert!(raw.parse::<RepeatFilter>().is_err());
    }
}
