use std::collections::{HashMap, HashSet};

use crate::models::{AgeScheme, Region, TaxonomyPath};

/// Age categories of a repeat name under the two independent schemes.
#[derive(Eq, PartialEq, Hash, Debug, Clone, Default)]
pub struct AgeLabels {
    pub primary: Option<String>,
    pub secondary: Option<String>,
}

impl AgeLabels {
    pub fn get(&self, scheme: AgeScheme) -> Option<&str> {
        match scheme {
            AgeScheme::Primary => self.primary.as_deref(),
            AgeScheme::Secondary => self.secondary.as_deref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_none() && self.secondary.is_none()
    }
}

///
/// One annotated repeat fragment.
///
/// Shuffling produces copies with new coordinates; identity and
/// classification never change.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone)]
pub struct RepeatElement {
    pub region: Region,
    /// Stable identifier shared by all fragments of one element.
    pub fragment_id: String,
    pub name: String,
    pub class: String,
    pub family: String,
    pub age: AgeLabels,
    /// Signed distance to the closest TSS, measured on real data.
    pub tss_distance: Option<i64>,
}

impl RepeatElement {
    pub fn new(region: Region, fragment_id: &str, name: &str, class: &str, family: &str) -> Self {
        RepeatElement {
            region,
            fragment_id: fragment_id.to_string(),
            name: name.to_string(),
            class: class.to_string(),
            family: family.to_string(),
            age: AgeLabels::default(),
            tss_distance: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.region.width()
    }

    /// Copy of this element moved to `[start, end)` on the same chromosome.
    pub fn moved_to(&self, start: u32, end: u32) -> Self {
        let mut moved = self.clone();
        moved.region.start = start;
        moved.region.end = end;
        moved
    }

    ///
    /// All taxonomy paths this element counts towards: the genome-wide total,
    /// class, family, name and one age path per labelled scheme.
    ///
    pub fn taxonomy_paths(&self) -> Vec<TaxonomyPath> {
        let mut paths = vec![
            TaxonomyPath::total(),
            TaxonomyPath::class(&self.class),
            TaxonomyPath::family(&self.class, &self.family),
            TaxonomyPath::name(&self.class, &self.family, &self.name),
        ];
        for scheme in AgeScheme::ALL {
            if let Some(category) = self.age.get(scheme) {
                paths.push(TaxonomyPath::age(scheme, category));
            }
        }
        paths
    }
}

///
/// Count distinct elements per taxonomy path across the whole genome.
///
/// Fragments sharing a fragment id are counted once. These are the binomial
/// trial counts.
///
pub fn element_totals(elements: &[RepeatElement]) -> HashMap<TaxonomyPath, u64> {
    let mut seen: HashSet<(TaxonomyPath, &str)> = HashSet::new();
    let mut totals: HashMap<TaxonomyPath, u64> = HashMap::new();

    for element in elements {
        for path in element.taxonomy_paths() {
            if seen.insert((path.clone(), element.fragment_id.as_str())) {
                *totals.entry(path).or_insert(0) += 1;
            }
        }
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn alu(id: &str, start: u32) -> RepeatElement {
        RepeatElement::new(Region::new("chr1", start, start + 10), id, "AluY", "SINE", "Alu")
    }

    #[rstest]
    fn test_taxonomy_paths_with_age() {
        let mut el = alu("1", 0);
        el.age.secondary = Some("Primate".to_string());
        let paths = el.taxonomy_paths();
        assert_eq!(paths.len(), 5);
        assert!(paths.contains(&TaxonomyPath::age(AgeScheme::Secondary, "Primate")));
        assert!(!paths.iter().any(|p| matches!(
            p,
            TaxonomyPath::Age {
                scheme: AgeScheme::Primary,
                ..
            }
        )));
    }

    #[rstest]
    fn test_element_totals_dedup_fragments() {
        let elements = vec![alu("1", 0), alu("1", 50), alu("2", 100)];
        let totals = element_totals(&elements);
        assert_eq!(totals[&TaxonomyPath::name("SINE", "Alu", "AluY")], 2);
        assert_eq!(totals[&TaxonomyPath::total()], 2);
    }

    #[rstest]
    fn test_moved_to_keeps_identity() {
        let el = alu("7", 0);
        let moved = el.moved_to(500, 530);
        assert_eq!(moved.fragment_id, "7");
        assert_eq!(moved.region.chr, "chr1");
        assert_eq!(moved.width(), 30);
    }
}
