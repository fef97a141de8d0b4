//! Per-round hit counting with fragment deduplication.

use std::collections::HashMap;

use fxhash::FxHashSet;
use teenrich_core::models::{FeatureSet, RepeatElement, TaxonomyPath};

use crate::backend::{BackendError, InMemoryBackend, IntervalBackend};

/// Hits per taxonomy path for one round. Absent paths count 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundCounts {
    counts: HashMap<TaxonomyPath, u32>,
}

impl RoundCounts {
    pub fn get(&self, path: &TaxonomyPath) -> u32 {
        self.counts.get(path).copied().unwrap_or(0)
    }

    pub fn increment(&mut self, path: TaxonomyPath) {
        *self.counts.entry(path).or_insert(0) += 1;
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TaxonomyPath, &u32)> {
        self.counts.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &TaxonomyPath> {
        self.counts.keys()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Reference features hit by any repeat.
    pub fn total_hits(&self) -> u32 {
        self.get(&TaxonomyPath::total())
    }
}

impl FromIterator<(TaxonomyPath, u32)> for RoundCounts {
    fn from_iter<I: IntoIterator<Item = (TaxonomyPath, u32)>>(iter: I) -> Self {
        RoundCounts {
            counts: iter.into_iter().collect(),
        }
    }
}

///
/// (reference feature, path) pairs already counted in a round.
///
/// A feature hit by several fragments of one element, or by several elements
/// of one category, adds 1 to that category.
///
#[derive(Debug, Default)]
pub struct DedupSet {
    seen: FxHashSet<(usize, TaxonomyPath)>,
}

impl DedupSet {
    /// Whether the pair is new; records it.
    pub fn insert(&mut self, feature: usize, path: &TaxonomyPath) -> bool {
        self.seen.insert((feature, path.clone()))
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Counts repeat hits on the reference features behind `backend`.
pub struct OverlapCounter<'a> {
    backend: &'a dyn IntervalBackend,
    min_overlap: u32,
}

impl<'a> OverlapCounter<'a> {
    pub fn new(backend: &'a dyn IntervalBackend, min_overlap: u32) -> Self {
        OverlapCounter {
            backend,
            min_overlap,
        }
    }

    pub fn count(&self, candidates: &[RepeatElement]) -> Result<RoundCounts, BackendError> {
        let hits = self.backend.intersect(candidates, self.min_overlap)?;

        let mut dedup = DedupSet::default();
        let mut counts = RoundCounts::default();
        for hit in hits {
            for path in candidates[hit.candidate].taxonomy_paths() {
                if dedup.insert(hit.feature, &path) {
                    counts.increment(path);
                }
            }
        }
        Ok(counts)
    }
}

/// Count `candidates` against `reference` with an in-memory backend.
pub fn count_overlaps(
    candidates: &[RepeatElement],
    reference: &FeatureSet,
    min_overlap: u32,
) -> Result<RoundCounts, BackendError> {
    let backend = InMemoryBackend::new(reference);
    OverlapCounter::new(&backend, min_overlap).count(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use teenrich_core::models::{AgeScheme, Region};

    fn repeat(id: &str, start: u32, end: u32, name: &str, class: &str, family: &str) -> RepeatElement {
        RepeatElement::new(Region::new("chr1", start, end), id, name, class, family)
    }

    #[fixture]
    fn reference() -> FeatureSet {
        FeatureSet::from(vec![Region::new("chr1", 100, 200), Region::new("chr1", 1000, 1200)])
    }

    #[rstest]
    fn test_fragments_counted_once(reference: FeatureSet) {
        // two fragments of one element on the same peak
        let candidates = vec![
            repeat("1", 110, 130, "AluY", "SINE", "Alu"),
            repeat("1", 150, 170, "AluY", "SINE", "Alu"),
        ];
        let counts = count_overlaps(&candidates, &reference, 10).unwrap();
        assert_eq!(counts.get(&TaxonomyPath::name("SINE", "Alu", "AluY")), 1);
        assert_eq!(counts.get(&TaxonomyPath::class("SINE")), 1);
        assert_eq!(counts.total_hits(), 1);
    }

    #[rstest]
    fn test_same_class_different_names(reference: FeatureSet) {
        let candidates = vec![
            repeat("1", 110, 130, "AluY", "SINE", "Alu"),
            repeat("2", 150, 170, "AluSx", "SINE", "Alu"),
            repeat("3", 1050, 1100, "AluY", "SINE", "Alu"),
        ];
        let counts = count_overlaps(&candidates, &reference, 10).unwrap();
        assert_eq!(counts.get(&TaxonomyPath::name("SINE", "Alu", "AluY")), 2);
        assert_eq!(counts.get(&TaxonomyPath::name("SINE", "Alu", "AluSx")), 1);
        assert_eq!(counts.get(&TaxonomyPath::family("SINE", "Alu")), 2);
        assert_eq!(counts.total_hits(), 2);
    }

    #[rstest]
    fn test_age_paths(reference: FeatureSet) {
        let mut alu = repeat("1", 110, 130, "AluY", "SINE", "Alu");
        alu.age.primary = Some("young".to_string());
        let counts = count_overlaps(&[alu], &reference, 10).unwrap();
        assert_eq!(counts.get(&TaxonomyPath::age(AgeScheme::Primary, "young")), 1);
        assert_eq!(counts.get(&TaxonomyPath::age(AgeScheme::Secondary, "young")), 0);
        assert_eq!(counts.len(), 5);
    }

    #[rstest]
    fn test_below_threshold(reference: FeatureSet) {
        let counts = count_overlaps(&[repeat("1", 195, 300, "AluY", "SINE", "Alu")], &reference, 10).unwrap();
        assert!(counts.is_empty());
    }

    #[rstest]
    fn test_dedup_set() {
        let mut dedup = DedupSet::default();
        let path = TaxonomyPath::class("DNA");
        assert!(dedup.insert(0, &path));
        assert!(!dedup.insert(0, &path));
        assert!(dedup.insert(1, &path));
        assert_eq!(dedup.len(), 2);
    }
}
