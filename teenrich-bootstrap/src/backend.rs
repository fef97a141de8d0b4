//! Overlap lookup between repeats and the reference features.
//!
//! The counting code only talks to [`IntervalBackend`], so an external
//! intersection tool or a test fake can stand in for [`InMemoryBackend`].

use teenrich_core::models::{FeatureSet, RepeatElement};
use teenrich_overlaprs::ChromIndex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Interval intersection failed: {0}")]
    Failed(String),
}

/// One (candidate, reference feature) pair passing the overlap threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlapHit {
    /// Index into the candidate slice.
    pub candidate: usize,
    /// Id of the reference feature.
    pub feature: usize,
    /// Overlap length in bp.
    pub overlap: u32,
}

/// Intersects candidate repeats with the reference set the backend was built for.
pub trait IntervalBackend: Send + Sync {
    /// All pairs overlapping by at least `min_overlap` bp.
    fn intersect(
        &self,
        candidates: &[RepeatElement],
        min_overlap: u32,
    ) -> Result<Vec<OverlapHit>, BackendError>;

    /// Number of reference features.
    fn feature_count(&self) -> usize;
}

///
/// Backend answering intersections from a per-chromosome index of the
/// reference features.
///
#[derive(Debug, Clone)]
pub struct InMemoryBackend {
    index: ChromIndex<usize>,
    feature_count: usize,
}

impl InMemoryBackend {
    pub fn new(reference: &FeatureSet) -> Self {
        InMemoryBackend {
            index: ChromIndex::from_features(reference),
            feature_count: reference.len(),
        }
    }
}

impl IntervalBackend for InMemoryBackend {
    fn intersect(
        &self,
        candidates: &[RepeatElement],
        min_overlap: u32,
    ) -> Result<Vec<OverlapHit>, BackendError> {
        let mut hits = Vec::new();
        for (candidate, element) in candidates.iter().enumerate() {
            let region = &element.region;
            for feature in self.index.find_iter(&region.chr, region.start, region.end) {
                let overlap = feature.overlap_len(region.start, region.end);
                if overlap >= min_overlap {
                    hits.push(OverlapHit {
                        candidate,
                        feature: feature.val,
                        overlap,
                    });
                }
            }
        }
        Ok(hits)
    }

    fn feature_count(&self) -> usize {
        self.feature_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use teenrich_core::models::Region;

    fn repeat(start: u32, end: u32) -> RepeatElement {
        RepeatElement::new(Region::new("chr1", start, end), "1", "AluY", "SINE", "Alu")
    }

    #[rstest]
    #[case(190, 205, 10, true)]
    #[case(191, 205, 10, false)]
    #[case(90, 110, 10, true)]
    #[case(200, 300, 1, false)]
    fn test_min_overlap_threshold(
        #[case] start: u32,
        #[case] end: u32,
        #[case] min_overlap: u32,
        #[case] is_hit: bool,
    ) {
        let backend = InMemoryBackend::new(&FeatureSet::from(vec![Region::new("chr1", 100, 200)]));
        let hits = backend.intersect(&[repeat(start, end)], min_overlap).unwrap();
        assert_eq!(!hits.is_empty(), is_hit);
    }

    #[rstest]
    fn test_one_candidate_many_features() {
        let backend = InMemoryBackend::new(&FeatureSet::from(vec![
            Region::new("chr1", 100, 200),
            Region::new("chr1", 300, 400),
        ]));
        let hits = backend.intersect(&[repeat(150, 350)], 10).unwrap();
        assert_eq!(
            hits,
            vec![
                OverlapHit { candidate: 0, feature: 0, overlap: 50 },
                OverlapHit { candidate: 0, feature: 1, overlap: 50 },
            ]
        );
        assert_eq!(backend.feature_count(), 2);
    }
}
