use std::collections::HashMap;

use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use teenrich_core::models::{RepeatElement, TssIndex};

use crate::shuffle::{FailureReason, ShuffleOutcome, ShuffleStrategy, group_by_chr};

///
/// Moves every element next to a random TSS of its chromosome, at the same
/// signed distance it had from its closest TSS in the real data.
///
/// Elements must carry `tss_distance` (see [`TssIndex::annotate`]). TSS are
/// drawn without replacement when the chromosome has at least as many TSS as
/// elements, with replacement otherwise. Placements before the chromosome
/// start are clamped, which breaks the distance for that element; the clamp
/// is reported.
///
#[derive(Debug, Clone)]
pub struct DistancePreserving {
    tss: TssIndex,
    chrom_sizes: Option<HashMap<String, u32>>,
}

impl DistancePreserving {
    pub fn new(tss: TssIndex, chrom_sizes: Option<HashMap<String, u32>>) -> Self {
        DistancePreserving { tss, chrom_sizes }
    }
}

impl ShuffleStrategy for DistancePreserving {
    fn name(&self) -> &'static str {
        "tss"
    }

    fn generate(&self, elements: &[RepeatElement], _round: u32, rng: &mut StdRng) -> ShuffleOutcome {
        let mut outcome = ShuffleOutcome::default();

        for (chr, indices) in group_by_chr(elements) {
            let sites = self.tss.chr_sites(chr);
            if sites.is_empty() {
                for &idx in &indices {
                    outcome.drop_element(&elements[idx], FailureReason::NoTss);
                }
                continue;
            }
            let chrom_len = self
                .chrom_sizes
                .as_ref()
                .and_then(|sizes| sizes.get(chr).copied());

            let anchors: Vec<usize> = if sites.len() >= indices.len() {
                sample(rng, sites.len(), indices.len()).into_iter().collect()
            } else {
                (0..indices.len()).map(|_| rng.random_range(0..sites.len())).collect()
            };

            for (&idx, anchor) in indices.iter().zip(anchors) {
                let element = &elements[idx];
                match element.tss_distance {
                    Some(distance) => {
                        let width = element.width();
                        let start = sites[anchor].start_at_distance(distance, width);
                        outcome.place_within(element, start, width, chrom_len);
                    }
                    None => outcome.drop_element(element, FailureReason::NoDistance),
                }
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shuffle::{ClampKind, MIN_START, round_rng};
    use pretty_assertions::assert_eq;
    use rstest::*;
    use teenrich_core::models::{Region, Strand, Tss};

    fn site(chr: &str, pos: u32, strand: Strand) -> Tss {
        Tss {
            chr: chr.to_string(),
            pos,
            strand,
        }
    }

    fn element(id: &str, chr: &str, start: u32, end: u32) -> RepeatElement {
        RepeatElement::new(Region::new(chr, start, end), id, "MER1A", "DNA", "hAT-Charlie")
    }

    #[rstest]
    fn test_distance_preserved() {
        let tss = TssIndex::from(vec![
            site("chr1", 1000, Strand::Plus),
            site("chr1", 5000, Strand::Minus),
            site("chr1", 8000, Strand::Plus),
        ]);
        let mut elements = vec![element("1", "chr1", 1200, 1250), element("2", "chr1", 4700, 4800)];
        tss.annotate(&mut elements);
        let strategy = DistancePreserving::new(tss.clone(), None);

        for round in 1..=10 {
            let outcome = strategy.generate(&elements, round, &mut round_rng(2, round));
            assert_eq!(outcome.placed.len(), 2);
            assert!(outcome.clamped.is_empty());
            let mut used = Vec::new();
            for placed in &outcome.placed {
                let original = elements.iter().find(|e| e.fragment_id == placed.fragment_id).unwrap();
                assert_eq!(placed.width(), original.width());
                // some site reproduces the original distance
                let anchor = tss
                    .chr_sites("chr1")
                    .iter()
                    .find(|s| s.signed_distance(&placed.region) == original.tss_distance.unwrap())
                    .unwrap();
                used.push(anchor.pos);
            }
            used.dedup();
            assert_eq!(used.len(), 2);
        }
    }

    #[rstest]
    fn test_clamped_before_start() {
        let tss = TssIndex::from(vec![site("chr1", 10, Strand::Plus), site("chr1", 5000, Strand::Plus)]);
        // 300 bp upstream of the site at 5000
        let mut elements = vec![element("1", "chr1", 4700, 4750)];
        tss.annotate(&mut elements);
        assert_eq!(elements[0].tss_distance, Some(-300));
        let strategy = DistancePreserving::new(tss, None);

        let mut seen_clamp = false;
        for round in 1..=30 {
            let outcome = strategy.generate(&elements, round, &mut round_rng(6, round));
            let placed = &outcome.placed[0].region;
            assert!(placed.start >= MIN_START);
            assert_eq!(placed.width(), 50);
            if let Some(clamp) = outcome.clamped.first() {
                assert_eq!(clamp.kind, ClampKind::BeforeStart);
                assert_eq!(clamp.shift, 291);
                assert_eq!(placed.start, MIN_START);
                seen_clamp = true;
            }
        }
        assert!(seen_clamp);
    }

    #[rstest]
    fn test_no_tss_on_chromosome() {
        let tss = TssIndex::from(vec![site("chr1", 100, Strand::Plus)]);
        let mut elements = vec![element("1", "chr2", 10, 20)];
        tss.annotate(&mut elements);
        let strategy = DistancePreserving::new(tss, None);
        let outcome = strategy.generate(&elements, 1, &mut round_rng(1, 1));
        assert!(outcome.placed.is_empty());
        assert_eq!(outcome.dropped[0].reason, FailureReason::NoTss);
    }

    #[rstest]
    fn test_more_elements_than_sites() {
        let tss = TssIndex::from(vec![site("chr1", 1000, Strand::Plus)]);
        let mut elements = vec![
            element("1", "chr1", 1100, 1110),
            element("2", "chr1", 1300, 1310),
            element("3", "chr1", 900, 910),
        ];
        tss.annotate(&mut elements);
        let strategy = DistancePreserving::new(tss, None);
        let outcome = strategy.generate(&elements, 1, &mut round_rng(1, 1));
        let starts: Vec<u32> = outcome.placed.iter().map(|e| e.region.start).collect();
        assert_eq!(starts, vec![1100, 1300, 900]);
    }
}
