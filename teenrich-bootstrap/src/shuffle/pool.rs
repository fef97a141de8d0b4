use std::collections::{BTreeMap, HashMap};

use rand::Rng;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use teenrich_core::models::RepeatElement;

use crate::shuffle::{FailureReason, LengthPolicy, ShuffleOutcome, ShuffleStrategy, group_by_chr};

///
/// Reassigns elements to the observed positions of their own chromosome.
///
/// The pool of each chromosome is the list of element intervals it was built
/// from. Every round draws an independent random permutation of that pool, so
/// the set of occupied positions per chromosome is preserved exactly. Elements
/// outnumbering their pool take the surplus positions with replacement.
///
#[derive(Debug, Clone)]
pub struct PositionPool {
    pool: BTreeMap<String, Vec<(u32, u32)>>,
    chrom_sizes: Option<HashMap<String, u32>>,
    length_policy: LengthPolicy,
}

impl PositionPool {
    pub fn new(elements: &[RepeatElement], chrom_sizes: Option<HashMap<String, u32>>) -> Self {
        let mut pool: BTreeMap<String, Vec<(u32, u32)>> = BTreeMap::new();
        for element in elements {
            pool.entry(element.region.chr.clone())
                .or_default()
                .push((element.region.start, element.region.end));
        }
        PositionPool {
            pool,
            chrom_sizes,
            length_policy: LengthPolicy::default(),
        }
    }

    pub fn with_length_policy(mut self, length_policy: LengthPolicy) -> Self {
        self.length_policy = length_policy;
        self
    }

    /// Number of pooled positions on `chr`.
    pub fn pool_size(&self, chr: &str) -> usize {
        self.pool.get(chr).map(|p| p.len()).unwrap_or(0)
    }

    /// Pool slots for `n` elements: a permutation prefix, then draws with replacement.
    fn assign(pool_len: usize, n: usize, rng: &mut StdRng) -> Vec<usize> {
        let distinct = n.min(pool_len);
        let mut slots: Vec<usize> = sample(rng, pool_len, distinct).into_iter().collect();
        slots.extend((distinct..n).map(|_| rng.random_range(0..pool_len)));
        slots
    }
}

impl ShuffleStrategy for PositionPool {
    fn name(&self) -> &'static str {
        "pool"
    }

    fn generate(&self, elements: &[RepeatElement], _round: u32, rng: &mut StdRng) -> ShuffleOutcome {
        let mut outcome = ShuffleOutcome::default();

        for (chr, indices) in group_by_chr(elements) {
            let positions = match self.pool.get(chr) {
                Some(positions) if !positions.is_empty() => positions,
                _ => {
                    for &idx in &indices {
                        outcome.drop_element(&elements[idx], FailureReason::UnknownChromosome);
                    }
                    continue;
                }
            };
            let chrom_len = self
                .chrom_sizes
                .as_ref()
                .and_then(|sizes| sizes.get(chr).copied());

            let slots = Self::assign(positions.len(), indices.len(), rng);
            for (&idx, slot) in indices.iter().zip(slots) {
                let element = &elements[idx];
                let (start, end) = positions[slot];
                let width = match self.length_policy {
                    LengthPolicy::Replacement => end - start,
                    LengthPolicy::Element => element.width(),
                };
                outcome.place_within(element, start as i64, width, chrom_len);
            }
        }
        outcome
    }
}
