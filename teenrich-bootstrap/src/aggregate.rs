//! Collection of per-round counts into per-path distributions.

use std::collections::HashMap;

use teenrich_core::models::TaxonomyPath;

use crate::counter::RoundCounts;
use crate::errors::EnrichError;

///
/// Accumulates the observed round 0 and bootstrap rounds `1..=N`.
///
/// Every bootstrap round owns a fixed slot in each distribution, so rounds can
/// be folded in any order and partial aggregators over disjoint rounds can be
/// merged. A path missing from a round counts 0 in that round.
///
#[derive(Debug, Clone)]
pub struct BootstrapAggregator {
    rounds: u32,
    observed: RoundCounts,
    distributions: HashMap<TaxonomyPath, Vec<u32>>,
    folded: Vec<bool>,
}

impl BootstrapAggregator {
    pub fn new(rounds: u32) -> Self {
        BootstrapAggregator {
            rounds,
            observed: RoundCounts::default(),
            distributions: HashMap::new(),
            folded: vec![false; rounds as usize + 1],
        }
    }

    /// Record the counts of `round`; round 0 is the observed data.
    pub fn fold(&mut self, round: u32, counts: RoundCounts) -> Result<(), EnrichError> {
        self.claim(round)?;
        if round == 0 {
            if self.rounds > 0 {
                for path in counts.paths() {
                    self.slots(path.clone());
                }
            }
            self.observed = counts;
        } else {
            let slot = round as usize - 1;
            for (path, count) in counts.iter() {
                self.slots(path.clone())[slot] = *count;
            }
        }
        Ok(())
    }

    /// Combine with an aggregator over the same number of rounds and disjoint rounds.
    pub fn merge(&mut self, other: BootstrapAggregator) -> Result<(), EnrichError> {
        if other.rounds != self.rounds {
            return Err(EnrichError::RoundCountMismatch(self.rounds, other.rounds));
        }
        for (round, &done) in other.folded.iter().enumerate() {
            if done && self.folded[round] {
                return Err(EnrichError::DuplicateRound(round as u32));
            }
        }

        if other.folded[0] {
            if self.rounds > 0 {
                for path in other.observed.paths() {
                    self.slots(path.clone());
                }
            }
            self.observed = other.observed;
        }
        for (path, values) in other.distributions {
            let slots = self.slots(path);
            for (slot, value) in values.into_iter().enumerate() {
                if other.folded[slot + 1] {
                    slots[slot] = value;
                }
            }
        }
        for (round, done) in other.folded.into_iter().enumerate() {
            self.folded[round] |= done;
        }
        Ok(())
    }

    fn claim(&mut self, round: u32) -> Result<(), EnrichError> {
        if round > self.rounds {
            return Err(EnrichError::RoundOutOfRange {
                round,
                max: self.rounds,
            });
        }
        let done = &mut self.folded[round as usize];
        if *done {
            return Err(EnrichError::DuplicateRound(round));
        }
        *done = true;
        Ok(())
    }

    fn slots(&mut self, path: TaxonomyPath) -> &mut Vec<u32> {
        let rounds = self.rounds as usize;
        self.distributions
            .entry(path)
            .or_insert_with(|| vec![0; rounds])
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn observed(&self) -> &RoundCounts {
        &self.observed
    }

    /// Bootstrap counts of `path` indexed by round − 1.
    pub fn distribution(&self, path: &TaxonomyPath) -> Option<&[u32]> {
        self.distributions.get(path).map(|v| v.as_slice())
    }

    pub fn distributions(&self) -> impl Iterator<Item = (&TaxonomyPath, &[u32])> {
        self.distributions.iter().map(|(p, v)| (p, v.as_slice()))
    }

    /// Hits of `path` in `round`; round 0 is the observed data.
    pub fn count(&self, path: &TaxonomyPath, round: u32) -> u32 {
        if round == 0 {
            return self.observed.get(path);
        }
        self.distributions
            .get(path)
            .and_then(|values| values.get(round as usize - 1))
            .copied()
            .unwrap_or(0)
    }

    /// Whether the observed round and every bootstrap round were folded.
    pub fn is_complete(&self) -> bool {
        self.folded.iter().all(|&done| done)
    }
}
