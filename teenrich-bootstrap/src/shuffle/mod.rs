//! Randomized placement of repeat elements.
//!
//! Each bootstrap round asks a [`ShuffleStrategy`] for a new placement of the
//! fixed repeat set. The three strategies preserve different invariants:
//!
//! - [`RandomPlacement`]: only the chromosome and the element length
//! - [`PositionPool`]: the set of observed positions on each chromosome
//! - [`DistancePreserving`]: the signed distance to the closest TSS
//!
//! Elements that can't be placed are reported in [`ShuffleOutcome::dropped`];
//! elements moved to stay inside chromosome bounds are reported in
//! [`ShuffleOutcome::clamped`].

use std::collections::{BTreeMap, HashMap};

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;
use teenrich_core::models::{Region, RepeatElement, TssIndex};

use crate::config::{RunConfig, StrategyKind};
use crate::errors::EnrichError;

pub mod distance;
pub mod pool;
pub mod random;

pub use self::distance::DistancePreserving;
pub use self::pool::PositionPool;
pub use self::random::RandomPlacement;

/// Lowest start any strategy places an element at.
pub const MIN_START: u32 = 1;

/// Why an element could not be placed in a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The chromosome is missing from the length table or the pool.
    UnknownChromosome,
    /// The element does not fit on its chromosome.
    TooLong,
    /// No inclusion region on the chromosome can hold the element.
    NoRoom,
    /// Every placement attempt hit an exclusion or another element.
    AttemptsExhausted(u32),
    /// No TSS on the element's chromosome.
    NoTss,
    /// The element has no precomputed TSS distance.
    NoDistance,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementFailure {
    pub fragment_id: String,
    pub region: Region,
    pub reason: FailureReason,
}

impl PlacementFailure {
    fn new(element: &RepeatElement, reason: FailureReason) -> Self {
        PlacementFailure {
            fragment_id: element.fragment_id.clone(),
            region: element.region.clone(),
            reason,
        }
    }
}

/// Which chromosome boundary forced a shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClampKind {
    /// Start moved up to [`MIN_START`].
    BeforeStart,
    /// Interval moved left to end at the chromosome length.
    PastEnd,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClampEvent {
    pub fragment_id: String,
    pub kind: ClampKind,
    /// Signed shift applied to the start, in bp.
    pub shift: i64,
}

/// Result of one round of shuffling.
#[derive(Debug, Clone, Default)]
pub struct ShuffleOutcome {
    pub placed: Vec<RepeatElement>,
    pub dropped: Vec<PlacementFailure>,
    pub clamped: Vec<ClampEvent>,
}

impl ShuffleOutcome {
    fn place(&mut self, element: &RepeatElement, start: u32, width: u32) {
        self.placed.push(element.moved_to(start, start + width));
    }

    fn drop_element(&mut self, element: &RepeatElement, reason: FailureReason) {
        self.dropped.push(PlacementFailure::new(element, reason));
    }

    /// Place `element` at `start` (possibly out of bounds), shifting it inside
    /// the chromosome if needed.
    fn place_within(&mut self, element: &RepeatElement, start: i64, width: u32, chrom_len: Option<u32>) {
        match fit_within(start, width, chrom_len) {
            Ok((fitted, clamp)) => {
                if let Some(kind) = clamp {
                    self.clamped.push(ClampEvent {
                        fragment_id: element.fragment_id.clone(),
                        kind,
                        shift: fitted as i64 - start,
                    });
                }
                self.place(element, fitted, width);
            }
            Err(reason) => self.drop_element(element, reason),
        }
    }
}

/// Produces one randomized placement of a repeat set.
///
/// Implementations only read their fixed inputs; all randomness comes from
/// the round's `rng`, so rounds can run in any order or in parallel.
pub trait ShuffleStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn generate(&self, elements: &[RepeatElement], round: u32, rng: &mut StdRng) -> ShuffleOutcome;
}

/// How long a [`PositionPool`] placement is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthPolicy {
    /// Take over the replacement interval unchanged.
    #[default]
    Replacement,
    /// Keep the moved element's own length, anchored at the replacement start.
    Element,
}

///
/// Move a `width` long interval starting at `start` inside `[MIN_START, chrom_len)`
/// by the smallest shift, keeping its length.
///
/// Returns the new start and which boundary, if any, forced the shift.
///
pub fn fit_within(
    start: i64,
    width: u32,
    chrom_len: Option<u32>,
) -> Result<(u32, Option<ClampKind>), FailureReason> {
    let limit = chrom_len.map(|l| l as i64).unwrap_or(u32::MAX as i64);
    let max_start = limit - width as i64;
    if max_start < MIN_START as i64 {
        return Err(FailureReason::TooLong);
    }
    if start < MIN_START as i64 {
        Ok((MIN_START, Some(ClampKind::BeforeStart)))
    } else if start > max_start {
        Ok((max_start as u32, Some(ClampKind::PastEnd)))
    } else {
        Ok((start as u32, None))
    }
}

/// The generator of bootstrap round `round`.
pub fn round_rng(seed: u64, round: u32) -> StdRng {
    StdRng::seed_from_u64(seed.wrapping_add(round as u64))
}

/// Indices of `elements` grouped by chromosome, chromosomes in sorted order.
pub(crate) fn group_by_chr(elements: &[RepeatElement]) -> BTreeMap<&str, Vec<usize>> {
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (idx, element) in elements.iter().enumerate() {
        groups.entry(element.region.chr.as_str()).or_default().push(idx);
    }
    groups
}

/// Optional inputs the strategies draw on.
#[derive(Debug, Clone, Default)]
pub struct StrategyInputs {
    pub chrom_sizes: Option<HashMap<String, u32>>,
    pub exclude: Option<Vec<Region>>,
    pub include: Option<Vec<Region>>,
    pub tss: Option<TssIndex>,
}

///
/// Build the configured strategy, failing when one of its required inputs is
/// missing.
///
/// The TSS distance strategy stores each element's distance to its closest TSS
/// on `elements`.
///
pub fn build_strategy(
    config: &RunConfig,
    inputs: StrategyInputs,
    elements: &mut [RepeatElement],
) -> Result<Box<dyn ShuffleStrategy>, EnrichError> {
    let kind = config.validate()?;
    let strategy: Box<dyn ShuffleStrategy> = match kind {
        StrategyKind::Random => {
            let chrom_sizes = inputs.chrom_sizes.ok_or(EnrichError::MissingInput {
                strategy: "rand",
                input: "a chromosome length table",
            })?;
            let exclude = inputs.exclude.ok_or(EnrichError::MissingInput {
                strategy: "rand",
                input: "exclusion regions",
            })?;
            Box::new(
                RandomPlacement::new(chrom_sizes, &exclude, inputs.include.as_deref())
                    .with_max_attempts(config.max_attempts)
                    .with_max_excluded_fraction(config.max_excluded_fraction)
                    .with_no_overlap(config.no_overlap),
            )
        }
        StrategyKind::Pool => Box::new(
            PositionPool::new(elements, inputs.chrom_sizes).with_length_policy(config.length_policy),
        ),
        StrategyKind::Distance => {
            let tss = inputs
                .tss
                .filter(|t| !t.is_empty())
                .ok_or(EnrichError::MissingInput {
                    strategy: "tss",
                    input: "a TSS annotation",
                })?;
            tss.annotate(elements);
            Box::new(DistancePreserving::new(tss, inputs.chrom_sizes))
        }
    };
    Ok(strategy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case(100, 10, Some(1000), Ok((100, None)))]
    #[case(-20, 10, Some(1000), Ok((1, Some(ClampKind::BeforeStart))))]
    #[case(0, 10, None, Ok((1, Some(ClampKind::BeforeStart))))]
    #[case(995, 10, Some(1000), Ok((990, Some(ClampKind::PastEnd))))]
    #[case(990, 10, Some(1000), Ok((990, None)))]
    #[case(5, 1000, Some(1000), Err(FailureReason::TooLong))]
    fn test_fit_within(
        #[case] start: i64,
        #[case] width: u32,
        #[case] chrom_len: Option<u32>,
        #[case] expected: Result<(u32, Option<ClampKind>), FailureReason>,
    ) {
        assert_eq!(fit_within(start, width, chrom_len), expected);
    }

    #[rstest]
    fn test_round_rng_is_reproducible() {
        use rand::Rng;
        let a: Vec<u32> = (0..5).map(|_| round_rng(7, 3).random()).collect();
        let mut rng = round_rng(7, 3);
        let first: u32 = rng.random();
        assert_eq!(a[0], first);
        let other: u32 = round_rng(7, 4).random();
        assert_ne!(first, other);
    }

    #[rstest]
    fn test_missing_inputs() {
        let mut elements: Vec<RepeatElement> = vec![];
        let config = RunConfig::default().with_strategy(StrategyKind::Random);
        assert!(matches!(
            build_strategy(&config, StrategyInputs::default(), &mut elements),
            Err(EnrichError::MissingInput { strategy: "rand", .. })
        ));

        let config = RunConfig::default().with_strategy(StrategyKind::Distance);
        let inputs = StrategyInputs {
            tss: Some(TssIndex::default()),
            ..StrategyInputs::default()
        };
        assert!(matches!(
            build_strategy(&config, inputs, &mut elements),
            Err(EnrichError::MissingInput { strategy: "tss", .. })
        ));
    }
}
