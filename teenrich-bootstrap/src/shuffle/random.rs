use std::collections::{BTreeMap, HashMap};

use rand::Rng;
use rand::rngs::StdRng;
use teenrich_core::models::{Region, RepeatElement};
use teenrich_overlaprs::ChromIndex;

use crate::config::{DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_EXCLUDED_FRACTION};
use crate::shuffle::{FailureReason, MIN_START, ShuffleOutcome, ShuffleStrategy};

///
/// Places every element at a uniformly drawn start on its own chromosome.
///
/// A draw is rejected when more than `max_excluded_fraction` of the element
/// falls into excluded regions, or, with `no_overlap`, when it overlaps an
/// element already placed in the same round. With inclusion regions the
/// element must lie fully inside one of them; each region is picked with
/// weight equal to the number of starts it admits.
///
#[derive(Debug, Clone)]
pub struct RandomPlacement {
    chrom_sizes: HashMap<String, u32>,
    exclude: ChromIndex<()>,
    include: Option<ChromIndex<()>>,
    max_attempts: u32,
    max_excluded_fraction: f64,
    no_overlap: bool,
}

/// Inclusive range of valid starts.
#[derive(Debug, Clone, Copy)]
struct StartWindow {
    lo: u32,
    hi: u32,
}

impl StartWindow {
    fn count(&self) -> u64 {
        (self.hi - self.lo) as u64 + 1
    }
}

impl RandomPlacement {
    pub fn new(
        chrom_sizes: HashMap<String, u32>,
        exclude: &[Region],
        include: Option<&[Region]>,
    ) -> Self {
        RandomPlacement {
            chrom_sizes,
            exclude: ChromIndex::from_regions_merged(exclude),
            include: include.map(ChromIndex::from_regions_merged),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            max_excluded_fraction: DEFAULT_MAX_EXCLUDED_FRACTION,
            no_overlap: false,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_max_excluded_fraction(mut self, fraction: f64) -> Self {
        self.max_excluded_fraction = fraction;
        self
    }

    pub fn with_no_overlap(mut self, no_overlap: bool) -> Self {
        self.no_overlap = no_overlap;
        self
    }

    fn windows(&self, chr: &str, width: u32, chrom_len: u32) -> Result<Vec<StartWindow>, FailureReason> {
        if chrom_len < width || chrom_len - width < MIN_START {
            return Err(FailureReason::TooLong);
        }
        let last_start = chrom_len - width;

        let include = match &self.include {
            Some(include) => include,
            None => {
                return Ok(vec![StartWindow {
                    lo: MIN_START,
                    hi: last_start,
                }]);
            }
        };

        let windows: Vec<StartWindow> = include
            .chr_intervals(chr)
            .iter()
            .filter(|iv| iv.end - iv.start >= width)
            .map(|iv| StartWindow {
                lo: iv.start.max(MIN_START),
                hi: (iv.end - width).min(last_start),
            })
            .filter(|w| w.lo <= w.hi)
            .collect();

        if windows.is_empty() {
            Err(FailureReason::NoRoom)
        } else {
            Ok(windows)
        }
    }

    fn draw_start(windows: &[StartWindow], cumulative: &[u64], rng: &mut StdRng) -> u32 {
        let total = cumulative[cumulative.len() - 1];
        let pick = rng.random_range(0..total);
        let idx = cumulative.partition_point(|&c| c <= pick);
        let window = windows[idx];
        let before = if idx == 0 { 0 } else { cumulative[idx - 1] };
        window.lo + (pick - before) as u32
    }

    fn excluded_too_much(&self, chr: &str, start: u32, width: u32) -> bool {
        let excluded = self.exclude.covered_len(chr, start, start + width);
        excluded as f64 > self.max_excluded_fraction * width as f64
    }
}

/// Whether `[start, end)` overlaps any of the non-overlapping `placed` intervals.
fn collides(placed: &BTreeMap<u32, u32>, start: u32, end: u32) -> bool {
    placed
        .range(..end)
        .next_back()
        .is_some_and(|(&s, &e)| e > start && s < end)
}

impl ShuffleStrategy for RandomPlacement {
    fn name(&self) -> &'static str {
        "rand"
    }

    fn generate(&self, elements: &[RepeatElement], _round: u32, rng: &mut StdRng) -> ShuffleOutcome {
        let mut outcome = ShuffleOutcome::default();
        let mut placed_by_chr: HashMap<&str, BTreeMap<u32, u32>> = HashMap::new();

        for element in elements {
            let chr = element.region.chr.as_str();
            let width = element.width();

            let chrom_len = match self.chrom_sizes.get(chr) {
                Some(len) => *len,
                None => {
                    outcome.drop_element(element, FailureReason::UnknownChromosome);
                    continue;
                }
            };
            let windows = match self.windows(chr, width, chrom_len) {
                Ok(windows) => windows,
                Err(reason) => {
                    outcome.drop_element(element, reason);
                    continue;
                }
            };
            let cumulative: Vec<u64> = windows
                .iter()
                .scan(0u64, |acc, w| {
                    *acc += w.count();
                    Some(*acc)
                })
                .collect();

            let placed = placed_by_chr.entry(chr).or_default();
            let mut found = None;
            for _ in 0..self.max_attempts {
                let start = Self::draw_start(&windows, &cumulative, rng);
                if self.excluded_too_much(chr, start, width) {
                    continue;
                }
                if self.no_overlap && collides(placed, start, start + width) {
                    continue;
                }
                found = Some(start);
                break;
            }

            match found {
                Some(start) => {
                    if self.no_overlap && width > 0 {
                        placed.insert(start, start + width);
                    }
                    outcome.place(element, start, width);
                }
                None => {
                    outcome.drop_element(element, FailureReason::AttemptsExhausted(self.max_attempts))
                }
            }
        }
        outcome
    }
}
