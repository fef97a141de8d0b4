//! Enrichment statistics over the bootstrap distributions.

use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Display};

use teenrich_core::models::TaxonomyPath;

use crate::aggregate::BootstrapAggregator;
use crate::config::DEFAULT_SIGNIFICANCE;
use crate::provider::{BinomialTest, StatisticsProvider};

/// Outcome of comparing a p-value with the significance threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Significance {
    Significant,
    NotSignificant,
    /// The test could not be computed.
    Unavailable,
}

impl Significance {
    pub fn from_pvalue(pvalue: Option<f64>, threshold: f64) -> Self {
        match pvalue {
            Some(p) if p < threshold => Significance::Significant,
            Some(_) => Significance::NotSignificant,
            None => Significance::Unavailable,
        }
    }
}

impl Display for Significance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Significance::Significant => write!(f, "sign"),
            Significance::NotSignificant => write!(f, "ns"),
            Significance::Unavailable => write!(f, "na"),
        }
    }
}

/// Statistics of one taxonomy path.
#[derive(Debug, Clone, PartialEq)]
pub struct PathStats {
    pub observed: u32,
    /// Genome-wide number of elements on the path.
    pub trials: u64,
    pub mean: f64,
    pub stdev: f64,
    /// 1-based position of the observed count among the sorted bootstrap counts.
    pub rank: u32,
    pub perm_pvalue: Option<f64>,
    pub perm_significance: Significance,
    pub binomial: Option<BinomialTest>,
    pub binom_significance: Significance,
}

/// Per-path statistics of a run with at least one bootstrap round.
#[derive(Debug, Clone)]
pub struct ExpectedStats {
    pub rounds: u32,
    /// Bootstrap mean of the genome-wide total path.
    pub total_mean: f64,
    pub paths: BTreeMap<TaxonomyPath, PathStats>,
}

impl ExpectedStats {
    pub fn get(&self, path: &TaxonomyPath) -> Option<&PathStats> {
        self.paths.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TaxonomyPath, &PathStats)> {
        self.paths.iter()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Mean and sample standard deviation; the deviation is 0 for fewer than two values.
pub fn mean_stdev(values: &[u32]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    if values.len() < 2 {
        return (mean, 0.0);
    }
    let ss: f64 = values.iter().map(|&v| (v as f64 - mean).powi(2)).sum();
    (mean, (ss / (n - 1.0)).sqrt())
}

///
/// Rank of `observed` among `sorted` (ascending): 1 plus the number of leading
/// values not exceeding it. Ties raise the rank.
///
pub fn rank_of(observed: u32, sorted: &[u32]) -> u32 {
    let mut rank = 1;
    for &value in sorted {
        if value > observed {
            break;
        }
        rank += 1;
    }
    rank
}

/// Two-tailed permutation p-value of `rank` among `rounds` bootstrap values.
pub fn permutation_pvalue(rank: u32, rounds: u32) -> f64 {
    let n = rounds as f64;
    let rank = rank as f64;
    let p = if rank <= n / 2.0 {
        rank * 2.0 / n
    } else {
        (n + 2.0 - rank) * 2.0 / n
    };
    p.min(1.0)
}

///
/// Turns the aggregated counts into per-path statistics.
///
/// Every observed path gets a row, as does every path that only showed up in
/// bootstrap rounds (with observed 0).
///
pub struct StatisticsEngine<'a> {
    provider: &'a dyn StatisticsProvider,
    threshold: f64,
}

impl<'a> StatisticsEngine<'a> {
    pub fn new(provider: &'a dyn StatisticsProvider) -> Self {
        StatisticsEngine {
            provider,
            threshold: DEFAULT_SIGNIFICANCE,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// `None` when the run had no bootstrap rounds.
    pub fn compute(
        &self,
        aggregator: &BootstrapAggregator,
        totals: &HashMap<TaxonomyPath, u64>,
    ) -> Option<ExpectedStats> {
        let rounds = aggregator.rounds();
        if rounds == 0 {
            return None;
        }
        let zeros = vec![0u32; rounds as usize];

        let mut paths: Vec<&TaxonomyPath> = aggregator.observed().paths().collect();
        paths.extend(aggregator.distributions().map(|(path, _)| path));
        paths.sort();
        paths.dedup();

        let mut rows = BTreeMap::new();
        for path in paths {
            let observed = aggregator.observed().get(path);
            let distribution = aggregator.distribution(path).unwrap_or(&zeros);
            let trials = totals.get(path).copied().unwrap_or(0);
            rows.insert(path.clone(), self.path_stats(observed, distribution, trials));
        }

        let total_mean = aggregator
            .distribution(&TaxonomyPath::total())
            .map(|d| mean_stdev(d).0)
            .unwrap_or(0.0);

        Some(ExpectedStats {
            rounds,
            total_mean,
            paths: rows,
        })
    }

    fn path_stats(&self, observed: u32, distribution: &[u32], trials: u64) -> PathStats {
        let rounds = distribution.len() as u32;
        let (mean, stdev) = mean_stdev(distribution);

        let mut sorted = distribution.to_vec();
        sorted.sort_unstable();
        let rank = rank_of(observed, &sorted);

        let perm_pvalue = if observed == 0 && mean == 0.0 {
            None
        } else {
            Some(permutation_pvalue(rank, rounds))
        };

        let binomial = if trials == 0 {
            None
        } else {
            let p = mean / trials as f64;
            if p > 1.0 || observed as u64 > trials {
                None
            } else {
                self.provider.binomial_test(observed as u64, trials, p)
            }
        };

        PathStats {
            observed,
            trials,
            mean,
            stdev,
            rank,
            perm_pvalue,
            perm_significance: Significance::from_pvalue(perm_pvalue, self.threshold),
            binom_significance: Significance::from_pvalue(binomial.map(|b| b.pvalue), self.threshold),
            binomial,
        }
    }
}
