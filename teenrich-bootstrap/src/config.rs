use std::fmt::{self, Display};
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use teenrich_core::models::RepeatFilter;

use crate::errors::EnrichError;
use crate::shuffle::LengthPolicy;

pub const DEFAULT_MIN_OVERLAP: u32 = 10;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10_000;
pub const DEFAULT_MAX_EXCLUDED_FRACTION: f64 = 0.03;
pub const DEFAULT_SIGNIFICANCE: f64 = 0.05;
pub const DEFAULT_BACKEND_RETRIES: u32 = 2;

/// Which invariant the bootstrap rounds preserve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum StrategyKind {
    /// Free placement on the same chromosome.
    #[serde(rename = "rand", alias = "random")]
    Random,
    /// Permutation of the observed positions.
    #[serde(rename = "pool")]
    Pool,
    /// Same signed distance to a TSS.
    #[serde(rename = "tss", alias = "distance")]
    Distance,
}

impl StrategyKind {
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::Random => "rand",
            StrategyKind::Pool => "pool",
            StrategyKind::Distance => "tss",
        }
    }
}

impl FromStr for StrategyKind {
    type Err = EnrichError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rand" | "random" => Ok(StrategyKind::Random),
            "pool" => Ok(StrategyKind::Pool),
            "tss" | "distance" => Ok(StrategyKind::Distance),
            _ => Err(EnrichError::UnknownStrategy(s.to_string())),
        }
    }
}

impl Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

///
/// Parameters of one enrichment run.
///
/// Every field has a default except the strategy, which must be chosen
/// explicitly. Can be read from TOML:
///
/// ```toml
/// strategy = "rand"
/// rounds = 1000
/// min_overlap = 10
/// seed = 7
///
/// [filter]
/// field = "class"
/// value = "DNA"
/// ```
///
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub strategy: Option<StrategyKind>,
    /// Number of bootstrap rounds; 0 reports observed counts only.
    pub rounds: u32,
    /// Minimum overlap in bp for a repeat to hit a feature.
    pub min_overlap: u32,
    /// Base seed; each round derives its own generator from it. Drawn at
    /// random when unset.
    pub seed: Option<u64>,
    pub parallel: bool,
    pub progress: bool,
    /// How many times a failing backend call is retried before the run aborts.
    pub backend_retries: u32,
    /// p-value threshold of the significance labels.
    pub significance: f64,
    /// Placement attempts per element for the `rand` strategy.
    pub max_attempts: u32,
    /// Tolerated fraction of a placed element inside excluded regions.
    pub max_excluded_fraction: f64,
    /// Forbid shuffled elements from overlapping each other (`rand` only).
    pub no_overlap: bool,
    pub length_policy: LengthPolicy,
    pub filter: Option<RepeatFilter>,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            strategy: None,
            rounds: 0,
            min_overlap: DEFAULT_MIN_OVERLAP,
            seed: None,
            parallel: false,
            progress: false,
            backend_retries: DEFAULT_BACKEND_RETRIES,
            significance: DEFAULT_SIGNIFICANCE,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            max_excluded_fraction: DEFAULT_MAX_EXCLUDED_FRACTION,
            no_overlap: false,
            length_policy: LengthPolicy::default(),
            filter: None,
        }
    }
}

impl RunConfig {
    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_min_overlap(mut self, min_overlap: u32) -> Self {
        self.min_overlap = min_overlap;
        self
    }

    pub fn with_filter(mut self, filter: RepeatFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Load a configuration from a TOML file. Missing keys take their defaults.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, EnrichError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| EnrichError::Io {
            phase: "read config",
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&raw)
            .map_err(|e| EnrichError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Reject configurations no round could run with.
    pub fn validate(&self) -> Result<StrategyKind, EnrichError> {
        let strategy = self.strategy.ok_or(EnrichError::MissingStrategy)?;
        if self.min_overlap == 0 {
            return Err(EnrichError::Config("min_overlap must be at least 1".to_string()));
        }
        if !(self.significance > 0.0 && self.significance < 1.0) {
            return Err(EnrichError::Config(format!(
                "significance must be in (0, 1), got {}",
                self.significance
            )));
        }
        if self.max_attempts == 0 {
            return Err(EnrichError::Config("max_attempts must be at least 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.max_excluded_fraction) {
            return Err(EnrichError::Config(format!(
                "max_excluded_fraction must be in [0, 1], got {}",
                self.max_excluded_fraction
            )));
        }
        Ok(strategy)
    }
}
