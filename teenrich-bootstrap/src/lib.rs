//! Shuffle-based enrichment testing of repeat overlaps with genomic features.
//!
//! A run counts how many reference features (e.g. peaks) are hit by each repeat
//! class, family, name and age category, then repeats the count on `N` shuffled
//! copies of the repeat set. The shuffled counts form a null distribution per
//! category, against which the observed count is tested with a rank-based
//! permutation test and an exact binomial test.
//!
//! - [`shuffle`]: the three [`ShuffleStrategy`] implementations
//! - [`counter`]: deduplicated hit counts of one round
//! - [`aggregate`]: per-category distributions over rounds
//! - [`stats`]: permutation and binomial statistics
//! - [`engine`]: [`EnrichmentRun`], which ties them together
//! - [`report`]: TSV output
//!
//! # Example
//!
//! ```no_run
//! use teenrich_bootstrap::{EnrichmentRun, RunConfig, StrategyInputs, StrategyKind};
//! use teenrich_core::models::FeatureSet;
//! use teenrich_core::readers::read_repeatmasker;
//!
//! let peaks = FeatureSet::try_from("peaks.bed").unwrap();
//! let repeats = read_repeatmasker("hg38.fa.out.gz").unwrap();
//!
//! let config = RunConfig::default()
//!     .with_strategy(StrategyKind::Pool)
//!     .with_rounds(1000)
//!     .with_seed(7);
//! let run = EnrichmentRun::new(config, &peaks, repeats, StrategyInputs::default()).unwrap();
//! let result = run.run().unwrap();
//! teenrich_bootstrap::report::write_reports(&result, "out/peaks").unwrap();
//! ```

pub mod aggregate;
pub mod backend;
pub mod config;
pub mod counter;
pub mod engine;
pub mod errors;
pub mod provider;
pub mod report;
pub mod shuffle;
pub mod stats;

// re-exports
pub use self::aggregate::BootstrapAggregator;
pub use self::backend::{InMemoryBackend, IntervalBackend, OverlapHit};
pub use self::config::{RunConfig, StrategyKind};
pub use self::counter::{OverlapCounter, RoundCounts, count_overlaps};
pub use self::engine::{EnrichmentRun, RoundDiagnostics, RunResult};
pub use self::errors::EnrichError;
pub use self::provider::{BinomialTest, StatisticsProvider, StatrsProvider};
pub use self::shuffle::{LengthPolicy, ShuffleOutcome, ShuffleStrategy, StrategyInputs};
pub use self::stats::{ExpectedStats, PathStats, Significance, StatisticsEngine};
