//! Runs the observed round and the bootstrap rounds of one enrichment test.

use std::collections::HashMap;

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use rand::Rng;
use rayon::prelude::*;
use teenrich_core::models::{FeatureSet, RepeatElement, TaxonomyPath, element_totals};

use crate::aggregate::BootstrapAggregator;
use crate::backend::{InMemoryBackend, IntervalBackend};
use crate::config::{RunConfig, StrategyKind};
use crate::counter::{OverlapCounter, RoundCounts};
use crate::errors::EnrichError;
use crate::provider::{StatisticsProvider, StatrsProvider};
use crate::shuffle::{ClampKind, ShuffleOutcome, ShuffleStrategy, StrategyInputs, build_strategy, round_rng};
use crate::stats::{ExpectedStats, StatisticsEngine};

/// Placement summary of one bootstrap round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundDiagnostics {
    pub round: u32,
    pub placed: usize,
    pub dropped: usize,
    pub clamped_start: usize,
    pub clamped_end: usize,
}

impl RoundDiagnostics {
    fn from_outcome(round: u32, outcome: &ShuffleOutcome) -> Self {
        let clamped_start = outcome
            .clamped
            .iter()
            .filter(|c| c.kind == ClampKind::BeforeStart)
            .count();
        RoundDiagnostics {
            round,
            placed: outcome.placed.len(),
            dropped: outcome.dropped.len(),
            clamped_start,
            clamped_end: outcome.clamped.len() - clamped_start,
        }
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Base seed the round generators were derived from.
    pub seed: u64,
    pub strategy: StrategyKind,
    pub aggregator: BootstrapAggregator,
    /// `None` when no bootstrap round was requested.
    pub stats: Option<ExpectedStats>,
    /// One entry per bootstrap round, in round order.
    pub diagnostics: Vec<RoundDiagnostics>,
    /// Genome-wide distinct elements per path.
    pub totals: HashMap<TaxonomyPath, u64>,
    pub feature_count: usize,
}

impl RunResult {
    pub fn observed(&self) -> &RoundCounts {
        self.aggregator.observed()
    }

    pub fn rounds(&self) -> u32 {
        self.aggregator.rounds()
    }

    /// Elements dropped across all rounds.
    pub fn total_dropped(&self) -> usize {
        self.diagnostics.iter().map(|d| d.dropped).sum()
    }
}

///
/// A configured enrichment test: the reference features, the repeat set after
/// filtering, the shuffle strategy and the collaborators that count and test.
///
/// Every input is checked in [`EnrichmentRun::new`], before any round runs.
///
pub struct EnrichmentRun {
    config: RunConfig,
    strategy_kind: StrategyKind,
    repeats: Vec<RepeatElement>,
    totals: HashMap<TaxonomyPath, u64>,
    strategy: Box<dyn ShuffleStrategy>,
    backend: Box<dyn IntervalBackend>,
    provider: Box<dyn StatisticsProvider>,
}

impl EnrichmentRun {
    pub fn new(
        config: RunConfig,
        reference: &FeatureSet,
        repeats: Vec<RepeatElement>,
        inputs: StrategyInputs,
    ) -> Result<Self, EnrichError> {
        let strategy_kind = config.validate()?;
        if reference.is_empty() {
            return Err(EnrichError::EmptyReference);
        }
        if repeats.is_empty() {
            return Err(EnrichError::EmptyRepeats);
        }

        let mut repeats = match &config.filter {
            Some(filter) => {
                let before = repeats.len();
                let kept = filter.apply(repeats);
                info!("Filter {} kept {} of {} repeat fragments", filter, kept.len(), before);
                if kept.is_empty() {
                    return Err(EnrichError::EmptyFilteredRepeats(filter.to_string()));
                }
                kept
            }
            None => repeats,
        };

        let totals = element_totals(&repeats);
        let strategy = build_strategy(&config, inputs, &mut repeats)?;
        info!(
            "Prepared {} strategy over {} repeat fragments and {} reference features",
            strategy.name(),
            repeats.len(),
            reference.len()
        );

        Ok(EnrichmentRun {
            config,
            strategy_kind,
            repeats,
            totals,
            strategy,
            backend: Box::new(InMemoryBackend::new(reference)),
            provider: Box::new(StatrsProvider),
        })
    }

    /// Count overlaps through `backend` instead of the in-memory index.
    pub fn with_backend(mut self, backend: Box<dyn IntervalBackend>) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_provider(mut self, provider: Box<dyn StatisticsProvider>) -> Self {
        self.provider = provider;
        self
    }

    pub fn with_strategy(mut self, strategy: Box<dyn ShuffleStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Repeats the run works on, after filtering.
    pub fn repeats(&self) -> &[RepeatElement] {
        &self.repeats
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn run(&self) -> Result<RunResult, EnrichError> {
        let rounds = self.config.rounds;
        let seed = self.config.seed.unwrap_or_else(|| rand::rng().random());
        info!("Running {} bootstrap round(s) with seed {}", rounds, seed);

        let mut aggregator = BootstrapAggregator::new(rounds);
        let observed = self.count_round(0, &self.repeats)?;
        info!(
            "Observed {} of {} reference features hit",
            observed.total_hits(),
            self.backend.feature_count()
        );
        aggregator.fold(0, observed)?;

        let bar = self.progress_bar(rounds);
        let results: Vec<(RoundCounts, RoundDiagnostics)> = if self.config.parallel {
            (1..=rounds)
                .into_par_iter()
                .map(|round| {
                    let result = self.bootstrap_round(seed, round);
                    bar.inc(1);
                    result
                })
                .collect::<Result<Vec<_>, _>>()?
        } else {
            let mut results = Vec::with_capacity(rounds as usize);
            for round in 1..=rounds {
                results.push(self.bootstrap_round(seed, round)?);
                bar.inc(1);
            }
            results
        };
        bar.finish_and_clear();

        let mut diagnostics = Vec::with_capacity(results.len());
        for (counts, diag) in results {
            aggregator.fold(diag.round, counts)?;
            diagnostics.push(diag);
        }

        let dropped: usize = diagnostics.iter().map(|d| d.dropped).sum();
        if dropped > 0 {
            warn!("{} element placement(s) failed across {} rounds", dropped, rounds);
        }

        let stats = StatisticsEngine::new(self.provider.as_ref())
            .with_threshold(self.config.significance)
            .compute(&aggregator, &self.totals);
        if stats.is_none() {
            info!("No bootstrap rounds, skipping statistics");
        }

        Ok(RunResult {
            seed,
            strategy: self.strategy_kind,
            aggregator,
            stats,
            diagnostics,
            totals: self.totals.clone(),
            feature_count: self.backend.feature_count(),
        })
    }

    fn bootstrap_round(&self, seed: u64, round: u32) -> Result<(RoundCounts, RoundDiagnostics), EnrichError> {
        let mut rng = round_rng(seed, round);
        let outcome = self.strategy.generate(&self.repeats, round, &mut rng);

        for failure in &outcome.dropped {
            debug!(
                "Round {}: dropped {} at {} ({:?})",
                round, failure.fragment_id, failure.region, failure.reason
            );
        }
        let diagnostics = RoundDiagnostics::from_outcome(round, &outcome);
        if diagnostics.clamped_start + diagnostics.clamped_end > 0 {
            warn!(
                "Round {}: {} placement(s) shifted to stay inside chromosome bounds",
                round,
                diagnostics.clamped_start + diagnostics.clamped_end
            );
        }

        let counts = self.count_round(round, &outcome.placed)?;
        debug!(
            "Round {}: {} placed, {} dropped, {} features hit",
            round,
            diagnostics.placed,
            diagnostics.dropped,
            counts.total_hits()
        );
        Ok((counts, diagnostics))
    }

    /// Count with the backend, retrying failed calls up to `backend_retries` times.
    fn count_round(&self, round: u32, candidates: &[RepeatElement]) -> Result<RoundCounts, EnrichError> {
        let counter = OverlapCounter::new(self.backend.as_ref(), self.config.min_overlap);
        let mut attempts = 0;
        loop {
            attempts += 1;
            match counter.count(candidates) {
                Ok(counts) => return Ok(counts),
                Err(e) if attempts <= self.config.backend_retries => {
                    warn!("Round {}: {} (attempt {}), retrying", round, e, attempts);
                }
                Err(e) => {
                    return Err(EnrichError::Backend {
                        round,
                        attempts,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    fn progress_bar(&self, rounds: u32) -> ProgressBar {
        if !self.config.progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(rounds as u64);
        if let Ok(style) =
            ProgressStyle::with_template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
        {
            bar.set_style(style);
        }
        bar.set_message("bootstrap rounds");
        bar
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, OverlapHit};
    use crate::shuffle::PositionPool;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use teenrich_core::models::Region;

    fn alu(start: u32, end: u32) -> RepeatElement {
        RepeatElement::new(Region::new("chr1", start, end), "1", "AluY", "SINE", "Alu")
    }

    #[fixture]
    fn reference() -> FeatureSet {
        FeatureSet::from(vec![Region::new("chr1", 100, 200)])
    }

    /// Fails the first `failures` calls.
    struct FlakyBackend {
        failures: u32,
        calls: AtomicU32,
    }

    impl IntervalBackend for FlakyBackend {
        fn intersect(&self, _: &[RepeatElement], _: u32) -> Result<Vec<OverlapHit>, BackendError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(BackendError::Failed("broken pipe".to_string()))
            } else {
                Ok(vec![])
            }
        }

        fn feature_count(&self) -> usize {
            1
        }
    }

    #[rstest]
    fn test_rejects_empty_inputs(reference: FeatureSet) {
        let config = RunConfig::default().with_strategy(StrategyKind::Pool);
        assert!(matches!(
            EnrichmentRun::new(config.clone(), &FeatureSet::from(vec![]), vec![alu(1, 10)], StrategyInputs::default()),
            Err(EnrichError::EmptyReference)
        ));
        assert!(matches!(
            EnrichmentRun::new(config, &reference, vec![], StrategyInputs::default()),
            Err(EnrichError::EmptyRepeats)
        ));
    }

    #[rstest]
    fn test_filter_removing_everything(reference: FeatureSet) {
        let config = RunConfig::default()
            .with_strategy(StrategyKind::Pool)
            .with_filter("class=DNA".parse().unwrap());
        let err = match EnrichmentRun::new(config, &reference, vec![alu(1, 10)], StrategyInputs::default()) {
            Err(err) => err,
            Ok(_) => panic!("a filter matching nothing must be rejected"),
        };
        assert!(matches!(&err, EnrichError::EmptyFilteredRepeats(filter) if filter == "class=DNA"));
        assert_eq!(err.to_string(), "No repeat elements match the filter class=DNA");
    }

    #[rstest]
    fn test_backend_retried(reference: FeatureSet) {
        let config = RunConfig::default().with_strategy(StrategyKind::Pool).with_rounds(1);
        let run = EnrichmentRun::new(config, &reference, vec![alu(150, 160)], StrategyInputs::default())
            .unwrap()
            .with_backend(Box::new(FlakyBackend {
                failures: 2,
                calls: AtomicU32::new(0),
            }));
        let result = run.run().unwrap();
        assert_eq!(result.observed().total_hits(), 0);
    }

    #[rstest]
    fn test_backend_failure_aborts(reference: FeatureSet) {
        let config = RunConfig::default().with_strategy(StrategyKind::Pool).with_rounds(1);
        let run = EnrichmentRun::new(config, &reference, vec![alu(150, 160)], StrategyInputs::default())
            .unwrap()
            .with_backend(Box::new(FlakyBackend {
                failures: 3,
                calls: AtomicU32::new(0),
            }));
        assert!(matches!(
            run.run(),
            Err(EnrichError::Backend {
                round: 0,
                attempts: 3,
                ..
            })
        ));
    }

    #[rstest]
    fn test_seed_recorded(reference: FeatureSet) {
        let config = RunConfig::default()
            .with_strategy(StrategyKind::Pool)
            .with_rounds(2)
            .with_seed(99);
        let repeats = vec![alu(150, 160)];
        let run = EnrichmentRun::new(config, &reference, repeats.clone(), StrategyInputs::default())
            .unwrap()
            .with_strategy(Box::new(PositionPool::new(&repeats, None)));
        let result = run.run().unwrap();
        assert_eq!(result.seed, 99);
        assert_eq!(result.diagnostics.len(), 2);
        assert_eq!(result.diagnostics[1].round, 2);
        assert_eq!(result.total_dropped(), 0);
    }
}
