//! TSV reports of a finished run.
//!
//! A run writes one per-round stream per [`Granularity`] and, when bootstrap
//! rounds were requested, one statistics table:
//!
//! - `<prefix>.<granularity>.rounds.tsv`
//! - `<prefix>.stats.tsv`

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use teenrich_core::models::{Granularity, TaxonomyPath};

use crate::engine::RunResult;
use crate::errors::EnrichError;
use crate::stats::{ExpectedStats, PathStats};

pub const ROUNDS_HEADER: &str = "round\tclass\tfamily\tname\thits\ttotal_features\tunhit\ttotal_hits";

pub const STATS_HEADER: &str = "class\tfamily\tname\tobserved\tobserved_pct\tobserved_total_hits\ttrials\t\
boot_mean\tboot_stdev\texpected_pct\tboot_total_mean\trank\tperm_pvalue\tperm_sign\t\
binom_estimate\tbinom_ci_low\tbinom_ci_high\tbinom_pvalue\tbinom_sign";

const NA: &str = "na";

/// One line of a per-round stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundDetail<'a> {
    pub round: u32,
    pub path: &'a TaxonomyPath,
    pub hits: u32,
    pub total_features: usize,
    pub unhit: usize,
    /// Reference features hit by any repeat in this round.
    pub total_hits: u32,
}

///
/// Rows of one per-round stream, produced on demand, round by round.
///
/// Counts are read straight from the aggregator, so no row or per-round map
/// is kept around.
///
#[derive(Debug)]
pub struct RoundDetails<'a> {
    result: &'a RunResult,
    paths: Vec<&'a TaxonomyPath>,
    round: u32,
    next_path: usize,
    total_hits: u32,
}

impl<'a> Iterator for RoundDetails<'a> {
    type Item = RoundDetail<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let aggregator = &self.result.aggregator;
        if self.next_path == self.paths.len() {
            if self.paths.is_empty() || self.round == self.result.rounds() {
                return None;
            }
            self.round += 1;
            self.next_path = 0;
            self.total_hits = aggregator.count(&TaxonomyPath::total(), self.round);
        }

        let path = self.paths[self.next_path];
        self.next_path += 1;
        let hits = aggregator.count(path, self.round);
        Some(RoundDetail {
            round: self.round,
            path,
            hits,
            total_features: self.result.feature_count,
            unhit: self.result.feature_count.saturating_sub(hits as usize),
            total_hits: self.total_hits,
        })
    }
}

///
/// Per-round records of every path of `granularity`, for round 0 (observed)
/// and each bootstrap round. Paths without hits in a round are reported with 0.
///
pub fn round_details(result: &RunResult, granularity: Granularity) -> RoundDetails<'_> {
    let aggregator = &result.aggregator;
    let paths: BTreeSet<&TaxonomyPath> = aggregator
        .observed()
        .paths()
        .chain(aggregator.distributions().map(|(path, _)| path))
        .filter(|path| path.granularity() == granularity)
        .collect();

    RoundDetails {
        result,
        paths: paths.into_iter().collect(),
        round: 0,
        next_path: 0,
        total_hits: aggregator.count(&TaxonomyPath::total(), 0),
    }
}

pub fn write_round_details<'a, W, I>(writer: &mut W, details: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = RoundDetail<'a>>,
{
    writeln!(writer, "{}", ROUNDS_HEADER)?;
    for detail in details {
        let (class, family, name) = detail.path.columns();
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            detail.round,
            class,
            family,
            name,
            detail.hits,
            detail.total_features,
            detail.unhit,
            detail.total_hits
        )?;
    }
    Ok(())
}

fn percent(count: f64, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count * 100.0 / total as f64
    }
}

fn or_na(value: Option<f64>) -> String {
    value.map(|v| format!("{:.6}", v)).unwrap_or_else(|| NA.to_string())
}

fn stats_line(path: &TaxonomyPath, row: &PathStats, stats: &ExpectedStats, result: &RunResult) -> String {
    let (class, family, name) = path.columns();
    let observed_total = result.observed().total_hits();
    let binomial = row.binomial;
    format!(
        "{}\t{}\t{}\t{}\t{:.4}\t{}\t{}\t{:.4}\t{:.4}\t{:.4}\t{:.4}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
        class,
        family,
        name,
        row.observed,
        percent(row.observed as f64, result.feature_count),
        observed_total,
        row.trials,
        row.mean,
        row.stdev,
        percent(row.mean, result.feature_count),
        stats.total_mean,
        row.rank,
        or_na(row.perm_pvalue),
        row.perm_significance,
        or_na(binomial.map(|b| b.estimate)),
        or_na(binomial.map(|b| b.ci_low)),
        or_na(binomial.map(|b| b.ci_high)),
        or_na(binomial.map(|b| b.pvalue)),
        row.binom_significance,
    )
}

pub fn write_stats<W: Write>(writer: &mut W, result: &RunResult) -> io::Result<()> {
    writeln!(writer, "{}", STATS_HEADER)?;
    if let Some(stats) = &result.stats {
        for (path, row) in stats.iter() {
            writeln!(writer, "{}", stats_line(path, row, stats, result))?;
        }
    }
    Ok(())
}

fn report_path(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = prefix.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

fn write_file<F>(path: &Path, write: F) -> Result<(), EnrichError>
where
    F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
{
    let io_err = |source: io::Error| EnrichError::Io {
        phase: "write report",
        path: path.display().to_string(),
        source,
    };
    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    write(&mut writer).map_err(io_err)?;
    writer.flush().map_err(io_err)
}

///
/// Write all reports next to `prefix` and return the written paths.
///
/// The statistics table is only written when the run had bootstrap rounds.
///
pub fn write_reports<P: AsRef<Path>>(result: &RunResult, prefix: P) -> Result<Vec<PathBuf>, EnrichError> {
    let prefix = prefix.as_ref();
    let mut written = Vec::new();

    for granularity in Granularity::ALL {
        let path = report_path(prefix, &format!("{}.rounds.tsv", granularity));
        write_file(&path, |w| write_round_details(w, round_details(result, granularity)))?;
        written.push(path);
    }

    if result.stats.is_some() {
        let path = report_path(prefix, "stats.tsv");
        write_file(&path, |w| write_stats(w, result))?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::BootstrapAggregator;
    use crate::config::StrategyKind;
    use crate::counter::RoundCounts;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::collections::HashMap;

    fn result_with(rounds: &[RoundCounts]) -> RunResult {
        let mut aggregator = BootstrapAggregator::new(rounds.len() as u32 - 1);
        for (round, counts) in rounds.iter().enumerate() {
            aggregator.fold(round as u32, counts.clone()).unwrap();
        }
        RunResult {
            seed: 1,
            strategy: StrategyKind::Pool,
            aggregator,
            stats: None,
            diagnostics: vec![],
            totals: HashMap::new(),
            feature_count: 4,
        }
    }

    #[rstest]
    fn test_round_details_report_zero_rows() {
        let sine = TaxonomyPath::class("SINE");
        let dna = TaxonomyPath::class("DNA");
        let result = result_with(&[
            RoundCounts::from_iter([(TaxonomyPath::total(), 1), (sine.clone(), 1)]),
            RoundCounts::from_iter([(TaxonomyPath::total(), 2), (dna.clone(), 2)]),
        ]);

        let details: Vec<RoundDetail> = round_details(&result, Granularity::Class).collect();
        // total, DNA and SINE in both rounds
        assert_eq!(details.len(), 6);
        let observed_dna = details.iter().find(|d| d.round == 0 && *d.path == dna).unwrap();
        assert_eq!(observed_dna.hits, 0);
        assert_eq!(observed_dna.unhit, 4);
        assert_eq!(observed_dna.total_hits, 1);
        assert_eq!(round_details(&result, Granularity::Family).count(), 0);
    }

    #[rstest]
    fn test_write_round_details() {
        let result = result_with(&[RoundCounts::from_iter([(TaxonomyPath::class("SINE"), 3)])]);
        let mut out = Vec::new();
        write_round_details(&mut out, round_details(&result, Granularity::Class)).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], ROUNDS_HEADER);
        assert_eq!(lines[1], "0\tSINE\ttot\ttot\t3\t4\t1\t0");
    }

    #[rstest]
    fn test_round_details_follow_round_order() {
        let sine = TaxonomyPath::class("SINE");
        let result = result_with(&[
            RoundCounts::from_iter([(TaxonomyPath::total(), 2), (sine.clone(), 2)]),
            RoundCounts::from_iter([(TaxonomyPath::total(), 1), (sine.clone(), 1)]),
            RoundCounts::default(),
            RoundCounts::from_iter([(TaxonomyPath::total(), 3), (sine.clone(), 3)]),
        ]);

        let rows: Vec<(u32, u32, u32)> = round_details(&result, Granularity::Class)
            .filter(|d| *d.path == sine)
            .map(|d| (d.round, d.hits, d.total_hits))
            .collect();
        assert_eq!(rows, vec![(0, 2, 2), (1, 1, 1), (2, 0, 0), (3, 3, 3)]);

        let mut details = round_details(&result, Granularity::Class);
        assert_eq!(details.by_ref().count(), 8);
        assert!(details.next().is_none());
    }

    #[rstest]
    fn test_round_stream_file_has_one_row_per_path_and_round() {
        let dir = tempfile::tempdir().unwrap();
        let result = result_with(&[
            RoundCounts::from_iter([(TaxonomyPath::name("SINE", "Alu", "AluY"), 1)]),
            RoundCounts::from_iter([(TaxonomyPath::name("LINE", "L1", "L1PA2"), 1)]),
            RoundCounts::default(),
        ]);
        write_reports(&result, dir.path().join("run")).unwrap();
        let text = std::fs::read_to_string(dir.path().join("run.name.rounds.tsv")).unwrap();
        // header plus 2 names over rounds 0..=2
        assert_eq!(text.lines().count(), 1 + 2 * 3);
        assert!(text.lines().any(|l| l == "2\tLINE\tL1\tL1PA2\t0\t4\t4\t0"));
    }

    #[rstest]
    fn test_observed_only_writes_no_stats() {
        let dir = tempfile::tempdir().unwrap();
        let result = result_with(&[RoundCounts::default()]);
        let written = write_reports(&result, dir.path().join("run")).unwrap();
        assert_eq!(written.len(), 5);
        assert!(!dir.path().join("run.stats.tsv").exists());
        assert!(dir.path().join("run.age1.rounds.tsv").exists());
    }
}
