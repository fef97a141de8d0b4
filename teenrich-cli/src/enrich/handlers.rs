use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ArgMatches;
use log::info;

use teenrich_bootstrap::report::write_reports;
use teenrich_bootstrap::{EnrichmentRun, LengthPolicy, RunConfig, StrategyInputs, StrategyKind};
use teenrich_core::models::{FeatureSet, MatchMode, RepeatFilter};
use teenrich_core::readers::{AgeTable, read_repeatmasker, read_tss};
use teenrich_core::utils::{get_chrom_sizes, read_regions};

/// Merge the optional config file with the command line; flags win.
fn build_config(matches: &ArgMatches) -> Result<RunConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => RunConfig::from_toml_file(path)?,
        None => RunConfig::default(),
    };

    if let Some(strategy) = matches.get_one::<String>("strategy") {
        config.strategy = Some(strategy.parse::<StrategyKind>()?);
    }
    if let Some(rounds) = matches.get_one::<u32>("rounds") {
        config.rounds = *rounds;
    }
    if let Some(min_overlap) = matches.get_one::<u32>("min_overlap") {
        config.min_overlap = *min_overlap;
    }
    if let Some(seed) = matches.get_one::<u64>("seed") {
        config.seed = Some(*seed);
    }
    if let Some(filter) = matches.get_one::<String>("filter") {
        config.filter = Some(filter.parse::<RepeatFilter>()?);
    }
    if let Some(mode) = matches.get_one::<String>("filter_mode") {
        let mode = match mode.as_str() {
            "contains" => MatchMode::Contains,
            _ => MatchMode::Exact,
        };
        config.filter = config.filter.map(|f| f.with_mode(mode));
    }
    if let Some(policy) = matches.get_one::<String>("length_policy") {
        config.length_policy = match policy.as_str() {
            "element" => LengthPolicy::Element,
            _ => LengthPolicy::Replacement,
        };
    }
    config.no_overlap |= matches.get_flag("no_overlap");
    config.parallel |= matches.get_flag("parallel");
    config.progress |= matches.get_flag("progress");

    Ok(config)
}

fn optional_path<'a>(matches: &'a ArgMatches, id: &str) -> Option<&'a Path> {
    matches.get_one::<PathBuf>(id).map(|p| p.as_path())
}

fn load_inputs(matches: &ArgMatches) -> Result<StrategyInputs> {
    let chrom_sizes = optional_path(matches, "genome")
        .map(|path| {
            get_chrom_sizes(path).with_context(|| format!("Failed to load chromosome sizes {}", path.display()))
        })
        .transpose()?;
    let exclude = optional_path(matches, "exclude")
        .map(|path| read_regions(path).with_context(|| format!("Failed to load exclusions {}", path.display())))
        .transpose()?;
    let include = optional_path(matches, "include")
        .map(|path| read_regions(path).with_context(|| format!("Failed to load inclusions {}", path.display())))
        .transpose()?;
    let tss = optional_path(matches, "tss")
        .map(|path| read_tss(path).with_context(|| format!("Failed to load TSS {}", path.display())))
        .transpose()?;

    Ok(StrategyInputs {
        chrom_sizes,
        exclude,
        include,
        tss,
    })
}

pub fn run_enrich(matches: &ArgMatches) -> Result<()> {
    let features_path = matches
        .get_one::<PathBuf>("features")
        .context("A path to a reference feature file is required.")?;
    let repeats_path = matches
        .get_one::<PathBuf>("repeats")
        .context("A path to a RepeatMasker file is required.")?;
    let output = matches
        .get_one::<PathBuf>("output")
        .context("An output prefix is required.")?;

    let config = build_config(matches)?;
    config.validate()?;

    let features = FeatureSet::try_from(features_path.as_path())
        .with_context(|| format!("Failed to load reference features {}", features_path.display()))?;
    info!("Loaded {} reference features", features.len());

    let mut repeats = read_repeatmasker(repeats_path)
        .with_context(|| format!("Failed to load repeats {}", repeats_path.display()))?;
    info!("Loaded {} repeat fragments", repeats.len());

    if let Some(path) = optional_path(matches, "age") {
        let ages = AgeTable::try_from(path).with_context(|| format!("Failed to load age table {}", path.display()))?;
        let labelled = ages.apply(&mut repeats);
        info!("Age categories assigned to {} of {} fragments", labelled, repeats.len());
    }

    let inputs = load_inputs(matches)?;
    let run = EnrichmentRun::new(config, &features, repeats, inputs)?;
    let result = run.run()?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
    }
    let written = write_reports(&result, output)?;
    for path in &written {
        info!("Wrote {}", path.display());
    }
    info!("Done (seed {})", result.seed);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::cli::create_enrich_cli;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn data(file_name: &str) -> String {
        format!("{}/../tests/data/{}", env!("CARGO_MANIFEST_DIR"), file_name)
    }

    #[rstest]
    fn test_flags_override_defaults() {
        let matches = create_enrich_cli().get_matches_from([
            "enrich", "-f", "peaks.bed", "-r", "rm.out", "-o", "out", "-s", "pool", "-n", "50",
            "--filter", "family=ERV", "--filter-mode", "contains", "--length-policy", "element",
        ]);
        let config = build_config(&matches).unwrap();
        assert_eq!(config.strategy, Some(StrategyKind::Pool));
        assert_eq!(config.rounds, 50);
        assert_eq!(config.min_overlap, 10);
        assert_eq!(config.filter.unwrap().mode, MatchMode::Contains);
        assert_eq!(config.length_policy, LengthPolicy::Element);
    }

    fn args(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| p.to_string()).collect()
    }

    #[rstest]
    fn test_run_writes_reports() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("nested").join("peaks");
        let matches = create_enrich_cli().get_matches_from(args(&[
            "enrich",
            "-f",
            &data("peaks.bed"),
            "-r",
            &data("repeats.out"),
            "-a",
            &data("ages.tsv"),
            "-o",
            &prefix.display().to_string(),
            "-s",
            "pool",
            "-n",
            "5",
            "--seed",
            "1",
        ]));
        run_enrich(&matches).unwrap();
        assert!(dir.path().join("nested/peaks.stats.tsv").exists());
        assert!(dir.path().join("nested/peaks.age2.rounds.tsv").exists());
    }

    #[rstest]
    fn test_missing_tss_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let matches = create_enrich_cli().get_matches_from(args(&[
            "enrich",
            "-f",
            &data("peaks.bed"),
            "-r",
            &data("repeats.out"),
            "-o",
            &dir.path().join("out").display().to_string(),
            "-s",
            "tss",
        ]));
        assert!(run_enrich(&matches).is_err());
    }
}
