mod enrich;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};

pub mod consts {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
    pub const PKG_NAME: &str = "teenrich";
    pub const BIN_NAME: &str = "teenrich";
}

fn build_parser() -> Command {
    Command::new(consts::BIN_NAME)
        .bin_name(consts::BIN_NAME)
        .version(consts::VERSION)
        .about("Shuffle-based enrichment testing of transposable element overlaps with genomic features.")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true)
                .help("Increase log verbosity (-v info, -vv debug, -vvv trace)"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .global(true)
                .conflicts_with("verbose")
                .help("Silence all log output"),
        )
        .arg(
            Arg::new("timestamp")
                .short('X')
                .long("timestamp")
                .value_parser(value_parser!(stderrlog::Timestamp))
                .value_name("GRANULARITY")
                .default_value("none")
                .global(true)
                .help("Prepend log entries with a timestamp"),
        )
        .subcommand(enrich::cli::create_enrich_cli())
}

/// Warnings are always shown unless `--quiet`; each `-v` adds a level.
fn init_log(matches: &ArgMatches) -> Result<()> {
    let verbosity = 1 + matches.get_count("verbose") as usize;
    let timestamp = matches
        .get_one::<stderrlog::Timestamp>("timestamp")
        .cloned()
        .unwrap_or(stderrlog::Timestamp::Off);

    stderrlog::new()
        .module(module_path!())
        .module("teenrich_core")
        .module("teenrich_bootstrap")
        .quiet(matches.get_flag("quiet"))
        .verbosity(verbosity)
        .timestamp(timestamp)
        .init()
        .context("Failed to initialize logging")
}

fn main() -> Result<()> {
    let app = build_parser();
    let matches = app.get_matches();
    init_log(&matches)?;

    match matches.subcommand() {
        //
        // ENRICHMENT
        //
        Some((enrich::cli::ENRICH_CMD, matches)) => {
            enrich::handlers::run_enrich(matches)?;
        }

        _ => unreachable!("Subcommand not found"),
    };

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_is_valid() {
        build_parser().debug_assert();
    }
}
