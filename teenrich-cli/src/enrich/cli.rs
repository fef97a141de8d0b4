use std::path::PathBuf;

use clap::{Arg, ArgAction, Command, value_parser};

pub const ENRICH_CMD: &str = "enrich";

pub fn create_enrich_cli() -> Command {
    Command::new(ENRICH_CMD)
        .about("Test genomic features for enrichment or depletion of repeat overlaps")
        .arg_required_else_help(true)
        .arg(
            Arg::new("features")
                .short('f')
                .long("features")
                .value_parser(value_parser!(PathBuf))
                .value_name("BED")
                .required(true)
                .help("Non-overlapping reference features, e.g. peaks (optionally gzipped)"),
        )
        .arg(
            Arg::new("repeats")
                .short('r')
                .long("repeats")
                .value_parser(value_parser!(PathBuf))
                .value_name("RM_OUT")
                .required(true)
                .help("RepeatMasker .out annotation (optionally gzipped)"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_parser(value_parser!(PathBuf))
                .value_name("PREFIX")
                .required(true)
                .help("Prefix of the report files"),
        )
        .arg(
            Arg::new("strategy")
                .short('s')
                .long("strategy")
                .value_parser(["rand", "pool", "tss"])
                .value_name("STRATEGY")
                .help("Shuffle strategy: free placement, position pool or TSS distance"),
        )
        .arg(
            Arg::new("rounds")
                .short('n')
                .long("rounds")
                .value_parser(value_parser!(u32))
                .value_name("N")
                .help("Number of bootstrap rounds; 0 reports observed counts only"),
        )
        .arg(
            Arg::new("min_overlap")
                .short('m')
                .long("min-overlap")
                .value_parser(value_parser!(u32).range(1..))
                .value_name("BP")
                .help("Minimum overlap in bp for a repeat to hit a feature [default: 10]"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_parser(value_parser!(u64))
                .value_name("SEED")
                .help("Base random seed; drawn at random and logged when omitted"),
        )
        .arg(
            Arg::new("genome")
                .short('g')
                .long("genome")
                .value_parser(value_parser!(PathBuf))
                .value_name("CHROM_SIZES")
                .help("Chromosome length table, required by the rand strategy"),
        )
        .arg(
            Arg::new("age")
                .short('a')
                .long("age")
                .value_parser(value_parser!(PathBuf))
                .value_name("TSV")
                .help("Age categories per repeat name: name, scheme 1, scheme 2"),
        )
        .arg(
            Arg::new("exclude")
                .short('x')
                .long("exclude")
                .value_parser(value_parser!(PathBuf))
                .value_name("BED")
                .help("Regions shuffled repeats must avoid, required by the rand strategy"),
        )
        .arg(
            Arg::new("include")
                .short('i')
                .long("include")
                .value_parser(value_parser!(PathBuf))
                .value_name("BED")
                .help("Regions shuffled repeats must lie in (rand strategy)"),
        )
        .arg(
            Arg::new("tss")
                .short('t')
                .long("tss")
                .value_parser(value_parser!(PathBuf))
                .value_name("BED_OR_GTF")
                .help("Transcription start sites, required by the tss strategy"),
        )
        .arg(
            Arg::new("filter")
                .long("filter")
                .value_name("FIELD=VALUE")
                .help("Only test repeats whose name, class or family matches, e.g. class=DNA"),
        )
        .arg(
            Arg::new("filter_mode")
                .long("filter-mode")
                .value_parser(["exact", "contains"])
                .value_name("MODE")
                .help("Match the filter value exactly or as a substring [default: exact]"),
        )
        .arg(
            Arg::new("length_policy")
                .long("length-policy")
                .value_parser(["replacement", "element"])
                .value_name("POLICY")
                .help("Length of pool placements: the replacement's or the element's own"),
        )
        .arg(
            Arg::new("no_overlap")
                .long("no-overlap")
                .action(ArgAction::SetTrue)
                .help("Forbid shuffled repeats from overlapping each other (rand strategy)"),
        )
        .arg(
            Arg::new("parallel")
                .short('p')
                .long("parallel")
                .action(ArgAction::SetTrue)
                .help("Run bootstrap rounds on all cores"),
        )
        .arg(
            Arg::new("progress")
                .long("progress")
                .action(ArgAction::SetTrue)
                .help("Show a progress bar over the bootstrap rounds"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_parser(value_parser!(PathBuf))
                .value_name("TOML")
                .help("Run configuration file; command line options take precedence"),
        )
}
