use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnrichError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("No shuffle strategy selected, expected one of: rand, pool, tss")]
    MissingStrategy,

    #[error("Unknown shuffle strategy '{0}', expected one of: rand, pool, tss")]
    UnknownStrategy(String),

    #[error("The {strategy} strategy requires {input}")]
    MissingInput {
        strategy: &'static str,
        input: &'static str,
    },

    #[error("No reference features to test against")]
    EmptyReference,

    #[error("No repeat elements to shuffle")]
    EmptyRepeats,

    #[error("No repeat elements match the filter {0}")]
    EmptyFilteredRepeats(String),

    #[error("Round {0} was already folded into the aggregator")]
    DuplicateRound(u32),

    #[error("Round {round} is out of range, expected 0..={max}")]
    RoundOutOfRange { round: u32, max: u32 },

    #[error("Aggregators with {0} and {1} rounds can't be merged")]
    RoundCountMismatch(u32, u32),

    #[error("Interval backend failed in round {round} after {attempts} attempt(s): {reason}")]
    Backend {
        round: u32,
        attempts: u32,
        reason: String,
    },

    #[error("Failed to {phase} {path}: {source}")]
    Io {
        phase: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },
}
