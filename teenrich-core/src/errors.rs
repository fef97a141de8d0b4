use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Error parsing {kind} line {line} in {path}: {reason}")]
    ParseError {
        kind: &'static str,
        path: String,
        line: usize,
        reason: String,
    },

    #[error("Corrupted file. 0 records found in the file: {0}")]
    EmptyFile(String),

    #[error("Reference features overlap: {0} and {1}")]
    OverlappingFeatures(String, String),

    #[error("Invalid interval {chr}:{start}-{end}: {reason}")]
    InvalidInterval {
        chr: String,
        start: u32,
        end: u32,
        reason: String,
    },

    #[error("Invalid repeat filter '{0}', expected <name|class|family>=<value>")]
    InvalidFilter(String),
}
