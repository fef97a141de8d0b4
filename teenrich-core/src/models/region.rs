use std::collections::HashMap;
use std::fmt::{self, Display};
use std::str::FromStr;

use crate::errors::CoreError;

/// Strand of a genomic interval.
#[derive(Eq, PartialEq, Hash, Debug, Clone, Copy, Default)]
pub enum Strand {
    Plus,
    Minus,
    #[default]
    Unstranded,
}

impl FromStr for Strand {
    type Err = CoreError;

    /// Accepts BED (`+`, `-`, `.`) and RepeatMasker (`C` for complement) notation.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Strand::Plus),
            "-" | "C" => Ok(Strand::Minus),
            "." | "" => Ok(Strand::Unstranded),
            other => Err(CoreError::ParseError {
                kind: "strand",
                path: String::new(),
                line: 0,
                reason: format!("unknown strand '{}'", other),
            }),
        }
    }
}

impl Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Strand::Plus => "+",
            Strand::Minus => "-",
            Strand::Unstranded => ".",
        };
        write!(f, "{}", s)
    }
}

///
/// A genomic interval: half-open, 0-based `[start, end)`.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone)]
pub struct Region {
    pub chr: String,
    pub start: u32,
    pub end: u32,
    pub strand: Strand,
}

impl Region {
    pub fn new(chr: &str, start: u32, end: u32) -> Self {
        Region {
            chr: chr.to_string(),
            start,
            end,
            strand: Strand::Unstranded,
        }
    }

    ///
    /// Get length of the region
    ///
    pub fn width(&self) -> u32 {
        self.end - self.start
    }

    /// Number of bases shared with `other`; 0 on different chromosomes.
    pub fn overlap_len(&self, other: &Region) -> u32 {
        if self.chr != other.chr {
            return 0;
        }
        self.end
            .min(other.end)
            .saturating_sub(self.start.max(other.start))
    }

    /// Check `start <= end` and, when a length table is given, `end <= chromosome length`.
    pub fn validate(&self, chrom_sizes: Option<&HashMap<String, u32>>) -> Result<(), CoreError> {
        if self.start > self.end {
            return Err(self.invalid("start is after end"));
        }
        match chrom_sizes.and_then(|cs| cs.get(&self.chr)) {
            Some(size) if self.end > *size => {
                Err(self.invalid(&format!("end is past chromosome length {}", size)))
            }
            _ => Ok(()),
        }
    }

    fn invalid(&self, reason: &str) -> CoreError {
        CoreError::InvalidInterval {
            chr: self.chr.clone(),
            start: self.start,
            end: self.end,
            reason: reason.to_string(),
        }
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chr, self.start, self.end)
    }
}
