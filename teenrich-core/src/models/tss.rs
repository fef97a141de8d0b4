use std::collections::HashMap;

use crate::models::{Region, RepeatElement, Strand};

/// A transcription start site.
#[derive(Eq, PartialEq, Hash, Debug, Clone)]
pub struct Tss {
    pub chr: String,
    pub pos: u32,
    pub strand: Strand,
}

impl Tss {
    ///
    /// Signed distance of `region` from this TSS in transcription direction.
    ///
    /// For `+` (and unstranded) sites this is `region.start - pos`; for `-` sites
    /// it is `pos - region.end`, so negative values are always upstream.
    ///
    pub fn signed_distance(&self, region: &Region) -> i64 {
        match self.strand {
            Strand::Minus => self.pos as i64 - region.end as i64,
            _ => region.start as i64 - self.pos as i64,
        }
    }

    ///
    /// Inverse of [`Tss::signed_distance`]: the start of a `width` long interval
    /// placed `distance` away from this site. May be negative.
    ///
    pub fn start_at_distance(&self, distance: i64, width: u32) -> i64 {
        match self.strand {
            Strand::Minus => self.pos as i64 - distance - width as i64,
            _ => self.pos as i64 + distance,
        }
    }

    /// Unsigned gap between the site and the region; 0 if the site lies inside.
    fn gap(&self, region: &Region) -> u32 {
        if self.pos < region.start {
            region.start - self.pos
        } else if self.pos >= region.end {
            self.pos - region.end + 1
        } else {
            0
        }
    }
}

///
/// TSS grouped per chromosome and sorted by position.
///
#[derive(Debug, Clone, Default)]
pub struct TssIndex {
    by_chr: HashMap<String, Vec<Tss>>,
}

impl From<Vec<Tss>> for TssIndex {
    fn from(sites: Vec<Tss>) -> Self {
        let mut by_chr: HashMap<String, Vec<Tss>> = HashMap::new();
        for tss in sites {
            by_chr.entry(tss.chr.clone()).or_default().push(tss);
        }
        for sites in by_chr.values_mut() {
            sites.sort_by_key(|t| t.pos);
            sites.dedup();
        }
        TssIndex { by_chr }
    }
}

impl TssIndex {
    pub fn len(&self) -> usize {
        self.by_chr.values().map(|v| v.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn chr_sites(&self, chr: &str) -> &[Tss] {
        self.by_chr.get(chr).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// The TSS closest to `region` on its chromosome.
    pub fn closest(&self, region: &Region) -> Option<&Tss> {
        let sites = self.by_chr.get(&region.chr)?;
        let idx = sites.partition_point(|t| t.pos < region.start);
        let before = idx.checked_sub(1).and_then(|i| sites.get(i));
        let after = sites.get(idx);
        match (before, after) {
            (Some(b), Some(a)) => {
                if a.gap(region) < b.gap(region) {
                    Some(a)
                } else {
                    Some(b)
                }
            }
            (Some(b), None) => Some(b),
            (None, a) => a,
        }
    }

    ///
    /// Store on every element its signed distance to the closest TSS. Elements on
    /// chromosomes without TSS keep `None`.
    ///
    pub fn annotate(&self, elements: &mut [RepeatElement]) {
        for element in elements.iter_mut() {
            element.tss_distance = self
                .closest(&element.region)
                .map(|tss| tss.signed_distance(&element.region));
        }
    }
}
