//! Genome-wide interval indexing for multi-chromosome overlap queries.
//!
//! [`ChromIndex`] keeps one [`Bits`] index per chromosome.
//!
//! # Examples
//!
//! ```
//! use teenrich_overlaprs::chrom_index::ChromIndex;
//! use teenrich_core::models::{FeatureSet, Region};
//!
//! let peaks = FeatureSet::from(vec![
//!     Region::new("chr1", 100, 200),
//!     Region::new("chr2", 300, 400),
//! ]);
//! let index = ChromIndex::from_features(&peaks);
//!
//! let hits: Vec<usize> = index.find_iter("chr1", 150, 250).map(|iv| iv.val).collect();
//! assert_eq!(hits, vec![0]);
//! ```

use std::collections::HashMap;

use teenrich_core::models::{FeatureSet, Interval, Region};

use crate::{Bits, Overlapper};

/// One [`Bits`] index per chromosome.
#[derive(Debug, Clone)]
pub struct ChromIndex<T>
where
    T: Eq + Clone + Send + Sync,
{
    index_maps: HashMap<String, Bits<u32, T>>,
}

impl<T> ChromIndex<T>
where
    T: Eq + Clone + Send + Sync,
{
    /// Build from `(chromosome, interval)` pairs in any order.
    pub fn build<It>(intervals: It) -> Self
    where
        It: IntoIterator<Item = (String, Interval<u32, T>)>,
    {
        let mut by_chr: HashMap<String, Vec<Interval<u32, T>>> = HashMap::new();
        for (chr, interval) in intervals {
            by_chr.entry(chr).or_default().push(interval);
        }
        let index_maps = by_chr
            .into_iter()
            .map(|(chr, ivs)| (chr, Bits::build(ivs)))
            .collect();
        ChromIndex { index_maps }
    }

    /// Intervals on `chr` overlapping `[start, end)`; empty for unknown chromosomes.
    pub fn find_iter<'a>(
        &'a self,
        chr: &str,
        start: u32,
        end: u32,
    ) -> Box<dyn Iterator<Item = &'a Interval<u32, T>> + 'a> {
        match self.index_maps.get(chr) {
            Some(bits) => bits.find_iter(start, end),
            None => Box::new(std::iter::empty()),
        }
    }

    /// Bases of `[start, end)` on `chr` covered by the index.
    pub fn covered_len(&self, chr: &str, start: u32, end: u32) -> u32 {
        self.index_maps
            .get(chr)
            .map(|bits| bits.covered_len(start, end))
            .unwrap_or(0)
    }

    /// All intervals on `chr`, sorted by start.
    pub fn chr_intervals(&self, chr: &str) -> &[Interval<u32, T>] {
        self.index_maps
            .get(chr)
            .map(|bits| bits.intervals.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.index_maps.values().map(|b| b.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ChromIndex<usize> {
    /// Index reference features; the payload is the feature id.
    pub fn from_features(features: &FeatureSet) -> Self {
        ChromIndex::build(features.iter().map(|f| {
            (
                f.region.chr.clone(),
                Interval {
                    start: f.region.start,
                    end: f.region.end,
                    val: f.id,
                },
            )
        }))
    }
}

impl ChromIndex<()> {
    ///
    /// Index plain regions after merging overlapping and touching ones, so that
    /// [`ChromIndex::covered_len`] never counts a base twice.
    ///
    pub fn from_regions_merged(regions: &[Region]) -> Self {
        let mut sorted: Vec<&Region> = regions.iter().collect();
        sorted.sort_by(|a, b| a.chr.cmp(&b.chr).then_with(|| a.start.cmp(&b.start)));

        let mut merged: Vec<(String, Interval<u32, ()>)> = Vec::new();
        for region in sorted {
            if let Some((chr, last)) = merged.last_mut() {
                if *chr == region.chr && region.start <= last.end {
                    last.end = last.end.max(region.end);
                    continue;
                }
            }
            merged.push((
                region.chr.clone(),
                Interval {
                    start: region.start,
                    end: region.end,
                    val: (),
                },
            ));
        }
        ChromIndex::build(merged)
    }
}
