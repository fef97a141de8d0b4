use num_traits::{PrimInt, Unsigned, identities::zero};

use super::Overlapper;
use teenrich_core::models::Interval;

/// A Binary Interval Search index for overlap queries on one chromosome.
///
/// From the journal article: <https://academic.oup.com/bioinformatics/article/29/1/1/273289>
///
/// Intervals are kept sorted by start. A query binary-searches the first
/// interval that could reach the query (start at least `query.start - max_len`)
/// and scans forward until intervals start past the query end.
///
/// # Examples
///
/// ```
/// use teenrich_overlaprs::{Bits, Overlapper, Interval};
///
/// let peaks = vec![
///     Interval { start: 100u32, end: 150, val: 0usize },
///     Interval { start: 200, end: 250, val: 1 },
///     Interval { start: 225, end: 275, val: 2 },
/// ];
///
/// let bits = Bits::build(peaks);
/// assert_eq!(bits.find_iter(210, 240).count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Bits<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    /// List of intervals, sorted by (start, end)
    pub intervals: Vec<Interval<I, T>>,
    /// The length of the longest interval
    max_len: I,
}

impl<I, T> Overlapper<I, T> for Bits<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    fn build(mut intervals: Vec<Interval<I, T>>) -> Self
    where
        Self: Sized,
    {
        intervals.sort();
        let max_len = intervals
            .iter()
            .map(|iv| iv.end.checked_sub(&iv.start).unwrap_or_else(zero::<I>))
            .max()
            .unwrap_or_else(zero::<I>);
        Bits { intervals, max_len }
    }

    fn find_iter<'a>(
        &'a self,
        start: I,
        stop: I,
    ) -> Box<dyn Iterator<Item = &'a Interval<I, T>> + 'a> {
        Box::new(IterFind {
            inner: self,
            off: self.lower_bound(start.checked_sub(&self.max_len).unwrap_or_else(zero::<I>)),
            start,
            stop,
        })
    }
}

impl<I, T> Bits<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    /// Get the number of intervals in Bits
    #[inline]
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// First index whose interval start is not below `start`.
    #[inline]
    fn lower_bound(&self, start: I) -> usize {
        self.intervals.partition_point(|iv| iv.start < start)
    }
}

/// Iterator over the intervals of a [`Bits`] overlapping one query.
#[derive(Debug)]
pub struct IterFind<'a, I, T>
where
    T: Eq + Clone + Send + Sync + 'a,
    I: PrimInt + Unsigned + Send + Sync,
{
    inner: &'a Bits<I, T>,
    off: usize,
    start: I,
    stop: I,
}

impl<'a, I, T> Iterator for IterFind<'a, I, T>
where
    T: Eq + Clone + Send + Sync + 'a,
    I: PrimInt + Unsigned + Send + Sync,
{
    type Item = &'a Interval<I, T>;

    #[inline]
    // interval.start < stop && interval.end > start
    fn next(&mut self) -> Option<Self::Item> {
        while self.off < self.inner.intervals.len() {
            let interval = &self.inner.intervals[self.off];
            self.off += 1;
            if interval.overlap(self.start, self.stop) {
                return Some(interval);
            } else if interval.start >= self.stop {
                break;
            }
        }
        None
    }
}
