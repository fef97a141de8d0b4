use num_traits::{PrimInt, Unsigned};

pub use teenrich_core::models::Interval;

/// A static index answering "which intervals overlap `[start, end)`".
pub trait Overlapper<I, T>: Send + Sync
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    fn build(intervals: Vec<Interval<I, T>>) -> Self
    where
        Self: Sized;

    fn find_iter<'a>(
        &'a self,
        start: I,
        end: I,
    ) -> Box<dyn Iterator<Item = &'a Interval<I, T>> + 'a>;

    /// Sum of the overlaps of `[start, end)` with every indexed interval. Equals
    /// the covered length when the indexed intervals are disjoint.
    fn covered_len(&self, start: I, end: I) -> I {
        self.find_iter(start, end)
            .fold(I::zero(), |acc, iv| acc + iv.overlap_len(start, end))
    }
}
