use num_traits::{PrimInt, Unsigned, identities::zero};
use std::cmp::Ordering;

/// Represent a range from [start, end) carrying a payload.
/// Inclusive start, exclusive of end.
#[derive(Eq, Debug, Clone)]
pub struct Interval<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    pub start: I,
    pub end: I,
    pub val: T,
}

impl<I, T> Interval<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    /// Number of positions shared with `[start, end)`.
    #[inline]
    pub fn overlap_len(&self, start: I, end: I) -> I {
        std::cmp::min(self.end, end)
            .checked_sub(&std::cmp::max(self.start, start))
            .unwrap_or_else(zero::<I>)
    }

    /// Check if the interval overlaps `[start, end)`
    #[inline]
    pub fn overlap(&self, start: I, end: I) -> bool {
        self.start < end && self.end > start
    }
}

impl<I, T> Ord for Interval<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    #[inline]
    fn cmp(&self, other: &Interval<I, T>) -> Ordering {
        self.start
            .cmp(&other.start)
            .then_with(|| self.end.cmp(&other.end))
    }
}

impl<I, T> PartialOrd for Interval<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<I, T> PartialEq for Interval<I, T>
where
    I: PrimInt + Unsigned + Send + Sync,
    T: Eq + Clone + Send + Sync,
{
    #[inline]
    fn eq(&self, other: &Interval<I, T>) -> bool {
        self.start == other.start && self.end == other.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    #[case(100, 200, 10)]
    #[case(150, 160, 5)]
    #[case(195, 300, 0)]
    #[case(0, 146, 1)]
    fn test_overlap_len(#[case] start: u32, #[case] end: u32, #[case] expected: u32) {
        let iv = Interval {
            start: 145u32,
            end: 155,
            val: (),
        };
        assert_eq!(iv.overlap_len(start, end), expected);
    }

    #[rstest]
    fn test_half_open_boundaries() {
        let iv = Interval {
            start: 10u32,
            end: 20,
            val: (),
        };
        assert!(!iv.overlap(20, 30));
        assert!(!iv.overlap(0, 10));
        assert!(iv.overlap(19, 30));
        assert_eq!(iv.overlap_len(0, 10), 0);
    }
}
