//! Exact binomial test backed by `statrs`.

use statrs::distribution::{Beta, Binomial, ContinuousCDF, Discrete, DiscreteCDF};

/// Tolerance used when comparing point probabilities to the observed one.
const REL_ERR: f64 = 1.0 + 1e-7;

/// Coverage of the reported confidence interval.
pub const CONFIDENCE_LEVEL: f64 = 0.95;

/// Result of an exact binomial test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinomialTest {
    /// Observed success fraction `x / n`.
    pub estimate: f64,
    pub ci_low: f64,
    pub ci_high: f64,
    /// Two-sided p-value.
    pub pvalue: f64,
}

/// Source of the binomial test used by the statistics engine.
pub trait StatisticsProvider: Send + Sync {
    /// Test `x` successes out of `n` trials against success probability `p`.
    /// `None` when the test can't be computed for these arguments.
    fn binomial_test(&self, x: u64, n: u64, p: f64) -> Option<BinomialTest>;
}

///
/// Two-sided exact binomial test with a Clopper-Pearson interval.
///
/// Outcomes at most as likely as the observed one count as at least as
/// extreme. Point probabilities are unimodal in `k`, so each tail is located
/// by binary search instead of a scan over all `n + 1` outcomes.
///
#[derive(Debug, Clone, Copy, Default)]
pub struct StatrsProvider;

impl StatrsProvider {
    fn pvalue(dist: &Binomial, x: u64, n: u64, p: f64) -> f64 {
        if p == 0.0 {
            return if x == 0 { 1.0 } else { 0.0 };
        }
        if p == 1.0 {
            return if x == n { 1.0 } else { 0.0 };
        }

        let m = n as f64 * p;
        let x_f = x as f64;
        if x_f == m {
            return 1.0;
        }
        let d = dist.pmf(x) * REL_ERR;

        let pvalue = if x_f < m {
            // first k in the upper tail no more likely than x
            let lo = m.ceil() as u64;
            let k = lo + partition_point(lo, n + 1, |k| dist.pmf(k) > d);
            let upper = if k > n { 0.0 } else { dist.sf(k - 1) };
            dist.cdf(x) + upper
        } else {
            // first k in the lower tail more likely than x
            let hi = m.floor() as u64;
            let k = partition_point(0, hi + 1, |k| dist.pmf(k) <= d);
            let lower = if k == 0 { 0.0 } else { dist.cdf(k - 1) };
            lower + dist.sf(x - 1)
        };
        pvalue.min(1.0)
    }

    fn clopper_pearson(x: u64, n: u64) -> Option<(f64, f64)> {
        let alpha = 1.0 - CONFIDENCE_LEVEL;
        let (x_f, n_f) = (x as f64, n as f64);
        let low = if x == 0 {
            0.0
        } else {
            Beta::new(x_f, n_f - x_f + 1.0).ok()?.inverse_cdf(alpha / 2.0)
        };
        let high = if x == n {
            1.0
        } else {
            Beta::new(x_f + 1.0, n_f - x_f).ok()?.inverse_cdf(1.0 - alpha / 2.0)
        };
        Some((low, high))
    }
}

/// Number of leading values in `[start, end)` satisfying `pred`, which must
/// hold on a prefix of the range.
fn partition_point<F: Fn(u64) -> bool>(start: u64, end: u64, pred: F) -> u64 {
    let (mut lo, mut hi) = (start, end);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if pred(mid) {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo - start
}

impl StatisticsProvider for StatrsProvider {
    fn binomial_test(&self, x: u64, n: u64, p: f64) -> Option<BinomialTest> {
        if n == 0 || x > n || !(0.0..=1.0).contains(&p) {
            return None;
        }
        let dist = Binomial::new(p, n).ok()?;
        let (ci_low, ci_high) = Self::clopper_pearson(x, n)?;
        Some(BinomialTest {
            estimate: x as f64 / n as f64,
            ci_low,
            ci_high,
            pvalue: Self::pvalue(&dist, x, n, p),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[rstest]
    #[case(3, 10, 0.5, 0.34375)]
    #[case(9, 10, 0.5, 0.021484375)]
    #[case(5, 10, 0.5, 1.0)]
    #[case(0, 10, 0.0, 1.0)]
    #[case(1, 10, 0.0, 0.0)]
    #[case(10, 10, 1.0, 1.0)]
    fn test_pvalue(#[case] x: u64, #[case] n: u64, #[case] p: f64, #[case] expected: f64) {
        let test = StatrsProvider.binomial_test(x, n, p).unwrap();
        assert!(close(test.pvalue, expected, 1e-9), "got {}", test.pvalue);
    }

    #[rstest]
    fn test_asymmetric_tails() {
        // P(X = 0) = 0.9^10; in the upper tail k >= 2 are no more likely
        let test = StatrsProvider.binomial_test(0, 10, 0.1).unwrap();
        let dist = Binomial::new(0.1, 10).unwrap();
        let expected = dist.pmf(0) + dist.sf(1);
        assert!(close(test.pvalue, expected, 1e-12), "got {}", test.pvalue);
    }

    #[rstest]
    fn test_clopper_pearson_interval() {
        let test = StatrsProvider.binomial_test(3, 10, 0.5).unwrap();
        assert!(close(test.estimate, 0.3, 1e-12));
        assert!(close(test.ci_low, 0.06673951, 1e-4), "got {}", test.ci_low);
        assert!(close(test.ci_high, 0.65245285, 1e-4), "got {}", test.ci_high);
    }

    #[rstest]
    fn test_interval_edges() {
        let none = StatrsProvider.binomial_test(0, 10, 0.2).unwrap();
        assert_eq!(none.ci_low, 0.0);
        let all = StatrsProvider.binomial_test(10, 10, 0.2).unwrap();
        assert_eq!(all.ci_high, 1.0);
    }

    #[rstest]
    #[case(1, 0, 0.5)]
    #[case(11, 10, 0.5)]
    #[case(1, 10, 1.5)]
    fn test_unavailable(#[case] x: u64, #[case] n: u64, #[case] p: f64) {
        assert!(StatrsProvider.binomial_test(x, n, p).is_none());
    }
}
