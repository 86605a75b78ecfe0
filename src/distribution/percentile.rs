// Percentile lookup on a sorted histogram

use super::histogram::OutcomeHistogram;

/// Smallest value whose cumulative count reaches `q * total`
///
/// Walks bins in ascending value order. Falls back to the last value when the
/// running total never reaches the target (q > 1 or rounding at q = 1).
/// Returns `None` for an empty or all-zero histogram.
///
/// # Example
/// ```
/// use gacha_audit::distribution::{percentile, OutcomeHistogram};
///
/// let h = OutcomeHistogram::from_pairs([(1, 50), (2, 40), (10, 10)]);
/// assert_eq!(percentile(&h, 0.5), Some(1));
/// assert_eq!(percentile(&h, 0.9), Some(2));
/// assert_eq!(percentile(&h, 0.99), Some(10));
/// ```
pub fn percentile(histogram: &OutcomeHistogram, q: f64) -> Option<u64> {
    let total = histogram.total();
    if total == 0 {
        return None;
    }

    let target = q * total as f64;
    let mut cumulative = 0u64;
    for &(value, count) in histogram.bins() {
        cumulative = cumulative.saturating_add(count);
        if cumulative as f64 >= target {
            return Some(value);
        }
    }

    histogram.bins().last().map(|&(v, _)| v)
}
