// Percent-series transforms over an aligned domain

/// Counts as percent of their own total; a zero total gives all zeros
pub fn normalize(counts: &[u64]) -> Vec<f64> {
    let total: f64 = counts.iter().map(|&c| c as f64).sum();
    if total <= 0.0 {
        return vec![0.0; counts.len()];
    }
    counts.iter().map(|&c| c as f64 / total * 100.0).collect()
}

/// `tail[i] = sum of prob[j] for j >= i`, accumulated from the high end
///
/// # Example
/// ```
/// use gacha_audit::distribution::tail_transform;
///
/// assert_eq!(tail_transform(&[50.0, 30.0, 20.0]), vec![100.0, 50.0, 20.0]);
/// ```
pub fn tail_transform(prob: &[f64]) -> Vec<f64> {
    let mut tail = vec![0.0; prob.len()];
    let mut acc = 0.0;
    for (slot, &p) in tail.iter_mut().zip(prob).rev() {
        acc += p;
        *slot = acc;
    }
    tail
}

/// Inclusive index span where either series reaches `threshold`
///
/// Returns `None` when trimming is disabled (`threshold <= 0`), the series
/// are empty, or no index qualifies; callers keep the full range then.
pub fn trim_range(fair: &[f64], rigged: &[f64], threshold: f64) -> Option<(usize, usize)> {
    if threshold.is_nan() || threshold <= 0.0 {
        return None;
    }

    let qualifies = |i: usize| {
        let f = fair.get(i).copied().unwrap_or(0.0);
        let r = rigged.get(i).copied().unwrap_or(0.0);
        f.max(r) >= threshold
    };

    let len = fair.len().max(rigged.len());
    let start = (0..len).find(|&i| qualifies(i))?;
    let end = (0..len).rev().find(|&i| qualifies(i))?;
    Some((start, end))
}

/// Moment-matched normal density over `domain`, rescaled to sum to 100
///
/// Mean and variance are weighted by `prob_percent / 100`. A non-positive or
/// non-finite variance (all mass on one point, empty input) gives all zeros.
pub fn gaussian_overlay(domain: &[u64], prob_percent: &[f64]) -> Vec<f64> {
    let zeros = vec![0.0; domain.len()];

    let weights = || {
        domain
            .iter()
            .zip(prob_percent)
            .map(|(&x, &p)| (x as f64, p / 100.0))
    };
    let mean: f64 = weights().map(|(x, w)| x * w).sum();
    let variance: f64 = weights().map(|(x, w)| w * (x - mean).powi(2)).sum();

    if !variance.is_finite() || variance <= 0.0 {
        return zeros;
    }

    let sd = variance.sqrt();
    let norm = 1.0 / (sd * (2.0 * std::f64::consts::PI).sqrt());
    let density: Vec<f64> = domain
        .iter()
        .map(|&x| {
            let z = (x as f64 - mean) / sd;
            norm * (-0.5 * z * z).exp()
        })
        .collect();

    let sum: f64 = density.iter().sum();
    if !sum.is_finite() || sum <= 0.0 {
        return zeros;
    }
    density.iter().map(|d| d / sum * 100.0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        let p = normalize(&[1, 3, 0, 4]);
        assert_eq!(p, vec![12.5, 37.5, 0.0, 50.0]);
    }

    #[test]
    fn test_normalize_zero_total() {
        assert_eq!(normalize(&[0, 0, 0]), vec![0.0; 3]);
        assert!(normalize(&[]).is_empty());
    }

    #[test]
    fn test_tail_first_is_100_last_is_prob() {
        let prob = normalize(&[5, 9, 1, 7, 3]);
        let tail = tail_transform(&prob);
        assert!((tail[0] - 100.0).abs() < 1e-9);
        assert_eq!(tail[4], prob[4]);
        for w in tail.windows(2) {
            assert!(w[1] <= w[0]);
        }
    }

    #[test]
    fn test_trim_range() {
        let fair = [0.01, 0.5, 40.0, 0.02];
        let rigged = [0.0, 0.05, 30.0, 0.3];
        assert_eq!(trim_range(&fair, &rigged, 0.1), Some((1, 3)));
    }

    #[test]
    fn test_trim_disabled_or_nothing_qualifies() {
        let fair = [0.01, 0.02];
        assert_eq!(trim_range(&fair, &fair, 0.0), None);
        assert_eq!(trim_range(&fair, &fair, 5.0), None);
        assert_eq!(trim_range(&[], &[], 0.1), None);
    }

    #[test]
    fn test_gaussian_sums_to_100() {
        let domain = [1, 2, 3, 4, 5];
        let prob = normalize(&[1, 4, 6, 4, 1]);
        let g = gaussian_overlay(&domain, &prob);
        let sum: f64 = g.iter().sum();
        assert!((sum - 100.0).abs() < 1e-9);
        // symmetric input peaks at the mean
        assert!(g[2] > g[1] && g[2] > g[3]);
    }

    #[test]
    fn test_gaussian_degenerate_variance() {
        let g = gaussian_overlay(&[7, 8], &[100.0, 0.0]);
        assert_eq!(g, vec![0.0, 0.0]);
        assert!(gaussian_overlay(&[], &[]).is_empty());
    }
}
