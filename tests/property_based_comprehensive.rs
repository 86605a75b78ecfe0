//! Property-based tests for the audit engine
//!
//! Covers:
//! 1. BH q-values: bounds, q >= p, monotone in p rank
//! 2. Binomial tail: bounds, monotone in the flagged count
//! 3. Distribution transforms: tail shape, percentile monotonicity, bands
//! 4. Row ingestion never panics on arbitrary JSON

use gacha_audit::audit::{bh_adjust_values, binomial_tail};
use gacha_audit::distribution::{
    confidence_band, gaussian_overlay, normalize, percentile, tail_transform, trim_range,
    BandMethod, OutcomeHistogram,
};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_bh_bounded_and_above_p(p in prop::collection::vec(0.0f64..=1.0, 1..60)) {
        let q = bh_adjust_values(&p);
        prop_assert_eq!(q.len(), p.len());
        for (qi, pi) in q.iter().zip(&p) {
            prop_assert!((0.0..=1.0).contains(qi));
            prop_assert!(*qi >= *pi, "q {} < p {}", qi, pi);
        }
    }

    #[test]
    fn prop_bh_monotone_in_p_rank(p in prop::collection::vec(0.0f64..=1.0, 1..60)) {
        let q = bh_adjust_values(&p);
        let mut order: Vec<usize> = (0..p.len()).collect();
        order.sort_by(|&a, &b| p[a].total_cmp(&p[b]));
        for w in order.windows(2) {
            prop_assert!(q[w[0]] <= q[w[1]] + 1e-15);
        }
    }

    #[test]
    fn prop_bh_largest_p_keeps_its_value(
        p in prop::collection::vec(0.0f64..0.5, 0..40),
        top in 0.5f64..=1.0,
    ) {
        let mut p = p;
        p.push(top);
        let q = bh_adjust_values(&p);
        prop_assert_eq!(q[q.len() - 1], top);
    }

    #[test]
    fn prop_bh_is_idempotent_across_calls(p in prop::collection::vec(0.0f64..=1.0, 0..30)) {
        prop_assert_eq!(bh_adjust_values(&p), bh_adjust_values(&p));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_binomial_tail_bounded(n in 0u64..200, k in 0u64..220, alpha in 0.0f64..=1.0) {
        let tail = binomial_tail(k, n, alpha);
        prop_assert!(tail.is_finite());
        prop_assert!((0.0..=1.0).contains(&tail));
    }

    #[test]
    fn prop_binomial_tail_non_increasing(n in 1u64..120, alpha in 0.001f64..0.5) {
        let mut prev = binomial_tail(0, n, alpha);
        for k in 1..=n {
            let t = binomial_tail(k, n, alpha);
            prop_assert!(t <= prev + 1e-12);
            prev = t;
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_tail_shape(counts in prop::collection::vec(0u64..10_000, 1..80)) {
        let prob = normalize(&counts);
        let tail = tail_transform(&prob);

        for w in tail.windows(2) {
            prop_assert!(w[1] <= w[0] + 1e-9);
        }
        prop_assert_eq!(tail.last(), prob.last());

        let total: u64 = counts.iter().sum();
        if total > 0 {
            prop_assert!((tail[0] - 100.0).abs() < 1e-6);
        } else {
            prop_assert_eq!(tail[0], 0.0);
        }
    }

    #[test]
    fn prop_percentile_monotone(
        pairs in prop::collection::vec((0u64..500, 0u64..1000), 1..50),
        a in 0.0f64..=1.0,
        b in 0.0f64..=1.0,
    ) {
        let h = OutcomeHistogram::from_pairs(pairs);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        match (percentile(&h, lo), percentile(&h, hi)) {
            (Some(x), Some(y)) => prop_assert!(x <= y),
            (None, None) => prop_assert_eq!(h.total(), 0),
            _ => prop_assert!(false, "percentile defined for one quantile only"),
        }
    }

    #[test]
    fn prop_trim_span_is_valid(
        fair in prop::collection::vec(0.0f64..50.0, 1..40),
        threshold in 0.0f64..60.0,
    ) {
        if let Some((start, end)) = trim_range(&fair, &fair, threshold) {
            prop_assert!(start <= end);
            prop_assert!(end < fair.len());
            prop_assert!(fair[start] >= threshold && fair[end] >= threshold);
        }
    }

    #[test]
    fn prop_gaussian_finite(counts in prop::collection::vec(0u64..1000, 1..40)) {
        let domain: Vec<u64> = (0..counts.len() as u64).collect();
        let g = gaussian_overlay(&domain, &normalize(&counts));
        prop_assert_eq!(g.len(), domain.len());
        prop_assert!(g.iter().all(|v| v.is_finite() && *v >= 0.0));
    }

    #[test]
    fn prop_band_non_negative(
        counts in prop::collection::vec(0u64..1000, 1..30),
        wilson in any::<bool>(),
    ) {
        let total: u64 = counts.iter().sum();
        let method = if wilson { BandMethod::Wilson } else { BandMethod::Normal };
        let band = confidence_band(&counts, total, method, 1.96);
        for i in 0..counts.len() {
            prop_assert!(band.lower[i] >= 0.0);
            prop_assert!(band.lower[i] <= band.upper[i]);
            prop_assert!(band.upper[i].is_finite());
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_row_ingest_never_panics(input in "\\PC*") {
        let _ = gacha_audit::ingest::parse_rows(&input, true);
    }
}
