// Benjamini-Hochberg false discovery rate correction
//
// Each audit runs three independent corrections (bias, under-dispersion,
// over-dispersion). They must never share intermediate state, so the
// corrector is a plain function over a slice.

/// Adjust p-values to BH q-values, preserving the caller's order
///
/// Missing or non-finite p-values count as 1.0. Output is index-aligned with
/// the input; q-values are non-decreasing in increasing-p order and lie in
/// `[0, 1]`.
///
/// # Example
/// ```
/// use gacha_audit::audit::bh_adjust;
///
/// let q = bh_adjust(&[Some(0.001), Some(0.02), Some(0.03), Some(0.5)]);
/// assert!((q[0] - 0.004).abs() < 1e-12);
/// assert!((q[3] - 0.5).abs() < 1e-12);
/// ```
pub fn bh_adjust(p_values: &[Option<f64>]) -> Vec<f64> {
    let m = p_values.len();
    let mut indexed: Vec<(usize, f64)> = p_values
        .iter()
        .enumerate()
        .map(|(i, p)| (i, sanitize(*p)))
        .collect();

    // Stable sort keeps ties in caller order
    indexed.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut q = vec![1.0; m];
    let mut running_min = 1.0_f64;
    for (j, &(original_index, p)) in indexed.iter().enumerate().rev() {
        // m / rank >= 1, so the product never rounds below p
        let scale = m as f64 / (j + 1) as f64;
        let candidate = (p * scale).min(1.0);
        running_min = running_min.min(candidate);
        q[original_index] = running_min;
    }

    q
}

/// Convenience wrapper for callers holding plain p-values
pub fn bh_adjust_values(p_values: &[f64]) -> Vec<f64> {
    let wrapped: Vec<Option<f64>> = p_values.iter().copied().map(Some).collect();
    bh_adjust(&wrapped)
}

fn sanitize(p: Option<f64>) -> f64 {
    match p {
        Some(v) if v.is_finite() => v.clamp(0.0, 1.0),
        _ => 1.0,
    }
}
