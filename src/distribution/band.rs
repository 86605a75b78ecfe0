// Proportion confidence bands in percent

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Interval used for the per-bin proportion band
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum BandMethod {
    /// Wald interval `p ± z·sqrt(p(1-p)/n)`, lower bound clamped at 0
    #[default]
    Normal,
    /// Wilson score interval, bounds within [0, 100]
    Wilson,
}

/// Lower and upper band, in percent, index-aligned with the input counts
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConfidenceBand {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl ConfidenceBand {
    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }
}

/// Per-bin confidence band for `count / total`
///
/// `total` is passed explicitly so a trimmed slice can be banded against the
/// total it was normalized with. A zero total gives all-zero bounds.
///
/// # Example
/// ```
/// use gacha_audit::distribution::{confidence_band, BandMethod};
///
/// let band = confidence_band(&[50], 100, BandMethod::Normal, 1.96);
/// assert!((band.lower[0] - 40.2).abs() < 1e-9);
/// assert!((band.upper[0] - 59.8).abs() < 1e-9);
/// ```
pub fn confidence_band(counts: &[u64], total: u64, method: BandMethod, z: f64) -> ConfidenceBand {
    if total == 0 {
        return ConfidenceBand {
            lower: vec![0.0; counts.len()],
            upper: vec![0.0; counts.len()],
        };
    }

    let (lower, upper) = counts
        .iter()
        .map(|&c| match method {
            BandMethod::Normal => normal_bounds(c, total, z),
            BandMethod::Wilson => wilson_bounds(c, total, z),
        })
        .unzip();

    ConfidenceBand { lower, upper }
}

fn normal_bounds(count: u64, total: u64, z: f64) -> (f64, f64) {
    let n = total as f64;
    let p = count.min(total) as f64 / n;
    let se = (p * (1.0 - p) / n).sqrt();
    (((p - z * se) * 100.0).max(0.0), (p + z * se) * 100.0)
}

fn wilson_bounds(count: u64, total: u64, z: f64) -> (f64, f64) {
    let n = total as f64;
    let p = count.min(total) as f64 / n;
    let z2 = z * z;

    let denom = 1.0 + z2 / n;
    let center = (p + z2 / (2.0 * n)) / denom;
    let radius = z * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt() / denom;

    (
        (center - radius).clamp(0.0, 1.0) * 100.0,
        (center + radius).clamp(0.0, 1.0) * 100.0,
    )
}
