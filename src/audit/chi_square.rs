// Chi-square dispersion p-values
//
// Under the IID binomial model each window z-score has variance 1, so
// (k - 1) * sample_variance(z) follows a chi-square distribution with k - 1
// degrees of freedom. The lower tail measures under-dispersion, the upper
// tail over-dispersion.
//
// Used only to fill rows that arrive without their dispersion p-values.

use serde::{Deserialize, Serialize};

/// Dispersion p-values derived from a variance ratio
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DispersionPValues {
    /// P(chi <= observed): small means suspiciously regular outcomes
    pub under: f64,
    /// P(chi >= observed): small means excess variance
    pub over: f64,
    pub two_sided: f64,
}

impl DispersionPValues {
    /// Everything 1.0: no evidence either way
    pub const NONE: Self = Self {
        under: 1.0,
        over: 1.0,
        two_sided: 1.0,
    };

    /// Derive p-values from `var_ratio` over `windows` measurement windows
    ///
    /// Fewer than two windows, or a non-finite/negative ratio, gives
    /// [`Self::NONE`].
    pub fn from_ratio(var_ratio: f64, windows: u32) -> Self {
        if windows < 2 || !var_ratio.is_finite() || var_ratio < 0.0 {
            return Self::NONE;
        }

        let df = (windows - 1) as f64;
        let chi = df * var_ratio;
        let under = chi_square_cdf(chi, df);
        let over = chi_square_sf(chi, df);

        Self {
            under,
            over,
            two_sided: (2.0 * under.min(over)).min(1.0),
        }
    }
}

/// CDF of the chi-square distribution with `df` degrees of freedom
pub fn chi_square_cdf(x: f64, df: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    regularized_gamma(df / 2.0, x / 2.0).0.clamp(0.0, 1.0)
}

/// Upper tail of the chi-square distribution, computed without `1 - cdf`
pub fn chi_square_sf(x: f64, df: f64) -> f64 {
    if x <= 0.0 {
        return 1.0;
    }
    regularized_gamma(df / 2.0, x / 2.0).1.clamp(0.0, 1.0)
}

/// Lanczos approximation for ln(Gamma(x)), g=7, n=9
fn ln_gamma(x: f64) -> f64 {
    #[allow(clippy::excessive_precision)]
    const COEFFICIENTS: [f64; 9] = [
        0.99999999999980993,
        676.5203681218851,
        -1259.1392167224028,
        771.32342877765313,
        -176.61502916214059,
        12.507343278686905,
        -0.13857109526572012,
        9.9843695780195716e-6,
        1.5056327351493116e-7,
    ];
    const G: f64 = 7.0;

    if x < 0.5 {
        // Reflection: Gamma(x) * Gamma(1-x) = pi / sin(pi*x)
        let sin_val = (std::f64::consts::PI * x).sin();
        return std::f64::consts::PI.ln() - sin_val.abs().ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let mut sum = COEFFICIENTS[0];
    for (i, &c) in COEFFICIENTS.iter().enumerate().skip(1) {
        sum += c / (x + i as f64);
    }

    let t = x + G + 0.5;
    let log_sqrt_2pi = (2.0 * std::f64::consts::PI).sqrt().ln();
    log_sqrt_2pi + (x + 0.5) * t.ln() - t + sum.ln()
}

const MAX_ITER: usize = 500;
const EPSILON: f64 = 1e-14;
const TINY: f64 = 1e-300;

/// Regularized incomplete gammas `(P(a, x), Q(a, x))`
///
/// Series expansion for P below `a + 1`, Lentz continued fraction for Q
/// above. Each tail comes straight from its own expansion where that one is
/// the small side.
fn regularized_gamma(a: f64, x: f64) -> (f64, f64) {
    if x <= 0.0 {
        return (0.0, 1.0);
    }

    let ln_prefix = a * x.ln() - x - ln_gamma(a);

    if x < a + 1.0 {
        let mut ap = a;
        let mut term = 1.0 / a;
        let mut sum = term;
        for _ in 0..MAX_ITER {
            ap += 1.0;
            term *= x / ap;
            sum += term;
            if term.abs() < sum.abs() * EPSILON {
                break;
            }
        }
        let lower = (sum.ln() + ln_prefix).exp();
        (lower, 1.0 - lower)
    } else {
        let mut b = x + 1.0 - a;
        let mut c = 1.0 / TINY;
        let mut d = 1.0 / b;
        let mut h = d;
        for i in 1..=MAX_ITER {
            let an = -(i as f64) * (i as f64 - a);
            b += 2.0;
            d = an * d + b;
            if d.abs() < TINY {
                d = TINY;
            }
            c = b + an / c;
            if c.abs() < TINY {
                c = TINY;
            }
            d = 1.0 / d;
            let delta = d * c;
            h *= delta;
            if (delta - 1.0).abs() < EPSILON {
                break;
            }
        }
        let upper = ln_prefix.exp() * h;
        (1.0 - upper, upper)
    }
}
