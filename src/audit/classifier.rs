// Per-row dispersion and bias classification
//
// The decision table is an ordered list of (predicate, outcome) pairs.
// Evaluation order is the tie-break: a row that is both strongly
// under-dispersed and biased reports the dispersion finding.

use crate::row::SummaryRow;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum attempts before a row can be flagged
pub const MIN_TOTAL_N: u64 = 1_000_000;

/// Minimum measurement windows before a row can be flagged
pub const MIN_VAR_WINDOWS: u32 = 5;

/// Severity tier of a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Precision {
    Normal,
    High,
    Critical,
}

/// Classification label of a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    /// Consistent with independent trials
    Consistent,
    /// Success variance far too low: outcomes too regular to be independent
    UnderStrong,
    UnderMild,
    /// Variance higher than the IID model predicts
    Over,
    /// Success rate significantly below the published rate
    Suppressed,
    /// Success rate significantly above the published rate
    Inflated,
}

impl Verdict {
    /// Whether this verdict is any finding other than `Consistent`
    pub fn is_flagged(&self) -> bool {
        !matches!(self, Verdict::Consistent)
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Precision::Normal => "NORMAL",
            Precision::High => "HIGH",
            Precision::Critical => "CRITICAL",
        };
        f.pad(s)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::Consistent => "CONSISTENT",
            Verdict::UnderStrong => "UNDER_STRONG",
            Verdict::UnderMild => "UNDER_MILD",
            Verdict::Over => "OVER",
            Verdict::Suppressed => "SUPPRESSED",
            Verdict::Inflated => "INFLATED",
        };
        f.pad(s)
    }
}

/// Whether a row carries enough evidence to be tested at all
///
/// Distinguishes "not enough data" from "tested and found consistent".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Eligibility {
    Eligible,
    InsufficientSamples { total_n: u64 },
    InsufficientWindows { succ_var_n: u32 },
}

impl Eligibility {
    pub fn of(row: &SummaryRow) -> Self {
        if row.total_n < MIN_TOTAL_N {
            Eligibility::InsufficientSamples {
                total_n: row.total_n,
            }
        } else if row.succ_var_n < MIN_VAR_WINDOWS {
            Eligibility::InsufficientWindows {
                succ_var_n: row.succ_var_n,
            }
        } else {
            Eligibility::Eligible
        }
    }

    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible)
    }
}

/// The three BH q-values belonging to one row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RowQValues {
    pub bias: f64,
    pub under: f64,
    pub over: f64,
}

impl Default for RowQValues {
    fn default() -> Self {
        Self {
            bias: 1.0,
            under: 1.0,
            over: 1.0,
        }
    }
}

/// Outcome of classifying one row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub precision: Precision,
    pub verdict: Verdict,
    pub eligibility: Eligibility,
}

/// Inputs a rule predicate may look at
#[derive(Debug, Clone, Copy)]
pub struct RuleInput {
    pub var_ratio: f64,
    pub delta_pp: f64,
    pub q: RowQValues,
}

impl RuleInput {
    pub fn from_row(row: &SummaryRow, q: RowQValues) -> Self {
        Self {
            var_ratio: row.succ_var_ratio,
            delta_pp: row.delta_pp(),
            q,
        }
    }
}

/// One entry of the decision table
pub struct Rule {
    pub name: &'static str,
    pub applies: fn(&RuleInput) -> bool,
    pub outcome: fn(&RuleInput) -> (Precision, Verdict),
}

/// Decision table, evaluated top to bottom; the first match wins
pub const RULES: &[Rule] = &[
    Rule {
        name: "strong_under_dispersion",
        applies: |r| r.var_ratio < 0.70 && r.q.under < 0.01,
        outcome: |_| (Precision::Critical, Verdict::UnderStrong),
    },
    Rule {
        name: "mild_under_dispersion",
        applies: |r| r.var_ratio < 0.85 && r.q.under < 0.05,
        outcome: |_| (Precision::High, Verdict::UnderMild),
    },
    Rule {
        name: "over_dispersion",
        applies: |r| r.var_ratio > 1.50 && r.q.over < 0.05,
        outcome: |_| (Precision::Normal, Verdict::Over),
    },
    Rule {
        name: "success_bias",
        applies: |r| r.q.bias < 0.05 && r.delta_pp.abs() >= 0.05,
        outcome: |r| {
            if r.delta_pp < 0.0 {
                (Precision::Normal, Verdict::Suppressed)
            } else {
                (Precision::Normal, Verdict::Inflated)
            }
        },
    },
];

/// Run the decision table, ignoring the eligibility gate
pub fn apply_rules(input: &RuleInput) -> (Precision, Verdict) {
    RULES
        .iter()
        .find(|rule| (rule.applies)(input))
        .map(|rule| (rule.outcome)(input))
        .unwrap_or((Precision::Normal, Verdict::Consistent))
}

/// Classify a row given its three q-values
///
/// Rows below the eligibility gate are always `NORMAL / CONSISTENT`, with the
/// reason recorded in [`Classification::eligibility`].
///
/// # Example
/// ```
/// use gacha_audit::audit::{classify, Precision, RowQValues, Verdict};
/// use gacha_audit::row::{Flag, SummaryRow};
///
/// let row = SummaryRow {
///     tier: 17, flag: Flag::On, total_n: 2_000_000, succ_z: 0.4,
///     succ_delta_p: None, succ_delta_p_ci95: None, succ_p_val: Some(0.7),
///     succ_var_ratio: 0.6, succ_var_n: 6,
///     succ_var_p_under: Some(0.001), succ_var_p_over: Some(0.999),
/// };
/// let q = RowQValues { bias: 0.7, under: 0.005, over: 1.0 };
/// let c = classify(&row, q);
/// assert_eq!((c.precision, c.verdict), (Precision::Critical, Verdict::UnderStrong));
/// ```
pub fn classify(row: &SummaryRow, q: RowQValues) -> Classification {
    let eligibility = Eligibility::of(row);
    if !eligibility.is_eligible() {
        return Classification {
            precision: Precision::Normal,
            verdict: Verdict::Consistent,
            eligibility,
        };
    }

    let (precision, verdict) = apply_rules(&RuleInput::from_row(row, q));
    Classification {
        precision,
        verdict,
        eligibility,
    }
}
