//! Aggregated per-tier summary rows
//!
//! One row per tier × flag-state combination, as produced by the upstream
//! aggregator. Rows are never mutated by the engine; derived fields live on
//! [`crate::audit::EnrichedRow`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether the optional mini-game flag was on for the attempts in a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Flag {
    On,
    Off,
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flag::On => write!(f, "ON"),
            Flag::Off => write!(f, "OFF"),
        }
    }
}

/// Aggregated success statistics for one tier × flag combination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    /// Upgrade tier (star level)
    #[serde(alias = "star")]
    pub tier: u32,

    #[serde(alias = "catch")]
    pub flag: Flag,

    /// Attempts observed
    pub total_n: u64,

    /// Observed success-rate z-score against the published rate
    pub succ_z: f64,

    /// Observed minus expected success probability
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub succ_delta_p: Option<f64>,

    /// 95% half-width of `succ_delta_p`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub succ_delta_p_ci95: Option<f64>,

    /// Two-sided p-value of the success-rate bias test
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub succ_p_val: Option<f64>,

    /// Observed variance of per-window z-scores over the IID expectation (1.0)
    pub succ_var_ratio: f64,

    /// Number of measurement windows behind `succ_var_ratio`
    pub succ_var_n: u32,

    /// P(ratio this low) under the IID model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub succ_var_p_under: Option<f64>,

    /// P(ratio this high) under the IID model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub succ_var_p_over: Option<f64>,
}

impl SummaryRow {
    /// Success-rate deviation in percentage points (missing counts as 0)
    pub fn delta_pp(&self) -> f64 {
        self.succ_delta_p.unwrap_or(0.0) * 100.0
    }

    /// 95% half-width of [`Self::delta_pp`] in percentage points
    pub fn delta_pp_ci95(&self) -> f64 {
        self.succ_delta_p_ci95.unwrap_or(0.0) * 100.0
    }

    /// Short label used in reports, e.g. `17★ ON`
    pub fn label(&self) -> String {
        format!("{}★ {}", self.tier, self.flag)
    }

    /// Check domain constraints that serde cannot express
    pub fn validate(&self) -> Result<(), String> {
        if !self.succ_z.is_finite() {
            return Err(format!("succ_z must be finite, got {}", self.succ_z));
        }

        if !self.succ_var_ratio.is_finite() || self.succ_var_ratio < 0.0 {
            return Err(format!(
                "succ_var_ratio must be a non-negative finite number, got {}",
                self.succ_var_ratio
            ));
        }

        let probabilities = [
            ("succ_p_val", self.succ_p_val),
            ("succ_var_p_under", self.succ_var_p_under),
            ("succ_var_p_over", self.succ_var_p_over),
        ];
        for (name, value) in probabilities {
            if let Some(p) = value {
                if !(0.0..=1.0).contains(&p) {
                    return Err(format!("{} must be in [0, 1], got {}", name, p));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn sample_row(tier: u32, total_n: u64, var_n: u32, var_ratio: f64) -> SummaryRow {
    SummaryRow {
        tier,
        flag: Flag::Off,
        total_n,
        succ_z: 0.0,
        succ_delta_p: Some(0.0),
        succ_delta_p_ci95: Some(0.0),
        succ_p_val: Some(1.0),
        succ_var_ratio: var_ratio,
        succ_var_n: var_n,
        succ_var_p_under: Some(1.0),
        succ_var_p_over: Some(1.0),
    }
}
