// Integrity summary over a classified row set
//
// "Integrity" is the share of eligible rows whose success variance is
// consistent with independent trials (not under-dispersed at the mild level).

use crate::audit::classifier::{Precision, Verdict};
use crate::audit::report::EnrichedRow;
use crate::row::Flag;
use serde::{Deserialize, Serialize};

/// Coarse reading of the integrity percentage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityBand {
    /// No row passed the eligibility gate
    InsufficientData,
    /// Under 25%: under-dispersion in most eligible rows
    Widespread,
    /// Under 60%: under-dispersion in a noticeable share of rows
    Partial,
    Consistent,
}

impl IntegrityBand {
    pub fn from_percent(percent: Option<u32>) -> Self {
        match percent {
            None => IntegrityBand::InsufficientData,
            Some(p) if p < 25 => IntegrityBand::Widespread,
            Some(p) if p < 60 => IntegrityBand::Partial,
            Some(_) => IntegrityBand::Consistent,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            IntegrityBand::InsufficientData => "not enough eligible rows to judge",
            IntegrityBand::Widespread => "under-dispersion is widespread",
            IntegrityBand::Partial => "under-dispersion in part of the tiers",
            IntegrityBand::Consistent => "broadly consistent with independent trials",
        }
    }
}

/// How suspicious a listed row looks on its dispersion evidence alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Suspicion {
    SignificantUnderDispersion,
    SignificantLowVariance,
    LowVariance,
    Watch,
}

impl Suspicion {
    fn of(var_ratio: f64, q_under: f64) -> Self {
        if q_under < 0.01 && var_ratio < 0.70 {
            Suspicion::SignificantUnderDispersion
        } else if q_under < 0.05 && var_ratio < 0.85 {
            Suspicion::SignificantLowVariance
        } else if var_ratio < 0.85 {
            Suspicion::LowVariance
        } else {
            Suspicion::Watch
        }
    }
}

/// One of the most suspicious eligible rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmokingGun {
    pub tier: u32,
    pub flag: Flag,
    pub total_n: u64,
    pub succ_var_n: u32,
    pub succ_var_ratio: f64,
    pub succ_var_q_under: f64,
    pub suspicion: Suspicion,
}

/// Aggregate view of a classified row set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegritySummary {
    pub eligible_rows: usize,
    pub insufficient_rows: usize,
    /// Eligible rows with ratio < 0.85 and q_under < 0.05
    pub under_dispersed_rows: usize,
    /// `None` when no row is eligible
    pub integrity_percent: Option<u32>,
    pub band: IntegrityBand,
    pub critical_rows: usize,
    /// Eligible rows with significant bias at or below -0.05 pp
    pub biased_down_rows: usize,
    pub verdict_counts: VerdictCounts,
    pub smoking_guns: Vec<SmokingGun>,
}

/// Number of rows per verdict
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictCounts {
    pub consistent: usize,
    pub under_strong: usize,
    pub under_mild: usize,
    pub over: usize,
    pub suppressed: usize,
    pub inflated: usize,
}

impl VerdictCounts {
    fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Consistent => self.consistent += 1,
            Verdict::UnderStrong => self.under_strong += 1,
            Verdict::UnderMild => self.under_mild += 1,
            Verdict::Over => self.over += 1,
            Verdict::Suppressed => self.suppressed += 1,
            Verdict::Inflated => self.inflated += 1,
        }
    }
}

impl IntegritySummary {
    /// Summarize classified rows, listing up to `gun_count` suspicious rows
    pub fn from_rows(rows: &[EnrichedRow], gun_count: usize) -> Self {
        let eligible: Vec<&EnrichedRow> = rows
            .iter()
            .filter(|r| r.eligibility.is_eligible())
            .collect();

        let under_dispersed_rows = eligible
            .iter()
            .filter(|r| r.row.succ_var_ratio < 0.85 && r.succ_var_q_under < 0.05)
            .count();

        let integrity_percent = if eligible.is_empty() {
            None
        } else {
            let share = 1.0 - under_dispersed_rows as f64 / eligible.len() as f64;
            Some((100.0 * share).round() as u32)
        };

        let critical_rows = rows
            .iter()
            .filter(|r| r.precision == Precision::Critical)
            .count();

        let biased_down_rows = eligible
            .iter()
            .filter(|r| r.succ_bias_q < 0.05 && r.succ_delta_pp <= -0.05)
            .count();

        let mut verdict_counts = VerdictCounts::default();
        for r in rows {
            verdict_counts.record(r.verdict);
        }

        let mut ranked = eligible.clone();
        ranked.sort_by(|a, b| a.succ_var_q_under.total_cmp(&b.succ_var_q_under));
        let smoking_guns = ranked
            .into_iter()
            .take(gun_count)
            .map(|r| SmokingGun {
                tier: r.row.tier,
                flag: r.row.flag,
                total_n: r.row.total_n,
                succ_var_n: r.row.succ_var_n,
                succ_var_ratio: r.row.succ_var_ratio,
                succ_var_q_under: r.succ_var_q_under,
                suspicion: Suspicion::of(r.row.succ_var_ratio, r.succ_var_q_under),
            })
            .collect();

        Self {
            eligible_rows: eligible.len(),
            insufficient_rows: rows.len() - eligible.len(),
            under_dispersed_rows,
            integrity_percent,
            band: IntegrityBand::from_percent(integrity_percent),
            critical_rows,
            biased_down_rows,
            verdict_counts,
            smoking_guns,
        }
    }
}
