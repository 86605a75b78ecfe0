// Audit pipeline: rows -> BH q-values -> classification -> count test
//
// The three q-value streams (bias, under-dispersion, over-dispersion) are
// corrected independently over the whole row set, ineligible rows included.

use crate::audit::classifier::{classify, Eligibility, Precision, RowQValues, Verdict};
use crate::audit::count_test::{CountSignificance, EvidenceLevel};
use crate::audit::fdr::bh_adjust;
use crate::audit::summary::IntegritySummary;
use crate::config::AuditConfig;
use crate::error::{AuditError, Result};
use crate::ingest::{fill_dispersion, Rejection};
use crate::row::SummaryRow;
use serde::Serialize;

/// A summary row with everything the engine derives from it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRow {
    #[serde(flatten)]
    pub row: SummaryRow,
    pub abs_succ_z: f64,
    pub succ_delta_pp: f64,
    pub succ_delta_pp_ci95: f64,
    pub succ_bias_q: f64,
    pub succ_var_q_under: f64,
    pub succ_var_q_over: f64,
    pub precision: Precision,
    pub verdict: Verdict,
    pub eligibility: Eligibility,
}

impl EnrichedRow {
    fn new(row: SummaryRow, q: RowQValues) -> Self {
        let classification = classify(&row, q);
        Self {
            abs_succ_z: row.succ_z.abs(),
            succ_delta_pp: row.delta_pp(),
            succ_delta_pp_ci95: row.delta_pp_ci95(),
            succ_bias_q: q.bias,
            succ_var_q_under: q.under,
            succ_var_q_over: q.over,
            precision: classification.precision,
            verdict: classification.verdict,
            eligibility: classification.eligibility,
            row,
        }
    }

    pub fn q_values(&self) -> RowQValues {
        RowQValues {
            bias: self.succ_bias_q,
            under: self.succ_var_q_under,
            over: self.succ_var_q_over,
        }
    }
}

/// Result of auditing one row set
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditReport {
    pub rows: Vec<EnrichedRow>,
    pub summary: IntegritySummary,
    pub count_test: CountSignificance,
    /// Input items dropped during ingestion
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<Rejection>,
}

/// Audit a set of summary rows
///
/// Input rows are not modified; derived fields live on the returned
/// [`EnrichedRow`]s, so repeated runs over the same rows agree.
pub fn run_audit(rows: &[SummaryRow], config: &AuditConfig) -> Result<AuditReport> {
    config.validate().map_err(AuditError::InvalidConfig)?;

    let rows: Vec<SummaryRow> = rows
        .iter()
        .cloned()
        .map(|row| {
            if config.derive_missing_dispersion {
                fill_dispersion(row)
            } else {
                row
            }
        })
        .collect();

    let bias_p: Vec<Option<f64>> = rows.iter().map(|r| r.succ_p_val).collect();
    let under_p: Vec<Option<f64>> = rows.iter().map(|r| r.succ_var_p_under).collect();
    let over_p: Vec<Option<f64>> = rows.iter().map(|r| r.succ_var_p_over).collect();

    let bias_q = bh_adjust(&bias_p);
    let under_q = bh_adjust(&under_p);
    let over_q = bh_adjust(&over_p);

    let enriched: Vec<EnrichedRow> = rows
        .into_iter()
        .enumerate()
        .map(|(i, row)| {
            let q = RowQValues {
                bias: bias_q[i],
                under: under_q[i],
                over: over_q[i],
            };
            EnrichedRow::new(row, q)
        })
        .collect();

    let count_test = flagged_count_test(&enriched, config);
    let summary = IntegritySummary::from_rows(&enriched, config.smoking_gun_count);

    tracing::debug!(
        rows = enriched.len(),
        eligible = summary.eligible_rows,
        flagged = count_test.flagged_count,
        evidence = ?count_test.evidence,
        "audit complete"
    );

    Ok(AuditReport {
        rows: enriched,
        summary,
        count_test,
        rejected: Vec::new(),
    })
}

/// Binomial test on eligible rows whose raw under-dispersion p-value and
/// variance ratio both fall below the configured cut-offs
fn flagged_count_test(rows: &[EnrichedRow], config: &AuditConfig) -> CountSignificance {
    let eligible = rows.iter().filter(|r| r.eligibility.is_eligible());

    let mut sample = 0u64;
    let mut flagged = 0u64;
    for r in eligible {
        sample += 1;
        let p_under = r.row.succ_var_p_under.unwrap_or(1.0);
        if p_under < config.count_alpha && r.row.succ_var_ratio < config.count_flag_ratio {
            flagged += 1;
        }
    }

    CountSignificance::evaluate(
        flagged,
        sample,
        config.count_alpha,
        config.strong_evidence_below,
        config.moderate_evidence_below,
    )
}

impl AuditReport {
    /// Attach rows rejected during ingestion
    pub fn with_rejections(mut self, rejected: Vec<Rejection>) -> Self {
        self.rejected = rejected;
        self
    }

    /// Rows with any finding other than `CONSISTENT`
    pub fn flagged_rows(&self) -> impl Iterator<Item = &EnrichedRow> {
        self.rows.iter().filter(|r| r.verdict.is_flagged())
    }

    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        let mut report = String::new();
        let test = &self.count_test;

        match test.evidence {
            EvidenceLevel::Strong => report.push_str("🚨 STRONG EVIDENCE OF UNDER-DISPERSION\n\n"),
            EvidenceLevel::Moderate => {
                report.push_str("⚠️  MODERATE EVIDENCE OF UNDER-DISPERSION\n\n")
            }
            EvidenceLevel::None => report.push_str("✅ NO CLEAR UNDER-DISPERSION\n\n"),
            EvidenceLevel::InsufficientData => report.push_str("⚠️  INSUFFICIENT DATA\n\n"),
        }

        report.push_str(&format!(
            "Rows: {} ({} eligible, {} with insufficient evidence)\n",
            self.rows.len(),
            self.summary.eligible_rows,
            self.summary.insufficient_rows
        ));

        match test.tail_probability {
            Some(tail) => report.push_str(&format!(
                "Flagged rows: {} of {} (alpha={}, P(X >= {}) = {:.3e})\n",
                test.flagged_count, test.sample_count, test.alpha, test.flagged_count, tail
            )),
            None => report.push_str("Flagged rows: no eligible rows to test\n"),
        }

        match self.summary.integrity_percent {
            Some(pct) => report.push_str(&format!(
                "Integrity: {}% ({})\n",
                pct,
                self.summary.band.describe()
            )),
            None => report.push_str(&format!("Integrity: n/a ({})\n", self.summary.band.describe())),
        }

        report.push_str(&format!(
            "Critical rows: {}, biased down: {}\n",
            self.summary.critical_rows, self.summary.biased_down_rows
        ));

        let flagged: Vec<&EnrichedRow> = self.flagged_rows().collect();
        if !flagged.is_empty() {
            report.push_str(&format!("\n📊 Findings ({}):\n", flagged.len()));
            for r in flagged {
                report.push_str(&format!(
                    "  {:<10} {:<8} {:<12} ratio={:.3} q_under={:.2e} q_over={:.2e} q_bias={:.2e} Δ={:+.3}pp\n",
                    r.row.label(),
                    r.precision,
                    r.verdict,
                    r.row.succ_var_ratio,
                    r.succ_var_q_under,
                    r.succ_var_q_over,
                    r.succ_bias_q,
                    r.succ_delta_pp
                ));
            }
        }

        if !self.summary.smoking_guns.is_empty() {
            report.push_str("\n🔍 Most suspicious rows:\n");
            for gun in &self.summary.smoking_guns {
                report.push_str(&format!(
                    "  {}★ {} n={} windows={} ratio={:.3} q_under={:.2e} ({:?})\n",
                    gun.tier,
                    gun.flag,
                    gun.total_n,
                    gun.succ_var_n,
                    gun.succ_var_ratio,
                    gun.succ_var_q_under,
                    gun.suspicion
                ));
            }
        }

        if !self.rejected.is_empty() {
            report.push_str(&format!("\n🚫 Rejected inputs ({}):\n", self.rejected.len()));
            for r in &self.rejected {
                report.push_str(&format!("  - {}: {}\n", r.item, r.reason));
            }
        }

        report
    }
}
