// Statistical audit of aggregated success rows
//
// Detects success sequences that are too regular to come from independent
// trials (under-dispersion), plus over-dispersion and success-rate bias.
//
// Pipeline:
// - fdr: Benjamini-Hochberg q-values, run once per p-value stream
// - classifier: eligibility gate + ordered rule table per row
// - count_test: exact binomial tail on the number of flagged rows
// - summary: integrity percentage and most suspicious rows
//
// chi_square only fills dispersion p-values a row arrived without.

mod chi_square;
mod classifier;
mod fdr;
mod report;
mod summary;

pub use chi_square::{chi_square_cdf, chi_square_sf, DispersionPValues};
pub use classifier::{
    apply_rules, classify, Classification, Eligibility, Precision, RowQValues, Rule, RuleInput,
    Verdict, MIN_TOTAL_N, MIN_VAR_WINDOWS, RULES,
};
pub use count_test::{binomial_tail, CountSignificance, EvidenceLevel};
pub use fdr::{bh_adjust, bh_adjust_values};
pub use report::{run_audit, AuditReport, EnrichedRow};
pub use summary::{IntegrityBand, IntegritySummary, SmokingGun, Suspicion, VerdictCounts};

#[cfg(test)]
mod tests;
