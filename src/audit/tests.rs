// Scenario tests for the audit pipeline

use super::*;
use crate::config::AuditConfig;
use crate::row::{Flag, SummaryRow};

fn row(tier: u32, total_n: u64, var_n: u32, ratio: f64, p_under: f64) -> SummaryRow {
    SummaryRow {
        tier,
        flag: Flag::On,
        total_n,
        succ_z: 0.0,
        succ_delta_p: Some(0.0),
        succ_delta_p_ci95: Some(0.0001),
        succ_p_val: Some(0.8),
        succ_var_ratio: ratio,
        succ_var_n: var_n,
        succ_var_p_under: Some(p_under),
        succ_var_p_over: Some(1.0 - p_under),
    }
}

/// Twelve healthy eligible rows
fn healthy_rows() -> Vec<SummaryRow> {
    (10..22)
        .map(|tier| row(tier, 5_000_000, 20, 1.0, 0.5))
        .collect()
}

#[test]
fn test_healthy_rows_are_consistent() {
    let report = run_audit(&healthy_rows(), &AuditConfig::default()).unwrap();

    assert_eq!(report.rows.len(), 12);
    assert!(report.rows.iter().all(|r| r.verdict == Verdict::Consistent));
    assert_eq!(report.count_test.flagged_count, 0);
    assert_eq!(report.count_test.tail_probability, Some(1.0));
    assert_eq!(report.count_test.evidence, EvidenceLevel::None);
    assert_eq!(report.summary.integrity_percent, Some(100));
    assert_eq!(report.summary.band, IntegrityBand::Consistent);
}

#[test]
fn test_rigged_tiers_are_flagged_strong() {
    let mut rows = healthy_rows();
    for r in rows.iter_mut().take(4) {
        r.succ_var_ratio = 0.4;
        r.succ_var_p_under = Some(0.00001);
        r.succ_var_p_over = Some(0.99999);
    }

    let report = run_audit(&rows, &AuditConfig::default()).unwrap();

    let strong: Vec<_> = report
        .rows
        .iter()
        .filter(|r| r.verdict == Verdict::UnderStrong)
        .collect();
    assert_eq!(strong.len(), 4);
    assert!(strong.iter().all(|r| r.precision == Precision::Critical));

    // 4 of 12 at alpha = 0.01: P(X >= 4) ~ 4.6e-6
    assert_eq!(report.count_test.flagged_count, 4);
    assert_eq!(report.count_test.sample_count, 12);
    assert_eq!(report.count_test.evidence, EvidenceLevel::Moderate);

    assert_eq!(report.summary.critical_rows, 4);
    assert_eq!(report.summary.under_dispersed_rows, 4);
    assert_eq!(report.summary.integrity_percent, Some(67));
    assert_eq!(report.summary.smoking_guns.len(), 3);
    assert_eq!(
        report.summary.smoking_guns[0].suspicion,
        Suspicion::SignificantUnderDispersion
    );
}

#[test]
fn test_many_flags_is_strong_evidence() {
    let rows: Vec<SummaryRow> = (0..10)
        .map(|tier| row(tier, 5_000_000, 20, 0.3, 0.0001))
        .collect();
    let report = run_audit(&rows, &AuditConfig::default()).unwrap();

    assert_eq!(report.count_test.flagged_count, 10);
    assert_eq!(report.count_test.evidence, EvidenceLevel::Strong);
    assert_eq!(report.summary.integrity_percent, Some(0));
    assert_eq!(report.summary.band, IntegrityBand::Widespread);
}

#[test]
fn test_small_rows_are_insufficient_not_normal() {
    let rows = vec![
        row(17, 500_000, 20, 0.3, 0.00001),
        row(18, 5_000_000, 3, 0.3, 0.00001),
    ];
    let report = run_audit(&rows, &AuditConfig::default()).unwrap();

    assert!(report.rows.iter().all(|r| r.verdict == Verdict::Consistent));
    assert_eq!(
        report.rows[0].eligibility,
        Eligibility::InsufficientSamples { total_n: 500_000 }
    );
    assert_eq!(
        report.rows[1].eligibility,
        Eligibility::InsufficientWindows { succ_var_n: 3 }
    );
    assert_eq!(report.count_test.evidence, EvidenceLevel::InsufficientData);
    assert_eq!(report.count_test.tail_probability, None);
    assert_eq!(report.summary.integrity_percent, None);
    assert_eq!(report.summary.band, IntegrityBand::InsufficientData);
}

#[test]
fn test_bias_rows() {
    let mut rows = healthy_rows();
    rows[0].succ_delta_p = Some(-0.002);
    rows[0].succ_p_val = Some(0.0001);
    rows[1].succ_delta_p = Some(0.001);
    rows[1].succ_p_val = Some(0.0001);

    let report = run_audit(&rows, &AuditConfig::default()).unwrap();

    assert_eq!(report.rows[0].verdict, Verdict::Suppressed);
    assert!((report.rows[0].succ_delta_pp + 0.2).abs() < 1e-12);
    assert_eq!(report.rows[1].verdict, Verdict::Inflated);
    assert_eq!(report.summary.biased_down_rows, 1);
    assert_eq!(report.summary.verdict_counts.suppressed, 1);
    assert_eq!(report.summary.verdict_counts.inflated, 1);
    assert_eq!(report.summary.verdict_counts.consistent, 10);
}

#[test]
fn test_missing_p_values_count_as_one() {
    let mut rows = healthy_rows();
    rows[0].succ_p_val = None;
    rows[0].succ_var_p_under = None;
    rows[0].succ_var_p_over = None;

    let report = run_audit(&rows, &AuditConfig::default()).unwrap();
    assert_eq!(report.rows[0].q_values(), RowQValues::default());
}

#[test]
#[allow(clippy::field_reassign_with_default)]
fn test_derive_missing_dispersion() {
    let mut rows = healthy_rows();
    rows[0].succ_var_ratio = 0.2;
    rows[0].succ_var_p_under = None;
    rows[0].succ_var_p_over = None;

    let report = run_audit(&rows, &AuditConfig::default()).unwrap();
    assert_eq!(report.rows[0].verdict, Verdict::Consistent);

    let mut config = AuditConfig::default();
    config.derive_missing_dispersion = true;
    let report = run_audit(&rows, &config).unwrap();
    assert_eq!(report.rows[0].verdict, Verdict::UnderStrong);

    // input rows stay untouched
    assert_eq!(rows[0].succ_var_p_under, None);
}

#[test]
fn test_repeated_runs_agree() {
    let mut rows = healthy_rows();
    rows[3].succ_var_ratio = 0.6;
    rows[3].succ_var_p_under = Some(0.0002);

    let config = AuditConfig::default();
    let first = run_audit(&rows, &config).unwrap();
    let second = run_audit(&rows, &config).unwrap();
    assert_eq!(first, second);
}

#[test]
#[allow(clippy::field_reassign_with_default)]
fn test_invalid_config_is_error() {
    let mut config = AuditConfig::default();
    config.count_alpha = 2.0;
    assert!(run_audit(&healthy_rows(), &config).is_err());
}

#[test]
fn test_report_string_sections() {
    let mut rows = healthy_rows();
    rows[0].succ_var_ratio = 0.4;
    rows[0].succ_var_p_under = Some(0.00001);

    let report = run_audit(&rows, &AuditConfig::default()).unwrap();
    let text = report.to_report_string();

    assert!(text.contains("Rows: 12 (12 eligible"));
    assert!(text.contains("Findings (1)"));
    assert!(text.contains("10★ ON"));
    assert!(text.contains("UNDER_STRONG"));
    assert!(text.contains("Most suspicious rows"));
}

#[test]
fn test_report_json_shape() {
    let report = run_audit(&healthy_rows(), &AuditConfig::default()).unwrap();
    let json = serde_json::to_value(&report).unwrap();

    let first = &json["rows"][0];
    assert_eq!(first["tier"], 10);
    assert_eq!(first["verdict"], "CONSISTENT");
    assert_eq!(first["precision"], "NORMAL");
    assert_eq!(first["eligibility"]["state"], "eligible");
    assert!(json.get("rejected").is_none());
}
