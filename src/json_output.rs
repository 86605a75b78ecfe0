//! JSON output format for audit reports and comparison series

use crate::audit::AuditReport;
use crate::distribution::ComparisonSeries;
use crate::ingest::Rejection;
use serde::Serialize;

/// Top-level JSON document written by `--format json`
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    pub version: String,
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit: Option<AuditReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<ComparisonSeries>,
    /// Histograms dropped while reading a simulation file
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<Rejection>,
}

impl JsonOutput {
    pub fn new() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "gacha-audit-json-v1".to_string(),
            audit: None,
            comparison: None,
            rejected: Vec::new(),
        }
    }

    pub fn set_audit(&mut self, report: AuditReport) {
        self.audit = Some(report);
    }

    pub fn set_comparison(&mut self, series: ComparisonSeries, rejected: Vec<Rejection>) {
        self.comparison = Some(series);
        self.rejected = rejected;
    }

    /// Serialize as pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DistributionConfig;
    use crate::distribution::{compare, ComparisonOptions, Metric, OutcomeHistogram};

    #[test]
    fn test_empty_output() {
        let output = JsonOutput::new();
        let json = output.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["format"], "gacha-audit-json-v1");

        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 2, "unexpected keys: {:?}", keys);
        assert!(value.get("audit").is_none());
        assert!(value.get("comparison").is_none());
        assert!(value.get("rejected").is_none());
    }

    #[test]
    fn test_comparison_output() {
        let fair = OutcomeHistogram::from_pairs(vec![(1, 3), (2, 1)]);
        let opts = ComparisonOptions::from_config(&DistributionConfig::default(), Metric::Cost);
        let series = compare(Metric::Cost, &fair, &fair, &opts);

        let mut output = JsonOutput::new();
        output.set_comparison(
            series,
            vec![Rejection {
                item: "rigged.histogram".to_string(),
                reason: "bad value 0.5".to_string(),
            }],
        );

        let value: serde_json::Value = serde_json::from_str(&output.to_json().unwrap()).unwrap();
        assert_eq!(value["comparison"]["metric"], "cost");
        assert_eq!(value["comparison"]["view"], "tail");
        assert_eq!(value["comparison"]["domain"], serde_json::json!([1, 2]));
        assert_eq!(value["comparison"]["markers"][0]["quantile"], 0.99);
        assert_eq!(value["rejected"][0]["item"], "rigged.histogram");
        assert!(value["comparison"].get("fair_band").is_none());
    }
}
