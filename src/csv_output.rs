//! CSV output format for audit rows and comparison series

use crate::audit::EnrichedRow;
use crate::distribution::ComparisonSeries;

/// Escape CSV field (handle commas, quotes, newlines)
fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// CSV formatter for enriched audit rows
#[derive(Debug, Default)]
pub struct CsvAuditOutput {
    rows: Vec<EnrichedRow>,
}

impl CsvAuditOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, row: EnrichedRow) {
        self.rows.push(row);
    }

    fn header(&self) -> &'static str {
        "tier,flag,total_n,succ_z,abs_succ_z,succ_delta_pp,succ_delta_pp_ci95,succ_p_val,\
         succ_bias_q,succ_var_ratio,succ_var_n,succ_var_p_under,succ_var_q_under,\
         succ_var_p_over,succ_var_q_over,eligibility,precision,verdict"
    }

    fn format_row(row: &EnrichedRow) -> String {
        let eligibility = serde_json::to_value(row.eligibility)
            .ok()
            .and_then(|v| v.get("state").and_then(|s| s.as_str()).map(str::to_string))
            .unwrap_or_default();

        let fields = [
            row.row.tier.to_string(),
            row.row.flag.to_string(),
            row.row.total_n.to_string(),
            row.row.succ_z.to_string(),
            row.abs_succ_z.to_string(),
            row.succ_delta_pp.to_string(),
            row.succ_delta_pp_ci95.to_string(),
            optional(row.row.succ_p_val),
            row.succ_bias_q.to_string(),
            row.row.succ_var_ratio.to_string(),
            row.row.succ_var_n.to_string(),
            optional(row.row.succ_var_p_under),
            row.succ_var_q_under.to_string(),
            optional(row.row.succ_var_p_over),
            row.succ_var_q_over.to_string(),
            escape_field(&eligibility),
            row.precision.to_string(),
            row.verdict.to_string(),
        ];
        fields.join(",")
    }

    /// Generate CSV output as string
    pub fn to_csv(&self) -> String {
        let mut output = String::new();
        output.push_str(self.header());
        output.push('\n');

        for row in &self.rows {
            output.push_str(&Self::format_row(row));
            output.push('\n');
        }

        output
    }
}

/// CSV formatter for one comparison series, one line per domain value
#[derive(Debug)]
pub struct CsvSeriesOutput<'a> {
    series: &'a ComparisonSeries,
}

impl<'a> CsvSeriesOutput<'a> {
    pub fn new(series: &'a ComparisonSeries) -> Self {
        Self { series }
    }

    fn header(&self) -> String {
        let mut headers = vec!["value", "fair", "rigged"];

        if self.series.fair_gaussian.is_some() {
            headers.push("fair_gaussian");
            headers.push("rigged_gaussian");
        }

        if self.series.fair_band.is_some() {
            headers.push("fair_lower");
            headers.push("fair_upper");
        }

        headers.join(",")
    }

    /// Generate CSV output as string
    pub fn to_csv(&self) -> String {
        let s = self.series;
        let mut output = String::new();
        output.push_str(&self.header());
        output.push('\n');

        for (i, value) in s.domain.iter().enumerate() {
            let mut fields = vec![value.to_string(), s.fair[i].to_string(), s.rigged[i].to_string()];

            if let (Some(fg), Some(rg)) = (&s.fair_gaussian, &s.rigged_gaussian) {
                fields.push(fg[i].to_string());
                fields.push(rg[i].to_string());
            }

            if let Some(band) = &s.fair_band {
                fields.push(band.lower[i].to_string());
                fields.push(band.upper[i].to_string());
            }

            output.push_str(&fields.join(","));
            output.push('\n');
        }

        output
    }
}
