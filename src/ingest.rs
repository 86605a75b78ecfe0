//! JSON ingestion of summary rows and simulation histograms
//!
//! A malformed row or histogram is rejected on its own and recorded in the
//! batch; only a structurally wrong document (not an array / not an object)
//! fails the whole load.

use crate::audit::DispersionPValues;
use crate::distribution::{Metric, OutcomeHistogram};
use crate::error::{AuditError, Result};
use crate::row::SummaryRow;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An input item that was dropped, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub item: String,
    pub reason: String,
}

impl From<AuditError> for Rejection {
    fn from(err: AuditError) -> Self {
        match err {
            AuditError::InputShape { item, reason } => Rejection { item, reason },
            other => Rejection {
                item: "input".to_string(),
                reason: other.to_string(),
            },
        }
    }
}

/// Rows that parsed, plus the ones that did not
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowBatch {
    pub rows: Vec<SummaryRow>,
    pub rejected: Vec<Rejection>,
}

/// Parse a JSON array of summary rows
///
/// When `derive_dispersion` is set, rows missing `succ_var_p_under` or
/// `succ_var_p_over` get them from a chi-square test on the variance ratio.
///
/// # Example
/// ```
/// use gacha_audit::ingest::parse_rows;
///
/// let json = r#"[
///   {"tier": 17, "flag": "ON", "total_n": 2000000, "succ_z": 0.3,
///    "succ_var_ratio": 0.9, "succ_var_n": 12},
///   {"tier": 18, "flag": "ON"}
/// ]"#;
/// let batch = parse_rows(json, false).unwrap();
/// assert_eq!(batch.rows.len(), 1);
/// assert_eq!(batch.rejected.len(), 1);
/// ```
pub fn parse_rows(json: &str, derive_dispersion: bool) -> Result<RowBatch> {
    let value: Value = serde_json::from_str(json)?;
    rows_from_value(value, derive_dispersion)
}

/// Same as [`parse_rows`], starting from an already-parsed document
pub fn rows_from_value(value: Value, derive_dispersion: bool) -> Result<RowBatch> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(AuditError::input_shape(
                "rows",
                format!("expected a JSON array, got {}", kind_of(&other)),
            ))
        }
    };

    let mut batch = RowBatch::default();
    for (index, item) in items.into_iter().enumerate() {
        match parse_row(index, item) {
            Ok(row) if derive_dispersion => batch.rows.push(fill_dispersion(row)),
            Ok(row) => batch.rows.push(row),
            Err(err) => {
                tracing::warn!(%err, "rejected row");
                batch.rejected.push(err.into());
            }
        }
    }

    tracing::debug!(
        accepted = batch.rows.len(),
        rejected = batch.rejected.len(),
        "ingested rows"
    );
    Ok(batch)
}

fn parse_row(index: usize, item: Value) -> Result<SummaryRow> {
    let item_name = format!("row {}", index);
    let row: SummaryRow =
        serde_json::from_value(item).map_err(|e| AuditError::input_shape(&item_name, e))?;
    row.validate()
        .map_err(|e| AuditError::input_shape(&item_name, e))?;
    Ok(row)
}

/// Fill missing dispersion p-values from the variance ratio
pub fn fill_dispersion(mut row: SummaryRow) -> SummaryRow {
    if row.succ_var_p_under.is_some() && row.succ_var_p_over.is_some() {
        return row;
    }

    let derived = DispersionPValues::from_ratio(row.succ_var_ratio, row.succ_var_n);
    row.succ_var_p_under.get_or_insert(derived.under);
    row.succ_var_p_over.get_or_insert(derived.over);
    row
}

/// Fair and rigged histograms for every metric in a simulation file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationPair {
    pub fair: WorldHistograms,
    pub rigged: WorldHistograms,
    pub rejected: Vec<Rejection>,
}

/// One world's histograms; a rejected or absent histogram is left empty
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldHistograms {
    pub fail_streak: OutcomeHistogram,
    pub success_streak: OutcomeHistogram,
    pub cost: OutcomeHistogram,
}

impl WorldHistograms {
    pub fn get(&self, metric: Metric) -> &OutcomeHistogram {
        match metric {
            Metric::FailStreak => &self.fail_streak,
            Metric::SuccessStreak => &self.success_streak,
            Metric::Cost => &self.cost,
        }
    }
}

impl SimulationPair {
    pub fn histograms(&self, metric: Metric) -> (&OutcomeHistogram, &OutcomeHistogram) {
        (self.fair.get(metric), self.rigged.get(metric))
    }
}

/// JSON key holding each metric's histogram
fn histogram_key(metric: Metric) -> &'static str {
    match metric {
        Metric::FailStreak => "histogram",
        Metric::SuccessStreak => "s_histogram",
        Metric::Cost => "m_histogram",
    }
}

/// Parse `{ "fair": {...}, "rigged": {...} }` simulation output
pub fn parse_simulation(json: &str) -> Result<SimulationPair> {
    let value: Value = serde_json::from_str(json)?;
    simulation_from_value(&value)
}

pub fn simulation_from_value(value: &Value) -> Result<SimulationPair> {
    let root = value.as_object().ok_or_else(|| {
        AuditError::input_shape(
            "simulation",
            format!("expected a JSON object, got {}", kind_of(value)),
        )
    })?;

    let mut pair = SimulationPair::default();
    for (world_name, world) in [("fair", &mut pair.fair), ("rigged", &mut pair.rigged)] {
        let Some(world_value) = root.get(world_name) else {
            pair.rejected.push(Rejection {
                item: world_name.to_string(),
                reason: "missing world".to_string(),
            });
            continue;
        };

        for metric in [Metric::FailStreak, Metric::SuccessStreak, Metric::Cost] {
            let key = histogram_key(metric);
            let Some(entries) = world_value.get(key) else {
                continue;
            };

            let item = format!("{}.{}", world_name, key);
            match parse_histogram(&item, entries) {
                Ok(histogram) => match metric {
                    Metric::FailStreak => world.fail_streak = histogram,
                    Metric::SuccessStreak => world.success_streak = histogram,
                    Metric::Cost => world.cost = histogram,
                },
                Err(err) => {
                    tracing::warn!(%err, "rejected histogram");
                    pair.rejected.push(err.into());
                }
            }
        }
    }

    Ok(pair)
}

#[derive(Deserialize)]
struct RawBin {
    x: f64,
    y: f64,
}

/// Parse a list of `{ "x": value, "y": count }` entries
///
/// Values and counts must be non-negative whole numbers.
pub fn parse_histogram(item: &str, entries: &Value) -> Result<OutcomeHistogram> {
    let bins: Vec<RawBin> =
        serde_json::from_value(entries.clone()).map_err(|e| AuditError::input_shape(item, e))?;

    let mut pairs = Vec::with_capacity(bins.len());
    for bin in bins {
        let value = whole_number(bin.x)
            .ok_or_else(|| AuditError::input_shape(item, format!("bad value {}", bin.x)))?;
        let count = whole_number(bin.y)
            .ok_or_else(|| AuditError::input_shape(item, format!("bad count {}", bin.y)))?;
        pairs.push((value, count));
    }

    Ok(OutcomeHistogram::from_pairs(pairs))
}

fn whole_number(x: f64) -> Option<u64> {
    if x.is_finite() && x >= 0.0 && x.fract() == 0.0 && x <= u64::MAX as f64 {
        Some(x as u64)
    } else {
        None
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
