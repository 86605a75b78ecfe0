// Fair-vs-rigged comparison pipeline for one metric

use super::band::{confidence_band, BandMethod, ConfidenceBand};
use super::histogram::{AlignedPair, OutcomeHistogram};
use super::percentile::percentile;
use super::series::{gaussian_overlay, normalize, tail_transform, trim_range};
use crate::config::DistributionConfig;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome statistic being compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Length of consecutive-failure runs
    #[value(name = "fail")]
    FailStreak,
    /// Length of consecutive-success runs
    #[value(name = "success")]
    SuccessStreak,
    /// Cumulative cost to reach the goal
    Cost,
}

impl Metric {
    pub fn default_view(&self) -> View {
        match self {
            Metric::Cost => View::Tail,
            Metric::FailStreak | Metric::SuccessStreak => View::Histogram,
        }
    }

    /// Quantiles marked when the caller does not ask for any
    pub fn default_percentiles(&self) -> Vec<f64> {
        match self {
            Metric::Cost => vec![0.99, 0.999],
            Metric::FailStreak | Metric::SuccessStreak => Vec::new(),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::FailStreak => write!(f, "fail streak"),
            Metric::SuccessStreak => write!(f, "success streak"),
            Metric::Cost => write!(f, "cost"),
        }
    }
}

/// How the series are presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum View {
    /// Probability mass per value, trimmed to the informative range
    #[value(name = "hist")]
    Histogram,
    /// P(value >= x)
    Tail,
}

/// Every knob of a comparison, passed explicitly
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonOptions {
    pub view: View,
    /// Trim threshold in percent; 0 disables
    pub min_prob_percent: f64,
    /// Value cap; 0 disables
    pub max_value: u64,
    pub gaussian: bool,
    pub band: BandMethod,
    pub band_z: f64,
    /// Quantiles in [0, 1] reported on the raw histograms
    pub percentiles: Vec<f64>,
}

impl ComparisonOptions {
    /// Options for `metric` with display defaults from `config`
    pub fn from_config(config: &DistributionConfig, metric: Metric) -> Self {
        Self {
            view: metric.default_view(),
            min_prob_percent: config.min_prob_percent,
            max_value: config.max_value,
            gaussian: config.gaussian,
            band: config.band,
            band_z: config.band_z,
            percentiles: metric.default_percentiles(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.min_prob_percent.is_finite() || self.min_prob_percent < 0.0 {
            return Err(format!(
                "min_prob_percent must be non-negative, got {}",
                self.min_prob_percent
            ));
        }

        if !self.band_z.is_finite() || self.band_z <= 0.0 {
            return Err(format!("band_z must be positive, got {}", self.band_z));
        }

        if let Some(q) = self.percentiles.iter().find(|q| !(0.0..=1.0).contains(*q)) {
            return Err(format!("percentile must be in [0, 1], got {}", q));
        }

        Ok(())
    }
}

/// Percentile of both raw histograms at one quantile
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PercentileMarker {
    pub quantile: f64,
    /// `None` when the fair histogram is empty
    pub fair: Option<u64>,
    pub rigged: Option<u64>,
}

/// Presentation-ready series for one metric
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonSeries {
    pub metric: Metric,
    pub view: View,
    pub domain: Vec<u64>,
    /// Percent per value (histogram view) or P(value >= x) in percent (tail view)
    pub fair: Vec<f64>,
    pub rigged: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fair_gaussian: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rigged_gaussian: Option<Vec<f64>>,
    /// Band around the fair series (histogram view only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fair_band: Option<ConfidenceBand>,
    pub markers: Vec<PercentileMarker>,
    pub fair_total: u64,
    pub rigged_total: u64,
}

/// Compare a fair and a rigged histogram of the same metric
///
/// The cap applies first; in the histogram view the trimmed range is
/// renormalized to 100% and the fair band uses the trimmed total. Percentile
/// markers always use the full, uncapped histograms.
pub fn compare(
    metric: Metric,
    fair: &OutcomeHistogram,
    rigged: &OutcomeHistogram,
    options: &ComparisonOptions,
) -> ComparisonSeries {
    let pair = AlignedPair::align(
        &fair.capped(options.max_value),
        &rigged.capped(options.max_value),
    );

    let markers = options
        .percentiles
        .iter()
        .map(|&q| PercentileMarker {
            quantile: q,
            fair: percentile(fair, q),
            rigged: percentile(rigged, q),
        })
        .collect();

    let mut series = match options.view {
        View::Histogram => histogram_view(metric, pair, options),
        View::Tail => tail_view(metric, pair),
    };
    series.markers = markers;

    tracing::debug!(
        metric = %metric,
        view = ?options.view,
        points = series.domain.len(),
        "built comparison series"
    );

    series
}

fn histogram_view(metric: Metric, pair: AlignedPair, options: &ComparisonOptions) -> ComparisonSeries {
    let span = trim_range(
        &normalize(&pair.fair),
        &normalize(&pair.rigged),
        options.min_prob_percent,
    );
    let pair = match span {
        Some((start, end)) => pair.slice(start, end),
        None => pair,
    };

    let fair_total: u64 = pair.fair.iter().sum();
    let rigged_total: u64 = pair.rigged.iter().sum();
    let fair = normalize(&pair.fair);
    let rigged = normalize(&pair.rigged);

    let (fair_gaussian, rigged_gaussian) = if options.gaussian {
        (
            Some(gaussian_overlay(&pair.domain, &fair)),
            Some(gaussian_overlay(&pair.domain, &rigged)),
        )
    } else {
        (None, None)
    };

    let fair_band = confidence_band(&pair.fair, fair_total, options.band, options.band_z);

    ComparisonSeries {
        metric,
        view: View::Histogram,
        domain: pair.domain,
        fair,
        rigged,
        fair_gaussian,
        rigged_gaussian,
        fair_band: Some(fair_band),
        markers: Vec::new(),
        fair_total,
        rigged_total,
    }
}

fn tail_view(metric: Metric, pair: AlignedPair) -> ComparisonSeries {
    ComparisonSeries {
        metric,
        view: View::Tail,
        fair: tail_transform(&normalize(&pair.fair)),
        rigged: tail_transform(&normalize(&pair.rigged)),
        fair_total: pair.fair.iter().sum(),
        rigged_total: pair.rigged.iter().sum(),
        domain: pair.domain,
        fair_gaussian: None,
        rigged_gaussian: None,
        fair_band: None,
        markers: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(view: View) -> ComparisonOptions {
        ComparisonOptions {
            view,
            min_prob_percent: 0.0,
            max_value: 0,
            gaussian: false,
            band: BandMethod::Normal,
            band_z: 1.96,
            percentiles: Vec::new(),
        }
    }

    #[test]
    fn test_default_views() {
        assert_eq!(Metric::Cost.default_view(), View::Tail);
        assert_eq!(Metric::FailStreak.default_view(), View::Histogram);
        assert_eq!(Metric::SuccessStreak.default_view(), View::Histogram);
    }

    #[test]
    fn test_from_config() {
        let config = DistributionConfig::default();
        let opts = ComparisonOptions::from_config(&config, Metric::Cost);
        assert_eq!(opts.view, View::Tail);
        assert_eq!(opts.percentiles, vec![0.99, 0.999]);
        assert_eq!(opts.max_value, 200);
        assert!(opts.validate().is_ok());

        let opts = ComparisonOptions::from_config(&config, Metric::FailStreak);
        assert!(opts.percentiles.is_empty());
    }

    #[test]
    fn test_validate_rejects_bad_quantile() {
        let mut opts = options(View::Tail);
        opts.percentiles = vec![0.5, 1.2];
        assert!(opts.validate().is_err());
    }

    #[test]
    fn test_tail_view_has_no_band_or_overlay() {
        let fair = OutcomeHistogram::from_pairs(vec![(1, 3), (2, 1)]);
        let mut opts = options(View::Tail);
        opts.gaussian = true;
        let series = compare(Metric::Cost, &fair, &fair, &opts);

        assert_eq!(series.fair, vec![100.0, 25.0]);
        assert!(series.fair_band.is_none());
        assert!(series.fair_gaussian.is_none());
    }

    #[test]
    fn test_histogram_view_has_band() {
        let fair = OutcomeHistogram::from_pairs(vec![(1, 3), (2, 1)]);
        let series = compare(Metric::FailStreak, &fair, &fair, &options(View::Histogram));
        let band = series.fair_band.unwrap();
        assert_eq!(band.len(), 2);
        assert!(series.fair_gaussian.is_none());
    }
}
