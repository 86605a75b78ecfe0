// Fair-vs-rigged outcome distribution analytics
//
// Turns raw outcome-length histograms (fail streaks, success streaks,
// cumulative cost) into probability mass, tail probability, percentile
// markers, a Gaussian overlay and a proportion confidence band.
//
// Every function here is pure; view, trim and cap settings are passed in
// through `ComparisonOptions` rather than held as state.

mod band;
mod compare;
mod histogram;
mod percentile;
mod series;


pub use band::{confidence_band, BandMethod, ConfidenceBand};
pub use compare::{compare, ComparisonOptions, ComparisonSeries, Metric, PercentileMarker, View};
pub use histogram::{AlignedPair, OutcomeHistogram};
pub use percentile::percentile;
pub use series::{gaussian_overlay, normalize, tail_transform, trim_range};
