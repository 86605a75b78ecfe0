// Configuration for audit runs and distribution comparisons
//
// Every engine call takes its settings explicitly; this struct only carries
// defaults loaded from a TOML file or built in code.

use crate::distribution::BandMethod;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings for the flagged-count significance test and the audit report
///
/// # Example
/// ```
/// use gacha_audit::config::AuditConfig;
///
/// let config = AuditConfig::default();
/// assert_eq!(config.count_alpha, 0.01);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Nominal per-row flag rate under the null hypothesis
    ///
    /// A row counts as flagged for the count test when its raw
    /// `succ_var_p_under` is below this value and its variance ratio is
    /// below `count_flag_ratio`.
    pub count_alpha: f64,

    /// Variance ratio below which a row counts toward the flagged total
    pub count_flag_ratio: f64,

    /// Tail probability below which the flagged count is strong evidence
    pub strong_evidence_below: f64,

    /// Tail probability below which the flagged count is moderate evidence
    pub moderate_evidence_below: f64,

    /// Number of most-suspicious rows listed in the report
    pub smoking_gun_count: usize,

    /// Derive missing `succ_var_p_under` / `succ_var_p_over` from the
    /// variance ratio with a chi-square test
    pub derive_missing_dispersion: bool,

    /// Defaults for fair-vs-rigged distribution comparisons
    pub distribution: DistributionConfig,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            count_alpha: 0.01,
            count_flag_ratio: 0.70,
            strong_evidence_below: 1e-6,
            moderate_evidence_below: 1e-3,
            smoking_gun_count: 3,
            derive_missing_dispersion: false,
            distribution: DistributionConfig::default(),
        }
    }
}

/// Display defaults for distribution comparisons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistributionConfig {
    /// Trim the histogram view to bins where either world reaches this
    /// probability (percent). 0 disables trimming.
    pub min_prob_percent: f64,

    /// Drop domain values above this. 0 disables the cap.
    pub max_value: u64,

    /// Overlay a moment-matched Gaussian on the histogram view
    pub gaussian: bool,

    pub band: BandMethod,

    /// z multiplier for the confidence band (1.96 = 95%)
    pub band_z: f64,
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            min_prob_percent: 0.1,
            max_value: 200,
            gaussian: false,
            band: BandMethod::Normal,
            band_z: 1.96,
        }
    }
}

impl AuditConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse TOML")?;
        config.validate().map_err(|e| anyhow::anyhow!(e))?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.count_alpha) {
            return Err(format!(
                "count_alpha must be in [0, 1], got {}",
                self.count_alpha
            ));
        }

        if !self.count_flag_ratio.is_finite() || self.count_flag_ratio < 0.0 {
            return Err(format!(
                "count_flag_ratio must be non-negative, got {}",
                self.count_flag_ratio
            ));
        }

        if !(0.0..=1.0).contains(&self.strong_evidence_below)
            || !(0.0..=1.0).contains(&self.moderate_evidence_below)
        {
            return Err("evidence cut-offs must be in [0, 1]".to_string());
        }

        if self.strong_evidence_below > self.moderate_evidence_below {
            return Err(format!(
                "strong_evidence_below ({}) must not exceed moderate_evidence_below ({})",
                self.strong_evidence_below, self.moderate_evidence_below
            ));
        }

        self.distribution.validate()
    }
}

impl DistributionConfig {
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

        Ok(())
    }
}
