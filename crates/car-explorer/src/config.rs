//! Configuration types for enrichment and rendering.
//!
//! Uses the builder pattern; the whole config also round-trips through JSON so
//! it can be supplied as a file to the CLI.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Rounding applied to the odometer column after imputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RoundingMode {
    /// Ties go to the even neighbour (2.5 -> 2, 3.5 -> 4)
    #[default]
    HalfEven,
    /// Ties go away from zero (2.5 -> 3)
    HalfAwayFromZero,
}

impl RoundingMode {
    /// Round `value` to a whole number using this mode.
    pub fn round(self, value: f64) -> f64 {
        match self {
            Self::HalfEven => value.round_ties_even(),
            Self::HalfAwayFromZero => value.round(),
        }
    }
}

/// Configuration for the explorer.
///
/// Use [`DashboardConfig::builder()`] to create a validated configuration.
///
/// # Example
///
/// ```rust,ignore
/// use car_explorer::config::{DashboardConfig, RoundingMode};
///
/// let config = DashboardConfig::builder()
///     .reference_year(2025)
///     .odometer_rounding(RoundingMode::HalfAwayFromZero)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Year that vehicle age is measured from.
    /// Default: 2024
    pub reference_year: i32,

    /// Manufacturer assigned to rows whose `model` has no tokens.
    /// Default: "unknown"
    pub unknown_manufacturer: String,

    /// Rounding used for the odometer column.
    /// Default: HalfEven
    pub odometer_rounding: RoundingMode,

    /// Price above which the "remove high sales" toggles drop listings.
    /// Default: 100000.0
    pub high_price_threshold: f64,

    /// Number of equal-width bins in the price histogram.
    /// Default: 30
    pub histogram_bins: usize,

    /// Number of rows included in the filtered table preview.
    /// Default: 20
    pub preview_rows: usize,

    /// Directory that dashboard reports are written to.
    /// Default: "output"
    pub output_dir: PathBuf,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            reference_year: 2024,
            unknown_manufacturer: "unknown".to_string(),
            odometer_rounding: RoundingMode::default(),
            high_price_threshold: 100_000.0,
            histogram_bins: 30,
            preview_rows: 20,
            output_dir: PathBuf::from("output"),
        }
    }
}

impl DashboardConfig {
    /// Create a new configuration builder.
    pub fn builder() -> DashboardConfigBuilder {
        DashboardConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(1886..=9999).contains(&self.reference_year) {
            return Err(ConfigValidationError::InvalidReferenceYear(
                self.reference_year,
            ));
        }

        if !self.high_price_threshold.is_finite() || self.high_price_threshold <= 0.0 {
            return Err(ConfigValidationError::InvalidPriceThreshold(
                self.high_price_threshold,
            ));
        }

        if self.histogram_bins == 0 {
            return Err(ConfigValidationError::InvalidCount {
                field: "histogram_bins".to_string(),
                value: self.histogram_bins,
            });
        }

        if self.preview_rows == 0 {
            return Err(ConfigValidationError::InvalidCount {
                field: "preview_rows".to_string(),
                value: self.preview_rows,
            });
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid reference year: {0} (must be between 1886 and 9999)")]
    InvalidReferenceYear(i32),

    #[error("Invalid high price threshold: {0} (must be a positive number)")]
    InvalidPriceThreshold(f64),

    #[error("Invalid value for '{field}': {value} (must be at least 1)")]
    InvalidCount { field: String, value: usize },
}

/// Builder for [`DashboardConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct DashboardConfigBuilder {
    reference_year: Option<i32>,
    unknown_manufacturer: Option<String>,
    odometer_rounding: Option<RoundingMode>,
    high_price_threshold: Option<f64>,
    histogram_bins: Option<usize>,
    preview_rows: Option<usize>,
    output_dir: Option<PathBuf>,
}

impl DashboardConfigBuilder {
    /// Start from an existing configuration, e.g. one read from a file.
    pub fn from_config(config: DashboardConfig) -> Self {
        Self {
            reference_year: Some(config.reference_year),
            unknown_manufacturer: Some(config.unknown_manufacturer),
            odometer_rounding: Some(config.odometer_rounding),
            high_price_threshold: Some(config.high_price_threshold),
            histogram_bins: Some(config.histogram_bins),
            preview_rows: Some(config.preview_rows),
            output_dir: Some(config.output_dir),
        }
    }

    /// Set the year vehicle age is measured from.
    pub fn reference_year(mut self, year: i32) -> Self {
        self.reference_year = Some(year);
        self
    }

    /// Set the manufacturer label used for malformed `model` values.
    pub fn unknown_manufacturer(mut self, label: impl Into<String>) -> Self {
        self.unknown_manufacturer = Some(label.into());
        self
    }

    /// Set the odometer rounding mode.
    pub fn odometer_rounding(mut self, mode: RoundingMode) -> Self {
        self.odometer_rounding = Some(mode);
        self
    }

    /// Set the price cap used by the "remove high sales" toggles.
    pub fn high_price_threshold(mut self, threshold: f64) -> Self {
        self.high_price_threshold = Some(threshold);
        self
    }

    /// Set the number of histogram bins.
    pub fn histogram_bins(mut self, bins: usize) -> Self {
        self.histogram_bins = Some(bins);
        self
    }

    /// Set the number of rows in the table preview.
    pub fn preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = Some(rows);
        self
    }

    /// Set the output directory for reports.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `DashboardConfig` or an error if validation fails.
    pub fn build(self) -> Result<DashboardConfig, ConfigValidationError> {
        let defaults = DashboardConfig::default();
        let config = DashboardConfig {
            reference_year: self.reference_year.unwrap_or(defaults.reference_year),
            unknown_manufacturer: self
                .unknown_manufacturer
                .unwrap_or(defaults.unknown_manufacturer),
            odometer_rounding: self.odometer_rounding.unwrap_or_default(),
            high_price_threshold: self
                .high_price_threshold
                .unwrap_or(defaults.high_price_threshold),
            histogram_bins: self.histogram_bins.unwrap_or(defaults.histogram_bins),
            preview_rows: self.preview_rows.unwrap_or(defaults.preview_rows),
            output_dir: self.output_dir.unwrap_or(defaults.output_dir),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DashboardConfig::default();
        assert_eq!(config.reference_year, 2024);
        assert_eq!(config.unknown_manufacturer, "unknown");
        assert_eq!(config.odometer_rounding, RoundingMode::HalfEven);
        assert_eq!(config.high_price_threshold, 100_000.0);
        assert_eq!(config.histogram_bins, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = DashboardConfig::builder()
            .reference_year(2030)
            .odometer_rounding(RoundingMode::HalfAwayFromZero)
            .histogram_bins(10)
            .unknown_manufacturer("n/a")
            .build()
            .unwrap();

        assert_eq!(config.reference_year, 2030);
        assert_eq!(config.odometer_rounding, RoundingMode::HalfAwayFromZero);
        assert_eq!(config.histogram_bins, 10);
        assert_eq!(config.unknown_manufacturer, "n/a");
        assert_eq!(config.preview_rows, 20);
    }

    #[test]
    fn test_validation_rejects_zero_bins() {
        let result = DashboardConfig::builder().histogram_bins(0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidCount { .. }
        ));
    }

    #[test]
    fn test_validation_rejects_bad_threshold() {
        assert!(
            DashboardConfig::builder()
                .high_price_threshold(-1.0)
                .build()
                .is_err()
        );
        assert!(
            DashboardConfig::builder()
                .high_price_threshold(f64::NAN)
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_rounding_modes_differ_on_ties() {
        assert_eq!(RoundingMode::HalfEven.round(2.5), 2.0);
        assert_eq!(RoundingMode::HalfEven.round(3.5), 4.0);
        assert_eq!(RoundingMode::HalfAwayFromZero.round(2.5), 3.0);
        assert_eq!(RoundingMode::HalfEven.round(2.4), 2.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "reference_year": 2025, "odometer_rounding": "HalfAwayFromZero" }"#;
        let config: DashboardConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.reference_year, 2025);
        assert_eq!(config.odometer_rounding, RoundingMode::HalfAwayFromZero);
        assert_eq!(config.histogram_bins, 30);
        assert_eq!(config.unknown_manufacturer, "unknown");
    }

    #[test]
    fn test_builder_from_config_keeps_values() {
        let base = DashboardConfig::builder().preview_rows(5).build().unwrap();
        let config = DashboardConfigBuilder::from_config(base)
            .reference_year(2020)
            .build()
            .unwrap();

        assert_eq!(config.preview_rows, 5);
        assert_eq!(config.reference_year, 2020);
    }
}
