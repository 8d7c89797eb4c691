//! The enrichment pipeline.
//!
//! Runs the imputation and derivation steps over a freshly loaded listing
//! table in a fixed order. Later steps read columns that earlier steps fill,
//! so the order is not configurable.

use crate::config::DashboardConfig;
use crate::derive::{derive_age, derive_age_category, derive_manufacturer};
use crate::error::{ExplorerError, Result};
use crate::imputers::{
    FillOutcome, composite_keys, fill_4wd, fill_by_group_median, fill_odometer_by_model_year,
};
use crate::pipeline::progress::{
    ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate,
};
use crate::schema::{
    AGE, AGE_CATEGORY, CYLINDERS, IS_4WD, MANUFACTURER, MODEL, MODEL_YEAR, ODOMETER,
};
use crate::types::{ActionType, ColumnFill, EnrichmentAction, EnrichmentSummary};
use polars::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Enriched table plus the audit trail of how it was produced.
#[derive(Debug, Clone)]
pub struct EnrichmentResult {
    /// The listing table with every gap filled that could be and the derived
    /// columns appended.
    pub data: DataFrame,
    pub summary: EnrichmentSummary,
}

/// The enrichment pipeline.
///
/// Use [`Pipeline::builder()`] to create one.
///
/// # Example
///
/// ```rust,ignore
/// use car_explorer::{DashboardConfig, Pipeline};
///
/// let result = Pipeline::builder()
///     .config(DashboardConfig::builder().reference_year(2025).build()?)
///     .build()?
///     .process(df)?;
///
/// println!("filled {} cells", result.summary.total_filled());
/// ```
pub struct Pipeline {
    config: DashboardConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

// Hosts may move the pipeline to a worker thread
static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// The configuration this pipeline runs with.
    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Enrich a listing table.
    ///
    /// The frame must carry the required listing columns; see
    /// [`validate_columns`](crate::schema::validate_columns).
    pub fn process(&self, df: DataFrame) -> Result<EnrichmentResult> {
        match self.process_internal(df) {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete("Enrichment completed"));
                Ok(result)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Enrichment error: {}", e);
                Err(e)
            }
        }
    }

    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn start_stage(&self, stage: PipelineStage) {
        info!("{}...", stage.display_name());
        self.report_progress(ProgressUpdate::new(
            stage,
            0.0,
            format!("{}...", stage.display_name()),
        ));
    }

    fn finish_stage(&self, stage: PipelineStage, message: impl Into<String>) {
        self.report_progress(ProgressUpdate::new(stage, 1.0, message));
    }

    fn process_internal(&self, mut df: DataFrame) -> Result<EnrichmentResult> {
        let start_time = Instant::now();
        info!(rows = df.height(), "Starting enrichment pipeline");

        let mut summary = EnrichmentSummary::new();
        summary.rows = df.height();

        // Step 1: manufacturer
        self.start_stage(PipelineStage::DeriveManufacturer);
        let malformed = derive_manufacturer(&mut df, &self.config.unknown_manufacturer)
            .map_err(|e| derivation_failed(MANUFACTURER, e))?;
        summary.malformed_models = malformed;
        summary.add_action(EnrichmentAction::new(
            ActionType::ColumnDerived,
            MANUFACTURER,
            "First token of the model name",
        ));
        if malformed > 0 {
            summary.add_warning(format!(
                "{} rows have no model name; manufacturer set to '{}'",
                malformed, self.config.unknown_manufacturer
            ));
        }
        self.finish_stage(PipelineStage::DeriveManufacturer, "Manufacturer derived");

        // Step 2: is_4wd
        self.start_stage(PipelineStage::Fill4wd);
        let filled = fill_4wd(&mut df).map_err(|e| imputation_failed(IS_4WD, e))?;
        let mut fill = ColumnFill::new(IS_4WD, "constant 0");
        fill.missing_before = filled;
        summary.add_column_fill(fill);
        summary.add_action(EnrichmentAction::new(
            ActionType::DefaultApplied,
            IS_4WD,
            format!("Set {} missing values to 0", filled),
        ));
        self.finish_stage(PipelineStage::Fill4wd, format!("Filled {} values", filled));

        // Steps 3 and 4: median per model
        for (stage, column) in [
            (PipelineStage::FillModelYear, MODEL_YEAR),
            (PipelineStage::FillCylinders, CYLINDERS),
        ] {
            self.start_stage(stage);
            let outcome = fill_by_group_median(&mut df, column, MODEL)
                .map_err(|e| imputation_failed(column, e))?;
            self.record_fill(&mut summary, column, "median by model", outcome);
            self.finish_stage(stage, format!("Filled {} values", outcome.filled()));
        }

        // Step 5: keys from the imputed model_year
        self.start_stage(PipelineStage::BuildCompositeKey);
        let keys = composite_keys(&df).map_err(|e| imputation_failed(ODOMETER, e))?;
        self.finish_stage(
            PipelineStage::BuildCompositeKey,
            format!("Built {} keys", keys.len()),
        );

        // Step 6: odometer
        self.start_stage(PipelineStage::FillOdometer);
        let outcome = fill_odometer_by_model_year(&mut df, &keys, self.config.odometer_rounding)
            .map_err(|e| imputation_failed(ODOMETER, e))?;
        self.record_fill(&mut summary, ODOMETER, "mean by model year and model", outcome);
        summary.add_action(EnrichmentAction::new(
            ActionType::ValueRounded,
            ODOMETER,
            format!("Rounded to whole units ({:?})", self.config.odometer_rounding),
        ));
        self.finish_stage(
            PipelineStage::FillOdometer,
            format!("Filled {} values", outcome.filled()),
        );

        // Step 7: age
        self.start_stage(PipelineStage::DeriveAge);
        derive_age(&mut df, self.config.reference_year).map_err(|e| derivation_failed(AGE, e))?;
        summary.add_action(EnrichmentAction::new(
            ActionType::ColumnDerived,
            AGE,
            format!("{} minus model year", self.config.reference_year),
        ));
        self.finish_stage(PipelineStage::DeriveAge, "Age derived");

        // Step 8: age category
        self.start_stage(PipelineStage::DeriveAgeCategory);
        derive_age_category(&mut df).map_err(|e| derivation_failed(AGE_CATEGORY, e))?;
        summary.add_action(EnrichmentAction::new(
            ActionType::ColumnDerived,
            AGE_CATEGORY,
            "Age bucketed into <5, 5-10, 10-20, >20",
        ));
        self.finish_stage(PipelineStage::DeriveAgeCategory, "Age categorized");

        summary.duration_ms = start_time.elapsed().as_millis() as u64;
        info!(
            duration_ms = summary.duration_ms,
            filled = summary.total_filled(),
            unfilled = summary.total_unfilled(),
            "Enrichment complete"
        );

        Ok(EnrichmentResult { data: df, summary })
    }

    fn record_fill(
        &self,
        summary: &mut EnrichmentSummary,
        column: &str,
        method: &str,
        outcome: FillOutcome,
    ) {
        let mut fill = ColumnFill::new(column, method);
        fill.missing_before = outcome.missing_before;
        fill.missing_after = outcome.missing_after;

        summary.add_action(EnrichmentAction::new(
            ActionType::ValueImputed,
            column,
            format!("Filled {} missing values with the {}", outcome.filled(), method),
        ));
        if outcome.missing_after > 0 {
            warn!(
                column,
                unfilled = outcome.missing_after,
                "No group statistic for some rows; values left missing"
            );
            summary.add_warning(format!(
                "{} values in '{}' left missing (no statistic for their group)",
                outcome.missing_after, column
            ));
        }
        summary.add_column_fill(fill);
    }
}

fn imputation_failed(column: &str, e: anyhow::Error) -> ExplorerError {
    ExplorerError::ImputationFailed {
        column: column.to_string(),
        reason: format!("{e:#}"),
    }
}

fn derivation_failed(column: &str, e: anyhow::Error) -> ExplorerError {
    ExplorerError::DerivationFailed {
        column: column.to_string(),
        reason: format!("{e:#}"),
    }
}

/// Builder for creating a [`Pipeline`] instance.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<DashboardConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the configuration.
    pub fn config(mut self, config: DashboardConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// Shorthand for [`progress_reporter`](Self::progress_reporter) with a
    /// [`ClosureProgressReporter`].
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns [`ExplorerError::InvalidConfig`] if the configuration is invalid.
    pub fn build(self) -> Result<Pipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Pipeline {
            config,
            progress_reporter: self.progress_reporter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::*;
    use crate::utils::{numeric_values, string_values};
    use std::sync::Mutex;

    fn listings() -> DataFrame {
        df![
            PRICE => [Some(9400.0), Some(25500.0), Some(5500.0), Some(1500.0), Some(14900.0)],
            MODEL_YEAR => [Some(2011.0), None, Some(2013.0), Some(2003.0), Some(2013.0)],
            MODEL => ["bmw x5", "ford f-150", "hyundai sonata", "ford f-150", "hyundai sonata"],
            CONDITION => ["good", "good", "like new", "fair", "excellent"],
            CYLINDERS => [Some(6.0), Some(6.0), Some(4.0), Some(8.0), None],
            FUEL => ["gas", "gas", "gas", "gas", "gas"],
            ODOMETER => [Some(145000.0), Some(88705.0), Some(110000.0), Some(161397.0), None],
            TRANSMISSION => ["automatic", "automatic", "automatic", "automatic", "automatic"],
            TYPE => ["SUV", "pickup", "sedan", "pickup", "sedan"],
            PAINT_COLOR => [None, Some("white"), Some("red"), None, Some("black")],
            IS_4WD => [Some(1.0), Some(1.0), None, None, None],
            DAYS_LISTED => [19.0, 50.0, 79.0, 9.0, 28.0],
        ]
        .unwrap()
    }

    #[test]
    fn test_pipeline_builder_default() {
        let pipeline = Pipeline::builder().build().unwrap();
        assert_eq!(pipeline.config().reference_year, 2024);
        assert!(pipeline.progress_reporter.is_none());
    }

    #[test]
    fn test_pipeline_builder_rejects_invalid_config() {
        let config = DashboardConfig {
            histogram_bins: 0,
            ..DashboardConfig::default()
        };
        let err = Pipeline::builder().config(config).build().err().unwrap();

        assert!(matches!(err, ExplorerError::InvalidConfig(_)));
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }

    #[test]
    fn test_process_adds_derived_columns() {
        let result = Pipeline::builder()
            .build()
            .unwrap()
            .process(listings())
            .unwrap();
        let df = &result.data;

        assert_eq!(df.height(), 5);
        for column in [MANUFACTURER, AGE, AGE_CATEGORY] {
            assert!(df.column(column).is_ok(), "{column}");
        }
        assert_eq!(
            string_values(df, MANUFACTURER).unwrap()[1].as_deref(),
            Some("ford")
        );
        assert_eq!(df.column(IS_4WD).unwrap().null_count(), 0);
        assert_eq!(df.column(MODEL_YEAR).unwrap().null_count(), 0);
        assert_eq!(df.column(CYLINDERS).unwrap().null_count(), 0);
    }

    #[test]
    fn test_process_records_summary() {
        let result = Pipeline::builder()
            .build()
            .unwrap()
            .process(listings())
            .unwrap();
        let summary = &result.summary;

        assert_eq!(summary.rows, 5);
        assert_eq!(summary.malformed_models, 0);
        assert_eq!(summary.column_fill(IS_4WD).unwrap().filled(), 3);
        assert_eq!(summary.column_fill(MODEL_YEAR).unwrap().filled(), 1);
        assert_eq!(summary.column_fill(CYLINDERS).unwrap().filled(), 1);
        assert_eq!(summary.column_fill(ODOMETER).unwrap().filled(), 1);
        assert_eq!(summary.total_unfilled(), 0);
    }

    #[test]
    fn test_odometer_keys_use_imputed_year() {
        // The undated sonata becomes a 2012 car (median year). Its odometer is
        // the only value in the (2012, sonata) group, so the 2012 row with a
        // null odometer can be filled only if keys are built after the year fill.
        let df = df![
            PRICE => [1.0, 2.0, 3.0, 4.0],
            MODEL_YEAR => [Some(2011.0), Some(2013.0), None, Some(2012.0)],
            MODEL => ["hyundai sonata", "hyundai sonata", "hyundai sonata", "hyundai sonata"],
            CONDITION => ["good", "good", "good", "good"],
            CYLINDERS => [4.0, 4.0, 4.0, 4.0],
            FUEL => ["gas", "gas", "gas", "gas"],
            ODOMETER => [Some(10.0), Some(20.0), Some(50_000.0), None],
            TRANSMISSION => ["automatic", "automatic", "automatic", "automatic"],
            TYPE => ["sedan", "sedan", "sedan", "sedan"],
            PAINT_COLOR => ["red", "red", "red", "red"],
            IS_4WD => [0.0, 0.0, 0.0, 0.0],
            DAYS_LISTED => [1.0, 2.0, 3.0, 4.0],
        ]
        .unwrap();

        let result = Pipeline::builder().build().unwrap().process(df).unwrap();

        assert_eq!(
            numeric_values(&result.data, MODEL_YEAR).unwrap()[2],
            Some(2012.0)
        );
        assert_eq!(
            numeric_values(&result.data, ODOMETER).unwrap()[3],
            Some(50_000.0)
        );
    }

    #[test]
    fn test_missing_column_maps_to_imputation_error() {
        let df = listings().drop(CYLINDERS).unwrap();

        let err = Pipeline::builder().build().unwrap().process(df).unwrap_err();

        match err {
            ExplorerError::ImputationFailed { column, .. } => assert_eq!(column, CYLINDERS),
            other => panic!("expected ImputationFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_progress_stages_run_in_order() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let stages_clone = stages.clone();

        Pipeline::builder()
            .on_progress(move |update| {
                if update.stage_progress == 0.0 {
                    stages_clone.lock().unwrap().push(update.stage);
                }
            })
            .build()
            .unwrap()
            .process(listings())
            .unwrap();

        let seen = stages.lock().unwrap().clone();
        assert_eq!(seen, PipelineStage::ORDERED.to_vec());
    }

    #[test]
    fn test_failure_is_reported() {
        let last = Arc::new(Mutex::new(None));
        let last_clone = last.clone();
        let df = listings().drop(MODEL).unwrap();

        let result = Pipeline::builder()
            .on_progress(move |update| {
                *last_clone.lock().unwrap() = Some(update.stage);
            })
            .build()
            .unwrap()
            .process(df);

        assert!(result.is_err());
        assert_eq!(*last.lock().unwrap(), Some(PipelineStage::Failed));
    }
}
