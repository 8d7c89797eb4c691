//! Progress reporting for the enrichment pipeline.
//!
//! # Example
//!
//! ```rust,ignore
//! use car_explorer::Pipeline;
//!
//! let result = Pipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .process(df)?;
//! ```

use serde::{Deserialize, Serialize};

/// Steps of the enrichment pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Split `model` to get `manufacturer`
    DeriveManufacturer,
    /// Default missing `is_4wd` to 0
    #[serde(rename = "fill_4wd")]
    Fill4wd,
    /// Median `model_year` per model
    FillModelYear,
    /// Median `cylinders` per model
    FillCylinders,
    /// Pair the imputed year with the model
    BuildCompositeKey,
    /// Mean odometer per (year, model), then rounding
    FillOdometer,
    /// Age from the reference year
    DeriveAge,
    /// Bucket age into categories
    DeriveAgeCategory,
    /// Every step ran
    Complete,
    /// A step returned an error
    Failed,
}

impl PipelineStage {
    /// The eight working stages in the order the pipeline runs them.
    pub const ORDERED: [PipelineStage; 8] = [
        PipelineStage::DeriveManufacturer,
        PipelineStage::Fill4wd,
        PipelineStage::FillModelYear,
        PipelineStage::FillCylinders,
        PipelineStage::BuildCompositeKey,
        PipelineStage::FillOdometer,
        PipelineStage::DeriveAge,
        PipelineStage::DeriveAgeCategory,
    ];

    /// Label used in progress log lines.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::DeriveManufacturer => "Deriving Manufacturer",
            Self::Fill4wd => "Filling 4WD Flag",
            Self::FillModelYear => "Imputing Model Year",
            Self::FillCylinders => "Imputing Cylinders",
            Self::BuildCompositeKey => "Building Year/Model Keys",
            Self::FillOdometer => "Imputing Odometer",
            Self::DeriveAge => "Deriving Age",
            Self::DeriveAgeCategory => "Categorizing Age",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Share of overall progress this stage accounts for.
    ///
    /// The grouped fills dominate the runtime; weights of the working stages
    /// sum to 1.0.
    pub fn weight(&self) -> f32 {
        match self {
            Self::DeriveManufacturer => 0.10,
            Self::Fill4wd => 0.05,
            Self::FillModelYear => 0.20,
            Self::FillCylinders => 0.20,
            Self::BuildCompositeKey => 0.10,
            Self::FillOdometer => 0.25,
            Self::DeriveAge => 0.05,
            Self::DeriveAgeCategory => 0.05,
            Self::Complete | Self::Failed => 0.0,
        }
    }

    /// Cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Complete => 1.0,
            Self::Failed => 0.0,
            stage => Self::ORDERED
                .iter()
                .take_while(|s| *s != stage)
                .map(PipelineStage::weight)
                .sum(),
        }
    }
}

/// A progress update emitted by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub stage: PipelineStage,
    /// Fraction of the whole run, in [0, 1]
    pub progress: f32,
    /// Fraction of `stage`, in [0, 1]
    pub stage_progress: f32,
    pub message: String,
}

impl ProgressUpdate {
    pub fn new(stage: PipelineStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let progress = stage.base_progress() + (stage.weight() * stage_progress);
        Self {
            stage,
            progress: progress.clamp(0.0, 1.0),
            stage_progress: stage_progress.clamp(0.0, 1.0),
            message: message.into(),
        }
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self {
            stage: PipelineStage::Complete,
            progress: 1.0,
            stage_progress: 1.0,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            stage: PipelineStage::Failed,
            progress: 0.0,
            stage_progress: 0.0,
            message: message.into(),
        }
    }
}

/// Receives progress updates from the pipeline.
///
/// Implementations must be `Send + Sync` so a host can run the pipeline on a
/// worker thread and forward updates elsewhere.
pub trait ProgressReporter: Send + Sync {
    /// Called at the start and end of every stage.
    fn report(&self, update: ProgressUpdate);
}

/// [`ProgressReporter`] backed by a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);
