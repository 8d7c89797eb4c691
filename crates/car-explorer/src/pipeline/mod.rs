//! Pipeline module.
//!
//! The enrichment pipeline and its progress reporting.

mod builder;
pub mod progress;

pub use builder::{EnrichmentResult, Pipeline, PipelineBuilder};
pub use progress::{ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate};
