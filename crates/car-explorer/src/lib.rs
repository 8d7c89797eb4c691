//! Used-car listing explorer.
//!
//! Loads a table of used-car listings, fills its gaps with group-wise
//! statistics, derives a few columns, and turns user selections into chart
//! data models, all on top of Polars.
//!
//! # Overview
//!
//! - **Loading**: CSV with fallback parse strategies and a required-column check
//! - **Enrichment**: manufacturer from the model name, median model year and
//!   cylinders per model, mean odometer per (model year, model), age and age
//!   category, run in a fixed order by [`Pipeline`]
//! - **Filtering**: [`ListingFilter`] by manufacturer, model years and price
//! - **Charts**: average price bars, a stacked price histogram, and a price
//!   scatter colored by age category
//! - **Dashboard**: [`Dashboard`] renders a [`Selection`] into a table preview
//!   plus the three charts without touching the enriched table
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use car_explorer::{Dashboard, DashboardConfig, Pipeline, load_listings};
//!
//! let config = DashboardConfig::default();
//! let df = load_listings("vehicles_us.csv")?;
//!
//! let enriched = Pipeline::builder()
//!     .config(config.clone())
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .process(df)?;
//!
//! let dashboard = Dashboard::new(enriched.data, config)?;
//! let mut selection = dashboard.default_selection();
//! selection.show_all = true;
//!
//! let view = dashboard.render(&selection)?;
//! println!("{}", view.bar.title);
//! ```

pub mod charts;
pub mod config;
pub mod dashboard;
pub mod derive;
pub mod error;
pub mod filter;
pub mod imputers;
pub mod loader;
pub mod pipeline;
pub mod reporting;
pub mod schema;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use charts::{
    Bar, BarChart, BarGrouping, HistogramBin, HistogramChart, HistogramSplit, ScatterAxis,
    ScatterChart, ScatterPoint, ScatterSeries,
};
pub use config::{ConfigValidationError, DashboardConfig, DashboardConfigBuilder, RoundingMode};
pub use dashboard::{Dashboard, DashboardView, Selection, TablePreview};
pub use derive::{derive_age, derive_age_category, derive_manufacturer};
pub use error::{ExplorerError, Result as ExplorerResult, ResultExt};
pub use filter::{FilterControls, ListingFilter};
pub use imputers::{
    FillOutcome, GroupedImputer, StatisticalImputer, composite_keys, fill_4wd,
    fill_by_group_median, fill_odometer_by_model_year,
};
pub use loader::load_listings;
pub use pipeline::{
    ClosureProgressReporter, EnrichmentResult, Pipeline, PipelineBuilder, PipelineStage,
    ProgressReporter, ProgressUpdate,
};
pub use reporting::{DashboardReport, ReportGenerator};
pub use types::{
    ActionType, AgeCategory, ColumnFill, CompositeKey, EnrichmentAction, EnrichmentSummary,
};
