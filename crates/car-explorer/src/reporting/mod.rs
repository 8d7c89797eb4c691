//! Report generation module.
//!
//! A [`DashboardReport`] bundles the enrichment summary, the widget options and
//! one rendered view. It backs both `--json` output and `--emit-report` files.
//!
//! # Example
//!
//! ```rust,ignore
//! use car_explorer::reporting::{DashboardReport, ReportGenerator};
//!
//! let report = DashboardReport::new("vehicles_us.csv", summary, controls, view);
//! ReportGenerator::new("output").write_report_to_file(&report, "vehicles_us")?;
//! ```

mod generator;

pub use generator::{DashboardReport, ReportGenerator};
