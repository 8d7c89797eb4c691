//! Chart data models.
//!
//! Each chart is built from a table view and a field choice and serializes to
//! plain JSON for whatever front end draws it.

mod bar;
pub mod fields;
mod histogram;
mod scatter;

pub use bar::{Bar, BarChart};
pub use fields::{BarGrouping, HistogramSplit, ScatterAxis};
pub use histogram::{HistogramBin, HistogramChart};
pub use scatter::{ScatterChart, ScatterPoint, ScatterSeries};
