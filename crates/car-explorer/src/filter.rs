//! Row selection over the enriched table.
//!
//! Filters never touch the table they are given; they return a new frame.

use crate::charts::{BarGrouping, HistogramSplit, ScatterAxis};
use crate::error::{Result, ResultExt};
use crate::schema::{MANUFACTURER, MODEL_YEAR, PRICE};
use crate::utils::{numeric_values, string_values};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A conjunction of optional row predicates.
///
/// An empty filter keeps every row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingFilter {
    /// Keep only this manufacturer. `None` keeps all manufacturers.
    pub manufacturer: Option<String>,
    /// Keep rows whose model year is a whole year within `[from, to]`.
    pub year_range: Option<(i32, i32)>,
    /// Keep rows with `price <= max_price`. Rows without a price are dropped.
    pub max_price: Option<f64>,
}

impl ListingFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    pub fn year_range(mut self, from: i32, to: i32) -> Self {
        self.year_range = Some((from, to));
        self
    }

    pub fn max_price(mut self, max_price: f64) -> Self {
        self.max_price = Some(max_price);
        self
    }

    /// Return the rows of `df` matching every set predicate.
    ///
    /// A selection matching nothing yields an empty frame with the same
    /// columns.
    pub fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut keep = vec![true; df.height()];

        if let Some(wanted) = &self.manufacturer {
            let manufacturers = string_values(df, MANUFACTURER).context("Filtering by manufacturer")?;
            for (k, m) in keep.iter_mut().zip(manufacturers) {
                *k &= m.as_deref() == Some(wanted.as_str());
            }
        }

        if let Some((from, to)) = self.year_range {
            let years = numeric_values(df, MODEL_YEAR).context("Filtering by model year")?;
            for (k, year) in keep.iter_mut().zip(years) {
                *k &= year.is_some_and(|y| is_year_in_range(y, from, to));
            }
        }

        if let Some(max) = self.max_price {
            let prices = numeric_values(df, PRICE).context("Filtering by price")?;
            for (k, price) in keep.iter_mut().zip(prices) {
                *k &= price.is_some_and(|p| p <= max);
            }
        }

        let mask: BooleanChunked = keep.into_iter().collect();
        let filtered = df.filter(&mask)?;
        debug!(
            rows_in = df.height(),
            rows_out = filtered.height(),
            "Applied listing filter"
        );
        Ok(filtered)
    }
}

/// Membership in the set of whole years `from..=to`. Imputed medians such as
/// 2012.5 are never members.
fn is_year_in_range(year: f64, from: i32, to: i32) -> bool {
    year.fract() == 0.0 && year >= f64::from(from) && year <= f64::from(to)
}

/// Options offered to the user: manufacturers, the year slider and the field
/// lists of each chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterControls {
    /// Distinct manufacturers in order of first appearance.
    pub manufacturers: Vec<String>,
    /// Whole-year bounds of `model_year`; `None` when no row has a year.
    pub year_bounds: Option<(i32, i32)>,
    pub bar_fields: Vec<BarGrouping>,
    pub histogram_fields: Vec<HistogramSplit>,
    pub scatter_fields: Vec<ScatterAxis>,
}

impl FilterControls {
    pub fn from_table(df: &DataFrame) -> Result<Self> {
        let manufacturers = df
            .column(MANUFACTURER)?
            .as_materialized_series()
            .cast(&DataType::String)?
            .unique_stable()?
            .str()?
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect();

        let years = df
            .column(MODEL_YEAR)?
            .as_materialized_series()
            .cast(&DataType::Float64)?;
        let year_bounds = match (years.min::<f64>()?, years.max::<f64>()?) {
            (Some(lo), Some(hi)) => Some((lo.trunc() as i32, hi.trunc() as i32)),
            _ => None,
        };

        Ok(Self {
            manufacturers,
            year_bounds,
            bar_fields: BarGrouping::ALL.to_vec(),
            histogram_fields: HistogramSplit::ALL.to_vec(),
            scatter_fields: ScatterAxis::ALL.to_vec(),
        })
    }
}
