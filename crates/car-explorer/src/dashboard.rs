//! Dashboard session over an enriched listing table.
//!
//! The base table is fixed at construction. Every render filters it afresh,
//! so changing a widget never re-runs imputation.

use crate::charts::{BarChart, BarGrouping, HistogramChart, HistogramSplit, ScatterAxis, ScatterChart};
use crate::config::DashboardConfig;
use crate::error::{ExplorerError, Result};
use crate::filter::{FilterControls, ListingFilter};
use crate::schema::{AGE_CATEGORY, MANUFACTURER};
use crate::utils::any_value_to_json;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

/// Widget values driving one render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Manufacturer shown in the table unless `show_all` is set.
    pub manufacturer: Option<String>,
    /// Inclusive model year range for the table.
    pub year_range: Option<(i32, i32)>,
    pub show_all: bool,
    pub bar_by: BarGrouping,
    pub hist_by: HistogramSplit,
    /// Drop listings above the high price threshold from the histogram.
    pub remove_high_hist: bool,
    pub scatter_y: ScatterAxis,
    /// Drop listings above the high price threshold from the scatter chart.
    pub remove_high_scatter: bool,
}

impl Selection {
    /// First manufacturer, the full year range, and the first field of each chart.
    pub fn defaults(controls: &FilterControls) -> Self {
        Self {
            manufacturer: controls.manufacturers.first().cloned(),
            year_range: controls.year_bounds,
            show_all: false,
            bar_by: controls.bar_fields.first().copied().unwrap_or_default(),
            hist_by: controls.histogram_fields.first().copied().unwrap_or_default(),
            remove_high_hist: false,
            scatter_y: controls.scatter_fields.first().copied().unwrap_or_default(),
            remove_high_scatter: false,
        }
    }

    /// The filter applied to the table view.
    pub fn table_filter(&self) -> ListingFilter {
        ListingFilter {
            manufacturer: if self.show_all {
                None
            } else {
                self.manufacturer.clone()
            },
            year_range: self.year_range,
            max_price: None,
        }
    }
}

/// The first rows of a table view, as JSON cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TablePreview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    /// Rows in the view, not just in the preview.
    pub total_rows: usize,
}

impl TablePreview {
    pub fn from_frame(df: &DataFrame, limit: usize) -> Self {
        let total_rows = df.height();
        let sliced = df.slice(0, limit.min(total_rows));

        let columns = sliced
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();

        let mut rows = Vec::with_capacity(sliced.height());
        for row_idx in 0..sliced.height() {
            let row = sliced
                .get_columns()
                .iter()
                .map(|col| col.get(row_idx).ok().map_or(Value::Null, any_value_to_json))
                .collect();
            rows.push(row);
        }

        Self {
            columns,
            rows,
            total_rows,
        }
    }
}

/// Everything shown for one selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    pub selection: Selection,
    pub table: TablePreview,
    pub bar: BarChart,
    pub histogram: HistogramChart,
    pub scatter: ScatterChart,
}

/// An enriched table plus the options derived from it.
#[derive(Debug, Clone)]
pub struct Dashboard {
    base: DataFrame,
    controls: FilterControls,
    config: DashboardConfig,
}

impl Dashboard {
    /// Wrap an enriched table. Fails if the derived columns are absent.
    pub fn new(base: DataFrame, config: DashboardConfig) -> Result<Self> {
        for column in [MANUFACTURER, AGE_CATEGORY] {
            if base.column(column).is_err() {
                return Err(ExplorerError::ColumnNotFound(column.to_string()));
            }
        }

        let controls = FilterControls::from_table(&base)?;
        info!(
            rows = base.height(),
            manufacturers = controls.manufacturers.len(),
            "Dashboard ready"
        );

        Ok(Self {
            base,
            controls,
            config,
        })
    }

    pub fn controls(&self) -> &FilterControls {
        &self.controls
    }

    pub fn base(&self) -> &DataFrame {
        &self.base
    }

    pub fn default_selection(&self) -> Selection {
        Selection::defaults(&self.controls)
    }

    /// Build the table preview and the three charts for `selection`.
    ///
    /// The table honours the manufacturer and year widgets. The charts read the
    /// whole table; histogram and scatter can each cap prices at the
    /// configured threshold.
    pub fn render(&self, selection: &Selection) -> Result<DashboardView> {
        let table_view = selection.table_filter().apply(&self.base)?;
        let table = TablePreview::from_frame(&table_view, self.config.preview_rows);

        let bar = BarChart::build(&self.base, selection.bar_by).map_err(chart_failed)?;

        let hist_source = self.capped(selection.remove_high_hist)?;
        let histogram = HistogramChart::build(&hist_source, selection.hist_by, self.config.histogram_bins)
            .map_err(chart_failed)?;

        let scatter_source = self.capped(selection.remove_high_scatter)?;
        let scatter = ScatterChart::build(&scatter_source, selection.scatter_y).map_err(chart_failed)?;

        debug!(
            table_rows = table.total_rows,
            bars = bar.bars.len(),
            scatter_points = scatter.point_count(),
            "Rendered dashboard"
        );

        Ok(DashboardView {
            selection: selection.clone(),
            table,
            bar,
            histogram,
            scatter,
        })
    }

    fn capped(&self, remove_high: bool) -> Result<DataFrame> {
        if remove_high {
            ListingFilter::new()
                .max_price(self.config.high_price_threshold)
                .apply(&self.base)
        } else {
            Ok(self.base.clone())
        }
    }
}

fn chart_failed(e: anyhow::Error) -> ExplorerError {
    ExplorerError::Internal(format!("Chart could not be built: {e:#}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::*;
    use pretty_assertions::assert_eq;

    fn enriched() -> DataFrame {
        df![
            PRICE => [Some(5_000.0), Some(150_000.0), Some(8_000.0), Some(20_000.0)],
            MODEL_YEAR => [2010.0, 2018.0, 2012.0, 2020.0],
            MANUFACTURER => ["ford", "bmw", "ford", "chevrolet"],
            CONDITION => ["good", "excellent", "fair", "good"],
            TYPE => ["pickup", "SUV", "sedan", "truck"],
            FUEL => ["gas", "gas", "diesel", "gas"],
            ODOMETER => [150_000.0, 20_000.0, 120_000.0, 40_000.0],
            AGE => [14.0, 6.0, 12.0, 4.0],
            AGE_CATEGORY => ["10-20", "5-10", "10-20", "<5"],
        ]
        .unwrap()
    }

    fn dashboard() -> Dashboard {
        Dashboard::new(enriched(), DashboardConfig::default()).unwrap()
    }

    #[test]
    fn test_default_selection() {
        let selection = dashboard().default_selection();

        assert_eq!(selection.manufacturer.as_deref(), Some("ford"));
        assert_eq!(selection.year_range, Some((2010, 2020)));
        assert!(!selection.show_all);
        assert_eq!(selection.bar_by, BarGrouping::Manufacturer);
        assert_eq!(selection.hist_by, HistogramSplit::Fuel);
        assert_eq!(selection.scatter_y, ScatterAxis::Condition);
    }

    #[test]
    fn test_table_follows_manufacturer_and_years() {
        let dashboard = dashboard();
        let mut selection = dashboard.default_selection();
        selection.year_range = Some((2011, 2020));

        let view = dashboard.render(&selection).unwrap();

        assert_eq!(view.table.total_rows, 1);
        // Charts ignore the table widgets
        assert_eq!(view.bar.bars.len(), 3);
        assert_eq!(view.scatter.point_count(), 4);
    }

    #[test]
    fn test_show_all_ignores_manufacturer() {
        let dashboard = dashboard();
        let mut selection = dashboard.default_selection();
        selection.show_all = true;

        assert_eq!(dashboard.render(&selection).unwrap().table.total_rows, 4);
    }

    #[test]
    fn test_remove_high_toggles_are_independent() {
        let dashboard = dashboard();
        let mut selection = dashboard.default_selection();
        selection.remove_high_hist = true;

        let view = dashboard.render(&selection).unwrap();

        assert_eq!(view.histogram.total(), 3);
        assert_eq!(view.scatter.point_count(), 4);
    }

    #[test]
    fn test_render_does_not_modify_base() {
        let dashboard = dashboard();
        let before = dashboard.base().clone();
        let mut selection = dashboard.default_selection();
        selection.remove_high_scatter = true;

        dashboard.render(&selection).unwrap();

        assert!(dashboard.base().equals_missing(&before));
    }

    #[test]
    fn test_preview_is_limited() {
        let preview = TablePreview::from_frame(&enriched(), 2);

        assert_eq!(preview.total_rows, 4);
        assert_eq!(preview.rows.len(), 2);
        assert_eq!(preview.columns[0], PRICE);
        assert_eq!(preview.rows[0][2], Value::String("ford".to_string()));
    }

    #[test]
    fn test_unenriched_table_is_rejected() {
        let df = enriched().drop(AGE_CATEGORY).unwrap();
        assert!(matches!(
            Dashboard::new(df, DashboardConfig::default()),
            Err(ExplorerError::ColumnNotFound(_))
        ));
    }
}
