use super::fields::HistogramSplit;
use crate::schema::PRICE;
use crate::utils::{column_labels, numeric_values};
use anyhow::{Result, ensure};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A price interval and how many listings of each color fall in it.
///
/// Bins are half-open `[start, end)` except the last, which includes `end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    /// Counts aligned with [`HistogramChart::colors`].
    pub counts: Vec<usize>,
}

impl HistogramBin {
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Price distribution stacked by a categorical field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramChart {
    pub title: String,
    pub field: HistogramSplit,
    /// Distinct split values in order of first appearance.
    pub colors: Vec<String>,
    pub bins: Vec<HistogramBin>,
}

impl HistogramChart {
    /// Bin prices into `bins` equal-width intervals spanning the observed
    /// price range. Rows missing a price or a split value are left out.
    pub fn build(df: &DataFrame, split: HistogramSplit, bins: usize) -> Result<Self> {
        ensure!(bins > 0, "histogram needs at least one bin");

        let field = split.column();
        let rows = df
            .clone()
            .lazy()
            .select([col(PRICE), col(field)])
            .filter(col(PRICE).is_not_null().and(col(field).is_not_null()))
            .collect()?;

        let prices = numeric_values(&rows, PRICE)?;
        let labels = column_labels(&rows, field)?;
        let colors: Vec<String> = Series::new(field.into(), labels.as_slice())
            .unique_stable()?
            .str()?
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect();

        let title = format!("Split of price by {split}");
        let price_series = rows
            .column(PRICE)?
            .as_materialized_series()
            .cast(&DataType::Float64)?;
        let (Some(min), Some(max)) = (price_series.min::<f64>()?, price_series.max::<f64>()?)
        else {
            return Ok(Self {
                title,
                field: split,
                colors,
                bins: Vec::new(),
            });
        };

        let color_index: HashMap<&str, usize> = colors
            .iter()
            .enumerate()
            .map(|(i, c)| (c.as_str(), i))
            .collect();
        let points: Vec<(f64, usize)> = prices
            .into_iter()
            .zip(&labels)
            .filter_map(|(price, label)| {
                Some((price?, *color_index.get(label.as_deref()?)?))
            })
            .collect();

        // A single distinct price still gets a bin of width one
        let width = if max > min {
            (max - min) / bins as f64
        } else {
            1.0
        };
        let bin_count = if max > min { bins } else { 1 };

        let mut histogram: Vec<HistogramBin> = (0..bin_count)
            .map(|i| HistogramBin {
                start: min + width * i as f64,
                end: if i + 1 == bin_count {
                    max.max(min + width)
                } else {
                    min + width * (i + 1) as f64
                },
                counts: vec![0; colors.len()],
            })
            .collect();

        for (price, color) in points {
            let idx = (((price - min) / width) as usize).min(bin_count - 1);
            histogram[idx].counts[color] += 1;
        }

        Ok(Self {
            title,
            field: split,
            colors,
            bins: histogram,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Listings counted across all bins.
    pub fn total(&self) -> usize {
        self.bins.iter().map(HistogramBin::total).sum()
    }
}
