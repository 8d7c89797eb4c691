use super::fields::BarGrouping;
use crate::schema::PRICE;
use crate::utils::{column_labels, numeric_values};
use anyhow::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

const COUNT: &str = "count";

/// One bar: a group and its average price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub label: String,
    /// `None` when no listing in the group has a price.
    pub mean_price: Option<f64>,
    /// Listings in the group, priced or not.
    pub count: usize,
}

/// Average sale price per group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarChart {
    pub title: String,
    pub field: BarGrouping,
    /// Sorted by label.
    pub bars: Vec<Bar>,
}

impl BarChart {
    pub fn build(df: &DataFrame, grouping: BarGrouping) -> Result<Self> {
        let field = grouping.column();
        let stats = df
            .clone()
            .lazy()
            .filter(col(field).is_not_null())
            .group_by([col(field)])
            .agg([col(PRICE).mean(), len().alias(COUNT)])
            .sort_by_exprs([col(field)], SortMultipleOptions::default())
            .collect()?;

        let labels = column_labels(&stats, field)?;
        let means = numeric_values(&stats, PRICE)?;
        let counts = numeric_values(&stats, COUNT)?;

        let bars = labels
            .into_iter()
            .zip(means)
            .zip(counts)
            .filter_map(|((label, mean_price), count)| {
                Some(Bar {
                    label: label?,
                    mean_price,
                    count: count? as usize,
                })
            })
            .collect();

        Ok(Self {
            title: format!("Average sale price by {grouping}"),
            field: grouping,
            bars,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}
