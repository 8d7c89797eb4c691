use super::fields::ScatterAxis;
use crate::schema::{AGE_CATEGORY, PRICE};
use crate::types::AgeCategory;
use crate::utils::{float_to_json, is_numeric_dtype, numeric_values, string_values};
use anyhow::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    /// Price.
    pub x: f64,
    /// Number or string, depending on the axis field.
    pub y: Value,
}

/// Points of one age category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterSeries {
    pub category: AgeCategory,
    pub points: Vec<ScatterPoint>,
}

/// Price against a chosen field, colored by age category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterChart {
    pub title: String,
    pub field: ScatterAxis,
    /// Non-empty series in ascending age order.
    pub series: Vec<ScatterSeries>,
}

impl ScatterChart {
    /// Rows without a price, a y value or an age category are not plotted.
    pub fn build(df: &DataFrame, axis: ScatterAxis) -> Result<Self> {
        let prices = numeric_values(df, PRICE)?;
        let ys = axis_values(df, axis.column())?;
        let categories = string_values(df, AGE_CATEGORY)?;

        let mut buckets: Vec<Vec<ScatterPoint>> = vec![Vec::new(); AgeCategory::ALL.len()];
        for ((price, y), category) in prices.into_iter().zip(ys).zip(categories) {
            let (Some(x), Some(y)) = (price, y) else {
                continue;
            };
            let Some(category) = category.as_deref().and_then(AgeCategory::from_label) else {
                continue;
            };
            buckets[category as usize].push(ScatterPoint { x, y });
        }

        let series = AgeCategory::ALL
            .into_iter()
            .zip(buckets)
            .filter(|(_, points)| !points.is_empty())
            .map(|(category, points)| ScatterSeries { category, points })
            .collect();

        Ok(Self {
            title: format!("Price vs {axis}"),
            field: axis,
            series,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn point_count(&self) -> usize {
        self.series.iter().map(|s| s.points.len()).sum()
    }
}

fn axis_values(df: &DataFrame, col_name: &str) -> PolarsResult<Vec<Option<Value>>> {
    if is_numeric_dtype(df.column(col_name)?.dtype()) {
        Ok(numeric_values(df, col_name)?
            .into_iter()
            .map(|v| v.map(float_to_json))
            .collect())
    } else {
        Ok(string_values(df, col_name)?
            .into_iter()
            .map(|v| v.map(Value::String))
            .collect())
    }
}
