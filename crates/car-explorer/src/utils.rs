//! Shared column helpers.
//!
//! Extraction of typed values out of a `DataFrame` and the conversions used
//! when handing cells to a renderer.

use polars::prelude::*;
use serde_json::{Number, Value};

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

// =============================================================================
// Column Extraction
// =============================================================================

/// Read a column as `f64` values. Nulls and NaN both come back as `None`.
pub fn numeric_values(df: &DataFrame, col_name: &str) -> PolarsResult<Vec<Option<f64>>> {
    let series = df
        .column(col_name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;

    Ok(series
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

/// Read a column as owned strings.
pub fn string_values(df: &DataFrame, col_name: &str) -> PolarsResult<Vec<Option<String>>> {
    let series = df
        .column(col_name)?
        .as_materialized_series()
        .cast(&DataType::String)?;

    Ok(series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Read a column as display labels, used for grouping and coloring.
///
/// Numeric columns are formatted with [`format_number`] so that `8.0`
/// cylinders is labelled `"8"`, not `"8.0"`.
pub fn column_labels(df: &DataFrame, col_name: &str) -> PolarsResult<Vec<Option<String>>> {
    let dtype = df.column(col_name)?.dtype().clone();
    if is_numeric_dtype(&dtype) {
        Ok(numeric_values(df, col_name)?
            .into_iter()
            .map(|v| v.map(format_number))
            .collect())
    } else {
        string_values(df, col_name)
    }
}

/// Format a number without a trailing `.0` when it is integral.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

// =============================================================================
// Cell Conversion
// =============================================================================

/// Convert a Polars `AnyValue` into a JSON value.
///
/// NaN and infinities become `null`; nested or temporal values are stringified.
pub fn any_value_to_json(value: AnyValue) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(b),

        AnyValue::Int8(i) => Value::Number(i.into()),
        AnyValue::Int16(i) => Value::Number(i.into()),
        AnyValue::Int32(i) => Value::Number(i.into()),
        AnyValue::Int64(i) => Value::Number(i.into()),

        AnyValue::UInt8(u) => Value::Number(u.into()),
        AnyValue::UInt16(u) => Value::Number(u.into()),
        AnyValue::UInt32(u) => Value::Number(u.into()),
        AnyValue::UInt64(u) => Value::Number(u.into()),

        AnyValue::Float32(f) => float_to_json(f as f64),
        AnyValue::Float64(f) => float_to_json(f),

        AnyValue::String(s) => Value::String(s.to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),

        _ => Value::String(format!("{}", value)),
    }
}

/// Convert an `f64` to JSON, mapping non-finite values to `null`.
pub fn float_to_json(value: f64) -> Value {
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

// =============================================================================
// Tests
// =============================================================================
