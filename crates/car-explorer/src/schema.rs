//! Column names of the listing dataset.

use crate::error::{ExplorerError, Result};
use polars::prelude::*;

pub const PRICE: &str = "price";
pub const MODEL_YEAR: &str = "model_year";
pub const MODEL: &str = "model";
pub const CONDITION: &str = "condition";
pub const CYLINDERS: &str = "cylinders";
pub const FUEL: &str = "fuel";
pub const ODOMETER: &str = "odometer";
pub const TRANSMISSION: &str = "transmission";
pub const TYPE: &str = "type";
pub const PAINT_COLOR: &str = "paint_color";
pub const IS_4WD: &str = "is_4wd";
pub const DAYS_LISTED: &str = "days_listed";

// Derived
pub const MANUFACTURER: &str = "manufacturer";
pub const AGE: &str = "age";
pub const AGE_CATEGORY: &str = "age_category";

/// Columns the input file must carry.
pub const REQUIRED_COLUMNS: [&str; 12] = [
    MODEL,
    MODEL_YEAR,
    CYLINDERS,
    ODOMETER,
    IS_4WD,
    PRICE,
    CONDITION,
    TYPE,
    FUEL,
    TRANSMISSION,
    PAINT_COLOR,
    DAYS_LISTED,
];

/// Columns read as numbers; normalized to `Float64` on load.
pub const NUMERIC_COLUMNS: [&str; 6] = [MODEL_YEAR, CYLINDERS, ODOMETER, IS_4WD, PRICE, DAYS_LISTED];

/// Check that every required column is present.
///
/// Only presence is checked; dtypes are normalized separately.
pub fn validate_columns(df: &DataFrame) -> Result<()> {
    let present: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|required| !present.iter().any(|name| name == *required))
        .map(|required| required.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ExplorerError::MissingColumns(missing))
    }
}

/// Cast the numeric listing columns to `Float64`.
///
/// Integer columns (no blanks in the file) and float columns (blanks present)
/// end up with the same dtype, so imputation never has to branch on it.
pub fn normalize_numeric_columns(df: &mut DataFrame) -> Result<()> {
    for name in NUMERIC_COLUMNS {
        let Ok(column) = df.column(name) else {
            continue;
        };
        if column.dtype() == &DataType::Float64 {
            continue;
        }
        let cast = column
            .as_materialized_series()
            .cast(&DataType::Float64)
            .map_err(|e| ExplorerError::Polars(e).with_context(format!("Casting '{name}'")))?;
        df.with_column(cast)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_frame() -> DataFrame {
        df![
            PRICE => [9400i64],
            MODEL_YEAR => [2011i64],
            MODEL => ["bmw x5"],
            CONDITION => ["good"],
            CYLINDERS => [6i64],
            FUEL => ["gas"],
            ODOMETER => [145000i64],
            TRANSMISSION => ["automatic"],
            TYPE => ["SUV"],
            PAINT_COLOR => ["black"],
            IS_4WD => [1i64],
            DAYS_LISTED => [19i64],
        ]
        .unwrap()
    }

    #[test]
    fn test_validate_columns_accepts_full_frame() {
        assert!(validate_columns(&full_frame()).is_ok());
    }

    #[test]
    fn test_validate_columns_reports_every_missing_column() {
        let df = full_frame().drop(ODOMETER).unwrap().drop(FUEL).unwrap();
        match validate_columns(&df) {
            Err(ExplorerError::MissingColumns(missing)) => {
                assert_eq!(missing, vec![ODOMETER.to_string(), FUEL.to_string()]);
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn test_normalize_numeric_columns_casts_to_float() {
        let mut df = full_frame();
        normalize_numeric_columns(&mut df).unwrap();

        for name in NUMERIC_COLUMNS {
            assert_eq!(df.column(name).unwrap().dtype(), &DataType::Float64, "{name}");
        }
        assert_eq!(df.column(MODEL).unwrap().dtype(), &DataType::String);
    }
}
