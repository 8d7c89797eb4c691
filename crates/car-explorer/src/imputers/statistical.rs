//! Whole-column constant fills and rounding.

use crate::config::RoundingMode;
use crate::schema::IS_4WD;
use crate::utils::numeric_values;
use anyhow::Result;
use polars::prelude::*;

/// Column-level imputation helpers.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Replace nulls in a numeric column with `fill_value`.
    ///
    /// Returns the number of cells filled.
    pub fn fill_constant(df: &mut DataFrame, col_name: &str, fill_value: f64) -> Result<usize> {
        let series = df
            .column(col_name)?
            .as_materialized_series()
            .cast(&DataType::Float64)?;
        let filled = series.null_count();

        let result = series.f64()?.fill_null_with_values(fill_value)?;
        df.with_column(result.into_series())?;

        Ok(filled)
    }

    /// Round every non-null value of a numeric column to a whole number.
    pub fn round_column(df: &mut DataFrame, col_name: &str, mode: RoundingMode) -> Result<()> {
        let rounded: Vec<Option<f64>> = numeric_values(df, col_name)?
            .into_iter()
            .map(|v| v.map(|x| mode.round(x)))
            .collect();
        df.with_column(Series::new(col_name.into(), rounded))?;
        Ok(())
    }
}

/// Treat a missing `is_4wd` as "no four-wheel drive".
///
/// Returns the number of cells filled.
pub fn fill_4wd(df: &mut DataFrame) -> Result<usize> {
    StatisticalImputer::fill_constant(df, IS_4WD, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_4wd() {
        let mut df = df![
            IS_4WD => [Some(1.0), None, None, Some(1.0)],
        ]
        .unwrap();

        let filled = fill_4wd(&mut df).unwrap();

        assert_eq!(filled, 2);
        assert_eq!(
            numeric_values(&df, IS_4WD).unwrap(),
            vec![Some(1.0), Some(0.0), Some(0.0), Some(1.0)]
        );
    }

    #[test]
    fn test_fill_4wd_without_nulls_is_noop() {
        let mut df = df![IS_4WD => [1.0, 0.0]].unwrap();
        assert_eq!(fill_4wd(&mut df).unwrap(), 0);
        assert_eq!(df.column(IS_4WD).unwrap().null_count(), 0);
    }

    #[test]
    fn test_fill_4wd_missing_column_errors() {
        let mut df = df!["price" => [1.0]].unwrap();
        assert!(fill_4wd(&mut df).is_err());
    }

    #[test]
    fn test_round_column_keeps_nulls() {
        let mut df = df![
            "odometer" => [Some(100.5), None, Some(101.5), Some(7.2)],
        ]
        .unwrap();

        StatisticalImputer::round_column(&mut df, "odometer", RoundingMode::HalfEven).unwrap();

        assert_eq!(
            numeric_values(&df, "odometer").unwrap(),
            vec![Some(100.0), None, Some(102.0), Some(7.0)]
        );
    }
}
