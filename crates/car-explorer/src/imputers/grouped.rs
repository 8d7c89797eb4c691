//! Group-wise imputation.
//!
//! Statistics come from a Polars `group_by`, are read into a `HashMap` keyed
//! by group, and are then applied in a single pass over the rows. A null cell
//! whose group has no statistic is left null and counted as unfilled.

use super::statistical::StatisticalImputer;
use crate::config::RoundingMode;
use crate::schema::{MODEL, MODEL_YEAR, ODOMETER};
use crate::types::CompositeKey;
use crate::utils::{column_labels, numeric_values, string_values};
use anyhow::{Result, bail};
use polars::prelude::*;
use std::collections::HashMap;
use std::hash::Hash;
use tracing::debug;

/// Outcome of a group-wise fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillOutcome {
    /// Nulls in the value column before the fill.
    pub missing_before: usize,
    /// Nulls left because their group had no statistic.
    pub missing_after: usize,
    /// Number of groups with a statistic.
    pub groups: usize,
}

impl FillOutcome {
    pub fn filled(&self) -> usize {
        self.missing_before - self.missing_after
    }
}

/// Group-wise statistics computed by Polars and applied row by row.
pub struct GroupedImputer;

impl GroupedImputer {
    /// Aggregate `value_col` over each distinct combination of `by`.
    fn aggregate(
        df: &DataFrame,
        value_col: &str,
        by: &[&str],
        agg: fn(Expr) -> Expr,
    ) -> PolarsResult<DataFrame> {
        let keys: Vec<Expr> = by.iter().map(|c| col(*c)).collect();
        let mut columns = keys.clone();
        columns.push(col(value_col));

        df.clone()
            .lazy()
            .select(columns)
            .group_by(keys)
            .agg([agg(col(value_col))])
            .collect()
    }

    /// Median of the non-null values of `value_col` per distinct `group_col`
    /// label.
    ///
    /// Rows with a null label are ignored; groups without values have no entry.
    pub fn group_medians(
        df: &DataFrame,
        value_col: &str,
        group_col: &str,
    ) -> Result<HashMap<String, f64>> {
        let stats = Self::aggregate(df, value_col, &[group_col], |e| e.median())?;
        let labels = column_labels(&stats, group_col)?;
        let medians = numeric_values(&stats, value_col)?;

        Ok(labels
            .into_iter()
            .zip(medians)
            .filter_map(|(label, median)| Some((label?, median?)))
            .collect())
    }

    /// Mean of the non-null values of `value_col` per (model year, model).
    ///
    /// Rows without a model are ignored; a null model year forms its own
    /// group per model.
    pub fn model_year_means(
        df: &DataFrame,
        value_col: &str,
    ) -> Result<HashMap<CompositeKey, f64>> {
        let stats = Self::aggregate(df, value_col, &[MODEL_YEAR, MODEL], |e| e.mean())?;
        let keys = composite_keys(&stats)?;
        let means = numeric_values(&stats, value_col)?;

        Ok(keys
            .into_iter()
            .zip(means)
            .filter_map(|(key, mean)| Some((key?, mean?)))
            .collect())
    }

    /// Fill null values from their group's statistic. Non-null values are
    /// returned unchanged.
    pub fn fill_from_groups<K>(
        keys: &[Option<K>],
        values: &[Option<f64>],
        stats: &HashMap<K, f64>,
    ) -> Vec<Option<f64>>
    where
        K: Hash + Eq,
    {
        values
            .iter()
            .zip(keys)
            .map(|(value, key)| {
                value.or_else(|| key.as_ref().and_then(|k| stats.get(k).copied()))
            })
            .collect()
    }
}

fn count_missing(values: &[Option<f64>]) -> usize {
    values.iter().filter(|v| v.is_none()).count()
}

/// Fill nulls in `value_col` with the median of `value_col` within each
/// distinct value of `group_col`.
pub fn fill_by_group_median(
    df: &mut DataFrame,
    value_col: &str,
    group_col: &str,
) -> Result<FillOutcome> {
    let values = numeric_values(df, value_col)?;
    let keys = column_labels(df, group_col)?;

    let missing_before = count_missing(&values);
    if missing_before == 0 {
        return Ok(FillOutcome {
            missing_before,
            missing_after: 0,
            groups: 0,
        });
    }

    let medians = GroupedImputer::group_medians(df, value_col, group_col)?;
    let filled = GroupedImputer::fill_from_groups(&keys, &values, &medians);
    let missing_after = count_missing(&filled);

    debug!(
        column = value_col,
        group_by = group_col,
        groups = medians.len(),
        filled = missing_before - missing_after,
        unfilled = missing_after,
        "Group median fill"
    );

    df.with_column(Series::new(value_col.into(), filled))?;

    Ok(FillOutcome {
        missing_before,
        missing_after,
        groups: medians.len(),
    })
}

/// Build one [`CompositeKey`] per row from `model_year` and `model`.
///
/// Rows without a `model` have no key. A null `model_year` is kept as part of
/// the key.
pub fn composite_keys(df: &DataFrame) -> Result<Vec<Option<CompositeKey>>> {
    let years = numeric_values(df, MODEL_YEAR)?;
    let models = string_values(df, MODEL)?;

    if years.len() != models.len() {
        bail!(
            "'{MODEL_YEAR}' has {} rows but '{MODEL}' has {}",
            years.len(),
            models.len()
        );
    }

    Ok(years
        .into_iter()
        .zip(models)
        .map(|(year, model)| model.map(|m| CompositeKey::new(year, m)))
        .collect())
}

/// Fill nulls in `odometer` with the mean odometer of rows sharing the same
/// (model year, model) key, then round the whole column to whole units.
///
/// Must run after `model_year` has been imputed. `keys` are the row keys from
/// [`composite_keys`] on the same frame; the group means are computed from
/// the frame's `model_year` and `model` columns.
pub fn fill_odometer_by_model_year(
    df: &mut DataFrame,
    keys: &[Option<CompositeKey>],
    rounding: RoundingMode,
) -> Result<FillOutcome> {
    let values = numeric_values(df, ODOMETER)?;
    if keys.len() != values.len() {
        bail!(
            "{} composite keys for {} odometer values",
            keys.len(),
            values.len()
        );
    }

    let missing_before = count_missing(&values);
    let means = GroupedImputer::model_year_means(df, ODOMETER)?;
    let filled = GroupedImputer::fill_from_groups(keys, &values, &means);
    let missing_after = count_missing(&filled);

    debug!(
        groups = means.len(),
        filled = missing_before - missing_after,
        unfilled = missing_after,
        "Odometer mean fill by model year and model"
    );

    df.with_column(Series::new(ODOMETER.into(), filled))?;
    StatisticalImputer::round_column(df, ODOMETER, rounding)?;

    Ok(FillOutcome {
        missing_before,
        missing_after,
        groups: means.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CYLINDERS;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_group_medians_skip_nulls() {
        let df = df![
            MODEL => [Some("a"), Some("a"), Some("a"), Some("b"), Some("b"), None],
            CYLINDERS => [Some(1.0), None, Some(3.0), Some(10.0), Some(20.0), Some(99.0)],
        ]
        .unwrap();

        let medians = GroupedImputer::group_medians(&df, CYLINDERS, MODEL).unwrap();

        assert_eq!(medians.len(), 2);
        assert_eq!(medians["a"], 2.0);
        assert_eq!(medians["b"], 15.0);
    }

    #[test]
    fn test_group_medians_average_middle_pair() {
        let df = df![
            MODEL => ["kia soul"; 4],
            MODEL_YEAR => [2014.0, 2011.0, 2013.0, 2012.0],
        ]
        .unwrap();

        let medians = GroupedImputer::group_medians(&df, MODEL_YEAR, MODEL).unwrap();

        assert_eq!(medians["kia soul"], 2012.5);
    }

    #[test]
    fn test_group_without_values_has_no_statistic() {
        let df = df![
            MODEL => ["a", "a"],
            MODEL_YEAR => [2015.0, 2015.0],
            ODOMETER => [None::<f64>, None],
        ]
        .unwrap();
        assert!(GroupedImputer::model_year_means(&df, ODOMETER).unwrap().is_empty());
    }

    #[test]
    fn test_model_year_means_key_on_year_and_model() {
        let df = df![
            MODEL => [Some("ram 1500"), Some("ram 1500"), Some("ram 1500"), Some("ram 1500"), None],
            MODEL_YEAR => [Some(2012.0), Some(2012.0), Some(2014.0), None, Some(2012.0)],
            ODOMETER => [Some(10.0), Some(20.0), Some(7.0), Some(3.0), Some(1_000.0)],
        ]
        .unwrap();

        let means = GroupedImputer::model_year_means(&df, ODOMETER).unwrap();

        assert_eq!(means.len(), 3);
        assert_eq!(means[&CompositeKey::new(Some(2012.0), "ram 1500")], 15.0);
        assert_eq!(means[&CompositeKey::new(Some(2014.0), "ram 1500")], 7.0);
        assert_eq!(means[&CompositeKey::new(None, "ram 1500")], 3.0);
    }

    #[test]
    fn test_fill_by_group_median_model_year() {
        let mut df = df![
            MODEL => ["ford f-150", "ford f-150", "ford f-150", "honda civic"],
            MODEL_YEAR => [Some(2010.0), Some(2014.0), None, Some(2012.0)],
        ]
        .unwrap();

        let outcome = fill_by_group_median(&mut df, MODEL_YEAR, MODEL).unwrap();

        assert_eq!(outcome.missing_before, 1);
        assert_eq!(outcome.missing_after, 0);
        assert_eq!(outcome.filled(), 1);
        assert_eq!(
            numeric_values(&df, MODEL_YEAR).unwrap(),
            vec![Some(2010.0), Some(2014.0), Some(2012.0), Some(2012.0)]
        );
    }

    #[test]
    fn test_fill_by_group_median_leaves_singleton_null() {
        let mut df = df![
            MODEL => ["ford f-150", "rare model"],
            CYLINDERS => [Some(8.0), None],
        ]
        .unwrap();

        let outcome = fill_by_group_median(&mut df, CYLINDERS, MODEL).unwrap();

        assert_eq!(outcome.missing_after, 1);
        assert_eq!(
            numeric_values(&df, CYLINDERS).unwrap(),
            vec![Some(8.0), None]
        );
    }

    #[test]
    fn test_fill_by_group_median_missing_column_errors() {
        let mut df = df![MODEL => ["ford f-150"]].unwrap();
        assert!(fill_by_group_median(&mut df, CYLINDERS, MODEL).is_err());
    }

    #[test]
    fn test_composite_keys_keep_null_year() {
        let df = df![
            MODEL => [Some("ford f-150"), None],
            MODEL_YEAR => [None::<f64>, Some(2015.0)],
        ]
        .unwrap();

        let keys = composite_keys(&df).unwrap();

        assert_eq!(keys[0], Some(CompositeKey::new(None, "ford f-150")));
        assert_eq!(keys[1], None);
    }

    #[test]
    fn test_fill_odometer_mean_and_round() {
        let mut df = df![
            MODEL => ["ford f-150", "ford f-150", "ford f-150", "ford f-150"],
            MODEL_YEAR => [2015.0, 2015.0, 2015.0, 2016.0],
            ODOMETER => [Some(100_000.0), Some(100_001.0), None, Some(5.5)],
        ]
        .unwrap();
        let keys = composite_keys(&df).unwrap();

        let outcome = fill_odometer_by_model_year(&mut df, &keys, RoundingMode::HalfEven).unwrap();

        // Mean 100000.5 ties to even; 5.5 ties to 6
        assert_eq!(outcome.filled(), 1);
        assert_eq!(
            numeric_values(&df, ODOMETER).unwrap(),
            vec![Some(100_000.0), Some(100_001.0), Some(100_000.0), Some(6.0)]
        );
    }

    #[test]
    fn test_fill_odometer_half_away_from_zero() {
        let mut df = df![
            MODEL => ["ford f-150", "ford f-150", "ford f-150"],
            MODEL_YEAR => [2015.0, 2015.0, 2015.0],
            ODOMETER => [Some(100_000.0), Some(100_001.0), None],
        ]
        .unwrap();
        let keys = composite_keys(&df).unwrap();

        fill_odometer_by_model_year(&mut df, &keys, RoundingMode::HalfAwayFromZero).unwrap();

        assert_eq!(
            numeric_values(&df, ODOMETER).unwrap()[2],
            Some(100_001.0)
        );
    }

    #[test]
    fn test_fill_odometer_rejects_mismatched_keys() {
        let mut df = df![ODOMETER => [Some(1.0), None]].unwrap();
        let keys = vec![None];
        assert!(fill_odometer_by_model_year(&mut df, &keys, RoundingMode::HalfEven).is_err());
    }
}
