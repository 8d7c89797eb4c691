//! Computed listing columns: manufacturer, age and age category.

use crate::schema::{AGE, AGE_CATEGORY, MANUFACTURER, MODEL, MODEL_YEAR};
use crate::types::AgeCategory;
use crate::utils::{numeric_values, string_values};
use anyhow::Result;
use polars::prelude::*;
use tracing::warn;

/// Add a `manufacturer` column holding the first whitespace token of `model`.
///
/// A null, empty or whitespace-only model gets `unknown_label`. Returns the
/// number of such rows.
pub fn derive_manufacturer(df: &mut DataFrame, unknown_label: &str) -> Result<usize> {
    let models = string_values(df, MODEL)?;

    let mut malformed = 0;
    let manufacturers: Vec<String> = models
        .iter()
        .map(|model| {
            match model.as_deref().and_then(|m| m.split_whitespace().next()) {
                Some(token) => token.to_string(),
                None => {
                    malformed += 1;
                    unknown_label.to_string()
                }
            }
        })
        .collect();

    if malformed > 0 {
        warn!(
            rows = malformed,
            label = unknown_label,
            "Model without a manufacturer token"
        );
    }

    df.with_column(Series::new(MANUFACTURER.into(), manufacturers))?;
    Ok(malformed)
}

/// Add an `age` column: `reference_year - model_year`. Null years give a null age.
pub fn derive_age(df: &mut DataFrame, reference_year: i32) -> Result<()> {
    let reference = f64::from(reference_year);
    let ages: Vec<Option<f64>> = numeric_values(df, MODEL_YEAR)?
        .into_iter()
        .map(|year| year.map(|y| reference - y))
        .collect();

    df.with_column(Series::new(AGE.into(), ages))?;
    Ok(())
}

/// Add an `age_category` column by bucketing `age`.
pub fn derive_age_category(df: &mut DataFrame) -> Result<()> {
    let categories: Vec<Option<&'static str>> = numeric_values(df, AGE)?
        .into_iter()
        .map(|age| age.map(|a| AgeCategory::from_age(a).as_str()))
        .collect();

    df.with_column(Series::new(AGE_CATEGORY.into(), categories))?;
    Ok(())
}
