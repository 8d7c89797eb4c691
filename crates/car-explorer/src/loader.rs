//! CSV loading for listing files.

use crate::error::{ExplorerError, Result};
use crate::schema::{normalize_numeric_columns, validate_columns};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const INFER_SCHEMA_ROWS: usize = 10_000;

/// Load a listing file and prepare it for enrichment.
///
/// Checks that every required column is present and casts the numeric
/// columns to `Float64`.
pub fn load_listings(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    info!("Loading dataset from: {}", path.display());

    let mut df = read_csv_with_fallbacks(path)?;
    validate_columns(&df)?;
    normalize_numeric_columns(&mut df)?;

    info!("Dataset loaded: {} rows x {} columns", df.height(), df.width());
    Ok(df)
}

/// Read a CSV file, retrying with looser settings when parsing fails.
pub fn read_csv_with_fallbacks(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(load_failed(path, "file not found"));
    }

    // Strategy 1: standard loading with quote handling
    match CsvReadOptions::default()
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => debug!("Standard loading failed: {}", e),
    }

    // Strategy 2: without quote handling
    match CsvReadOptions::default()
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(None))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => debug!("Loading without quotes failed: {}", e),
    }

    // Strategy 3: pre-clean the content
    let content = std::fs::read_to_string(path)?;
    CsvReadOptions::default()
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .with_has_header(true)
        .into_reader_with_file_handle(Cursor::new(clean_csv_content(&content)))
        .finish()
        .map_err(|e| load_failed(path, e))
}

/// Collapse doubled quotes and drop blank lines.
pub fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn load_failed(path: &Path, reason: impl ToString) -> ExplorerError {
    ExplorerError::LoadFailed {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}
