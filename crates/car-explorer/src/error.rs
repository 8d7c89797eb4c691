//! Error types for the car explorer.
//!
//! Built on `thiserror`. Errors serialize as `{ code, message }` so a host UI
//! can branch on the code without parsing messages.

use crate::config::ConfigValidationError;
use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for loading, enriching and rendering listings.
#[derive(Error, Debug)]
pub enum ExplorerError {
    /// A column needed by an operation is absent from the table.
    #[error("No '{0}' column in the listings table")]
    ColumnNotFound(String),

    /// One or more required columns are absent from the input file.
    #[error("Dataset is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Bad dashboard configuration: {0}")]
    InvalidConfig(String),

    /// The input file could not be parsed by any loading strategy.
    #[error("Failed to load dataset from '{path}': {reason}")]
    LoadFailed { path: String, reason: String },

    /// A fill step could not complete.
    #[error("Could not fill gaps in '{column}': {reason}")]
    ImputationFailed { column: String, reason: String },

    /// A derived column could not be computed.
    #[error("Could not derive '{column}': {reason}")]
    DerivationFailed { column: String, reason: String },

    /// The dashboard report could not be written.
    #[error("Could not write dashboard report: {0}")]
    ReportGenerationFailed(String),

    /// A chart or preview failed on data that passed validation.
    #[error("Unexpected failure: {0}")]
    Internal(String),

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("DataFrame operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Another error, prefixed with where it happened.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ExplorerError>,
    },
}

impl ExplorerError {
    /// Wrap this error with a description of the failing step.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ExplorerError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code for host applications.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::MissingColumns(_) => "MISSING_COLUMNS",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::LoadFailed { .. } => "LOAD_FAILED",
            Self::ImputationFailed { .. } => "IMPUTATION_FAILED",
            Self::DerivationFailed { .. } => "DERIVATION_FAILED",
            Self::ReportGenerationFailed(_) => "REPORT_GENERATION_FAILED",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Whether the user can fix this by changing input or settings.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::MissingColumns(_) | Self::InvalidConfig(_) | Self::LoadFailed { .. } => true,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }
}

impl From<ConfigValidationError> for ExplorerError {
    fn from(err: ConfigValidationError) -> Self {
        ExplorerError::InvalidConfig(err.to_string())
    }
}

impl Serialize for ExplorerError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ExplorerError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for explorer operations.
pub type Result<T> = std::result::Result<T, ExplorerError>;

/// `.context("...")` on explorer and Polars results.
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ExplorerError::Polars(e).with_context(context))
    }
}
