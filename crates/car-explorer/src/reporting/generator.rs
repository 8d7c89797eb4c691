use crate::dashboard::DashboardView;
use crate::error::{ExplorerError, Result};
use crate::filter::FilterControls;
use crate::types::EnrichmentSummary;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

// ============================================================================
// Report Types
// ============================================================================

/// Everything one CLI run produced: how the data was enriched, which options
/// the widgets offer, and the rendered view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardReport {
    /// Timestamp when the report was generated (RFC 3339, local time)
    pub generated_at: String,
    /// Path to the input file
    pub input_file: String,
    pub summary: EnrichmentSummary,
    pub controls: FilterControls,
    pub view: DashboardView,
}

impl DashboardReport {
    pub fn new(
        input_file: impl Into<String>,
        summary: EnrichmentSummary,
        controls: FilterControls,
        view: DashboardView,
    ) -> Self {
        Self {
            generated_at: Local::now().to_rfc3339(),
            input_file: input_file.into(),
            summary,
            controls,
            view,
        }
    }
}

// ============================================================================
// Report Generator
// ============================================================================

/// Writes dashboard reports to an output directory.
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    output_dir: PathBuf,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new(PathBuf::from("output"))
    }
}

impl ReportGenerator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write `report` as pretty JSON to `<output_dir>/<base_name>_dashboard.json`.
    ///
    /// Creates the output directory if needed and returns the written path.
    pub fn write_report_to_file(&self, report: &DashboardReport, base_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir).map_err(|e| {
            ExplorerError::ReportGenerationFailed(format!(
                "cannot create '{}': {}",
                self.output_dir.display(),
                e
            ))
        })?;

        let report_path = self.output_dir.join(format!("{}_dashboard.json", base_name));
        let json = serde_json::to_string_pretty(report)?;
        let mut file = File::create(&report_path).map_err(|e| {
            ExplorerError::ReportGenerationFailed(format!(
                "cannot write '{}': {}",
                report_path.display(),
                e
            ))
        })?;
        file.write_all(json.as_bytes())?;

        info!("Report saved: {}", report_path.display());
        Ok(report_path)
    }
}
