use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Listing Domain Types
// ============================================================================

/// Discretized vehicle age used to color the scatter chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgeCategory {
    /// Younger than 5 years.
    #[serde(rename = "<5")]
    UnderFive,
    /// 5 up to (not including) 10 years.
    #[serde(rename = "5-10")]
    FiveToTen,
    /// 10 up to (not including) 20 years.
    #[serde(rename = "10-20")]
    TenToTwenty,
    /// 20 years or older.
    #[serde(rename = ">20")]
    OverTwenty,
}

impl AgeCategory {
    /// All categories in ascending age order.
    pub const ALL: [AgeCategory; 4] = [
        AgeCategory::UnderFive,
        AgeCategory::FiveToTen,
        AgeCategory::TenToTwenty,
        AgeCategory::OverTwenty,
    ];

    /// Bucket an age in years. Negative ages (model year after the reference
    /// year) fall into `<5`.
    pub fn from_age(age: f64) -> Self {
        if age < 5.0 {
            Self::UnderFive
        } else if age < 10.0 {
            Self::FiveToTen
        } else if age < 20.0 {
            Self::TenToTwenty
        } else {
            Self::OverTwenty
        }
    }

    /// The label stored in the `age_category` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnderFive => "<5",
            Self::FiveToTen => "5-10",
            Self::TenToTwenty => "10-20",
            Self::OverTwenty => ">20",
        }
    }

    /// Parse a label produced by [`as_str`](Self::as_str).
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == label)
    }
}

impl fmt::Display for AgeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grouping key for odometer imputation: one group per (model year, model).
///
/// The year is held as raw `f64` bits so the key can be hashed. A missing
/// year is a valid key component: all undated rows of a model share a group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeKey {
    model_year: Option<u64>,
    model: String,
}

impl CompositeKey {
    pub fn new(model_year: Option<f64>, model: impl Into<String>) -> Self {
        Self {
            // -0.0 and 0.0 must land in the same group
            model_year: model_year.map(|y| if y == 0.0 { 0.0f64.to_bits() } else { y.to_bits() }),
            model: model.into(),
        }
    }

    pub fn model_year(&self) -> Option<f64> {
        self.model_year.map(f64::from_bits)
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

// ============================================================================
// Enrichment Summary Types
// ============================================================================

/// Summary of what the enrichment pipeline did to the dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichmentSummary {
    /// Total execution time in milliseconds.
    pub duration_ms: u64,
    /// Number of rows processed.
    pub rows: usize,
    /// Rows whose `model` yielded no manufacturer token.
    pub malformed_models: usize,
    /// Ordered log of the pipeline's actions.
    pub actions: Vec<EnrichmentAction>,
    /// Per-column fill statistics.
    pub column_fills: Vec<ColumnFill>,
    /// Warnings generated during enrichment.
    pub warnings: Vec<String>,
}

impl EnrichmentSummary {
    /// Create a new empty summary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an action to the summary.
    pub fn add_action(&mut self, action: EnrichmentAction) {
        self.actions.push(action);
    }

    /// Add a warning to the summary.
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Record the fill statistics of a column.
    pub fn add_column_fill(&mut self, fill: ColumnFill) {
        self.column_fills.push(fill);
    }

    /// Look up the fill statistics for a column.
    pub fn column_fill(&self, name: &str) -> Option<&ColumnFill> {
        self.column_fills.iter().find(|fill| fill.name == name)
    }

    /// Total number of cells that were filled.
    pub fn total_filled(&self) -> usize {
        self.column_fills.iter().map(ColumnFill::filled).sum()
    }

    /// Total number of cells still missing after their fill pass.
    pub fn total_unfilled(&self) -> usize {
        self.column_fills.iter().map(|fill| fill.missing_after).sum()
    }
}

/// A single action taken during enrichment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentAction {
    /// Type of action performed.
    pub action_type: ActionType,
    /// Column the action applied to.
    pub target: String,
    /// Human-readable description of the action.
    pub description: String,
}

impl EnrichmentAction {
    pub fn new(
        action_type: ActionType,
        target: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            action_type,
            target: target.into(),
            description: description.into(),
        }
    }
}

/// Types of actions the enrichment pipeline records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// A computed column was added.
    ColumnDerived,
    /// Missing values were filled with a constant.
    DefaultApplied,
    /// Missing values were filled from a group statistic.
    ValueImputed,
    /// A numeric column was rounded.
    ValueRounded,
}

impl ActionType {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ColumnDerived => "Column Derived",
            Self::DefaultApplied => "Default Applied",
            Self::ValueImputed => "Value Imputed",
            Self::ValueRounded => "Value Rounded",
        }
    }
}

/// Fill statistics for a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnFill {
    /// Name of the column.
    pub name: String,
    /// How the gaps were filled (e.g. "median by model").
    pub method: String,
    /// Missing values before the pass.
    pub missing_before: usize,
    /// Missing values left after the pass (no statistic for their group).
    pub missing_after: usize,
}

impl ColumnFill {
    pub fn new(name: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method: method.into(),
            missing_before: 0,
            missing_after: 0,
        }
    }

    /// Number of values filled by the pass.
    pub fn filled(&self) -> usize {
        self.missing_before.saturating_sub(self.missing_after)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_age_category_boundaries() {
        assert_eq!(AgeCategory::from_age(4.0), AgeCategory::UnderFive);
        assert_eq!(AgeCategory::from_age(5.0), AgeCategory::FiveToTen);
        assert_eq!(AgeCategory::from_age(9.999), AgeCategory::FiveToTen);
        assert_eq!(AgeCategory::from_age(10.0), AgeCategory::TenToTwenty);
        assert_eq!(AgeCategory::from_age(19.999), AgeCategory::TenToTwenty);
        assert_eq!(AgeCategory::from_age(20.0), AgeCategory::OverTwenty);
        assert_eq!(AgeCategory::from_age(-1.0), AgeCategory::UnderFive);
    }

    #[test]
    fn test_age_category_labels() {
        let labels: Vec<&str> = AgeCategory::ALL.iter().map(AgeCategory::as_str).collect();
        assert_eq!(labels, vec!["<5", "5-10", "10-20", ">20"]);
        assert_eq!(AgeCategory::from_label("10-20"), Some(AgeCategory::TenToTwenty));
        assert_eq!(AgeCategory::from_label("old"), None);
    }

    #[test]
    fn test_age_category_serializes_as_label() {
        let json = serde_json::to_string(&AgeCategory::OverTwenty).unwrap();
        assert_eq!(json, "\">20\"");
    }

    #[test]
    fn test_composite_key_groups_by_year_and_model() {
        let mut groups: HashMap<CompositeKey, usize> = HashMap::new();
        for key in [
            CompositeKey::new(Some(2015.0), "ford f-150"),
            CompositeKey::new(Some(2015.0), "ford f-150"),
            CompositeKey::new(Some(2016.0), "ford f-150"),
            CompositeKey::new(None, "ford f-150"),
            CompositeKey::new(None, "ford f-150"),
        ] {
            *groups.entry(key).or_default() += 1;
        }

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[&CompositeKey::new(Some(2015.0), "ford f-150")], 2);
        assert_eq!(groups[&CompositeKey::new(None, "ford f-150")], 2);
    }

    #[test]
    fn test_composite_key_is_not_a_string_concatenation() {
        // As text both keys read "2015.01 x"
        assert_ne!(
            CompositeKey::new(Some(2015.0), "1 x"),
            CompositeKey::new(Some(2015.01), " x")
        );
    }

    #[test]
    fn test_summary_totals() {
        let mut summary = EnrichmentSummary::new();
        let mut year = ColumnFill::new("model_year", "median by model");
        year.missing_before = 10;
        year.missing_after = 2;
        let mut odo = ColumnFill::new("odometer", "mean by model year and model");
        odo.missing_before = 4;
        summary.add_column_fill(year);
        summary.add_column_fill(odo);

        assert_eq!(summary.total_filled(), 12);
        assert_eq!(summary.total_unfilled(), 2);
        assert_eq!(summary.column_fill("odometer").unwrap().filled(), 4);
        assert!(summary.column_fill("price").is_none());
    }

    #[test]
    fn test_action_type_serialization() {
        let action = EnrichmentAction::new(ActionType::ValueImputed, "cylinders", "Filled 3");
        let json = serde_json::to_string(&action).unwrap();
        assert!(json.contains("\"value_imputed\""));
        assert_eq!(ActionType::ValueRounded.display_name(), "Value Rounded");
    }
}
