//! Imputation of missing listing values.
//!
//! - Constant fills and whole-column statistics
//! - Group-wise median and mean fills

mod grouped;
mod statistical;

pub use grouped::{
    FillOutcome, GroupedImputer, composite_keys, fill_by_group_median, fill_odometer_by_model_year,
};
pub use statistical::{StatisticalImputer, fill_4wd};
