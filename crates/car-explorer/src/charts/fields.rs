//! Fields each chart can be grouped, split or plotted by.

use crate::schema::{
    AGE, CONDITION, CYLINDERS, DAYS_LISTED, FUEL, IS_4WD, MANUFACTURER, ODOMETER, PAINT_COLOR,
    TRANSMISSION, TYPE,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Grouping of the average-price bar chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BarGrouping {
    #[default]
    Manufacturer,
    Type,
    Condition,
}

impl BarGrouping {
    pub const ALL: [BarGrouping; 3] = [Self::Manufacturer, Self::Type, Self::Condition];

    pub fn column(&self) -> &'static str {
        match self {
            Self::Manufacturer => MANUFACTURER,
            Self::Type => TYPE,
            Self::Condition => CONDITION,
        }
    }
}

/// Color split of the price histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HistogramSplit {
    #[default]
    Fuel,
    Transmission,
    Cylinders,
    #[serde(rename = "is_4wd")]
    Is4wd,
    PaintColor,
}

impl HistogramSplit {
    pub const ALL: [HistogramSplit; 5] = [
        Self::Fuel,
        Self::Transmission,
        Self::Cylinders,
        Self::Is4wd,
        Self::PaintColor,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            Self::Fuel => FUEL,
            Self::Transmission => TRANSMISSION,
            Self::Cylinders => CYLINDERS,
            Self::Is4wd => IS_4WD,
            Self::PaintColor => PAINT_COLOR,
        }
    }
}

/// Y axis of the price scatter chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScatterAxis {
    #[default]
    Condition,
    Odometer,
    Age,
    Manufacturer,
    PaintColor,
    Cylinders,
    DaysListed,
}

impl ScatterAxis {
    pub const ALL: [ScatterAxis; 7] = [
        Self::Condition,
        Self::Odometer,
        Self::Age,
        Self::Manufacturer,
        Self::PaintColor,
        Self::Cylinders,
        Self::DaysListed,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            Self::Condition => CONDITION,
            Self::Odometer => ODOMETER,
            Self::Age => AGE,
            Self::Manufacturer => MANUFACTURER,
            Self::PaintColor => PAINT_COLOR,
            Self::Cylinders => CYLINDERS,
            Self::DaysListed => DAYS_LISTED,
        }
    }
}

impl fmt::Display for BarGrouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl fmt::Display for HistogramSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl fmt::Display for ScatterAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}
