//! Chart configuration saved with dashboard widgets

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ChartError;

/// Rendering primitive of a chart
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Line,
    Bar,
    Area,
    Scatter,
}

impl ChartType {
    pub const ALL: [ChartType; 4] = [ChartType::Line, ChartType::Bar, ChartType::Area, ChartType::Scatter];

    pub fn id(&self) -> &'static str {
        match self {
            ChartType::Line => "line",
            ChartType::Bar => "bar",
            ChartType::Area => "area",
            ChartType::Scatter => "scatter",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ChartType {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChartType::ALL
            .into_iter()
            .find(|t| t.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ChartError::UnknownChartType(s.to_string()))
    }
}

/// What to plot: the X column, the metric columns and an optional group column
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub chart_type: ChartType,
    pub x_key: String,
    pub y_keys: Vec<String>,
    pub group_key: Option<String>,
}

impl ChartConfig {
    pub fn new(chart_type: ChartType, x_key: impl Into<String>) -> Self {
        Self {
            chart_type,
            x_key: x_key.into(),
            ..Default::default()
        }
    }

    /// Add a metric column
    pub fn with_y(mut self, y_key: impl Into<String>) -> Self {
        self.y_keys.push(y_key.into());
        self
    }

    /// Split metrics by `group_key`
    pub fn with_group(mut self, group_key: impl Into<String>) -> Self {
        self.group_key = Some(group_key.into());
        self
    }

    /// The group column, if one is set
    pub fn group(&self) -> Option<&str> {
        self.group_key.as_deref().filter(|key| !key.is_empty())
    }

    /// Whether an X column and at least one metric are chosen
    pub fn is_complete(&self) -> bool {
        !self.x_key.is_empty() && self.y_keys.iter().any(|y| !y.is_empty())
    }
}
