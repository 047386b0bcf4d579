//! Chart data shaping for the dashboard
//!
//! Rows go through the series aggregator and a chart-type adapter to become
//! the structure a chart renderer draws.

pub mod aggregate;
pub mod format;
pub mod plots;
mod config;

use thiserror::Error;

pub use aggregate::{aggregate, Aggregation, SeriesAggregator, SeriesPoint, SeriesSpec};
pub use config::{ChartConfig, ChartType};
pub use format::format_axis_value;
pub use plots::{adapter_for, build_chart, ChartAdapter, ChartData, KeyedChart, ScatterChart};

/// Errors raised while reading chart settings
#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Unknown chart type: {0}")]
    UnknownChartType(String),
}
