//! Area chart adapter

use fd_core::Row;

use super::{keyed_chart, ChartAdapter, ChartData};
use crate::config::{ChartConfig, ChartType};

/// Filled areas over the aggregated points, connected across nulls
pub struct AreaChartAdapter;

impl ChartAdapter for AreaChartAdapter {
    fn chart_type(&self) -> ChartType {
        ChartType::Area
    }

    fn adapt(&self, rows: &[Row], config: &ChartConfig) -> ChartData {
        keyed_chart(rows, config, ChartType::Area, true)
    }
}
