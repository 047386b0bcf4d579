//! Chart-type adapters
//!
//! Each adapter maps rows and a [`ChartConfig`] into the shape its rendering
//! primitive consumes. Line, bar and area charts share the aggregated keyed
//! records; scatter charts plot raw `{x, y}` pairs.

pub mod area;
pub mod bar;
pub mod line;
pub mod scatter;

// Utilities
pub mod utils;

// Re-exports
pub use area::AreaChartAdapter;
pub use bar::BarChartAdapter;
pub use line::LineChartAdapter;
pub use scatter::{ScatterChart, ScatterChartAdapter, ScatterPoint, ScatterSeries};

use serde::Serialize;
use fd_core::Row;

use crate::aggregate::{aggregate, SeriesSpec};
use crate::config::{ChartConfig, ChartType};

/// Keyed records shared by line, bar and area charts
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyedChart {
    pub chart_type: ChartType,
    pub x_key: String,
    pub data: Vec<Row>,
    pub series: Vec<SeriesSpec>,
    /// Draw through null points instead of breaking the trace
    pub connect_nulls: bool,
}

/// Renderer input for one chart
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChartData {
    /// Nothing to plot; renderers show a placeholder
    Empty,
    Keyed(KeyedChart),
    Scatter(ScatterChart),
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        matches!(self, ChartData::Empty)
    }
}

/// Base trait for chart adapters
pub trait ChartAdapter: Send + Sync {
    /// Chart type produced by this adapter
    fn chart_type(&self) -> ChartType;

    /// Shape `rows` for rendering
    fn adapt(&self, rows: &[Row], config: &ChartConfig) -> ChartData;
}

/// The adapter for `chart_type`
pub fn adapter_for(chart_type: ChartType) -> Box<dyn ChartAdapter> {
    match chart_type {
        ChartType::Line => Box::new(LineChartAdapter),
        ChartType::Bar => Box::new(BarChartAdapter),
        ChartType::Area => Box::new(AreaChartAdapter),
        ChartType::Scatter => Box::new(ScatterChartAdapter),
    }
}

/// Build renderer input for `config`. Incomplete configs and empty results
/// produce [`ChartData::Empty`].
pub fn build_chart(rows: &[Row], config: &ChartConfig) -> ChartData {
    if !config.is_complete() {
        tracing::debug!(
            "Chart not configured - x: '{}', y: {:?}",
            config.x_key,
            config.y_keys
        );
        return ChartData::Empty;
    }
    adapter_for(config.chart_type).adapt(rows, config)
}

/// Aggregate rows into keyed records for `chart_type`
pub(crate) fn keyed_chart(
    rows: &[Row],
    config: &ChartConfig,
    chart_type: ChartType,
    connect_nulls: bool,
) -> ChartData {
    let aggregation = aggregate(rows, &config.x_key, &config.y_keys, config.group());
    if aggregation.is_empty() {
        return ChartData::Empty;
    }

    ChartData::Keyed(KeyedChart {
        chart_type,
        x_key: aggregation.x_key.clone(),
        data: aggregation.records(),
        series: aggregation.series,
        connect_nulls,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fd_core::{row_from, CellValue};
    use serde_json::json;

    fn rows() -> Vec<Row> {
        vec![
            row_from([("d", CellValue::from("2020")), ("v", CellValue::from(10.0))]),
            row_from([("d", CellValue::from("2020")), ("v", CellValue::from(20.0))]),
            row_from([("d", CellValue::from("2021")), ("v", CellValue::from(5.0))]),
        ]
    }

    #[test]
    fn test_keyed_types_share_records() {
        let base = ChartConfig::new(ChartType::Line, "d").with_y("v");
        let data: Vec<Vec<Row>> = [ChartType::Line, ChartType::Bar, ChartType::Area]
            .into_iter()
            .map(|chart_type| {
                let config = ChartConfig { chart_type, ..base.clone() };
                match build_chart(&rows(), &config) {
                    ChartData::Keyed(chart) => {
                        assert_eq!(chart.chart_type, chart_type);
                        chart.data
                    }
                    other => panic!("expected keyed chart, got {:?}", other),
                }
            })
            .collect();

        assert_eq!(data[0], data[1]);
        assert_eq!(data[1], data[2]);
    }

    #[test]
    fn test_empty_states() {
        let config = ChartConfig::new(ChartType::Bar, "d").with_y("v");
        assert!(build_chart(&[], &config).is_empty());
        assert!(build_chart(&rows(), &ChartConfig::new(ChartType::Bar, "d")).is_empty());

        let missing_x = ChartConfig::new(ChartType::Line, "nope").with_y("v");
        assert!(build_chart(&rows(), &missing_x).is_empty());
    }

    #[test]
    fn test_serialized_shape() {
        let config = ChartConfig::new(ChartType::Line, "d").with_y("v");
        let value = serde_json::to_value(build_chart(&rows(), &config)).unwrap();
        assert_eq!(value["kind"], "keyed");
        assert_eq!(value["chartType"], "line");
        assert_eq!(value["connectNulls"], true);
        assert_eq!(value["data"], json!([{"d": "2020", "v": 15}, {"d": "2021", "v": 5}]));
        assert_eq!(value["series"][0]["dataKey"], "v");

        let empty = serde_json::to_value(ChartData::Empty).unwrap();
        assert_eq!(empty, json!({"kind": "empty"}));
    }

    #[test]
    fn test_adapter_lookup() {
        for chart_type in ChartType::ALL {
            assert_eq!(adapter_for(chart_type).chart_type(), chart_type);
        }
    }
}
