//! Scatter chart adapter
//!
//! Scatter charts skip aggregation: every row with a numeric X and a numeric
//! value for the first metric becomes one point. Only the first metric is
//! plotted.

use indexmap::IndexMap;
use serde::Serialize;
use fd_core::{present, CellValue, Row};

use super::utils::colors::categorical_color;
use super::{ChartAdapter, ChartData};
use crate::config::{ChartConfig, ChartType};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
}

/// Points of one group, or of the whole dataset when ungrouped
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterSeries {
    pub name: String,
    pub color: &'static str,
    pub points: Vec<ScatterPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScatterChart {
    pub x_key: String,
    pub y_key: String,
    pub series: Vec<ScatterSeries>,
}

impl ScatterChart {
    /// Total number of plotted points
    pub fn point_count(&self) -> usize {
        self.series.iter().map(|s| s.points.len()).sum()
    }
}

pub struct ScatterChartAdapter;

impl ScatterChartAdapter {
    fn point(row: &Row, x_key: &str, y_key: &str) -> Option<ScatterPoint> {
        let number = |key: &str| {
            row.get(key)
                .and_then(CellValue::as_number)
                .filter(|value| !value.is_nan())
        };
        Some(ScatterPoint {
            x: number(x_key)?,
            y: number(y_key)?,
        })
    }
}

impl ChartAdapter for ScatterChartAdapter {
    fn chart_type(&self) -> ChartType {
        ChartType::Scatter
    }

    fn adapt(&self, rows: &[Row], config: &ChartConfig) -> ChartData {
        let Some(y_key) = config.y_keys.first() else {
            return ChartData::Empty;
        };
        let x_key = config.x_key.as_str();

        let series = match config.group() {
            None => vec![ScatterSeries {
                name: y_key.clone(),
                color: categorical_color(0),
                points: rows
                    .iter()
                    .filter_map(|row| Self::point(row, x_key, y_key))
                    .collect(),
            }],
            Some(group_key) => {
                let mut groups: IndexMap<String, Vec<ScatterPoint>> = IndexMap::new();
                for row in rows {
                    let Some(group) = present(row, group_key) else {
                        continue;
                    };
                    let points = groups.entry(group.to_js_string()).or_default();
                    if let Some(point) = Self::point(row, x_key, y_key) {
                        points.push(point);
                    }
                }
                groups
                    .into_iter()
                    .enumerate()
                    .map(|(index, (name, points))| ScatterSeries {
                        name,
                        color: categorical_color(index),
                        points,
                    })
                    .collect()
            }
        };

        let chart = ScatterChart {
            x_key: x_key.to_string(),
            y_key: y_key.clone(),
            series,
        };
        if chart.point_count() == 0 {
            tracing::debug!("No numeric ({}, {}) pairs to plot", x_key, y_key);
            return ChartData::Empty;
        }
        ChartData::Scatter(chart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<Row> {
        use fd_core::row_from;
        vec![
            row_from([("pe", CellValue::from(12.0)), ("growth", CellValue::from(0.1)), ("sector", CellValue::from("Tech"))]),
            row_from([("pe", CellValue::from(30.0)), ("growth", CellValue::from(0.4)), ("sector", CellValue::from("Energy"))]),
            row_from([("pe", CellValue::from("n/a")), ("growth", CellValue::from(0.2)), ("sector", CellValue::from("Tech"))]),
            row_from([("pe", CellValue::from(18.0)), ("growth", CellValue::Null), ("sector", CellValue::from("Tech"))]),
            row_from([("pe", CellValue::from(15.0)), ("growth", CellValue::from(0.3)), ("sector", CellValue::from("Tech"))]),
            row_from([("growth", CellValue::from(0.3))]),
        ]
    }

    fn scatter(config: &ChartConfig) -> ScatterChart {
        match ScatterChartAdapter.adapt(&rows(), config) {
            ChartData::Scatter(chart) => chart,
            other => panic!("expected scatter chart, got {:?}", other),
        }
    }

    #[test]
    fn test_point_count_excludes_unusable_rows() {
        let config = ChartConfig::new(ChartType::Scatter, "pe").with_y("growth");
        let chart = scatter(&config);

        let rows = rows();
        let unusable = rows
            .iter()
            .filter(|row| ScatterChartAdapter::point(row, "pe", "growth").is_none())
            .count();
        assert_eq!(unusable, 3);
        assert_eq!(chart.point_count(), rows.len() - unusable);
        assert_eq!(chart.series.len(), 1);
        assert_eq!(chart.series[0].points[0], ScatterPoint { x: 12.0, y: 0.1 });
    }

    #[test]
    fn test_only_first_metric_is_plotted() {
        let config = ChartConfig::new(ChartType::Scatter, "pe").with_y("growth").with_y("pe");
        let chart = scatter(&config);
        assert_eq!(chart.y_key, "growth");
        assert_eq!(chart.series[0].name, "growth");
    }

    #[test]
    fn test_grouped_series_per_group() {
        let config = ChartConfig::new(ChartType::Scatter, "pe").with_y("growth").with_group("sector");
        let chart = scatter(&config);

        let names: Vec<&str> = chart.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Tech", "Energy"]);
        assert_eq!(chart.series[0].points.len(), 2);
        assert_eq!(chart.series[1].points, vec![ScatterPoint { x: 30.0, y: 0.4 }]);
        assert_ne!(chart.series[0].color, chart.series[1].color);
    }

    #[test]
    fn test_no_pairs_is_empty() {
        let config = ChartConfig::new(ChartType::Scatter, "sector").with_y("growth");
        assert!(ScatterChartAdapter.adapt(&rows(), &config).is_empty());
    }
}
