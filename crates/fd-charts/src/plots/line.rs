//! Line chart adapter

use fd_core::Row;

use super::{keyed_chart, ChartAdapter, ChartData};
use crate::config::{ChartConfig, ChartType};

/// One line per series over the aggregated points. Null values are gaps the
/// line is drawn through.
pub struct LineChartAdapter;

impl ChartAdapter for LineChartAdapter {
    fn chart_type(&self) -> ChartType {
        ChartType::Line
    }

    fn adapt(&self, rows: &[Row], config: &ChartConfig) -> ChartData {
        keyed_chart(rows, config, ChartType::Line, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fd_core::{row_from, CellValue};

    #[test]
    fn test_null_points_are_kept_not_zeroed() {
        let rows = vec![
            row_from([("year", CellValue::from(2020.0)), ("rev", CellValue::from(1.0))]),
            row_from([("year", CellValue::from(2021.0)), ("rev", CellValue::Null)]),
            row_from([("year", CellValue::from(2022.0)), ("rev", CellValue::from(3.0))]),
        ];
        let config = ChartConfig::new(ChartType::Line, "year").with_y("rev");

        let ChartData::Keyed(chart) = LineChartAdapter.adapt(&rows, &config) else {
            panic!("expected keyed chart");
        };
        assert!(chart.connect_nulls);
        assert_eq!(chart.data.len(), 3);
        assert_eq!(chart.data[1]["rev"], CellValue::Null);
    }
}
