//! Bar chart adapter

use fd_core::Row;

use super::{keyed_chart, ChartAdapter, ChartData};
use crate::config::{ChartConfig, ChartType};

/// One bar per series and X value
pub struct BarChartAdapter;

impl ChartAdapter for BarChartAdapter {
    fn chart_type(&self) -> ChartType {
        ChartType::Bar
    }

    fn adapt(&self, rows: &[Row], config: &ChartConfig) -> ChartData {
        keyed_chart(rows, config, ChartType::Bar, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fd_core::{row_from, CellValue};

    #[test]
    fn test_categories_sorted_with_averages() {
        let rows = vec![
            row_from([("state", CellValue::from("TX")), ("gdp", CellValue::from(2.0))]),
            row_from([("state", CellValue::from("CA")), ("gdp", CellValue::from(3.0))]),
            row_from([("state", CellValue::from("TX")), ("gdp", CellValue::from(4.0))]),
        ];
        let config = ChartConfig::new(ChartType::Bar, "state").with_y("gdp");

        let ChartData::Keyed(chart) = BarChartAdapter.adapt(&rows, &config) else {
            panic!("expected keyed chart");
        };
        assert!(!chart.connect_nulls);
        assert_eq!(chart.data[0]["state"], CellValue::from("CA"));
        assert_eq!(chart.data[1]["gdp"], CellValue::from(3.0));
        assert_eq!(chart.series[0].color, "#3b82f6");
    }
}
