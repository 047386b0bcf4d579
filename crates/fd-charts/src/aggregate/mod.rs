//! Series aggregation
//!
//! Turns rows into one point per distinct X value. Without a group key each
//! metric is averaged over the rows in its bucket. With a group key every
//! (group, metric) pair becomes its own field, and a later row with the same
//! X, group and metric replaces the earlier value instead of being averaged.

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use fd_core::{present, CellValue, Row};

use crate::plots::utils::colors::categorical_color;

/// Running sum and count of one metric in one bucket
#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    sum: f64,
    count: usize,
}

impl Accumulator {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Rows sharing one X value. `x` is the value of the first row seen.
struct Bucket<V> {
    x: CellValue,
    values: V,
}

/// One point per distinct X value
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub x: CellValue,
    /// Metric field → value; `None` when no row contributed
    pub values: IndexMap<String, Option<f64>>,
}

impl SeriesPoint {
    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied().flatten()
    }

    /// Flat record `{x_key: x, field: value, ...}` as handed to renderers
    pub fn to_record(&self, x_key: &str) -> Row {
        let mut record = Row::with_capacity(self.values.len() + 1);
        record.insert(x_key.to_string(), self.x.clone());
        for (key, value) in &self.values {
            record.insert(key.clone(), value.map(CellValue::Number).unwrap_or(CellValue::Null));
        }
        record
    }
}

/// A plotted trace
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesSpec {
    pub data_key: String,
    pub name: String,
    pub color: &'static str,
}

/// Result of aggregating rows for a keyed chart
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub x_key: String,
    pub points: Vec<SeriesPoint>,
    pub series: Vec<SeriesSpec>,
}

impl Aggregation {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Points as flat records, in axis order
    pub fn records(&self) -> Vec<Row> {
        self.points.iter().map(|p| p.to_record(&self.x_key)).collect()
    }
}

/// Aggregates rows by X value, optionally split by a group column
pub struct SeriesAggregator<'a> {
    x_key: &'a str,
    y_keys: &'a [String],
    group_key: Option<&'a str>,
}

impl<'a> SeriesAggregator<'a> {
    pub fn new(x_key: &'a str, y_keys: &'a [String]) -> Self {
        Self {
            x_key,
            y_keys,
            group_key: None,
        }
    }

    /// Split metrics by `group_key`; an empty key means no grouping
    pub fn grouped_by(mut self, group_key: Option<&'a str>) -> Self {
        self.group_key = group_key.filter(|key| !key.is_empty());
        self
    }

    pub fn aggregate(&self, rows: &[Row]) -> Aggregation {
        let mut points = match self.group_key {
            None => self.averaged(rows),
            Some(group_key) => self.last_write_wins(rows, group_key),
        };
        points.sort_by(|a, b| a.x.axis_cmp(&b.x));

        let series = self.series(&points);
        tracing::debug!(
            "Aggregated {} rows into {} points and {} series",
            rows.len(),
            points.len(),
            series.len()
        );

        Aggregation {
            x_key: self.x_key.to_string(),
            points,
            series,
        }
    }

    fn averaged(&self, rows: &[Row]) -> Vec<SeriesPoint> {
        let mut buckets: IndexMap<String, Bucket<Vec<Accumulator>>> = IndexMap::new();

        for row in rows {
            let Some(x) = present(row, self.x_key) else {
                continue;
            };
            let bucket = buckets.entry(x.to_js_string()).or_insert_with(|| Bucket {
                x: x.clone(),
                values: vec![Accumulator::default(); self.y_keys.len()],
            });

            for (acc, y_key) in bucket.values.iter_mut().zip(self.y_keys) {
                if let Some(value) = finite_number(row, y_key) {
                    acc.add(value);
                }
            }
        }

        buckets
            .into_values()
            .map(|bucket| SeriesPoint {
                x: bucket.x,
                values: self
                    .y_keys
                    .iter()
                    .cloned()
                    .zip(bucket.values.iter().map(Accumulator::mean))
                    .collect(),
            })
            .collect()
    }

    fn last_write_wins(&self, rows: &[Row], group_key: &str) -> Vec<SeriesPoint> {
        let mut buckets: IndexMap<String, Bucket<IndexMap<String, Option<f64>>>> = IndexMap::new();

        for row in rows {
            let x = row.get(self.x_key).filter(|v| v.is_truthy());
            let group = row.get(group_key).filter(|v| v.is_truthy());
            let (Some(x), Some(group)) = (x, group) else {
                continue;
            };

            let bucket = buckets.entry(x.to_js_string()).or_insert_with(|| Bucket {
                x: x.clone(),
                values: IndexMap::new(),
            });

            let group = group.to_js_string();
            for y_key in self.y_keys {
                if let Some(value) = finite_number(row, y_key) {
                    bucket.values.insert(format!("{}_{}", group, y_key), Some(value));
                }
            }
        }

        buckets
            .into_values()
            .map(|bucket| SeriesPoint {
                x: bucket.x,
                values: bucket.values,
            })
            .collect()
    }

    fn series(&self, points: &[SeriesPoint]) -> Vec<SeriesSpec> {
        let keys: Vec<String> = if self.group_key.is_none() {
            self.y_keys.to_vec()
        } else {
            let keys: IndexSet<&String> = points
                .iter()
                .flat_map(|p| p.values.keys())
                .filter(|key| key.as_str() != self.x_key && !key.ends_with("_count"))
                .collect();
            keys.into_iter().cloned().collect()
        };

        keys.into_iter()
            .enumerate()
            .map(|(index, key)| SeriesSpec {
                name: key.clone(),
                data_key: key,
                color: categorical_color(index),
            })
            .collect()
    }
}

/// Aggregate `rows` by `x_key`
pub fn aggregate(rows: &[Row], x_key: &str, y_keys: &[String], group_key: Option<&str>) -> Aggregation {
    SeriesAggregator::new(x_key, y_keys)
        .grouped_by(group_key)
        .aggregate(rows)
}

fn finite_number(row: &Row, key: &str) -> Option<f64> {
    row.get(key)
        .and_then(CellValue::as_number)
        .filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fd_core::row_from;

    fn keys(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    fn sample() -> Vec<Row> {
        vec![
            row_from([("d", CellValue::from("2020")), ("v", CellValue::from(10.0))]),
            row_from([("d", CellValue::from("2020")), ("v", CellValue::from(20.0))]),
            row_from([("d", CellValue::from("2021")), ("v", CellValue::from(5.0))]),
        ]
    }

    #[test]
    fn test_ungrouped_mean_per_bucket() {
        let result = aggregate(&sample(), "d", &keys(&["v"]), None);

        let records = result.records();
        assert_eq!(
            records,
            vec![
                row_from([("d", CellValue::from("2020")), ("v", CellValue::from(15.0))]),
                row_from([("d", CellValue::from("2021")), ("v", CellValue::from(5.0))]),
            ]
        );
        assert_eq!(result.series.len(), 1);
        assert_eq!(result.series[0].data_key, "v");
        assert_eq!(result.series[0].name, "v");
    }

    #[test]
    fn test_bucket_without_numbers_is_null() {
        let rows = vec![
            row_from([("d", CellValue::from("2020")), ("v", CellValue::from("n/a"))]),
            row_from([("d", CellValue::from("2020")), ("v", CellValue::Null)]),
            row_from([("d", CellValue::from("2021")), ("v", CellValue::Number(f64::NAN))]),
            row_from([("d", CellValue::from("2021")), ("v", CellValue::from(4.0))]),
        ];
        let result = aggregate(&rows, "d", &keys(&["v", "missing"]), None);

        assert_eq!(result.points[0].get("v"), None);
        assert_eq!(result.points[0].values.get("v"), Some(&None));
        assert_eq!(result.points[1].get("v"), Some(4.0));
        assert_eq!(result.points[1].get("missing"), None);
        assert_eq!(result.records()[0]["v"], CellValue::Null);
    }

    #[test]
    fn test_missing_x_rows_are_skipped() {
        let rows = vec![
            row_from([("v", CellValue::from(1.0))]),
            row_from([("d", CellValue::Null), ("v", CellValue::from(2.0))]),
            row_from([("d", CellValue::from(0.0)), ("v", CellValue::from(3.0))]),
        ];
        let result = aggregate(&rows, "d", &keys(&["v"]), None);
        assert_eq!(result.points.len(), 1);
        assert_eq!(result.points[0].x, CellValue::Number(0.0));
        assert_eq!(result.points[0].get("v"), Some(3.0));
    }

    #[test]
    fn test_buckets_by_string_form_and_keeps_first_x() {
        let rows = vec![
            row_from([("year", CellValue::from(2020.0)), ("v", CellValue::from(1.0))]),
            row_from([("year", CellValue::from("2020")), ("v", CellValue::from(3.0))]),
        ];
        let result = aggregate(&rows, "year", &keys(&["v"]), None);
        assert_eq!(result.points.len(), 1);
        assert_eq!(result.points[0].x, CellValue::Number(2020.0));
        assert_eq!(result.points[0].get("v"), Some(2.0));
    }

    #[test]
    fn test_points_sorted_by_x() {
        let rows = vec![
            row_from([("x", CellValue::from(10.0)), ("v", CellValue::from(1.0))]),
            row_from([("x", CellValue::from(9.0)), ("v", CellValue::from(1.0))]),
            row_from([("x", CellValue::from(100.0)), ("v", CellValue::from(1.0))]),
        ];
        let result = aggregate(&rows, "x", &keys(&["v"]), None);
        let xs: Vec<f64> = result.points.iter().filter_map(|p| p.x.as_number()).collect();
        assert_eq!(xs, vec![9.0, 10.0, 100.0]);

        let dates = vec![
            row_from([("date", CellValue::from("2024-03-01")), ("v", CellValue::from(1.0))]),
            row_from([("date", CellValue::from("2023-12-31")), ("v", CellValue::from(1.0))]),
        ];
        let result = aggregate(&dates, "date", &keys(&["v"]), None);
        assert_eq!(result.points[0].x, CellValue::from("2023-12-31"));
    }

    #[test]
    fn test_grouped_last_write_wins() {
        let rows = vec![
            row_from([("year", CellValue::from(2020.0)), ("ticker", CellValue::from("AAPL")), ("rev", CellValue::from(1.0))]),
            row_from([("year", CellValue::from(2020.0)), ("ticker", CellValue::from("MSFT")), ("rev", CellValue::from(7.0))]),
            row_from([("year", CellValue::from(2020.0)), ("ticker", CellValue::from("AAPL")), ("rev", CellValue::from(3.0))]),
            row_from([("year", CellValue::from(2021.0)), ("ticker", CellValue::from("AAPL")), ("rev", CellValue::from(4.0))]),
        ];
        let result = aggregate(&rows, "year", &keys(&["rev"]), Some("ticker"));

        assert_eq!(result.points.len(), 2);
        assert_eq!(result.points[0].get("AAPL_rev"), Some(3.0));
        assert_eq!(result.points[0].get("MSFT_rev"), Some(7.0));
        assert_eq!(result.points[1].get("AAPL_rev"), Some(4.0));
        assert!(!result.points[1].values.contains_key("MSFT_rev"));

        let series: Vec<&str> = result.series.iter().map(|s| s.data_key.as_str()).collect();
        assert_eq!(series, vec!["AAPL_rev", "MSFT_rev"]);
    }

    #[test]
    fn test_grouped_skips_falsy_keys() {
        let rows = vec![
            row_from([("year", CellValue::from(0.0)), ("g", CellValue::from("a")), ("v", CellValue::from(1.0))]),
            row_from([("year", CellValue::from(2020.0)), ("g", CellValue::from("")), ("v", CellValue::from(1.0))]),
            row_from([("year", CellValue::from(2020.0)), ("g", CellValue::from(false)), ("v", CellValue::from(1.0))]),
            row_from([("year", CellValue::from(2020.0)), ("v", CellValue::from(1.0))]),
            row_from([("year", CellValue::from(2020.0)), ("g", CellValue::from("b")), ("v", CellValue::from("x"))]),
        ];
        let result = aggregate(&rows, "year", &keys(&["v"]), Some("g"));
        assert_eq!(result.points.len(), 1);
        assert!(result.points[0].values.is_empty());
        assert!(result.series.is_empty());
    }

    #[test]
    fn test_grouped_series_exclude_count_fields() {
        let rows = vec![row_from([
            ("q", CellValue::from("Q1")),
            ("region", CellValue::from("west")),
            ("sales", CellValue::from(5.0)),
            ("sales_count", CellValue::from(2.0)),
        ])];
        let result = aggregate(&rows, "q", &keys(&["sales", "sales_count"]), Some("region"));
        let series: Vec<&str> = result.series.iter().map(|s| s.data_key.as_str()).collect();
        assert_eq!(series, vec!["west_sales"]);
        assert_eq!(result.points[0].get("west_sales_count"), Some(2.0));
    }

    #[test]
    fn test_empty_group_key_means_ungrouped() {
        let result = aggregate(&sample(), "d", &keys(&["v"]), Some(""));
        assert_eq!(result.points[0].get("v"), Some(15.0));
    }

    #[test]
    fn test_series_colors_cycle() {
        let y: Vec<String> = (0..10).map(|i| format!("m{}", i)).collect();
        let rows = vec![row_from([("x", CellValue::from(1.0))])];
        let result = aggregate(&rows, "x", &y, None);
        assert_eq!(result.series[0].color, result.series[8].color);
        assert_ne!(result.series[0].color, result.series[1].color);
    }
}
