//! Local filter evaluation
//!
//! Filters are evaluated against rows already held in memory. Operator
//! semantics depend on the column type: text compares case-insensitively,
//! numbers compare after `Number()` coercion and dates compare their raw
//! string form lexicographically, which is only correct for ISO dates.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Deserialize};
use fd_core::value::parse_js_number;
use fd_core::{present, CellValue, Row};

use crate::schema::{ColumnType, ColumnTypes};

/// Filter operator as offered by the filter panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Contains,
    Equals,
    StartsWith,
    EndsWith,
    NotContains,
    NotEquals,
    Gt,
    Gte,
    Lt,
    Lte,
    Between,
    Before,
    After,
}

const TEXT_OPERATORS: &[Operator] = &[
    Operator::Contains,
    Operator::Equals,
    Operator::StartsWith,
    Operator::EndsWith,
    Operator::NotContains,
];

const NUMBER_OPERATORS: &[Operator] = &[
    Operator::Equals,
    Operator::NotEquals,
    Operator::Gt,
    Operator::Gte,
    Operator::Lt,
    Operator::Lte,
    Operator::Between,
];

const DATE_OPERATORS: &[Operator] = &[
    Operator::Equals,
    Operator::Before,
    Operator::After,
    Operator::Between,
];

impl Operator {
    /// Identifier used by the filter panel
    pub fn id(&self) -> &'static str {
        match self {
            Operator::Contains => "contains",
            Operator::Equals => "equals",
            Operator::StartsWith => "startsWith",
            Operator::EndsWith => "endsWith",
            Operator::NotContains => "notContains",
            Operator::NotEquals => "notEquals",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Between => "between",
            Operator::Before => "before",
            Operator::After => "after",
        }
    }

    /// Operators offered for a column type, in display order
    pub fn for_type(column_type: ColumnType) -> &'static [Operator] {
        match column_type {
            ColumnType::Text => TEXT_OPERATORS,
            ColumnType::Numeric => NUMBER_OPERATORS,
            ColumnType::Date => DATE_OPERATORS,
        }
    }

    /// Operator preselected when a column is picked
    pub fn default_for(column_type: ColumnType) -> Operator {
        Self::for_type(column_type)[0]
    }

    /// Whether the operator needs a second value
    pub fn is_range(&self) -> bool {
        matches!(self, Operator::Between)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [TEXT_OPERATORS, NUMBER_OPERATORS, DATE_OPERATORS]
            .iter()
            .flat_map(|ops| ops.iter())
            .find(|op| op.id() == s)
            .copied()
            .ok_or_else(|| format!("unknown filter operator '{}'", s))
    }
}

/// How clause results combine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FilterLogic {
    #[default]
    And,
    Or,
}

impl FromStr for FilterLogic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AND" => Ok(FilterLogic::And),
            "OR" => Ok(FilterLogic::Or),
            other => Err(format!("unknown filter logic '{}'", other)),
        }
    }
}

/// One row of the filter panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterClause {
    pub column: String,
    pub operator: Operator,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value2: Option<String>,
}

impl FilterClause {
    pub fn new(column: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            operator,
            value: value.into(),
            value2: None,
        }
    }

    /// Set the upper bound for `between`
    pub fn with_value2(mut self, value2: impl Into<String>) -> Self {
        self.value2 = Some(value2.into());
        self
    }

    /// A clause without a column or value does not filter anything
    pub fn is_noop(&self) -> bool {
        self.column.is_empty() || self.value.is_empty()
    }

    /// Evaluate against one row given the column's type
    pub fn matches(&self, row: &Row, column_type: ColumnType) -> bool {
        if self.is_noop() {
            return true;
        }
        let Some(cell) = present(row, &self.column) else {
            return false;
        };

        match column_type {
            ColumnType::Text => self.matches_text(cell),
            ColumnType::Numeric => self.matches_number(cell),
            ColumnType::Date => self.matches_date(cell),
        }
    }

    fn matches_text(&self, cell: &CellValue) -> bool {
        let haystack = cell.to_js_string().to_lowercase();
        let needle = self.value.to_lowercase();
        match self.operator {
            Operator::Contains => haystack.contains(&needle),
            Operator::Equals => haystack == needle,
            Operator::StartsWith => haystack.starts_with(&needle),
            Operator::EndsWith => haystack.ends_with(&needle),
            Operator::NotContains => !haystack.contains(&needle),
            // Operators from another column type leave the row alone
            _ => true,
        }
    }

    fn matches_number(&self, cell: &CellValue) -> bool {
        let actual = cell.to_js_number();
        let expected = parse_js_number(&self.value);
        if actual.is_nan() || expected.is_nan() {
            return false;
        }

        match self.operator {
            Operator::Equals => actual == expected,
            Operator::NotEquals => actual != expected,
            Operator::Gt => actual > expected,
            Operator::Gte => actual >= expected,
            Operator::Lt => actual < expected,
            Operator::Lte => actual <= expected,
            Operator::Between => match self.upper_bound().map(parse_js_number) {
                Some(upper) if !upper.is_nan() => actual >= expected && actual <= upper,
                _ => false,
            },
            _ => true,
        }
    }

    fn matches_date(&self, cell: &CellValue) -> bool {
        let actual = cell.to_js_string();
        let expected = self.value.as_str();
        match self.operator {
            Operator::Equals => actual == expected,
            Operator::Before => actual.as_str() < expected,
            Operator::After => actual.as_str() > expected,
            Operator::Between => match self.upper_bound() {
                Some(upper) => actual.as_str() >= expected && actual.as_str() <= upper,
                None => false,
            },
            _ => true,
        }
    }

    fn upper_bound(&self) -> Option<&str> {
        self.value2.as_deref().filter(|v| !v.is_empty())
    }
}

/// Evaluates a clause list against rows
pub struct FilterEvaluator<'a> {
    filters: &'a [FilterClause],
    logic: FilterLogic,
    column_types: &'a ColumnTypes,
}

impl<'a> FilterEvaluator<'a> {
    pub fn new(filters: &'a [FilterClause], logic: FilterLogic, column_types: &'a ColumnTypes) -> Self {
        Self {
            filters,
            logic,
            column_types,
        }
    }

    /// Whether a single row passes
    pub fn matches(&self, row: &Row) -> bool {
        if self.filters.is_empty() {
            return true;
        }

        let mut results = self.filters.iter().map(|clause| {
            let column_type = self
                .column_types
                .get(&clause.column)
                .copied()
                .unwrap_or(ColumnType::Text);
            clause.matches(row, column_type)
        });

        match self.logic {
            FilterLogic::And => results.all(|passed| passed),
            FilterLogic::Or => results.any(|passed| passed),
        }
    }

    /// The passing rows, in input order
    pub fn apply(&self, rows: &[Row]) -> Vec<Row> {
        let filtered: Vec<Row> = rows.iter().filter(|row| self.matches(row)).cloned().collect();
        tracing::debug!(
            "Filtered {} rows down to {} with {} clause(s) ({:?})",
            rows.len(),
            filtered.len(),
            self.filters.len(),
            self.logic
        );
        filtered
    }
}

/// Shorthand for `FilterEvaluator::new(..).apply(rows)`
pub fn apply_filters(
    rows: &[Row],
    filters: &[FilterClause],
    logic: FilterLogic,
    column_types: &ColumnTypes,
) -> Vec<Row> {
    FilterEvaluator::new(filters, logic, column_types).apply(rows)
}
