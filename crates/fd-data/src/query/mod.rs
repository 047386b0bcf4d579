//! Saved query configuration
//!
//! Converts filter panel state into the query object the backend persists
//! and executes, and back again when a saved query is loaded.
//!
//! The backend understands fewer operators than the filter panel offers, so
//! `startsWith`/`endsWith` degrade to `contains` on the wire. The precise
//! panel operator travels next to the wire operator in `ui_operator`, which
//! the backend ignores, so queries saved from here reload exactly.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::filter::{FilterClause, FilterLogic, Operator};
use crate::schema::{ColumnType, ColumnTypes};

/// Operator ids understood by the backend query endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    Between,
}

impl BackendOperator {
    pub fn id(&self) -> &'static str {
        match self {
            BackendOperator::Eq => "eq",
            BackendOperator::Ne => "ne",
            BackendOperator::Gt => "gt",
            BackendOperator::Gte => "gte",
            BackendOperator::Lt => "lt",
            BackendOperator::Lte => "lte",
            BackendOperator::Contains => "contains",
            BackendOperator::Between => "between",
        }
    }

    /// Wire operator for a filter panel operator
    pub fn from_ui(operator: Operator) -> Self {
        match operator {
            Operator::Contains | Operator::StartsWith | Operator::EndsWith => BackendOperator::Contains,
            Operator::Equals => BackendOperator::Eq,
            Operator::NotContains | Operator::NotEquals => BackendOperator::Ne,
            Operator::Gt | Operator::After => BackendOperator::Gt,
            Operator::Gte => BackendOperator::Gte,
            Operator::Lt | Operator::Before => BackendOperator::Lt,
            Operator::Lte => BackendOperator::Lte,
            Operator::Between => BackendOperator::Between,
        }
    }

    /// Best panel operator for a wire operator on a column of the given type
    pub fn to_ui(self, column_type: ColumnType) -> Operator {
        match (self, column_type) {
            (BackendOperator::Eq, _) => Operator::Equals,
            (BackendOperator::Ne, ColumnType::Text) => Operator::NotContains,
            (BackendOperator::Ne, _) => Operator::NotEquals,
            (BackendOperator::Gt, ColumnType::Date) => Operator::After,
            (BackendOperator::Gt, _) => Operator::Gt,
            (BackendOperator::Gte, _) => Operator::Gte,
            (BackendOperator::Lt, ColumnType::Date) => Operator::Before,
            (BackendOperator::Lt, _) => Operator::Lt,
            (BackendOperator::Lte, _) => Operator::Lte,
            (BackendOperator::Contains, _) => Operator::Contains,
            (BackendOperator::Between, _) => Operator::Between,
        }
    }
}

impl fmt::Display for BackendOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A filter as persisted in a saved query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryFilter {
    pub column: String,
    pub operator: BackendOperator,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_operator: Option<Operator>,
}

impl QueryFilter {
    /// Persisted form of a panel clause
    pub fn from_clause(clause: &FilterClause) -> Self {
        Self {
            column: clause.column.clone(),
            operator: BackendOperator::from_ui(clause.operator),
            value: clause.value.clone(),
            value2: clause.value2.clone(),
            ui_operator: Some(clause.operator),
        }
    }

    /// Panel clause for this filter
    pub fn to_clause(&self, column_types: &ColumnTypes) -> FilterClause {
        let operator = self.ui_operator.unwrap_or_else(|| {
            let column_type = column_types
                .get(&self.column)
                .copied()
                .unwrap_or(ColumnType::Text);
            self.operator.to_ui(column_type)
        });
        FilterClause {
            column: self.column.clone(),
            operator,
            value: self.value.clone(),
            value2: self.value2.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// The persisted and shareable query unit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default)]
    pub filters: Vec<QueryFilter>,
    /// `None` selects every column
    #[serde(default)]
    pub columns: Option<Vec<String>>,
    #[serde(default)]
    pub companies: Option<Vec<String>>,
    #[serde(default)]
    pub years: Option<Vec<i32>>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_order: SortOrder,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: u32,
    /// How `filters` combine
    #[serde(default)]
    pub logic: FilterLogic,
}

impl QueryConfig {
    /// Build a config from filter panel state.
    ///
    /// Incomplete clauses pass every row, so they are dropped under AND.
    /// Under OR a single incomplete clause lets every row through, and the
    /// config keeps no filters at all. An empty column selection means
    /// "all columns".
    pub fn from_ui(filters: &[FilterClause], columns: &[String], logic: FilterLogic) -> Self {
        let matches_everything = logic == FilterLogic::Or && filters.iter().any(FilterClause::is_noop);
        let filters = if matches_everything {
            Vec::new()
        } else {
            filters
                .iter()
                .filter(|clause| !clause.is_noop())
                .map(QueryFilter::from_clause)
                .collect()
        };

        Self {
            filters,
            columns: if columns.is_empty() {
                None
            } else {
                Some(columns.to_vec())
            },
            logic,
            ..Self::default()
        }
    }

    pub fn with_sort(mut self, column: impl Into<String>, order: SortOrder) -> Self {
        self.sort_by = Some(column.into());
        self.sort_order = order;
        self
    }

    pub fn with_limit(mut self, limit: u32, offset: u32) -> Self {
        self.limit = Some(limit);
        self.offset = offset;
        self
    }

    /// Filter panel clauses for this config
    pub fn to_ui_filters(&self, column_types: &ColumnTypes) -> Vec<FilterClause> {
        self.filters
            .iter()
            .map(|filter| filter.to_clause(column_types))
            .collect()
    }

    /// Column selection for the panel; empty means all columns
    pub fn selected_columns(&self) -> Vec<String> {
        self.columns.clone().unwrap_or_default()
    }
}

/// Body of a "save query" request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveQueryRequest {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    pub data_source: String,
    pub query_config: QueryConfig,
    #[serde(default)]
    pub is_public: bool,
}

/// Problems shown inline before a query is saved
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a query name")]
    MissingName,

    #[error("Add at least one filter or select columns before saving")]
    EmptyQuery,

    #[error("No data source selected")]
    MissingDataSource,
}

impl SaveQueryRequest {
    pub fn new(name: impl Into<String>, data_source: impl Into<String>, query_config: QueryConfig) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            data_source: data_source.into(),
            query_config,
            is_public: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }

    /// Check the request before sending it
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        if self.data_source.trim().is_empty() {
            return Err(ValidationError::MissingDataSource);
        }
        let has_columns = self
            .query_config
            .columns
            .as_ref()
            .is_some_and(|columns| !columns.is_empty());
        if self.query_config.filters.is_empty() && !has_columns {
            return Err(ValidationError::EmptyQuery);
        }
        Ok(())
    }
}

/// A saved query as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedQuery {
    pub id: i64,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    pub data_source: String,
    pub query_config: QueryConfig,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Read `null` as an empty string; the backend leaves optional text null
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
