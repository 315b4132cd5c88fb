use std::str::FromStr;

use gridview_core::AppError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::filter::{ExpressionNode, FilterCondition};

/// Page size used when a config carries none.
pub const DEFAULT_PAGE_SIZE: u32 = 25;
/// Smallest page size a config may request.
pub const MIN_PAGE_SIZE: u32 = 10;
/// Largest page size a config may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Ascending order.
    Asc,
    /// Descending order.
    Desc,
}

impl SortDirection {
    /// Returns stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// Returns the upper-case form used in native order clauses.
    #[must_use]
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(AppError::Validation(format!(
                "unknown sort direction '{value}'"
            ))),
        }
    }
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// Column key.
    pub field: String,
    /// Direction.
    pub direction: SortDirection,
}

impl SortSpec {
    /// Creates a sort key.
    #[must_use]
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

fn default_visible() -> bool {
    true
}

/// Visibility and position of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Column key.
    pub key: String,
    /// Explicit visibility; required columns ignore it.
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Position; absent entries sort last.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

impl ColumnSpec {
    /// Creates a column entry.
    #[must_use]
    pub fn new(key: impl Into<String>, visible: bool, order: Option<i64>) -> Self {
        Self {
            key: key.into(),
            visible,
            order,
        }
    }
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// Declarative filter, sort, column and paging configuration of a grid view.
///
/// `filters` (flat AND list) and `expression` (nested tree) are independent
/// representations; compilers consult each on its own and never merge them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridViewConfig {
    /// Legacy flat AND list.
    #[serde(default)]
    pub filters: Vec<FilterCondition>,
    /// Nested OR/AND expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<ExpressionNode>,
    /// Ordered sort keys.
    #[serde(default)]
    pub sort: Vec<SortSpec>,
    /// Column visibility and order.
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
    /// Rows per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Search term duplicated at top level for convenience.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl Default for GridViewConfig {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            expression: None,
            sort: Vec::new(),
            columns: Vec::new(),
            page_size: DEFAULT_PAGE_SIZE,
            search: None,
        }
    }
}

impl GridViewConfig {
    /// Returns the config as JSON.
    #[must_use]
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Returns the saved search term, preferring a `_search` filter.
    #[must_use]
    pub fn saved_search(&self) -> Option<String> {
        self.filters
            .iter()
            .find(|filter| filter.is_search())
            .map(|filter| crate::filter::scalar_text(&filter.value))
            .or_else(|| self.search.clone())
            .filter(|term| !term.is_empty())
    }

    /// Returns the ordered `(field, ASC|DESC)` pairs.
    #[must_use]
    pub fn extract_sort(&self) -> Vec<(String, &'static str)> {
        self.sort
            .iter()
            .map(|sort| (sort.field.clone(), sort.direction.as_sql()))
            .collect()
    }
}
