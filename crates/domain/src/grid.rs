use gridview_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::column::ColumnCatalog;
use crate::config::{DEFAULT_PAGE_SIZE, SortSpec};
use crate::filter::{Conjunction, ExpressionNode, FilterCondition, FilterOperator, scalar_text};
use crate::ordered_map::OrderedMap;
use crate::snapshot::{ActiveFilterValue, FilterGrouping};

/// Query settings a system view applies.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemViewConfig {
    /// Flat filters; also the source of URL-equivalent defaults.
    #[serde(default)]
    pub filters: Vec<FilterCondition>,
    /// Expression applied on top of the filters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<ExpressionNode>,
    /// Columns shown as pills but handled by the expression instead.
    #[serde(default)]
    pub skip_filter_columns: Vec<String>,
}

/// View declared with the grid rather than saved by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemView {
    /// Stable key.
    pub id: String,
    /// Tab label.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Viewer may manage it.
    #[serde(default)]
    pub can_manage: bool,
    /// Query settings.
    #[serde(default)]
    pub config: SystemViewConfig,
}

/// URL-equivalent defaults derived from a system view's flat filters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SystemViewDefaults {
    /// `filter[<col>]` equivalents.
    pub filters: OrderedMap<ActiveFilterValue>,
    /// `<col>_start` / `<col>_end` equivalents.
    pub date_range: OrderedMap<String>,
    /// Search term.
    pub search: Option<String>,
    /// Columns not applied to the query directly.
    pub skip_filter_columns: Vec<String>,
}

impl SystemViewDefaults {
    /// Returns true when the column is excluded from direct filtering.
    #[must_use]
    pub fn skips(&self, column: &str) -> bool {
        self.skip_filter_columns.iter().any(|skip| skip == column)
    }
}

fn present_text(value: &serde_json::Value) -> Option<String> {
    (!value.is_null() && value.as_str() != Some("")).then(|| scalar_text(value))
}

impl SystemView {
    /// Reduces the flat filters to the defaults the URL would otherwise carry.
    #[must_use]
    pub fn defaults(&self) -> SystemViewDefaults {
        let mut defaults = SystemViewDefaults {
            skip_filter_columns: self
                .config
                .skip_filter_columns
                .iter()
                .filter(|column| !column.is_empty())
                .cloned()
                .collect(),
            ..SystemViewDefaults::default()
        };

        for filter in &self.config.filters {
            if filter.field.is_empty() {
                continue;
            }

            if filter.is_search() {
                if let Some(term) = present_text(&filter.value) {
                    defaults.search = Some(term);
                }
                continue;
            }

            let field = filter.field.as_str();
            match filter.operator {
                FilterOperator::Eq => {
                    if let Some(value) = present_text(&filter.value) {
                        defaults
                            .filters
                            .insert(field, ActiveFilterValue::Single(value));
                    }
                }
                FilterOperator::In => {
                    let values: Vec<String> = match filter.value.as_array() {
                        Some(values) => values.iter().filter_map(present_text).collect(),
                        None => present_text(&filter.value).into_iter().collect(),
                    };
                    if !values.is_empty() {
                        defaults
                            .filters
                            .insert(field, ActiveFilterValue::Multiple(values));
                    }
                }
                FilterOperator::DateRange => {
                    if let Some(bounds) = filter.value.as_array() {
                        if let Some(start) = bounds.first().and_then(present_text) {
                            defaults.date_range.insert(format!("{field}_start"), start);
                        }
                        if let Some(end) = bounds.get(1).and_then(present_text) {
                            defaults.date_range.insert(format!("{field}_end"), end);
                        }
                    }
                }
                FilterOperator::Gte | FilterOperator::Gt => {
                    if let Some(start) = present_text(&filter.value) {
                        defaults.date_range.insert(format!("{field}_start"), start);
                    }
                }
                FilterOperator::Lte | FilterOperator::Lt => {
                    if let Some(end) = present_text(&filter.value) {
                        defaults.date_range.insert(format!("{field}_end"), end);
                    }
                }
                _ => {}
            }
        }

        defaults
    }

    /// Collects skipped fields joined by a top-level OR expression.
    ///
    /// Leaves directly under the OR and leaves of nested AND groups count.
    #[must_use]
    pub fn filter_grouping(&self, skip_filter_columns: &[String]) -> FilterGrouping {
        let mut grouping = FilterGrouping::default();
        if skip_filter_columns.is_empty() {
            return grouping;
        }

        let Some(ExpressionNode::Group {
            conjunction: Conjunction::Or,
            conditions,
        }) = &self.config.expression
        else {
            return grouping;
        };

        let mut group: Vec<String> = Vec::new();
        let mut collect = |condition: &FilterCondition| {
            if skip_filter_columns.contains(&condition.field) && !group.contains(&condition.field)
            {
                group.push(condition.field.clone());
            }
        };

        for node in conditions {
            match node {
                ExpressionNode::Condition(condition) => collect(condition),
                ExpressionNode::Group {
                    conjunction: Conjunction::And,
                    conditions: nested,
                } => {
                    for nested in nested {
                        if let ExpressionNode::Condition(condition) = nested {
                            collect(condition);
                        }
                    }
                }
                ExpressionNode::Group { .. } => {}
            }
        }

        if !group.is_empty() {
            grouping.or_groups.push(group);
        }
        grouping
    }
}

fn default_true() -> bool {
    true
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// Everything the server knows about one grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridDefinition {
    /// Stable key scoping saved views and preferences.
    pub grid_key: String,
    /// Record table and field qualifier.
    pub table_name: String,
    /// Column metadata.
    pub columns: ColumnCatalog,
    /// Sort used when nothing else applies.
    #[serde(default)]
    pub default_sort: Option<SortSpec>,
    /// Page size used when no view sets one.
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    /// System views; when absent the grid runs in saved-views mode.
    #[serde(default)]
    pub system_views: Option<Vec<SystemView>>,
    /// System view applied when nothing is selected.
    #[serde(default)]
    pub default_system_view: Option<String>,
    /// Filters the user may not change.
    #[serde(default)]
    pub locked_filters: Vec<String>,
    /// Offer the "All" tab; defaults to saved-views mode.
    #[serde(default)]
    pub show_all_tab: Option<bool>,
    /// Allow saving views; defaults to saved-views mode.
    #[serde(default)]
    pub can_add_views: Option<bool>,
    /// Allow filtering.
    #[serde(default = "default_true")]
    pub can_filter: bool,
    /// Render pills.
    #[serde(default = "default_true")]
    pub show_filter_pills: bool,
    /// Render view tabs.
    #[serde(default = "default_true")]
    pub show_view_tabs: bool,
    /// Render the column picker.
    #[serde(default = "default_true")]
    pub enable_column_picker: bool,
}

impl GridDefinition {
    /// Creates a saved-views grid with default toolbar settings.
    pub fn new(
        grid_key: impl Into<String>,
        table_name: impl Into<String>,
        columns: ColumnCatalog,
    ) -> AppResult<Self> {
        let grid_key = grid_key.into();
        if grid_key.trim().is_empty() {
            return Err(AppError::Validation("grid key must not be empty".to_owned()));
        }

        Ok(Self {
            grid_key,
            table_name: table_name.into(),
            columns,
            default_sort: None,
            default_page_size: DEFAULT_PAGE_SIZE,
            system_views: None,
            default_system_view: None,
            locked_filters: Vec::new(),
            show_all_tab: None,
            can_add_views: None,
            can_filter: true,
            show_filter_pills: true,
            show_view_tabs: true,
            enable_column_picker: true,
        })
    }

    /// Returns true when the grid declares system views.
    #[must_use]
    pub fn uses_system_views(&self) -> bool {
        self.system_views.is_some()
    }

    /// Returns whether the "All" tab is offered.
    #[must_use]
    pub fn show_all_tab(&self) -> bool {
        self.show_all_tab.unwrap_or(!self.uses_system_views())
    }

    /// Returns whether new views may be saved.
    #[must_use]
    pub fn can_add_views(&self) -> bool {
        self.can_add_views.unwrap_or(!self.uses_system_views())
    }

    /// Looks a system view up by key.
    #[must_use]
    pub fn system_view(&self, id: &str) -> Option<&SystemView> {
        self.system_views
            .as_deref()
            .and_then(|views| views.iter().find(|view| view.id == id))
    }

    /// Returns the declared default system view, or the first one.
    #[must_use]
    pub fn default_system_view(&self) -> Option<&SystemView> {
        self.default_system_view
            .as_deref()
            .and_then(|id| self.system_view(id))
            .or_else(|| self.system_views.as_deref().and_then(<[SystemView]>::first))
    }

    /// Returns true when a filter key is locked, matching `_start`/`_end` halves
    /// against their column.
    #[must_use]
    pub fn is_locked(&self, filter_key: &str) -> bool {
        is_locked_filter(&self.locked_filters, filter_key)
    }
}

/// Strips a `_start` / `_end` suffix from a date-range filter key.
#[must_use]
pub fn date_range_base(filter_key: &str) -> &str {
    filter_key
        .strip_suffix("_start")
        .or_else(|| filter_key.strip_suffix("_end"))
        .unwrap_or(filter_key)
}

/// Returns true when the filter key or its date-range column is locked.
#[must_use]
pub fn is_locked_filter(locked_filters: &[String], filter_key: &str) -> bool {
    let base = date_range_base(filter_key);
    locked_filters
        .iter()
        .any(|locked| locked == filter_key || locked == base)
}
