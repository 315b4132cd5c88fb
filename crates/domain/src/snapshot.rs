use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::column::{ColumnMetadata, FilterOption};
use crate::config::SortSpec;
use crate::ordered_map::OrderedMap;

/// Identifier of a selectable view: a saved view row or a system view key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ViewId {
    /// Persisted saved view.
    Saved(i64),
    /// Code-declared system view.
    System(String),
}

impl ViewId {
    /// Reads an identifier from a URL or form value; numeric text is a saved view.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        value
            .trim()
            .parse::<i64>()
            .map_or_else(|_| Self::System(value.to_owned()), Self::Saved)
    }

    /// Returns the saved view id, if any.
    #[must_use]
    pub fn as_saved(&self) -> Option<i64> {
        match self {
            Self::Saved(id) => Some(*id),
            Self::System(_) => None,
        }
    }
}

impl Display for ViewId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Saved(id) => write!(formatter, "{id}"),
            Self::System(key) => formatter.write_str(key),
        }
    }
}

fn default_true() -> bool {
    true
}

/// One selectable view tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSummary {
    /// View identifier.
    pub id: ViewId,
    /// Tab label.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: String,
    /// Stored as the viewer's preferred view.
    #[serde(default)]
    pub is_preferred: bool,
    /// Loads when no view is requested.
    #[serde(default)]
    pub is_default: bool,
    /// Marked as the viewer's own default.
    #[serde(default)]
    pub is_user_default: bool,
    /// Shared default for everyone.
    #[serde(default)]
    pub is_system_default: bool,
    /// Viewer may update or delete it.
    #[serde(default = "default_true")]
    pub can_manage: bool,
}

/// Which view is active and which are on offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    /// Active view, `None` for "All".
    #[serde(default)]
    pub current_id: Option<ViewId>,
    /// Active view label.
    #[serde(default)]
    pub current_name: String,
    /// Viewer's stored preference.
    #[serde(default)]
    pub preferred_id: Option<ViewId>,
    /// Shared default saved view.
    #[serde(default)]
    pub system_default_id: Option<ViewId>,
    /// Active view is the preference.
    #[serde(default)]
    pub is_preferred: bool,
    /// Active view is the default.
    #[serde(default)]
    pub is_default: bool,
    /// Active view is the viewer's own default.
    #[serde(default)]
    pub is_user_default: bool,
    /// Views in tab order.
    #[serde(default)]
    pub available: Vec<ViewSummary>,
    /// Search stored on the active view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            current_id: None,
            current_name: "All".to_owned(),
            preferred_id: None,
            system_default_id: None,
            is_preferred: false,
            is_default: false,
            is_user_default: false,
            available: Vec::new(),
            search: None,
        }
    }
}

/// Active value(s) of one filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActiveFilterValue {
    /// One value.
    Single(String),
    /// Several values combined with OR.
    Multiple(Vec<String>),
}

impl ActiveFilterValue {
    /// Returns the values as a list.
    #[must_use]
    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::Single(value) => vec![value.as_str()],
            Self::Multiple(values) => values.iter().map(String::as_str).collect(),
        }
    }

    /// Returns how many discrete values are active.
    #[must_use]
    pub fn count(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Multiple(values) => values.len(),
        }
    }

    /// Returns true when the value is active.
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.values().contains(&value)
    }

    /// Builds a single or multiple value from a list.
    #[must_use]
    pub fn from_values(mut values: Vec<String>) -> Self {
        if values.len() == 1 {
            Self::Single(values.remove(0))
        } else {
            Self::Multiple(values)
        }
    }

    /// Appends a value, turning a single into a list.
    pub fn push(&mut self, value: String) {
        match self {
            Self::Single(existing) => {
                *self = Self::Multiple(vec![std::mem::take(existing), value]);
            }
            Self::Multiple(values) => values.push(value),
        }
    }
}

/// Marks a date-range half in `filters.available`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AvailableFilterKind {
    /// `<col>_start` lower bound.
    DateRangeStart,
    /// `<col>_end` upper bound.
    DateRangeEnd,
}

/// Filter offered in the toolbar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableFilter {
    /// Label.
    pub label: String,
    /// Dropdown options.
    #[serde(default)]
    pub options: Vec<FilterOption>,
    /// Date-range half, if any.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<AvailableFilterKind>,
    /// Column a date-range half belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_field: Option<String>,
}

impl AvailableFilter {
    /// Returns true for date-range halves.
    #[must_use]
    pub fn is_date_range(&self) -> bool {
        self.kind.is_some()
    }
}

/// Explicit OR groups derived from a system view expression.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterGrouping {
    /// Each inner list is a set of fields joined by OR.
    #[serde(default)]
    pub or_groups: Vec<Vec<String>>,
}

/// Active and available filters.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterState {
    /// Active values by filter key.
    #[serde(default)]
    pub active: OrderedMap<ActiveFilterValue>,
    /// Offered filters by filter key.
    #[serde(default)]
    pub available: OrderedMap<AvailableFilter>,
    /// OR grouping of active filters.
    #[serde(default)]
    pub grouping: FilterGrouping,
}

/// Visible and known columns.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColumnState {
    /// Visible keys in display order.
    #[serde(default)]
    pub visible: Vec<String>,
    /// Every column by key.
    #[serde(default)]
    pub all: OrderedMap<ColumnMetadata>,
}

/// Grid-level settings for the toolbar.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SnapshotConfig {
    /// Grid key; the data frame id is `<gridKey>-table`.
    pub grid_key: String,
    /// Row identifier field.
    pub primary_key: String,
    /// Rows per page.
    pub page_size: u32,
    /// Offer the "All" tab.
    pub show_all_tab: bool,
    /// Allow saving new views.
    pub can_add_views: bool,
    /// Any filter control is available.
    pub can_filter: bool,
    /// A search box is available.
    pub has_search: bool,
    /// Dropdown filters are available.
    pub has_dropdown_filters: bool,
    /// Date-range filters are available.
    pub has_date_range_filters: bool,
    /// Render pills.
    pub show_filter_pills: bool,
    /// Render view tabs.
    pub show_view_tabs: bool,
    /// Render the column picker.
    pub enable_column_picker: bool,
    /// Filters the user may not change.
    pub locked_filters: Vec<String>,
}

/// Sort currently applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    /// Column key or query field.
    pub field: String,
    /// `asc` or `desc`.
    pub direction: String,
}

impl From<SortSpec> for SortState {
    fn from(value: SortSpec) -> Self {
        Self {
            field: value.field,
            direction: value.direction.as_str().to_owned(),
        }
    }
}

/// Complete server state embedded in every data frame.
///
/// The client rebuilds its toolbar from this value alone; it is never
/// patched in place.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// View tabs.
    #[serde(default)]
    pub view: ViewState,
    /// Applied search term.
    #[serde(default)]
    pub search: Option<String>,
    /// Filters.
    #[serde(default)]
    pub filters: FilterState,
    /// Applied sort.
    #[serde(default)]
    pub sort: Option<SortState>,
    /// Columns.
    #[serde(default)]
    pub columns: ColumnState,
    /// Grid settings.
    #[serde(default)]
    pub config: SnapshotConfig,
}

impl StateSnapshot {
    /// Returns the applied search term when non-blank.
    #[must_use]
    pub fn active_search(&self) -> Option<&str> {
        self.search
            .as_deref()
            .filter(|search| !search.trim().is_empty())
    }
}
