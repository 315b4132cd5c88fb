use serde::{Deserialize, Serialize};

/// Value type a grid column renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Plain text.
    #[default]
    String,
    /// Numeric value.
    Number,
    /// Boolean flag; filter values are cast before comparison.
    Boolean,
    /// Calendar date.
    Date,
    /// Date with time.
    Datetime,
    /// Value resolved through an association.
    Relation,
    /// Status-like badge.
    Badge,
    /// Email address.
    Email,
}

impl ColumnType {
    /// Returns stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::Relation => "relation",
            Self::Badge => "badge",
            Self::Email => "email",
        }
    }
}

/// Filter widget a column exposes in the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterType {
    /// Checkbox list of discrete options.
    Dropdown,
    /// Pair of `<col>_start` / `<col>_end` date bounds.
    DateRange,
}

/// One selectable option of a dropdown filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    /// Raw value sent in `filter[<col>]`.
    pub value: String,
    /// Human label.
    pub label: String,
}

impl FilterOption {
    /// Creates an option.
    #[must_use]
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Metadata describing one column of a grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMetadata {
    /// Stable column key.
    pub key: String,
    /// Display label.
    pub label: String,
    /// Value type.
    #[serde(rename = "type", default)]
    pub column_type: ColumnType,
    /// Whether the column may be sorted.
    #[serde(default = "default_true")]
    pub sortable: bool,
    /// Whether `filter[<key>]` is honoured.
    #[serde(default)]
    pub filterable: bool,
    /// Whether the search term is matched against the column.
    #[serde(default)]
    pub searchable: bool,
    /// Required columns are always visible.
    #[serde(default)]
    pub required: bool,
    /// Visible when no view or `columns` parameter says otherwise.
    #[serde(default = "default_true")]
    pub default_visible: bool,
    /// Toolbar filter widget.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_type: Option<FilterType>,
    /// Options for dropdown filters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filter_options: Vec<FilterOption>,
    /// Explicit field used for sort and search instead of the qualified key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_field: Option<String>,
    /// Field rendered for relation columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub render_field: Option<String>,
    /// Present only in exports; never offered in the column picker.
    #[serde(default)]
    pub export_only: bool,
    /// Optional help text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ColumnMetadata {
    /// Creates a plain sortable, visible text column.
    #[must_use]
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            column_type: ColumnType::String,
            sortable: true,
            filterable: false,
            searchable: false,
            required: false,
            default_visible: true,
            filter_type: None,
            filter_options: Vec::new(),
            query_field: None,
            render_field: None,
            export_only: false,
            description: None,
        }
    }

    /// Sets the value type.
    #[must_use]
    pub fn with_type(mut self, column_type: ColumnType) -> Self {
        self.column_type = column_type;
        self
    }

    /// Marks the column as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the column as searchable.
    #[must_use]
    pub fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    /// Marks the column as not sortable.
    #[must_use]
    pub fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    /// Hides the column by default.
    #[must_use]
    pub fn hidden_by_default(mut self) -> Self {
        self.default_visible = false;
        self
    }

    /// Exposes a dropdown filter with the given options.
    #[must_use]
    pub fn with_dropdown(mut self, options: Vec<FilterOption>) -> Self {
        self.filterable = true;
        self.filter_type = Some(FilterType::Dropdown);
        self.filter_options = options;
        self
    }

    /// Exposes a date-range filter.
    #[must_use]
    pub fn with_date_range(mut self) -> Self {
        self.filterable = true;
        self.filter_type = Some(FilterType::DateRange);
        self
    }

    /// Sets the explicit query field.
    #[must_use]
    pub fn with_query_field(mut self, query_field: impl Into<String>) -> Self {
        self.query_field = Some(query_field.into());
        self
    }

    /// Returns true for dropdown columns that carry options.
    #[must_use]
    pub fn has_dropdown_filter(&self) -> bool {
        self.filter_type == Some(FilterType::Dropdown) && !self.filter_options.is_empty()
    }

    /// Returns true for date-range columns.
    #[must_use]
    pub fn has_date_range_filter(&self) -> bool {
        self.filter_type == Some(FilterType::DateRange)
    }

    /// Returns the option label for a raw value.
    #[must_use]
    pub fn option_label(&self, value: &str) -> Option<&str> {
        self.filter_options
            .iter()
            .find(|option| option.value == value)
            .map(|option| option.label.as_str())
    }
}

/// Ordered column metadata for one grid.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnCatalog {
    columns: Vec<ColumnMetadata>,
}

impl ColumnCatalog {
    /// Creates a catalog preserving declaration order.
    #[must_use]
    pub fn new(columns: Vec<ColumnMetadata>) -> Self {
        Self { columns }
    }

    /// Returns true when no metadata is available.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the column count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Iterates columns in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ColumnMetadata> {
        self.columns.iter()
    }

    /// Looks a column up by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|column| column.key == key)
    }

    /// Returns true when the key is declared.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Returns keys of required columns.
    #[must_use]
    pub fn required_keys(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|column| column.required)
            .map(|column| column.key.as_str())
            .collect()
    }

    /// Returns keys of default-visible columns in declaration order.
    #[must_use]
    pub fn default_visible_keys(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|column| column.default_visible)
            .map(|column| column.key.clone())
            .collect()
    }

    /// Returns searchable columns.
    pub fn searchable(&self) -> impl Iterator<Item = &ColumnMetadata> {
        self.columns.iter().filter(|column| column.searchable)
    }

    /// Returns dropdown filter columns that carry options.
    pub fn dropdown_filters(&self) -> impl Iterator<Item = &ColumnMetadata> {
        self.columns
            .iter()
            .filter(|column| column.has_dropdown_filter())
    }

    /// Returns date-range filter columns.
    pub fn date_range_filters(&self) -> impl Iterator<Item = &ColumnMetadata> {
        self.columns
            .iter()
            .filter(|column| column.has_date_range_filter())
    }

    /// Returns false only for declared columns marked unsortable.
    #[must_use]
    pub fn is_sortable(&self, key: &str) -> bool {
        self.get(key).is_none_or(|column| column.sortable)
    }
}

impl FromIterator<ColumnMetadata> for ColumnCatalog {
    fn from_iter<T: IntoIterator<Item = ColumnMetadata>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{ColumnCatalog, ColumnMetadata, FilterOption, FilterType};

    #[test]
    fn metadata_deserializes_camel_case_with_defaults() {
        let column: Result<ColumnMetadata, _> = serde_json::from_value(serde_json::json!({
            "key": "status",
            "label": "Status",
            "filterType": "dropdown",
            "filterOptions": [{"value": "active", "label": "Active"}],
            "defaultVisible": false
        }));
        assert!(column.is_ok());
        let column = column.unwrap_or_else(|_| unreachable!());

        assert!(column.sortable);
        assert!(!column.default_visible);
        assert_eq!(column.filter_type, Some(FilterType::Dropdown));
        assert_eq!(column.option_label("active"), Some("Active"));
    }

    #[test]
    fn catalog_sortability_only_blocks_declared_unsortable_columns() {
        let catalog = ColumnCatalog::new(vec![
            ColumnMetadata::new("name", "Name"),
            ColumnMetadata::new("notes", "Notes").unsortable(),
        ]);

        assert!(catalog.is_sortable("name"));
        assert!(!catalog.is_sortable("notes"));
        assert!(catalog.is_sortable("unknown"));
    }

    #[test]
    fn dropdown_without_options_is_not_offered() {
        let catalog = ColumnCatalog::new(vec![
            ColumnMetadata::new("status", "Status").with_dropdown(Vec::new()),
            ColumnMetadata::new("kind", "Kind").with_dropdown(vec![FilterOption::new("a", "A")]),
        ]);

        let keys: Vec<_> = catalog
            .dropdown_filters()
            .map(|column| column.key.as_str())
            .collect();
        assert_eq!(keys, vec!["kind"]);
    }
}
