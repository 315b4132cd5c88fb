use gridview_domain::ViewId;

/// What clicking a view tab does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabAction {
    /// Drop the view and suppress the user's default.
    ShowAll,
    /// Load a saved or system view.
    SwitchView(ViewId),
}

/// Entry of an active tab's dropdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabMenuItem {
    /// Overwrite the view with the current toolbar state.
    UpdateView,
    /// Store the view as the viewer's default.
    SetDefault,
    /// Drop the viewer's default.
    RemoveDefault,
    /// Delete the view.
    DeleteView,
}

/// One tab of the view strip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewTab {
    /// Tab label.
    pub label: String,
    /// Click target.
    pub action: TabAction,
    /// Currently loaded.
    pub active: bool,
    /// Shows the preferred star.
    pub preferred: bool,
    /// Dropdown entries; empty for inactive tabs.
    pub menu: Vec<TabMenuItem>,
}

/// Removable (or locked) badge for one active filter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPill {
    /// Filter key as it appears in `filters.active`.
    pub column: String,
    /// Raw value.
    pub value: String,
    /// Column label shown before the colon.
    pub column_label: String,
    /// Value label, resolved through dropdown options.
    pub value_label: String,
    /// Rendered without a remove button and with a lock glyph.
    pub locked: bool,
}

impl FilterPill {
    /// Text of the badge.
    #[must_use]
    pub fn text(&self) -> String {
        format!("{}: {}", self.column_label, self.value_label)
    }
}

/// Pills that combine with OR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PillGroup {
    /// Explicit group index or `auto-N`.
    pub id: String,
    /// Pills in render order.
    pub pills: Vec<FilterPill>,
}

impl PillGroup {
    /// Text of the group with `OR` between pills.
    #[must_use]
    pub fn text(&self) -> String {
        self.pills
            .iter()
            .map(FilterPill::text)
            .collect::<Vec<_>>()
            .join(" OR ")
    }
}

/// One entry of the pill bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PillEntry {
    /// Search term; always first.
    Search(String),
    /// Filter outside any OR group.
    Filter(FilterPill),
    /// OR group.
    Group(PillGroup),
}

/// Kind of a filter navigation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterNavKind {
    /// Checkbox list.
    Dropdown,
    /// From/To pair.
    DateRange,
}

/// Left-hand entry of the filter dropdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterNavItem {
    /// Filter key, or base column for date ranges.
    pub key: String,
    /// Label without the after/before suffix.
    pub label: String,
    /// Panel kind.
    pub kind: FilterNavKind,
    /// Number of active values.
    pub active_count: usize,
    /// First entry starts selected.
    pub selected: bool,
}

/// Checkbox of a dropdown filter panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCheckbox {
    /// Filter key.
    pub column: String,
    /// Option value.
    pub value: String,
    /// Option label.
    pub label: String,
    /// Value is active.
    pub checked: bool,
    /// Input is disabled.
    pub disabled: bool,
}

/// Date input of a date-range panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateInput {
    /// `<col>_start` or `<col>_end`.
    pub filter_key: String,
    /// Current value, empty when unset.
    pub value: String,
    /// Input is disabled.
    pub disabled: bool,
}

/// Body of a filter panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterPanelBody {
    /// Dropdown checkboxes.
    Options(Vec<FilterCheckbox>),
    /// From and To inputs.
    DateRange {
        /// Lower bound input.
        from: Option<DateInput>,
        /// Upper bound input.
        to: Option<DateInput>,
    },
}

/// Right-hand panel of the filter dropdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPanel {
    /// Same key as the matching navigation entry.
    pub key: String,
    /// Panel title.
    pub label: String,
    /// Filter is locked.
    pub locked: bool,
    /// Number of active values.
    pub active_count: usize,
    /// Help line under the title.
    pub help_text: &'static str,
    /// First panel starts visible.
    pub visible: bool,
    /// Inputs.
    pub body: FilterPanelBody,
}

/// Row of the column picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnPickerItem {
    /// Column key.
    pub key: String,
    /// Label, falling back to the key.
    pub label: String,
    /// Optional description line.
    pub description: Option<String>,
    /// Checkbox is ticked.
    pub visible: bool,
    /// Checkbox is disabled.
    pub required: bool,
}

/// Toolbar state rebuilt from one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToolbarModel {
    /// Grid the toolbar belongs to.
    pub grid_key: String,
    /// View strip.
    pub view_tabs: Vec<ViewTab>,
    /// Pill bar, search first.
    pub pills: Vec<PillEntry>,
    /// Badge on the Filter button; zero hides it.
    pub filter_count: usize,
    /// Filter dropdown navigation.
    pub filter_nav: Vec<FilterNavItem>,
    /// Filter dropdown panels.
    pub filter_panels: Vec<FilterPanel>,
    /// Shows the "clear filters" footer.
    pub show_clear_filters: bool,
    /// Column picker rows.
    pub column_picker: Vec<ColumnPickerItem>,
    /// Value of the search input.
    pub search_value: String,
}

impl ToolbarModel {
    /// Returns the active tab.
    #[must_use]
    pub fn active_tab(&self) -> Option<&ViewTab> {
        self.view_tabs.iter().find(|tab| tab.active)
    }

    /// Returns whether the checkbox for `column`/`value` is ticked.
    #[must_use]
    pub fn is_checked(&self, column: &str, value: &str) -> bool {
        self.filter_panels.iter().any(|panel| match &panel.body {
            FilterPanelBody::Options(checkboxes) => checkboxes
                .iter()
                .any(|checkbox| checkbox.column == column && checkbox.value == value && checkbox.checked),
            FilterPanelBody::DateRange { .. } => false,
        })
    }

    /// Returns every filter pill, grouped or not, in render order.
    #[must_use]
    pub fn filter_pills(&self) -> Vec<&FilterPill> {
        self.pills
            .iter()
            .flat_map(|entry| match entry {
                PillEntry::Search(_) => Vec::new(),
                PillEntry::Filter(pill) => vec![pill],
                PillEntry::Group(group) => group.pills.iter().collect(),
            })
            .collect()
    }
}
