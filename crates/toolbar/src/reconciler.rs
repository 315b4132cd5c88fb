use gridview_domain::{
    ActiveFilterValue, AvailableFilter, AvailableFilterKind, StateSnapshot, ViewId,
    date_range_base, is_locked_filter,
};

use crate::model::{
    ColumnPickerItem, DateInput, FilterCheckbox, FilterNavItem, FilterNavKind, FilterPanel,
    FilterPanelBody, FilterPill, PillEntry, PillGroup, TabAction, TabMenuItem, ToolbarModel,
    ViewTab,
};

const LOCKED_HELP: &str = "This filter is locked";

/// Rebuilds the whole toolbar from a snapshot.
///
/// Nothing is carried over from a previous model: the snapshot is the only
/// input.
#[must_use]
pub fn render_from_snapshot(snapshot: &StateSnapshot) -> ToolbarModel {
    let items = filter_items(snapshot);

    ToolbarModel {
        grid_key: snapshot.config.grid_key.clone(),
        view_tabs: view_tabs(snapshot),
        pills: pills(snapshot),
        filter_count: filter_count(snapshot),
        filter_nav: filter_nav(snapshot, &items),
        filter_panels: filter_panels(snapshot, &items),
        show_clear_filters: snapshot.active_search().is_some()
            || !snapshot.filters.active.is_empty(),
        column_picker: column_picker(snapshot),
        search_value: snapshot.search.clone().unwrap_or_default(),
    }
}

/// Counts one per search plus one per active filter value.
#[must_use]
pub fn filter_count(snapshot: &StateSnapshot) -> usize {
    let search = usize::from(snapshot.search.as_deref().is_some_and(|term| !term.is_empty()));
    search
        + snapshot
            .filters
            .active
            .values()
            .map(ActiveFilterValue::count)
            .sum::<usize>()
}

fn view_tabs(snapshot: &StateSnapshot) -> Vec<ViewTab> {
    let view = &snapshot.view;
    let mut tabs = Vec::with_capacity(view.available.len() + 1);

    if snapshot.config.show_all_tab {
        tabs.push(ViewTab {
            label: "All".to_owned(),
            action: TabAction::ShowAll,
            active: view.current_id.is_none(),
            preferred: false,
            menu: Vec::new(),
        });
    }

    for summary in &view.available {
        let active = view.current_id.as_ref() == Some(&summary.id);
        let preferred = summary.is_preferred || summary.is_user_default;
        tabs.push(ViewTab {
            label: summary.name.clone(),
            action: TabAction::SwitchView(summary.id.clone()),
            active,
            preferred,
            menu: tab_menu(active, preferred, summary.can_manage),
        });
    }

    tabs
}

fn tab_menu(active: bool, preferred: bool, can_manage: bool) -> Vec<TabMenuItem> {
    if !active {
        return Vec::new();
    }

    let default_item = if preferred {
        TabMenuItem::RemoveDefault
    } else {
        TabMenuItem::SetDefault
    };

    if can_manage {
        vec![TabMenuItem::UpdateView, default_item, TabMenuItem::DeleteView]
    } else {
        vec![default_item]
    }
}

fn pills(snapshot: &StateSnapshot) -> Vec<PillEntry> {
    let mut entries = Vec::new();
    if let Some(term) = snapshot.search.as_deref().filter(|term| !term.is_empty()) {
        entries.push(PillEntry::Search(term.to_owned()));
    }

    let or_groups = &snapshot.filters.grouping.or_groups;
    // A field declared in several groups belongs to the last one.
    let group_of = |column: &str| {
        or_groups
            .iter()
            .rposition(|group| group.iter().any(|field| field == column))
            .or_else(|| {
                let base = date_range_base(column);
                (base != column)
                    .then(|| {
                        or_groups
                            .iter()
                            .rposition(|group| group.iter().any(|field| field == base))
                    })
                    .flatten()
            })
    };

    let mut ungrouped = Vec::new();
    let mut explicit: Vec<(usize, Vec<FilterPill>)> = Vec::new();
    let mut automatic = Vec::new();
    let mut next_auto = or_groups.len();

    for (column, value) in snapshot.filters.active.iter() {
        let values = value.values();

        if let Some(index) = group_of(column) {
            let pills = values.iter().map(|raw| filter_pill(snapshot, column, raw));
            match explicit.iter_mut().find(|(existing, _)| *existing == index) {
                Some((_, group)) => group.extend(pills),
                None => explicit.push((index, pills.collect())),
            }
        } else if values.len() > 1 {
            automatic.push(PillGroup {
                id: format!("auto-{next_auto}"),
                pills: values
                    .iter()
                    .map(|raw| filter_pill(snapshot, column, raw))
                    .collect(),
            });
            next_auto += 1;
        } else if let Some(raw) = values.first() {
            ungrouped.push(filter_pill(snapshot, column, raw));
        }
    }

    explicit.sort_by_key(|(index, _)| *index);

    entries.extend(ungrouped.into_iter().map(PillEntry::Filter));
    entries.extend(
        explicit
            .into_iter()
            .filter(|(_, pills)| !pills.is_empty())
            .map(|(index, pills)| {
                PillEntry::Group(PillGroup {
                    id: index.to_string(),
                    pills,
                })
            }),
    );
    entries.extend(automatic.into_iter().map(PillEntry::Group));
    entries
}

fn filter_pill(snapshot: &StateSnapshot, column: &str, value: &str) -> FilterPill {
    let available = snapshot.filters.available.get(column);
    FilterPill {
        column: column.to_owned(),
        value: value.to_owned(),
        column_label: available
            .map(|filter| filter.label.clone())
            .unwrap_or_else(|| format_column_name(column)),
        value_label: available
            .and_then(|filter| value_label(filter, value))
            .unwrap_or(value)
            .to_owned(),
        locked: is_locked_filter(&snapshot.config.locked_filters, column),
    }
}

fn value_label<'a>(filter: &'a AvailableFilter, value: &str) -> Option<&'a str> {
    if filter.is_date_range() {
        return None;
    }
    filter
        .options
        .iter()
        .find(|option| option.value == value)
        .map(|option| option.label.as_str())
}

/// Title-cases a snake_case key for display.
fn format_column_name(column: &str) -> String {
    column
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

enum FilterItem<'a> {
    Dropdown {
        key: &'a str,
        filter: &'a AvailableFilter,
    },
    DateRange {
        base: String,
        label: String,
        start: Option<&'a str>,
        end: Option<&'a str>,
    },
}

impl FilterItem<'_> {
    fn key(&self) -> &str {
        match self {
            Self::Dropdown { key, .. } => key,
            Self::DateRange { base, .. } => base,
        }
    }
}

/// Dropdown filters first, then one entry per date-range column.
fn filter_items(snapshot: &StateSnapshot) -> Vec<FilterItem<'_>> {
    let mut dropdowns = Vec::new();
    let mut ranges: Vec<FilterItem<'_>> = Vec::new();

    for (key, filter) in snapshot.filters.available.iter() {
        let Some(kind) = filter.kind else {
            dropdowns.push(FilterItem::Dropdown { key, filter });
            continue;
        };

        let base = filter
            .base_field
            .clone()
            .unwrap_or_else(|| date_range_base(key).to_owned());
        let position = ranges.iter().position(|item| item.key() == base);
        let index = match position {
            Some(index) => index,
            None => {
                ranges.push(FilterItem::DateRange {
                    label: filter
                        .label
                        .replace(" (after)", "")
                        .replace(" (before)", ""),
                    base,
                    start: None,
                    end: None,
                });
                ranges.len() - 1
            }
        };

        if let Some(FilterItem::DateRange { start, end, .. }) = ranges.get_mut(index) {
            match kind {
                AvailableFilterKind::DateRangeStart => *start = Some(key),
                AvailableFilterKind::DateRangeEnd => *end = Some(key),
            }
        }
    }

    dropdowns.extend(ranges);
    dropdowns
}

fn active_values<'a>(snapshot: &'a StateSnapshot, key: &str) -> Vec<&'a str> {
    snapshot
        .filters
        .active
        .get(key)
        .map(|value| {
            value
                .values()
                .into_iter()
                .filter(|raw| !raw.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn active_date(snapshot: &StateSnapshot, key: Option<&str>) -> String {
    key.and_then(|key| active_values(snapshot, key).first().map(|raw| (*raw).to_owned()))
        .unwrap_or_default()
}

fn filter_nav(snapshot: &StateSnapshot, items: &[FilterItem<'_>]) -> Vec<FilterNavItem> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            FilterItem::Dropdown { key, filter } => FilterNavItem {
                key: (*key).to_owned(),
                label: filter.label.clone(),
                kind: FilterNavKind::Dropdown,
                active_count: active_values(snapshot, key).len(),
                selected: index == 0,
            },
            FilterItem::DateRange {
                base,
                label,
                start,
                end,
            } => FilterNavItem {
                key: base.clone(),
                label: label.clone(),
                kind: FilterNavKind::DateRange,
                active_count: [*start, *end]
                    .into_iter()
                    .filter(|key| !active_date(snapshot, *key).is_empty())
                    .count(),
                selected: index == 0,
            },
        })
        .collect()
}

fn filter_panels(snapshot: &StateSnapshot, items: &[FilterItem<'_>]) -> Vec<FilterPanel> {
    let locked_filters = &snapshot.config.locked_filters;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let locked = is_locked_filter(locked_filters, item.key());
            match item {
                FilterItem::Dropdown { key, filter } => {
                    let active = active_values(snapshot, key);
                    let checkboxes = filter
                        .options
                        .iter()
                        .map(|option| FilterCheckbox {
                            column: (*key).to_owned(),
                            value: option.value.clone(),
                            label: option.label.clone(),
                            checked: active.contains(&option.value.as_str()),
                            disabled: locked,
                        })
                        .collect();
                    FilterPanel {
                        key: (*key).to_owned(),
                        label: filter.label.clone(),
                        locked,
                        active_count: active.len(),
                        help_text: if locked {
                            LOCKED_HELP
                        } else {
                            "Choose one or more options"
                        },
                        visible: index == 0,
                        body: FilterPanelBody::Options(checkboxes),
                    }
                }
                FilterItem::DateRange {
                    base,
                    label,
                    start,
                    end,
                } => {
                    let input = |key: Option<&str>| {
                        key.map(|filter_key| DateInput {
                            filter_key: filter_key.to_owned(),
                            value: active_date(snapshot, Some(filter_key)),
                            disabled: locked,
                        })
                    };
                    let from = input(*start);
                    let to = input(*end);
                    let active_count = [&from, &to]
                        .into_iter()
                        .flatten()
                        .filter(|input| !input.value.is_empty())
                        .count();
                    FilterPanel {
                        key: base.clone(),
                        label: label.clone(),
                        locked,
                        active_count,
                        help_text: if locked {
                            LOCKED_HELP
                        } else {
                            "Select date range"
                        },
                        visible: index == 0,
                        body: FilterPanelBody::DateRange { from, to },
                    }
                }
            }
        })
        .collect()
}

fn column_picker(snapshot: &StateSnapshot) -> Vec<ColumnPickerItem> {
    let columns = &snapshot.columns;
    let visible = &columns.visible;

    let ordered = visible
        .iter()
        .filter_map(|key| columns.all.get(key).map(|column| (key.as_str(), column)))
        .chain(
            columns
                .all
                .iter()
                .filter(|(key, _)| !visible.iter().any(|shown| shown == *key)),
        );

    ordered
        .filter(|(_, column)| !column.export_only)
        .map(|(key, column)| ColumnPickerItem {
            key: key.to_owned(),
            label: if column.label.trim().is_empty() {
                key.to_owned()
            } else {
                column.label.clone()
            },
            description: column.description.clone(),
            visible: visible.iter().any(|shown| shown == key),
            required: column.required,
        })
        .collect()
}

/// Returns the active tab's view id, if a view is loaded.
#[must_use]
pub fn current_view(snapshot: &StateSnapshot) -> Option<&ViewId> {
    snapshot.view.current_id.as_ref()
}
