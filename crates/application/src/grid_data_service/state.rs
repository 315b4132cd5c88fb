use super::*;

pub(super) struct SnapshotInput<'a> {
    pub(super) grid: &'a GridDefinition,
    pub(super) actor: &'a UserIdentity,
    pub(super) resolved: &'a ResolvedView,
    pub(super) available: Vec<SavedView>,
    pub(super) search: String,
    pub(super) active: OrderedMap<ActiveFilterValue>,
    pub(super) sort: Option<SortState>,
    pub(super) visible_columns: Vec<String>,
    pub(super) page_size: u32,
    pub(super) skip: &'a [String],
}

/// Builds the complete state the toolbar is rebuilt from.
pub(super) fn build_snapshot(input: SnapshotInput<'_>) -> StateSnapshot {
    let grid = input.grid;
    let columns = &grid.columns;

    let has_search = columns.searchable().next().is_some();
    let has_dropdown_filters = grid.can_filter && columns.dropdown_filters().next().is_some();
    let has_date_range_filters = grid.can_filter && columns.date_range_filters().next().is_some();

    StateSnapshot {
        view: view_state(&input),
        search: is_truthy(&input.search).then_some(input.search.clone()),
        filters: FilterState {
            active: input.active,
            available: available_filters(grid),
            grouping: input
                .resolved
                .system
                .as_ref()
                .map(|system| system.filter_grouping(input.skip))
                .unwrap_or_default(),
        },
        sort: input.sort,
        columns: ColumnState {
            visible: input.visible_columns,
            all: columns
                .iter()
                .map(|column| (column.key.clone(), column.clone()))
                .collect(),
        },
        config: SnapshotConfig {
            grid_key: grid.grid_key.clone(),
            primary_key: "id".to_owned(),
            page_size: input.page_size,
            show_all_tab: grid.show_all_tab(),
            can_add_views: grid.can_add_views(),
            can_filter: grid.can_filter
                && (has_search || has_dropdown_filters || has_date_range_filters),
            has_search,
            has_dropdown_filters,
            has_date_range_filters,
            show_filter_pills: grid.show_filter_pills,
            show_view_tabs: grid.show_view_tabs,
            enable_column_picker: grid.enable_column_picker,
            locked_filters: grid.locked_filters.clone(),
        },
    }
}

fn available_filters(grid: &GridDefinition) -> OrderedMap<AvailableFilter> {
    let mut available = OrderedMap::new();
    if !grid.can_filter {
        return available;
    }

    for column in grid.columns.dropdown_filters() {
        available.insert(
            column.key.as_str(),
            AvailableFilter {
                label: column.label.clone(),
                options: column.filter_options.clone(),
                kind: None,
                base_field: None,
            },
        );
    }

    for column in grid.columns.date_range_filters() {
        for (suffix, label, kind) in [
            ("_start", "after", AvailableFilterKind::DateRangeStart),
            ("_end", "before", AvailableFilterKind::DateRangeEnd),
        ] {
            available.insert(
                format!("{}{suffix}", column.key),
                AvailableFilter {
                    label: format!("{} ({label})", column.label),
                    options: Vec::new(),
                    kind: Some(kind),
                    base_field: Some(column.key.clone()),
                },
            );
        }
    }

    available
}

fn is_user_default(view: &SavedView) -> bool {
    view.is_default() && view.owner_subject().is_some()
}

fn view_state(input: &SnapshotInput<'_>) -> ViewState {
    let resolved = input.resolved;
    let preferred = resolved.preferred.clone();
    let is_preferred = |id: &ViewId| preferred.as_ref() == Some(id);
    let mut state = ViewState {
        preferred_id: preferred.clone(),
        search: resolved
            .current
            .as_ref()
            .and_then(|view| view.config().saved_search()),
        ..ViewState::default()
    };

    let system_views = input.grid.system_views.as_deref();
    if let Some(system_views) = system_views {
        let effective_default = preferred.clone().or_else(|| {
            system_views
                .first()
                .map(|view| ViewId::System(view.id.clone()))
        });

        for view in system_views {
            let id = ViewId::System(view.id.clone());
            state.available.push(ViewSummary {
                is_preferred: is_preferred(&id),
                is_default: effective_default.as_ref() == Some(&id),
                is_user_default: is_preferred(&id),
                is_system_default: false,
                can_manage: view.can_manage,
                name: view.name.clone(),
                description: view.description.clone().unwrap_or_default(),
                id,
            });
        }

        for view in &input.available {
            let id = view.view_id();
            state.available.push(ViewSummary {
                is_preferred: is_preferred(&id),
                is_default: is_preferred(&id),
                is_user_default: is_user_default(view),
                is_system_default: false,
                can_manage: input.actor.owns(view.owner_subject()),
                name: view.name().to_owned(),
                description: view.description().unwrap_or_default().to_owned(),
                id,
            });
        }
    } else {
        for view in &input.available {
            let id = view.view_id();
            if view.is_system_default() {
                state.system_default_id = Some(id.clone());
            }
            state.available.push(ViewSummary {
                is_preferred: is_preferred(&id),
                is_default: is_preferred(&id) || view.is_default(),
                is_user_default: is_user_default(view),
                is_system_default: view.is_system_default(),
                can_manage: input.actor.owns(view.owner_subject()),
                name: view.name().to_owned(),
                description: view.description().unwrap_or_default().to_owned(),
                id,
            });
        }
    }

    match (&resolved.current, &resolved.system) {
        (Some(view), _) => {
            let id = view.view_id();
            state.is_preferred = is_preferred(&id);
            state.is_default = is_preferred(&id);
            state.is_user_default = is_user_default(view);
            state.current_name = view.name().to_owned();
            state.current_id = Some(id);
        }
        (None, Some(system)) => {
            let id = ViewId::System(system.id.clone());
            state.is_preferred = is_preferred(&id);
            state.is_default = is_preferred(&id);
            state.is_user_default = preferred.is_some();
            state.current_name = system.name.clone();
            state.current_id = Some(id);
        }
        (None, None) => state.is_user_default = preferred.is_some(),
    }

    state
}
