use super::*;

/// Applies dropdown and date-range filters from the URL, or from the
/// system view's defaults when the URL carries none.
pub(super) fn apply_filters(
    grid: &GridDefinition,
    request: &GridRequest,
    system_applies: bool,
    defaults: &SystemViewDefaults,
) -> AppliedFilters {
    let table = grid.table_name.as_str();
    let use_defaults = system_applies && !request.dirty.filters && request.filters.is_empty();

    let mut applied = AppliedFilters {
        active: request.filters.clone(),
        ..AppliedFilters::default()
    };
    if use_defaults {
        applied.active = defaults.filters.clone();
        for (key, value) in defaults.date_range.iter() {
            if !applied.active.contains_key(key) {
                applied
                    .active
                    .insert(key, ActiveFilterValue::Single(value.clone()));
            }
        }
        applied.skip = defaults.skip_filter_columns.clone();
    }

    if !grid.can_filter {
        return applied;
    }

    for (key, value) in applied.active.iter() {
        if is_empty_filter(value) || applied.skip.iter().any(|skip| skip == key) {
            continue;
        }
        let Some(column) = grid.columns.get(key).filter(|column| column.filterable) else {
            continue;
        };

        let field = qualify_field(key, table);
        let boolean = column.column_type == ColumnType::Boolean;
        let cast = |text: &str| {
            if boolean {
                Value::Bool(php_bool(text))
            } else {
                Value::String(text.to_owned())
            }
        };
        let condition = match value {
            ActiveFilterValue::Single(text) => {
                NativeCondition::new(field, NativeComparison::Eq, cast(text))
            }
            ActiveFilterValue::Multiple(values) => NativeCondition::new(
                field,
                NativeComparison::In,
                Value::Array(values.iter().map(|text| cast(text)).collect()),
            ),
        };
        applied.conditions.push(NativeExpression::Condition(condition));
    }

    for column in grid.columns.date_range_filters() {
        let field = qualify_field(&column.key, table);
        let skipped = applied.skip.iter().any(|skip| *skip == column.key);

        for (suffix, comparison) in [
            ("_start", NativeComparison::Gte),
            ("_end", NativeComparison::Lte),
        ] {
            let key = format!("{}{suffix}", column.key);
            let bound = request
                .non_empty_param(&key)
                .map(ToOwned::to_owned)
                .or_else(|| {
                    use_defaults
                        .then(|| defaults.date_range.get(&key).cloned())
                        .flatten()
                });
            let Some(bound) = bound else {
                continue;
            };

            if !skipped {
                applied
                    .conditions
                    .push(NativeExpression::Condition(NativeCondition::new(
                        field.clone(),
                        comparison,
                        Value::String(bound.clone()),
                    )));
            }
            applied.active.insert(key, ActiveFilterValue::Single(bound));
        }
    }

    applied
}

fn is_empty_filter(value: &ActiveFilterValue) -> bool {
    match value {
        ActiveFilterValue::Single(text) => text.is_empty(),
        ActiveFilterValue::Multiple(values) => values.is_empty(),
    }
}

/// Reads `"1"`, `"2.5"` and `"-1"` as true, anything else as false.
fn php_bool(text: &str) -> bool {
    text.trim()
        .parse::<f64>()
        .is_ok_and(|number| number.trunc() != 0.0)
}

/// `columns` param plus required columns, then the view, then column defaults.
pub(super) fn visible_columns(
    grid: &GridDefinition,
    request: &GridRequest,
    current: Option<&SavedView>,
) -> Vec<String> {
    if let Some(requested) = request.columns.as_ref().filter(|columns| !columns.is_empty()) {
        let mut visible = requested.clone();
        for required in grid.columns.required_keys() {
            if !visible.iter().any(|column| column == required) {
                visible.push(required.to_owned());
            }
        }
        return visible;
    }

    match current {
        Some(view) if !request.dirty.columns => extract_visible_columns(view.config(), &grid.columns),
        _ => grid.columns.default_visible_keys(),
    }
}

fn sort_field(grid: &GridDefinition, field: &str) -> String {
    grid.columns
        .get(field)
        .and_then(|column| column.query_field.clone())
        .unwrap_or_else(|| qualify_field(field, &grid.table_name))
}

/// URL sort, then the view's first sort, then the grid default.
///
/// The grid default orders rows but is not reported as the active sort.
pub(super) fn resolve_sort(
    grid: &GridDefinition,
    request: &GridRequest,
    current: Option<&SavedView>,
) -> (Vec<NativeOrder>, Option<SortState>) {
    let requested = request
        .sort
        .as_deref()
        .filter(|field| !field.is_empty())
        .filter(|field| grid.columns.is_sortable(field))
        .zip(
            request
                .direction
                .as_deref()
                .and_then(|direction| direction.parse::<SortDirection>().ok()),
        );

    let active = match requested {
        Some((field, direction)) => Some((field.to_owned(), direction)),
        None => current
            .filter(|_| !request.dirty.sort)
            .and_then(|view| view.config().sort.first())
            .map(|sort| (sort.field.clone(), sort.direction)),
    };

    match active {
        Some((field, direction)) => (
            vec![NativeOrder {
                field: sort_field(grid, &field),
                direction,
            }],
            Some(SortState {
                field,
                direction: direction.as_str().to_owned(),
            }),
        ),
        None => (
            grid.default_sort
                .iter()
                .map(|sort| NativeOrder {
                    field: sort_field(grid, &sort.field),
                    direction: sort.direction,
                })
                .collect(),
            None,
        ),
    }
}

/// Fills the pills from the saved view when the URL has neither filters nor
/// search, then falls back to the system view's search.
pub(super) fn pills(
    mut active: OrderedMap<ActiveFilterValue>,
    request: &GridRequest,
    resolved: &ResolvedView,
    defaults: &SystemViewDefaults,
) -> (OrderedMap<ActiveFilterValue>, String) {
    let dirty = request.dirty;
    let mut search = request.search.clone().unwrap_or_default();

    if let Some(view) = &resolved.current
        && active.is_empty()
        && search.is_empty()
        && !dirty.filters
        && !dirty.search
    {
        if let Some(saved) = view.config().saved_search() {
            search = saved;
        }
        for filter in &view.config().filters {
            add_view_pill(&mut active, filter);
        }
    }

    if resolved.system.is_some()
        && !dirty.search
        && !is_truthy(&search)
        && let Some(default_search) = &defaults.search
    {
        search = default_search.clone();
    }

    (active, search)
}

fn add_view_pill(active: &mut OrderedMap<ActiveFilterValue>, filter: &FilterCondition) {
    if filter.field.is_empty() || filter.is_search() {
        return;
    }

    match (filter.operator, &filter.value) {
        (FilterOperator::DateRange, Value::Array(bounds)) => {
            for (bound, suffix) in bounds.iter().zip(["_start", "_end"]) {
                if !bound.is_null() && bound.as_str() != Some("") {
                    active.insert(
                        format!("{}{suffix}", filter.field),
                        ActiveFilterValue::Single(scalar_text(bound)),
                    );
                }
            }
        }
        (FilterOperator::In, Value::Array(values)) => {
            active.insert(
                filter.field.as_str(),
                ActiveFilterValue::Multiple(values.iter().map(scalar_text).collect()),
            );
        }
        (_, value) => {
            let text = scalar_text(value);
            match active.get_mut(&filter.field) {
                Some(existing) => existing.push(text),
                None => {
                    active.insert(filter.field.as_str(), ActiveFilterValue::Single(text));
                }
            }
        }
    }
}
