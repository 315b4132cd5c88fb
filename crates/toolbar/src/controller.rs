use gridview_core::AppResult;
use gridview_domain::{
    ActiveFilterValue, ColumnSpec, DEFAULT_PAGE_SIZE, FilterCondition, FilterOperator,
    GridViewConfig, OrderedMap, SEARCH_FIELD, SortDirection, SortSpec, StateSnapshot, ViewId,
    is_locked_filter,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::frame::{FrameLoadEvent, parse_snapshot};
use crate::model::ToolbarModel;
use crate::navigator::{GridNavigator, Navigation};
use crate::reconciler::render_from_snapshot;
use crate::registry::ToolbarComponent;

const DIRTY_FILTERS: &str = "dirty[filters]";
const DIRTY_SEARCH: &str = "dirty[search]";
const DIRTY_SORT: &str = "dirty[sort]";

/// Turns toolbar actions into navigations against the latest server snapshot.
///
/// The controller holds no toolbar state of its own: every frame load
/// replaces the snapshot and rebuilds the model.
#[derive(Debug, Clone)]
pub struct GridViewController {
    container_id: Option<String>,
    state: Option<StateSnapshot>,
    model: ToolbarModel,
    navigator: GridNavigator,
}

impl GridViewController {
    /// Creates a detached controller.
    #[must_use]
    pub fn new(navigator: GridNavigator) -> Self {
        Self {
            container_id: None,
            state: None,
            model: ToolbarModel::default(),
            navigator,
        }
    }

    /// Latest snapshot.
    #[must_use]
    pub fn state(&self) -> Option<&StateSnapshot> {
        self.state.as_ref()
    }

    /// Toolbar built from the latest snapshot.
    #[must_use]
    pub fn model(&self) -> &ToolbarModel {
        &self.model
    }

    /// URL builder bound to the page location.
    #[must_use]
    pub fn navigator(&self) -> &GridNavigator {
        &self.navigator
    }

    /// Replaces the snapshot and rebuilds the toolbar.
    pub fn load_snapshot(&mut self, snapshot: StateSnapshot) -> &ToolbarModel {
        self.model = render_from_snapshot(&snapshot);
        self.state = Some(snapshot);
        &self.model
    }

    fn on_view(&self) -> bool {
        self.state
            .as_ref()
            .is_some_and(|state| state.view.current_id.is_some())
    }

    fn kept_search(&self) -> Option<&str> {
        self.state
            .as_ref()
            .filter(|state| state.view.current_id.is_some())
            .and_then(|state| state.search.as_deref())
    }

    fn is_locked(&self, column: &str) -> bool {
        self.state
            .as_ref()
            .is_some_and(|state| is_locked_filter(&state.config.locked_filters, column))
    }

    fn active_filters(&self) -> OrderedMap<ActiveFilterValue> {
        self.state
            .as_ref()
            .map(|state| state.filters.active.clone())
            .unwrap_or_default()
    }

    fn active_values(&self, column: &str) -> Vec<String> {
        self.state
            .as_ref()
            .and_then(|state| state.filters.active.get(column))
            .map(|value| value.values().into_iter().map(ToOwned::to_owned).collect())
            .unwrap_or_default()
    }

    /// Applies query updates, resets paging and navigates.
    fn navigate_with(&mut self, mut updates: Vec<(&str, Option<&str>)>) -> AppResult<Navigation> {
        updates.push(("page", None));
        let url = self.navigator.build_url(&updates);
        self.navigator.navigate(&url)
    }

    /// Rewrites filters, marks them dirty on a view and navigates.
    fn navigate_with_filters(
        &mut self,
        filters: &OrderedMap<ActiveFilterValue>,
    ) -> AppResult<Navigation> {
        let mut url = self
            .navigator
            .build_url_with_filters(filters, self.kept_search());
        if self.on_view() {
            url = self.navigator.with_param(&url, DIRTY_FILTERS, "1")?;
        }
        self.navigator.navigate(&url)
    }

    fn replace_filter(
        &mut self,
        column: &str,
        values: Vec<String>,
    ) -> AppResult<Option<Navigation>> {
        let mut filters = self.active_filters();
        if values.is_empty() {
            filters.remove(column);
        } else {
            filters.insert(column, ActiveFilterValue::from_values(values));
        }
        self.navigate_with_filters(&filters).map(Some)
    }

    /// Checks or unchecks one dropdown value.
    pub fn toggle_filter(
        &mut self,
        column: &str,
        value: &str,
        checked: bool,
    ) -> AppResult<Option<Navigation>> {
        if self.state.is_none() {
            return Ok(None);
        }
        if self.is_locked(column) {
            debug!(column, "ignoring toggle of locked filter");
            return Ok(None);
        }

        let mut values = self.active_values(column);
        if checked {
            if !values.iter().any(|existing| existing == value) {
                values.push(value.to_owned());
            }
        } else {
            values.retain(|existing| existing != value);
        }

        self.replace_filter(column, values)
    }

    /// Removes one value from a pill.
    pub fn remove_filter(&mut self, column: &str, value: &str) -> AppResult<Option<Navigation>> {
        if self.state.is_none() {
            return Ok(None);
        }
        if self.is_locked(column) {
            debug!(column, "ignoring removal of locked filter");
            return Ok(None);
        }

        let mut values = self.active_values(column);
        values.retain(|existing| existing != value);
        self.replace_filter(column, values)
    }

    /// Drops search and every filter that is not locked.
    pub fn clear_all_filters(&mut self) -> AppResult<Option<Navigation>> {
        let Some(state) = self.state.as_ref() else {
            return Ok(None);
        };

        let mut preserved = OrderedMap::new();
        for (column, value) in state.filters.active.iter() {
            if is_locked_filter(&state.config.locked_filters, column) {
                preserved.insert(column, value.clone());
            }
        }

        let url = self
            .navigator
            .build_url_with_filters(&preserved, self.kept_search());
        let mut url = self.navigator.without_param(&url, "search")?;
        if self.on_view() {
            url = self.navigator.with_param(&url, DIRTY_FILTERS, "1")?;
        }
        self.navigator.navigate(&url).map(Some)
    }

    /// Changes one date-range bound from the filter panel.
    pub fn update_date_range_filter(
        &mut self,
        filter_key: &str,
        value: &str,
    ) -> AppResult<Option<Navigation>> {
        if self.state.is_none() {
            return Ok(None);
        }
        if self.is_locked(filter_key) {
            debug!(filter_key, "ignoring change of locked date range");
            return Ok(None);
        }

        let values = if value.is_empty() {
            Vec::new()
        } else {
            vec![value.to_owned()]
        };
        self.replace_filter(filter_key, values)
    }

    /// Sets one date-range bound directly on the query string.
    pub fn apply_date_range_filter(
        &mut self,
        filter_key: &str,
        value: &str,
    ) -> AppResult<Navigation> {
        let value = (!value.is_empty()).then_some(value);
        self.navigate_with(vec![(filter_key, value), (DIRTY_FILTERS, Some("1"))])
    }

    /// Applies the search box content.
    pub fn perform_search(&mut self, term: &str) -> AppResult<Navigation> {
        let term = term.trim();
        let mut updates = vec![("search", (!term.is_empty()).then_some(term))];

        let view_search = self
            .state
            .as_ref()
            .and_then(|state| state.view.search.as_deref())
            .unwrap_or_default();
        if self.on_view() && term != view_search {
            updates.push((DIRTY_SEARCH, Some("1")));
        }

        self.navigate_with(updates)
    }

    /// Clears the search.
    ///
    /// On a view an empty `search` overrides the saved term; otherwise the
    /// key is removed.
    pub fn clear_search(&mut self) -> AppResult<Navigation> {
        let updates = if self.on_view() {
            vec![("search", Some("")), (DIRTY_SEARCH, Some("1"))]
        } else {
            vec![("search", None)]
        };
        self.navigate_with(updates)
    }

    /// Cycles the sort of a column: none, ascending, descending, none.
    pub fn apply_sort(&mut self, field: &str) -> AppResult<Option<Navigation>> {
        if field.is_empty() {
            return Ok(None);
        }

        let current = self.state.as_ref().and_then(|state| state.sort.as_ref());
        let direction = match current {
            Some(sort) if sort.field == field => (sort.direction == "asc").then_some("desc"),
            _ => Some("asc"),
        };

        let mut updates = vec![
            ("sort", direction.map(|_| field)),
            ("direction", direction),
        ];
        if self.on_view() {
            updates.push((DIRTY_SORT, Some("1")));
        }
        self.navigate_with(updates).map(Some)
    }

    /// Applies the column picker; required columns are always included.
    pub fn apply_column_changes(&mut self, checked: &[String]) -> AppResult<Option<Navigation>> {
        let Some(state) = self.state.as_ref() else {
            return Ok(None);
        };

        let mut visible: Vec<&str> = Vec::with_capacity(checked.len());
        for key in checked {
            if !visible.contains(&key.as_str()) {
                visible.push(key);
            }
        }
        for (key, column) in state.columns.all.iter() {
            if column.required && !visible.contains(&key) {
                visible.push(key);
            }
        }

        let columns = visible.join(",");
        let url = self.navigator.build_url(&[("columns", Some(columns.as_str()))]);
        self.navigator.navigate(&url).map(Some)
    }

    /// Loads a view with nothing else on the query string.
    pub fn switch_view(&mut self, view_id: &ViewId) -> AppResult<Navigation> {
        let url = self.navigator.fresh_url("view_id", &view_id.to_string());
        self.navigator.navigate(&url)
    }

    /// Shows every row and suppresses the user's default view.
    pub fn show_all(&mut self) -> AppResult<Navigation> {
        let url = self.navigator.fresh_url("ignore_default", "1");
        self.navigator.navigate(&url)
    }

    /// Captures the current toolbar state as a saveable view config.
    #[must_use]
    pub fn current_config(&self) -> Option<GridViewConfig> {
        let state = self.state.as_ref()?;
        let search = state.active_search().map(ToOwned::to_owned);

        let mut filters = Vec::new();
        if let Some(term) = &search {
            filters.push(FilterCondition::new(
                SEARCH_FIELD,
                FilterOperator::Contains,
                Value::String(term.clone()),
            ));
        }

        let mut ranges: OrderedMap<[Value; 2]> = OrderedMap::new();
        let mut regular = Vec::new();
        for (field, value) in state.filters.active.iter() {
            let values = value.values();
            let Some(first) = values.first() else {
                continue;
            };

            let bound = field
                .strip_suffix("_start")
                .map(|base| (base, 0))
                .or_else(|| field.strip_suffix("_end").map(|base| (base, 1)));
            match bound {
                Some((base, index)) => {
                    let first = Value::String((*first).to_owned());
                    match ranges.get_mut(base) {
                        Some(range) => range[index] = first,
                        None => {
                            let mut range = [Value::Null, Value::Null];
                            range[index] = first;
                            ranges.insert(base, range);
                        }
                    }
                }
                None => regular.push(FilterCondition::new(
                    field,
                    FilterOperator::In,
                    Value::Array(
                        values
                            .iter()
                            .map(|raw| Value::String((*raw).to_owned()))
                            .collect(),
                    ),
                )),
            }
        }

        filters.extend(ranges.iter().map(|(field, range)| {
            FilterCondition::new(field, FilterOperator::DateRange, Value::Array(range.to_vec()))
        }));
        filters.extend(regular);

        let sort = state
            .sort
            .as_ref()
            .filter(|sort| !sort.field.is_empty())
            .and_then(|sort| {
                sort.direction
                    .parse::<SortDirection>()
                    .ok()
                    .map(|direction| SortSpec::new(sort.field.clone(), direction))
            })
            .into_iter()
            .collect();

        let columns = state
            .columns
            .visible
            .iter()
            .enumerate()
            .map(|(index, key)| ColumnSpec::new(key.clone(), true, i64::try_from(index).ok()))
            .collect();

        let page_size = match state.config.page_size {
            0 => DEFAULT_PAGE_SIZE,
            page_size => page_size,
        };

        Some(GridViewConfig {
            filters,
            expression: None,
            sort,
            columns,
            page_size,
            search,
        })
    }
}

impl ToolbarComponent for GridViewController {
    fn name(&self) -> &'static str {
        "grid-view"
    }

    fn attach(&mut self, container_id: &str) {
        self.container_id = Some(container_id.to_owned());
    }

    fn detach(&mut self) {
        self.container_id = None;
        self.state = None;
        self.model = ToolbarModel::default();
    }

    fn on_frame_load(&mut self, event: &FrameLoadEvent) -> bool {
        let Some(container_id) = self.container_id.as_deref() else {
            return false;
        };
        if !event.is_inside(container_id) || !event.is_table_frame() {
            return false;
        }

        let snapshot = match parse_snapshot(&event.html) {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                debug!(frame_id = %event.frame_id, "no state script found in table frame");
                return false;
            }
            Err(error) => {
                warn!(frame_id = %event.frame_id, %error, "failed to parse grid state");
                return false;
            }
        };

        if let Some(frame_src) = event.frame_src.as_deref()
            && let Err(error) = self.navigator.set_frame_src(frame_src)
        {
            warn!(frame_id = %event.frame_id, %error, "ignoring data frame source");
        }

        self.load_snapshot(snapshot);
        true
    }
}
