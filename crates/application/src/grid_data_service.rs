use std::sync::Arc;

use gridview_core::{AppResult, UserIdentity};
use gridview_domain::{
    ActiveFilterValue, AvailableFilter, AvailableFilterKind, ColumnState, ColumnType, FilterCondition,
    FilterOperator, FilterState, GridDefinition, OrderedMap, PreferenceTarget, SavedView,
    SnapshotConfig, SortDirection, SortState, StateSnapshot, SystemView, SystemViewDefaults,
    ViewId, ViewState, ViewSummary, extract_visible_columns, scalar_text,
};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::grid_ports::{GridRecord, GridRecordQuery, GridRecordRepository};
use crate::grid_query::{
    NativeComparison, NativeCondition, NativeExpression, NativeOrder, compile_expression,
    compile_flat, compile_search, qualify_field,
};
use crate::grid_request::GridRequest;
use crate::grid_view_service::GridViewService;

mod filters;
mod resolve;
mod state;

/// Paging numbers for one loaded grid page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridPagination {
    /// 1-based page number.
    pub page: u32,
    /// Rows per page.
    pub page_size: u32,
    /// Rows matching the applied filters.
    pub total: usize,
    /// Number of pages, at least 1.
    pub page_count: usize,
}

impl GridPagination {
    fn new(page: u32, page_size: u32, total: usize) -> Self {
        let per_page = usize::try_from(page_size.max(1)).unwrap_or(usize::MAX);
        Self {
            page,
            page_size,
            total,
            page_count: total.div_ceil(per_page).max(1),
        }
    }
}

/// Rows, paging and the toolbar snapshot for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct GridPage {
    /// Rows of the requested page.
    pub records: Vec<GridRecord>,
    /// Paging numbers.
    pub pagination: GridPagination,
    /// State the toolbar is rebuilt from.
    pub snapshot: StateSnapshot,
    /// Column keys to render, in order.
    pub visible_columns: Vec<String>,
}

/// View chosen for a request.
#[derive(Debug, Clone, Default)]
struct ResolvedView {
    current: Option<SavedView>,
    system: Option<SystemView>,
    preferred: Option<ViewId>,
}

/// Filters applied from the URL or from system-view defaults.
#[derive(Debug, Default)]
struct AppliedFilters {
    conditions: Vec<NativeExpression>,
    active: OrderedMap<ActiveFilterValue>,
    skip: Vec<String>,
}

/// Application service that turns a grid request into a page of rows.
#[derive(Clone)]
pub struct GridDataService {
    views: GridViewService,
    records: Arc<dyn GridRecordRepository>,
}

impl GridDataService {
    /// Creates a new grid data service.
    #[must_use]
    pub fn new(views: GridViewService, records: Arc<dyn GridRecordRepository>) -> Self {
        Self { views, records }
    }

    /// Loads one page of a grid for the actor.
    pub async fn load_grid(
        &self,
        actor: &UserIdentity,
        grid_key: &str,
        request: &GridRequest,
    ) -> AppResult<GridPage> {
        let grid = self.views.registry().grid(grid_key)?;
        let table = grid.table_name.as_str();
        let dirty = request.dirty;

        let resolved = self.resolve_view(actor, grid, request).await?;
        let defaults = resolved.defaults();

        let mut conditions = Vec::new();
        let search_term = resolved.search_term(request, &defaults);
        if is_truthy(&search_term) {
            conditions.extend(compile_search(&search_term, &grid.columns, table));
        }

        let mut applied = filters::apply_filters(grid, request, resolved.system.is_some(), &defaults);
        conditions.append(&mut applied.conditions);
        conditions.extend(resolved.view_conditions(table, dirty.filters));

        let visible_columns = filters::visible_columns(grid, request, resolved.current.as_ref());
        let page_size = resolved.page_size(grid);
        let (order, sort) = filters::resolve_sort(grid, request, resolved.current.as_ref());

        let limit = usize::try_from(page_size).unwrap_or(usize::MAX);
        let offset = usize::try_from(request.page.saturating_sub(1))
            .unwrap_or_default()
            .saturating_mul(limit);
        let result = self
            .records
            .query_grid_records(
                table,
                GridRecordQuery {
                    conditions,
                    order,
                    limit,
                    offset,
                },
            )
            .await?;
        debug!(
            grid_key,
            total = result.total,
            page = request.page,
            "loaded grid page"
        );

        let available = self.views.get_views_for_grid(actor, grid_key).await?;
        let (active, search) = filters::pills(applied.active, request, &resolved, &defaults);
        let search = if is_truthy(&search) { search } else { search_term };

        let snapshot = state::build_snapshot(state::SnapshotInput {
            grid,
            actor,
            resolved: &resolved,
            available,
            search,
            active,
            sort,
            visible_columns: visible_columns.clone(),
            page_size,
            skip: &applied.skip,
        });

        Ok(GridPage {
            records: result.records,
            pagination: GridPagination::new(request.page, page_size, result.total),
            snapshot,
            visible_columns,
        })
    }
}

/// Non-empty and not `"0"`.
fn is_truthy(text: &str) -> bool {
    !text.is_empty() && text != "0"
}
