use std::collections::HashMap;

use async_trait::async_trait;
use gridview_core::{AppError, AppResult};
use gridview_domain::{GridDefinition, PreferenceTarget, SavedView, SavedViewDraft};
use serde_json::Value;

use crate::grid_query::{NativeExpression, NativeOrder};

/// Repository port for saved grid views.
#[async_trait]
pub trait SavedViewRepository: Send + Sync {
    /// Lists shared system defaults and the subject's own views for a grid,
    /// system defaults first, then by name.
    async fn list_views_for_grid(&self, grid_key: &str, subject: &str)
    -> AppResult<Vec<SavedView>>;

    /// Finds a live view by id.
    async fn find_view(&self, view_id: i64) -> AppResult<Option<SavedView>>;

    /// Finds the subject's legacy `is_default` view for a grid.
    async fn find_user_default_view(
        &self,
        grid_key: &str,
        subject: &str,
    ) -> AppResult<Option<SavedView>>;

    /// Finds the shared system default view for a grid.
    async fn find_system_default_view(&self, grid_key: &str) -> AppResult<Option<SavedView>>;

    /// Stores a new view and assigns its id.
    async fn create_view(&self, draft: SavedViewDraft) -> AppResult<SavedView>;

    /// Persists changes to an existing view.
    async fn update_view(&self, view: SavedView) -> AppResult<()>;

    /// Soft-deletes a view.
    async fn delete_view(&self, view_id: i64) -> AppResult<()>;

    /// Resets the legacy `is_default` flag on the subject's views for a grid.
    async fn clear_user_default_flags(&self, grid_key: &str, subject: &str) -> AppResult<()>;
}

/// Repository port for per-user default view preferences.
#[async_trait]
pub trait GridViewPreferenceRepository: Send + Sync {
    /// Returns the subject's preference for a grid.
    async fn find_preference(
        &self,
        grid_key: &str,
        subject: &str,
    ) -> AppResult<Option<PreferenceTarget>>;

    /// Clears any existing preference and stores the new one in one unit of work.
    async fn replace_preference(
        &self,
        grid_key: &str,
        subject: &str,
        target: PreferenceTarget,
    ) -> AppResult<()>;

    /// Removes the subject's preference for a grid.
    async fn clear_preference(&self, grid_key: &str, subject: &str) -> AppResult<()>;

    /// Removes the subject's preference when it points at the given view.
    async fn clear_preference_for_view(
        &self,
        grid_key: &str,
        subject: &str,
        view_id: i64,
    ) -> AppResult<()>;
}

/// Compiled query against one record table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridRecordQuery {
    /// Conditions combined with AND.
    pub conditions: Vec<NativeExpression>,
    /// Order clause, first key first.
    pub order: Vec<NativeOrder>,
    /// Maximum rows returned.
    pub limit: usize,
    /// Rows skipped.
    pub offset: usize,
}

/// One grid row.
#[derive(Debug, Clone, PartialEq)]
pub struct GridRecord {
    /// Row id.
    pub id: String,
    /// Row fields.
    pub data: Value,
}

/// One page of rows plus the unpaged match count.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridRecordPage {
    /// Rows of the page.
    pub records: Vec<GridRecord>,
    /// Rows matching the conditions.
    pub total: usize,
}

/// Repository port for grid rows.
#[async_trait]
pub trait GridRecordRepository: Send + Sync {
    /// Runs a compiled query against a record table.
    ///
    /// Fields may be qualified with `table.`; the qualifier is stripped.
    async fn query_grid_records(
        &self,
        table: &str,
        query: GridRecordQuery,
    ) -> AppResult<GridRecordPage>;
}

/// Grid definitions known to the server, keyed by grid key.
#[derive(Debug, Clone, Default)]
pub struct GridRegistry {
    grids: HashMap<String, GridDefinition>,
}

impl GridRegistry {
    /// Creates a registry, rejecting duplicate grid keys.
    pub fn new(definitions: Vec<GridDefinition>) -> AppResult<Self> {
        let mut grids = HashMap::with_capacity(definitions.len());
        for definition in definitions {
            let grid_key = definition.grid_key.clone();
            if grids.insert(grid_key.clone(), definition).is_some() {
                return Err(AppError::Conflict(format!(
                    "grid '{grid_key}' is declared more than once"
                )));
            }
        }

        Ok(Self { grids })
    }

    /// Returns the grid or a not-found error.
    pub fn grid(&self, grid_key: &str) -> AppResult<&GridDefinition> {
        self.grids
            .get(grid_key)
            .ok_or_else(|| AppError::NotFound(format!("grid '{grid_key}' does not exist")))
    }

    /// Returns every grid key, sorted.
    #[must_use]
    pub fn grid_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.grids.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}
