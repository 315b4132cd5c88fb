use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use gridview_core::{AppResult, UserIdentity};
use gridview_domain::{
    ColumnCatalog, ColumnMetadata, ColumnType, Conjunction, ExpressionNode, FilterCondition, FilterOperator,
    FilterOption, GridDefinition, GridViewConfig, PreferenceTarget, SavedView, SavedViewDraft,
    SortDirection, SortSpec, SystemView, SystemViewConfig,
};
use serde_json::json;
use tokio::sync::Mutex;

use crate::{
    GridRecord, GridRecordPage, GridRecordQuery, GridRecordRepository, GridRegistry,
    GridViewPreferenceRepository, GridViewService, SavedViewRepository,
};

pub(crate) fn alice() -> UserIdentity {
    UserIdentity::new("alice", "Alice", None)
}

pub(crate) fn bob() -> UserIdentity {
    UserIdentity::new("bob", "Bob", None)
}

pub(crate) fn member_columns() -> ColumnCatalog {
    ColumnCatalog::new(vec![
        ColumnMetadata::new("name", "Name").required().searchable(),
        ColumnMetadata::new("email", "Email")
            .with_type(ColumnType::Email)
            .searchable(),
        ColumnMetadata::new("status", "Status").with_dropdown(vec![
            FilterOption::new("active", "Active"),
            FilterOption::new("inactive", "Inactive"),
        ]),
        ColumnMetadata::new("branch", "Branch")
            .with_type(ColumnType::Relation)
            .searchable()
            .with_query_field("branches.name"),
        ColumnMetadata::new("joined_at", "Joined")
            .with_type(ColumnType::Date)
            .with_date_range(),
        ColumnMetadata::new("notes", "Notes").hidden_by_default().unsortable(),
    ])
}

pub(crate) fn members_grid() -> GridDefinition {
    let mut grid = GridDefinition::new("members", "members", member_columns())
        .unwrap_or_else(|_| unreachable!());
    grid.default_sort = Some(SortSpec::new("name", SortDirection::Asc));
    grid
}

pub(crate) fn tasks_grid() -> GridDefinition {
    let columns = ColumnCatalog::new(vec![
        ColumnMetadata::new("title", "Title").required().searchable(),
        ColumnMetadata::new("state", "State").with_dropdown(vec![
            FilterOption::new("open", "Open"),
            FilterOption::new("done", "Done"),
        ]),
        ColumnMetadata::new("assignee", "Assignee"),
        ColumnMetadata::new("due", "Due")
            .with_type(ColumnType::Date)
            .with_date_range(),
    ]);
    let mut grid =
        GridDefinition::new("tasks", "tasks", columns).unwrap_or_else(|_| unreachable!());
    grid.system_views = Some(vec![
        SystemView {
            id: "open".to_owned(),
            name: "Open".to_owned(),
            description: None,
            can_manage: false,
            config: SystemViewConfig {
                filters: vec![FilterCondition::new("state", FilterOperator::Eq, json!("open"))],
                expression: None,
                skip_filter_columns: Vec::new(),
            },
        },
        SystemView {
            id: "mine".to_owned(),
            name: "Mine or unassigned".to_owned(),
            description: None,
            can_manage: false,
            config: SystemViewConfig {
                filters: Vec::new(),
                expression: Some(ExpressionNode::group(
                    Conjunction::Or,
                    vec![
                        ExpressionNode::condition("assignee", FilterOperator::Eq, json!("alice")),
                        ExpressionNode::condition("assignee", FilterOperator::IsNull, json!(null)),
                    ],
                )),
                skip_filter_columns: vec!["assignee".to_owned()],
            },
        },
    ]);
    grid.locked_filters = vec!["state".to_owned()];
    grid
}

pub(crate) fn registry() -> Arc<GridRegistry> {
    Arc::new(GridRegistry::new(vec![members_grid(), tasks_grid()]).unwrap_or_else(|_| unreachable!()))
}

#[derive(Default)]
pub(crate) struct FakeViewStore {
    views: Mutex<Vec<SavedView>>,
    deleted: Mutex<Vec<i64>>,
    preferences: Mutex<HashMap<(String, String), PreferenceTarget>>,
}

impl FakeViewStore {
    pub(crate) async fn seed(&self, draft: SavedViewDraft) -> SavedView {
        self.create_view(draft)
            .await
            .unwrap_or_else(|_| unreachable!())
    }

    pub(crate) async fn is_deleted(&self, view_id: i64) -> bool {
        self.deleted.lock().await.contains(&view_id)
    }
}

pub(crate) fn draft(grid_key: &str, owner: Option<&str>, name: &str) -> SavedViewDraft {
    SavedViewDraft {
        grid_key: grid_key.to_owned(),
        owner_subject: owner.map(ToOwned::to_owned),
        name: name.to_owned(),
        description: None,
        is_default: false,
        is_system_default: owner.is_none(),
        config: GridViewConfig::default(),
    }
}

#[async_trait]
impl SavedViewRepository for FakeViewStore {
    async fn list_views_for_grid(
        &self,
        grid_key: &str,
        subject: &str,
    ) -> AppResult<Vec<SavedView>> {
        let mut listed: Vec<SavedView> = self
            .views
            .lock()
            .await
            .iter()
            .filter(|view| view.grid_key() == grid_key && view.is_visible_to(subject))
            .cloned()
            .collect();
        listed.sort_by(|left, right| {
            right
                .is_system_default()
                .cmp(&left.is_system_default())
                .then_with(|| left.name().cmp(right.name()))
        });
        Ok(listed)
    }

    async fn find_view(&self, view_id: i64) -> AppResult<Option<SavedView>> {
        Ok(self
            .views
            .lock()
            .await
            .iter()
            .find(|view| view.id() == view_id)
            .cloned())
    }

    async fn find_user_default_view(
        &self,
        grid_key: &str,
        subject: &str,
    ) -> AppResult<Option<SavedView>> {
        Ok(self
            .views
            .lock()
            .await
            .iter()
            .find(|view| {
                view.grid_key() == grid_key && view.is_owned_by(subject) && view.is_default()
            })
            .cloned())
    }

    async fn find_system_default_view(&self, grid_key: &str) -> AppResult<Option<SavedView>> {
        Ok(self
            .views
            .lock()
            .await
            .iter()
            .find(|view| view.grid_key() == grid_key && view.is_system_default())
            .cloned())
    }

    async fn create_view(&self, draft: SavedViewDraft) -> AppResult<SavedView> {
        let mut views = self.views.lock().await;
        let id = i64::try_from(views.len()).unwrap_or_default() + 1;
        let view = draft.into_view(id, Utc::now())?;
        views.push(view.clone());
        Ok(view)
    }

    async fn update_view(&self, view: SavedView) -> AppResult<()> {
        let mut views = self.views.lock().await;
        if let Some(stored) = views.iter_mut().find(|stored| stored.id() == view.id()) {
            *stored = view;
        }
        Ok(())
    }

    async fn delete_view(&self, view_id: i64) -> AppResult<()> {
        self.views.lock().await.retain(|view| view.id() != view_id);
        self.deleted.lock().await.push(view_id);
        Ok(())
    }

    async fn clear_user_default_flags(&self, grid_key: &str, subject: &str) -> AppResult<()> {
        for view in self.views.lock().await.iter_mut() {
            if view.grid_key() == grid_key && view.is_owned_by(subject) {
                view.set_default(false);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl GridViewPreferenceRepository for FakeViewStore {
    async fn find_preference(
        &self,
        grid_key: &str,
        subject: &str,
    ) -> AppResult<Option<PreferenceTarget>> {
        Ok(self
            .preferences
            .lock()
            .await
            .get(&(grid_key.to_owned(), subject.to_owned()))
            .cloned())
    }

    async fn replace_preference(
        &self,
        grid_key: &str,
        subject: &str,
        target: PreferenceTarget,
    ) -> AppResult<()> {
        self.preferences
            .lock()
            .await
            .insert((grid_key.to_owned(), subject.to_owned()), target);
        Ok(())
    }

    async fn clear_preference(&self, grid_key: &str, subject: &str) -> AppResult<()> {
        self.preferences
            .lock()
            .await
            .remove(&(grid_key.to_owned(), subject.to_owned()));
        Ok(())
    }

    async fn clear_preference_for_view(
        &self,
        grid_key: &str,
        subject: &str,
        view_id: i64,
    ) -> AppResult<()> {
        let mut preferences = self.preferences.lock().await;
        let key = (grid_key.to_owned(), subject.to_owned());
        if preferences.get(&key) == Some(&PreferenceTarget::View(view_id)) {
            preferences.remove(&key);
        }
        Ok(())
    }
}

/// Records the last query and answers with a fixed page.
#[derive(Default)]
pub(crate) struct FakeRecords {
    pub(crate) last_query: Mutex<Option<(String, GridRecordQuery)>>,
    pub(crate) total: usize,
}

#[async_trait]
impl GridRecordRepository for FakeRecords {
    async fn query_grid_records(
        &self,
        table: &str,
        query: GridRecordQuery,
    ) -> AppResult<GridRecordPage> {
        *self.last_query.lock().await = Some((table.to_owned(), query));
        Ok(GridRecordPage {
            records: vec![GridRecord {
                id: "1".to_owned(),
                data: json!({"name": "Ada"}),
            }],
            total: self.total,
        })
    }
}

pub(crate) fn view_service(store: &Arc<FakeViewStore>) -> GridViewService {
    GridViewService::new(store.clone(), store.clone(), registry())
}
