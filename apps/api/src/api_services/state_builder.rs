use std::sync::Arc;

use gridview_application::{
    GridDataService, GridRecordRepository, GridRegistry, GridViewPreferenceRepository,
    GridViewService, SavedViewRepository,
};
use gridview_core::{AppError, AppResult};
use gridview_domain::scalar_text;
use gridview_infrastructure::{
    InMemoryGridRecordRepository, InMemoryGridViewRepository, PostgresGridRecordRepository,
    PostgresGridViewRepository,
};
use serde_json::Value;
use sqlx::PgPool;
use tracing::{debug, info};

use crate::state::AppState;

use super::catalog::GridCatalog;

/// Storage adapters behind the application ports.
#[derive(Clone)]
pub enum Storage {
    Memory {
        views: Arc<InMemoryGridViewRepository>,
        records: Arc<InMemoryGridRecordRepository>,
    },
    Postgres {
        views: Arc<PostgresGridViewRepository>,
        records: Arc<PostgresGridRecordRepository>,
    },
}

impl Storage {
    pub fn memory() -> Self {
        Self::Memory {
            views: Arc::new(InMemoryGridViewRepository::new()),
            records: Arc::new(InMemoryGridRecordRepository::new()),
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self::Postgres {
            views: Arc::new(PostgresGridViewRepository::new(pool.clone())),
            records: Arc::new(PostgresGridRecordRepository::new(pool)),
        }
    }

    fn saved_views(&self) -> Arc<dyn SavedViewRepository> {
        match self {
            Self::Memory { views, .. } => views.clone(),
            Self::Postgres { views, .. } => views.clone(),
        }
    }

    fn preferences(&self) -> Arc<dyn GridViewPreferenceRepository> {
        match self {
            Self::Memory { views, .. } => views.clone(),
            Self::Postgres { views, .. } => views.clone(),
        }
    }

    fn records(&self) -> Arc<dyn GridRecordRepository> {
        match self {
            Self::Memory { records, .. } => records.clone(),
            Self::Postgres { records, .. } => records.clone(),
        }
    }

    async fn upsert_record(&self, table: &str, record_id: &str, data: Value) -> AppResult<()> {
        match self {
            Self::Memory { records, .. } => {
                records.upsert_record(table, record_id, data).await;
                Ok(())
            }
            Self::Postgres { records, .. } => records.upsert_record(table, record_id, data).await,
        }
    }
}

pub fn build_app_state(storage: &Storage, registry: GridRegistry) -> AppState {
    let grid_view_service = GridViewService::new(
        storage.saved_views(),
        storage.preferences(),
        Arc::new(registry),
    );
    let grid_data_service = GridDataService::new(grid_view_service.clone(), storage.records());

    AppState {
        grid_view_service,
        grid_data_service,
    }
}

/// Counts of what a seed run wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeedSummary {
    pub system_defaults: usize,
    pub records: usize,
}

/// Writes the catalog's system default views and rows.
///
/// A grid that already has a system default keeps it; rows are upserted by id.
pub async fn seed_storage(
    storage: &Storage,
    app_state: &AppState,
    catalog: &GridCatalog,
) -> AppResult<SeedSummary> {
    let mut summary = SeedSummary::default();
    let saved_views = storage.saved_views();

    for seed in &catalog.system_default_views {
        if saved_views
            .find_system_default_view(&seed.grid_key)
            .await?
            .is_some()
        {
            debug!(grid_key = %seed.grid_key, "system default view already present");
            continue;
        }

        app_state
            .grid_view_service
            .create_system_default(&seed.grid_key, &seed.name, &seed.config)
            .await?;
        summary.system_defaults += 1;
    }

    for (table, rows) in &catalog.seed_records {
        for row in rows {
            let record_id = row
                .get("id")
                .map(scalar_text)
                .filter(|id| !id.is_empty())
                .ok_or_else(|| {
                    AppError::Validation(format!("seed row for table '{table}' has no id"))
                })?;
            storage.upsert_record(table, &record_id, row.clone()).await?;
            summary.records += 1;
        }
    }

    info!(
        system_defaults = summary.system_defaults,
        records = summary.records,
        "grid storage seeded"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use gridview_core::UserIdentity;

    use super::{Storage, build_app_state, seed_storage};
    use crate::api_services::catalog::GridCatalog;

    const CATALOG: &str = r#"{
        "grids": [{
            "gridKey": "members",
            "tableName": "members",
            "columns": [{"key": "name", "label": "Name", "searchable": true}]
        }],
        "systemDefaultViews": [{
            "gridKey": "members",
            "name": "Everyone",
            "config": {"sort": [{"field": "name", "direction": "desc"}]}
        }],
        "seedRecords": {"members": [
            {"id": 1, "name": "Ann"},
            {"id": 2, "name": "Bo"}
        ]}
    }"#;

    #[tokio::test]
    async fn seeding_is_repeatable() {
        let catalog = GridCatalog::parse(CATALOG).unwrap_or_else(|_| unreachable!());
        let storage = Storage::memory();
        let app_state = build_app_state(
            &storage,
            catalog.registry().unwrap_or_else(|_| unreachable!()),
        );

        let first = seed_storage(&storage, &app_state, &catalog)
            .await
            .unwrap_or_else(|_| unreachable!());
        let second = seed_storage(&storage, &app_state, &catalog)
            .await
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(first.system_defaults, 1);
        assert_eq!(first.records, 2);
        assert_eq!(second.system_defaults, 0);

        let actor = UserIdentity::new("alice", "Alice", None);
        let views = app_state
            .grid_view_service
            .get_views_for_grid(&actor, "members")
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(views.len(), 1);
        assert!(views[0].is_system_default());
    }

    #[tokio::test]
    async fn seed_rows_need_an_id() {
        let mut catalog = GridCatalog::parse(CATALOG).unwrap_or_else(|_| unreachable!());
        catalog.seed_records.insert(
            "members".to_owned(),
            vec![serde_json::json!({"name": "No id"})],
        );
        let storage = Storage::memory();
        let app_state = build_app_state(
            &storage,
            catalog.registry().unwrap_or_else(|_| unreachable!()),
        );

        assert!(seed_storage(&storage, &app_state, &catalog).await.is_err());
    }
}
