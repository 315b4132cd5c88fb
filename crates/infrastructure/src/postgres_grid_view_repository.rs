use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gridview_application::{GridViewPreferenceRepository, SavedViewRepository};
use gridview_core::{AppError, AppResult};
use gridview_domain::{ColumnCatalog, PreferenceTarget, SavedView, SavedViewDraft, normalize};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

/// PostgreSQL-backed repository for saved grid views and default preferences.
#[derive(Clone)]
pub struct PostgresGridViewRepository {
    pool: PgPool,
}

impl PostgresGridViewRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct GridViewRow {
    id: i64,
    grid_key: String,
    owner_subject: Option<String>,
    name: String,
    description: Option<String>,
    is_default: bool,
    is_system_default: bool,
    config: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct PreferenceRow {
    view_id: Option<i64>,
    view_key: Option<String>,
}

fn view_from_row(row: GridViewRow) -> AppResult<SavedView> {
    SavedViewDraft {
        grid_key: row.grid_key,
        owner_subject: row.owner_subject,
        name: row.name,
        description: row.description,
        is_default: row.is_default,
        is_system_default: row.is_system_default,
        // Stored configs predate catalog changes; only structural checks apply.
        config: normalize(&row.config, &ColumnCatalog::default()),
    }
    .into_stored_view(row.id, row.created_at, row.updated_at)
}

fn preference_from_row(row: PreferenceRow) -> Option<PreferenceTarget> {
    match (row.view_id, row.view_key) {
        (Some(view_id), _) => Some(PreferenceTarget::View(view_id)),
        (None, Some(view_key)) => Some(PreferenceTarget::SystemView(view_key)),
        (None, None) => None,
    }
}

#[async_trait]
impl SavedViewRepository for PostgresGridViewRepository {
    async fn list_views_for_grid(
        &self,
        grid_key: &str,
        subject: &str,
    ) -> AppResult<Vec<SavedView>> {
        let rows = sqlx::query_as::<_, GridViewRow>(
            r#"
            SELECT id, grid_key, owner_subject, name, description, is_default,
                   is_system_default, config, created_at, updated_at
            FROM grid_views
            WHERE grid_key = $1
              AND deleted_at IS NULL
              AND (owner_subject = $2 OR (owner_subject IS NULL AND is_system_default))
            ORDER BY is_system_default DESC, name ASC
            "#,
        )
        .bind(grid_key)
        .bind(subject)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list views for grid '{grid_key}': {error}"
            ))
        })?;

        rows.into_iter().map(view_from_row).collect()
    }

    async fn find_view(&self, view_id: i64) -> AppResult<Option<SavedView>> {
        let row = sqlx::query_as::<_, GridViewRow>(
            r#"
            SELECT id, grid_key, owner_subject, name, description, is_default,
                   is_system_default, config, created_at, updated_at
            FROM grid_views
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(view_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find view '{view_id}': {error}")))?;

        row.map(view_from_row).transpose()
    }

    async fn find_user_default_view(
        &self,
        grid_key: &str,
        subject: &str,
    ) -> AppResult<Option<SavedView>> {
        let row = sqlx::query_as::<_, GridViewRow>(
            r#"
            SELECT id, grid_key, owner_subject, name, description, is_default,
                   is_system_default, config, created_at, updated_at
            FROM grid_views
            WHERE grid_key = $1 AND owner_subject = $2 AND is_default AND deleted_at IS NULL
            ORDER BY updated_at DESC
            LIMIT 1
            "#,
        )
        .bind(grid_key)
        .bind(subject)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to find default view for grid '{grid_key}': {error}"
            ))
        })?;

        row.map(view_from_row).transpose()
    }

    async fn find_system_default_view(&self, grid_key: &str) -> AppResult<Option<SavedView>> {
        let row = sqlx::query_as::<_, GridViewRow>(
            r#"
            SELECT id, grid_key, owner_subject, name, description, is_default,
                   is_system_default, config, created_at, updated_at
            FROM grid_views
            WHERE grid_key = $1 AND is_system_default AND deleted_at IS NULL
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(grid_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to find system default view for grid '{grid_key}': {error}"
            ))
        })?;

        row.map(view_from_row).transpose()
    }

    async fn create_view(&self, draft: SavedViewDraft) -> AppResult<SavedView> {
        let row = sqlx::query_as::<_, GridViewRow>(
            r#"
            INSERT INTO grid_views (
                grid_key, owner_subject, name, description, is_default, is_system_default, config
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, grid_key, owner_subject, name, description, is_default,
                      is_system_default, config, created_at, updated_at
            "#,
        )
        .bind(draft.grid_key.as_str())
        .bind(draft.owner_subject.as_deref())
        .bind(draft.name.trim())
        .bind(draft.description.as_deref())
        .bind(draft.is_default)
        .bind(draft.is_system_default)
        .bind(Json(&draft.config))
        .fetch_one(&self.pool)
        .await;

        match row {
            Ok(row) => view_from_row(row),
            Err(error) => {
                if let sqlx::Error::Database(database_error) = &error
                    && database_error.code().as_deref() == Some("23505")
                {
                    return Err(AppError::Conflict(format!(
                        "grid '{}' already has a system default view",
                        draft.grid_key
                    )));
                }

                Err(AppError::Internal(format!(
                    "failed to create view '{}' for grid '{}': {error}",
                    draft.name, draft.grid_key
                )))
            }
        }
    }

    async fn update_view(&self, view: SavedView) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE grid_views
            SET name = $2, description = $3, is_default = $4, config = $5, updated_at = $6
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(view.id())
        .bind(view.name())
        .bind(view.description())
        .bind(view.is_default())
        .bind(Json(view.config()))
        .bind(view.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to update view '{}': {error}", view.id()))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "view '{}' does not exist",
                view.id()
            )));
        }

        Ok(())
    }

    async fn delete_view(&self, view_id: i64) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE grid_views
            SET deleted_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(view_id)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete view '{view_id}': {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("view '{view_id}' does not exist")));
        }

        Ok(())
    }

    async fn clear_user_default_flags(&self, grid_key: &str, subject: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE grid_views
            SET is_default = FALSE, updated_at = NOW()
            WHERE grid_key = $1 AND owner_subject = $2 AND is_default
            "#,
        )
        .bind(grid_key)
        .bind(subject)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to clear default flags for grid '{grid_key}': {error}"
            ))
        })?;

        Ok(())
    }
}

#[async_trait]
impl GridViewPreferenceRepository for PostgresGridViewRepository {
    async fn find_preference(
        &self,
        grid_key: &str,
        subject: &str,
    ) -> AppResult<Option<PreferenceTarget>> {
        let row = sqlx::query_as::<_, PreferenceRow>(
            r#"
            SELECT view_id, view_key
            FROM grid_view_preferences
            WHERE grid_key = $1 AND owner_subject = $2
            "#,
        )
        .bind(grid_key)
        .bind(subject)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to find view preference for grid '{grid_key}': {error}"
            ))
        })?;

        Ok(row.and_then(preference_from_row))
    }

    async fn replace_preference(
        &self,
        grid_key: &str,
        subject: &str,
        target: PreferenceTarget,
    ) -> AppResult<()> {
        let (view_id, view_key) = match target {
            PreferenceTarget::View(view_id) => (Some(view_id), None),
            PreferenceTarget::SystemView(view_key) => (None, Some(view_key)),
        };

        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!(
                "failed to start view preference transaction for grid '{grid_key}': {error}"
            ))
        })?;

        sqlx::query(
            r#"
            DELETE FROM grid_view_preferences
            WHERE grid_key = $1 AND owner_subject = $2
            "#,
        )
        .bind(grid_key)
        .bind(subject)
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to clear view preference for grid '{grid_key}': {error}"
            ))
        })?;

        sqlx::query(
            r#"
            INSERT INTO grid_view_preferences (grid_key, owner_subject, view_id, view_key)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(grid_key)
        .bind(subject)
        .bind(view_id)
        .bind(view_key)
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to store view preference for grid '{grid_key}': {error}"
            ))
        })?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!(
                "failed to commit view preference for grid '{grid_key}': {error}"
            ))
        })
    }

    async fn clear_preference(&self, grid_key: &str, subject: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            DELETE FROM grid_view_preferences
            WHERE grid_key = $1 AND owner_subject = $2
            "#,
        )
        .bind(grid_key)
        .bind(subject)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to clear view preference for grid '{grid_key}': {error}"
            ))
        })?;

        Ok(())
    }

    async fn clear_preference_for_view(
        &self,
        grid_key: &str,
        subject: &str,
        view_id: i64,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            DELETE FROM grid_view_preferences
            WHERE grid_key = $1 AND owner_subject = $2 AND view_id = $3
            "#,
        )
        .bind(grid_key)
        .bind(subject)
        .bind(view_id)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to clear view preference for view '{view_id}': {error}"
            ))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests;
