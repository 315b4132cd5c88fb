use std::sync::Arc;

use chrono::Utc;
use gridview_core::{AppError, AppResult, UserIdentity};
use gridview_domain::{
    GridViewConfig, PreferenceTarget, SavedView, SavedViewDraft, SavedViewPatch, ViewId, normalize,
    validate,
};
use serde_json::Value;
use tracing::debug;

use crate::grid_ports::{GridRegistry, GridViewPreferenceRepository, SavedViewRepository};

/// Input payload for saving a new view.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateSavedViewInput {
    /// Grid the view belongs to.
    pub grid_key: String,
    /// Tab label.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Untrusted configuration.
    pub config: Value,
    /// Make it the caller's default right away.
    pub is_default: bool,
}

/// Input payload for changing an owned view.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpdateSavedViewInput {
    /// New label.
    pub name: Option<String>,
    /// New description; `Some(None)` clears it.
    pub description: Option<Option<String>>,
    /// New untrusted configuration.
    pub config: Option<Value>,
}

/// Application service for saved views and default-view preferences.
#[derive(Clone)]
pub struct GridViewService {
    views: Arc<dyn SavedViewRepository>,
    preferences: Arc<dyn GridViewPreferenceRepository>,
    registry: Arc<GridRegistry>,
}

impl GridViewService {
    /// Creates a new grid view service.
    #[must_use]
    pub fn new(
        views: Arc<dyn SavedViewRepository>,
        preferences: Arc<dyn GridViewPreferenceRepository>,
        registry: Arc<GridRegistry>,
    ) -> Self {
        Self {
            views,
            preferences,
            registry,
        }
    }

    /// Returns the grid registry the service validates against.
    #[must_use]
    pub fn registry(&self) -> &GridRegistry {
        &self.registry
    }

    /// Resolves the view a grid should load for the actor.
    ///
    /// Tries the requested view, the stored preference, the legacy per-user
    /// default and the shared system default, in that order.
    pub async fn get_effective_view(
        &self,
        actor: &UserIdentity,
        grid_key: &str,
        view_id: Option<i64>,
    ) -> AppResult<Option<SavedView>> {
        if let Some(view_id) = view_id {
            match self.get_view(actor, view_id).await? {
                Some(view) if view.grid_key() == grid_key => return Ok(Some(view)),
                _ => debug!(grid_key, view_id, "requested view is not available"),
            }
        }

        if let Some(PreferenceTarget::View(preferred_id)) =
            self.get_user_preference(actor, grid_key).await?
            && let Some(view) = self.get_view(actor, preferred_id).await?
            && view.grid_key() == grid_key
        {
            return Ok(Some(view));
        }

        if let Some(view) = self
            .views
            .find_user_default_view(grid_key, actor.subject())
            .await?
        {
            return Ok(Some(view));
        }

        self.views.find_system_default_view(grid_key).await
    }

    /// Lists the actor's views and shared system defaults for a grid.
    pub async fn get_views_for_grid(
        &self,
        actor: &UserIdentity,
        grid_key: &str,
    ) -> AppResult<Vec<SavedView>> {
        self.views
            .list_views_for_grid(grid_key, actor.subject())
            .await
    }

    /// Returns a view when the actor may read it.
    pub async fn get_view(
        &self,
        actor: &UserIdentity,
        view_id: i64,
    ) -> AppResult<Option<SavedView>> {
        Ok(self
            .views
            .find_view(view_id)
            .await?
            .filter(|view| view.is_visible_to(actor.subject())))
    }

    /// Returns the actor's stored default for a grid.
    pub async fn get_user_preference(
        &self,
        actor: &UserIdentity,
        grid_key: &str,
    ) -> AppResult<Option<PreferenceTarget>> {
        self.preferences
            .find_preference(grid_key, actor.subject())
            .await
    }

    /// Reports why an untrusted config would be rejected for a grid.
    pub fn validate_config(&self, grid_key: &str, config: &Value) -> AppResult<Vec<String>> {
        let grid = self.registry.grid(grid_key)?;
        Ok(validate(config, &grid.columns))
    }

    fn checked_config(&self, grid_key: &str, config: &Value) -> AppResult<GridViewConfig> {
        let grid = self.registry.grid(grid_key)?;
        let errors = validate(config, &grid.columns);
        if !errors.is_empty() {
            return Err(AppError::Validation(errors.join("; ")));
        }

        Ok(normalize(config, &grid.columns))
    }

    /// Saves a new view owned by the actor.
    pub async fn create_view(
        &self,
        actor: &UserIdentity,
        input: CreateSavedViewInput,
    ) -> AppResult<SavedView> {
        let config = self.checked_config(&input.grid_key, &input.config)?;
        let view = self
            .views
            .create_view(SavedViewDraft {
                grid_key: input.grid_key.clone(),
                owner_subject: Some(actor.subject().to_owned()),
                name: input.name,
                description: input.description,
                is_default: false,
                is_system_default: false,
                config,
            })
            .await?;

        if input.is_default {
            self.set_user_default(actor, &input.grid_key, ViewId::Saved(view.id()))
                .await?;
        }

        Ok(view)
    }

    /// Changes a view owned by the actor.
    pub async fn update_view(
        &self,
        actor: &UserIdentity,
        view_id: i64,
        input: UpdateSavedViewInput,
    ) -> AppResult<SavedView> {
        let mut view = self.owned_view(actor, view_id).await?;
        let config = input
            .config
            .map(|config| self.checked_config(view.grid_key(), &config))
            .transpose()?;

        view.apply(
            SavedViewPatch {
                name: input.name,
                description: input.description,
                config,
                is_default: None,
            },
            Utc::now(),
        )?;
        self.views.update_view(view.clone()).await?;

        Ok(view)
    }

    /// Deletes a view owned by the actor, dropping a preference that points at it.
    pub async fn delete_view(&self, actor: &UserIdentity, view_id: i64) -> AppResult<()> {
        let view = self.owned_view(actor, view_id).await?;
        if view.is_system_default() {
            return Err(AppError::Forbidden(format!(
                "system default view '{view_id}' cannot be deleted"
            )));
        }

        self.preferences
            .clear_preference_for_view(view.grid_key(), actor.subject(), view_id)
            .await?;
        self.views.delete_view(view_id).await
    }

    /// Stores the actor's default view for a grid.
    ///
    /// A saved view must belong to the grid and be shared or owned by the
    /// actor. A system view key must be declared by the grid.
    pub async fn set_user_default(
        &self,
        actor: &UserIdentity,
        grid_key: &str,
        target: ViewId,
    ) -> AppResult<PreferenceTarget> {
        let grid = self.registry.grid(grid_key)?;

        let target = match target {
            ViewId::Saved(view_id) => {
                let view = self.views.find_view(view_id).await?.filter(|view| {
                    view.grid_key() == grid_key
                        && (view.owner_subject().is_none() || view.is_owned_by(actor.subject()))
                });
                if view.is_none() {
                    return Err(AppError::NotFound(format!(
                        "view '{view_id}' is not available for grid '{grid_key}'"
                    )));
                }
                PreferenceTarget::View(view_id)
            }
            ViewId::System(key) => {
                if grid.uses_system_views() && grid.system_view(&key).is_none() {
                    return Err(AppError::NotFound(format!(
                        "system view '{key}' is not declared for grid '{grid_key}'"
                    )));
                }
                PreferenceTarget::SystemView(key)
            }
        };

        self.preferences
            .replace_preference(grid_key, actor.subject(), target.clone())
            .await?;

        Ok(target)
    }

    /// Removes the actor's default view for a grid, including legacy flags.
    pub async fn clear_user_default(&self, actor: &UserIdentity, grid_key: &str) -> AppResult<()> {
        self.preferences
            .clear_preference(grid_key, actor.subject())
            .await?;
        self.views
            .clear_user_default_flags(grid_key, actor.subject())
            .await
    }

    /// Stores a shared default view that every user can load.
    pub async fn create_system_default(
        &self,
        grid_key: &str,
        name: &str,
        config: &Value,
    ) -> AppResult<SavedView> {
        let config = self.checked_config(grid_key, config)?;
        self.views
            .create_view(SavedViewDraft {
                grid_key: grid_key.to_owned(),
                owner_subject: None,
                name: name.to_owned(),
                description: None,
                is_default: false,
                is_system_default: true,
                config,
            })
            .await
    }

    async fn owned_view(&self, actor: &UserIdentity, view_id: i64) -> AppResult<SavedView> {
        self.get_view(actor, view_id)
            .await?
            .filter(|view| view.is_owned_by(actor.subject()))
            .ok_or_else(|| AppError::NotFound(format!("view '{view_id}' does not exist")))
    }
}

#[cfg(test)]
mod tests;
