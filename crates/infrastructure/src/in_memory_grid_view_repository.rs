use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gridview_application::{GridViewPreferenceRepository, SavedViewRepository};
use gridview_core::{AppError, AppResult};
use gridview_domain::{PreferenceTarget, SavedView, SavedViewDraft};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct StoredView {
    view: SavedView,
    deleted_at: Option<DateTime<Utc>>,
}

impl StoredView {
    fn live(&self) -> Option<&SavedView> {
        self.deleted_at.is_none().then_some(&self.view)
    }
}

/// In-memory saved view and preference repository.
#[derive(Debug, Default)]
pub struct InMemoryGridViewRepository {
    views: RwLock<Vec<StoredView>>,
    preferences: RwLock<HashMap<(String, String), PreferenceTarget>>,
}

impl InMemoryGridViewRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SavedViewRepository for InMemoryGridViewRepository {
    async fn list_views_for_grid(
        &self,
        grid_key: &str,
        subject: &str,
    ) -> AppResult<Vec<SavedView>> {
        let views = self.views.read().await;
        let mut listed: Vec<SavedView> = views
            .iter()
            .filter_map(StoredView::live)
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
            .read()
            .await
            .iter()
            .filter_map(StoredView::live)
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
            .read()
            .await
            .iter()
            .filter_map(StoredView::live)
            .find(|view| {
                view.grid_key() == grid_key && view.is_owned_by(subject) && view.is_default()
            })
            .cloned())
    }

    async fn find_system_default_view(&self, grid_key: &str) -> AppResult<Option<SavedView>> {
        Ok(self
            .views
            .read()
            .await
            .iter()
            .filter_map(StoredView::live)
            .find(|view| view.grid_key() == grid_key && view.is_system_default())
            .cloned())
    }

    async fn create_view(&self, draft: SavedViewDraft) -> AppResult<SavedView> {
        let mut views = self.views.write().await;
        if draft.is_system_default
            && views.iter().filter_map(StoredView::live).any(|view| {
                view.is_system_default() && view.grid_key() == draft.grid_key
            })
        {
            return Err(AppError::Conflict(format!(
                "grid '{}' already has a system default view",
                draft.grid_key
            )));
        }

        let next_id = views
            .iter()
            .map(|stored| stored.view.id())
            .max()
            .unwrap_or_default()
            + 1;

        let view = draft.into_view(next_id, Utc::now())?;
        views.push(StoredView {
            view: view.clone(),
            deleted_at: None,
        });

        Ok(view)
    }

    async fn update_view(&self, view: SavedView) -> AppResult<()> {
        let mut views = self.views.write().await;
        let stored = views
            .iter_mut()
            .find(|stored| stored.deleted_at.is_none() && stored.view.id() == view.id())
            .ok_or_else(|| AppError::NotFound(format!("view '{}' does not exist", view.id())))?;

        stored.view = view;
        Ok(())
    }

    async fn delete_view(&self, view_id: i64) -> AppResult<()> {
        let mut views = self.views.write().await;
        let stored = views
            .iter_mut()
            .find(|stored| stored.deleted_at.is_none() && stored.view.id() == view_id)
            .ok_or_else(|| AppError::NotFound(format!("view '{view_id}' does not exist")))?;

        stored.deleted_at = Some(Utc::now());
        Ok(())
    }

    async fn clear_user_default_flags(&self, grid_key: &str, subject: &str) -> AppResult<()> {
        let mut views = self.views.write().await;
        for stored in views.iter_mut() {
            if stored.view.grid_key() == grid_key && stored.view.is_owned_by(subject) {
                stored.view.set_default(false);
            }
        }

        Ok(())
    }
}

#[async_trait]
impl GridViewPreferenceRepository for InMemoryGridViewRepository {
    async fn find_preference(
        &self,
        grid_key: &str,
        subject: &str,
    ) -> AppResult<Option<PreferenceTarget>> {
        Ok(self
            .preferences
            .read()
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
            .write()
            .await
            .insert((grid_key.to_owned(), subject.to_owned()), target);
        Ok(())
    }

    async fn clear_preference(&self, grid_key: &str, subject: &str) -> AppResult<()> {
        self.preferences
            .write()
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
        let mut preferences = self.preferences.write().await;
        let key = (grid_key.to_owned(), subject.to_owned());
        if preferences.get(&key) == Some(&PreferenceTarget::View(view_id)) {
            preferences.remove(&key);
        }

        Ok(())
    }
}
