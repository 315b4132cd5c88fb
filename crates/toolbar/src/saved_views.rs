use std::sync::Arc;

use async_trait::async_trait;
use gridview_core::{AppError, AppResult, UserIdentity};
use gridview_domain::{GridViewConfig, ViewId};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;
use url::Url;

use crate::controller::GridViewController;

/// Saved-view endpoints the toolbar calls.
#[async_trait]
pub trait SavedViewApi: Send + Sync {
    /// Stores a new view and returns its id.
    async fn create_view(
        &self,
        grid_key: &str,
        name: &str,
        config: &GridViewConfig,
    ) -> AppResult<ViewId>;

    /// Replaces the config of a view.
    async fn update_view(&self, view_id: &ViewId, config: &GridViewConfig) -> AppResult<()>;

    /// Deletes a view.
    async fn delete_view(&self, view_id: &ViewId) -> AppResult<()>;

    /// Stores a view as the caller's default for a grid.
    async fn set_default(&self, grid_key: &str, view_id: &ViewId) -> AppResult<()>;

    /// Drops the caller's default for a grid.
    async fn clear_default(&self, grid_key: &str) -> AppResult<()>;
}

/// Blocking yes/no question shown before destructive actions.
pub trait Confirm: Send + Sync {
    /// Returns true when the user agreed.
    fn confirm(&self, message: &str) -> bool;
}

/// User-facing message sink.
pub trait Notifier: Send + Sync {
    /// Shows a message.
    fn alert(&self, message: &str);
}

/// What the page does after a saved-view action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SavedViewOutcome {
    /// Nothing changed.
    Unchanged,
    /// Load this URL.
    Assign(String),
    /// Reload the current page.
    Reload,
}

/// Saved-view actions of the toolbar menu.
///
/// Each action is a single request without retry. Failures are reported
/// through the notifier and leave the page as it is.
#[derive(Clone)]
pub struct SavedViewActions {
    api: Arc<dyn SavedViewApi>,
    confirm: Arc<dyn Confirm>,
    notifier: Arc<dyn Notifier>,
}

impl SavedViewActions {
    /// Creates the actions.
    #[must_use]
    pub fn new(
        api: Arc<dyn SavedViewApi>,
        confirm: Arc<dyn Confirm>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            api,
            confirm,
            notifier,
        }
    }

    fn fail(&self, action: &str, error: &AppError) -> SavedViewOutcome {
        warn!(%error, "failed to {action}");
        self.notifier
            .alert(&format!("Failed to {action}: {error}"));
        SavedViewOutcome::Unchanged
    }

    fn current_view(&self, controller: &GridViewController, action: &str) -> Option<ViewId> {
        let current = controller
            .state()
            .and_then(|state| state.view.current_id.clone());
        if current.is_none() {
            self.notifier
                .alert(&format!("No view selected to {action}"));
        }
        current
    }

    /// Saves the current toolbar state under `name`; blank names are ignored.
    pub async fn save_view(&self, controller: &GridViewController, name: &str) -> SavedViewOutcome {
        let name = name.trim();
        if name.is_empty() {
            return SavedViewOutcome::Unchanged;
        }
        let (Some(state), Some(config)) = (controller.state(), controller.current_config()) else {
            return SavedViewOutcome::Unchanged;
        };

        match self
            .api
            .create_view(&state.config.grid_key, name, &config)
            .await
        {
            Ok(view_id) => {
                self.notifier.alert("View saved successfully");
                let view_id = view_id.to_string();
                SavedViewOutcome::Assign(
                    controller
                        .navigator()
                        .build_url(&[("view_id", Some(view_id.as_str()))]),
                )
            }
            Err(error) => self.fail("save view", &error),
        }
    }

    /// Overwrites the loaded view with the current toolbar state.
    pub async fn update_view(&self, controller: &GridViewController) -> SavedViewOutcome {
        let Some(view_id) = self.current_view(controller, "update") else {
            return SavedViewOutcome::Unchanged;
        };
        if !self.confirm.confirm("Update this view with current settings?") {
            return SavedViewOutcome::Unchanged;
        }
        let Some(config) = controller.current_config() else {
            return SavedViewOutcome::Unchanged;
        };

        match self.api.update_view(&view_id, &config).await {
            Ok(()) => {
                self.notifier.alert("View updated successfully");
                SavedViewOutcome::Reload
            }
            Err(error) => self.fail("update view", &error),
        }
    }

    /// Deletes the loaded view after confirmation.
    pub async fn delete_view(&self, controller: &GridViewController) -> SavedViewOutcome {
        let Some(view_id) = self.current_view(controller, "delete") else {
            return SavedViewOutcome::Unchanged;
        };
        if !self.confirm.confirm("Are you sure you want to delete this view?") {
            return SavedViewOutcome::Unchanged;
        }

        match self.api.delete_view(&view_id).await {
            Ok(()) => {
                self.notifier.alert("View deleted successfully");
                SavedViewOutcome::Assign(controller.navigator().build_url(&[("view_id", None)]))
            }
            Err(error) => self.fail("delete view", &error),
        }
    }

    /// Stores the loaded view as the user's default.
    pub async fn set_default(&self, controller: &GridViewController) -> SavedViewOutcome {
        let Some(view_id) = self.current_view(controller, "set as default") else {
            return SavedViewOutcome::Unchanged;
        };
        let grid_key = controller
            .state()
            .map(|state| state.config.grid_key.clone())
            .unwrap_or_default();

        match self.api.set_default(&grid_key, &view_id).await {
            Ok(()) => {
                self.notifier.alert("Default view set successfully");
                SavedViewOutcome::Reload
            }
            Err(error) => self.fail("set default", &error),
        }
    }

    /// Drops the user's default view.
    pub async fn clear_default(&self, controller: &GridViewController) -> SavedViewOutcome {
        let Some(state) = controller.state() else {
            return SavedViewOutcome::Unchanged;
        };

        match self.api.clear_default(&state.config.grid_key).await {
            Ok(()) => {
                self.notifier.alert("Default view cleared successfully");
                SavedViewOutcome::Reload
            }
            Err(error) => self.fail("clear default", &error),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatedView {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// `SavedViewApi` over the grid view HTTP endpoints.
#[derive(Clone)]
pub struct HttpSavedViewApi {
    http_client: reqwest::Client,
    api_base_url: Url,
    identity: UserIdentity,
}

impl HttpSavedViewApi {
    /// Creates a client for the API at `api_base_url`, acting as `identity`.
    pub fn new(
        http_client: reqwest::Client,
        api_base_url: &str,
        identity: UserIdentity,
    ) -> AppResult<Self> {
        let api_base_url = Url::parse(api_base_url).map_err(|error| {
            AppError::Validation(format!("invalid API base URL '{api_base_url}': {error}"))
        })?;
        Ok(Self {
            http_client,
            api_base_url,
            identity,
        })
    }

    fn endpoint(&self, path: &str) -> AppResult<Url> {
        self.api_base_url
            .join(path)
            .map_err(|error| AppError::Internal(format!("failed to build endpoint URL: {error}")))
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.http_client
            .request(method, url)
            .header("x-user-subject", self.identity.subject())
            .header("x-user-name", self.identity.display_name())
    }

    async fn send(&self, builder: reqwest::RequestBuilder, action: &str) -> AppResult<reqwest::Response> {
        let response = builder
            .send()
            .await
            .map_err(|error| AppError::Internal(format!("failed to call {action} endpoint: {error}")))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<body unavailable>".to_owned());
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|error| error.message)
            .unwrap_or(body);

        Err(match status.as_u16() {
            400 => AppError::Validation(message),
            401 => AppError::Unauthorized(message),
            403 => AppError::Forbidden(message),
            404 => AppError::NotFound(message),
            409 => AppError::Conflict(message),
            code => AppError::Internal(format!("{action} endpoint returned status {code}: {message}")),
        })
    }
}

#[async_trait]
impl SavedViewApi for HttpSavedViewApi {
    async fn create_view(
        &self,
        grid_key: &str,
        name: &str,
        config: &GridViewConfig,
    ) -> AppResult<ViewId> {
        let url = self.endpoint("/api/grid-views")?;
        let builder = self.request(reqwest::Method::POST, url).json(&json!({
            "gridKey": grid_key,
            "name": name,
            "config": config,
        }));
        let created = self
            .send(builder, "create view")
            .await?
            .json::<CreatedView>()
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to parse create view response body: {error}"))
            })?;

        Ok(ViewId::Saved(created.id))
    }

    async fn update_view(&self, view_id: &ViewId, config: &GridViewConfig) -> AppResult<()> {
        let url = self.endpoint(&format!("/api/grid-views/{view_id}"))?;
        let builder = self
            .request(reqwest::Method::PUT, url)
            .json(&json!({ "config": config }));
        self.send(builder, "update view").await.map(|_| ())
    }

    async fn delete_view(&self, view_id: &ViewId) -> AppResult<()> {
        let url = self.endpoint(&format!("/api/grid-views/{view_id}"))?;
        let builder = self.request(reqwest::Method::DELETE, url);
        self.send(builder, "delete view").await.map(|_| ())
    }

    async fn set_default(&self, grid_key: &str, view_id: &ViewId) -> AppResult<()> {
        let url = self.endpoint("/api/grid-views/default")?;
        let builder = self.request(reqwest::Method::POST, url).json(&json!({
            "gridKey": grid_key,
            "viewIdOrKey": view_id,
        }));
        self.send(builder, "set default").await.map(|_| ())
    }

    async fn clear_default(&self, grid_key: &str) -> AppResult<()> {
        let mut url = self.endpoint("/api/grid-views/default")?;
        url.query_pairs_mut().append_pair("grid_key", grid_key);
        let builder = self.request(reqwest::Method::DELETE, url);
        self.send(builder, "clear default").await.map(|_| ())
    }
}

#[cfg(test)]
mod tests;
