use gridview_domain::{GridViewConfig, PreferenceTarget, SavedView, ViewId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

/// Query string naming one grid.
#[derive(Debug, Deserialize)]
pub struct GridKeyQuery {
    pub grid_key: String,
}

/// Incoming payload for saving a view.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-grid-view-request.ts"
)]
pub struct CreateGridViewRequest {
    pub grid_key: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[ts(type = "Record<string, unknown>")]
    pub config: Value,
    #[serde(default)]
    pub is_default: bool,
}

/// Incoming payload for changing a view.
///
/// A blank `description` clears it.
#[derive(Debug, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/update-grid-view-request.ts"
)]
pub struct UpdateGridViewRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    #[ts(type = "Record<string, unknown> | null")]
    pub config: Option<Value>,
}

/// Incoming payload for storing the caller's default view.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/set-default-grid-view-request.ts"
)]
pub struct SetDefaultGridViewRequest {
    pub grid_key: String,
    #[ts(type = "number | string")]
    pub view_id_or_key: ViewId,
}

impl SetDefaultGridViewRequest {
    /// Numeric strings name saved views.
    pub fn target(&self) -> ViewId {
        match &self.view_id_or_key {
            ViewId::System(key) => ViewId::parse(key),
            saved => saved.clone(),
        }
    }
}

/// API representation of the caller's default view.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/default-grid-view-response.ts"
)]
pub struct DefaultGridViewResponse {
    pub grid_key: String,
    #[ts(type = "number | string")]
    pub view_id_or_key: ViewId,
}

impl DefaultGridViewResponse {
    pub fn new(grid_key: String, target: &PreferenceTarget) -> Self {
        Self {
            grid_key,
            view_id_or_key: target.view_id(),
        }
    }
}

/// Incoming payload for checking a config without saving it.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/validate-grid-view-request.ts"
)]
pub struct ValidateGridViewRequest {
    pub grid_key: String,
    #[ts(type = "Record<string, unknown>")]
    pub config: Value,
}

/// Problems found in a config; empty when it would be accepted.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/validate-grid-view-response.ts"
)]
pub struct ValidateGridViewResponse {
    pub errors: Vec<String>,
}

/// API representation of a saved view.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/grid-view-response.ts"
)]
pub struct GridViewResponse {
    pub id: i64,
    pub grid_key: String,
    pub owner_subject: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub is_default: bool,
    pub is_system_default: bool,
    #[ts(type = "Record<string, unknown>")]
    pub config: GridViewConfig,
    pub created_at: String,
    pub updated_at: String,
}

impl From<SavedView> for GridViewResponse {
    fn from(value: SavedView) -> Self {
        Self {
            id: value.id(),
            grid_key: value.grid_key().to_owned(),
            owner_subject: value.owner_subject().map(ToOwned::to_owned),
            name: value.name().to_owned(),
            description: value.description().map(ToOwned::to_owned),
            is_default: value.is_default(),
            is_system_default: value.is_system_default(),
            config: value.config().clone(),
            created_at: value.created_at().to_rfc3339(),
            updated_at: value.updated_at().to_rfc3339(),
        }
    }
}
