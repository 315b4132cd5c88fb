use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use gridview_application::GridRegistry;
use gridview_core::{AppError, AppResult};
use gridview_domain::GridDefinition;
use serde::Deserialize;
use serde_json::Value;

/// Shared default view created for a grid when storage is seeded.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemDefaultSeed {
    pub grid_key: String,
    pub name: String,
    #[serde(default)]
    pub config: Value,
}

/// Grid declarations plus optional seed data, read from one JSON document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCatalog {
    pub grids: Vec<GridDefinition>,
    #[serde(default)]
    pub system_default_views: Vec<SystemDefaultSeed>,
    /// Rows keyed by table name; each row needs an `id`.
    #[serde(default)]
    pub seed_records: BTreeMap<String, Vec<Value>>,
}

impl GridCatalog {
    pub fn parse(json: &str) -> AppResult<Self> {
        serde_json::from_str(json)
            .map_err(|error| AppError::Validation(format!("invalid grid catalog: {error}")))
    }

    pub fn registry(&self) -> AppResult<GridRegistry> {
        GridRegistry::new(self.grids.clone())
    }
}

pub fn load_grid_catalog(path: &Path) -> AppResult<GridCatalog> {
    let json = fs::read_to_string(path).map_err(|error| {
        AppError::Internal(format!(
            "failed to read grid catalog '{}': {error}",
            path.display()
        ))
    })?;

    GridCatalog::parse(&json)
}
