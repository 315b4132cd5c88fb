use chrono::{DateTime, Utc};
use gridview_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::config::GridViewConfig;
use crate::snapshot::ViewId;

/// Named grid view configuration persisted for a user or shared by everyone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedView {
    id: i64,
    grid_key: NonEmptyString,
    owner_subject: Option<String>,
    name: NonEmptyString,
    description: Option<String>,
    is_default: bool,
    is_system_default: bool,
    config: GridViewConfig,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Fields of a view about to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedViewDraft {
    /// Grid the view belongs to.
    pub grid_key: String,
    /// Owner; `None` for shared system defaults.
    pub owner_subject: Option<String>,
    /// Tab label.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Legacy per-user default flag.
    pub is_default: bool,
    /// Shared default flag.
    pub is_system_default: bool,
    /// Normalized configuration.
    pub config: GridViewConfig,
}

impl SavedViewDraft {
    /// Validates the draft into a freshly stored view.
    pub fn into_view(self, id: i64, created_at: DateTime<Utc>) -> AppResult<SavedView> {
        self.into_stored_view(id, created_at, created_at)
    }

    /// Validates the draft into a view with known timestamps.
    pub fn into_stored_view(
        self,
        id: i64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> AppResult<SavedView> {
        Ok(SavedView {
            id,
            grid_key: NonEmptyString::new(self.grid_key)?,
            owner_subject: self.owner_subject,
            name: NonEmptyString::new(self.name).map_err(|_| {
                AppError::Validation("saved view name must not be empty".to_owned())
            })?,
            description: self
                .description
                .map(|description| description.trim().to_owned())
                .filter(|description| !description.is_empty()),
            is_default: self.is_default,
            is_system_default: self.is_system_default,
            config: self.config,
            created_at,
            updated_at,
        })
    }
}

/// Changes applied by the owner of a saved view.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SavedViewPatch {
    /// New label.
    pub name: Option<String>,
    /// New description; `Some(None)` clears it.
    pub description: Option<Option<String>>,
    /// New normalized configuration.
    pub config: Option<GridViewConfig>,
    /// New legacy default flag.
    pub is_default: Option<bool>,
}

impl SavedView {
    /// Returns the row id.
    #[must_use]
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Returns the id as a view identifier.
    #[must_use]
    pub fn view_id(&self) -> ViewId {
        ViewId::Saved(self.id)
    }

    /// Returns the grid key.
    #[must_use]
    pub fn grid_key(&self) -> &str {
        self.grid_key.as_str()
    }

    /// Returns the owner subject.
    #[must_use]
    pub fn owner_subject(&self) -> Option<&str> {
        self.owner_subject.as_deref()
    }

    /// Returns the name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the legacy per-user default flag.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.is_default
    }

    /// Returns the shared default flag.
    #[must_use]
    pub fn is_system_default(&self) -> bool {
        self.is_system_default
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &GridViewConfig {
        &self.config
    }

    /// Returns the creation time.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update time.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns true when the subject may read the view.
    ///
    /// Ownerless system defaults are readable by everyone.
    #[must_use]
    pub fn is_visible_to(&self, subject: &str) -> bool {
        (self.is_system_default && self.owner_subject.is_none())
            || self.owner_subject.as_deref() == Some(subject)
    }

    /// Returns true when the subject owns the view.
    #[must_use]
    pub fn is_owned_by(&self, subject: &str) -> bool {
        self.owner_subject.as_deref() == Some(subject)
    }

    /// Applies an owner patch; id, owner and creation time never change.
    pub fn apply(&mut self, patch: SavedViewPatch, updated_at: DateTime<Utc>) -> AppResult<()> {
        if let Some(name) = patch.name {
            self.name = NonEmptyString::new(name).map_err(|_| {
                AppError::Validation("saved view name must not be empty".to_owned())
            })?;
        }
        if let Some(description) = patch.description {
            self.description = description
                .map(|description| description.trim().to_owned())
                .filter(|description| !description.is_empty());
        }
        if let Some(config) = patch.config {
            self.config = config;
        }
        if let Some(is_default) = patch.is_default {
            self.is_default = is_default;
        }
        self.updated_at = updated_at;
        Ok(())
    }

    /// Sets the legacy default flag.
    pub fn set_default(&mut self, is_default: bool) {
        self.is_default = is_default;
    }
}

/// What a user's default preference for a grid points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceTarget {
    /// Saved view row.
    View(i64),
    /// System view key.
    SystemView(String),
}

impl PreferenceTarget {
    /// Returns the target as a view identifier.
    #[must_use]
    pub fn view_id(&self) -> ViewId {
        match self {
            Self::View(id) => ViewId::Saved(*id),
            Self::SystemView(key) => ViewId::System(key.clone()),
        }
    }
}
