use gridview_core::UserIdentity;
use gridview_domain::{
    ColumnCatalog, ColumnMetadata, ColumnType, FilterOption, GridDefinition, SortDirection,
    SortSpec,
};
use serde_json::{Value, json};

use crate::api_services::{Storage, build_app_state};
use crate::state::AppState;

pub(crate) fn alice() -> UserIdentity {
    UserIdentity::new("alice", "Alice", None)
}

pub(crate) fn bob() -> UserIdentity {
    UserIdentity::new("bob", "Bob", None)
}

pub(crate) fn members_grid() -> GridDefinition {
    let columns = ColumnCatalog::new(vec![
        ColumnMetadata::new("name", "Name").required().searchable(),
        ColumnMetadata::new("email", "Email")
            .with_type(ColumnType::Email)
            .searchable(),
        ColumnMetadata::new("status", "Status").with_dropdown(vec![
            FilterOption::new("active", "Active"),
            FilterOption::new("inactive", "Inactive"),
        ]),
        ColumnMetadata::new("joined_at", "Joined")
            .with_type(ColumnType::Date)
            .with_date_range(),
        ColumnMetadata::new("notes", "Notes").hidden_by_default(),
    ]);
    let mut grid =
        GridDefinition::new("members", "members", columns).unwrap_or_else(|_| unreachable!());
    grid.default_sort = Some(SortSpec::new("name", SortDirection::Asc));
    grid
}

fn member_rows() -> Vec<(&'static str, Value)> {
    vec![
        (
            "1",
            json!({"name": "Ann <Admin>", "email": "ann@example.com", "status": "active", "joined_at": "2024-01-10"}),
        ),
        (
            "2",
            json!({"name": "Bo", "email": "bo@example.com", "status": "inactive", "joined_at": "2024-03-02"}),
        ),
        (
            "3",
            json!({"name": "Cy", "email": "cy@example.com", "status": "active", "joined_at": "2024-06-21"}),
        ),
    ]
}

/// In-memory state with the members grid and three rows.
pub(crate) async fn members_state() -> AppState {
    let storage = Storage::memory();
    if let Storage::Memory { records, .. } = &storage {
        for (id, data) in member_rows() {
            records.upsert_record("members", id, data).await;
        }
    }
    let registry = gridview_application::GridRegistry::new(vec![members_grid()])
        .unwrap_or_else(|_| unreachable!());

    build_app_state(&storage, registry)
}
