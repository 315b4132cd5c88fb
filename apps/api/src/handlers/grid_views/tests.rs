use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use gridview_core::AppError;
use gridview_domain::{PreferenceTarget, ViewId};
use serde_json::json;

use super::{
    clear_default_grid_view_handler, create_grid_view_handler, delete_grid_view_handler,
    get_grid_view_handler, list_grid_views_handler, set_default_grid_view_handler,
    update_grid_view_handler, validate_grid_view_handler,
};
use crate::dto::{
    CreateGridViewRequest, GridKeyQuery, SetDefaultGridViewRequest, UpdateGridViewRequest,
    ValidateGridViewRequest,
};
use crate::state::AppState;
use crate::test_support::{alice, bob, members_state};

fn create_request(name: &str) -> CreateGridViewRequest {
    CreateGridViewRequest {
        grid_key: "members".to_owned(),
        name: name.to_owned(),
        description: None,
        config: json!({
            "filters": [{"field": "status", "operator": "eq", "value": "active"}],
            "sort": [{"field": "name", "direction": "desc"}],
            "pageSize": 50
        }),
        is_default: false,
    }
}

async fn create_view(state: &AppState, name: &str) -> i64 {
    let created =
        create_grid_view_handler(State(state.clone()), Extension(alice()), Json(create_request(name)))
            .await
            .unwrap_or_else(|_| unreachable!());
    assert_eq!(created.0, StatusCode::CREATED);
    created.1.0.id
}

fn members_query() -> Query<GridKeyQuery> {
    Query(GridKeyQuery {
        grid_key: "members".to_owned(),
    })
}

#[tokio::test]
async fn created_views_are_listed_for_their_owner_only() {
    let state = members_state().await;
    let view_id = create_view(&state, "Active members").await;

    let Json(listed) =
        list_grid_views_handler(State(state.clone()), Extension(alice()), members_query())
            .await
            .unwrap_or_else(|_| unreachable!());
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, view_id);
    assert_eq!(listed[0].owner_subject.as_deref(), Some("alice"));
    assert_eq!(listed[0].config.page_size, 50);

    let Json(foreign) =
        list_grid_views_handler(State(state.clone()), Extension(bob()), members_query())
            .await
            .unwrap_or_else(|_| unreachable!());
    assert!(foreign.is_empty());

    let hidden = get_grid_view_handler(State(state), Extension(bob()), Path(view_id)).await;
    assert!(matches!(hidden, Err(error) if matches!(error.0, AppError::NotFound(_))));
}

#[tokio::test]
async fn invalid_configs_are_rejected_with_bad_request() {
    let state = members_state().await;
    let mut request = create_request("Broken");
    request.config = json!({"filters": [{"field": "salary", "operator": "eq", "value": 1}]});

    let result =
        create_grid_view_handler(State(state.clone()), Extension(alice()), Json(request)).await;
    let status = result.map(|_| StatusCode::CREATED).unwrap_or_else(|error| {
        error.into_response().status()
    });
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let unknown_grid = list_grid_views_handler(
        State(state),
        Extension(alice()),
        Query(GridKeyQuery {
            grid_key: "ghosts".to_owned(),
        }),
    )
    .await;
    assert!(matches!(unknown_grid, Err(error) if matches!(error.0, AppError::NotFound(_))));
}

#[tokio::test]
async fn owners_update_and_delete_their_views() {
    let state = members_state().await;
    let view_id = create_view(&state, "Active members").await;

    let Json(updated) = update_grid_view_handler(
        State(state.clone()),
        Extension(alice()),
        Path(view_id),
        Json(UpdateGridViewRequest {
            name: Some("Renamed".to_owned()),
            description: Some("  ".to_owned()),
            config: None,
        }),
    )
    .await
    .unwrap_or_else(|_| unreachable!());
    assert_eq!(updated.name, "Renamed");
    assert_eq!(updated.description, None);
    assert_eq!(updated.config.page_size, 50);

    let foreign_delete =
        delete_grid_view_handler(State(state.clone()), Extension(bob()), Path(view_id)).await;
    assert!(foreign_delete.is_err());

    let deleted = delete_grid_view_handler(State(state.clone()), Extension(alice()), Path(view_id))
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(deleted, StatusCode::NO_CONTENT);

    let gone = get_grid_view_handler(State(state), Extension(alice()), Path(view_id)).await;
    assert!(gone.is_err());
}

#[tokio::test]
async fn default_view_can_be_set_and_cleared() {
    let state = members_state().await;
    let view_id = create_view(&state, "Active members").await;

    let Json(stored) = set_default_grid_view_handler(
        State(state.clone()),
        Extension(alice()),
        Json(SetDefaultGridViewRequest {
            grid_key: "members".to_owned(),
            view_id_or_key: ViewId::System(view_id.to_string()),
        }),
    )
    .await
    .unwrap_or_else(|_| unreachable!());
    assert_eq!(stored.view_id_or_key, ViewId::Saved(view_id));
    assert_eq!(
        state
            .grid_view_service
            .get_user_preference(&alice(), "members")
            .await
            .ok()
            .flatten(),
        Some(PreferenceTarget::View(view_id))
    );

    let foreign = set_default_grid_view_handler(
        State(state.clone()),
        Extension(bob()),
        Json(SetDefaultGridViewRequest {
            grid_key: "members".to_owned(),
            view_id_or_key: ViewId::Saved(view_id),
        }),
    )
    .await;
    assert!(foreign.is_err());

    let cleared =
        clear_default_grid_view_handler(State(state.clone()), Extension(alice()), members_query())
            .await
            .unwrap_or_else(|_| unreachable!());
    assert_eq!(cleared, StatusCode::NO_CONTENT);
    assert_eq!(
        state
            .grid_view_service
            .get_user_preference(&alice(), "members")
            .await
            .ok()
            .flatten(),
        None
    );
}

#[tokio::test]
async fn validation_reports_every_problem() {
    let state = members_state().await;

    let Json(response) = validate_grid_view_handler(
        State(state.clone()),
        Json(ValidateGridViewRequest {
            grid_key: "members".to_owned(),
            config: json!({
                "filters": [
                    {"field": "status", "operator": "eq", "value": "active"},
                    {"field": "status", "operator": "between", "value": 1}
                ],
                "sort": "name",
                "pageSize": 5000
            }),
        }),
    )
    .await
    .unwrap_or_else(|_| unreachable!());

    assert_eq!(
        response.errors,
        vec![
            "Invalid filter at index 1".to_owned(),
            "Sort must be an array".to_owned(),
            "Page size must be between 10 and 100".to_owned(),
        ]
    );

    let Json(clean) = validate_grid_view_handler(
        State(state),
        Json(ValidateGridViewRequest {
            grid_key: "members".to_owned(),
            config: json!({"columns": [{"key": "name", "visible": true}]}),
        }),
    )
    .await
    .unwrap_or_else(|_| unreachable!());
    assert!(clean.errors.is_empty());
}
