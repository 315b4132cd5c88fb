use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use gridview_application::{CreateSavedViewInput, UpdateSavedViewInput};
use gridview_core::{AppError, UserIdentity};

use crate::dto::{
    CreateGridViewRequest, DefaultGridViewResponse, GridKeyQuery, GridViewResponse,
    SetDefaultGridViewRequest, UpdateGridViewRequest, ValidateGridViewRequest,
    ValidateGridViewResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_grid_views_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<GridKeyQuery>,
) -> ApiResult<Json<Vec<GridViewResponse>>> {
    state
        .grid_view_service
        .registry()
        .grid(query.grid_key.as_str())?;
    let views = state
        .grid_view_service
        .get_views_for_grid(&user, query.grid_key.as_str())
        .await?
        .into_iter()
        .map(GridViewResponse::from)
        .collect();

    Ok(Json(views))
}

pub async fn create_grid_view_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CreateGridViewRequest>,
) -> ApiResult<(StatusCode, Json<GridViewResponse>)> {
    let view = state
        .grid_view_service
        .create_view(
            &user,
            CreateSavedViewInput {
                grid_key: payload.grid_key,
                name: payload.name,
                description: payload.description,
                config: payload.config,
                is_default: payload.is_default,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(GridViewResponse::from(view))))
}

pub async fn get_grid_view_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(view_id): Path<i64>,
) -> ApiResult<Json<GridViewResponse>> {
    let view = state
        .grid_view_service
        .get_view(&user, view_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("view '{view_id}' does not exist")))?;

    Ok(Json(GridViewResponse::from(view)))
}

pub async fn update_grid_view_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(view_id): Path<i64>,
    Json(payload): Json<UpdateGridViewRequest>,
) -> ApiResult<Json<GridViewResponse>> {
    let description = payload.description.map(|description| {
        let trimmed = description.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_owned())
    });
    let view = state
        .grid_view_service
        .update_view(
            &user,
            view_id,
            UpdateSavedViewInput {
                name: payload.name,
                description,
                config: payload.config,
            },
        )
        .await?;

    Ok(Json(GridViewResponse::from(view)))
}

pub async fn delete_grid_view_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(view_id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.grid_view_service.delete_view(&user, view_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_default_grid_view_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<SetDefaultGridViewRequest>,
) -> ApiResult<Json<DefaultGridViewResponse>> {
    let target = state
        .grid_view_service
        .set_user_default(&user, payload.grid_key.as_str(), payload.target())
        .await?;

    Ok(Json(DefaultGridViewResponse::new(payload.grid_key, &target)))
}

pub async fn clear_default_grid_view_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<GridKeyQuery>,
) -> ApiResult<StatusCode> {
    state
        .grid_view_service
        .clear_user_default(&user, query.grid_key.as_str())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn validate_grid_view_handler(
    State(state): State<AppState>,
    Json(payload): Json<ValidateGridViewRequest>,
) -> ApiResult<Json<ValidateGridViewResponse>> {
    let errors = state
        .grid_view_service
        .validate_config(payload.grid_key.as_str(), &payload.config)?;

    Ok(Json(ValidateGridViewResponse { errors }))
}

#[cfg(test)]
mod tests;
