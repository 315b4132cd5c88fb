mod cors;

use axum::Router;
use axum::middleware::from_fn;
use axum::routing::{get, post};
use gridview_core::AppError;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

use self::cors::build_cors_layer;

pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    let protected_routes = Router::new()
        .route(
            "/api/grids/{grid_key}/records",
            get(handlers::grids::grid_records_handler),
        )
        .route(
            "/api/grids/{grid_key}/frame",
            get(handlers::grids::grid_frame_handler),
        )
        .route(
            "/api/grid-views",
            get(handlers::grid_views::list_grid_views_handler)
                .post(handlers::grid_views::create_grid_view_handler),
        )
        .route(
            "/api/grid-views/default",
            post(handlers::grid_views::set_default_grid_view_handler)
                .delete(handlers::grid_views::clear_default_grid_view_handler),
        )
        .route(
            "/api/grid-views/validate",
            post(handlers::grid_views::validate_grid_view_handler),
        )
        .route(
            "/api/grid-views/{view_id}",
            get(handlers::grid_views::get_grid_view_handler)
                .put(handlers::grid_views::update_grid_view_handler)
                .delete(handlers::grid_views::delete_grid_view_handler),
        )
        .route_layer(from_fn(middleware::require_auth));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(build_cors_layer(frontend_url)?)
        .layer(TraceLayer::new_for_http()))
}
