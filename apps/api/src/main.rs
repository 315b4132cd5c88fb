//! Grid view API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

#[cfg(test)]
mod test_support;

use gridview_core::AppError;
use tracing::info;

use crate::api_config::{ApiCommand, ApiConfig, StorageConfig};
use crate::api_services::Storage;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    api_config::init_tracing();

    let config = ApiConfig::load()?;

    let storage = match &config.storage {
        StorageConfig::Memory => Storage::memory(),
        StorageConfig::Postgres { database_url } => {
            Storage::postgres(api_services::connect_and_migrate(database_url).await?)
        }
    };

    if config.command == ApiCommand::Migrate {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let catalog = api_services::load_grid_catalog(&config.grid_definitions_path)?;
    let registry = catalog.registry()?;
    info!(grids = ?registry.grid_keys(), "grid catalog loaded");
    let app_state = api_services::build_app_state(&storage, registry);

    let seed_now = matches!(storage, Storage::Memory { .. }) || config.command == ApiCommand::Seed;
    if seed_now {
        api_services::seed_storage(&storage, &app_state, &catalog).await?;
    }
    if config.command == ApiCommand::Seed {
        return Ok(());
    }

    let app = api_router::build_router(app_state, &config.frontend_url)?;
    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "gridview-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
