mod catalog;
mod database;
mod state_builder;

pub use catalog::load_grid_catalog;
pub use database::connect_and_migrate;
pub use state_builder::{Storage, build_app_state, seed_storage};
