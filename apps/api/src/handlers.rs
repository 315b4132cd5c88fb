pub mod grid_views;
pub mod grids;
pub mod health;
