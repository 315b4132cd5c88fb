//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_grid_record_repository;
mod in_memory_grid_view_repository;
mod postgres_grid_record_repository;
mod postgres_grid_view_repository;

pub use in_memory_grid_record_repository::InMemoryGridRecordRepository;
pub use in_memory_grid_view_repository::InMemoryGridViewRepository;
pub use postgres_grid_record_repository::PostgresGridRecordRepository;
pub use postgres_grid_view_repository::PostgresGridViewRepository;
