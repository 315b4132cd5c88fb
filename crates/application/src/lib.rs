//! Application services and ports.

#![forbid(unsafe_code)]

mod grid_data_service;
mod grid_ports;
mod grid_query;
mod grid_request;
mod grid_view_service;

#[cfg(test)]
mod test_support;

pub use grid_data_service::{GridDataService, GridPage, GridPagination};
pub use grid_ports::{
    GridRecord, GridRecordPage, GridRecordQuery, GridRecordRepository, GridRegistry,
    GridViewPreferenceRepository, SavedViewRepository,
};
pub use grid_query::{
    NativeComparison, NativeCondition, NativeConditionMap, NativeExpression, NativeOrder,
    compile_condition, compile_expression, compile_expression_value, compile_flat,
    compile_flat_value, compile_search, qualify_field,
};
pub use grid_request::{DirtyFlags, GridRequest};
pub use grid_view_service::{CreateSavedViewInput, GridViewService, UpdateSavedViewInput};
