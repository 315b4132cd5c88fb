//! Grid view configuration model, normalization and server snapshot types.

#![forbid(unsafe_code)]

mod column;
mod columns;
mod config;
mod filter;
mod grid;
mod normalize;
mod ordered_map;
mod saved_view;
mod snapshot;

pub use column::{ColumnCatalog, ColumnMetadata, ColumnType, FilterOption, FilterType};
pub use columns::{
    ColumnPlacement, UNORDERED_POSITION, extract_column_configuration, extract_visible_columns,
};
pub use config::{
    ColumnSpec, DEFAULT_PAGE_SIZE, GridViewConfig, MAX_PAGE_SIZE, MIN_PAGE_SIZE, SortDirection,
    SortSpec,
};
pub use filter::{
    Conjunction, ExpressionNode, FilterCondition, FilterOperator, SEARCH_FIELD, is_blank,
    scalar_text,
};
pub use grid::{
    GridDefinition, SystemView, SystemViewConfig, SystemViewDefaults, date_range_base,
    is_locked_filter,
};
pub use normalize::{
    create_default, extract_page_size, is_valid_filter, is_valid_sort, normalize, validate,
};
pub use ordered_map::OrderedMap;
pub use saved_view::{PreferenceTarget, SavedView, SavedViewDraft, SavedViewPatch};
pub use snapshot::{
    ActiveFilterValue, AvailableFilter, AvailableFilterKind, ColumnState, FilterGrouping,
    FilterState, SnapshotConfig, SortState, StateSnapshot, ViewId, ViewState, ViewSummary,
};
