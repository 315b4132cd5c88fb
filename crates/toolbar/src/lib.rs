//! Client side of the grid toolbar.
//!
//! Every data frame carries a server snapshot; the toolbar is rebuilt from it
//! on each load and user actions become URL navigations against the frame.

#![forbid(unsafe_code)]

mod controller;
mod frame;
mod model;
mod navigator;
mod reconciler;
mod registry;
mod saved_views;

pub use controller::GridViewController;
pub use frame::{FrameLoadEvent, embed_snapshot, find_state_script, parse_snapshot, table_frame_id};
pub use model::{
    ColumnPickerItem, DateInput, FilterCheckbox, FilterNavItem, FilterNavKind, FilterPanel,
    FilterPanelBody, FilterPill, PillEntry, PillGroup, TabAction, TabMenuItem, ToolbarModel,
    ViewTab,
};
pub use navigator::{CONTEXT_PARAMS, GridNavigator, Navigation};
pub use reconciler::{current_view, filter_count, render_from_snapshot};
pub use registry::{ComponentRegistry, ToolbarComponent};
pub use saved_views::{
    Confirm, HttpSavedViewApi, Notifier, SavedViewActions, SavedViewApi, SavedViewOutcome,
};
