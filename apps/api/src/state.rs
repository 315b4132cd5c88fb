use gridview_application::{GridDataService, GridViewService};

/// Shared services handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub grid_view_service: GridViewService,
    pub grid_data_service: GridDataService,
}
