mod common;
mod grid_views;
mod grids;

pub use common::HealthResponse;
pub use grid_views::{
    CreateGridViewRequest, DefaultGridViewResponse, GridKeyQuery, GridViewResponse,
    SetDefaultGridViewRequest, UpdateGridViewRequest, ValidateGridViewRequest,
    ValidateGridViewResponse,
};
pub use grids::{GridPageResponse, GridPaginationResponse, GridRecordResponse};

#[cfg(test)]
mod tests {
    use gridview_domain::ViewId;
    use ts_rs::Config;
    use ts_rs::TS;

    use super::{
        CreateGridViewRequest, DefaultGridViewResponse, GridPageResponse, GridPaginationResponse,
        GridRecordResponse, GridViewResponse, HealthResponse, SetDefaultGridViewRequest,
        UpdateGridViewRequest, ValidateGridViewRequest, ValidateGridViewResponse,
    };
    use crate::error::ErrorResponse;

    #[test]
    fn export_ts_bindings() -> Result<(), ts_rs::ExportError> {
        let config = Config::default();

        ErrorResponse::export(&config)?;
        HealthResponse::export(&config)?;
        GridRecordResponse::export(&config)?;
        GridPaginationResponse::export(&config)?;
        GridPageResponse::export(&config)?;
        GridViewResponse::export(&config)?;
        CreateGridViewRequest::export(&config)?;
        UpdateGridViewRequest::export(&config)?;
        SetDefaultGridViewRequest::export(&config)?;
        DefaultGridViewResponse::export(&config)?;
        ValidateGridViewRequest::export(&config)?;
        ValidateGridViewResponse::export(&config)?;

        Ok(())
    }

    #[test]
    fn default_target_reads_numbers_and_keys() {
        let parse = |json: &str| {
            serde_json::from_str::<SetDefaultGridViewRequest>(json)
                .map(|request| request.target())
                .ok()
        };

        assert_eq!(
            parse(r#"{"gridKey": "members", "viewIdOrKey": 7}"#),
            Some(ViewId::Saved(7))
        );
        assert_eq!(
            parse(r#"{"gridKey": "members", "viewIdOrKey": "7"}"#),
            Some(ViewId::Saved(7))
        );
        assert_eq!(
            parse(r#"{"gridKey": "members", "viewIdOrKey": "active"}"#),
            Some(ViewId::System("active".to_owned()))
        );
    }
}
