use gridview_application::{GridPage, GridPagination, GridRecord};
use gridview_domain::StateSnapshot;
use serde::Serialize;
use serde_json::Value;
use ts_rs::TS;

/// API representation of one grid row.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/grid-record-response.ts"
)]
pub struct GridRecordResponse {
    pub id: String,
    #[ts(type = "Record<string, unknown>")]
    pub data: Value,
}

impl From<GridRecord> for GridRecordResponse {
    fn from(value: GridRecord) -> Self {
        Self {
            id: value.id,
            data: value.data,
        }
    }
}

/// Paging numbers of a grid page.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/grid-pagination-response.ts"
)]
pub struct GridPaginationResponse {
    pub page: u32,
    pub page_size: u32,
    pub total: usize,
    pub page_count: usize,
}

impl From<GridPagination> for GridPaginationResponse {
    fn from(value: GridPagination) -> Self {
        Self {
            page: value.page,
            page_size: value.page_size,
            total: value.total,
            page_count: value.page_count,
        }
    }
}

/// One loaded grid page with the state the toolbar renders from.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/grid-page-response.ts"
)]
pub struct GridPageResponse {
    pub records: Vec<GridRecordResponse>,
    pub pagination: GridPaginationResponse,
    pub visible_columns: Vec<String>,
    #[ts(type = "Record<string, unknown>")]
    pub snapshot: StateSnapshot,
}

impl From<GridPage> for GridPageResponse {
    fn from(value: GridPage) -> Self {
        Self {
            records: value
                .records
                .into_iter()
                .map(GridRecordResponse::from)
                .collect(),
            pagination: GridPaginationResponse::from(value.pagination),
            visible_columns: value.visible_columns,
            snapshot: value.snapshot,
        }
    }
}
