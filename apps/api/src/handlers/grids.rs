use std::fmt::Write as _;

use axum::Json;
use axum::extract::{Extension, Path, RawQuery, State};
use axum::response::Html;
use gridview_application::{GridPage, GridRequest};
use gridview_core::{AppError, AppResult, UserIdentity};
use gridview_domain::{ColumnMetadata, ColumnType, GridDefinition, scalar_text};
use gridview_toolbar::{embed_snapshot, table_frame_id};
use serde_json::Value;

use crate::dto::GridPageResponse;
use crate::error::ApiResult;
use crate::state::AppState;

async fn load_page(
    state: &AppState,
    user: &UserIdentity,
    grid_key: &str,
    query: Option<&str>,
) -> AppResult<GridPage> {
    let request = GridRequest::from_query(query.unwrap_or_default());
    state
        .grid_data_service
        .load_grid(user, grid_key, &request)
        .await
}

pub async fn grid_records_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(grid_key): Path<String>,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<GridPageResponse>> {
    let page = load_page(&state, &user, grid_key.as_str(), query.as_deref()).await?;

    Ok(Json(GridPageResponse::from(page)))
}

pub async fn grid_frame_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(grid_key): Path<String>,
    RawQuery(query): RawQuery,
) -> ApiResult<Html<String>> {
    let page = load_page(&state, &user, grid_key.as_str(), query.as_deref()).await?;
    let grid = state.grid_view_service.registry().grid(grid_key.as_str())?;

    Ok(Html(render_table_frame(grid, &page)?))
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn cell_text(column: Option<&ColumnMetadata>, key: &str, data: &Value) -> String {
    let field = column
        .and_then(|column| column.render_field.as_deref())
        .unwrap_or(key);
    let value = data
        .get(field)
        .or_else(|| data.pointer(&format!("/{}", field.replace('.', "/"))))
        .unwrap_or(&Value::Null);

    match (column, value) {
        (Some(column), Value::Bool(flag)) if column.column_type == ColumnType::Boolean => {
            String::from(if *flag { "Yes" } else { "No" })
        }
        (Some(column), value) if column.has_dropdown_filter() => {
            let raw = scalar_text(value);
            column
                .option_label(&raw)
                .map_or_else(|| raw.clone(), ToOwned::to_owned)
        }
        (_, value) => scalar_text(value),
    }
}

/// Renders the data frame a toolbar reloads: rows, paging and the state script.
fn render_table_frame(grid: &GridDefinition, page: &GridPage) -> AppResult<String> {
    let mut html = String::new();
    let sort = page.snapshot.sort.as_ref();
    let write_error =
        |error: std::fmt::Error| AppError::Internal(format!("failed to render grid frame: {error}"));

    writeln!(
        html,
        r#"<turbo-frame id="{}">"#,
        escape_html(&table_frame_id(&grid.grid_key))
    )
    .map_err(write_error)?;
    html.push_str("<table class=\"grid-table\">\n<thead><tr>");
    for key in &page.visible_columns {
        let column = grid.columns.get(key);
        let label = column.map_or(key.as_str(), |column| column.label.as_str());
        let sortable = column.is_none_or(|column| column.sortable);
        let direction = sort
            .filter(|sort| &sort.field == key)
            .map_or("none", |sort| sort.direction.as_str());
        write!(
            html,
            r#"<th data-column="{}" data-sortable="{sortable}" data-sort="{}">{}</th>"#,
            escape_html(key),
            escape_html(direction),
            escape_html(label)
        )
        .map_err(write_error)?;
    }
    html.push_str("</tr></thead>\n<tbody>\n");

    if page.records.is_empty() {
        write!(
            html,
            r#"<tr class="grid-empty"><td colspan="{}">No records found</td></tr>"#,
            page.visible_columns.len().max(1)
        )
        .map_err(write_error)?;
        html.push('\n');
    }
    for record in &page.records {
        write!(html, r#"<tr data-id="{}">"#, escape_html(&record.id)).map_err(write_error)?;
        for key in &page.visible_columns {
            let text = cell_text(grid.columns.get(key), key, &record.data);
            write!(html, "<td>{}</td>", escape_html(&text)).map_err(write_error)?;
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n");

    let pagination = page.pagination;
    writeln!(
        html,
        r#"<nav class="grid-pagination" data-page="{}" data-page-size="{}" data-page-count="{}" data-total="{}"></nav>"#,
        pagination.page, pagination.page_size, pagination.page_count, pagination.total
    )
    .map_err(write_error)?;

    html.push_str(&embed_snapshot(&page.snapshot)?);
    html.push_str("\n</turbo-frame>\n");
    Ok(html)
}
