use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
};
use chrono::Utc;

use crate::dto::candidate_dto::ListCandidatesQuery;
use crate::error::Result;
use crate::services::export_service::ExportService;
use crate::AppState;

/// Download every matching candidate as a styled XLSX workbook. Accepts the
/// same filter/sort query string as the list endpoint; pagination is ignored
/// so the sheet is complete.
pub async fn export_candidates(
    State(state): State<AppState>,
    Query(query): Query<ListCandidatesQuery>,
) -> Result<impl IntoResponse> {
    let candidates = state.candidate_service.list_all(&query).await?;

    let buffer = ExportService::generate_candidates_xlsx(&candidates)?;
    let filename = format!("candidates-{}.xlsx", Utc::now().format("%Y%m%d-%H%M%S"));

    let headers = [
        (
            header::CONTENT_TYPE,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
        ),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        ),
    ];

    Ok((StatusCode::OK, headers, buffer))
}
