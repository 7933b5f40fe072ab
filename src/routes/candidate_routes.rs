use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::path::Path as StdPath;
use tokio::fs;
use uuid::Uuid;

use crate::dto::candidate_dto::{
    CreateCandidatePayload, ImportCandidatesPayload, ListCandidatesQuery, StepActionPayload,
    UpdateProgressPayload, UpdateStatusPayload,
};
use crate::error::{Error, Result};
use crate::models::history::{CandidateHistoryRecord, InterviewStepHistoryRecord};
use crate::utils::validation::validate;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct CandidateHistoryResponse {
    pub candidate: Vec<CandidateHistoryRecord>,
    pub steps: Vec<InterviewStepHistoryRecord>,
}

pub async fn list_candidates(
    State(state): State<AppState>,
    Query(query): Query<ListCandidatesQuery>,
) -> Result<impl IntoResponse> {
    let page = state
        .candidate_service
        .list_candidates(&query, crate::config::get_config().default_page_size)
        .await?;
    Ok(Json(page))
}

pub async fn get_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let candidate = state
        .candidate_service
        .get_candidate(id)
        .await?
        .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))?;
    Ok(Json(candidate))
}

pub async fn create_candidate(
    State(state): State<AppState>,
    Json(payload): Json<CreateCandidatePayload>,
) -> Result<impl IntoResponse> {
    validate(&payload)?;
    let candidate = state.candidate_service.create_candidate(payload).await?;
    Ok((StatusCode::CREATED, Json(candidate)))
}

/// Bulk import of rows the client parsed out of a spreadsheet.
pub async fn import_candidates(
    State(state): State<AppState>,
    Json(payload): Json<ImportCandidatesPayload>,
) -> Result<impl IntoResponse> {
    if payload.candidates.is_empty() {
        return Err(Error::BadRequest("No candidates to import".to_string()));
    }
    for row in &payload.candidates {
        validate(row)?;
    }
    let created = state
        .candidate_service
        .import_candidates(payload.candidates)
        .await?;
    tracing::info!(count = created.len(), "candidates imported");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn delete_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let deleted = state.candidate_service.delete_candidate(id).await?;
    if !deleted {
        return Err(Error::NotFound("Candidate not found".to_string()));
    }
    Ok(Json(json!({ "deleted": true })))
}

pub async fn apply_step_action(
    State(state): State<AppState>,
    Path((id, step_index)): Path<(Uuid, usize)>,
    Json(payload): Json<StepActionPayload>,
) -> Result<impl IntoResponse> {
    let candidate = state
        .candidate_service
        .apply_step_action(id, step_index, payload.action, payload.feedback)
        .await?;
    Ok(Json(candidate))
}

pub async fn update_progress(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProgressPayload>,
) -> Result<impl IntoResponse> {
    let candidate = state
        .candidate_service
        .update_progress(id, payload.progress)
        .await?;
    Ok(Json(candidate))
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<impl IntoResponse> {
    let candidate = state
        .candidate_service
        .update_status(id, payload.status)
        .await?;
    Ok(Json(candidate))
}

pub async fn get_candidate_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    // 404 for unknown ids; an existing candidate always has at least its
    // creation snapshot.
    state
        .candidate_service
        .get_candidate(id)
        .await?
        .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))?;

    let candidate = state.history_service.candidate_history(id).await?;
    let steps = state.history_service.step_history(id).await?;
    Ok(Json(CandidateHistoryResponse { candidate, steps }))
}

pub async fn update_candidate_cv(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    // Reject unknown candidates before touching the disk.
    state
        .candidate_service
        .get_candidate(id)
        .await?
        .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))?;

    let uploads_dir = crate::config::get_config().uploads_dir.clone();
    let mut cv_url = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        if field_name == "file" || field_name == "cv" {
            let filename = field
                .file_name()
                .map(|f| f.to_string())
                .ok_or_else(|| Error::BadRequest("Missing file name".to_string()))?;
            let data = field.bytes().await?;
            if data.is_empty() {
                return Err(Error::BadRequest("Uploaded file is empty".to_string()));
            }
            cv_url = Some(save_cv_file(&uploads_dir, &filename, &data).await?);
        }
    }

    let cv_url =
        cv_url.ok_or_else(|| Error::BadRequest("No file field in upload".to_string()))?;
    let candidate = state.candidate_service.update_cv(id, cv_url).await?;
    Ok(Json(candidate))
}

pub(crate) async fn save_cv_file(
    uploads_dir: &str,
    filename: &str,
    data: &bytes::Bytes,
) -> Result<String> {
    let ext = StdPath::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_else(|| "bin".to_string());

    let allowed_exts = ["pdf", "doc", "docx", "txt", "rtf"];
    if !allowed_exts.contains(&ext.as_str()) {
        return Err(Error::BadRequest(format!(
            "File type .{} is not allowed",
            ext
        )));
    }

    if ext == "pdf" && !data.starts_with(b"%PDF") {
        return Err(Error::BadRequest("Invalid PDF file content".into()));
    }
    // docx is a zip container.
    if ext == "docx" && !data.starts_with(b"PK") {
        return Err(Error::BadRequest("Invalid DOCX file content".into()));
    }

    let cv_dir = format!("{}/cv", uploads_dir);
    fs::create_dir_all(&cv_dir)
        .await
        .map_err(|e| Error::Internal(e.to_string()))?;

    let file_id = Uuid::new_v4();
    let safe_filename = format!("{}.{}", file_id, ext);
    let file_path = format!("{}/{}", cv_dir, safe_filename);

    fs::write(&file_path, data).await.map_err(|e| {
        tracing::error!("Failed to write CV file: {}", e);
        Error::Internal(format!("Failed to save file: {}", e))
    })?;

    Ok(format!("/uploads/cv/{}", safe_filename))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_dir() -> String {
        std::env::temp_dir()
            .join("pipeline-backend-tests")
            .to_string_lossy()
            .to_string()
    }

    #[test]
    fn cv_upload_rejects_disallowed_extensions() {
        let data = bytes::Bytes::from_static(b"binary");
        let err = tokio_test::block_on(save_cv_file(&tmp_dir(), "malware.exe", &data)).unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[test]
    fn cv_upload_rejects_pdf_without_magic_bytes() {
        let data = bytes::Bytes::from_static(b"not a pdf");
        let err = tokio_test::block_on(save_cv_file(&tmp_dir(), "resume.pdf", &data)).unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[test]
    fn cv_upload_accepts_valid_pdf_and_returns_uploads_url() {
        let data = bytes::Bytes::from_static(b"%PDF-1.7 fake body");
        let url =
            tokio_test::block_on(save_cv_file(&tmp_dir(), "resume.pdf", &data)).expect("saved");
        assert!(url.starts_with("/uploads/cv/"));
        assert!(url.ends_with(".pdf"));
    }
}
