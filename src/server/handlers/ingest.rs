//! Ingestion endpoint handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use super::super::error::ApiError;
use super::super::AppState;
use crate::models::JobType;

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub text: String,
}

fn parse_job_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::bad_request(format!("invalid job id {:?}", id)))
}

/// POST /recipes/ingest
///
/// Answers 202: with the queued strategy the job is still pending when the
/// response goes out, and even the sync path stages a candidate that needs a
/// confirm before anything is committed.
pub async fn ingest(
    State(state): State<AppState>,
    Json(req): Json<IngestRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let job = state.service.ingest(JobType::TextBlob, &req.text).await?;
    Ok((StatusCode::ACCEPTED, Json(job)))
}

/// GET /recipes/ingest/:job_id
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_job_id(&job_id)?;
    let job = state.service.get_job(id).await?;
    Ok(Json(job))
}

/// POST /recipes/ingest/:job_id/confirm
pub async fn confirm_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_job_id(&job_id)?;
    let detail = state.service.confirm(id).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}
