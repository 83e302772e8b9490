//! Axum route handlers for the Matching API.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::documents::{extract_upload, sanitize_filename};
use crate::errors::AppError;
use crate::models::matching::{MatchRequest, MatchResult};
use crate::models::record::NewMatch;
use crate::records::store::save_match;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MatchApiRequest {
    #[serde(default)]
    pub resume: String,
    #[serde(default)]
    pub jd: String,
    #[serde(default)]
    pub save: bool,
}

#[derive(Debug, Serialize)]
pub struct MatchApiResponse {
    #[serde(flatten)]
    pub result: MatchResult,
    /// Present only when the match was saved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ScoreApiRequest {
    #[serde(default)]
    pub resume: String,
    #[serde(default)]
    pub jd: String,
}

#[derive(Debug, Serialize)]
pub struct ScoreApiResponse {
    pub score: f64,
    pub explanation: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub text: String,
    pub filename: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

fn required_texts<'a>(resume: &'a str, jd: &'a str) -> Result<(&'a str, &'a str), AppError> {
    let (resume, jd) = (resume.trim(), jd.trim());
    if resume.is_empty() || jd.is_empty() {
        return Err(AppError::Validation(
            "Both resume and JD are required".to_string(),
        ));
    }
    Ok((resume, jd))
}

/// POST /api/match
///
/// Scores a résumé against a JD (recommendations always included) and
/// optionally persists the result.
pub async fn handle_match(
    State(state): State<AppState>,
    Json(request): Json<MatchApiRequest>,
) -> Result<Json<MatchApiResponse>, AppError> {
    let (resume, jd) = required_texts(&request.resume, &request.jd)?;

    let result = state.engine.run(&MatchRequest::new(resume, jd)).await?;

    let id = if request.save {
        let record = save_match(
            &state.db,
            NewMatch {
                resume_text: resume,
                jd_text: jd,
                score: result.score,
                explanation: &result.explanation,
                recommendations: result.recommendations.as_deref().unwrap_or_default(),
            },
        )
        .await?;
        Some(record.id)
    } else {
        None
    };

    Ok(Json(MatchApiResponse { result, id }))
}

/// POST /api/score
///
/// Score and explanation only; no recommendation call, nothing persisted.
pub async fn handle_score(
    State(state): State<AppState>,
    Json(request): Json<ScoreApiRequest>,
) -> Result<Json<ScoreApiResponse>, AppError> {
    let (resume, jd) = required_texts(&request.resume, &request.jd)?;
    let extraction = state.engine.score(resume, jd).await?;
    Ok(Json(ScoreApiResponse {
        score: extraction.score,
        explanation: extraction.explanation,
    }))
}

/// POST /api/upload-resume
///
/// Accepts a multipart `file` field (.pdf, .txt, .md) and returns its text.
/// Nothing is written to disk.
pub async fn handle_upload_resume(
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .and_then(sanitize_filename)
            .ok_or_else(|| AppError::Validation("No file selected".to_string()))?;

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;

        let text = extract_upload(&filename, bytes.to_vec())?;
        info!("Extracted {} chars from upload {filename}", text.chars().count());

        return Ok(Json(UploadResponse { text, filename }));
    }

    Err(AppError::Validation("No file provided".to_string()))
}
