use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::matching::prompts::truncate_chars;
use crate::models::record::{MatchOrder, MatchRecord, MatchStats};
use crate::records::store::{delete_match, get_match, get_stats, list_matches};
use crate::state::AppState;

const DETAIL_PREVIEW_CHARS: usize = 500;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub order: MatchOrder,
}

fn default_limit() -> i64 {
    50
}

#[derive(Debug, Serialize)]
pub struct MatchSummary {
    pub id: i64,
    pub score: f64,
    pub explanation: String,
    pub timestamp: DateTime<Utc>,
    pub recommendations: Vec<String>,
}

impl From<MatchRecord> for MatchSummary {
    fn from(record: MatchRecord) -> Self {
        let recommendations = record.recommendation_list();
        Self {
            id: record.id,
            score: record.score,
            explanation: record.explanation,
            timestamp: record.created_at,
            recommendations,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MatchListResponse {
    pub stats: MatchStats,
    pub matches: Vec<MatchSummary>,
}

#[derive(Debug, Serialize)]
pub struct MatchDetailResponse {
    #[serde(flatten)]
    pub summary: MatchSummary,
    pub resume_preview: String,
    pub jd_preview: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

/// GET /api/matches?limit=50&order=score|recent
pub async fn handle_list_matches(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<MatchListResponse>, AppError> {
    let matches = list_matches(&state.db, query.limit, query.order).await?;
    let stats = get_stats(&state.db).await?;
    Ok(Json(MatchListResponse {
        stats,
        matches: matches.into_iter().map(MatchSummary::from).collect(),
    }))
}

/// GET /api/match/:id
pub async fn handle_get_match(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MatchDetailResponse>, AppError> {
    let record = get_match(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Match {id} not found")))?;

    let resume_preview = truncate_chars(&record.resume_text, DETAIL_PREVIEW_CHARS).to_string();
    let jd_preview = truncate_chars(&record.jd_text, DETAIL_PREVIEW_CHARS).to_string();

    Ok(Json(MatchDetailResponse {
        summary: record.into(),
        resume_preview,
        jd_preview,
    }))
}

/// DELETE /api/match/:id
pub async fn handle_delete_match(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>, AppError> {
    if !delete_match(&state.db, id).await? {
        return Err(AppError::NotFound(format!("Match {id} not found")));
    }
    Ok(Json(DeleteResponse { success: true }))
}
