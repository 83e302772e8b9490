use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A persisted match. `recommendations` is stored as a JSON array in a TEXT column.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MatchRecord {
    pub id: i64,
    pub resume_text: String,
    pub jd_text: String,
    pub score: f64,
    pub explanation: String,
    pub recommendations: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl MatchRecord {
    /// Decoded recommendation list; unreadable or missing JSON yields an empty list.
    pub fn recommendation_list(&self) -> Vec<String> {
        self.recommendations
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default()
    }
}

/// Fields the caller supplies when saving a match.
#[derive(Debug, Clone)]
pub struct NewMatch<'a> {
    pub resume_text: &'a str,
    pub jd_text: &'a str,
    pub score: f64,
    pub explanation: &'a str,
    pub recommendations: &'a [String],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MatchOrder {
    #[default]
    Score,
    Recent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchStats {
    pub total: i64,
    pub average_score: f64,
}
