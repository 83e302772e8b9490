use serde::{Deserialize, Serialize};

/// Number of characters kept in a preview before the ellipsis marker.
pub const PREVIEW_CHARS: usize = 200;
pub const ELLIPSIS: &str = "...";

/// One match invocation's inputs. Built per call, never reused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRequest {
    pub resume_text: String,
    pub jd_text: String,
    #[serde(default = "default_include_recommendations")]
    pub include_recommendations: bool,
}

fn default_include_recommendations() -> bool {
    true
}

impl MatchRequest {
    pub fn new(resume_text: impl Into<String>, jd_text: impl Into<String>) -> Self {
        Self {
            resume_text: resume_text.into(),
            jd_text: jd_text.into(),
            include_recommendations: true,
        }
    }

    pub fn without_recommendations(mut self) -> Self {
        self.include_recommendations = false;
        self
    }
}

/// Terminal artifact of one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Always within 0.0 – 100.0.
    pub score: f64,
    pub explanation: String,
    pub resume_preview: String,
    pub jd_preview: String,
    /// `None` unless recommendations were requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<String>>,
}

/// First `PREVIEW_CHARS` characters plus `...`, or the full text when it fits.
pub fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}{ELLIPSIS}", &text[..idx]),
        None => text.to_string(),
    }
}
