//! Response Extractor — turns free-form model text into typed match fields.
//!
//! Two tiers:
//! 1. strict: first flat `{...}` object in the text, decoded as JSON;
//! 2. fallback: when decoding fails, salvage what a regex can find and fill
//!    the rest with fixed defaults.
//!
//! Nothing here returns an error. Unusable output degrades to defaults.

use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

pub const DEFAULT_SCORE: f64 = 50.0;
pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;
pub const DEFAULT_EXPLANATION: &str = "Unable to generate explanation";
pub const FALLBACK_EXPLANATION: &str = "Analysis completed (parsing note: response format adjusted)";
pub const FALLBACK_RECOMMENDATION: &str =
    "Review job description carefully and highlight matching experiences";

lazy_static! {
    static ref FLAT_OBJECT: Regex = Regex::new(r"\{[^{}]*\}").expect("valid flat-object regex");
    static ref SCORE_TOKEN: Regex =
        Regex::new(r#"(?i)score["']?\s*:\s*(\d+)"#).expect("valid score regex");
}

/// Untrusted decoding of the scoring call. Every field may be missing.
#[derive(Debug, Default, Deserialize)]
pub struct ScoringPayload {
    #[serde(default)]
    pub score: Option<Value>,
    #[serde(default)]
    pub explanation: Option<Value>,
    // Requested from the model but not surfaced.
    #[allow(dead_code)]
    #[serde(default)]
    pub key_matches: Option<Value>,
    #[allow(dead_code)]
    #[serde(default)]
    pub key_gaps: Option<Value>,
}

/// Untrusted decoding of the recommendation call.
#[derive(Debug, Default, Deserialize)]
pub struct RecommendationPayload {
    #[serde(default)]
    pub recommendations: Option<Value>,
}

/// Score and explanation after defaults and clamping.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreExtraction {
    pub score: f64,
    pub explanation: String,
    /// True when the strict path failed and the regex fallback produced this.
    pub used_fallback: bool,
}

/// Locates the first brace-delimited object with no nested braces.
///
/// A heuristic, not a tokenizer; the prompts constrain the model to one flat object.
pub fn locate_flat_object(text: &str) -> Option<&str> {
    FLAT_OBJECT.find(text).map(|m| m.as_str())
}

/// Strict path: decode the located object (or the whole text when no braces
/// were found) into `T`. Only a JSON object qualifies; arrays and scalars are
/// rejected. `None` means the fallback tier must take over.
fn decode_strict<T: DeserializeOwned>(text: &str) -> Option<T> {
    let candidate = locate_flat_object(text).unwrap_or(text);
    let object = match serde_json::from_str::<Value>(candidate) {
        Ok(value @ Value::Object(_)) => value,
        Ok(other) => {
            debug!("Strict JSON decode rejected non-object value: {other}");
            return None;
        }
        Err(e) => {
            debug!("Strict JSON decode failed: {e}");
            return None;
        }
    };
    match serde_json::from_value::<T>(object) {
        Ok(payload) => Some(payload),
        Err(e) => {
            debug!("Strict JSON object did not fit payload: {e}");
            None
        }
    }
}

pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return DEFAULT_SCORE;
    }
    score.clamp(MIN_SCORE, MAX_SCORE)
}

/// Numbers pass through; numeric strings are parsed; anything else is the default.
fn coerce_score(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(DEFAULT_SCORE),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(DEFAULT_SCORE),
        _ => DEFAULT_SCORE,
    }
}

fn coerce_text(value: Option<&Value>, default: &str) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => default.to_string(),
        Some(other) => other.to_string(),
    }
}

pub fn extract_score(response: &str) -> ScoreExtraction {
    if let Some(payload) = decode_strict::<ScoringPayload>(response) {
        return ScoreExtraction {
            score: clamp_score(coerce_score(payload.score.as_ref())),
            explanation: coerce_text(payload.explanation.as_ref(), DEFAULT_EXPLANATION),
            used_fallback: false,
        };
    }

    let salvaged = SCORE_TOKEN
        .captures(response)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok());

    warn!(
        "Scoring response was not valid JSON; fallback score {}",
        salvaged.map_or_else(|| "not found".to_string(), |s| s.to_string())
    );

    ScoreExtraction {
        score: clamp_score(salvaged.unwrap_or(DEFAULT_SCORE)),
        explanation: FALLBACK_EXPLANATION.to_string(),
        used_fallback: true,
    }
}

pub fn extract_recommendations(response: &str) -> Vec<String> {
    match decode_strict::<RecommendationPayload>(response) {
        Some(payload) => match payload.recommendations {
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => s,
                    other => other.to_string(),
                })
                .collect(),
            _ => Vec::new(),
        },
        None => {
            warn!("Recommendation response was not valid JSON; using generic recommendation");
            fallback_recommendations()
        }
    }
}

pub fn fallback_recommendations() -> Vec<String> {
    vec![FALLBACK_RECOMMENDATION.to_string()]
}
