//! Match Orchestrator — composes validation, prompting, the model call and
//! extraction into one match.
//!
//! Flow: validate résumé → validate JD → scoring prompt → model → extract_score →
//!       previews → (optional) recommendation prompt → model → extract_recommendations.
//!
//! The recommendation prompt embeds the score from the first call, so the two
//! model calls run sequentially.

use std::sync::Arc;

use tracing::{info, warn};

use crate::errors::MatchError;
use crate::llm_client::{ModelClient, SamplingConfig};
use crate::matching::extractor::{
    extract_recommendations, extract_score, fallback_recommendations, ScoreExtraction,
};
use crate::matching::prompts::{build_recommendation_prompt, build_scoring_prompt};
use crate::matching::validation::{validate_jd, validate_resume, InputLimits};
use crate::models::matching::{preview, MatchRequest, MatchResult};

/// Stateless apart from its configuration; share it behind an `Arc`.
#[derive(Clone)]
pub struct MatchEngine {
    model: Arc<dyn ModelClient>,
    limits: InputLimits,
    sampling: SamplingConfig,
}

impl MatchEngine {
    pub fn new(model: Arc<dyn ModelClient>, limits: InputLimits) -> Self {
        Self {
            model,
            limits,
            sampling: SamplingConfig::default(),
        }
    }

    /// Runs one full match.
    ///
    /// Validation and scoring-call failures abort the match. A failed
    /// recommendation call does not; the result
    /// carries the generic fallback recommendation instead.
    pub async fn run(&self, request: &MatchRequest) -> Result<MatchResult, MatchError> {
        let resume = request.resume_text.as_str();
        let jd = request.jd_text.as_str();

        validate_resume(resume, &self.limits)?;
        validate_jd(jd, &self.limits)?;

        let ScoreExtraction {
            score, explanation, ..
        } = self.score_validated(resume, jd).await?;

        let recommendations = if request.include_recommendations {
            match self.recommend_validated(resume, jd, score).await {
                Ok(recs) => Some(recs),
                Err(e) => {
                    warn!("Recommendation call failed, returning generic advice: {e}");
                    Some(fallback_recommendations())
                }
            }
        } else {
            None
        };

        Ok(MatchResult {
            score,
            explanation,
            resume_preview: preview(resume),
            jd_preview: preview(jd),
            recommendations,
        })
    }

    /// Score-and-explain on its own.
    pub async fn score(&self, resume: &str, jd: &str) -> Result<ScoreExtraction, MatchError> {
        validate_resume(resume, &self.limits)?;
        validate_jd(jd, &self.limits)?;
        self.score_validated(resume, jd).await
    }

    /// Recommendations for an already-known score.
    pub async fn recommend(
        &self,
        resume: &str,
        jd: &str,
        current_score: f64,
    ) -> Result<Vec<String>, MatchError> {
        validate_resume(resume, &self.limits)?;
        validate_jd(jd, &self.limits)?;
        self.recommend_validated(resume, jd, current_score).await
    }

    async fn score_validated(&self, resume: &str, jd: &str) -> Result<ScoreExtraction, MatchError> {
        let prompt = build_scoring_prompt(resume, jd);
        let response = self.call_model(&prompt).await?;
        let extraction = extract_score(&response);
        info!(
            "Match scored {:.1}/100{}",
            extraction.score,
            if extraction.used_fallback { " (fallback parse)" } else { "" }
        );
        Ok(extraction)
    }

    async fn recommend_validated(
        &self,
        resume: &str,
        jd: &str,
        current_score: f64,
    ) -> Result<Vec<String>, MatchError> {
        let prompt = build_recommendation_prompt(resume, jd, current_score);
        let response = self.call_model(&prompt).await?;
        let recommendations = extract_recommendations(&response);
        info!("Generated {} recommendations", recommendations.len());
        Ok(recommendations)
    }

    async fn call_model(&self, prompt: &str) -> Result<String, MatchError> {
        self.model
            .generate(prompt, &self.sampling)
            .await
            .map_err(|e| MatchError::ModelUnavailable(e.to_string()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::llm_client::LlmError;
    use crate::matching::extractor::{FALLBACK_EXPLANATION, FALLBACK_RECOMMENDATION};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned responses in order and records every prompt it receives.
    pub(crate) struct ScriptedModel {
        responses: Mutex<VecDeque<Result<String, LlmError>>>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        pub(crate) fn new(responses: Vec<Result<String, LlmError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn replying(texts: &[&str]) -> Arc<Self> {
            Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
        }

        pub(crate) fn prompt_count(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ModelClient for ScriptedModel {
        async fn generate(&self, prompt: &str, _sampling: &SamplingConfig) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(LlmError::EmptyContent))
        }
    }

    fn engine(model: Arc<ScriptedModel>) -> MatchEngine {
        MatchEngine::new(model, InputLimits::default())
    }

    const RESUME: &str = "5 years Python, AWS, led a team of 4";
    const JD: &str = "Senior backend engineer, Python, AWS required";

    #[tokio::test]
    async fn test_end_to_end_score_and_explanation() {
        let model = ScriptedModel::replying(&[
            r#"{"score": 88, "explanation": "Strong technical and experience match."}"#,
            r#"{"recommendations": ["Mention AWS certifications"]}"#,
        ]);
        let result = engine(model.clone())
            .run(&MatchRequest::new(RESUME, JD))
            .await
            .unwrap();

        assert_eq!(result.score, 88.0);
        assert_eq!(result.explanation, "Strong technical and experience match.");
        assert_eq!(result.resume_preview, RESUME);
        assert_eq!(result.jd_preview, JD);
        assert_eq!(
            result.recommendations,
            Some(vec!["Mention AWS certifications".to_string()])
        );
        assert_eq!(model.prompt_count(), 2);
    }

    #[tokio::test]
    async fn test_recommendation_prompt_carries_score() {
        let model = ScriptedModel::replying(&[
            r#"{"score": 61, "explanation": "Partial"}"#,
            r#"{"recommendations": []}"#,
        ]);
        engine(model.clone())
            .run(&MatchRequest::new(RESUME, JD))
            .await
            .unwrap();

        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[0].contains("match score and explanation"));
        assert!(prompts[1].contains("current match score of 61.0/100"));
    }

    #[tokio::test]
    async fn test_without_recommendations_makes_one_call() {
        let model = ScriptedModel::replying(&[r#"{"score": 70, "explanation": "Fine"}"#]);
        let result = engine(model.clone())
            .run(&MatchRequest::new(RESUME, JD).without_recommendations())
            .await
            .unwrap();

        assert!(result.recommendations.is_none());
        assert_eq!(model.prompt_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_resume_fails_before_model_call() {
        let model = ScriptedModel::replying(&[]);
        let err = engine(model.clone())
            .run(&MatchRequest::new("   ", JD))
            .await
            .unwrap_err();

        assert!(matches!(err, MatchError::EmptyInput { field: "Resume" }));
        assert_eq!(model.prompt_count(), 0);
    }

    #[tokio::test]
    async fn test_oversized_jd_is_rejected() {
        let model = ScriptedModel::replying(&[]);
        let jd = "j".repeat(5_001);
        let err = engine(model).run(&MatchRequest::new(RESUME, jd)).await.unwrap_err();
        assert!(matches!(err, MatchError::LengthExceeded { max: 5_000, .. }));
    }

    #[tokio::test]
    async fn test_scoring_transport_failure_is_model_unavailable() {
        let model = ScriptedModel::new(vec![Err(LlmError::Api {
            status: 403,
            message: "API key not valid".to_string(),
        })]);
        let err = engine(model).run(&MatchRequest::new(RESUME, JD)).await.unwrap_err();
        match err {
            MatchError::ModelUnavailable(msg) => assert!(msg.contains("API key not valid")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_recommendation_failure_degrades_to_generic_advice() {
        let model = ScriptedModel::new(vec![
            Ok(r#"{"score": 75, "explanation": "Good"}"#.to_string()),
            Err(LlmError::Api {
                status: 503,
                message: "overloaded".to_string(),
            }),
        ]);
        let result = engine(model).run(&MatchRequest::new(RESUME, JD)).await.unwrap();
        assert_eq!(result.score, 75.0);
        assert_eq!(
            result.recommendations,
            Some(vec![FALLBACK_RECOMMENDATION.to_string()])
        );
    }

    #[tokio::test]
    async fn test_malformed_output_still_produces_result() {
        let model = ScriptedModel::replying(&[
            "Overall I'd say score: 67 for this one.",
            "Add more metrics.",
        ]);
        let result = engine(model).run(&MatchRequest::new(RESUME, JD)).await.unwrap();
        assert_eq!(result.score, 67.0);
        assert_eq!(result.explanation, FALLBACK_EXPLANATION);
        assert_eq!(result.recommendations.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_out_of_range_score_is_clamped() {
        let model = ScriptedModel::replying(&[r#"{"score": 150, "explanation": "Wow"}"#]);
        let result = engine(model)
            .run(&MatchRequest::new(RESUME, JD).without_recommendations())
            .await
            .unwrap();
        assert_eq!(result.score, 100.0);
    }

    #[tokio::test]
    async fn test_long_resume_preview_is_truncated() {
        let resume = "r".repeat(250);
        let model = ScriptedModel::replying(&[r#"{"score": 10, "explanation": "Weak"}"#]);
        let result = engine(model)
            .run(&MatchRequest::new(resume, JD).without_recommendations())
            .await
            .unwrap();
        assert_eq!(result.resume_preview, format!("{}...", "r".repeat(200)));
    }

    #[tokio::test]
    async fn test_recommend_alone_uses_given_score() {
        let model = ScriptedModel::replying(&[r#"{"recommendations": ["A", "B", "C"]}"#]);
        let recs = engine(model.clone()).recommend(RESUME, JD, 42.0).await.unwrap();
        assert_eq!(recs, vec!["A", "B", "C"]);
        assert!(model.prompts.lock().unwrap()[0].contains("42.0/100"));
    }

    #[tokio::test]
    async fn test_score_alone_validates_inputs() {
        let model = ScriptedModel::replying(&[]);
        assert!(engine(model).score(RESUME, "").await.is_err());
    }
}
