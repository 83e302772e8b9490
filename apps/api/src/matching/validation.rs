use serde::{Deserialize, Serialize};

use crate::errors::MatchError;

pub const RESUME_FIELD: &str = "Resume";
pub const JD_FIELD: &str = "Job description";

/// Maximum accepted input sizes, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputLimits {
    pub max_resume_chars: usize,
    pub max_jd_chars: usize,
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            max_resume_chars: 10_000,
            max_jd_chars: 5_000,
        }
    }
}

/// Rejects blank text and text longer than `max_length` characters.
///
/// Length counts `char`s, not bytes. Over-long input is an error, never truncated.
pub fn validate(text: &str, max_length: usize, field: &'static str) -> Result<(), MatchError> {
    if text.trim().is_empty() {
        return Err(MatchError::EmptyInput { field });
    }

    let actual = text.chars().count();
    if actual > max_length {
        return Err(MatchError::LengthExceeded {
            field,
            max: max_length,
            actual,
        });
    }

    Ok(())
}

pub fn validate_resume(text: &str, limits: &InputLimits) -> Result<(), MatchError> {
    validate(text, limits.max_resume_chars, RESUME_FIELD)
}

pub fn validate_jd(text: &str, limits: &InputLimits) -> Result<(), MatchError> {
    validate(text, limits.max_jd_chars, JD_FIELD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_text_within_bounds() {
        assert!(validate("Senior Rust engineer", 100, RESUME_FIELD).is_ok());
    }

    #[test]
    fn test_empty_text_is_rejected() {
        let err = validate("", 100, RESUME_FIELD).unwrap_err();
        assert!(matches!(err, MatchError::EmptyInput { field: "Resume" }));
    }

    #[test]
    fn test_whitespace_only_text_is_rejected() {
        let err = validate(" \n\t  ", 100, JD_FIELD).unwrap_err();
        assert!(matches!(err, MatchError::EmptyInput { .. }));
    }

    #[test]
    fn test_exact_bound_is_accepted() {
        let text = "x".repeat(5_000);
        assert!(validate_jd(&text, &InputLimits::default()).is_ok());
    }

    #[test]
    fn test_one_over_bound_is_rejected() {
        let text = "x".repeat(5_001);
        let err = validate_jd(&text, &InputLimits::default()).unwrap_err();
        match err {
            MatchError::LengthExceeded { field, max, actual } => {
                assert_eq!(field, JD_FIELD);
                assert_eq!(max, 5_000);
                assert_eq!(actual, 5_001);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_oversized_resume_is_rejected() {
        let text = "x".repeat(20_000);
        assert!(matches!(
            validate_resume(&text, &InputLimits::default()),
            Err(MatchError::LengthExceeded { .. })
        ));
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // 4 chars, 8 bytes
        let text = "éééé";
        assert!(validate(text, 4, RESUME_FIELD).is_ok());
        assert!(validate(text, 3, RESUME_FIELD).is_err());
    }

    #[test]
    fn test_custom_limits_override_defaults() {
        let limits = InputLimits {
            max_resume_chars: 10,
            max_jd_chars: 10,
        };
        assert!(validate_resume("short", &limits).is_ok());
        assert!(validate_resume("much longer than ten", &limits).is_err());
    }

    #[test]
    fn test_validation_is_idempotent() {
        let limits = InputLimits::default();
        for _ in 0..3 {
            assert!(validate_resume("5 years Python", &limits).is_ok());
        }
    }
}
