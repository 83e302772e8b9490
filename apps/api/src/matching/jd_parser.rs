//! JD Parser — validates a raw job description and pulls out the sections
//! worth showing next to a score.

use serde::{Deserialize, Serialize};

use crate::errors::MatchError;
use crate::matching::validation::{validate_jd, InputLimits};

/// Characters kept from the first keyword hit of each section.
const SECTION_WINDOW_CHARS: usize = 1000;

const ABOUT_KEYWORDS: &[&str] = &["responsibility", "about", "overview"];
const REQUIREMENT_KEYWORDS: &[&str] = &["requirement", "must have", "must-have"];
const NICE_TO_HAVE_KEYWORDS: &[&str] = &["nice to have", "preferred", "bonus", "desirable"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedJD {
    pub raw_text: String,
    /// Character count of the input before trimming.
    pub length: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JdSections {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about_role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nice_to_have: Option<String>,
}

impl JdSections {
    pub fn is_empty(&self) -> bool {
        self.about_role.is_none() && self.requirements.is_none() && self.nice_to_have.is_none()
    }
}

pub fn parse_jd(jd_text: &str, limits: &InputLimits) -> Result<ParsedJD, MatchError> {
    validate_jd(jd_text, limits)?;
    Ok(ParsedJD {
        raw_text: jd_text.trim().to_string(),
        length: jd_text.chars().count(),
    })
}

/// Finds the about/requirements/nice-to-have sections by keyword.
/// Keywords are tried in order; the first hit wins.
pub fn extract_key_sections(jd_text: &str) -> JdSections {
    JdSections {
        about_role: extract_section(jd_text, ABOUT_KEYWORDS),
        requirements: extract_section(jd_text, REQUIREMENT_KEYWORDS),
        nice_to_have: extract_section(jd_text, NICE_TO_HAVE_KEYWORDS),
    }
}

fn extract_section(text: &str, keywords: &[&str]) -> Option<String> {
    keywords
        .iter()
        .find_map(|kw| find_case_insensitive(text, kw))
        .map(|start| text[start..].chars().take(SECTION_WINDOW_CHARS).collect())
}

/// Byte offset of the first case-insensitive occurrence of an ASCII `needle`.
fn find_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let needle = needle.as_bytes();
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle))
        .filter(|&idx| haystack.is_char_boundary(idx))
}
