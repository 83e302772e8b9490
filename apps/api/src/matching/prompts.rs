// All LLM prompt templates for the matching pipeline.
// Both templates name the exact JSON fields the extractor reads back.

/// Inputs longer than this are cut before they go into the recommendation prompt.
pub const RECOMMENDATION_INPUT_CHARS: usize = 2000;

/// Scoring prompt. Replace: {resume_text}, {jd_text}
pub const SCORING_PROMPT_TEMPLATE: &str = r#"You are an expert recruiter and career advisor. Analyze the following resume against the job description and provide a match score and explanation.

RESUME:
{resume_text}

JOB DESCRIPTION:
{jd_text}

Provide your analysis in JSON format with exactly these fields:
- score: A number from 0 to 100 representing the match quality
- explanation: A 2-3 sentence explanation of the score
- key_matches: List of 2-3 key skills/experiences that match well
- key_gaps: List of 2-3 critical missing skills/experiences

Focus on:
1. Technical skills alignment
2. Experience level match
3. Domain expertise
4. Cultural/role fit indicators

Respond ONLY with valid JSON, no other text."#;

/// Recommendation prompt. Replace: {current_score}, {resume_text}, {jd_text}
pub const RECOMMENDATION_PROMPT_TEMPLATE: &str = r#"You are an expert career coach. Given the resume, job description, and current match score of {current_score}/100, provide 3-5 specific, actionable recommendations to improve the match.

RESUME:
{resume_text}

JOB DESCRIPTION:
{jd_text}

Provide recommendations as a JSON array of strings. Each recommendation should be:
- Specific and actionable
- Ranked by impact (highest impact first)
- Realistic to implement

Format: {"recommendations": ["rec1", "rec2", ...]}

Respond ONLY with valid JSON."#;

pub fn build_scoring_prompt(resume: &str, jd: &str) -> String {
    fill_template(
        SCORING_PROMPT_TEMPLATE,
        &[("resume_text", resume), ("jd_text", jd)],
    )
}

pub fn build_recommendation_prompt(resume: &str, jd: &str, current_score: f64) -> String {
    let score = format!("{current_score:.1}");
    fill_template(
        RECOMMENDATION_PROMPT_TEMPLATE,
        &[
            ("current_score", score.as_str()),
            ("resume_text", truncate_chars(resume, RECOMMENDATION_INPUT_CHARS)),
            ("jd_text", truncate_chars(jd, RECOMMENDATION_INPUT_CHARS)),
        ],
    )
}

/// Returns at most the first `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Single-pass `{name}` substitution, so placeholder-looking text inside the
/// substituted values is never expanded a second time.
fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + vars.iter().map(|(_, v)| v.len()).sum::<usize>());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let hit = vars.iter().find(|(name, _)| {
            tail.strip_prefix(name)
                .map(|after| after.starts_with('}'))
                .unwrap_or(false)
        });
        match hit {
            Some((name, value)) => {
                out.push_str(value);
                rest = &tail[name.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}
