use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info};

use crate::config::Config;
use crate::db::create_pool;
use crate::documents::{load_text, load_text_or_raw};
use crate::errors::MatchError;
use crate::llm_client::{GeminiClient, RetryingModel};
use crate::matching::engine::MatchEngine;
use crate::matching::jd_parser::{extract_key_sections, parse_jd, JdSections};
use crate::models::matching::{MatchRequest, MatchResult};
use crate::models::record::{MatchOrder, MatchRecord, MatchStats, NewMatch};
use crate::records::store::{get_match, get_stats, list_matches, save_match};
use crate::routes::build_router;
use crate::state::AppState;

const RULE: &str = "============================================================";

#[derive(Parser, Debug)]
#[command(
    name = "resume-matcher",
    version,
    about = "AI-Powered Resume & JD Matcher",
    after_help = "Examples:\n  resume-matcher match --resume resume.pdf --jd job_desc.txt --save\n  resume-matcher list-scores\n  resume-matcher recommend --score-id 1"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score a résumé against a job description
    Match {
        /// Path to résumé file (PDF/TXT/MD) or raw text
        #[arg(long)]
        resume: String,
        /// Path to job description file or raw text
        #[arg(long)]
        jd: String,
        /// Save match to database
        #[arg(long)]
        save: bool,
        /// Show previews and detected JD sections
        #[arg(long)]
        verbose: bool,
        /// Skip recommendations
        #[arg(long)]
        no_recommendations: bool,
    },
    /// List all stored matches
    ListScores {
        #[arg(long, default_value_t = 100)]
        limit: i64,
        #[arg(long, value_enum, default_value_t = MatchOrder::Score)]
        order: MatchOrder,
    },
    /// Show the stored recommendations for a match
    Recommend {
        #[arg(long)]
        score_id: i64,
        /// Regenerate recommendations from the stored texts and score
        #[arg(long)]
        refresh: bool,
    },
    /// Run the HTTP API
    Serve {
        /// Overrides PORT
        #[arg(long)]
        port: Option<u16>,
    },
}

pub async fn run(command: Commands, config: Config) -> Result<()> {
    match command {
        Commands::Match {
            resume,
            jd,
            save,
            verbose,
            no_recommendations,
        } => cmd_match(&config, &resume, &jd, save, verbose, !no_recommendations).await,
        Commands::ListScores { limit, order } => cmd_list_scores(&config, limit, order).await,
        Commands::Recommend { score_id, refresh } => {
            cmd_recommend(&config, score_id, refresh).await
        }
        Commands::Serve { port } => serve(&config, port.unwrap_or(config.port)).await,
    }
}

/// Builds the engine over Gemini with the configured retry budget.
pub fn build_engine(config: &Config) -> Result<MatchEngine> {
    let client = GeminiClient::new(
        config.require_api_key()?.to_string(),
        config.llm_model.clone(),
        config.gemini_endpoint.clone(),
    )?;
    info!("LLM client initialized (model: {})", client.model());
    let model = RetryingModel::new(client, config.max_retries);
    Ok(MatchEngine::new(Arc::new(model), config.limits))
}

async fn cmd_match(
    config: &Config,
    resume_input: &str,
    jd_input: &str,
    save: bool,
    verbose: bool,
    include_recommendations: bool,
) -> Result<()> {
    println!("Loading resume and job description...");
    let resume_text = load_text(resume_input)
        .await
        .map_err(MatchError::from)
        .context("Error parsing resume")?;
    let jd_text = load_text_or_raw(jd_input)
        .await
        .map_err(MatchError::from)
        .context("Error parsing job description")?;
    let jd = parse_jd(&jd_text, &config.limits).context("Error parsing job description")?;
    debug!("Job description: {} chars", jd.length);

    let engine = build_engine(config)?;

    println!("Analyzing with AI...");
    let mut request = MatchRequest::new(resume_text, jd.raw_text);
    if !include_recommendations {
        request = request.without_recommendations();
    }
    let result = engine.run(&request).await?;

    let sections = verbose.then(|| extract_key_sections(&request.jd_text));
    println!("{}", render_match_result(&result, verbose, sections.as_ref()));

    if save {
        let pool = create_pool(&config.database_url).await?;
        let record = save_match(
            &pool,
            NewMatch {
                resume_text: &request.resume_text,
                jd_text: &request.jd_text,
                score: result.score,
                explanation: &result.explanation,
                recommendations: result.recommendations.as_deref().unwrap_or_default(),
            },
        )
        .await?;
        println!("✓ Match saved with ID: {}", record.id);
    }

    Ok(())
}

async fn cmd_list_scores(config: &Config, limit: i64, order: MatchOrder) -> Result<()> {
    let pool = create_pool(&config.database_url).await?;
    let stats = get_stats(&pool).await?;
    let matches = list_matches(&pool, limit, order).await?;
    println!("{}", render_match_list(&stats, &matches, order));
    Ok(())
}

async fn cmd_recommend(config: &Config, score_id: i64, refresh: bool) -> Result<()> {
    let pool = create_pool(&config.database_url).await?;
    let mut record = get_match(&pool, score_id)
        .await?
        .with_context(|| format!("Match with ID {score_id} not found"))?;

    if refresh {
        let engine = build_engine(config)?;
        println!("Regenerating recommendations...");
        let recommendations = engine
            .recommend(&record.resume_text, &record.jd_text, record.score)
            .await?;
        record.recommendations = Some(serde_json::to_string(&recommendations)?);
    }

    println!("{}", render_stored_recommendations(&record));
    Ok(())
}

async fn serve(config: &Config, port: u16) -> Result<()> {
    let db = create_pool(&config.database_url).await?;
    let engine = build_engine(config)?;

    let app = build_router(AppState { db, engine })
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{port}").parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Rendering
// ────────────────────────────────────────────────────────────────────────────

fn numbered(items: &[String]) -> Vec<String> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {item}", i + 1))
        .collect()
}

fn first_chars(text: &str, n: usize) -> String {
    text.chars().take(n).collect()
}

pub fn render_match_result(
    result: &MatchResult,
    verbose: bool,
    sections: Option<&JdSections>,
) -> String {
    let mut lines = vec![
        String::new(),
        RULE.to_string(),
        format!("MATCH SCORE: {:.1}/100", result.score),
        RULE.to_string(),
        String::new(),
        "Explanation:".to_string(),
        result.explanation.clone(),
    ];

    if let Some(recs) = result.recommendations.as_deref().filter(|r| !r.is_empty()) {
        lines.push(String::new());
        lines.push("Recommendations to Improve Match:".to_string());
        lines.extend(numbered(recs));
    }

    if verbose {
        lines.push(String::new());
        lines.push(format!("Resume Preview: {}...", first_chars(&result.resume_preview, 100)));
        lines.push(format!("JD Preview: {}...", first_chars(&result.jd_preview, 100)));

        if let Some(sections) = sections.filter(|s| !s.is_empty()) {
            lines.push(String::new());
            lines.push("Detected JD Sections:".to_string());
            let named = [
                ("About the role", &sections.about_role),
                ("Requirements", &sections.requirements),
                ("Nice to have", &sections.nice_to_have),
            ];
            for (label, text) in named {
                if let Some(text) = text {
                    lines.push(format!("- {label}: {}...", first_chars(text, 80)));
                }
            }
        }
    }

    lines.push(String::new());
    lines.join("\n")
}

pub fn render_match_list(stats: &MatchStats, matches: &[MatchRecord], order: MatchOrder) -> String {
    let mut lines = vec![
        String::new(),
        RULE.to_string(),
        "STORED MATCHES".to_string(),
        RULE.to_string(),
    ];

    if stats.total == 0 {
        lines.push("No matches stored yet. Use --save to persist matches.".to_string());
        return lines.join("\n");
    }

    let order_label = match order {
        MatchOrder::Score => "score",
        MatchOrder::Recent => "most recent",
    };

    lines.push(format!("Total matches: {}", stats.total));
    lines.push(format!("Average score: {:.1}/100", stats.average_score));
    lines.push(String::new());
    lines.push(format!("Matches (ordered by {order_label}):"));
    lines.push("-".repeat(RULE.len()));

    for (i, m) in matches.iter().enumerate() {
        lines.push(format!(
            "{}. ID: {} | Score: {:.1} | {}",
            i + 1,
            m.id,
            m.score,
            m.created_at.format("%Y-%m-%d %H:%M")
        ));
        lines.push(format!("   {}...", first_chars(&m.explanation, 80)));
    }

    lines.push(String::new());
    lines.join("\n")
}

pub fn render_stored_recommendations(record: &MatchRecord) -> String {
    let mut lines = vec![
        String::new(),
        RULE.to_string(),
        format!("RECOMMENDATIONS FOR MATCH ID: {}", record.id),
        RULE.to_string(),
        format!("Current Score: {:.1}/100", record.score),
        String::new(),
        "Recommendations:".to_string(),
    ];

    let recs = record.recommendation_list();
    if recs.is_empty() {
        lines.push("No recommendations available for this match".to_string());
    } else {
        lines.extend(numbered(&recs));
    }

    lines.push(String::new());
    lines.join("\n")
}
