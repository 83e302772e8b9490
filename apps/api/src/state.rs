use sqlx::SqlitePool;

use crate::matching::engine::MatchEngine;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    /// Cheap to clone; the model client inside is shared.
    pub engine: MatchEngine,
}
