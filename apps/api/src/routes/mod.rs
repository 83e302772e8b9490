pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::matching::handlers as matching;
use crate::records::handlers as records;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Matching
        .route("/api/match", post(matching::handle_match))
        .route("/api/score", post(matching::handle_score))
        .route("/api/upload-resume", post(matching::handle_upload_resume))
        // Match history
        .route("/api/matches", get(records::handle_list_matches))
        .route(
            "/api/match/:id",
            get(records::handle_get_match).delete(records::handle_delete_match),
        )
        .with_state(state)
}
