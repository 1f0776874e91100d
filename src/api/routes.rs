//! Route definitions.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers::*;

/// Build the API router with all endpoints.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check (high priority)
        .route("/health", get(health_handler))
        // Users and wallets
        .route("/api/users", post(register_user_handler))
        .route("/api/users/:user_id", get(user_data_handler))
        // Session lifecycle
        .route("/api/games", post(create_game_handler))
        .route("/api/games/:session_id/join", post(join_game_handler))
        .route("/api/games/:session_id/select", post(select_seed_handler))
        .route("/api/games/:session_id/status", get(game_status_handler))
        .route("/api/games/:session_id/leave", post(leave_game_handler))
        // Play
        .route("/api/games/:session_id/call", post(call_number_handler))
        .route("/api/games/:session_id/claim", post(claim_handler))
        // Operator controls (authorization enforced upstream)
        .route("/api/games/:session_id/start", post(admin_start_handler))
        .route("/api/games/:session_id/end", post(admin_end_handler))
        // Attach shared state
        .with_state(state)
}
