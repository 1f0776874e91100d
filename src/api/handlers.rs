//! Request handlers.
//!
//! Thin adapters from HTTP to the engine: extract, delegate, translate the
//! typed result. All game rules live in the engine.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::{errors::ApiError, middleware::RequestId, models::*};
use crate::engine::{ClaimOutcome, GameEngine};
use crate::errors::GameError;

/// Shared application state.
pub struct AppState {
    pub engine: Arc<GameEngine>,
    pub version: String,
}

/// GET /health
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Running".to_string(),
        version: state.version.clone(),
    })
}

/// POST /api/users
pub async fn register_user_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterUserRequest>,
) -> Result<Json<RegisterUserResponse>, ApiError> {
    let balance = state
        .engine
        .register_user(request.user_id, &request.username)
        .await
        .map_err(|e| ApiError::new(request_id.0.clone(), e))?;

    Ok(Json(RegisterUserResponse {
        user_id: request.user_id,
        username: request.username,
        balance,
    }))
}

/// GET /api/users/:user_id
pub async fn user_data_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<u64>,
) -> Result<Json<UserDataResponse>, ApiError> {
    let profile = state
        .engine
        .users()
        .profile(user_id)
        .await
        .ok_or_else(|| ApiError::new(request_id.0.clone(), GameError::UserNotFound(user_id)))?;
    let balance = state
        .engine
        .ledger()
        .balance(user_id)
        .map_err(|e| ApiError::new(request_id.0.clone(), e))?;

    Ok(Json(UserDataResponse {
        user_id,
        username: profile.username,
        balance,
        invalid_claims: profile.invalid_claims,
    }))
}

/// POST /api/games
pub async fn create_game_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateGameRequest>,
) -> Result<Json<CreateGameResponse>, ApiError> {
    let session_id = state
        .engine
        .create_session(request.user_id, request.bet_amount)
        .await
        .map_err(|e| ApiError::new(request_id.0.clone(), e))?;

    Ok(Json(CreateGameResponse {
        session_id,
        status: crate::session::SessionStatus::Waiting,
        bet_amount: request.bet_amount,
    }))
}

/// POST /api/games/:session_id/join
pub async fn join_game_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<JoinGameRequest>,
) -> Result<Json<JoinGameResponse>, ApiError> {
    let players = state
        .engine
        .join_session(session_id, request.user_id, request.bet_amount)
        .await
        .map_err(|e| ApiError::new(request_id.0.clone(), e))?;

    Ok(Json(JoinGameResponse {
        players,
        bet_amount: request.bet_amount,
    }))
}

/// POST /api/games/:session_id/select
pub async fn select_seed_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SelectSeedRequest>,
) -> Result<Json<SelectSeedResponse>, ApiError> {
    let card = state
        .engine
        .select_seed(session_id, request.user_id, request.seed)
        .await
        .map_err(|e| ApiError::new(request_id.0.clone(), e))?;

    Ok(Json(SelectSeedResponse {
        seed: request.seed,
        card,
    }))
}

/// GET /api/games/:session_id/status?user_id={id}
///
/// Reads drive the countdown check, so polling clients collectively
/// auto-start overdue sessions.
pub async fn game_status_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<GameStatusResponse>, ApiError> {
    let view = state
        .engine
        .status(session_id, query.user_id.unwrap_or_default())
        .await
        .map_err(|e| ApiError::new(request_id.0.clone(), e))?;
    Ok(Json(view))
}

/// POST /api/games/:session_id/call
pub async fn call_number_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<CallNumberResponse>, ApiError> {
    let outcome = state
        .engine
        .call_number(session_id)
        .await
        .map_err(|e| ApiError::new(request_id.0.clone(), e))?;

    Ok(Json(CallNumberResponse {
        number: outcome.number,
        called_numbers: outcome.called_numbers,
        remaining: outcome.remaining,
    }))
}

/// POST /api/games/:session_id/claim
pub async fn claim_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<ClaimRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let outcome = state
        .engine
        .claim_win(session_id, request.user_id)
        .await
        .map_err(|e| ApiError::new(request_id.0.clone(), e))?;

    let response = match outcome {
        ClaimOutcome::Won {
            username, prize, ..
        } => ClaimResponse {
            won: true,
            kicked: false,
            prize: Some(prize),
            strikes: None,
            message: format!("Bingo! {} won {}! First valid claim takes the pot.", username, prize),
        },
        ClaimOutcome::Invalid { strikes } => ClaimResponse {
            won: false,
            kicked: false,
            prize: None,
            strikes: Some(strikes),
            message: "Invalid bingo claim, strike recorded.".to_string(),
        },
        ClaimOutcome::Kicked => ClaimResponse {
            won: false,
            kicked: true,
            prize: None,
            strikes: None,
            message: "You were removed for invalid bingo claims.".to_string(),
        },
        ClaimOutcome::AlreadyDecided { .. } => ClaimResponse {
            won: false,
            kicked: false,
            prize: None,
            strikes: None,
            message: "Game already has a winner.".to_string(),
        },
        ClaimOutcome::NoCard => ClaimResponse {
            won: false,
            kicked: false,
            prize: None,
            strikes: None,
            message: "No card found for this game.".to_string(),
        },
    };

    Ok(Json(response))
}

/// POST /api/games/:session_id/start: operator start. Role checks are the
/// deployment's concern (gateway/reverse proxy), not the engine's.
pub async fn admin_start_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<AdminActionResponse>, ApiError> {
    let status = state
        .engine
        .admin_start(session_id)
        .await
        .map_err(|e| ApiError::new(request_id.0.clone(), e))?;
    Ok(Json(AdminActionResponse { status }))
}

/// POST /api/games/:session_id/end: operator abort, no settlement.
pub async fn admin_end_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<AdminActionResponse>, ApiError> {
    let status = state
        .engine
        .admin_end(session_id)
        .await
        .map_err(|e| ApiError::new(request_id.0.clone(), e))?;
    Ok(Json(AdminActionResponse { status }))
}

/// POST /api/games/:session_id/leave
pub async fn leave_game_handler(
    Extension(request_id): Extension<RequestId>,
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<LeaveGameRequest>,
) -> Result<Json<LeaveGameResponse>, ApiError> {
    let refunded = state
        .engine
        .leave_session(session_id, request.user_id)
        .await
        .map_err(|e| ApiError::new(request_id.0.clone(), e))?;
    Ok(Json(LeaveGameResponse { refunded }))
}
