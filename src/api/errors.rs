//! API error handling.
//!
//! Domain errors cross the HTTP boundary as a structured JSON body with a
//! stable machine-readable code, a human-readable message, and the request
//! id for log correlation.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::GameError;

/// Top-level error response with request tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub request_id: String,
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable error code (SESSION_NOT_FOUND, BET_MISMATCH, ...).
    pub code: String,
    pub message: String,
}

/// A domain error tagged with the request that produced it.
#[derive(Debug)]
pub struct ApiError {
    pub request_id: String,
    pub kind: GameError,
}

impl ApiError {
    pub fn new(request_id: String, kind: GameError) -> Self {
        Self { request_id, kind }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.request_id, self.kind)
    }
}

impl std::error::Error for ApiError {}

/// Map a domain error to its HTTP status and stable code.
fn classify(kind: &GameError) -> (StatusCode, &'static str) {
    match kind {
        GameError::InvalidBet(_) => (StatusCode::BAD_REQUEST, "INVALID_BET"),
        GameError::InsufficientFunds { .. } => (StatusCode::BAD_REQUEST, "INSUFFICIENT_FUNDS"),
        GameError::SessionNotFound(_) => (StatusCode::NOT_FOUND, "SESSION_NOT_FOUND"),
        GameError::SessionNotJoinable(_) => (StatusCode::CONFLICT, "SESSION_NOT_JOINABLE"),
        GameError::AlreadyJoined(_) => (StatusCode::CONFLICT, "ALREADY_JOINED"),
        GameError::BetMismatch { .. } => (StatusCode::BAD_REQUEST, "BET_MISMATCH"),
        GameError::InvalidSeed(_) => (StatusCode::BAD_REQUEST, "INVALID_SEED"),
        GameError::DuplicateSeed(_) => (StatusCode::CONFLICT, "DUPLICATE_SEED"),
        GameError::CardAlreadyIssued(_) => (StatusCode::CONFLICT, "CARD_ALREADY_ISSUED"),
        GameError::NotEnoughPlayers { .. } => (StatusCode::BAD_REQUEST, "NOT_ENOUGH_PLAYERS"),
        GameError::DrawExhausted => (StatusCode::CONFLICT, "DRAW_EXHAUSTED"),
        GameError::NoWinnerYet(_) => (StatusCode::CONFLICT, "NO_WINNER"),
        GameError::Unauthorized(_) => (StatusCode::FORBIDDEN, "UNAUTHORIZED"),
        GameError::UserNotFound(_) => (StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
        GameError::UsernameTaken(_) => (StatusCode::CONFLICT, "USERNAME_TAKEN"),
        GameError::AlreadyRegistered(_) => (StatusCode::CONFLICT, "ALREADY_REGISTERED"),
        GameError::TransientUnavailable => {
            (StatusCode::SERVICE_UNAVAILABLE, "TRANSIENT_UNAVAILABLE")
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = classify(&self.kind);
        let body = Json(ErrorResponse {
            request_id: self.request_id,
            error: ErrorBody {
                code: code.to_string(),
                message: self.kind.to_string(),
            },
        });
        (status, body).into_response()
    }
}
