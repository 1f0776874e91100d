//! API request and response models.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::card::CardGrid;
use crate::session::{SessionStatus, SessionView};
use crate::users::UserId;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserRequest {
    pub user_id: UserId,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUserResponse {
    pub user_id: UserId,
    pub username: String,
    pub balance: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDataResponse {
    pub user_id: UserId,
    pub username: String,
    pub balance: u64,
    pub invalid_claims: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGameRequest {
    pub user_id: UserId,
    pub bet_amount: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGameResponse {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub bet_amount: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinGameRequest {
    pub user_id: UserId,
    pub bet_amount: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinGameResponse {
    pub players: usize,
    pub bet_amount: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectSeedRequest {
    pub user_id: UserId,
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectSeedResponse {
    pub seed: u64,
    pub card: CardGrid,
}

/// Status reads take the requester so their card can be included.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusQuery {
    pub user_id: Option<UserId>,
}

/// Status response is the engine's snapshot, serialized as-is.
pub type GameStatusResponse = SessionView;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallNumberResponse {
    pub number: u8,
    pub called_numbers: Vec<u8>,
    pub remaining: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimRequest {
    pub user_id: UserId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimResponse {
    pub won: bool,
    pub kicked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prize: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strikes: Option<u32>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminActionResponse {
    pub status: SessionStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveGameRequest {
    pub user_id: UserId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveGameResponse {
    pub refunded: u64,
}
