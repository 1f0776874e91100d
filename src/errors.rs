//! Typed error kinds for session, ledger, and user operations.
//!
//! Every fallible operation in the engine returns one of these; nothing in
//! the core panics on bad input. A failed bingo claim is NOT an error; it is
//! a defined outcome (see `engine::ClaimOutcome`).

use uuid::Uuid;

use crate::users::UserId;

/// Root error type for all game operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("bet amount {0} is not an accepted denomination")]
    InvalidBet(u64),

    #[error("insufficient wallet balance: have {balance}, need {required}")]
    InsufficientFunds { balance: u64, required: u64 },

    #[error("session {0} not found")]
    SessionNotFound(Uuid),

    #[error("session {0} is not accepting players")]
    SessionNotJoinable(Uuid),

    #[error("user {0} already joined this session")]
    AlreadyJoined(UserId),

    #[error("bet amount {offered} does not match session bet {expected}")]
    BetMismatch { expected: u64, offered: u64 },

    #[error("seed number {0} is out of range (0-100)")]
    InvalidSeed(u64),

    #[error("seed number {0} was already chosen in this session")]
    DuplicateSeed(u8),

    #[error("user {0} already has a card for this session")]
    CardAlreadyIssued(UserId),

    #[error("session needs {required} players, has {have}")]
    NotEnoughPlayers { required: usize, have: usize },

    #[error("all numbers have been called")]
    DrawExhausted,

    #[error("session {0} ended without a recorded winner")]
    NoWinnerYet(Uuid),

    #[error("user {0} is not allowed to perform this operation")]
    Unauthorized(UserId),

    #[error("user {0} not found")]
    UserNotFound(UserId),

    #[error("username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("user {0} is already registered")]
    AlreadyRegistered(UserId),

    #[error("operation timed out, try again")]
    TransientUnavailable,
}

/// Convenience alias used throughout the engine.
pub type GameResult<T> = Result<T, GameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_amounts() {
        let err = GameError::InsufficientFunds {
            balance: 5,
            required: 50,
        };
        assert!(err.to_string().contains("have 5"));
        assert!(err.to_string().contains("need 50"));
    }

    #[test]
    fn display_includes_session_id() {
        let id = Uuid::new_v4();
        let err = GameError::SessionNotFound(id);
        assert!(err.to_string().contains(&id.to_string()));
    }
}
