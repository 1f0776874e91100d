//! Game engine: the addressable session registry plus orchestration of
//! locking, call pacing, and wallet settlement.
//!
//! Every session lives behind its own `tokio::sync::Mutex` inside a
//! concurrent map, so operations on one session serialize while unrelated
//! sessions proceed independently; there is no process-wide lock. Lock
//! acquisition and the call-pacing wait are both bounded by the configured
//! operation timeout; when the bound is hit the operation fails with a
//! transient error instead of hanging a worker.

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::card::CardGrid;
use crate::clock::Clock;
use crate::config::GameConfig;
use crate::errors::{GameError, GameResult};
use crate::ledger::WalletLedger;
use crate::session::{ClaimCheck, GameSession, SessionStatus, SessionView};
use crate::users::{UserDirectory, UserId};

/// Result of a successful draw.
#[derive(Debug, Clone)]
pub struct CallOutcome {
    pub number: u8,
    pub called_numbers: Vec<u8>,
    pub remaining: usize,
}

/// Outcome of a bingo claim. Losing outcomes are results, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// Claim verified; prize credited.
    Won {
        winner: UserId,
        username: String,
        prize: u64,
    },
    /// Claim failed; strike recorded, user still in the game.
    Invalid { strikes: u32 },
    /// Claim failed and the strike hit the kick threshold; user removed.
    Kicked,
    /// A different winner was already recorded; no penalty.
    AlreadyDecided { winner: UserId },
    /// Claimant has no card in this session; no penalty.
    NoCard,
}

impl ClaimOutcome {
    pub fn won(&self) -> bool {
        matches!(self, ClaimOutcome::Won { .. })
    }
}

/// Orchestrates all sessions against the wallet ledger and user directory.
pub struct GameEngine {
    config: GameConfig,
    sessions: DashMap<Uuid, Arc<Mutex<GameSession>>>,
    ledger: Arc<WalletLedger>,
    users: Arc<dyn UserDirectory>,
    clock: Arc<dyn Clock>,
}

impl GameEngine {
    pub fn new(
        config: GameConfig,
        ledger: Arc<WalletLedger>,
        users: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            sessions: DashMap::new(),
            ledger,
            users,
            clock,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn ledger(&self) -> &WalletLedger {
        &self.ledger
    }

    pub fn users(&self) -> &Arc<dyn UserDirectory> {
        &self.users
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn session_handle(&self, id: Uuid) -> GameResult<Arc<Mutex<GameSession>>> {
        self.sessions
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(GameError::SessionNotFound(id))
    }

    async fn lock_session<'a>(
        &self,
        handle: &'a Arc<Mutex<GameSession>>,
    ) -> GameResult<tokio::sync::MutexGuard<'a, GameSession>> {
        tokio::time::timeout(self.config.op_timeout(), handle.lock())
            .await
            .map_err(|_| GameError::TransientUnavailable)
    }

    async fn require_user(&self, user: UserId) -> GameResult<()> {
        if self.users.exists(user).await {
            Ok(())
        } else {
            Err(GameError::Unauthorized(user))
        }
    }

    /// Register a user and open their wallet with the starting balance.
    pub async fn register_user(&self, user: UserId, username: &str) -> GameResult<u64> {
        self.users.register(user, username).await?;
        self.ledger.open_account(user, self.config.starting_balance);
        Ok(self.config.starting_balance)
    }

    /// Create a session with the creator's stake collected up front.
    pub async fn create_session(&self, creator: UserId, bet_amount: u64) -> GameResult<Uuid> {
        if !self.config.denominations.contains(&bet_amount) {
            return Err(GameError::InvalidBet(bet_amount));
        }
        self.require_user(creator).await?;
        self.ledger.try_debit(creator, bet_amount)?;

        let id = Uuid::new_v4();
        let session = GameSession::new(id, creator, bet_amount, self.clock.now());
        self.sessions.insert(id, Arc::new(Mutex::new(session)));
        info!(session = %id, creator, bet_amount, "session created");
        Ok(id)
    }

    /// Join a waiting session; the stake is debited only after the join is
    /// validated, so a rejected join never touches the wallet.
    pub async fn join_session(
        &self,
        id: Uuid,
        user: UserId,
        bet_amount: u64,
    ) -> GameResult<usize> {
        self.require_user(user).await?;
        let handle = self.session_handle(id)?;
        let mut session = self.lock_session(&handle).await?;

        session.check_join(user, bet_amount)?;
        self.ledger.try_debit(user, bet_amount)?;
        let players = session.admit(user, self.clock.now());
        info!(session = %id, user, players, "player joined");
        Ok(players)
    }

    /// Choose a seed and receive the deterministically generated card.
    pub async fn select_seed(&self, id: Uuid, user: UserId, seed: u64) -> GameResult<CardGrid> {
        let handle = self.session_handle(id)?;
        let mut session = self.lock_session(&handle).await?;
        let grid = session.select_seed(user, seed, self.clock.now())?;
        info!(session = %id, user, seed, "card issued");
        Ok(grid)
    }

    /// Status snapshot for one requester. Reads drive the countdown: an
    /// overdue waiting session flips to started here.
    pub async fn status(&self, id: Uuid, requester: UserId) -> GameResult<SessionView> {
        let handle = self.session_handle(id)?;
        let mut session = self.lock_session(&handle).await?;
        if session.maybe_auto_start(self.clock.now(), &self.config) {
            info!(session = %id, "countdown elapsed, session auto-started");
        }
        Ok(session.view_for(requester))
    }

    /// Draw the next number. Early callers are deferred on the async timer
    /// until the pacing interval has passed (the session lock is released
    /// while waiting) and give up with a transient error once the
    /// operation timeout is spent.
    pub async fn call_number(&self, id: Uuid) -> GameResult<CallOutcome> {
        let deadline = Instant::now() + self.config.op_timeout();
        let handle = self.session_handle(id)?;

        loop {
            let cooldown = {
                let mut session = self.lock_session(&handle).await?;
                let now = self.clock.now();
                session.check_callable(now)?;

                match session.call_ready_in(now) {
                    None => {
                        let number = session.record_call(
                            &mut rand::thread_rng(),
                            now,
                            self.config.call_interval(),
                        )?;
                        info!(session = %id, number, total = session.called().len(), "number called");
                        return Ok(CallOutcome {
                            number,
                            called_numbers: session.called().to_vec(),
                            remaining: session.calls_remaining(),
                        });
                    }
                    Some(cooldown) => cooldown.to_std().unwrap_or_default(),
                }
            };

            if Instant::now() + cooldown > deadline {
                return Err(GameError::TransientUnavailable);
            }
            tokio::time::sleep(cooldown).await;
        }
    }

    /// Evaluate a claim, then settle or penalize.
    pub async fn claim_win(&self, id: Uuid, user: UserId) -> GameResult<ClaimOutcome> {
        self.require_user(user).await?;
        let handle = self.session_handle(id)?;
        let mut session = self.lock_session(&handle).await?;
        let now = self.clock.now();

        match session.check_claim(user) {
            ClaimCheck::AlreadyDecided { winner } => {
                Ok(ClaimOutcome::AlreadyDecided { winner })
            }
            ClaimCheck::Closed => Err(GameError::NoWinnerYet(id)),
            ClaimCheck::NoCard => Ok(ClaimOutcome::NoCard),
            ClaimCheck::Win => {
                // Stakes were collected at join time; settlement only pays
                // the raked prize out of the pot.
                let prize = self.config.prize_for(session.pot());
                self.ledger.credit(user, prize)?;
                session.record_win(user, prize, now);
                let username = self
                    .users
                    .username(user)
                    .await
                    .unwrap_or_else(|| user.to_string());
                info!(session = %id, winner = user, prize, "bingo verified, prize settled");
                Ok(ClaimOutcome::Won {
                    winner: user,
                    username,
                    prize,
                })
            }
            ClaimCheck::Lose => {
                let strikes = self.users.record_invalid_claim(user).await?;
                if strikes >= self.config.kick_threshold {
                    self.users.remove(user).await;
                    self.ledger.close_account(user);
                    session.remove_player(user, now);
                    let emptied = session.players().is_empty();
                    drop(session);
                    if emptied {
                        self.sessions.remove(&id);
                        info!(session = %id, "session destroyed, roster empty");
                    }
                    warn!(session = %id, user, strikes, "user kicked for invalid claim");
                    Ok(ClaimOutcome::Kicked)
                } else {
                    info!(session = %id, user, strikes, "invalid claim recorded");
                    Ok(ClaimOutcome::Invalid { strikes })
                }
            }
        }
    }

    /// Privileged start (authorization is enforced upstream).
    pub async fn admin_start(&self, id: Uuid) -> GameResult<SessionStatus> {
        let handle = self.session_handle(id)?;
        let mut session = self.lock_session(&handle).await?;
        session.force_start(self.clock.now(), self.config.admin_start_min_players)?;
        info!(session = %id, "session started by operator");
        Ok(session.status())
    }

    /// Privileged end with no settlement.
    pub async fn admin_end(&self, id: Uuid) -> GameResult<SessionStatus> {
        let handle = self.session_handle(id)?;
        let mut session = self.lock_session(&handle).await?;
        session.force_end(self.clock.now())?;
        info!(session = %id, "session ended by operator");
        Ok(session.status())
    }

    /// Leave a waiting session with a stake refund. The last player leaving
    /// destroys the session; an empty session is never kept.
    pub async fn leave_session(&self, id: Uuid, user: UserId) -> GameResult<u64> {
        self.require_user(user).await?;
        let handle = self.session_handle(id)?;
        let mut session = self.lock_session(&handle).await?;

        if session.status() != SessionStatus::Waiting {
            return Err(GameError::SessionNotJoinable(id));
        }
        if !session.is_player(user) {
            return Err(GameError::Unauthorized(user));
        }

        session.remove_player(user, self.clock.now());
        let refund = session.withdraw_stake();
        self.ledger.credit(user, refund)?;

        let emptied = session.players().is_empty();
        drop(session);
        if emptied {
            self.sessions.remove(&id);
            info!(session = %id, "session destroyed, roster empty");
        }
        info!(session = %id, user, refund, "player left, stake refunded");
        Ok(refund)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::users::InMemoryUsers;
    use chrono::Utc;

    fn engine_with(config: GameConfig) -> (GameEngine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let engine = GameEngine::new(
            config,
            Arc::new(WalletLedger::new()),
            Arc::new(InMemoryUsers::new()),
            clock.clone(),
        );
        (engine, clock)
    }

    async fn funded(engine: &GameEngine, user: UserId, name: &str, balance: u64) {
        engine.register_user(user, name).await.unwrap();
        let opening = engine.config().starting_balance;
        if balance > opening {
            engine.ledger().credit(user, balance - opening).unwrap();
        }
    }

    #[tokio::test]
    async fn create_rejects_unknown_denominations() {
        let (engine, _clock) = engine_with(GameConfig::default());
        funded(&engine, 1, "abebe", 100).await;
        assert_eq!(
            engine.create_session(1, 77).await,
            Err(GameError::InvalidBet(77))
        );
    }

    #[tokio::test]
    async fn create_requires_funds_and_debits_stake() {
        let (engine, _clock) = engine_with(GameConfig::default());
        funded(&engine, 1, "abebe", 100).await;

        assert!(matches!(
            engine.create_session(1, 200).await,
            Err(GameError::InsufficientFunds { .. })
        ));
        assert_eq!(engine.ledger().balance(1), Ok(100));

        engine.create_session(1, 50).await.unwrap();
        assert_eq!(engine.ledger().balance(1), Ok(50));
        assert_eq!(engine.session_count(), 1);
    }

    #[tokio::test]
    async fn join_validates_before_touching_the_wallet() {
        let (engine, _clock) = engine_with(GameConfig::default());
        funded(&engine, 1, "abebe", 100).await;
        funded(&engine, 2, "bekele", 100).await;
        let id = engine.create_session(1, 50).await.unwrap();

        assert_eq!(
            engine.join_session(id, 2, 100).await,
            Err(GameError::BetMismatch {
                expected: 50,
                offered: 100,
            })
        );
        assert_eq!(engine.ledger().balance(2), Ok(100));

        assert_eq!(engine.join_session(id, 2, 50).await, Ok(2));
        assert_eq!(engine.ledger().balance(2), Ok(50));

        assert_eq!(
            engine.join_session(id, 2, 50).await,
            Err(GameError::AlreadyJoined(2))
        );
    }

    #[tokio::test]
    async fn join_rejects_unregistered_users() {
        let (engine, _clock) = engine_with(GameConfig::default());
        funded(&engine, 1, "abebe", 100).await;
        let id = engine.create_session(1, 50).await.unwrap();
        assert_eq!(
            engine.join_session(id, 9, 50).await,
            Err(GameError::Unauthorized(9))
        );
    }

    #[tokio::test]
    async fn missing_sessions_are_not_found() {
        let (engine, _clock) = engine_with(GameConfig::default());
        funded(&engine, 1, "abebe", 100).await;
        let ghost = Uuid::new_v4();
        assert_eq!(
            engine.join_session(ghost, 1, 50).await,
            Err(GameError::SessionNotFound(ghost))
        );
        assert_eq!(
            engine.call_number(ghost).await.unwrap_err(),
            GameError::SessionNotFound(ghost)
        );
    }

    #[tokio::test]
    async fn leave_refunds_and_destroys_empty_sessions() {
        let (engine, _clock) = engine_with(GameConfig::default());
        funded(&engine, 1, "abebe", 100).await;
        let id = engine.create_session(1, 50).await.unwrap();
        assert_eq!(engine.ledger().balance(1), Ok(50));

        assert_eq!(engine.leave_session(id, 1).await, Ok(50));
        assert_eq!(engine.ledger().balance(1), Ok(100));
        assert_eq!(engine.session_count(), 0);
        assert_eq!(
            engine.status(id, 1).await.unwrap_err(),
            GameError::SessionNotFound(id)
        );
    }
}
