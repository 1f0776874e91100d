//! A single bingo session: roster, lifecycle, cards, and draw history.
//!
//! Lifecycle is strictly `Waiting -> Started -> Finished`; `Finished` is
//! terminal. The struct owns only per-session state and pure transition
//! logic; locking, pacing waits, and money movement live in the engine,
//! which drives exactly one of these per session behind a mutex.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::caller::CallSequence;
use crate::card::{self, CardGrid};
use crate::config::GameConfig;
use crate::errors::{GameError, GameResult};
use crate::users::UserId;
use crate::winning;

/// Session lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Waiting,
    Started,
    Finished,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Waiting => write!(f, "waiting"),
            SessionStatus::Started => write!(f, "started"),
            SessionStatus::Finished => write!(f, "finished"),
        }
    }
}

/// Result of evaluating a claim against the session, before any settlement
/// or penalty is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimCheck {
    /// A different winner was already recorded; claim is rejected without
    /// penalty.
    AlreadyDecided { winner: UserId },
    /// Session was closed administratively with no winner.
    Closed,
    /// Claimant never selected a card in this session; no penalty.
    NoCard,
    Win,
    Lose,
}

/// One bingo session from creation to `Finished`.
#[derive(Debug)]
pub struct GameSession {
    id: Uuid,
    players: Vec<UserId>,
    status: SessionStatus,
    bet_amount: u64,
    /// Stakes actually collected. Settlement pays out of this, so a kicked
    /// player's forfeited stake stays in the prize pool.
    pot: u64,
    calls: CallSequence,
    seeds: HashMap<UserId, u8>,
    cards: HashMap<UserId, CardGrid>,
    countdown_started_at: Option<DateTime<Utc>>,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    next_call_at: Option<DateTime<Utc>>,
    prize_amount: u64,
    winner_id: Option<UserId>,
    last_updated: DateTime<Utc>,
}

impl GameSession {
    /// Create a session in `Waiting` with the creator as sole player. The
    /// creator's stake must already be collected.
    pub fn new(id: Uuid, creator: UserId, bet_amount: u64, now: DateTime<Utc>) -> Self {
        Self {
            id,
            players: vec![creator],
            status: SessionStatus::Waiting,
            bet_amount,
            pot: bet_amount,
            calls: CallSequence::new(),
            seeds: HashMap::new(),
            cards: HashMap::new(),
            countdown_started_at: None,
            started_at: None,
            ended_at: None,
            next_call_at: None,
            prize_amount: 0,
            winner_id: None,
            last_updated: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn players(&self) -> &[UserId] {
        &self.players
    }

    pub fn is_player(&self, user: UserId) -> bool {
        self.players.contains(&user)
    }

    pub fn bet_amount(&self) -> u64 {
        self.bet_amount
    }

    pub fn pot(&self) -> u64 {
        self.pot
    }

    pub fn called(&self) -> &[u8] {
        self.calls.called()
    }

    pub fn calls_remaining(&self) -> usize {
        self.calls.remaining()
    }

    pub fn winner_id(&self) -> Option<UserId> {
        self.winner_id
    }

    pub fn prize_amount(&self) -> u64 {
        self.prize_amount
    }

    pub fn card_for(&self, user: UserId) -> Option<&CardGrid> {
        self.cards.get(&user)
    }

    pub fn countdown_started_at(&self) -> Option<DateTime<Utc>> {
        self.countdown_started_at
    }

    /// Validate a join without applying it, so the stake debit can happen
    /// between validation and admission.
    pub fn check_join(&self, user: UserId, bet_amount: u64) -> GameResult<()> {
        if self.status != SessionStatus::Waiting {
            return Err(GameError::SessionNotJoinable(self.id));
        }
        if self.is_player(user) {
            return Err(GameError::AlreadyJoined(user));
        }
        if bet_amount != self.bet_amount {
            return Err(GameError::BetMismatch {
                expected: self.bet_amount,
                offered: bet_amount,
            });
        }
        Ok(())
    }

    /// Admit a player whose stake has been collected. Returns the new
    /// player count.
    pub fn admit(&mut self, user: UserId, now: DateTime<Utc>) -> usize {
        self.players.push(user);
        self.pot += self.bet_amount;
        self.last_updated = now;
        self.players.len()
    }

    /// Choose a seed and issue the player's card. A selection by anyone but
    /// the creator arms (or re-arms) the auto-start countdown.
    pub fn select_seed(
        &mut self,
        user: UserId,
        seed: u64,
        now: DateTime<Utc>,
    ) -> GameResult<CardGrid> {
        if self.status != SessionStatus::Waiting {
            return Err(GameError::SessionNotJoinable(self.id));
        }
        if !self.is_player(user) {
            return Err(GameError::Unauthorized(user));
        }
        if seed > 100 {
            return Err(GameError::InvalidSeed(seed));
        }
        let seed = seed as u8;
        if self.cards.contains_key(&user) {
            return Err(GameError::CardAlreadyIssued(user));
        }
        if self.seeds.values().any(|&chosen| chosen == seed) {
            return Err(GameError::DuplicateSeed(seed));
        }

        let grid = card::generate(seed);
        self.seeds.insert(user, seed);
        self.cards.insert(user, grid);

        if self.players.first() != Some(&user) {
            self.countdown_started_at = Some(now);
        }
        self.last_updated = now;
        Ok(grid)
    }

    /// Seeds chosen in the current selection round.
    pub fn selected_seeds(&self) -> Vec<u8> {
        let mut seeds: Vec<u8> = self.seeds.values().copied().collect();
        seeds.sort_unstable();
        seeds
    }

    /// Countdown-driven auto-start, checked on every status read. Returns
    /// true when the transition fired.
    pub fn maybe_auto_start(&mut self, now: DateTime<Utc>, config: &GameConfig) -> bool {
        if self.status != SessionStatus::Waiting {
            return false;
        }
        let Some(armed_at) = self.countdown_started_at else {
            return false;
        };
        if self.players.len() < config.auto_start_min_players {
            return false;
        }
        if now - armed_at <= config.countdown() {
            return false;
        }

        self.begin(now);
        // Auto-start opens a fresh selection round.
        self.seeds.clear();
        true
    }

    /// Privileged start, bypassing the countdown.
    pub fn force_start(&mut self, now: DateTime<Utc>, min_players: usize) -> GameResult<()> {
        if self.status != SessionStatus::Waiting {
            return Err(GameError::SessionNotJoinable(self.id));
        }
        if self.players.len() < min_players {
            return Err(GameError::NotEnoughPlayers {
                required: min_players,
                have: self.players.len(),
            });
        }
        self.begin(now);
        Ok(())
    }

    fn begin(&mut self, now: DateTime<Utc>) {
        self.status = SessionStatus::Started;
        self.started_at = Some(now);
        // Placeholder until settlement computes the raked prize.
        self.prize_amount = self.bet_amount;
        self.last_updated = now;
    }

    /// Privileged end with no settlement.
    pub fn force_end(&mut self, now: DateTime<Utc>) -> GameResult<()> {
        if self.status != SessionStatus::Started {
            return Err(GameError::SessionNotJoinable(self.id));
        }
        self.status = SessionStatus::Finished;
        self.ended_at = Some(now);
        self.last_updated = now;
        Ok(())
    }

    /// Whether a draw is currently permitted, ignoring pacing.
    pub fn check_callable(&self, now: DateTime<Utc>) -> GameResult<()> {
        if self.status != SessionStatus::Started {
            return Err(GameError::SessionNotJoinable(self.id));
        }
        if let Some(ended_at) = self.ended_at {
            if now > ended_at {
                return Err(GameError::SessionNotJoinable(self.id));
            }
        }
        if self.calls.is_exhausted() {
            return Err(GameError::DrawExhausted);
        }
        Ok(())
    }

    /// Remaining cooldown before the next draw is allowed; `None` when a
    /// draw is ready now.
    pub fn call_ready_in(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.next_call_at
            .filter(|&ready_at| ready_at > now)
            .map(|ready_at| ready_at - now)
    }

    /// Draw the next number and start the cooldown for the following one.
    pub fn record_call(
        &mut self,
        rng: &mut impl Rng,
        now: DateTime<Utc>,
        interval: Duration,
    ) -> GameResult<u8> {
        self.check_callable(now)?;
        let number = self.calls.draw(rng)?;
        self.next_call_at = Some(now + interval);
        self.last_updated = now;
        Ok(number)
    }

    /// Evaluate a claim without mutating anything.
    pub fn check_claim(&self, user: UserId) -> ClaimCheck {
        if let Some(winner) = self.winner_id {
            return ClaimCheck::AlreadyDecided { winner };
        }
        if self.status == SessionStatus::Finished {
            return ClaimCheck::Closed;
        }
        match self.cards.get(&user) {
            None => ClaimCheck::NoCard,
            Some(card) => {
                if winning::evaluate(card, self.calls.called()) {
                    ClaimCheck::Win
                } else {
                    ClaimCheck::Lose
                }
            }
        }
    }

    /// Record the winning settlement. Terminal: the session is `Finished`
    /// and immutable afterwards.
    pub fn record_win(&mut self, winner: UserId, prize: u64, now: DateTime<Utc>) {
        self.winner_id = Some(winner);
        self.prize_amount = prize;
        self.status = SessionStatus::Finished;
        self.ended_at = Some(now);
        self.last_updated = now;
    }

    /// Drop a player's roster entry, card, and chosen seed. Returns false
    /// when the user was not a player. The pot is left untouched; a leaver's
    /// refund goes through [`GameSession::withdraw_stake`], a kicked
    /// player's stake is forfeited into the pot.
    pub fn remove_player(&mut self, user: UserId, now: DateTime<Utc>) -> bool {
        let before = self.players.len();
        self.players.retain(|&p| p != user);
        if self.players.len() == before {
            return false;
        }
        self.cards.remove(&user);
        self.seeds.remove(&user);
        self.last_updated = now;
        true
    }

    /// Take one stake back out of the pot for a refund.
    pub fn withdraw_stake(&mut self) -> u64 {
        self.pot = self.pot.saturating_sub(self.bet_amount);
        self.bet_amount
    }

    /// Snapshot for status reads, including the requester's card when one
    /// was issued.
    pub fn view_for(&self, requester: UserId) -> SessionView {
        SessionView {
            session_id: self.id,
            status: self.status,
            players: self.players.clone(),
            bet_amount: self.bet_amount,
            pot: self.pot,
            called_numbers: self.calls.called().to_vec(),
            selected_seeds: self.selected_seeds(),
            prize_amount: self.prize_amount,
            winner_id: self.winner_id,
            countdown_started_at: self.countdown_started_at,
            started_at: self.started_at,
            ended_at: self.ended_at,
            card: self.cards.get(&requester).copied(),
        }
    }
}

/// Read-only snapshot of a session for one requester.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub players: Vec<UserId>,
    pub bet_amount: u64,
    pub pot: u64,
    pub called_numbers: Vec<u8>,
    pub selected_seeds: Vec<u8>,
    pub prize_amount: u64,
    pub winner_id: Option<UserId>,
    pub countdown_started_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub card: Option<CardGrid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const CREATOR: UserId = 1;
    const BET: u64 = 50;

    fn session(now: DateTime<Utc>) -> GameSession {
        GameSession::new(Uuid::new_v4(), CREATOR, BET, now)
    }

    fn config() -> GameConfig {
        GameConfig::default()
    }

    #[test]
    fn creator_is_sole_player_and_pot_holds_one_stake() {
        let s = session(Utc::now());
        assert_eq!(s.players(), &[CREATOR]);
        assert_eq!(s.status(), SessionStatus::Waiting);
        assert_eq!(s.pot(), BET);
    }

    #[test]
    fn join_validations() {
        let now = Utc::now();
        let mut s = session(now);

        assert_eq!(
            s.check_join(CREATOR, BET),
            Err(GameError::AlreadyJoined(CREATOR))
        );
        assert_eq!(
            s.check_join(2, 100),
            Err(GameError::BetMismatch {
                expected: BET,
                offered: 100,
            })
        );

        s.check_join(2, BET).unwrap();
        assert_eq!(s.admit(2, now), 2);
        assert_eq!(s.pot(), 2 * BET);

        s.force_start(now, 2).unwrap();
        assert_eq!(
            s.check_join(3, BET),
            Err(GameError::SessionNotJoinable(s.id()))
        );
    }

    #[test]
    fn seed_selection_rules() {
        let now = Utc::now();
        let mut s = session(now);
        s.admit(2, now);

        assert_eq!(
            s.select_seed(9, 7, now),
            Err(GameError::Unauthorized(9))
        );
        assert_eq!(
            s.select_seed(CREATOR, 101, now),
            Err(GameError::InvalidSeed(101))
        );

        let grid = s.select_seed(CREATOR, 7, now).unwrap();
        assert_eq!(grid, card::generate(7));
        assert_eq!(
            s.select_seed(2, 7, now),
            Err(GameError::DuplicateSeed(7))
        );
        assert_eq!(
            s.select_seed(CREATOR, 13, now),
            Err(GameError::CardAlreadyIssued(CREATOR))
        );

        s.select_seed(2, 13, now).unwrap();
        assert_eq!(s.selected_seeds(), vec![7, 13]);
    }

    #[test]
    fn countdown_arms_on_non_creator_selection_only() {
        let now = Utc::now();
        let mut s = session(now);
        s.admit(2, now);

        s.select_seed(CREATOR, 7, now).unwrap();
        assert_eq!(s.countdown_started_at(), None);

        let later = now + Duration::seconds(30);
        s.select_seed(2, 13, later).unwrap();
        assert_eq!(s.countdown_started_at(), Some(later));
    }

    #[test]
    fn auto_start_needs_countdown_threshold_and_roster() {
        let now = Utc::now();
        let config = config();
        let mut s = session(now);
        s.admit(2, now);
        s.select_seed(CREATOR, 7, now).unwrap();
        s.select_seed(2, 13, now).unwrap();

        // Two players: countdown armed but roster too small.
        assert!(!s.maybe_auto_start(now + Duration::seconds(121), &config));

        s.admit(3, now);
        // Threshold is strict: exactly the countdown is not enough.
        assert!(!s.maybe_auto_start(now + Duration::seconds(120), &config));
        assert!(s.maybe_auto_start(now + Duration::seconds(121), &config));
        assert_eq!(s.status(), SessionStatus::Started);
        // Selection round is reset; issued cards survive.
        assert!(s.selected_seeds().is_empty());
        assert!(s.card_for(CREATOR).is_some());
        assert_eq!(s.prize_amount(), BET);

        // Idempotent once started.
        assert!(!s.maybe_auto_start(now + Duration::seconds(300), &config));
    }

    #[test]
    fn force_start_requires_two_players() {
        let now = Utc::now();
        let mut s = session(now);
        assert_eq!(
            s.force_start(now, 2),
            Err(GameError::NotEnoughPlayers {
                required: 2,
                have: 1,
            })
        );
        s.admit(2, now);
        s.force_start(now, 2).unwrap();
        assert_eq!(s.status(), SessionStatus::Started);
    }

    #[test]
    fn draws_are_paced_and_distinct() {
        let now = Utc::now();
        let interval = Duration::seconds(5);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut s = session(now);
        s.admit(2, now);
        s.force_start(now, 2).unwrap();

        assert_eq!(s.call_ready_in(now), None);
        let first = s.record_call(&mut rng, now, interval).unwrap();
        assert_eq!(s.call_ready_in(now), Some(interval));
        assert_eq!(
            s.call_ready_in(now + Duration::seconds(2)),
            Some(Duration::seconds(3))
        );
        assert_eq!(s.call_ready_in(now + interval), None);

        let later = now + interval;
        let second = s.record_call(&mut rng, later, interval).unwrap();
        assert_ne!(first, second);
        assert_eq!(s.called(), &[first, second]);
    }

    #[test]
    fn calls_require_a_started_session() {
        let now = Utc::now();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut s = session(now);
        assert_eq!(
            s.record_call(&mut rng, now, Duration::zero()),
            Err(GameError::SessionNotJoinable(s.id()))
        );
    }

    #[test]
    fn claim_checks_cover_every_case() {
        let now = Utc::now();
        let mut s = session(now);
        s.admit(2, now);
        let grid = s.select_seed(CREATOR, 7, now).unwrap();
        s.force_start(now, 2).unwrap();

        assert_eq!(s.check_claim(2), ClaimCheck::NoCard);
        assert_eq!(s.check_claim(CREATOR), ClaimCheck::Lose);

        // Once 100 of the 101 numbers are called at most one cell of any
        // card is unmarked, which always leaves a completed line, so the
        // claim must flip to a win before the draws run out.
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        while s.check_claim(CREATOR) == ClaimCheck::Lose {
            s.record_call(&mut rng, now, Duration::zero()).unwrap();
        }
        assert_eq!(s.check_claim(CREATOR), ClaimCheck::Win);
        assert!(winning::evaluate(&grid, s.called()));

        s.record_win(CREATOR, 98, now);
        assert_eq!(s.status(), SessionStatus::Finished);
        assert_eq!(
            s.check_claim(2),
            ClaimCheck::AlreadyDecided { winner: CREATOR }
        );
    }

    #[test]
    fn admin_end_leaves_no_winner() {
        let now = Utc::now();
        let mut s = session(now);
        s.admit(2, now);
        s.force_start(now, 2).unwrap();
        s.force_end(now).unwrap();
        assert_eq!(s.status(), SessionStatus::Finished);
        assert_eq!(s.winner_id(), None);
        assert_eq!(s.check_claim(CREATOR), ClaimCheck::Closed);
    }

    #[test]
    fn remove_player_drops_card_and_seed() {
        let now = Utc::now();
        let mut s = session(now);
        s.admit(2, now);
        s.select_seed(2, 13, now).unwrap();

        assert!(s.remove_player(2, now));
        assert!(!s.is_player(2));
        assert!(s.card_for(2).is_none());
        assert!(s.selected_seeds().is_empty());
        assert!(!s.remove_player(2, now));

        assert_eq!(s.withdraw_stake(), BET);
        assert_eq!(s.pot(), BET);
    }
}
