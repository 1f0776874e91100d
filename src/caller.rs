//! Non-repeating number draws for an active session.
//!
//! Each session keeps one [`CallSequence`]: an append-only record of called
//! numbers plus a membership index. Draws are uniform over the values not yet
//! called, so a number can never repeat within a session. Pacing between
//! draws is a scheduling concern and lives in the engine, not here.

use rand::Rng;

use crate::card::NUMBER_POOL;
use crate::errors::{GameError, GameResult};

/// Draws stop once this many numbers have been called.
pub const MAX_CALLS: usize = 100;

/// The ordered, non-repeating draw history of one session.
#[derive(Debug, Clone)]
pub struct CallSequence {
    called: Vec<u8>,
    seen: [bool; NUMBER_POOL],
}

impl Default for CallSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl CallSequence {
    pub fn new() -> Self {
        Self {
            called: Vec::new(),
            seen: [false; NUMBER_POOL],
        }
    }

    /// Called numbers in call order.
    pub fn called(&self) -> &[u8] {
        &self.called
    }

    pub fn len(&self) -> usize {
        self.called.len()
    }

    pub fn is_empty(&self) -> bool {
        self.called.is_empty()
    }

    pub fn contains(&self, number: u8) -> bool {
        (number as usize) < NUMBER_POOL && self.seen[number as usize]
    }

    /// Whether the session has hit the draw limit.
    pub fn is_exhausted(&self) -> bool {
        self.called.len() >= MAX_CALLS
    }

    /// Draws left before the limit.
    pub fn remaining(&self) -> usize {
        MAX_CALLS.saturating_sub(self.called.len())
    }

    /// Draw a uniformly random number in 0..=100 that has not been called.
    pub fn draw(&mut self, rng: &mut impl Rng) -> GameResult<u8> {
        if self.is_exhausted() {
            return Err(GameError::DrawExhausted);
        }

        let open: Vec<u8> = (0..NUMBER_POOL as u8)
            .filter(|&n| !self.seen[n as usize])
            .collect();
        if open.is_empty() {
            return Err(GameError::DrawExhausted);
        }

        let pick = open[rng.gen_range(0..open.len())];
        self.seen[pick as usize] = true;
        self.called.push(pick);
        Ok(pick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    #[test]
    fn draws_never_repeat() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut seq = CallSequence::new();
        for _ in 0..MAX_CALLS {
            seq.draw(&mut rng).unwrap();
        }
        let distinct: HashSet<u8> = seq.called().iter().copied().collect();
        assert_eq!(distinct.len(), MAX_CALLS);
        assert!(seq.called().iter().all(|&n| n <= 100));
    }

    #[test]
    fn exhausts_at_the_draw_limit() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut seq = CallSequence::new();
        for _ in 0..MAX_CALLS {
            seq.draw(&mut rng).unwrap();
        }
        assert!(seq.is_exhausted());
        assert_eq!(seq.remaining(), 0);
        assert_eq!(seq.draw(&mut rng), Err(GameError::DrawExhausted));
    }

    #[test]
    fn contains_tracks_history() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut seq = CallSequence::new();
        let first = seq.draw(&mut rng).unwrap();
        assert!(seq.contains(first));
        assert_eq!(seq.called(), &[first]);
    }
}
