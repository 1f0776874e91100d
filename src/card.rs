//! Deterministic bingo card generation.
//!
//! A card is a 5x5 grid of 25 distinct numbers drawn from 0..=100. The grid
//! layout is fixed in the order the sampler produced the numbers (row-major),
//! and that arrangement is authoritative for win checking: marking is a
//! per-position lookup, never unordered set membership.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Rows/columns per card.
pub const GRID_SIZE: usize = 5;

/// Cells per card.
pub const CARD_CELLS: usize = GRID_SIZE * GRID_SIZE;

/// Numbers are drawn from `0..=100`, 101 values total.
pub const NUMBER_POOL: usize = 101;

/// A 5x5 bingo card, immutable once generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardGrid([[u8; GRID_SIZE]; GRID_SIZE]);

impl CardGrid {
    pub fn cell(&self, row: usize, col: usize) -> u8 {
        self.0[row][col]
    }

    pub fn rows(&self) -> &[[u8; GRID_SIZE]; GRID_SIZE] {
        &self.0
    }

    /// Cells flattened in generation order (row-major).
    pub fn cells(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().flatten().copied()
    }
}

/// Generate the card for a player-chosen seed number.
///
/// Same seed, same grid, always: the sampler is a fixed-algorithm ChaCha
/// stream keyed only by the seed, so a card can be re-derived for audit.
pub fn generate(seed: u8) -> CardGrid {
    let mut rng = ChaCha8Rng::seed_from_u64(u64::from(seed));
    let picks = rand::seq::index::sample(&mut rng, NUMBER_POOL, CARD_CELLS);

    let mut grid = [[0u8; GRID_SIZE]; GRID_SIZE];
    for (i, value) in picks.iter().enumerate() {
        grid[i / GRID_SIZE][i % GRID_SIZE] = value as u8;
    }
    CardGrid(grid)
}
