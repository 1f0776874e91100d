//! Positional win detection.
//!
//! Marking is per-position: a cell counts as marked when the number at that
//! grid position has been called. A card wins when any row, any column, the
//! main diagonal, or the anti-diagonal is fully marked. Pure functions, no
//! state.

use crate::card::{CardGrid, GRID_SIZE};

/// Marked positions of a card against the called numbers.
pub fn mark_grid(card: &CardGrid, called: &[u8]) -> [[bool; GRID_SIZE]; GRID_SIZE] {
    let mut marks = [[false; GRID_SIZE]; GRID_SIZE];
    for (r, row) in marks.iter_mut().enumerate() {
        for (c, mark) in row.iter_mut().enumerate() {
            *mark = called.contains(&card.cell(r, c));
        }
    }
    marks
}

/// Whether a marked grid contains a completed line.
pub fn has_bingo(marks: &[[bool; GRID_SIZE]; GRID_SIZE]) -> bool {
    let any_row = marks.iter().any(|row| row.iter().all(|&m| m));
    let any_col = (0..GRID_SIZE).any(|c| (0..GRID_SIZE).all(|r| marks[r][c]));
    let main_diag = (0..GRID_SIZE).all(|i| marks[i][i]);
    let anti_diag = (0..GRID_SIZE).all(|i| marks[i][GRID_SIZE - 1 - i]);
    any_row || any_col || main_diag || anti_diag
}

/// Convenience: evaluate a card directly against the called numbers.
pub fn evaluate(card: &CardGrid, called: &[u8]) -> bool {
    has_bingo(&mark_grid(card, called))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card;

    fn row_values(grid: &CardGrid, r: usize) -> Vec<u8> {
        (0..GRID_SIZE).map(|c| grid.cell(r, c)).collect()
    }

    fn col_values(grid: &CardGrid, c: usize) -> Vec<u8> {
        (0..GRID_SIZE).map(|r| grid.cell(r, c)).collect()
    }

    #[test]
    fn empty_called_set_never_wins() {
        assert!(!evaluate(&card::generate(7), &[]));
    }

    #[test]
    fn completed_row_wins() {
        let grid = card::generate(7);
        for r in 0..GRID_SIZE {
            assert!(evaluate(&grid, &row_values(&grid, r)), "row {}", r);
        }
    }

    #[test]
    fn completed_column_wins() {
        let grid = card::generate(13);
        for c in 0..GRID_SIZE {
            assert!(evaluate(&grid, &col_values(&grid, c)), "col {}", c);
        }
    }

    #[test]
    fn completed_diagonals_win() {
        let grid = card::generate(42);
        let main: Vec<u8> = (0..GRID_SIZE).map(|i| grid.cell(i, i)).collect();
        let anti: Vec<u8> = (0..GRID_SIZE)
            .map(|i| grid.cell(i, GRID_SIZE - 1 - i))
            .collect();
        assert!(evaluate(&grid, &main));
        assert!(evaluate(&grid, &anti));
    }

    #[test]
    fn four_of_a_row_does_not_win() {
        let grid = card::generate(7);
        let mut called = row_values(&grid, 0);
        called.pop();
        assert!(!evaluate(&grid, &called));
    }

    #[test]
    fn marks_follow_positions_not_membership_count() {
        // Calling one value from each row marks five cells but completes
        // no line unless those cells happen to share a column or diagonal.
        let grid = card::generate(99);
        let called = vec![
            grid.cell(0, 0),
            grid.cell(1, 2),
            grid.cell(2, 4),
            grid.cell(3, 1),
            grid.cell(4, 3),
        ];
        let marks = mark_grid(&grid, &called);
        let marked_count: usize = marks.iter().flatten().filter(|&&m| m).count();
        assert_eq!(marked_count, 5);
        assert!(!has_bingo(&marks));
    }
}
