//! Win, draw, and legal-move rules over a [`Board`].
//!
//! Pure functions: they read the board they are handed and never touch
//! any other game state.

use super::board::{Board, Coordinate, Mark};

/// The eight winning lines, scanned rows first, then columns, then diagonals.
const LINES: [[(usize, usize); 3]; 8] = [
    // Rows
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    // Columns
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    // Diagonals
    [(0, 0), (1, 1), (2, 2)],
    [(0, 2), (1, 1), (2, 0)],
];

/// Returns the mark completing a line, if any.
///
/// When several lines are complete (only possible on boards that no legal
/// game reaches) the first one in scan order wins.
pub fn detect_winner(board: &Board) -> Option<Mark> {
    let rows = board.rows();
    LINES.iter().find_map(|[a, b, c]| {
        let first = rows[a.0][a.1]?;
        (rows[b.0][b.1] == Some(first) && rows[c.0][c.1] == Some(first)).then_some(first)
    })
}

/// True iff every cell is marked.
///
/// Does not look for a winner; check [`detect_winner`] first.
pub fn is_draw(board: &Board) -> bool {
    board.is_full()
}

/// Empty cells in ascending label order, or nothing once the game is over.
pub fn open_coordinates(board: &Board, finished: bool) -> Vec<Coordinate> {
    if finished {
        return Vec::new();
    }
    Coordinate::ALL
        .into_iter()
        .filter(|c| board.is_empty_at(*c))
        .collect()
}
