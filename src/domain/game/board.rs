//! The 3x3 grid, its marks, and the coordinate labels players use.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Side length of the grid.
pub const BOARD_SIZE: usize = 3;

/// A player's mark on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    /// Returns the other mark.
    pub fn opponent(&self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mark::X => "X",
            Mark::O => "O",
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A cell position, addressed by labels `A1`..`C3`.
///
/// The letter selects the row and the digit selects the column, so `A1`
/// is the top-left cell and `C3` the bottom-right one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coordinate {
    row: u8,
    col: u8,
}

const LABELS: [[&str; BOARD_SIZE]; BOARD_SIZE] = [
    ["A1", "A2", "A3"],
    ["B1", "B2", "B3"],
    ["C1", "C2", "C3"],
];

impl Coordinate {
    /// All nine coordinates in ascending label order.
    pub const ALL: [Coordinate; 9] = [
        Coordinate::at(0, 0),
        Coordinate::at(0, 1),
        Coordinate::at(0, 2),
        Coordinate::at(1, 0),
        Coordinate::at(1, 1),
        Coordinate::at(1, 2),
        Coordinate::at(2, 0),
        Coordinate::at(2, 1),
        Coordinate::at(2, 2),
    ];

    const fn at(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    /// Creates a coordinate from grid indices, if they are on the board.
    pub fn new(row: usize, col: usize) -> Option<Self> {
        (row < BOARD_SIZE && col < BOARD_SIZE).then(|| Self::at(row as u8, col as u8))
    }

    /// Decodes a label such as `B2`.
    ///
    /// Only the nine exact uppercase labels are recognised; everything
    /// else is `None`.
    pub fn decode(label: &str) -> Option<Self> {
        let bytes = label.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let row = match bytes[0] {
            b'A' => 0,
            b'B' => 1,
            b'C' => 2,
            _ => return None,
        };
        let col = match bytes[1] {
            b'1' => 0,
            b'2' => 1,
            b'3' => 2,
            _ => return None,
        };
        Some(Self::at(row, col))
    }

    /// Returns the label for this coordinate.
    pub fn label(&self) -> &'static str {
        LABELS[self.row()][self.col()]
    }

    pub fn row(&self) -> usize {
        self.row as usize
    }

    pub fn col(&self) -> usize {
        self.col as usize
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Coordinate {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s).ok_or_else(|| {
            ValidationError::invalid_format("coordinate", format!("unknown cell '{}'", s))
        })
    }
}

/// The 3x3 grid of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Board {
    cells: [[Option<Mark>; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// Creates an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a board from explicit rows.
    pub fn from_rows(cells: [[Option<Mark>; BOARD_SIZE]; BOARD_SIZE]) -> Self {
        Self { cells }
    }

    /// Returns the mark at a coordinate.
    pub fn get(&self, at: Coordinate) -> Option<Mark> {
        self.cells[at.row()][at.col()]
    }

    pub fn is_empty_at(&self, at: Coordinate) -> bool {
        self.get(at).is_none()
    }

    /// Places a mark on an empty cell.
    ///
    /// Returns `false` and leaves the board untouched if the cell is
    /// already taken; cells never change once marked.
    pub fn place(&mut self, at: Coordinate, mark: Mark) -> bool {
        let cell = &mut self.cells[at.row()][at.col()];
        if cell.is_some() {
            return false;
        }
        *cell = Some(mark);
        true
    }

    /// Returns the rows of the grid.
    pub fn rows(&self) -> &[[Option<Mark>; BOARD_SIZE]; BOARD_SIZE] {
        &self.cells
    }

    /// Number of marked cells.
    pub fn marked_count(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_some()).count()
    }

    /// True when no cell is empty.
    pub fn is_full(&self) -> bool {
        self.marked_count() == BOARD_SIZE * BOARD_SIZE
    }
}
