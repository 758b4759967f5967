use crate::error::{Error, Result};
use ndarray::prelude::*;
use std::fmt;
use std::hash::{Hash, Hasher};

pub const CELLS: usize = 9;

/// The side a cell belongs to. The discriminant is the cell value.
#[repr(i8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Mark {
    Cross = 1,
    Nought = -1,
}

impl Mark {
    pub fn other(self) -> Self {
        match self {
            Self::Cross => Mark::Nought,
            Self::Nought => Mark::Cross,
        }
    }
    pub fn value(self) -> i8 {
        self as i8
    }
    /// +1.0 for X, -1.0 for O. Multiplying a value by this turns it into the
    /// mover's own point of view.
    pub fn sign(self) -> f64 {
        f64::from(self.value())
    }
    pub fn as_char(self) -> char {
        match self {
            Self::Cross => 'X',
            Self::Nought => 'O',
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Outcome {
    NoWin,
    WinX,
    WinO,
}

impl Outcome {
    /// Signed terminal reward from X's point of view.
    pub fn reward(self) -> f64 {
        match self {
            Self::NoWin => 0.0,
            Self::WinX => 1.0,
            Self::WinO => -1.0,
        }
    }
    pub fn winner(self) -> Option<Mark> {
        match self {
            Self::NoWin => None,
            Self::WinX => Some(Mark::Cross),
            Self::WinO => Some(Mark::Nought),
        }
    }
}

/// A 3x3 position, cells indexed row-major:
///
/// ```text
///  0 | 1 | 2
///  3 | 4 | 5
///  6 | 7 | 8
/// ```
///
/// Stored as two occupancy masks. Equality is structural and tables hash the
/// packed 18-bit `key`, which is distinct for distinct boards.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Board {
    crosses: u16,
    noughts: u16,
}

impl Board {
    pub const fn empty() -> Self {
        Board {
            crosses: 0,
            noughts: 0,
        }
    }

    pub fn from_cells(cells: [i8; CELLS]) -> Result<Self> {
        cells
            .iter()
            .enumerate()
            .try_fold(Board::empty(), |board, (position, &value)| {
                let bit = 1u16 << position;
                match value {
                    0 => Ok(board),
                    1 => Ok(Board {
                        crosses: board.crosses | bit,
                        ..board
                    }),
                    -1 => Ok(Board {
                        noughts: board.noughts | bit,
                        ..board
                    }),
                    value => Err(Error::InvalidCell { position, value }),
                }
            })
    }

    pub fn cell(&self, index: usize) -> i8 {
        if (self.crosses >> index) & 1 == 1 {
            Mark::Cross.value()
        } else if (self.noughts >> index) & 1 == 1 {
            Mark::Nought.value()
        } else {
            0
        }
    }

    /// Read-only snapshot of the nine cell values.
    pub fn cells(&self) -> [i8; CELLS] {
        std::array::from_fn(|index| self.cell(index))
    }

    /// X occupancy in the low nine bits, O occupancy in the next nine.
    pub fn key(&self) -> u32 {
        u32::from(self.crosses) | (u32::from(self.noughts) << CELLS)
    }

    pub fn is_vacant(&self, index: usize) -> bool {
        index < CELLS && ((self.crosses | self.noughts) >> index) & 1 == 0
    }

    pub fn occupied(&self) -> usize {
        (self.crosses | self.noughts).count_ones() as usize
    }

    pub fn is_full(&self) -> bool {
        self.occupied() == CELLS
    }

    /// Sums every row, column and diagonal; +3 is a win for X, -3 for O.
    pub fn evaluate(&self) -> Result<Outcome> {
        let cells = self.cells();
        let grid: Array2<i8> = Array2::from_shape_fn((3, 3), |(r, c)| cells[3 * r + c]);
        let lines: Vec<i8> = grid
            .rows()
            .into_iter()
            .map(|row| row.sum())
            .chain(grid.columns().into_iter().map(|column| column.sum()))
            .chain([grid.diag().sum(), grid.slice(s![.., ..;-1]).diag().sum()])
            .collect();
        let x_wins = lines.contains(&3);
        let o_wins = lines.contains(&-3);
        match (x_wins, o_wins) {
            (true, true) => Err(Error::InvalidBoard { board: *self }),
            (true, false) => Ok(Outcome::WinX),
            (false, true) => Ok(Outcome::WinO),
            (false, false) => Ok(Outcome::NoWin),
        }
    }

    /// X always opens, so whoever has placed fewer marks moves next.
    pub fn turn_to_move(&self) -> Mark {
        let balance = self.crosses.count_ones() as i32 - self.noughts.count_ones() as i32;
        if balance > 0 {
            Mark::Nought
        } else {
            Mark::Cross
        }
    }

    /// Vacant cells in ascending order, or nothing once somebody has won.
    pub fn legal_moves(&self) -> Result<Vec<usize>> {
        if self.evaluate()? != Outcome::NoWin {
            return Ok(Vec::new());
        }
        Ok((0..CELLS).filter(|&index| self.is_vacant(index)).collect())
    }

    pub fn is_terminal(&self) -> Result<bool> {
        Ok(self.evaluate()? != Outcome::NoWin || self.is_full())
    }

    /// Places the mark of the side to move at `index` and returns the new board.
    pub fn apply_move(&self, index: usize) -> Result<Board> {
        if index >= CELLS {
            return Err(Error::IllegalMove {
                board: *self,
                position: index,
            });
        }
        if self.is_terminal()? {
            return Err(Error::NoLegalMoves { board: *self });
        }
        if !self.is_vacant(index) {
            return Err(Error::IllegalMove {
                board: *self,
                position: index,
            });
        }
        let bit = 1u16 << index;
        Ok(match self.turn_to_move() {
            Mark::Cross => Board {
                crosses: self.crosses | bit,
                ..*self
            },
            Mark::Nought => Board {
                noughts: self.noughts | bit,
                ..*self
            },
        })
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let state: String = self
            .cells()
            .iter()
            .map(|&value| match value {
                1 => Mark::Cross.as_char(),
                -1 => Mark::Nought.as_char(),
                _ => '-',
            })
            .collect();
        write!(f, "{}", state)
    }
}

impl Hash for Board {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.key());
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Board({})", self)
    }
}
