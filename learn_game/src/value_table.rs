use crate::board::Board;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

/// Board -> expected outcome, always from X's point of view.
#[derive(Clone, Debug, Default)]
pub struct ValueTable {
    values: HashMap<Board, f64>,
}

impl Deref for ValueTable {
    type Target = HashMap<Board, f64>;
    fn deref(&self) -> &Self::Target {
        &self.values
    }
}

impl DerefMut for ValueTable {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.values
    }
}

impl ValueTable {
    pub fn new() -> Self {
        ValueTable {
            values: HashMap::with_capacity(5500),
        }
    }

    /// Lookups never default: an absent board means the table was not built
    /// from the full state space.
    pub fn value(&self, board: &Board) -> Result<f64> {
        self.values
            .get(board)
            .copied()
            .ok_or(Error::MissingTableEntry {
                board: *board,
                position: None,
            })
    }

    pub fn value_mut(&mut self, board: &Board) -> Result<&mut f64> {
        self.values
            .get_mut(board)
            .ok_or(Error::MissingTableEntry {
                board: *board,
                position: None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_board_is_an_error() {
        let mut table = ValueTable::new();
        let opening = Board::empty().apply_move(4).unwrap();
        assert!(matches!(
            table.value(&opening),
            Err(Error::MissingTableEntry { position: None, .. })
        ));
        table.insert(opening, 0.5);
        *table.value_mut(&opening).unwrap() += 0.25;
        assert_eq!(table.value(&opening).unwrap(), 0.75);
    }
}
