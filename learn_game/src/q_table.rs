use crate::board::Board;
use crate::error::{Error, Result};
use crate::policy::{best_value, ActionValues};
use crate::states::StateSpace;
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

/// Action values of one board, keyed by cell index.
#[derive(Clone, Debug, Default)]
pub struct Moves {
    pub moves: HashMap<usize, f64>,
}

/// (board, move) -> estimate from X's point of view. Both sides share it.
#[derive(Clone, Debug, Default)]
pub struct QTable {
    qtable: HashMap<Board, Moves>,
}

impl Deref for Moves {
    type Target = HashMap<usize, f64>;
    fn deref(&self) -> &<Self as Deref>::Target {
        &self.moves
    }
}
impl DerefMut for Moves {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.moves
    }
}

impl Deref for QTable {
    type Target = HashMap<Board, Moves>;
    fn deref(&self) -> &<Self as Deref>::Target {
        &self.qtable
    }
}

impl DerefMut for QTable {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.qtable
    }
}

impl From<Vec<(usize, f64)>> for Moves {
    fn from(value: Vec<(usize, f64)>) -> Self {
        let mut map: Moves = Moves {
            moves: HashMap::with_capacity(9),
        };
        map.extend(value);
        map
    }
}

impl QTable {
    pub fn new() -> Self {
        QTable {
            qtable: HashMap::with_capacity(5500),
        }
    }

    /// Seeds every reachable (board, move) with the reward of the board the
    /// move leads to. Terminal boards get an empty move set.
    pub fn from_state_space(space: &StateSpace) -> Result<Self> {
        let mut q = QTable::new();
        for board in space.boards() {
            let seeded = board
                .legal_moves()?
                .into_iter()
                .map(|mv| Ok((mv, space.rewards().action_value(board, mv)?)))
                .collect::<Result<Vec<(usize, f64)>>>()?;
            q.insert(*board, Moves::from(seeded));
        }
        log::info!("{:<32}{:<32}", "seeded state-action values", q.state_actions());
        Ok(q)
    }

    pub fn q(&self, board: &Board, mv: usize) -> Result<f64> {
        self.get(board)
            .and_then(|moves| moves.get(&mv))
            .copied()
            .ok_or(Error::MissingTableEntry {
                board: *board,
                position: Some(mv),
            })
    }

    pub fn q_mut(&mut self, board: &Board, mv: usize) -> Result<&mut f64> {
        self.get_mut(board)
            .and_then(|moves| moves.get_mut(&mv))
            .ok_or(Error::MissingTableEntry {
                board: *board,
                position: Some(mv),
            })
    }

    pub fn state_actions(&self) -> usize {
        self.values().map(|moves| moves.len()).sum()
    }

    /// One-step Q-learning backup for `board --mv--> successor`:
    ///
    /// `Q(b, m) += step_size * (r + discount_rate * best_next - Q(b, m))`
    ///
    /// where `best_next` is the signed max over the successor's moves from the
    /// point of view of whoever moves there, and 0 when the successor is
    /// terminal. Returns the updated estimate.
    pub fn update_q_table(
        &mut self,
        board: &Board,
        mv: usize,
        successor: &Board,
        step_size: f64,
        discount_rate: f64,
    ) -> Result<f64> {
        let reward = successor.evaluate()?.reward();
        let best_next = best_value(successor, &*self)?.unwrap_or(0.0);
        let target = reward + discount_rate * best_next;
        let value = self.q_mut(board, mv)?;
        *value += step_size * (target - *value);
        Ok(*value)
    }
}

impl ActionValues for QTable {
    fn action_value(&self, board: &Board, mv: usize) -> Result<f64> {
        self.q(board, mv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn seeded() -> QTable {
        QTable::from_state_space(&StateSpace::enumerate().unwrap()).unwrap()
    }

    #[test]
    fn is_q_table_seeded() {
        let q = seeded();
        assert_eq!(q.len(), 5478);
        let empty = q.get(&Board::empty()).unwrap();
        assert_eq!(empty.len(), 9);
        assert!(empty.values().all(|&value| value == 0.0));
        let x_to_move = Board::from_cells([1, 1, 0, -1, -1, 0, 0, 0, 0]).unwrap();
        assert_eq!(q.q(&x_to_move, 2).unwrap(), 1.0);
        assert_eq!(q.q(&x_to_move, 5).unwrap(), 0.0);
        let won = Board::from_cells([1, 1, 1, -1, -1, 0, 0, 0, 0]).unwrap();
        assert!(q.get(&won).unwrap().is_empty());
    }

    #[test]
    fn is_update_working() {
        let mut q = seeded();
        let board = Board::from_cells([1, 1, 0, -1, -1, 0, 0, 0, 0]).unwrap();
        *q.q_mut(&board, 2).unwrap() = 0.0;
        let successor = board.apply_move(2).unwrap();
        let updated = q.update_q_table(&board, 2, &successor, 0.5, 1.0).unwrap();
        assert_eq!(updated, 0.5);
        assert_eq!(q.q(&board, 2).unwrap(), 0.5);

        // O answers a quiet X move; the successor's best for O is -1.
        let quiet = board.apply_move(6).unwrap();
        assert_eq!(quiet.turn_to_move(), crate::board::Mark::Nought);
        let updated = q.update_q_table(&board, 6, &quiet, 0.25, 0.9).unwrap();
        assert!((updated - 0.25 * 0.9 * -1.0).abs() < 1e-12);
    }

    #[test]
    fn missing_pairs_are_errors() {
        let mut q = QTable::new();
        let board = Board::empty();
        let successor = board.apply_move(4).unwrap();
        assert!(matches!(
            q.update_q_table(&board, 4, &successor, 0.1, 1.0),
            Err(Error::MissingTableEntry { .. })
        ));
        assert!(matches!(
            q.q(&board, 4),
            Err(Error::MissingTableEntry { position: Some(4), .. })
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_update_contracts_toward_target(
            start in -5.0f64..5.0,
            step_size in 0.01f64..0.99,
            steps in 1usize..20,
        ) {
            let mut q = seeded();
            let board = Board::from_cells([1, 1, 0, -1, -1, 0, 0, 0, 0]).unwrap();
            let successor = board.apply_move(7).unwrap();
            let target = successor.evaluate().unwrap().reward()
                + best_value(&successor, &q).unwrap().unwrap();
            *q.q_mut(&board, 7).unwrap() = start;
            let mut gap = (start - target).abs();
            for _ in 0..steps {
                let updated = q.update_q_table(&board, 7, &successor, step_size, 1.0).unwrap();
                let next_gap = (updated - target).abs();
                if gap > 1e-9 {
                    prop_assert!(next_gap < gap);
                }
                gap = next_gap;
            }
        }
    }
}
