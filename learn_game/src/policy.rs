//! Epsilon-greedy move selection over state values or state-action values.

use crate::board::Board;
use crate::error::{Error, Result};
use crate::value_table::ValueTable;
use rand::prelude::SliceRandom;
use rand::Rng;

/// Anything that can score a move from a board, from X's point of view.
pub trait ActionValues {
    fn action_value(&self, board: &Board, mv: usize) -> Result<f64>;
}

/// State values score a move by the board it leads to.
impl ActionValues for ValueTable {
    fn action_value(&self, board: &Board, mv: usize) -> Result<f64> {
        self.value(&board.apply_move(mv)?)
    }
}

/// The move the side to move likes best, with its value signed back to X's
/// point of view. Ties go to the lowest index. `None` on terminal boards.
pub fn best_move<T>(board: &Board, table: &T) -> Result<Option<(usize, f64)>>
where
    T: ActionValues + ?Sized,
{
    let turn = board.turn_to_move().sign();
    let mut best: Option<(usize, f64)> = None;
    for mv in board.legal_moves()? {
        let own = turn * table.action_value(board, mv)?;
        if best.map_or(true, |(_, value)| own > value) {
            best = Some((mv, own));
        }
    }
    Ok(best.map(|(mv, own)| (mv, turn * own)))
}

/// `turn * max(turn * value)` over the legal moves, or `None` on terminal boards.
pub fn best_value<T>(board: &Board, table: &T) -> Result<Option<f64>>
where
    T: ActionValues + ?Sized,
{
    Ok(best_move(board, table)?.map(|(_, value)| value))
}

pub fn greedy_move<T>(board: &Board, table: &T) -> Result<usize>
where
    T: ActionValues + ?Sized,
{
    best_move(board, table)?
        .map(|(mv, _)| mv)
        .ok_or(Error::NoLegalMoves { board: *board })
}

/// With probability `epsilon` a uniformly random legal move, otherwise the
/// greedy one.
pub fn epsilon_greedy<T, R>(board: &Board, epsilon: f64, table: &T, rng: &mut R) -> Result<usize>
where
    T: ActionValues + ?Sized,
    R: Rng + ?Sized,
{
    let moves = board.legal_moves()?;
    if moves.is_empty() {
        return Err(Error::NoLegalMoves { board: *board });
    }
    if rng.gen_range(0.0..1.0) < epsilon {
        return moves
            .choose(rng)
            .copied()
            .ok_or(Error::NoLegalMoves { board: *board });
    }
    greedy_move(board, table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::states::StateSpace;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rewards() -> ValueTable {
        StateSpace::enumerate().unwrap().into_values()
    }

    #[test]
    fn ties_go_to_the_lowest_index() {
        let values = rewards();
        assert_eq!(greedy_move(&Board::empty(), &values).unwrap(), 0);
    }

    #[test]
    fn takes_the_immediate_win_for_either_side() {
        let values = rewards();
        // X: 0 1 . / O O . / . . .  X completes the top row.
        let x_to_move = Board::from_cells([1, 1, 0, -1, -1, 0, 0, 0, 0]).unwrap();
        assert_eq!(greedy_move(&x_to_move, &values).unwrap(), 2);
        assert_eq!(best_value(&x_to_move, &values).unwrap(), Some(1.0));
        // O to move completes the middle row.
        let o_to_move = Board::from_cells([1, 1, 0, -1, -1, 0, 1, 0, 0]).unwrap();
        assert_eq!(greedy_move(&o_to_move, &values).unwrap(), 5);
        assert_eq!(best_value(&o_to_move, &values).unwrap(), Some(-1.0));
    }

    #[test]
    fn terminal_boards_have_no_moves() {
        let values = rewards();
        let won = Board::from_cells([1, 1, 1, -1, -1, 0, 0, 0, 0]).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        assert!(matches!(
            epsilon_greedy(&won, 0.5, &values, &mut rng),
            Err(Error::NoLegalMoves { .. })
        ));
        assert_eq!(best_value(&won, &values).unwrap(), None);
    }

    #[test]
    fn full_exploration_stays_legal() {
        let values = rewards();
        let board = Board::from_cells([1, -1, 0, 0, 1, 0, 0, 0, -1]).unwrap();
        let legal = board.legal_moves().unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            let mv = epsilon_greedy(&board, 1.0, &values, &mut rng).unwrap();
            assert!(legal.contains(&mv));
            seen.insert(mv);
        }
        assert_eq!(seen.len(), legal.len());
    }

    #[test]
    fn empty_table_is_a_configuration_error() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(matches!(
            epsilon_greedy(&Board::empty(), 0.0, &ValueTable::new(), &mut rng),
            Err(Error::MissingTableEntry { .. })
        ));
    }
}
