//! Tabular Q-learning with one table shared by both sides.

use crate::board::{Board, Outcome};
use crate::error::Result;
use crate::policy::epsilon_greedy;
use crate::q_table::QTable;
use rand::Rng;

const LOG_EVERY: usize = 10_000;

pub struct QLearning {
    table: QTable,
    step_size: f64,
    discount_rate: f64,
}

impl QLearning {
    pub fn new(table: QTable, step_size: f64, discount_rate: f64) -> Self {
        QLearning {
            table,
            step_size,
            discount_rate,
        }
    }

    pub fn table(&self) -> &QTable {
        &self.table
    }

    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    pub fn set_step_size(&mut self, step_size: f64) {
        self.step_size = step_size;
    }

    /// Applies the TD backup for a single move.
    pub fn learn(&mut self, board: &Board, mv: usize, successor: &Board) -> Result<f64> {
        self.table
            .update_q_table(board, mv, successor, self.step_size, self.discount_rate)
    }

    /// One self-play game, updating after every move.
    pub fn play_episode<R>(&mut self, epsilon: f64, rng: &mut R) -> Result<Outcome>
    where
        R: Rng + ?Sized,
    {
        let mut board = Board::empty();
        while !board.is_terminal()? {
            let mv = epsilon_greedy(&board, epsilon, &self.table, rng)?;
            let successor = board.apply_move(mv)?;
            self.learn(&board, mv, &successor)?;
            log::trace!("{} --{}--> {}", board, mv, successor);
            board = successor;
        }
        board.evaluate()
    }

    pub fn train<R>(&mut self, episodes: usize, epsilon: f64, rng: &mut R) -> Result<()>
    where
        R: Rng + ?Sized,
    {
        let mut draws = 0usize;
        for episode in 1..=episodes {
            if self.play_episode(epsilon, rng)? == Outcome::NoWin {
                draws += 1;
            }
            if episode % LOG_EVERY == 0 {
                log::info!(
                    "{:<32}{:<16}{:<16}",
                    "q-learning episode",
                    episode,
                    format!("draws {:.3}", draws as f64 / episode as f64)
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::states::StateSpace;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn learner(step_size: f64) -> QLearning {
        let space = StateSpace::enumerate().unwrap();
        QLearning::new(QTable::from_state_space(&space).unwrap(), step_size, 1.0)
    }

    #[test]
    fn winning_move_keeps_its_value() {
        let mut q = learner(0.5);
        let board = Board::from_cells([1, 1, 0, -1, -1, 0, 0, 0, 0]).unwrap();
        let successor = board.apply_move(2).unwrap();
        for _ in 0..10 {
            assert_eq!(q.learn(&board, 2, &successor).unwrap(), 1.0);
        }
    }

    #[test]
    fn losing_reply_propagates_back() {
        let mut q = learner(0.5);
        // After X plays 8 instead of winning, O completes the middle row.
        let board = Board::from_cells([1, 1, 0, -1, -1, 0, 0, 0, 0]).unwrap();
        let blunder = board.apply_move(8).unwrap();
        assert_eq!(q.learn(&board, 8, &blunder).unwrap(), -0.5);
        assert_eq!(q.learn(&board, 8, &blunder).unwrap(), -0.75);
    }

    #[test]
    fn self_play_stays_inside_the_table() {
        let mut q = learner(0.2);
        let mut rng = StdRng::seed_from_u64(21);
        q.train(200, 0.3, &mut rng).unwrap();
        let opening = q.table().get(&Board::empty()).unwrap();
        assert_eq!(opening.len(), 9);
        assert!(opening.values().all(|value| (-1.0..=1.0).contains(value)));
    }
}
