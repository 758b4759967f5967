//! Every-occurrence Monte Carlo control over a state-value table.

use crate::board::{Board, Outcome};
use crate::error::{Error, Result};
use crate::policy::epsilon_greedy;
use crate::value_table::ValueTable;
use rand::Rng;
use std::collections::HashMap;

const LOG_EVERY: usize = 10_000;

#[derive(Clone, Debug, Default)]
pub struct VisitCounts {
    counts: HashMap<Board, u64>,
}

impl VisitCounts {
    pub fn get(&self, board: &Board) -> u64 {
        self.counts.get(board).copied().unwrap_or(0)
    }
    fn increment(&mut self, board: &Board) {
        *self.counts.entry(*board).or_insert(0) += 1;
    }
    pub fn clear(&mut self) {
        self.counts.clear();
    }
    pub fn len(&self) -> usize {
        self.counts.len()
    }
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

pub struct MonteCarlo {
    values: ValueTable,
    visits: VisitCounts,
    trajectory: Vec<Board>,
    discount_rate: f64,
}

impl MonteCarlo {
    /// `values` must already hold every reachable board.
    pub fn new(values: ValueTable, discount_rate: f64) -> Self {
        MonteCarlo {
            values,
            visits: VisitCounts::default(),
            trajectory: Vec::with_capacity(10),
            discount_rate,
        }
    }

    pub fn values(&self) -> &ValueTable {
        &self.values
    }

    pub fn visits(&self) -> &VisitCounts {
        &self.visits
    }

    pub fn trajectory(&self) -> &[Board] {
        &self.trajectory
    }

    pub fn log_board(&mut self, board: Board) {
        self.trajectory.push(board);
    }

    /// Backward pass over the logged trajectory, then clears it.
    ///
    /// Each occurrence of a board moves its value toward the discounted return
    /// by `1 / (visits + 1)`. Repeated boards are not deduplicated, so this is
    /// not textbook first-visit Monte Carlo.
    pub fn backup(&mut self) -> Result<()> {
        let last = self.trajectory.last().ok_or(Error::EmptyTrajectory)?;
        let mut discounted = last.evaluate()?.reward();
        for board in self.trajectory.iter().rev() {
            let visits = self.visits.get(board) as f64;
            let value = self.values.value_mut(board)?;
            *value += (discounted - *value) / (visits + 1.0);
            self.visits.increment(board);
            discounted *= self.discount_rate;
        }
        self.trajectory.clear();
        Ok(())
    }

    /// One self-play game from the empty board, logging every board visited.
    pub fn play_episode<R>(&mut self, epsilon: f64, rng: &mut R) -> Result<Outcome>
    where
        R: Rng + ?Sized,
    {
        let mut board = Board::empty();
        self.log_board(board);
        while !board.is_terminal()? {
            let mv = epsilon_greedy(&board, epsilon, &self.values, rng)?;
            board = board.apply_move(mv)?;
            self.log_board(board);
        }
        board.evaluate()
    }

    /// A training run: fresh visit counts, then `episodes` rounds of
    /// self-play followed by a backup.
    pub fn train<R>(&mut self, episodes: usize, epsilon: f64, rng: &mut R) -> Result<()>
    where
        R: Rng + ?Sized,
    {
        self.visits.clear();
        self.trajectory.clear();
        let mut draws = 0usize;
        for episode in 1..=episodes {
            if self.play_episode(epsilon, rng)? == Outcome::NoWin {
                draws += 1;
            }
            self.backup()?;
            if episode % LOG_EVERY == 0 {
                log::info!(
                    "{:<32}{:<16}{:<16}",
                    "monte carlo episode",
                    episode,
                    format!("draws {:.3}", draws as f64 / episode as f64)
                );
            }
        }
        log::debug!("monte carlo visited {} boards", self.visits.len());
        Ok(())
    }
}
