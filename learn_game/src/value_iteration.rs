//! Dynamic-programming solver over the full state space.

use crate::board::Board;
use crate::error::Result;
use crate::policy::best_value;
use crate::states::StateSpace;
use crate::value_table::ValueTable;

pub struct ValueIteration {
    /// Deepest boards first, so one in-place sweep already sees updated
    /// successor values.
    order: Vec<Board>,
    values: ValueTable,
    discount_rate: f64,
    sweeps: usize,
}

impl ValueIteration {
    pub fn new(space: StateSpace, discount_rate: f64) -> Self {
        let (mut order, values) = space.into_parts();
        order.reverse();
        ValueIteration {
            order,
            values,
            discount_rate,
            sweeps: 0,
        }
    }

    /// One in-place Bellman sweep. Returns whether any value changed.
    ///
    /// Terminal boards have no legal moves and keep their reward.
    pub fn sweep(&mut self) -> Result<bool> {
        let mut dirty = false;
        let mut updates = 0usize;
        for board in &self.order {
            let Some(best) = best_value(board, &self.values)? else {
                continue;
            };
            let updated = board.evaluate()?.reward() + self.discount_rate * best;
            let value = self.values.value_mut(board)?;
            if updated != *value {
                *value = updated;
                dirty = true;
                updates += 1;
            }
        }
        self.sweeps += 1;
        log::debug!("{:<32}{:<16}{:<16}", "value iteration sweep", self.sweeps, updates);
        Ok(dirty)
    }

    /// Sweeps until a sweep changes nothing and returns how many it took.
    pub fn solve(&mut self) -> Result<usize> {
        while self.sweep()? {}
        log::info!("{:<32}{:<32}", "value iteration converged", self.sweeps);
        Ok(self.sweeps)
    }

    pub fn sweeps(&self) -> usize {
        self.sweeps
    }

    pub fn values(&self) -> &ValueTable {
        &self.values
    }

    pub fn into_values(self) -> ValueTable {
        self.values
    }
}

/// Enumerates the state space and solves it.
pub fn solve(discount_rate: f64) -> Result<ValueTable> {
    let mut solver = ValueIteration::new(StateSpace::enumerate()?, discount_rate);
    solver.solve()?;
    Ok(solver.into_values())
}
