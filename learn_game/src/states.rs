//! Breadth-first enumeration of every board reachable from the empty one.

use crate::board::Board;
use crate::error::Result;
use crate::value_table::ValueTable;
use std::collections::HashMap;

/// Every reachable board, with terminal rewards seeded into its value table.
#[derive(Clone, Debug)]
pub struct StateSpace {
    /// Discovery order. Boards appear ply by ply, so a board's successors
    /// always come after it.
    boards: Vec<Board>,
    rewards: ValueTable,
}

impl StateSpace {
    pub fn enumerate() -> Result<Self> {
        let start = Board::empty();
        let mut rewards = ValueTable::new();
        let mut boards = vec![start];
        rewards.insert(start, start.evaluate()?.reward());

        let mut frontier: HashMap<Board, Vec<usize>> = HashMap::new();
        frontier.insert(start, start.legal_moves()?);
        let mut ply = 0usize;
        while !frontier.is_empty() {
            let mut next: HashMap<Board, Vec<usize>> = HashMap::new();
            for (board, moves) in &frontier {
                for &mv in moves {
                    let successor = board.apply_move(mv)?;
                    let outcome = successor.evaluate()?;
                    if rewards.insert(successor, outcome.reward()).is_none() {
                        boards.push(successor);
                    }
                    let successor_moves = successor.legal_moves()?;
                    if !successor_moves.is_empty() {
                        next.insert(successor, successor_moves);
                    }
                }
            }
            ply += 1;
            log::trace!("ply {} frontier {}", ply, next.len());
            frontier = next;
        }
        log::info!("{:<32}{:<32}", "enumerated reachable boards", boards.len());
        Ok(StateSpace { boards, rewards })
    }

    pub fn len(&self) -> usize {
        self.boards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }

    pub fn boards(&self) -> &[Board] {
        &self.boards
    }

    pub fn rewards(&self) -> &ValueTable {
        &self.rewards
    }

    pub fn into_parts(self) -> (Vec<Board>, ValueTable) {
        (self.boards, self.rewards)
    }

    pub fn into_values(self) -> ValueTable {
        self.rewards
    }
}
