use crate::board::{Board, Mark, Outcome};
use crate::error::Result;
use crate::players::Player;
use std::mem;

pub mod board;
pub mod config;
pub mod error;
pub mod monte_carlo;
pub mod players;
pub mod policy;
pub mod q_learning;
pub mod q_table;
pub mod states;
pub mod value_iteration;
pub mod value_table;

pub use config::{AgentConfig, LabConfig, Mode, TrainingConfig};
pub use error::Error;
pub use players::{Agent, MoveSource};

/// A single game from the empty board. X always moves first.
pub struct Game<'a> {
    pub board: Board,
    pub current_player: &'a mut dyn Player,
    pub other_player: &'a mut dyn Player,
}

impl<'a> Game<'a> {
    pub fn new(cross: &'a mut dyn Player, nought: &'a mut dyn Player) -> Self {
        Game {
            board: Board::empty(),
            current_player: cross,
            other_player: nought,
        }
    }

    pub fn swap_players(&mut self) {
        mem::swap(&mut self.current_player, &mut self.other_player);
    }

    /// Plays to the end, letting both players observe every move, and returns
    /// the final outcome.
    pub fn play(&mut self) -> Result<Outcome> {
        self.current_player.start_episode(&self.board)?;
        self.other_player.start_episode(&self.board)?;
        while !self.board.is_terminal()? {
            let mv = self.current_player.choose_move(&self.board)?;
            let successor = self.board.apply_move(mv)?;
            log::trace!(
                "{} plays {} -> {}",
                self.current_player.get_name(),
                mv,
                successor
            );
            self.current_player.observe(&self.board, mv, &successor)?;
            self.other_player.observe(&self.board, mv, &successor)?;
            self.board = successor;
            self.swap_players();
        }
        self.current_player.finish_episode()?;
        self.other_player.finish_episode()?;
        self.board.evaluate()
    }
}

pub fn play_game(cross: &mut dyn Player, nought: &mut dyn Player) -> Result<Outcome> {
    Game::new(cross, nought).play()
}

/// Outcome counts of a match between a first and a second player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MatchRecord {
    pub games: usize,
    pub ties: usize,
    pub first_wins: usize,
    pub second_wins: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchRates {
    pub tie_rate: f64,
    pub a_win_rate: f64,
    pub b_win_rate: f64,
}

impl MatchRecord {
    /// `first` is the mark the first player had in this game.
    pub fn record(&mut self, outcome: Outcome, first: Mark) {
        self.games += 1;
        match outcome.winner() {
            None => self.ties += 1,
            Some(winner) if winner == first => self.first_wins += 1,
            Some(_) => self.second_wins += 1,
        }
    }

    /// All zero when no games were played.
    pub fn rates(&self) -> MatchRates {
        if self.games == 0 {
            return MatchRates {
                tie_rate: 0.0,
                a_win_rate: 0.0,
                b_win_rate: 0.0,
            };
        }
        let games = self.games as f64;
        MatchRates {
            tie_rate: self.ties as f64 / games,
            a_win_rate: self.first_wins as f64 / games,
            b_win_rate: self.second_wins as f64 / games,
        }
    }
}

/// Plays `iterations` games, `a` taking X in even-numbered games and `b` in
/// odd-numbered ones. Learners keep learning as they play.
pub fn play_games(a: &mut dyn Player, b: &mut dyn Player, iterations: usize) -> Result<MatchRates> {
    let mut record = MatchRecord::default();
    for game in 0..iterations {
        let (outcome, a_mark) = if game % 2 == 0 {
            (play_game(&mut *a, &mut *b)?, Mark::Cross)
        } else {
            (play_game(&mut *b, &mut *a)?, Mark::Nought)
        };
        record.record(outcome, a_mark);
    }
    let rates = record.rates();
    log::info!(
        "{:<16} vs {:<16} games {:<8} ties {:.3} {:.3} / {:.3}",
        a.get_name(),
        b.get_name(),
        record.games,
        rates.tie_rate,
        rates.a_win_rate,
        rates.b_win_rate
    );
    Ok(rates)
}
