use crate::board::Board;
use crate::config::{validate_epsilon, validate_step_size, AgentConfig, Mode};
use crate::error::{Error, Result};
use crate::monte_carlo::MonteCarlo;
use crate::policy::epsilon_greedy;
use crate::q_learning::QLearning;
use crate::q_table::QTable;
use crate::states::StateSpace;
use crate::value_iteration;
use crate::value_table::ValueTable;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Something that picks moves in a game and may learn from it.
///
/// The match runner calls `start_episode` once per game, `observe` after every
/// move by either side, and `finish_episode` once the game is over.
pub trait Player {
    fn get_name(&self) -> &str;
    fn choose_move(&mut self, board: &Board) -> Result<usize>;
    fn start_episode(&mut self, _board: &Board) -> Result<()> {
        Ok(())
    }
    fn observe(&mut self, _board: &Board, _mv: usize, _successor: &Board) -> Result<()> {
        Ok(())
    }
    fn finish_episode(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Where an external agent gets its moves, e.g. a person at a terminal.
pub trait MoveSource {
    fn request_move(&mut self, board: &Board, legal_moves: &[usize]) -> Result<usize>;
}

fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Plays greedily over solved values. Learns nothing during play.
pub struct ValueIterationPlayer {
    values: ValueTable,
    epsilon: f64,
    rng: StdRng,
}

impl ValueIterationPlayer {
    pub fn new(values: ValueTable, epsilon: f64, rng: StdRng) -> Self {
        ValueIterationPlayer {
            values,
            epsilon,
            rng,
        }
    }
    pub fn values(&self) -> &ValueTable {
        &self.values
    }
}

impl Player for ValueIterationPlayer {
    fn get_name(&self) -> &str {
        "value-iteration"
    }
    fn choose_move(&mut self, board: &Board) -> Result<usize> {
        epsilon_greedy(board, self.epsilon, &self.values, &mut self.rng)
    }
}

/// Logs every board of a game and backs the outcome up when it ends.
pub struct MonteCarloPlayer {
    learner: MonteCarlo,
    epsilon: f64,
    rng: StdRng,
}

impl MonteCarloPlayer {
    pub fn new(learner: MonteCarlo, epsilon: f64, rng: StdRng) -> Self {
        MonteCarloPlayer {
            learner,
            epsilon,
            rng,
        }
    }
    pub fn learner(&self) -> &MonteCarlo {
        &self.learner
    }
    pub fn train(&mut self, episodes: usize) -> Result<()> {
        self.learner.train(episodes, self.epsilon, &mut self.rng)
    }
}

impl Player for MonteCarloPlayer {
    fn get_name(&self) -> &str {
        "monte-carlo"
    }
    fn choose_move(&mut self, board: &Board) -> Result<usize> {
        epsilon_greedy(board, self.epsilon, self.learner.values(), &mut self.rng)
    }
    fn start_episode(&mut self, board: &Board) -> Result<()> {
        self.learner.log_board(*board);
        Ok(())
    }
    fn observe(&mut self, _board: &Board, _mv: usize, successor: &Board) -> Result<()> {
        self.learner.log_board(*successor);
        Ok(())
    }
    fn finish_episode(&mut self) -> Result<()> {
        self.learner.backup()
    }
}

/// Updates its Q-table after every move it sees.
pub struct QLearningPlayer {
    learner: QLearning,
    epsilon: f64,
    rng: StdRng,
}

impl QLearningPlayer {
    pub fn new(learner: QLearning, epsilon: f64, rng: StdRng) -> Self {
        QLearningPlayer {
            learner,
            epsilon,
            rng,
        }
    }
    pub fn learner(&self) -> &QLearning {
        &self.learner
    }
    pub fn train(&mut self, episodes: usize) -> Result<()> {
        self.learner.train(episodes, self.epsilon, &mut self.rng)
    }
}

impl Player for QLearningPlayer {
    fn get_name(&self) -> &str {
        "q-learning"
    }
    fn choose_move(&mut self, board: &Board) -> Result<usize> {
        epsilon_greedy(board, self.epsilon, self.learner.table(), &mut self.rng)
    }
    fn observe(&mut self, board: &Board, mv: usize, successor: &Board) -> Result<()> {
        self.learner.learn(board, mv, successor).map(|_| ())
    }
}

/// Forwards every decision to a `MoveSource` and checks the answer.
pub struct ExternalPlayer {
    source: Box<dyn MoveSource>,
}

impl ExternalPlayer {
    pub fn new(source: Box<dyn MoveSource>) -> Self {
        ExternalPlayer { source }
    }
}

impl Player for ExternalPlayer {
    fn get_name(&self) -> &str {
        "external"
    }
    fn choose_move(&mut self, board: &Board) -> Result<usize> {
        let legal_moves = board.legal_moves()?;
        if legal_moves.is_empty() {
            return Err(Error::NoLegalMoves { board: *board });
        }
        let mv = self.source.request_move(board, &legal_moves)?;
        if !legal_moves.contains(&mv) {
            return Err(Error::IllegalMove {
                board: *board,
                position: mv,
            });
        }
        Ok(mv)
    }
}

/// One agent, tagged by how it decides and learns. Each agent owns its tables.
pub enum Agent {
    ValueIteration(ValueIterationPlayer),
    MonteCarlo(MonteCarloPlayer),
    QLearning(QLearningPlayer),
    ExternalInput(ExternalPlayer),
}

impl Agent {
    /// Builds the agent for `config.mode`. Value iteration is solved here; the
    /// online learners start from the seeded terminal rewards.
    pub fn new(config: &AgentConfig) -> Result<Self> {
        config.validate()?;
        let rng = rng_from(config.seed);
        match config.mode {
            Mode::ValueIteration => {
                let values = value_iteration::solve(config.discount_rate)?;
                Ok(Agent::ValueIteration(ValueIterationPlayer::new(
                    values,
                    config.epsilon,
                    rng,
                )))
            }
            Mode::MonteCarlo => {
                let values = StateSpace::enumerate()?.into_values();
                let learner = MonteCarlo::new(values, config.discount_rate);
                Ok(Agent::MonteCarlo(MonteCarloPlayer::new(
                    learner,
                    config.epsilon,
                    rng,
                )))
            }
            Mode::QLearning => {
                let table = QTable::from_state_space(&StateSpace::enumerate()?)?;
                let learner = QLearning::new(table, config.step_size, config.discount_rate);
                Ok(Agent::QLearning(QLearningPlayer::new(
                    learner,
                    config.epsilon,
                    rng,
                )))
            }
            Mode::ExternalInput => Err(Error::MissingMoveSource),
        }
    }

    pub fn external(source: Box<dyn MoveSource>) -> Self {
        Agent::ExternalInput(ExternalPlayer::new(source))
    }

    pub fn mode(&self) -> Mode {
        match self {
            Agent::ValueIteration(_) => Mode::ValueIteration,
            Agent::MonteCarlo(_) => Mode::MonteCarlo,
            Agent::QLearning(_) => Mode::QLearning,
            Agent::ExternalInput(_) => Mode::ExternalInput,
        }
    }

    /// Ignored by external agents, which never explore.
    pub fn set_epsilon(&mut self, epsilon: f64) -> Result<()> {
        validate_epsilon(epsilon)?;
        match self {
            Agent::ValueIteration(player) => player.epsilon = epsilon,
            Agent::MonteCarlo(player) => player.epsilon = epsilon,
            Agent::QLearning(player) => player.epsilon = epsilon,
            Agent::ExternalInput(_) => {}
        }
        Ok(())
    }

    /// Only Q-learning has a step size; everyone else ignores it.
    pub fn set_step_size(&mut self, step_size: f64) -> Result<()> {
        validate_step_size(step_size)?;
        if let Agent::QLearning(player) = self {
            player.learner.set_step_size(step_size);
        }
        Ok(())
    }

    /// Self-play training. Value iteration is already optimal, so it skips.
    pub fn train(&mut self, episodes: usize) -> Result<()> {
        match self {
            Agent::ValueIteration(_) => Ok(()),
            Agent::MonteCarlo(player) => player.train(episodes),
            Agent::QLearning(player) => player.train(episodes),
            Agent::ExternalInput(_) => Err(Error::InvalidConfiguration {
                message: "external input agents cannot self-train".to_owned(),
            }),
        }
    }

    fn as_player(&self) -> &dyn Player {
        match self {
            Agent::ValueIteration(player) => player,
            Agent::MonteCarlo(player) => player,
            Agent::QLearning(player) => player,
            Agent::ExternalInput(player) => player,
        }
    }

    fn as_player_mut(&mut self) -> &mut dyn Player {
        match self {
            Agent::ValueIteration(player) => player,
            Agent::MonteCarlo(player) => player,
            Agent::QLearning(player) => player,
            Agent::ExternalInput(player) => player,
        }
    }
}

impl Player for Agent {
    fn get_name(&self) -> &str {
        self.as_player().get_name()
    }
    fn choose_move(&mut self, board: &Board) -> Result<usize> {
        self.as_player_mut().choose_move(board)
    }
    fn start_episode(&mut self, board: &Board) -> Result<()> {
        self.as_player_mut().start_episode(board)
    }
    fn observe(&mut self, board: &Board, mv: usize, successor: &Board) -> Result<()> {
        self.as_player_mut().observe(board, mv, successor)
    }
    fn finish_episode(&mut self) -> Result<()> {
        self.as_player_mut().finish_episode()
    }
}
