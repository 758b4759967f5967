use anyhow::Context;
use clap::Parser;
use itertools::Itertools;
use learn_game::board::{Board, Outcome};
use learn_game::config::{AgentConfig, LabConfig, Mode};
use learn_game::error::Result;
use learn_game::players::Player;
use learn_game::{play_game, play_games, Agent, Error, MoveSource};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG: &str = "./lab.json";

#[derive(Parser, Debug)]
#[command(
    name = "game",
    about = "Train tic-tac-toe agents and match them against each other"
)]
struct Cli {
    /// JSON lab configuration. Without it, ./lab.json is used if present and
    /// built-in defaults otherwise.
    config: Option<PathBuf>,

    /// Play against the value-iteration agent at the terminal afterwards.
    #[arg(long)]
    play: bool,
}

/// An explicitly named file must exist; only the implicit default may fall
/// back to built-in settings.
fn load_config(cli: &Cli) -> anyhow::Result<LabConfig> {
    match &cli.config {
        Some(path) => {
            LabConfig::load(path).with_context(|| format!("loading {}", path.display()))
        }
        None => LabConfig::load_or_default(Path::new(DEFAULT_CONFIG))
            .with_context(|| format!("loading {}", DEFAULT_CONFIG)),
    }
}

/// Asks a person for moves: prompts go to `output`, answers come from `input`.
struct ConsoleInput<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsoleInput<R, W> {
    fn new(input: R, output: W) -> Self {
        ConsoleInput { input, output }
    }

    fn draw(&mut self, board: &Board) -> io::Result<()> {
        writeln!(self.output, "* * * * *")?;
        for (a, b, c) in board.to_string().chars().tuples() {
            writeln!(self.output, "* {} {} {} *", a, b, c)?;
        }
        writeln!(self.output, "* * * * *")
    }
}

impl<R: BufRead, W: Write> MoveSource for ConsoleInput<R, W> {
    fn request_move(&mut self, board: &Board, legal_moves: &[usize]) -> Result<usize> {
        loop {
            self.draw(board)?;
            writeln!(self.output, "Valid moves = {}", legal_moves.iter().join(", "))?;
            write!(self.output, "Please enter your move: ")?;
            self.output.flush()?;
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Err(Error::InputClosed);
            }
            match line.trim().parse::<usize>() {
                Ok(mv) if legal_moves.contains(&mv) => return Ok(mv),
                _ => writeln!(self.output, "Invalid move")?,
            }
        }
    }
}

fn play_human(solver: &mut Agent) -> anyhow::Result<()> {
    loop {
        // The console holds the stdin lock only for the length of one game.
        let outcome = {
            let console = ConsoleInput::new(io::stdin().lock(), io::stdout());
            let mut human = Agent::external(Box::new(console));
            match play_game(&mut human, solver) {
                Err(Error::InputClosed) => {
                    log::info!("input closed, leaving the game");
                    return Ok(());
                }
                result => result?,
            }
        };
        match outcome {
            Outcome::NoWin => println!("Tie game!"),
            Outcome::WinX => println!("X wins!"),
            Outcome::WinO => println!("O wins!"),
        }
        print!("Play again? [n to stop] ");
        io::stdout().flush()?;
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer)? == 0
            || answer.trim().to_lowercase().starts_with('n')
        {
            return Ok(());
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    log::info!(
        "{:?} vs {:?}: {} training episodes, {} games per match",
        config.first.mode,
        config.second.mode,
        config.training.episodes,
        config.training.games
    );

    let mut first = Agent::new(&config.first).context("building first agent")?;
    let mut second = Agent::new(&config.second).context("building second agent")?;
    for agent in [&mut first, &mut second] {
        log::info!("training {}", agent.get_name());
        agent.train(config.training.episodes)?;
    }

    let mut solver = Agent::new(&AgentConfig::new(Mode::ValueIteration).with_epsilon(0.0))?;
    for agent in [&mut first, &mut second] {
        agent.set_epsilon(0.0)?;
    }
    play_games(&mut first, &mut second, config.training.games)?;
    play_games(&mut first, &mut solver, config.training.games)?;
    play_games(&mut second, &mut solver, config.training.games)?;

    if cli.play {
        log::info!("starting console game against {}", solver.get_name());
        play_human(&mut solver)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const ALL_MOVES: [usize; 9] = [0, 1, 2, 3, 4, 5, 6, 7, 8];

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    #[test]
    fn cli_takes_path_and_play_flag() {
        let cli = Cli::try_parse_from(["game", "--play", "runs/lab.json"]).unwrap();
        assert!(cli.play);
        assert_eq!(cli.config, Some(PathBuf::from("runs/lab.json")));

        let cli = Cli::try_parse_from(["game"]).unwrap();
        assert!(!cli.play);
        assert_eq!(cli.config, None);
    }

    #[test]
    fn cli_rejects_unknown_flags() {
        assert!(Cli::try_parse_from(["game", "--plya"]).is_err());
        let help = Cli::try_parse_from(["game", "--help"]).unwrap_err();
        assert_eq!(help.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn named_config_must_exist() {
        let cli = Cli {
            config: Some(PathBuf::from("/nonexistent/lab.json")),
            play: false,
        };
        let err = load_config(&cli).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::ConfigRead { .. })
        ));
    }

    #[test]
    fn console_input_retries_until_legal() {
        let mut output = Vec::new();
        let mv = ConsoleInput::new(Cursor::new("x\n9\n4\n"), &mut output)
            .request_move(&Board::empty(), &ALL_MOVES)
            .unwrap();
        assert_eq!(mv, 4);
        let text = String::from_utf8(output).unwrap();
        assert_eq!(text.matches("Invalid move").count(), 2);
        assert!(text.contains("* - - - *"));
    }

    #[test]
    fn closed_input_is_an_error() {
        let mut console = ConsoleInput::new(Cursor::new(""), Vec::new());
        assert!(matches!(
            console.request_move(&Board::empty(), &ALL_MOVES),
            Err(Error::InputClosed)
        ));
    }

    #[test]
    fn write_failures_propagate() {
        let mut console = ConsoleInput::new(Cursor::new("4\n"), BrokenPipe);
        assert!(matches!(
            console.request_move(&Board::empty(), &ALL_MOVES),
            Err(Error::Input(_))
        ));
    }
}
