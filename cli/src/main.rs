//! Command-line front end: checks a board against a scenario and prints the
//! generated truth table.
//!
//! - `gatecheck check <scenario> --board <file>` checks a saved board
//! - `gatecheck check <scenario> --solution` checks the scenario's own wiring
//! - `gatecheck target <scenario>` prints the target table

use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{Parser, Subcommand};
use gatecheck::{Board, EngineConfig, Scenario, ScenarioError, Session, SessionError};
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Parser)]
#[command(name = "gatecheck")]
#[command(about = "Validate and evaluate logic-gate circuits against a target truth table")]
#[command(version)]
struct Cli {
    /// Engine configuration (JSON); defaults apply to missing fields
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a board and compare it with the scenario's target table
    Check {
        /// Scenario descriptor
        scenario: PathBuf,
        /// Saved board (nodes and wires)
        #[arg(short, long, conflicts_with = "solution", required_unless_present = "solution")]
        board: Option<PathBuf>,
        /// Check the scenario's reference wiring instead of a board
        #[arg(long)]
        solution: bool,
        /// Seconds spent, for the star rating
        #[arg(long, default_value = "0")]
        elapsed: u64,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a scenario's target truth table
    Target {
        /// Scenario descriptor
        scenario: PathBuf,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    #[error("invalid {what} {path}: {source}")]
    Json {
        what: &'static str,
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("scenario {0} has no solution wiring")]
    NoSolution(String),

    #[error(transparent)]
    Session(#[from] SessionError),
}

fn read(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, CliError> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    EngineConfig::from_json(&read(path)?).map_err(|source| CliError::Json {
        what: "config",
        path: path.to_path_buf(),
        source,
    })
}

fn load_board(path: &Path) -> Result<Board, CliError> {
    serde_json::from_str(&read(path)?).map_err(|source| CliError::Json {
        what: "board",
        path: path.to_path_buf(),
        source,
    })
}

/// Replays `board` through a session so the same edit rules apply as in an
/// interactive run. Nodes already placed by the scenario are skipped.
fn replay(session: &mut Session, board: Board) -> Result<(), CliError> {
    for node in board.nodes {
        session.add_node(node)?;
    }
    for wire in board.wires {
        session.connect_wire(wire)?;
    }
    debug!(
        nodes = session.board().nodes.len(),
        wires = session.board().wires.len(),
        "board replayed"
    );
    Ok(())
}

fn check(
    config: EngineConfig,
    scenario: &Path,
    board: Option<&Path>,
    elapsed: u64,
    json: bool,
) -> Result<bool, CliError> {
    let scenario = Scenario::from_json(&read(scenario)?)?;
    let board = match board {
        Some(path) => load_board(path)?,
        None => scenario
            .solution_board()
            .ok_or_else(|| CliError::NoSolution(scenario.id.clone()))?,
    };

    let mut session = Session::new(scenario, config);
    replay(&mut session, board)?;
    session.set_elapsed(elapsed);
    let report = session.simulate()?;

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(err) => error!(%err, "cannot serialise report"),
        }
        return Ok(report.success);
    }

    print!("{}", report.table);
    for error in &report.errors {
        println!("error: {error}");
    }
    if !report.mismatches.is_empty() && report.errors.is_empty() {
        let rows: Vec<String> = report.mismatches.iter().map(usize::to_string).collect();
        println!("mismatching rows: {}", rows.join(", "));
    }
    match session.completion() {
        Some(completion) => {
            info!(scenario = %session.scenario().id, "solved");
            println!(
                "solved: {} star(s), score {}",
                completion.rating.stars, completion.rating.score
            );
        }
        None => println!("not solved"),
    }
    Ok(report.success)
}

fn run(cli: Cli) -> Result<bool, CliError> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Check {
            scenario,
            board,
            solution: _,
            elapsed,
            json,
        } => check(config, &scenario, board.as_deref(), elapsed, json),
        Commands::Target { scenario } => {
            let scenario = Scenario::from_json(&read(&scenario)?)?;
            println!("{}: {}", scenario.id, scenario.title);
            print!("{}", scenario.target_truth);
            Ok(true)
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    match run(Cli::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}
