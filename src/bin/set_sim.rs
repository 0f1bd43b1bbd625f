//! Headless game runner: computer players only, every UI event logged.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rust_set::{FeatureOracle, Game, GameConfig, GameError, TracingInterface};

/// Run a game of Set between computer players.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a TOML game configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of computer players (replaces every player in the config)
    #[arg(short, long, default_value_t = 2)]
    players: usize,

    /// Game seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Turn timeout in seconds
    #[arg(long)]
    turn_timeout: Option<u64>,

    /// Log every legal set after each deal
    #[arg(long)]
    hints: bool,
}

fn main() -> ExitCode {
    initialize_tracing();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "simulation failed");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), GameError> {
    let mut config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    config = config.with_players(0, args.players);
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if let Some(secs) = args.turn_timeout {
        let warning = config.turn_timeout_warning();
        config = config.with_turn_timeout(Duration::from_secs(secs), warning);
    }
    if args.hints {
        config = config.with_hints(true);
    }

    let oracle = Arc::new(FeatureOracle::from_config(&config));
    let game = Game::start(config, oracle, Arc::new(TracingInterface))?;
    let winners = game.join()?;

    let names: Vec<String> = winners.iter().map(ToString::to_string).collect();
    info!(winners = %names.join(", "), "simulation finished");
    Ok(())
}

fn initialize_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,rust_set=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_thread_names(true))
        .init();
}
