//! Scorer binary for the Raidline kabaddi engine.
//!
//! Loads configuration and a match file, attaches the engine to the
//! fixture, reads JSON scorer commands from stdin, and runs the match loop
//! until the match is locked or stdin closes.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `raidline-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Load the match file (first argument, default `raidline-match.yaml`)
//! 4. Attach the engine to the fixture and its rosters
//! 5. Spawn the stdin command reader
//! 6. Run the match loop
//! 7. Log the result

mod commands;
mod error;
mod log_collaborators;
mod match_file;

use std::path::{Path, PathBuf};

use raidline_core::config::EngineConfig;
use raidline_core::engine::MatchEngine;
use raidline_core::error::EngineError;
use raidline_core::runner::{self, Dispatcher};
use raidline_core::state::MatchState;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::AppError;
use crate::log_collaborators::{LogAdvancement, LogAudio, LogPersistence};
use crate::match_file::MatchFile;

/// Config file looked up in the working directory.
const CONFIG_PATH: &str = "raidline-config.yaml";

/// Match file used when no path is given.
const DEFAULT_MATCH_PATH: &str = "raidline-match.yaml";

/// Buffered scorer commands between the reader and the match loop.
const COMMAND_BUFFER: usize = 64;

/// Application entry point for the scorer.
///
/// # Errors
///
/// Returns an error if configuration, the match file, or attaching the
/// engine fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging is not up yet; report afterwards.
    let (config, from_file) = load_config().map_err(AppError::from)?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("raidline-engine starting");
    info!(
        from_file,
        half_duration = config.timers.half_duration,
        raid_duration = config.timers.raid_duration,
        max_timeouts = config.timers.max_timeouts,
        muted = config.audio.muted,
        seeded = config.tie_breaker.seed.is_some(),
        "Configuration loaded"
    );

    // 3. Load the match file.
    let match_path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_MATCH_PATH), PathBuf::from);
    let match_file = MatchFile::from_file(&match_path)?;
    info!(
        path = %match_path.display(),
        match_id = %match_file.fixture.id,
        rosters = match_file.rosters.len(),
        "Match file loaded"
    );

    // 4. Attach the engine.
    let state = MatchState::attach(match_file.fixture.clone(), &match_file, config.timers)
        .map_err(AppError::from)?;
    let mut engine = MatchEngine::new(state, config.tie_breaker.seed);

    // 5. Spawn the command reader.
    let (tx, mut rx) = mpsc::channel(COMMAND_BUFFER);
    let reader = tokio::spawn(commands::forward_commands(
        BufReader::new(tokio::io::stdin()),
        tx,
    ));

    // 6. Run the match loop.
    let mut persistence = LogPersistence::default();
    let mut audio = LogAudio;
    let mut advancement = LogAdvancement;
    let summary = {
        let mut dispatcher = Dispatcher::new(
            &mut persistence,
            &mut audio,
            &mut advancement,
            config.audio.muted,
        );
        runner::run_match(&mut engine, &mut dispatcher, &mut rx).await
    };
    reader.abort();

    // 7. Log the result.
    let state = engine.state();
    info!(
        reason = ?summary.end_reason,
        ticks = summary.ticks,
        commands = summary.commands,
        rejected = summary.rejected,
        persistence_failures = summary.persistence_failures,
        writes = persistence.writes(),
        status = ?state.fixture().status,
        score_a = state.fixture().team_a_score,
        score_b = state.fixture().team_b_score,
        winner = ?state.winner(),
        "raidline-engine finished"
    );

    Ok(())
}

/// Load configuration from `raidline-config.yaml`.
///
/// Returns the defaults when the file does not exist. The second value
/// reports whether the file was read. A bad file is an
/// [`EngineError::Configuration`].
fn load_config() -> Result<(EngineConfig, bool), EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        let config = EngineConfig::from_file(config_path)?;
        Ok((config, true))
    } else {
        let mut config = EngineConfig::default();
        config.audio.apply_env_overrides();
        Ok((config, false))
    }
}
