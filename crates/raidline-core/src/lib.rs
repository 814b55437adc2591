//! Match state machine, clocks, and async runner for the Raidline
//! scoring engine.
//!
//! This crate owns the lifecycle of a single match: halves, raids,
//! timeouts, undo/redo, substitutions, the tie-breaker shootout, and
//! the side effects each step requests from the outside world.
//!
//! # Modules
//!
//! - [`clock`] -- Match, raid, and timeout countdowns with a shared pause flag.
//! - [`collaborators`] -- Persistence, roster, audio, and bracket traits plus
//!   in-memory implementations.
//! - [`config`] -- Configuration loading from `raidline-config.yaml`.
//! - [`engine`] -- [`MatchEngine`] and the [`ScorerCommand`] vocabulary.
//! - [`error`] -- The [`EngineError`] taxonomy.
//! - [`events`] -- Side effects returned by every state transition.
//! - [`history`] -- Linear undo/redo stacks.
//! - [`runner`] -- The tick-and-command loop and the event [`Dispatcher`].
//! - [`state`] -- [`MatchState`] and its reducers.
//!
//! [`MatchEngine`]: engine::MatchEngine
//! [`ScorerCommand`]: engine::ScorerCommand
//! [`EngineError`]: error::EngineError
//! [`Dispatcher`]: runner::Dispatcher
//! [`MatchState`]: state::MatchState

pub mod clock;
pub mod collaborators;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod history;
pub mod runner;
pub mod state;
