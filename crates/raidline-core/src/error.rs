//! Error taxonomy for the engine.
//!
//! [`EngineError`] groups every failure into one of four families.
//! State violations and roster errors are raised before any mutation, so
//! the match state is unchanged when they are returned. Persistence
//! failures are reported but never roll back in-memory state.

use raidline_rules::{RosterError, RuleError, StateViolation};

use crate::collaborators::PersistenceError;
use crate::config::ConfigError;

/// Top-level engine error.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The request does not fit the current match state.
    #[error("state violation: {source}")]
    StateViolation {
        /// The underlying violation.
        #[from]
        source: StateViolation,
    },

    /// The rosters cannot satisfy the request.
    #[error("roster error: {source}")]
    Roster {
        /// The underlying roster error.
        #[from]
        source: RosterError,
    },

    /// An external save was rejected.
    #[error("persistence failure: {source}")]
    Persistence {
        /// The underlying persistence error.
        #[from]
        source: PersistenceError,
    },

    /// The configuration is invalid.
    #[error("configuration error: {source}")]
    Configuration {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },
}

impl From<RuleError> for EngineError {
    fn from(err: RuleError) -> Self {
        match err {
            RuleError::State(source) => Self::StateViolation { source },
            RuleError::Roster(source) => Self::Roster { source },
        }
    }
}

impl EngineError {
    /// The state violation, if this is one.
    pub const fn as_state_violation(&self) -> Option<&StateViolation> {
        match self {
            Self::StateViolation { source } => Some(source),
            _ => None,
        }
    }

    /// The roster error, if this is one.
    pub const fn as_roster_error(&self) -> Option<&RosterError> {
        match self {
            Self::Roster { source } => Some(source),
            _ => None,
        }
    }
}
