//! Error types for the scorer binary.
//!
//! [`AppError`] wraps every failure mode during startup so `main` can
//! propagate with `?`. Errors inside the running match are logged by the
//! runner and never reach this type.

/// Top-level error for the scorer binary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The match file could not be read or parsed.
    #[error("match file error: {message}")]
    MatchFile {
        /// Description of the failure.
        message: String,
    },

    /// The configuration was invalid or the engine refused the fixture.
    #[error("engine error: {source}")]
    Engine {
        /// The underlying engine error.
        #[from]
        source: raidline_core::error::EngineError,
    },
}
