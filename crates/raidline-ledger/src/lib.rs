//! Points ledger for the Raidline scoring engine.
//!
//! Every point on the scoreboard is recorded here by the raid event that
//! awarded it and the reason it was awarded. Points are never edited in
//! place: undoing a raid appends reversal entries. The scoreboard must
//! always equal the ledger balance; the engine checks this after every
//! resolution, undo, and redo.
//!
//! # Architecture
//!
//! - [`ledger`] -- The [`PointsLedger`]: append-only log with recording methods.
//! - [`conservation`] -- Score conservation verification and anomaly detection.
//!
//! # Conservation Law
//!
//! For each side S at any moment:
//!
//! ```text
//! score(S) == sum(awards to S) - sum(reversals from S)
//! ```
//!
//! A violation produces a [`LedgerAnomaly`]. The ledger never panics; it
//! returns errors.
//!
//! # Usage
//!
//! ```
//! use raidline_ledger::{ConservationResult, PointsLedger};
//! use raidline_types::{EventId, PointKind, ScorePair, Side};
//!
//! let mut ledger = PointsLedger::new();
//! let raid = EventId::new();
//!
//! ledger.record_award(raid, Side::A, PointKind::Touch, 2).ok();
//! let score = ScorePair { team_a: 2, team_b: 0 };
//! assert_eq!(ledger.verify_conservation(score), ConservationResult::Balanced);
//!
//! ledger.reverse_event(raid).ok();
//! assert_eq!(ledger.verify_conservation(ScorePair::default()), ConservationResult::Balanced);
//! ```

pub mod conservation;
pub mod ledger;

// Re-export primary types at crate root.
pub use conservation::ConservationResult;
pub use ledger::PointsLedger;

use raidline_types::{EventId, ScorePair};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when recording ledger entries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Entries must carry at least one point.
    #[error("ledger entry points must be non-zero")]
    ZeroPoints,

    /// The event being reversed has no outstanding awards.
    #[error("no outstanding awards to reverse for event {event_id}")]
    NothingToReverse {
        /// The event whose awards were requested.
        event_id: EventId,
    },

    /// An internal error that should not occur in normal operation.
    #[error("internal ledger error: {0}")]
    InternalError(&'static str),
}

// ---------------------------------------------------------------------------
// Anomaly type
// ---------------------------------------------------------------------------

/// A mismatch between the scoreboard and the ledger balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerAnomaly {
    /// The score shown on the scoreboard.
    pub scoreboard: ScorePair,
    /// Net ledger balance per side, signed so a negative balance is visible.
    pub ledger: (i64, i64),
    /// Human-readable description of the anomaly.
    pub message: String,
}

impl core::fmt::Display for LedgerAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}
