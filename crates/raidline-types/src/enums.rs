//! Enumeration types for the Raidline scoring engine.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Sides and lifecycle
// ---------------------------------------------------------------------------

/// One of the two teams in a match.
///
/// `A` and `B` refer to the fixture's `team_a_id` / `team_b_id` slots, not
/// to home or away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Side {
    /// The team in the fixture's `team_a_id` slot.
    A,
    /// The team in the fixture's `team_b_id` slot.
    B,
}

impl Side {
    /// Return the other side.
    pub const fn opponent(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

impl core::fmt::Display for Side {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::A => write!(f, "A"),
            Self::B => write!(f, "B"),
        }
    }
}

/// Persisted lifecycle status of a match.
///
/// The engine owns the score, out-set, and raiding team while the status
/// is `Live` or `HalfTime`. Once `Completed` or `Locked` the match is
/// read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum MatchStatus {
    /// Created by the fixtures collaborator, not yet started.
    NotStarted,
    /// A half (or the tie-breaker) is in progress.
    Live,
    /// Between the two halves.
    HalfTime,
    /// A winner has been decided.
    Completed,
    /// Completed and frozen against further edits.
    Locked,
}

/// Phase of the top-level match state machine.
///
/// ```text
/// NotStarted -> LiveHalf1 -> (CompletingRaid) -> HalfTimeBreak -> LiveHalf2
///            -> (CompletingRaid) -> MatchEnded
///                                -> AwaitingTieBreaker -> TieBreaker -> MatchEnded
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum MatchPhase {
    /// Rosters attached, first half not yet started.
    NotStarted,
    /// First half in progress.
    LiveHalf1,
    /// The half clock reached zero while a raid was in flight. The clock
    /// display is frozen until that raid resolves or is stopped.
    CompletingRaid {
        /// The half (1 or 2) whose clock expired.
        half: u8,
    },
    /// Interval between the halves.
    HalfTimeBreak,
    /// Second half in progress.
    LiveHalf2,
    /// Regulation ended level; waiting for the shootout line-ups.
    AwaitingTieBreaker,
    /// Tie-breaker shootout in progress.
    TieBreaker,
    /// A winner is known.
    MatchEnded,
}

impl MatchPhase {
    /// Whether this phase is one of the two live halves.
    pub const fn is_live_half(self) -> bool {
        matches!(self, Self::LiveHalf1 | Self::LiveHalf2)
    }
}

// ---------------------------------------------------------------------------
// Rosters
// ---------------------------------------------------------------------------

/// Where a player currently sits on their team sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum RosterSlot {
    /// On court in one of the seven active positions.
    Active {
        /// Court position, 1 through 7.
        position: u8,
    },
    /// On the bench.
    Bench,
}

impl RosterSlot {
    /// Whether the slot is an on-court position.
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active { .. })
    }
}

// ---------------------------------------------------------------------------
// Raids
// ---------------------------------------------------------------------------

/// Outcome of a raid as reported by the scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum RaidOutcome {
    /// The raider returned safely.
    Success,
    /// The raid failed.
    Fail,
}

/// Who called a timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum TimeoutCaller {
    /// A team timeout, counted against that team's allowance.
    Team(Side),
    /// An official (referee) timeout. Uncapped.
    Official,
}

/// Audio cue requested from the sound collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum AudioCue {
    /// Countdown tick in the closing seconds of a raid.
    Tick,
    /// End of a clock (raid, half, interval, or timeout).
    Buzzer,
    /// A raid scored for the raiding side.
    Success,
    /// A Do-or-Die raid is starting or has failed.
    DodBuzzer,
    /// A raid has started.
    RaidStart,
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Category of a point recorded in the points ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum PointKind {
    /// Raider tagged defenders.
    Touch,
    /// Raider crossed the bonus line.
    Bonus,
    /// Defenders stopped the raider.
    Tackle,
    /// Tackle made with three or fewer active defenders.
    SuperTackle,
    /// Bonus for putting the whole opposing team out.
    AllOut,
}

/// Whether a ledger entry adds or removes points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EntryDirection {
    /// Points awarded by a resolved raid.
    Award,
    /// Points withdrawn by an undo.
    Reversal,
}
