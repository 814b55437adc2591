//! Error types for the raidline-rules crate.
//!
//! Every rule function validates its preconditions before computing a new
//! state, so an error always means nothing changed. Errors fall into two
//! families: [`StateViolation`] (the request does not fit the current
//! match state) and [`RosterError`] (the request names players the
//! rosters cannot satisfy).

use raidline_types::{PlayerId, Side, TeamId};

/// A request that is illegal in the current match state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateViolation {
    /// The match status is not `live`.
    #[error("match is not live")]
    MatchNotLive,

    /// The raider cannot raid right now.
    #[error("raider {raider_id} cannot raid: {reason}")]
    InvalidRaiderState {
        /// The offending raider.
        raider_id: PlayerId,
        /// Why the raider was rejected.
        reason: String,
    },

    /// The action itself is malformed.
    #[error("invalid raid action: {reason}")]
    InvalidAction {
        /// What is wrong with the action.
        reason: String,
    },

    /// A raid is already in flight.
    #[error("a raid is already in flight")]
    RaidInFlight,

    /// The operation needs an in-flight raid and there is none.
    #[error("no raid is in flight")]
    NoRaidInFlight,

    /// The operation is not allowed in the current phase.
    #[error("{operation} is not allowed during {phase}")]
    WrongPhase {
        /// The rejected operation.
        operation: &'static str,
        /// Debug rendering of the current phase.
        phase: String,
    },

    /// The team has used its full timeout allowance.
    #[error("team {side} has used {used} of {max} timeouts")]
    TimeoutLimitReached {
        /// The team that asked.
        side: Side,
        /// Timeouts already used.
        used: u8,
        /// Allowance per match.
        max: u8,
    },

    /// A timeout is already running.
    #[error("a timeout is already active")]
    TimeoutActive,

    /// No timeout is running.
    #[error("no timeout is active")]
    NoTimeoutActive,

    /// The clocks are already paused.
    #[error("clocks are already paused")]
    ClocksAlreadyPaused,

    /// The clocks are not paused.
    #[error("clocks are not paused")]
    ClocksNotPaused,

    /// The undo stack is empty.
    #[error("nothing to undo")]
    NothingToUndo,

    /// The redo stack is empty.
    #[error("nothing to redo")]
    NothingToRedo,

    /// The shootout already has a winner.
    #[error("tie-breaker is already complete")]
    TieBreakerComplete,
}

/// A request the rosters cannot satisfy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RosterError {
    /// The player is not on the team's roster.
    #[error("player {player_id} not found on team {team_id}")]
    PlayerNotFound {
        /// The missing player.
        player_id: PlayerId,
        /// The team that was searched.
        team_id: TeamId,
    },

    /// The player is on the roster but in the wrong slot for the request.
    #[error("player {player_id} is not {expected}")]
    InvalidSlot {
        /// The player.
        player_id: PlayerId,
        /// The slot the request needed ("active" or "on the bench").
        expected: &'static str,
    },

    /// Too few active players to start the match.
    #[error("team {team_id} has {active} active players, {required} required")]
    InsufficientRoster {
        /// The short-handed team.
        team_id: TeamId,
        /// Active players available.
        active: usize,
        /// Active players required.
        required: usize,
    },

    /// A shootout line-up has the wrong number of raiders.
    #[error("team {side} nominated {count} raiders, exactly {required} required")]
    InvalidLineup {
        /// The team whose line-up is wrong.
        side: Side,
        /// Raiders nominated.
        count: usize,
        /// Raiders required.
        required: usize,
    },

    /// A shootout line-up names the same player twice.
    #[error("player {player_id} nominated more than once")]
    DuplicateNominee {
        /// The repeated player.
        player_id: PlayerId,
    },
}

/// Any rule rejection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    /// See [`StateViolation`].
    #[error(transparent)]
    State(#[from] StateViolation),

    /// See [`RosterError`].
    #[error(transparent)]
    Roster(#[from] RosterError),
}
