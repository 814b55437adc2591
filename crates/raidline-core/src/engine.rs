//! Command front door for one match.
//!
//! [`MatchEngine`] owns the current [`MatchState`] and applies
//! [`ScorerCommand`]s to it one at a time. A command either replaces the
//! state with the reducer's next state and returns its side effects, or
//! fails and leaves the state exactly as it was.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use raidline_types::{MatchStatus, PlayerId, RaidAction, Side, TimeoutCaller};

use crate::error::EngineError;
use crate::events::EngineEvent;
use crate::state::{MatchState, Transition};

/// A request from the scorer-of-record.
///
/// Deserialized from JSON such as
/// `{"command": "start_raid", "raider_id": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ScorerCommand {
    /// Start the first half.
    StartMatch,
    /// Put a raider in flight.
    StartRaid {
        /// The raider.
        raider_id: PlayerId,
    },
    /// Resolve a regulation raid.
    ResolveRaid {
        /// What happened on the raid.
        action: RaidAction,
    },
    /// Cancel the raid in flight.
    StopRaid,
    /// Call a timeout.
    CallTimeout {
        /// Who called it.
        caller: TimeoutCaller,
    },
    /// End the running timeout early.
    EndTimeout,
    /// Pause the match and raid clocks.
    PauseClocks,
    /// Resume after a manual pause.
    ResumeClocks,
    /// Start the second half.
    StartSecondHalf,
    /// Undo the latest raid of the current half.
    Undo,
    /// Re-apply the most recently undone raid.
    Redo,
    /// Swap an active player with a bench player.
    Substitute {
        /// The team making the change.
        side: Side,
        /// The outgoing active player.
        active_id: PlayerId,
        /// The incoming bench player.
        bench_id: PlayerId,
    },
    /// Submit both shootout line-ups.
    SetupTieBreaker {
        /// Team A's five raiders, in raiding order.
        raiders_a: Vec<PlayerId>,
        /// Team B's five raiders, in raiding order.
        raiders_b: Vec<PlayerId>,
        /// The side that raids first.
        first_raiding_team: Side,
    },
    /// Record the next shootout raid.
    TieBreakerRaid {
        /// What happened on the raid.
        action: RaidAction,
    },
    /// Freeze a completed match.
    Lock,
}

impl ScorerCommand {
    /// Short name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::StartMatch => "start_match",
            Self::StartRaid { .. } => "start_raid",
            Self::ResolveRaid { .. } => "resolve_raid",
            Self::StopRaid => "stop_raid",
            Self::CallTimeout { .. } => "call_timeout",
            Self::EndTimeout => "end_timeout",
            Self::PauseClocks => "pause_clocks",
            Self::ResumeClocks => "resume_clocks",
            Self::StartSecondHalf => "start_second_half",
            Self::Undo => "undo",
            Self::Redo => "redo",
            Self::Substitute { .. } => "substitute",
            Self::SetupTieBreaker { .. } => "setup_tie_breaker",
            Self::TieBreakerRaid { .. } => "tie_breaker_raid",
            Self::Lock => "lock",
        }
    }
}

/// Owner of one match's state.
#[derive(Debug)]
pub struct MatchEngine {
    /// The current state.
    state: MatchState,
    /// Source for the golden-raid coin flip.
    rng: StdRng,
}

impl MatchEngine {
    /// Wrap `state`. A `seed` makes the golden-raid coin flip reproducible.
    pub fn new(state: MatchState, seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self { state, rng }
    }

    /// The current state.
    pub const fn state(&self) -> &MatchState {
        &self.state
    }

    /// Consume the engine and return the final state.
    pub fn into_state(self) -> MatchState {
        self.state
    }

    /// Whether the match is locked and accepts no further commands.
    pub fn is_locked(&self) -> bool {
        self.state.fixture().status == MatchStatus::Locked
    }

    /// Apply one command.
    ///
    /// # Errors
    ///
    /// Returns the reducer's [`EngineError`]; the state is unchanged.
    pub fn handle(&mut self, command: ScorerCommand) -> Result<Vec<EngineEvent>, EngineError> {
        let name = command.name();
        let state = &self.state;
        let transition = match command {
            ScorerCommand::StartMatch => state.start_match(),
            ScorerCommand::StartRaid { raider_id } => state.start_raid(raider_id),
            ScorerCommand::ResolveRaid { action } => state.resolve_raid(&action),
            ScorerCommand::StopRaid => Ok(state.stop_raid()),
            ScorerCommand::CallTimeout { caller } => state.call_timeout(caller),
            ScorerCommand::EndTimeout => state.end_timeout(),
            ScorerCommand::PauseClocks => state.pause_clocks(),
            ScorerCommand::ResumeClocks => state.resume_clocks(),
            ScorerCommand::StartSecondHalf => state.start_second_half(),
            ScorerCommand::Undo => state.undo(),
            ScorerCommand::Redo => state.redo(),
            ScorerCommand::Substitute {
                side,
                active_id,
                bench_id,
            } => state.substitute(side, active_id, bench_id),
            ScorerCommand::SetupTieBreaker {
                raiders_a,
                raiders_b,
                first_raiding_team,
            } => state.setup_tie_breaker(raiders_a, raiders_b, first_raiding_team),
            ScorerCommand::TieBreakerRaid { action } => {
                state.tie_breaker_raid(&action, &mut self.rng)
            }
            ScorerCommand::Lock => state.lock(),
        }?;
        debug!(command = name, events = transition.events.len(), "Command applied");
        Ok(self.commit(transition))
    }

    /// Advance the clocks by one second.
    pub fn tick(&mut self) -> Vec<EngineEvent> {
        let transition = self.state.tick();
        self.commit(transition)
    }

    fn commit(&mut self, transition: Transition) -> Vec<EngineEvent> {
        self.state = transition.state;
        transition.events
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use raidline_types::MatchPhase;

    use super::*;
    use crate::state::tests::{fresh_state, player};

    #[test]
    fn command_json_shape() {
        let raider = PlayerId::new();
        let json = format!(r#"{{"command":"start_raid","raider_id":"{raider}"}}"#);
        let cmd: ScorerCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(cmd, ScorerCommand::StartRaid { raider_id: raider });

        let cmd: ScorerCommand =
            serde_json::from_str(r#"{"command":"call_timeout","caller":"official"}"#).unwrap();
        assert_eq!(
            cmd,
            ScorerCommand::CallTimeout {
                caller: TimeoutCaller::Official
            }
        );
        assert_eq!(cmd.name(), "call_timeout");
    }

    #[test]
    fn rejected_command_keeps_state() {
        let mut engine = MatchEngine::new(fresh_state(), Some(1));
        let raider = player(engine.state(), Side::A, 0);
        let err = engine
            .handle(ScorerCommand::StartRaid { raider_id: raider })
            .unwrap_err();
        assert!(err.as_state_violation().is_some());
        assert_eq!(engine.state().phase(), MatchPhase::NotStarted);
    }

    #[test]
    fn accepted_command_advances_state() {
        let mut engine = MatchEngine::new(fresh_state(), Some(1));
        let events = engine.handle(ScorerCommand::StartMatch).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(engine.state().phase(), MatchPhase::LiveHalf1);

        let raider = player(engine.state(), Side::A, 0);
        let mut action = RaidAction::empty(raider);
        action.bonus_point = true;
        engine.handle(ScorerCommand::ResolveRaid { action }).unwrap();
        assert_eq!(engine.state().fixture().team_a_score, 1);

        engine.handle(ScorerCommand::Undo).unwrap();
        assert_eq!(engine.state().fixture().team_a_score, 0);
        assert!(!engine.is_locked());
    }

    #[test]
    fn tick_moves_match_clock() {
        let mut engine = MatchEngine::new(fresh_state(), None);
        engine.handle(ScorerCommand::StartMatch).unwrap();
        engine.tick();
        assert_eq!(engine.state().clocks().match_clock().remaining(), 59);
    }
}
