//! Side effects requested by the engine.
//!
//! Reducers never call collaborators. They return a list of
//! [`EngineEvent`]s in the order they should be performed, and the
//! runner's dispatcher executes them.

use raidline_types::{AudioCue, EventId, MatchId, MatchStatePatch, RaidEvent, Side, TeamId};

/// One side effect for a collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Persist a resolved raid.
    SaveRaid(RaidEvent),
    /// Persist a partial match-state update.
    SaveMatchState(MatchStatePatch),
    /// Delete a previously persisted raid (undo).
    DeleteRaid(EventId),
    /// Play an audio cue.
    Audio(AudioCue),
    /// Feed the winner into the next bracket fixture.
    AdvanceWinner {
        /// The fixture the winner feeds into.
        next_match_id: MatchId,
        /// Team slot the winner fills in that fixture.
        slot: Side,
        /// The winning team.
        winning_team_id: TeamId,
    },
}

impl EngineEvent {
    /// The audio cue, if this is an audio event.
    pub const fn cue(&self) -> Option<AudioCue> {
        match self {
            Self::Audio(cue) => Some(*cue),
            _ => None,
        }
    }
}

/// Collect the audio cues from a list of events, in order.
pub fn cues(events: &[EngineEvent]) -> Vec<AudioCue> {
    events.iter().filter_map(EngineEvent::cue).collect()
}
