//! Collaborator traits and in-memory implementations.
//!
//! The engine talks to the outside world through four narrow interfaces:
//! [`PersistenceGateway`] for durable storage, [`RosterProvider`] for team
//! sheets, [`AudioNotifier`] for cues, and [`WinnerAdvancement`] for the
//! bracket. All calls are fire-and-forget from the engine's point of view;
//! the dispatcher decides what to do with failures.
//!
//! The in-memory implementations here back the tests and can be used by
//! embedders that do not need durable storage.

use std::collections::BTreeMap;

use raidline_types::{
    AudioCue, EventId, MatchId, MatchStatePatch, RaidEvent, Roster, Side, TeamId,
};

/// An external save that was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    /// The store refused the write.
    #[error("{operation} rejected: {reason}")]
    Rejected {
        /// The rejected operation.
        operation: &'static str,
        /// Why the store refused it.
        reason: String,
    },
}

/// Durable storage for raid events and match state.
pub trait PersistenceGateway: Send {
    /// Persist a resolved raid.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the store rejects the write.
    fn save_event(&mut self, event: &RaidEvent) -> Result<(), PersistenceError>;

    /// Persist a partial match-state update.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the store rejects the write.
    fn save_match_state(&mut self, patch: &MatchStatePatch) -> Result<(), PersistenceError>;

    /// Delete a previously persisted raid.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the store rejects the deletion.
    fn delete_event(&mut self, event_id: EventId) -> Result<(), PersistenceError>;
}

/// Read-only access to team sheets.
pub trait RosterProvider {
    /// The roster for `team_id`, or `None` if the team is unknown.
    fn roster(&self, team_id: TeamId) -> Option<Roster>;
}

/// Sound output.
pub trait AudioNotifier: Send {
    /// Play a cue. Must not block.
    fn play(&mut self, cue: AudioCue);
}

/// Bracket progression.
pub trait WinnerAdvancement: Send {
    /// Place `winning_team_id` into `slot` of `next_match_id`.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the bracket store rejects the write.
    fn advance(
        &mut self,
        next_match_id: MatchId,
        slot: Side,
        winning_team_id: TeamId,
    ) -> Result<(), PersistenceError>;
}

// ---------------------------------------------------------------------------
// In-memory implementations
// ---------------------------------------------------------------------------

/// In-memory persistence with optional failure injection.
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    /// Saved raid events, in save order. Deleted events are removed.
    pub events: Vec<RaidEvent>,
    /// Saved match-state patches, in save order.
    pub states: Vec<MatchStatePatch>,
    /// Ids passed to `delete_event`, in call order.
    pub deleted: Vec<EventId>,
    /// When set, every call is rejected.
    pub reject_all: bool,
}

impl MemoryPersistence {
    /// Create an empty store that accepts every write.
    pub const fn new() -> Self {
        Self {
            events: Vec::new(),
            states: Vec::new(),
            deleted: Vec::new(),
            reject_all: false,
        }
    }

    fn check(&self, operation: &'static str) -> Result<(), PersistenceError> {
        if self.reject_all {
            return Err(PersistenceError::Rejected {
                operation,
                reason: String::from("store unavailable"),
            });
        }
        Ok(())
    }
}

impl PersistenceGateway for MemoryPersistence {
    fn save_event(&mut self, event: &RaidEvent) -> Result<(), PersistenceError> {
        self.check("save_event")?;
        self.events.push(event.clone());
        Ok(())
    }

    fn save_match_state(&mut self, patch: &MatchStatePatch) -> Result<(), PersistenceError> {
        self.check("save_match_state")?;
        self.states.push(patch.clone());
        Ok(())
    }

    fn delete_event(&mut self, event_id: EventId) -> Result<(), PersistenceError> {
        self.check("delete_event")?;
        self.events.retain(|e| e.id != event_id);
        self.deleted.push(event_id);
        Ok(())
    }
}

/// Audio notifier that records every cue it is asked to play.
#[derive(Debug, Clone, Default)]
pub struct RecordingAudio {
    /// Cues played, in order.
    pub cues: Vec<AudioCue>,
}

impl AudioNotifier for RecordingAudio {
    fn play(&mut self, cue: AudioCue) {
        self.cues.push(cue);
    }
}

/// Winner advancement that records every call.
#[derive(Debug, Clone, Default)]
pub struct RecordingAdvancement {
    /// `(next_match_id, slot, winning_team_id)` per call.
    pub calls: Vec<(MatchId, Side, TeamId)>,
}

impl WinnerAdvancement for RecordingAdvancement {
    fn advance(
        &mut self,
        next_match_id: MatchId,
        slot: Side,
        winning_team_id: TeamId,
    ) -> Result<(), PersistenceError> {
        self.calls.push((next_match_id, slot, winning_team_id));
        Ok(())
    }
}

/// Roster provider over a fixed set of team sheets.
#[derive(Debug, Clone, Default)]
pub struct StaticRosters {
    /// Rosters keyed by team.
    rosters: BTreeMap<TeamId, Roster>,
}

impl StaticRosters {
    /// Build a provider from a list of rosters.
    pub fn new(rosters: impl IntoIterator<Item = Roster>) -> Self {
        Self {
            rosters: rosters.into_iter().map(|r| (r.team_id, r)).collect(),
        }
    }
}

impl RosterProvider for StaticRosters {
    fn roster(&self, team_id: TeamId) -> Option<Roster> {
        self.rosters.get(&team_id).cloned()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use raidline_types::{PlayerId, RaidAction};

    use super::*;

    fn event() -> RaidEvent {
        RaidEvent {
            id: EventId::new(),
            match_id: MatchId::new(),
            half: Some(1),
            raiding_side: Side::A,
            action: RaidAction::empty(PlayerId::new()),
            raiding_points: 0,
            defending_points: 0,
            all_out_points: 0,
            all_out_sides: Vec::new(),
            super_tackle: false,
            do_or_die: false,
            revived: Vec::new(),
            outcome_code: String::from("0"),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn memory_persistence_saves_and_deletes() {
        let mut store = MemoryPersistence::new();
        let saved = event();
        store.save_event(&saved).unwrap();
        assert_eq!(store.events.len(), 1);
        store.delete_event(saved.id).unwrap();
        assert!(store.events.is_empty());
        assert_eq!(store.deleted, vec![saved.id]);
    }

    #[test]
    fn memory_persistence_rejects_when_unavailable() {
        let mut store = MemoryPersistence::new();
        store.reject_all = true;
        let err = store.save_event(&event()).unwrap_err();
        assert_eq!(
            err,
            PersistenceError::Rejected {
                operation: "save_event",
                reason: String::from("store unavailable"),
            }
        );
        assert!(store.events.is_empty());
    }

    #[test]
    fn static_rosters_lookup() {
        let team_id = TeamId::new();
        let provider = StaticRosters::new([Roster {
            team_id,
            players: Vec::new(),
        }]);
        assert!(provider.roster(team_id).is_some());
        assert!(provider.roster(TeamId::new()).is_none());
    }
}
