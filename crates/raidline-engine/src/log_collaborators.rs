//! Collaborators that report to the log instead of a store or a speaker.
//!
//! Used when the binary runs without a scoreboard backend: every save,
//! delete, cue, and bracket move becomes one structured log line.

use raidline_core::collaborators::{
    AudioNotifier, PersistenceError, PersistenceGateway, WinnerAdvancement,
};
use raidline_types::{AudioCue, EventId, MatchId, MatchStatePatch, RaidEvent, Side, TeamId};
use tracing::{debug, info};

/// Persistence that logs each write.
#[derive(Debug, Default)]
pub struct LogPersistence {
    /// Writes logged so far.
    writes: u64,
}

impl LogPersistence {
    /// Number of writes accepted.
    pub const fn writes(&self) -> u64 {
        self.writes
    }

    const fn count(&mut self) {
        self.writes = self.writes.saturating_add(1);
    }
}

impl PersistenceGateway for LogPersistence {
    fn save_event(&mut self, event: &RaidEvent) -> Result<(), PersistenceError> {
        self.count();
        info!(
            event = %event.id,
            half = ?event.half,
            side = %event.raiding_side,
            code = %event.outcome_code,
            raiding_points = event.raiding_points,
            defending_points = event.defending_points,
            all_out_points = event.all_out_points,
            "save_event"
        );
        Ok(())
    }

    fn save_match_state(&mut self, patch: &MatchStatePatch) -> Result<(), PersistenceError> {
        self.count();
        info!(
            match_id = %patch.match_id,
            status = ?patch.status,
            half = patch.current_half,
            score_a = patch.team_a_score,
            score_b = patch.team_b_score,
            raiding = %patch.active_raiding_team,
            clock = ?patch.clocks.map(|c| c.match_remaining),
            "save_match_state"
        );
        Ok(())
    }

    fn delete_event(&mut self, event_id: EventId) -> Result<(), PersistenceError> {
        self.count();
        info!(event = %event_id, "delete_event");
        Ok(())
    }
}

/// Audio notifier that logs each cue.
#[derive(Debug, Default)]
pub struct LogAudio;

impl AudioNotifier for LogAudio {
    fn play(&mut self, cue: AudioCue) {
        debug!(cue = ?cue, "play");
    }
}

/// Winner advancement that logs each call.
#[derive(Debug, Default)]
pub struct LogAdvancement;

impl WinnerAdvancement for LogAdvancement {
    fn advance(
        &mut self,
        next_match_id: MatchId,
        slot: Side,
        winning_team_id: TeamId,
    ) -> Result<(), PersistenceError> {
        info!(
            next_match = %next_match_id,
            slot = %slot,
            team = %winning_team_id,
            "advance_winner"
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use raidline_types::Match;

    use super::*;

    #[test]
    fn persistence_counts_writes() {
        let fixture = Match::new(MatchId::new(), TeamId::new(), TeamId::new());
        let mut store = LogPersistence::default();
        store
            .save_match_state(&MatchStatePatch::from_match(&fixture))
            .unwrap();
        store.delete_event(EventId::new()).unwrap();
        assert_eq!(store.writes(), 2);
    }

    #[test]
    fn advancement_accepts() {
        let mut bracket = LogAdvancement;
        assert!(
            bracket
                .advance(MatchId::new(), Side::A, TeamId::new())
                .is_ok()
        );
    }
}
