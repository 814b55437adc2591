//! Async match loop and side-effect dispatch.
//!
//! [`run_match`] drives one [`MatchEngine`] from two sources: a one-second
//! interval that ticks the clocks, and a channel of [`ScorerCommand`]s.
//! Both are serialized through a single loop, so a tick never observes a
//! half-applied command.
//!
//! Every batch of [`EngineEvent`]s goes through a [`Dispatcher`]:
//!
//! - Audio cues play immediately unless muted.
//! - Saves and bracket advancement are queued and flushed in order. A
//!   rejected write stays at the head of the queue and is retried on the
//!   next dispatch; the in-memory state is never rolled back.
//! - Deleting a raid whose save is still queued drops the queued save
//!   instead of calling the store.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{info, warn};

use raidline_types::{EventId, MatchId, MatchStatePatch, RaidEvent, Side, TeamId};

use crate::collaborators::{
    AudioNotifier, PersistenceError, PersistenceGateway, WinnerAdvancement,
};
use crate::engine::{MatchEngine, ScorerCommand};
use crate::error::EngineError;
use crate::events::EngineEvent;

/// A write waiting to reach a collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingWrite {
    /// A raid event save.
    Raid(RaidEvent),
    /// A match-state save.
    MatchState(MatchStatePatch),
    /// A bracket advancement.
    Advance {
        /// The fixture the winner feeds into.
        next_match_id: MatchId,
        /// Team slot in that fixture.
        slot: Side,
        /// The winning team.
        winning_team_id: TeamId,
    },
}

/// Outcome of one dispatch.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Writes rejected this round. They remain queued.
    pub failures: Vec<EngineError>,
    /// Failures that are not retried.
    pub warnings: Vec<EngineError>,
}

impl DispatchReport {
    /// Whether every write went through.
    pub const fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.warnings.is_empty()
    }
}

/// Executes engine events against the collaborators.
pub struct Dispatcher<'a> {
    /// Durable storage.
    persistence: &'a mut dyn PersistenceGateway,
    /// Sound output.
    audio: &'a mut dyn AudioNotifier,
    /// Bracket progression.
    advancement: &'a mut dyn WinnerAdvancement,
    /// Suppress audio cues.
    muted: bool,
    /// Writes not yet accepted, oldest first.
    pending: VecDeque<PendingWrite>,
}

impl<'a> Dispatcher<'a> {
    /// Create a dispatcher over the three outbound collaborators.
    pub fn new(
        persistence: &'a mut dyn PersistenceGateway,
        audio: &'a mut dyn AudioNotifier,
        advancement: &'a mut dyn WinnerAdvancement,
        muted: bool,
    ) -> Self {
        Self {
            persistence,
            audio,
            advancement,
            muted,
            pending: VecDeque::new(),
        }
    }

    /// Writes still waiting, oldest first.
    pub const fn pending(&self) -> &VecDeque<PendingWrite> {
        &self.pending
    }

    /// Perform `events` in order, then flush the write queue.
    pub fn dispatch(&mut self, events: Vec<EngineEvent>) -> DispatchReport {
        let mut report = DispatchReport::default();
        for event in events {
            match event {
                EngineEvent::Audio(cue) => {
                    if !self.muted {
                        self.audio.play(cue);
                    }
                }
                EngineEvent::SaveRaid(raid) => self.pending.push_back(PendingWrite::Raid(raid)),
                EngineEvent::SaveMatchState(patch) => {
                    self.pending.push_back(PendingWrite::MatchState(patch));
                }
                EngineEvent::AdvanceWinner {
                    next_match_id,
                    slot,
                    winning_team_id,
                } => self.pending.push_back(PendingWrite::Advance {
                    next_match_id,
                    slot,
                    winning_team_id,
                }),
                EngineEvent::DeleteRaid(event_id) => self.delete(event_id, &mut report),
            }
        }
        report.failures.extend(self.flush());
        report
    }

    /// Retry queued writes in order, stopping at the first rejection.
    ///
    /// Returns the rejection as [`EngineError::Persistence`], if any.
    pub fn flush(&mut self) -> Option<EngineError> {
        while let Some(write) = self.pending.pop_front() {
            if let Err(err) = self.write(&write) {
                warn!(error = %err, queued = self.pending.len().saturating_add(1), "Write rejected, will retry");
                self.pending.push_front(write);
                return Some(err.into());
            }
        }
        None
    }

    fn write(&mut self, write: &PendingWrite) -> Result<(), PersistenceError> {
        match write {
            PendingWrite::Raid(raid) => self.persistence.save_event(raid),
            PendingWrite::MatchState(patch) => self.persistence.save_match_state(patch),
            PendingWrite::Advance {
                next_match_id,
                slot,
                winning_team_id,
            } => self
                .advancement
                .advance(*next_match_id, *slot, *winning_team_id),
        }
    }

    fn delete(&mut self, event_id: EventId, report: &mut DispatchReport) {
        let queued = self
            .pending
            .iter()
            .position(|w| matches!(w, PendingWrite::Raid(raid) if raid.id == event_id));
        if queued.and_then(|index| self.pending.remove(index)).is_some() {
            return;
        }
        if let Err(err) = self.persistence.delete_event(event_id) {
            warn!(event = %event_id, error = %err, "Failed to delete undone raid");
            report.warnings.push(err.into());
        }
    }
}

/// Why the match loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEndReason {
    /// The match was locked.
    Locked,
    /// The command channel closed.
    CommandsClosed,
}

/// Totals for one run of the match loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Why the loop stopped.
    pub end_reason: RunEndReason,
    /// Clock ticks processed.
    pub ticks: u64,
    /// Commands accepted.
    pub commands: u64,
    /// Commands rejected.
    pub rejected: u64,
    /// Writes rejected by a collaborator (each retry counts).
    pub persistence_failures: u64,
}

/// Drive `engine` until the match is locked or `commands` closes.
///
/// Rejected commands are logged and skipped; the loop keeps running.
pub async fn run_match(
    engine: &mut MatchEngine,
    dispatcher: &mut Dispatcher<'_>,
    commands: &mut mpsc::Receiver<ScorerCommand>,
) -> RunSummary {
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    // The first tick completes immediately.
    ticker.tick().await;

    let mut summary = RunSummary {
        end_reason: RunEndReason::CommandsClosed,
        ticks: 0,
        commands: 0,
        rejected: 0,
        persistence_failures: 0,
    };

    info!(match_id = %engine.state().fixture().id, "Match loop starting");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let events = engine.tick();
                summary.ticks = summary.ticks.saturating_add(1);
                record(&mut summary, &dispatcher.dispatch(events));
            }
            received = commands.recv() => {
                let Some(command) = received else {
                    summary.end_reason = RunEndReason::CommandsClosed;
                    break;
                };
                let name = command.name();
                match engine.handle(command) {
                    Ok(events) => {
                        summary.commands = summary.commands.saturating_add(1);
                        record(&mut summary, &dispatcher.dispatch(events));
                    }
                    Err(err) => {
                        summary.rejected = summary.rejected.saturating_add(1);
                        warn!(command = name, error = %err, "Command rejected");
                    }
                }
                if engine.is_locked() {
                    summary.end_reason = RunEndReason::Locked;
                    break;
                }
            }
        }
    }

    if let Some(err) = dispatcher.flush() {
        warn!(error = %err, pending = dispatcher.pending().len(), "Writes still pending at shutdown");
        summary.persistence_failures = summary.persistence_failures.saturating_add(1);
    }

    info!(
        match_id = %engine.state().fixture().id,
        reason = ?summary.end_reason,
        ticks = summary.ticks,
        commands = summary.commands,
        rejected = summary.rejected,
        "Match loop ended"
    );
    summary
}

fn record(summary: &mut RunSummary, report: &DispatchReport) {
    let failed = u64::try_from(report.failures.len().saturating_add(report.warnings.len()))
        .unwrap_or(u64::MAX);
    summary.persistence_failures = summary.persistence_failures.saturating_add(failed);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use raidline_types::{AudioCue, MatchPhase, MatchStatus, RaidAction};

    use super::*;
    use crate::collaborators::{MemoryPersistence, RecordingAdvancement, RecordingAudio};
    use crate::state::tests::{fresh_state, player};

    #[test]
    fn muted_dispatch_skips_audio() {
        let mut store = MemoryPersistence::new();
        let mut audio = RecordingAudio::default();
        let mut bracket = RecordingAdvancement::default();
        let mut dispatcher = Dispatcher::new(&mut store, &mut audio, &mut bracket, true);
        let report = dispatcher.dispatch(vec![EngineEvent::Audio(AudioCue::Buzzer)]);
        assert!(report.is_clean());
        assert!(audio.cues.is_empty());
    }

    #[test]
    fn rejected_writes_stay_queued_until_store_recovers() {
        let mut engine = MatchEngine::new(fresh_state(), Some(1));
        let events = engine.handle(ScorerCommand::StartMatch).unwrap();

        let mut store = MemoryPersistence::new();
        store.reject_all = true;
        let mut audio = RecordingAudio::default();
        let mut bracket = RecordingAdvancement::default();
        {
            let mut dispatcher = Dispatcher::new(&mut store, &mut audio, &mut bracket, false);
            let report = dispatcher.dispatch(events);
            assert_eq!(report.failures.len(), 1);
            assert!(matches!(
                report.failures[0],
                EngineError::Persistence { .. }
            ));
            assert_eq!(dispatcher.pending().len(), 1);
        }
        // The engine kept its state despite the failed save.
        assert_eq!(engine.state().phase(), MatchPhase::LiveHalf1);

        store.reject_all = false;
        let mut dispatcher = Dispatcher::new(&mut store, &mut audio, &mut bracket, false);
        dispatcher.pending.push_back(PendingWrite::MatchState(engine.state().patch()));
        assert!(dispatcher.flush().is_none());
        assert!(dispatcher.pending().is_empty());
        assert_eq!(store.states.len(), 1);
    }

    #[test]
    fn undo_of_unsaved_raid_drops_queued_save() {
        let mut engine = MatchEngine::new(fresh_state(), Some(1));
        engine.handle(ScorerCommand::StartMatch).unwrap();
        let raider = player(engine.state(), Side::A, 0);
        let raid_events = engine
            .handle(ScorerCommand::ResolveRaid {
                action: RaidAction::empty(raider),
            })
            .unwrap();
        let undo_events = engine.handle(ScorerCommand::Undo).unwrap();

        let mut store = MemoryPersistence::new();
        let mut audio = RecordingAudio::default();
        let mut bracket = RecordingAdvancement::default();
        let mut dispatcher = Dispatcher::new(&mut store, &mut audio, &mut bracket, false);
        let mut batch = raid_events;
        batch.extend(undo_events);
        let report = dispatcher.dispatch(batch);
        assert!(report.is_clean());

        assert!(store.events.is_empty());
        assert!(store.deleted.is_empty());
        assert_eq!(store.states.len(), 2);
    }

    #[test]
    fn delete_failure_is_a_warning() {
        let mut store = MemoryPersistence::new();
        store.reject_all = true;
        let mut audio = RecordingAudio::default();
        let mut bracket = RecordingAdvancement::default();
        let mut dispatcher = Dispatcher::new(&mut store, &mut audio, &mut bracket, false);
        let report = dispatcher.dispatch(vec![EngineEvent::DeleteRaid(EventId::new())]);
        assert!(report.failures.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert!(matches!(
            report.warnings[0],
            EngineError::Persistence { .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn loop_ticks_and_applies_commands_until_locked() {
        let mut engine = MatchEngine::new(fresh_state(), Some(7));
        let raider = player(engine.state(), Side::A, 0);
        let mut store = MemoryPersistence::new();
        let mut audio = RecordingAudio::default();
        let mut bracket = RecordingAdvancement::default();

        let (tx, mut rx) = mpsc::channel(16);
        tx.send(ScorerCommand::StartMatch).await.unwrap();
        let mut action = RaidAction::empty(raider);
        action.touch_points = 1;
        tx.send(ScorerCommand::ResolveRaid { action }).await.unwrap();
        // Rejected: the match is still in its first half.
        tx.send(ScorerCommand::Lock).await.unwrap();

        let driver = tokio::spawn(async move {
            // Let both halves run out, then lock.
            tokio::time::sleep(Duration::from_secs(70)).await;
            tx.send(ScorerCommand::StartSecondHalf).await.unwrap();
            tokio::time::sleep(Duration::from_secs(70)).await;
            tx.send(ScorerCommand::Lock).await.unwrap();
            tx
        });

        let summary = {
            let mut dispatcher = Dispatcher::new(&mut store, &mut audio, &mut bracket, false);
            run_match(&mut engine, &mut dispatcher, &mut rx).await
        };
        drop(driver.await.unwrap());

        assert_eq!(summary.end_reason, RunEndReason::Locked);
        assert_eq!(summary.rejected, 1);
        assert_eq!(summary.commands, 4);
        assert!(summary.ticks >= 120);
        assert_eq!(summary.persistence_failures, 0);
        assert_eq!(engine.state().fixture().status, MatchStatus::Locked);
        assert_eq!(engine.state().winner(), Some(Side::A));
        assert_eq!(store.events.len(), 1);
        assert!(audio.cues.contains(&AudioCue::Success));
        assert!(audio.cues.contains(&AudioCue::Buzzer));
    }

    #[tokio::test(start_paused = true)]
    async fn loop_stops_when_channel_closes() {
        let mut engine = MatchEngine::new(fresh_state(), Some(7));
        let mut store = MemoryPersistence::new();
        let mut audio = RecordingAudio::default();
        let mut bracket = RecordingAdvancement::default();
        let (tx, mut rx) = mpsc::channel(4);
        tx.send(ScorerCommand::StartMatch).await.unwrap();
        drop(tx);

        let mut dispatcher = Dispatcher::new(&mut store, &mut audio, &mut bracket, false);
        let summary = run_match(&mut engine, &mut dispatcher, &mut rx).await;
        assert_eq!(summary.end_reason, RunEndReason::CommandsClosed);
        assert_eq!(summary.commands, 1);
    }
}
