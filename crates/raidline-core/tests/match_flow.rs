//! End-to-end tests for `raidline-core`.
//!
//! These drive a full match through [`MatchEngine`] and a [`Dispatcher`]
//! backed by the in-memory collaborators, checking the scoreboard, the
//! persisted record, and the points ledger together.

// Integration tests use unwrap/indexing for clarity -- panicking on
// failure is the correct behavior in test code.
#![allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::too_many_lines
)]

use raidline_core::collaborators::{
    MemoryPersistence, RecordingAdvancement, RecordingAudio, StaticRosters,
};
use raidline_core::config::EngineConfig;
use raidline_core::engine::{MatchEngine, ScorerCommand};
use raidline_core::runner::Dispatcher;
use raidline_core::state::MatchState;
use raidline_ledger::ConservationResult;
use raidline_types::{
    Advancement, AudioCue, Match, MatchId, MatchPhase, MatchStatus, Player, PlayerId,
    RaidAction, RaidOutcome, Roster, RosterSlot, Side, TeamId, TimeoutCaller,
};

const CONFIG: &str = "
timers:
  raid_duration: 30
  half_duration: 40
  interval_duration: 10
  timeout_duration: 5
  max_timeouts: 1
  sync_interval: 10
tie_breaker:
  seed: 11
";

fn roster(team_id: TeamId) -> Roster {
    let players = (1..=10_u8)
        .map(|n| Player {
            id: PlayerId::new(),
            team_id,
            name: format!("Player {n}"),
            jersey_number: n,
            slot: if n <= 7 {
                RosterSlot::Active { position: n }
            } else {
                RosterSlot::Bench
            },
        })
        .collect();
    Roster { team_id, players }
}

fn engine(advancement: Option<Advancement>) -> MatchEngine {
    let config = EngineConfig::parse(CONFIG).unwrap();
    let team_a = TeamId::new();
    let team_b = TeamId::new();
    let provider = StaticRosters::new([roster(team_a), roster(team_b)]);
    let mut fixture = Match::new(MatchId::new(), team_a, team_b);
    fixture.advancement = advancement;
    let state = MatchState::attach(fixture, &provider, config.timers).unwrap();
    MatchEngine::new(state, config.tie_breaker.seed)
}

fn id(engine: &MatchEngine, side: Side, n: usize) -> PlayerId {
    engine.state().rosters().get(side).players[n].id
}

fn touch(raider: PlayerId, defenders: &[PlayerId]) -> RaidAction {
    let mut action = RaidAction::empty(raider);
    action.touch_points = u32::try_from(defenders.len()).unwrap();
    action.defenders_out = defenders.to_vec();
    action
}

fn tackled(raider: PlayerId) -> RaidAction {
    let mut action = RaidAction::empty(raider);
    action.raider_out = true;
    action.outcome = RaidOutcome::Fail;
    action
}

fn run(engine: &mut MatchEngine, dispatcher: &mut Dispatcher<'_>, command: ScorerCommand) {
    let events = engine.handle(command).unwrap();
    assert!(dispatcher.dispatch(events).is_clean());
}

fn assert_balanced(engine: &MatchEngine) {
    let state = engine.state();
    assert_eq!(
        state.ledger().verify_conservation(state.fixture().score()),
        ConservationResult::Balanced
    );
}

#[test]
fn all_out_then_undo_and_redo_keep_ledger_balanced() {
    let mut engine = engine(None);
    let mut store = MemoryPersistence::new();
    let mut audio = RecordingAudio::default();
    let mut bracket = RecordingAdvancement::default();
    let mut dispatcher = Dispatcher::new(&mut store, &mut audio, &mut bracket, false);

    let b: Vec<PlayerId> = (0..7).map(|n| id(&engine, Side::B, n)).collect();
    let a: Vec<PlayerId> = (0..3).map(|n| id(&engine, Side::A, n)).collect();

    let commands = [
        ScorerCommand::StartMatch,
        ScorerCommand::ResolveRaid {
            action: touch(a[0], &b[0..2]),
        },
        ScorerCommand::ResolveRaid {
            action: tackled(b[2]),
        },
        ScorerCommand::ResolveRaid {
            action: touch(a[1], &b[3..5]),
        },
        ScorerCommand::ResolveRaid {
            action: tackled(b[5]),
        },
    ];
    for command in commands {
        let events = engine.handle(command).unwrap();
        assert!(dispatcher.dispatch(events).is_clean());
        assert_balanced(&engine);
    }
    assert_eq!(engine.state().fixture().team_a_score, 6);
    assert_eq!(engine.state().fixture().out_player_ids.len(), 6);

    // The last defender goes: all-out, bonus to A, B's court restored.
    let events = engine
        .handle(ScorerCommand::ResolveRaid {
            action: touch(a[2], &b[6..7]),
        })
        .unwrap();
    assert!(dispatcher.dispatch(events).is_clean());
    assert_eq!(engine.state().fixture().team_a_score, 9);
    assert!(engine.state().fixture().out_player_ids.is_empty());
    assert_eq!(engine.state().ledger().balance(), (9, 0));
    assert_balanced(&engine);

    let events = engine.handle(ScorerCommand::Undo).unwrap();
    assert!(dispatcher.dispatch(events).is_clean());
    assert_eq!(engine.state().fixture().team_a_score, 6);
    assert_eq!(engine.state().fixture().out_player_ids.len(), 6);
    assert_eq!(engine.state().fixture().active_raiding_team, Side::A);
    assert_balanced(&engine);

    let events = engine.handle(ScorerCommand::Redo).unwrap();
    assert!(dispatcher.dispatch(events).is_clean());
    assert_eq!(engine.state().fixture().team_a_score, 9);
    assert_balanced(&engine);

    assert!(dispatcher.pending().is_empty());
    assert_eq!(store.deleted.len(), 1);
    assert_eq!(store.events.len(), 5);
    let all_out = store.events.last().unwrap();
    assert_eq!(all_out.all_out_sides, vec![Side::B]);
    assert_eq!(all_out.all_out_points, 2);
    assert_eq!(store.states.last().map(|s| s.team_a_score), Some(9));
    assert_eq!(
        audio.cues.iter().filter(|c| **c == AudioCue::Success).count(),
        4
    );
}

#[test]
fn full_match_through_tie_breaker_advances_winner() {
    let next_match_id = MatchId::new();
    let mut engine = engine(Some(Advancement {
        next_match_id,
        slot: Side::A,
    }));
    let mut store = MemoryPersistence::new();
    let mut audio = RecordingAudio::default();
    let mut bracket = RecordingAdvancement::default();
    let mut dispatcher = Dispatcher::new(&mut store, &mut audio, &mut bracket, true);

    run(&mut engine, &mut dispatcher, ScorerCommand::StartMatch);
    for side in [Side::A, Side::B] {
        let mut bonus = RaidAction::empty(id(&engine, side, 0));
        bonus.bonus_point = true;
        run(&mut engine, &mut dispatcher, ScorerCommand::ResolveRaid { action: bonus });
    }
    assert_eq!(engine.state().fixture().team_a_score, 1);
    assert_eq!(engine.state().fixture().team_b_score, 1);

    // Team A spends its only timeout; a second is refused.
    run(
        &mut engine,
        &mut dispatcher,
        ScorerCommand::CallTimeout {
            caller: TimeoutCaller::Team(Side::A),
        },
    );
    run(&mut engine, &mut dispatcher, ScorerCommand::EndTimeout);
    assert!(
        engine
            .handle(ScorerCommand::CallTimeout {
                caller: TimeoutCaller::Team(Side::A),
            })
            .is_err()
    );

    for _ in 0..40 {
        let events = engine.tick();
        assert!(dispatcher.dispatch(events).is_clean());
    }
    assert_eq!(engine.state().phase(), MatchPhase::HalfTimeBreak);
    let summary = engine.state().half_summary().unwrap();
    assert_eq!(summary.raids_a, 1);
    assert_eq!(summary.raids_b, 1);

    run(&mut engine, &mut dispatcher, ScorerCommand::StartSecondHalf);
    assert_eq!(engine.state().fixture().active_raiding_team, Side::B);
    for _ in 0..40 {
        let events = engine.tick();
        assert!(dispatcher.dispatch(events).is_clean());
    }
    assert_eq!(engine.state().phase(), MatchPhase::AwaitingTieBreaker);

    let raiders_a: Vec<PlayerId> = (0..5).map(|n| id(&engine, Side::A, n)).collect();
    let raiders_b: Vec<PlayerId> = (0..5).map(|n| id(&engine, Side::B, n)).collect();
    run(
        &mut engine,
        &mut dispatcher,
        ScorerCommand::SetupTieBreaker {
            raiders_a: raiders_a.clone(),
            raiders_b: raiders_b.clone(),
            first_raiding_team: Side::A,
        },
    );
    for (&ra, &rb) in raiders_a.iter().zip(&raiders_b) {
        run(
            &mut engine,
            &mut dispatcher,
            ScorerCommand::TieBreakerRaid {
                action: touch(ra, &[]),
            },
        );
        let mut scored = RaidAction::empty(rb);
        scored.touch_points = 1;
        run(&mut engine, &mut dispatcher, ScorerCommand::TieBreakerRaid { action: scored });
    }

    let state = engine.state();
    assert_eq!(state.phase(), MatchPhase::MatchEnded);
    assert_eq!(state.fixture().status, MatchStatus::Completed);
    assert_eq!(state.winner(), Some(Side::B));
    let team_b = state.fixture().team_b_id;

    run(&mut engine, &mut dispatcher, ScorerCommand::Lock);
    assert!(engine.is_locked());

    assert_eq!(bracket.calls, vec![(next_match_id, Side::A, team_b)]);
    // Muted: nothing reached the speaker.
    assert!(audio.cues.is_empty());
    // Regulation and shootout raids are both persisted.
    assert_eq!(store.events.len(), 12);
    assert_eq!(
        store.events.iter().filter(|e| e.half.is_none()).count(),
        10
    );
    assert!(store.states.iter().any(|s| s.half_summary.is_some()));
    assert_eq!(
        store.states.last().map(|s| s.status),
        Some(MatchStatus::Locked)
    );
}
