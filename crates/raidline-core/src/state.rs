//! The match state machine.
//!
//! [`MatchState`] is an immutable value. Every operation is a reducer
//! that takes `&self` and returns a [`Transition`]: the next state plus
//! the side effects to perform, in order. A rejected operation returns an
//! error and leaves the caller holding the unchanged state, so a failed
//! request can never leave a half-applied scoreboard behind.
//!
//! # Phases
//!
//! ```text
//! NotStarted -> LiveHalf1 -> (CompletingRaid) -> HalfTimeBreak -> LiveHalf2
//!            -> (CompletingRaid) -> MatchEnded
//!                                -> AwaitingTieBreaker -> TieBreaker -> MatchEnded
//! ```
//!
//! Within a live half the raid sub-state is either [`RaidPhase::Idle`] or
//! [`RaidPhase::Raiding`]. Only one raid may be in flight.

use chrono::Utc;
use rand::Rng;
use tracing::{debug, error, info, warn};

use raidline_ledger::{ConservationResult, LedgerError, PointsLedger};
use raidline_rules::{self as rules, RaidContext, ResolvedRaid, RosterError, StateViolation};
use raidline_types::{
    AudioCue, EmptyRaidCounters, EventId, HalfSummary, Match, MatchPhase, MatchSnapshot,
    MatchStatePatch, MatchStatus, PlayerId, RaidAction, RaidEvent, RecentRaids, Rosters, Side,
    TieBreakerState, TimeoutCaller, TimeoutCounts,
};

use crate::clock::ClockSet;
use crate::collaborators::RosterProvider;
use crate::config::TimerConfig;
use crate::error::EngineError;
use crate::events::EngineEvent;
use crate::history::History;

/// Raid-clock readings at or below this play a countdown tick.
pub const RAID_COUNTDOWN_CUE_SECONDS: u32 = 5;

/// Whether a raid is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaidPhase {
    /// No raid in flight.
    Idle,
    /// A raid has been started and not yet resolved or stopped.
    Raiding {
        /// The raider in flight.
        raider_id: PlayerId,
        /// Whether this raid is Do-or-Die.
        do_or_die: bool,
    },
}

/// The result of a successful reducer.
#[derive(Debug, Clone)]
pub struct Transition {
    /// The next state.
    pub state: MatchState,
    /// Side effects to perform, in order.
    pub events: Vec<EngineEvent>,
}

/// Complete engine state for one match.
#[derive(Debug, Clone)]
pub struct MatchState {
    /// The persisted match record.
    fixture: Match,
    /// Both teams' rosters.
    rosters: Rosters,
    /// Top-level phase.
    phase: MatchPhase,
    /// Raid sub-state.
    raid: RaidPhase,
    /// Countdowns and the pause flag.
    clocks: ClockSet,
    /// Consecutive empty raids per side.
    empty_raids: EmptyRaidCounters,
    /// Team timeouts used.
    timeouts: TimeoutCounts,
    /// Last-raids indicator.
    recent: RecentRaids,
    /// Undo and redo stacks.
    history: History,
    /// Points ledger.
    ledger: PointsLedger,
    /// Shootout state once set up.
    tie_breaker: Option<TieBreakerState>,
    /// The side that raided first in half 1.
    half_one_opener: Side,
    /// Half-1 aggregate, once half 1 has ended.
    half_summary: Option<HalfSummary>,
    /// The winner once decided.
    winner: Option<Side>,
    /// Clock durations and timeout allowance.
    timers: TimerConfig,
}

impl MatchState {
    /// Wrap a fixture and its rosters in a fresh, not-started state.
    pub fn new(fixture: Match, rosters: Rosters, timers: TimerConfig) -> Self {
        let half_one_opener = fixture.active_raiding_team;
        Self {
            fixture,
            rosters,
            phase: MatchPhase::NotStarted,
            raid: RaidPhase::Idle,
            clocks: ClockSet::new(timers.half_duration),
            empty_raids: EmptyRaidCounters::default(),
            timeouts: TimeoutCounts::default(),
            recent: RecentRaids::default(),
            history: History::new(),
            ledger: PointsLedger::new(),
            tie_breaker: None,
            half_one_opener,
            half_summary: None,
            winner: None,
            timers,
        }
    }

    /// Load both rosters from `provider` and build a fresh state.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError::InsufficientRoster`] for a team the provider
    /// does not know.
    pub fn attach(
        fixture: Match,
        provider: &dyn RosterProvider,
        timers: TimerConfig,
    ) -> Result<Self, EngineError> {
        let load = |team_id| {
            provider
                .roster(team_id)
                .ok_or(RosterError::InsufficientRoster {
                    team_id,
                    active: 0,
                    required: rules::MIN_ACTIVE_PLAYERS,
                })
        };
        let rosters = Rosters {
            team_a: load(fixture.team_a_id)?,
            team_b: load(fixture.team_b_id)?,
        };
        Ok(Self::new(fixture, rosters, timers))
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The match record.
    pub const fn fixture(&self) -> &Match {
        &self.fixture
    }

    /// Both rosters.
    pub const fn rosters(&self) -> &Rosters {
        &self.rosters
    }

    /// Top-level phase.
    pub const fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// Raid sub-state.
    pub const fn raid(&self) -> RaidPhase {
        self.raid
    }

    /// Countdowns and the pause flag.
    pub const fn clocks(&self) -> &ClockSet {
        &self.clocks
    }

    /// Consecutive empty raids per side.
    pub const fn empty_raids(&self) -> EmptyRaidCounters {
        self.empty_raids
    }

    /// Team timeouts used.
    pub const fn timeouts(&self) -> TimeoutCounts {
        self.timeouts
    }

    /// Last-raids indicator.
    pub const fn recent(&self) -> &RecentRaids {
        &self.recent
    }

    /// Undo and redo stacks.
    pub const fn history(&self) -> &History {
        &self.history
    }

    /// Points ledger.
    pub const fn ledger(&self) -> &PointsLedger {
        &self.ledger
    }

    /// Shootout state, once set up.
    pub const fn tie_breaker(&self) -> Option<&TieBreakerState> {
        self.tie_breaker.as_ref()
    }

    /// Half-1 aggregate, once half 1 has ended.
    pub const fn half_summary(&self) -> Option<HalfSummary> {
        self.half_summary
    }

    /// The winner, once decided.
    pub const fn winner(&self) -> Option<Side> {
        self.winner
    }

    /// Timer configuration.
    pub const fn timers(&self) -> TimerConfig {
        self.timers
    }

    /// Scoreboard patch for persistence.
    pub fn patch(&self) -> MatchStatePatch {
        let mut patch = MatchStatePatch::from_match(&self.fixture);
        patch.winner_team_id = self.winner.map(|side| self.fixture.team_id(side));
        patch.tie_breaker.clone_from(&self.tie_breaker);
        patch
    }

    // -----------------------------------------------------------------------
    // Match lifecycle
    // -----------------------------------------------------------------------

    /// Start the first half.
    ///
    /// # Errors
    ///
    /// Returns a state violation if the match has already started and
    /// [`RosterError::InsufficientRoster`] if a team fields fewer than
    /// seven active players.
    pub fn start_match(&self) -> Result<Transition, EngineError> {
        if self.phase != MatchPhase::NotStarted || self.fixture.status != MatchStatus::NotStarted {
            return Err(self.wrong_phase("start_match").into());
        }
        rules::validate_start(&self.rosters)?;

        let mut next = self.clone();
        next.fixture.status = MatchStatus::Live;
        next.fixture.current_half = 1;
        next.phase = MatchPhase::LiveHalf1;
        next.half_one_opener = next.fixture.active_raiding_team;
        next.clocks.start_match_clock(next.timers.half_duration);

        info!(
            match_id = %next.fixture.id,
            opener = %next.half_one_opener,
            half_duration = next.timers.half_duration,
            "Match started"
        );

        let events = vec![EngineEvent::SaveMatchState(next.patch())];
        Ok(Transition {
            state: next,
            events,
        })
    }

    /// Start the second half after the interval.
    ///
    /// The team that did not open half 1 raids first, and both empty-raid
    /// counters are reset.
    ///
    /// # Errors
    ///
    /// Returns [`StateViolation::WrongPhase`] outside the half-time break.
    pub fn start_second_half(&self) -> Result<Transition, EngineError> {
        if self.phase != MatchPhase::HalfTimeBreak {
            return Err(self.wrong_phase("start_second_half").into());
        }

        let mut next = self.clone();
        next.fixture.current_half = 2;
        next.fixture.status = MatchStatus::Live;
        next.fixture.active_raiding_team = next.half_one_opener.opponent();
        next.phase = MatchPhase::LiveHalf2;
        next.empty_raids = EmptyRaidCounters::default();
        next.clocks.start_match_clock(next.timers.half_duration);

        info!(
            match_id = %next.fixture.id,
            opener = %next.fixture.active_raiding_team,
            "Second half started"
        );

        let events = vec![EngineEvent::SaveMatchState(next.patch())];
        Ok(Transition {
            state: next,
            events,
        })
    }

    /// Freeze a completed match against further edits.
    ///
    /// # Errors
    ///
    /// Returns [`StateViolation::WrongPhase`] unless the match is completed.
    pub fn lock(&self) -> Result<Transition, EngineError> {
        if self.fixture.status != MatchStatus::Completed {
            return Err(self.wrong_phase("lock").into());
        }
        let mut next = self.clone();
        next.fixture.status = MatchStatus::Locked;
        info!(match_id = %next.fixture.id, "Match locked");
        let events = vec![EngineEvent::SaveMatchState(next.patch())];
        Ok(Transition {
            state: next,
            events,
        })
    }

    // -----------------------------------------------------------------------
    // Raids
    // -----------------------------------------------------------------------

    /// Put a raider in flight and start the raid clock.
    ///
    /// # Errors
    ///
    /// Returns [`StateViolation::RaidInFlight`] if a raid is already in
    /// flight, [`StateViolation::TimeoutActive`] during a timeout, and
    /// [`StateViolation::InvalidRaiderState`] if the raider may not raid.
    pub fn start_raid(&self, raider_id: PlayerId) -> Result<Transition, EngineError> {
        self.require_live_half("start_raid")?;
        if matches!(self.raid, RaidPhase::Raiding { .. }) {
            return Err(StateViolation::RaidInFlight.into());
        }
        if self.clocks.timeout_active() {
            return Err(StateViolation::TimeoutActive.into());
        }

        let side = self.fixture.active_raiding_team;
        rules::validate_raider(&self.fixture, &self.rosters, side, raider_id)?;
        let do_or_die = rules::is_do_or_die(self.empty_raids, side);

        let mut next = self.clone();
        next.raid = RaidPhase::Raiding {
            raider_id,
            do_or_die,
        };
        next.clocks.start_raid_clock(next.timers.raid_duration);

        info!(
            match_id = %next.fixture.id,
            raider = %raider_id,
            side = %side,
            do_or_die,
            "Raid started"
        );

        let mut events = vec![EngineEvent::Audio(AudioCue::RaidStart)];
        if do_or_die {
            events.push(EngineEvent::Audio(AudioCue::DodBuzzer));
        }
        Ok(Transition {
            state: next,
            events,
        })
    }

    /// Resolve a regulation raid.
    ///
    /// Accepted from an idle live half (immediate submission) or for the
    /// raider in flight. If the half clock already expired during this
    /// raid, half-end processing runs after the raid is scored.
    ///
    /// # Errors
    ///
    /// Returns [`StateViolation::MatchNotLive`] when the match is not
    /// live, [`StateViolation::InvalidRaiderState`] for an ineligible
    /// raider or a raider other than the one in flight, and
    /// [`StateViolation::InvalidAction`] for a malformed action.
    pub fn resolve_raid(&self, action: &RaidAction) -> Result<Transition, EngineError> {
        self.apply_raid(action, false)
    }

    /// Cancel the raid in flight. Idempotent.
    ///
    /// Score, outs and counters are untouched. If the half clock expired
    /// during the raid, half-end processing runs now.
    pub fn stop_raid(&self) -> Transition {
        let RaidPhase::Raiding { raider_id, .. } = self.raid else {
            return Transition {
                state: self.clone(),
                events: Vec::new(),
            };
        };

        let mut next = self.clone();
        next.raid = RaidPhase::Idle;
        next.clocks.clear_raid_clock();
        info!(match_id = %next.fixture.id, raider = %raider_id, "Raid stopped");

        let mut events = Vec::new();
        if let MatchPhase::CompletingRaid { half } = next.phase {
            next.end_half(half, &mut events);
        }
        Transition {
            state: next,
            events,
        }
    }

    fn apply_raid(&self, action: &RaidAction, from_redo: bool) -> Result<Transition, EngineError> {
        if self.fixture.status != MatchStatus::Live {
            return Err(StateViolation::MatchNotLive.into());
        }
        let completing = match self.phase {
            MatchPhase::LiveHalf1 | MatchPhase::LiveHalf2 => None,
            MatchPhase::CompletingRaid { half } => Some(half),
            _ => return Err(self.wrong_phase("resolve_raid").into()),
        };
        if let RaidPhase::Raiding { raider_id, .. } = self.raid {
            if raider_id != action.raider_id {
                return Err(StateViolation::InvalidRaiderState {
                    raider_id: action.raider_id,
                    reason: format!("raider {raider_id} is in flight"),
                }
                .into());
            }
        }

        let ResolvedRaid {
            fixture,
            empty_raids,
            award,
        } = rules::resolve_raid(
            &self.fixture,
            RaidContext {
                rosters: &self.rosters,
                empty_raids: self.empty_raids,
            },
            action,
        )?;

        let event_id = EventId::new();
        let half = self.fixture.current_half;
        let snapshot = MatchSnapshot {
            action: action.clone(),
            raiding_side: award.raiding_side,
            half,
            score_before: self.fixture.score(),
            out_before: self.fixture.out_player_ids.clone(),
            rosters_before: self.rosters.clone(),
            is_all_out: !award.all_out_sides.is_empty(),
            empty_raids_before: self.empty_raids,
            recent_before: self.recent.clone(),
            event_id,
        };

        let mut next = self.clone();
        next.fixture = fixture;
        next.empty_raids = empty_raids;
        next.recent
            .push(award.raiding_side, award.outcome_code.clone());
        next.history.record(snapshot, from_redo);
        next.raid = RaidPhase::Idle;
        next.clocks.clear_raid_clock();
        if let Err(err) = next.ledger.record_raid(event_id, &award.point_lines()) {
            error!(match_id = %next.fixture.id, event = %event_id, error = %err, "Failed to record raid points");
        }

        info!(
            match_id = %next.fixture.id,
            event = %event_id,
            side = %award.raiding_side,
            raiding_points = award.raiding_points,
            defending_points = award.defending_points,
            score_a = next.fixture.team_a_score,
            score_b = next.fixture.team_b_score,
            from_redo,
            "Raid resolved"
        );
        if award.super_tackle {
            info!(match_id = %next.fixture.id, side = %award.raiding_side.opponent(), "Super tackle");
        }
        if award.dod_converted {
            info!(match_id = %next.fixture.id, side = %award.raiding_side, "Empty Do-or-Die raid converted to a tackle");
        }
        for side in &award.all_out_sides {
            info!(match_id = %next.fixture.id, side = %side, "All-out");
        }

        let mut events = Vec::with_capacity(4);
        let scored = award.raiding_points > 0;
        let dod_failed = award.do_or_die && award.action.raider_out;
        events.push(EngineEvent::SaveRaid(RaidEvent {
            id: event_id,
            match_id: next.fixture.id,
            half: Some(half),
            raiding_side: award.raiding_side,
            all_out_points: award.all_out_points(),
            action: award.action,
            raiding_points: award.raiding_points,
            defending_points: award.defending_points,
            all_out_sides: award.all_out_sides,
            super_tackle: award.super_tackle,
            do_or_die: award.do_or_die,
            revived: award.revived,
            outcome_code: award.outcome_code,
            created_at: Utc::now(),
        }));
        events.push(EngineEvent::SaveMatchState(next.patch()));
        if scored {
            events.push(EngineEvent::Audio(AudioCue::Success));
        }
        if dod_failed {
            events.push(EngineEvent::Audio(AudioCue::DodBuzzer));
        }

        next.check_conservation();

        if let Some(half) = completing {
            next.end_half(half, &mut events);
        }
        Ok(Transition {
            state: next,
            events,
        })
    }

    // -----------------------------------------------------------------------
    // Undo / redo
    // -----------------------------------------------------------------------

    /// Undo the latest raid of the current half.
    ///
    /// Restores the pre-raid score, outs, counters, last-raids indicator
    /// and raiding side, parks the raid for redo, and asks persistence to
    /// delete its event.
    ///
    /// Restored outs land on whoever holds the slot now, so a substitution
    /// made after the raid keeps the court count.
    ///
    /// # Errors
    ///
    /// Returns [`StateViolation::NothingToUndo`] when there is no raid of
    /// the current half to undo and [`StateViolation::RaidInFlight`] while
    /// a raid is in flight.
    pub fn undo(&self) -> Result<Transition, EngineError> {
        self.require_live_half("undo")?;
        if matches!(self.raid, RaidPhase::Raiding { .. }) {
            return Err(StateViolation::RaidInFlight.into());
        }
        match self.history.last() {
            Some(last) if last.half == self.fixture.current_half => {}
            _ => return Err(StateViolation::NothingToUndo.into()),
        }

        let mut next = self.clone();
        let snapshot = next
            .history
            .undo()
            .ok_or(StateViolation::NothingToUndo)?;

        next.fixture.set_score(snapshot.score_before);
        // Out status belongs to the slot; follow substitutions made since.
        let mut outs = snapshot.out_before.clone();
        for side in [Side::A, Side::B] {
            outs = rules::carry_outs(
                snapshot.rosters_before.get(side),
                next.rosters.get(side),
                &outs,
            );
        }
        next.fixture.out_player_ids = outs;
        next.fixture.active_raiding_team = snapshot.raiding_side;
        next.empty_raids = snapshot.empty_raids_before;
        next.recent.clone_from(&snapshot.recent_before);

        match next.ledger.reverse_event(snapshot.event_id) {
            Ok(_) | Err(LedgerError::NothingToReverse { .. }) => {}
            Err(err) => {
                error!(match_id = %next.fixture.id, event = %snapshot.event_id, error = %err, "Failed to reverse raid points");
            }
        }

        info!(
            match_id = %next.fixture.id,
            event = %snapshot.event_id,
            score_a = next.fixture.team_a_score,
            score_b = next.fixture.team_b_score,
            "Raid undone"
        );
        next.check_conservation();

        let events = vec![
            EngineEvent::DeleteRaid(snapshot.event_id),
            EngineEvent::SaveMatchState(next.patch()),
        ];
        Ok(Transition {
            state: next,
            events,
        })
    }

    /// Re-apply the most recently undone raid.
    ///
    /// The raid is resolved afresh against the current rosters, so a
    /// substitution made since the undo can change the outcome or make
    /// the raid invalid. The re-applied raid gets a new event id.
    ///
    /// # Errors
    ///
    /// Returns [`StateViolation::NothingToRedo`] when the redo stack is
    /// empty, or any error raid resolution can return. On error the redo
    /// entry stays available.
    pub fn redo(&self) -> Result<Transition, EngineError> {
        self.require_live_half("redo")?;
        if matches!(self.raid, RaidPhase::Raiding { .. }) {
            return Err(StateViolation::RaidInFlight.into());
        }

        let mut base = self.clone();
        let entry = base
            .history
            .take_redo()
            .ok_or(StateViolation::NothingToRedo)?;
        let transition = base.apply_raid(&entry.action, true)?;
        debug!(match_id = %self.fixture.id, undone = %entry.event_id, "Raid redone");
        Ok(transition)
    }

    // -----------------------------------------------------------------------
    // Substitution
    // -----------------------------------------------------------------------

    /// Swap an active player of `side` with a bench player.
    ///
    /// # Errors
    ///
    /// Returns [`RosterError`] for unknown or wrongly-slotted players,
    /// [`StateViolation::RaidInFlight`] during a raid, and
    /// [`StateViolation::WrongPhase`] once the match has ended.
    pub fn substitute(
        &self,
        side: Side,
        active_id: PlayerId,
        bench_id: PlayerId,
    ) -> Result<Transition, EngineError> {
        if matches!(
            self.fixture.status,
            MatchStatus::Completed | MatchStatus::Locked
        ) {
            return Err(self.wrong_phase("substitute").into());
        }
        if matches!(self.raid, RaidPhase::Raiding { .. }) {
            return Err(StateViolation::RaidInFlight.into());
        }

        let sub = rules::substitute(
            self.rosters.get(side),
            &self.fixture.out_player_ids,
            active_id,
            bench_id,
        )?;

        let mut next = self.clone();
        *next.rosters.get_mut(side) = sub.roster;
        next.fixture.out_player_ids = sub.out_player_ids;

        info!(
            match_id = %next.fixture.id,
            side = %side,
            outgoing = %active_id,
            incoming = %bench_id,
            "Substitution"
        );

        let events = vec![EngineEvent::SaveMatchState(next.patch())];
        Ok(Transition {
            state: next,
            events,
        })
    }

    // -----------------------------------------------------------------------
    // Clocks and timeouts
    // -----------------------------------------------------------------------

    /// Advance the clocks by one second and react to expiries.
    pub fn tick(&self) -> Transition {
        let mut next = self.clone();
        let report = next.clocks.tick(next.timers.sync_interval);
        let mut events = Vec::new();

        if report.timeout_expired {
            info!(match_id = %next.fixture.id, "Timeout over, clocks resumed");
            events.push(EngineEvent::Audio(AudioCue::Buzzer));
        }

        if let Some(remaining) = report.raid_remaining {
            if report.raid_expired {
                info!(match_id = %next.fixture.id, "Raid clock expired");
                events.push(EngineEvent::Audio(AudioCue::Buzzer));
            } else if remaining <= RAID_COUNTDOWN_CUE_SECONDS {
                events.push(EngineEvent::Audio(AudioCue::Tick));
            }
        }

        if report.match_expired {
            events.push(EngineEvent::Audio(AudioCue::Buzzer));
            match next.phase {
                MatchPhase::LiveHalf1 => next.expire_half(1, &mut events),
                MatchPhase::LiveHalf2 => next.expire_half(2, &mut events),
                MatchPhase::HalfTimeBreak => {
                    info!(match_id = %next.fixture.id, "Interval over, waiting for second half");
                }
                _ => {}
            }
        }

        if report.sync_due {
            let mut patch = next.patch();
            patch.clocks = Some(next.clocks.positions());
            events.push(EngineEvent::SaveMatchState(patch));
        }

        Transition {
            state: next,
            events,
        }
    }

    /// Call a timeout.
    ///
    /// Team timeouts count against that team's allowance; official
    /// timeouts are uncapped.
    ///
    /// # Errors
    ///
    /// Returns [`StateViolation::TimeoutLimitReached`] when the team has
    /// no timeouts left and [`StateViolation::TimeoutActive`] when one is
    /// already running.
    pub fn call_timeout(&self, caller: TimeoutCaller) -> Result<Transition, EngineError> {
        self.require_live_half("call_timeout")?;
        if self.clocks.timeout_active() {
            return Err(StateViolation::TimeoutActive.into());
        }

        let mut next = self.clone();
        if let TimeoutCaller::Team(side) = caller {
            let used = self.timeouts.get(side);
            let max = self.timers.max_timeouts;
            if used >= max {
                return Err(StateViolation::TimeoutLimitReached { side, used, max }.into());
            }
            next.timeouts = next.timeouts.incremented(side);
        }
        next.clocks.start_timeout(next.timers.timeout_duration);

        info!(
            match_id = %next.fixture.id,
            caller = ?caller,
            used_a = next.timeouts.team_a,
            used_b = next.timeouts.team_b,
            "Timeout called"
        );

        let events = vec![next.clock_sync()];
        Ok(Transition {
            state: next,
            events,
        })
    }

    /// End the running timeout early and resume the clocks.
    ///
    /// # Errors
    ///
    /// Returns [`StateViolation::NoTimeoutActive`] when no timeout runs.
    pub fn end_timeout(&self) -> Result<Transition, EngineError> {
        if !self.clocks.timeout_active() {
            return Err(StateViolation::NoTimeoutActive.into());
        }
        let mut next = self.clone();
        next.clocks.end_timeout();
        info!(match_id = %next.fixture.id, "Timeout ended early");
        let events = vec![EngineEvent::Audio(AudioCue::Buzzer), next.clock_sync()];
        Ok(Transition {
            state: next,
            events,
        })
    }

    /// Set the shared pause flag outside a timeout.
    ///
    /// # Errors
    ///
    /// Returns [`StateViolation::ClocksAlreadyPaused`] if already paused.
    pub fn pause_clocks(&self) -> Result<Transition, EngineError> {
        self.require_running_match()?;
        if self.clocks.is_paused() {
            return Err(StateViolation::ClocksAlreadyPaused.into());
        }
        let mut next = self.clone();
        next.clocks.set_paused(true);
        info!(match_id = %next.fixture.id, "Clocks paused");
        let events = vec![next.clock_sync()];
        Ok(Transition {
            state: next,
            events,
        })
    }

    /// Clear a manual pause.
    ///
    /// # Errors
    ///
    /// Returns [`StateViolation::TimeoutActive`] during a timeout (end the
    /// timeout instead) and [`StateViolation::ClocksNotPaused`] if the
    /// clocks are running.
    pub fn resume_clocks(&self) -> Result<Transition, EngineError> {
        self.require_running_match()?;
        if self.clocks.timeout_active() {
            return Err(StateViolation::TimeoutActive.into());
        }
        if !self.clocks.is_paused() {
            return Err(StateViolation::ClocksNotPaused.into());
        }
        let mut next = self.clone();
        next.clocks.set_paused(false);
        info!(match_id = %next.fixture.id, "Clocks resumed");
        let events = vec![next.clock_sync()];
        Ok(Transition {
            state: next,
            events,
        })
    }

    // -----------------------------------------------------------------------
    // Tie-breaker
    // -----------------------------------------------------------------------

    /// Accept both shootout line-ups and start the tie-breaker.
    ///
    /// # Errors
    ///
    /// Returns [`StateViolation::WrongPhase`] unless regulation ended
    /// level, and [`RosterError`] for a malformed line-up.
    pub fn setup_tie_breaker(
        &self,
        raiders_a: Vec<PlayerId>,
        raiders_b: Vec<PlayerId>,
        first_raiding_team: Side,
    ) -> Result<Transition, EngineError> {
        if self.phase != MatchPhase::AwaitingTieBreaker {
            return Err(self.wrong_phase("setup_tie_breaker").into());
        }
        let shootout =
            rules::tiebreaker::setup(&self.rosters, raiders_a, raiders_b, first_raiding_team)?;

        let mut next = self.clone();
        next.tie_breaker = Some(shootout);
        next.phase = MatchPhase::TieBreaker;
        info!(match_id = %next.fixture.id, first = %first_raiding_team, "Tie-breaker started");

        let events = vec![EngineEvent::SaveMatchState(next.patch())];
        Ok(Transition {
            state: next,
            events,
        })
    }

    /// Record the next shootout raid.
    ///
    /// Shootout raids are persisted but never enter the undo history.
    /// `rng` settles a level shootout.
    ///
    /// # Errors
    ///
    /// Returns [`StateViolation::WrongPhase`] outside the tie-breaker, or
    /// any shootout rule error.
    pub fn tie_breaker_raid<R: Rng + ?Sized>(
        &self,
        action: &RaidAction,
        rng: &mut R,
    ) -> Result<Transition, EngineError> {
        let Some(shootout) = self.tie_breaker.as_ref() else {
            return Err(self.wrong_phase("tie_breaker_raid").into());
        };
        if self.phase != MatchPhase::TieBreaker {
            if shootout.winner.is_some() {
                return Err(StateViolation::TieBreakerComplete.into());
            }
            return Err(self.wrong_phase("tie_breaker_raid").into());
        }

        let raid = rules::record_raid(shootout, action, rng)?;

        let mut next = self.clone();
        let event_id = EventId::new();
        let scored = raid.raiding_points > 0;
        let winner = raid.state.winner;
        let mut events = vec![EngineEvent::SaveRaid(RaidEvent {
            id: event_id,
            match_id: next.fixture.id,
            half: None,
            raiding_side: raid.raiding_side,
            action: action.clone(),
            raiding_points: raid.raiding_points,
            defending_points: raid.defending_points,
            all_out_points: 0,
            all_out_sides: Vec::new(),
            super_tackle: false,
            do_or_die: false,
            revived: Vec::new(),
            outcome_code: raid.outcome_code,
            created_at: Utc::now(),
        })];
        if scored {
            events.push(EngineEvent::Audio(AudioCue::Success));
        }

        debug!(
            match_id = %next.fixture.id,
            raid = raid.state.raid_index,
            score_a = raid.state.score.team_a,
            score_b = raid.state.score.team_b,
            "Shootout raid"
        );
        next.tie_breaker = Some(raid.state);

        match winner {
            Some(side) => next.finish(side, &mut events),
            None => events.push(EngineEvent::SaveMatchState(next.patch())),
        }
        Ok(Transition {
            state: next,
            events,
        })
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn wrong_phase(&self, operation: &'static str) -> StateViolation {
        StateViolation::WrongPhase {
            operation,
            phase: format!("{:?}", self.phase),
        }
    }

    fn require_live_half(&self, operation: &'static str) -> Result<(), StateViolation> {
        if self.fixture.status != MatchStatus::Live {
            return Err(StateViolation::MatchNotLive);
        }
        if !self.phase.is_live_half() {
            return Err(self.wrong_phase(operation));
        }
        Ok(())
    }

    const fn require_running_match(&self) -> Result<(), StateViolation> {
        match self.fixture.status {
            MatchStatus::Live | MatchStatus::HalfTime => Ok(()),
            MatchStatus::NotStarted | MatchStatus::Completed | MatchStatus::Locked => {
                Err(StateViolation::MatchNotLive)
            }
        }
    }

    fn clock_sync(&self) -> EngineEvent {
        let mut patch = self.patch();
        patch.clocks = Some(self.clocks.positions());
        EngineEvent::SaveMatchState(patch)
    }

    fn check_conservation(&self) {
        if let ConservationResult::Anomaly(anomaly) =
            self.ledger.verify_conservation(self.fixture.score())
        {
            error!(match_id = %self.fixture.id, %anomaly, "Scoreboard does not match points ledger");
        }
    }

    /// The half clock reached zero.
    fn expire_half(&mut self, half: u8, events: &mut Vec<EngineEvent>) {
        if matches!(self.raid, RaidPhase::Raiding { .. }) {
            self.phase = MatchPhase::CompletingRaid { half };
            info!(match_id = %self.fixture.id, half, "Half clock expired during a raid, completing raid");
        } else {
            self.end_half(half, events);
        }
    }

    fn end_half(&mut self, half: u8, events: &mut Vec<EngineEvent>) {
        self.raid = RaidPhase::Idle;
        self.clocks.clear_raid_clock();
        self.clocks.stop_match_clock();
        self.history.clear_redo();

        if half == 1 {
            let summary = HalfSummary {
                half: 1,
                score: self.fixture.score(),
                raids_a: self.history.raids_in_half(1, Side::A),
                raids_b: self.history.raids_in_half(1, Side::B),
            };
            self.half_summary = Some(summary);
            self.fixture.status = MatchStatus::HalfTime;
            self.phase = MatchPhase::HalfTimeBreak;
            self.clocks.start_match_clock(self.timers.interval_duration);

            info!(
                match_id = %self.fixture.id,
                score_a = summary.score.team_a,
                score_b = summary.score.team_b,
                raids_a = summary.raids_a,
                raids_b = summary.raids_b,
                "First half ended"
            );

            let mut patch = self.patch();
            patch.half_summary = Some(summary);
            events.push(EngineEvent::SaveMatchState(patch));
        } else if let Some(winner) = self.fixture.score().leader() {
            self.finish(winner, events);
        } else {
            self.phase = MatchPhase::AwaitingTieBreaker;
            info!(
                match_id = %self.fixture.id,
                score = self.fixture.team_a_score,
                "Regulation ended level, awaiting tie-breaker line-ups"
            );
            events.push(EngineEvent::SaveMatchState(self.patch()));
        }
    }

    fn finish(&mut self, winner: Side, events: &mut Vec<EngineEvent>) {
        self.phase = MatchPhase::MatchEnded;
        self.fixture.status = MatchStatus::Completed;
        self.winner = Some(winner);
        self.raid = RaidPhase::Idle;
        self.clocks.stop_match_clock();
        self.clocks.clear_raid_clock();
        if self.clocks.timeout_active() {
            warn!(match_id = %self.fixture.id, "Match ended during a timeout");
            self.clocks.end_timeout();
        }

        let winning_team_id = self.fixture.team_id(winner);
        info!(
            match_id = %self.fixture.id,
            winner = %winner,
            team = %winning_team_id,
            score_a = self.fixture.team_a_score,
            score_b = self.fixture.team_b_score,
            "Match ended"
        );

        events.push(EngineEvent::SaveMatchState(self.patch()));
        if let Some(advancement) = self.fixture.advancement {
            events.push(EngineEvent::AdvanceWinner {
                next_match_id: advancement.next_match_id,
                slot: advancement.slot,
                winning_team_id,
            });
        }
    }
}
