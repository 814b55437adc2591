//! Core entity structs: players and rosters, the match record, history
//! snapshots, tie-breaker state, and the payloads handed to persistence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::actions::RaidAction;
use crate::enums::{EntryDirection, MatchStatus, PointKind, RosterSlot, Side};
use crate::ids::{EventId, MatchId, PlayerId, TeamId};

/// Number of raids shown in the rolling "last raids" indicator.
pub const RECENT_RAID_WINDOW: usize = 5;

// ---------------------------------------------------------------------------
// Players and rosters
// ---------------------------------------------------------------------------

/// A player on a team sheet.
///
/// Whether the player is out is not stored here; it is derived from
/// membership in [`Match::out_player_ids`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Player {
    /// Unique player identifier.
    pub id: PlayerId,
    /// The team this player belongs to.
    pub team_id: TeamId,
    /// Display name.
    pub name: String,
    /// Shirt number.
    pub jersey_number: u8,
    /// Active court position or bench.
    pub slot: RosterSlot,
}

/// One team's full player list as supplied by the roster collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Roster {
    /// The team the roster belongs to.
    pub team_id: TeamId,
    /// Every player on the team sheet, active and bench.
    pub players: Vec<Player>,
}

impl Roster {
    /// Find a player by id.
    pub fn find(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    /// Whether the player is on this roster in any slot.
    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.find(player_id).is_some()
    }

    /// Whether the player is on this roster in an active slot.
    pub fn is_active(&self, player_id: PlayerId) -> bool {
        self.find(player_id).is_some_and(|p| p.slot.is_active())
    }

    /// Iterate over the ids of players in active slots.
    pub fn active_ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.players
            .iter()
            .filter(|p| p.slot.is_active())
            .map(|p| p.id)
    }

    /// Number of players in active slots.
    pub fn active_count(&self) -> usize {
        self.active_ids().count()
    }
}

/// Both teams' rosters, indexed by [`Side`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Rosters {
    /// Roster of the team in slot A.
    pub team_a: Roster,
    /// Roster of the team in slot B.
    pub team_b: Roster,
}

impl Rosters {
    /// Roster for the given side.
    pub const fn get(&self, side: Side) -> &Roster {
        match side {
            Side::A => &self.team_a,
            Side::B => &self.team_b,
        }
    }

    /// Mutable roster for the given side.
    pub const fn get_mut(&mut self, side: Side) -> &mut Roster {
        match side {
            Side::A => &mut self.team_a,
            Side::B => &mut self.team_b,
        }
    }

    /// The side a player belongs to, if any.
    pub fn side_of(&self, player_id: PlayerId) -> Option<Side> {
        if self.team_a.contains(player_id) {
            Some(Side::A)
        } else if self.team_b.contains(player_id) {
            Some(Side::B)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Match
// ---------------------------------------------------------------------------

/// Where the winner of a match advances to in a bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Advancement {
    /// The fixture the winner feeds into.
    pub next_match_id: MatchId,
    /// Which team slot of the next fixture the winner fills.
    pub slot: Side,
}

/// The persisted match record.
///
/// Created by the fixtures collaborator before the engine attaches. While
/// the match is live the engine owns the score, out-set, half, and
/// raiding-team fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Match {
    /// Unique match identifier.
    pub id: MatchId,
    /// Team in slot A.
    pub team_a_id: TeamId,
    /// Team in slot B.
    pub team_b_id: TeamId,
    /// Current score of team A.
    pub team_a_score: u32,
    /// Current score of team B.
    pub team_b_score: u32,
    /// Current half, 1 or 2.
    pub current_half: u8,
    /// The side whose turn it is to raid.
    pub active_raiding_team: Side,
    /// Players currently out, oldest first.
    ///
    /// The order is the revival queue: revivals take the earliest-out
    /// player of the benefiting side first.
    pub out_player_ids: Vec<PlayerId>,
    /// Lifecycle status.
    pub status: MatchStatus,
    /// Bracket destination for the winner, if this is a knockout fixture.
    pub advancement: Option<Advancement>,
}

impl Match {
    /// Create a fresh fixture between two teams.
    pub const fn new(id: MatchId, team_a_id: TeamId, team_b_id: TeamId) -> Self {
        Self {
            id,
            team_a_id,
            team_b_id,
            team_a_score: 0,
            team_b_score: 0,
            current_half: 1,
            active_raiding_team: Side::A,
            out_player_ids: Vec::new(),
            status: MatchStatus::NotStarted,
            advancement: None,
        }
    }

    /// Current score as a pair.
    pub const fn score(&self) -> ScorePair {
        ScorePair {
            team_a: self.team_a_score,
            team_b: self.team_b_score,
        }
    }

    /// Overwrite the score from a pair.
    pub const fn set_score(&mut self, score: ScorePair) {
        self.team_a_score = score.team_a;
        self.team_b_score = score.team_b;
    }

    /// Team id for the given side.
    pub const fn team_id(&self, side: Side) -> TeamId {
        match side {
            Side::A => self.team_a_id,
            Side::B => self.team_b_id,
        }
    }

    /// Whether the player is currently out.
    pub fn is_out(&self, player_id: PlayerId) -> bool {
        self.out_player_ids.contains(&player_id)
    }
}

/// A score for both sides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ScorePair {
    /// Points for team A.
    pub team_a: u32,
    /// Points for team B.
    pub team_b: u32,
}

impl ScorePair {
    /// Points for the given side.
    pub const fn get(self, side: Side) -> u32 {
        match side {
            Side::A => self.team_a,
            Side::B => self.team_b,
        }
    }

    /// A copy with `points` added to `side`.
    #[must_use]
    pub const fn with_added(self, side: Side, points: u32) -> Self {
        match side {
            Side::A => Self {
                team_a: self.team_a.saturating_add(points),
                team_b: self.team_b,
            },
            Side::B => Self {
                team_a: self.team_a,
                team_b: self.team_b.saturating_add(points),
            },
        }
    }

    /// Combined points of both sides.
    pub const fn total(self) -> u32 {
        self.team_a.saturating_add(self.team_b)
    }

    /// The side with strictly more points, or `None` when level.
    pub const fn leader(self) -> Option<Side> {
        if self.team_a > self.team_b {
            Some(Side::A)
        } else if self.team_b > self.team_a {
            Some(Side::B)
        } else {
            None
        }
    }
}

/// Consecutive empty raids per side, driving Do-or-Die.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EmptyRaidCounters {
    /// Team A's current run of empty raids.
    pub team_a: u8,
    /// Team B's current run of empty raids.
    pub team_b: u8,
}

impl EmptyRaidCounters {
    /// Counter for the given side.
    pub const fn get(self, side: Side) -> u8 {
        match side {
            Side::A => self.team_a,
            Side::B => self.team_b,
        }
    }

    /// A copy with `side`'s counter replaced.
    #[must_use]
    pub const fn with(self, side: Side, value: u8) -> Self {
        match side {
            Side::A => Self {
                team_a: value,
                team_b: self.team_b,
            },
            Side::B => Self {
                team_a: self.team_a,
                team_b: value,
            },
        }
    }
}

/// Team timeouts used so far in the match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TimeoutCounts {
    /// Timeouts called by team A.
    pub team_a: u8,
    /// Timeouts called by team B.
    pub team_b: u8,
}

impl TimeoutCounts {
    /// Count for the given side.
    pub const fn get(self, side: Side) -> u8 {
        match side {
            Side::A => self.team_a,
            Side::B => self.team_b,
        }
    }

    /// A copy with one more timeout charged to `side`.
    #[must_use]
    pub const fn incremented(self, side: Side) -> Self {
        match side {
            Side::A => Self {
                team_a: self.team_a.saturating_add(1),
                team_b: self.team_b,
            },
            Side::B => Self {
                team_a: self.team_a,
                team_b: self.team_b.saturating_add(1),
            },
        }
    }
}

/// Rolling per-team indicator of the most recent raid outcome codes.
///
/// Codes are `"W"` for a tackled raider, otherwise the raid's points as a
/// decimal string. At most [`RECENT_RAID_WINDOW`] codes are kept per side,
/// newest last.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RecentRaids {
    /// Team A's recent raid codes.
    pub team_a: Vec<String>,
    /// Team B's recent raid codes.
    pub team_b: Vec<String>,
}

impl RecentRaids {
    /// Codes for the given side, oldest first.
    pub fn get(&self, side: Side) -> &[String] {
        match side {
            Side::A => &self.team_a,
            Side::B => &self.team_b,
        }
    }

    /// Append a code for `side`, dropping the oldest beyond the window.
    pub fn push(&mut self, side: Side, code: String) {
        let codes = match side {
            Side::A => &mut self.team_a,
            Side::B => &mut self.team_b,
        };
        codes.push(code);
        if codes.len() > RECENT_RAID_WINDOW {
            let excess = codes.len().saturating_sub(RECENT_RAID_WINDOW);
            codes.drain(..excess);
        }
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// One entry of the undo history.
///
/// Captures the raid as submitted plus everything needed to put the
/// scoreboard back the way it was before the raid. Immutable once pushed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MatchSnapshot {
    /// The raid action as the scorer submitted it.
    pub action: RaidAction,
    /// The side that raided.
    pub raiding_side: Side,
    /// Half in which the raid was played.
    pub half: u8,
    /// Score before the raid.
    pub score_before: ScorePair,
    /// Out players before the raid, in revival order.
    pub out_before: Vec<PlayerId>,
    /// Court slots before the raid, so undo can follow substitutions.
    pub rosters_before: Rosters,
    /// Whether the raid produced an all-out.
    pub is_all_out: bool,
    /// Empty-raid counters before the raid.
    pub empty_raids_before: EmptyRaidCounters,
    /// Recent-raids indicator before the raid.
    pub recent_before: RecentRaids,
    /// Id of the raid event persisted for this raid.
    pub event_id: EventId,
}

// ---------------------------------------------------------------------------
// Tie-breaker
// ---------------------------------------------------------------------------

/// State of a tie-breaker shootout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TieBreakerState {
    /// Team A's five nominated raiders, in raiding order.
    pub raiders_a: Vec<PlayerId>,
    /// Team B's five nominated raiders, in raiding order.
    pub raiders_b: Vec<PlayerId>,
    /// Number of shootout raids played so far (0..=10).
    pub raid_index: u8,
    /// Cumulative shootout score.
    pub score: ScorePair,
    /// The side that raids first.
    pub first_raiding_team: Side,
    /// The winner once decided.
    pub winner: Option<Side>,
    /// Side awarded the golden raid when the shootout finished level.
    pub golden_raid: Option<Side>,
}

// ---------------------------------------------------------------------------
// Persistence payloads
// ---------------------------------------------------------------------------

/// A resolved raid as handed to persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RaidEvent {
    /// Unique event id, minted at resolution.
    pub id: EventId,
    /// The match the raid belongs to.
    pub match_id: MatchId,
    /// Half the raid was played in; `None` for tie-breaker raids.
    pub half: Option<u8>,
    /// The side that raided.
    pub raiding_side: Side,
    /// The action after Do-or-Die conversion.
    pub action: RaidAction,
    /// Touch and bonus points to the raiding side.
    pub raiding_points: u32,
    /// Tackle points to the defending side.
    pub defending_points: u32,
    /// All-out bonus points, awarded to the opponents of `all_out_sides`.
    pub all_out_points: u32,
    /// Sides put all-out by this raid.
    pub all_out_sides: Vec<Side>,
    /// Whether the tackle was a super tackle.
    pub super_tackle: bool,
    /// Whether the raid was Do-or-Die.
    pub do_or_die: bool,
    /// Players revived by this raid.
    pub revived: Vec<PlayerId>,
    /// Code for the recent-raids indicator.
    pub outcome_code: String,
    /// Wall-clock time of resolution.
    pub created_at: DateTime<Utc>,
}

/// Half-level aggregate persisted at the end of the first half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HalfSummary {
    /// The half summarized.
    pub half: u8,
    /// Score at the end of the half.
    pub score: ScorePair,
    /// Raids played by team A in the half.
    pub raids_a: u32,
    /// Raids played by team B in the half.
    pub raids_b: u32,
}

/// Clock positions for periodic timer sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ClockPositions {
    /// Seconds left on the match (or interval) clock.
    pub match_remaining: u32,
    /// Seconds left on the raid clock, if a raid is timed.
    pub raid_remaining: Option<u32>,
    /// Seconds left on the timeout clock, if a timeout is active.
    pub timeout_remaining: Option<u32>,
    /// The shared pause flag.
    pub paused: bool,
}

/// Partial match-state update handed to persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MatchStatePatch {
    /// The match being updated.
    pub match_id: MatchId,
    /// Team A's score.
    pub team_a_score: u32,
    /// Team B's score.
    pub team_b_score: u32,
    /// Current half.
    pub current_half: u8,
    /// The side due to raid next.
    pub active_raiding_team: Side,
    /// Players currently out.
    pub out_player_ids: Vec<PlayerId>,
    /// Lifecycle status.
    pub status: MatchStatus,
    /// Clock positions, present on periodic syncs.
    pub clocks: Option<ClockPositions>,
    /// Half aggregate, present at the end of the first half.
    pub half_summary: Option<HalfSummary>,
    /// Winning team, present once the match is decided.
    pub winner_team_id: Option<TeamId>,
    /// Shootout state, present during and after a tie-breaker.
    pub tie_breaker: Option<TieBreakerState>,
}

impl MatchStatePatch {
    /// Patch carrying the match record's scoreboard fields only.
    pub fn from_match(fixture: &Match) -> Self {
        Self {
            match_id: fixture.id,
            team_a_score: fixture.team_a_score,
            team_b_score: fixture.team_b_score,
            current_half: fixture.current_half,
            active_raiding_team: fixture.active_raiding_team,
            out_player_ids: fixture.out_player_ids.clone(),
            status: fixture.status,
            clocks: None,
            half_summary: None,
            winner_team_id: None,
            tie_breaker: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// One line in the points ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LedgerEntry {
    /// Position in the ledger, starting at 1.
    pub sequence: u64,
    /// The raid event the points belong to.
    pub event_id: EventId,
    /// The side credited (or debited, for reversals).
    pub side: Side,
    /// Why the points were awarded.
    pub kind: PointKind,
    /// Number of points, always positive.
    pub points: u32,
    /// Award or reversal.
    pub direction: EntryDirection,
    /// Wall-clock time the entry was recorded.
    pub recorded_at: DateTime<Utc>,
}
