//! Shared type definitions for the Raidline kabaddi scoring engine.
//!
//! This crate is the single source of truth for the data model shared by
//! the rules, ledger, and engine crates. Types flow to `TypeScript` via
//! `ts-rs` so the scoreboard UI renders exactly what the engine persists.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for matches, teams, players, events
//! - [`enums`] -- Sides, lifecycle phases, roster slots, audio cues
//! - [`structs`] -- Match record, rosters, snapshots, persistence payloads
//! - [`actions`] -- The raid action submitted by the scorer

pub mod actions;
pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use actions::RaidAction;
pub use enums::{
    AudioCue, EntryDirection, MatchPhase, MatchStatus, PointKind, RaidOutcome, RosterSlot, Side,
    TimeoutCaller,
};
pub use ids::{EventId, MatchId, PlayerId, TeamId};
pub use structs::{
    Advancement, ClockPositions, EmptyRaidCounters, HalfSummary, LedgerEntry, Match,
    MatchSnapshot, MatchStatePatch, Player, RECENT_RAID_WINDOW, RaidEvent, RecentRaids, Roster,
    Rosters, ScorePair, TieBreakerState, TimeoutCounts,
};
