//! Scoring rules for the Raidline kabaddi engine.
//!
//! This crate holds the pure rule functions -- everything that turns a
//! match record and a scorer's input into a new match record without
//! touching clocks, persistence, or audio. It sits between
//! `raidline-types` (the data model) and `raidline-core` (the state
//! machine that sequences rules, clocks, and collaborator calls).
//!
//! # Modules
//!
//! - [`error`] -- Rule rejections ([`StateViolation`], [`RosterError`], [`RuleError`])
//! - [`raid`] -- Regulation raid resolution: Do-or-Die, super tackle, all-out, revival
//! - [`roster`] -- Pre-match roster checks
//! - [`substitution`] -- Active/bench swaps that keep the revival queue intact
//! - [`tiebreaker`] -- The ten-raid shootout and golden raid

pub mod error;
pub mod raid;
pub mod roster;
pub mod substitution;
pub mod tiebreaker;

// Re-export primary types at crate root for convenience.
pub use error::{RosterError, RuleError, StateViolation};
pub use raid::{
    ALL_OUT_BONUS, RaidAward, RaidContext, ResolvedRaid, is_do_or_die, players_on_court,
    resolve_raid, validate_raider,
};
pub use roster::{MIN_ACTIVE_PLAYERS, validate_start};
pub use substitution::{Substitution, carry_outs, substitute};
pub use tiebreaker::{SHOOTOUT_RAIDERS, SHOOTOUT_RAIDS, ShootoutRaid, record_raid, scheduled_raider};
