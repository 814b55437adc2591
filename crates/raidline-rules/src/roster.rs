//! Roster checks made before a match goes live.

use raidline_types::{Rosters, Side};

use crate::error::RosterError;

/// Active players each team must field to start a match.
pub const MIN_ACTIVE_PLAYERS: usize = 7;

/// Check that both teams field at least [`MIN_ACTIVE_PLAYERS`] on court.
///
/// # Errors
///
/// Returns [`RosterError::InsufficientRoster`] for the first short team.
pub fn validate_start(rosters: &Rosters) -> Result<(), RosterError> {
    for side in [Side::A, Side::B] {
        let roster = rosters.get(side);
        let active = roster.active_count();
        if active < MIN_ACTIVE_PLAYERS {
            return Err(RosterError::InsufficientRoster {
                team_id: roster.team_id,
                active,
                required: MIN_ACTIVE_PLAYERS,
            });
        }
    }
    Ok(())
}
