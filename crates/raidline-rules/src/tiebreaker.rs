//! Tie-breaker shootout.
//!
//! Entered when regulation ends level. Each team nominates exactly five
//! raiders; the two teams then alternate for ten raids, starting with the
//! designated first team. Raid `i` (0-based) is taken by raider `i / 2`
//! of whichever team's turn it is. Do-or-Die, super tackles, revival and
//! all-outs do not apply: a raid awards touch plus bonus to the raiders or
//! one point to the defenders on a tackle.
//!
//! After ten raids the higher shootout score wins. A level shootout is
//! settled by a golden raid awarded to a side drawn by an unweighted coin
//! flip from the supplied random number generator.

use rand::Rng;
use raidline_types::{PlayerId, RaidAction, Rosters, ScorePair, Side, TieBreakerState};
use tracing::{debug, info};

use crate::error::{RosterError, RuleError, StateViolation};
use crate::raid::{RAIDER_OUT_CODE, TACKLE_POINTS};

/// Raiders each team nominates for the shootout.
pub const SHOOTOUT_RAIDERS: usize = 5;

/// Raids played before the shootout is decided.
pub const SHOOTOUT_RAIDS: u8 = 10;

/// Validate both line-ups and build the initial shootout state.
///
/// Nominees may come from the active line-up or the bench, but must be
/// five distinct members of their own team's roster.
///
/// # Errors
///
/// Returns [`RosterError::InvalidLineup`], [`RosterError::DuplicateNominee`]
/// or [`RosterError::PlayerNotFound`] for a malformed line-up.
pub fn setup(
    rosters: &Rosters,
    raiders_a: Vec<PlayerId>,
    raiders_b: Vec<PlayerId>,
    first_raiding_team: Side,
) -> Result<TieBreakerState, RosterError> {
    validate_lineup(rosters, Side::A, &raiders_a)?;
    validate_lineup(rosters, Side::B, &raiders_b)?;

    info!(first = %first_raiding_team, "Tie-breaker line-ups accepted");

    Ok(TieBreakerState {
        raiders_a,
        raiders_b,
        raid_index: 0,
        score: ScorePair::default(),
        first_raiding_team,
        winner: None,
        golden_raid: None,
    })
}

fn validate_lineup(rosters: &Rosters, side: Side, raiders: &[PlayerId]) -> Result<(), RosterError> {
    if raiders.len() != SHOOTOUT_RAIDERS {
        return Err(RosterError::InvalidLineup {
            side,
            count: raiders.len(),
            required: SHOOTOUT_RAIDERS,
        });
    }

    let roster = rosters.get(side);
    let mut seen: Vec<PlayerId> = Vec::with_capacity(SHOOTOUT_RAIDERS);
    for &player_id in raiders {
        if !roster.contains(player_id) {
            return Err(RosterError::PlayerNotFound {
                player_id,
                team_id: roster.team_id,
            });
        }
        if seen.contains(&player_id) {
            return Err(RosterError::DuplicateNominee { player_id });
        }
        seen.push(player_id);
    }
    Ok(())
}

/// The side due to raid next.
pub const fn raiding_side(state: &TieBreakerState) -> Side {
    if state.raid_index % 2 == 0 {
        state.first_raiding_team
    } else {
        state.first_raiding_team.opponent()
    }
}

/// The raider due next, or `None` once all ten raids are played.
pub fn scheduled_raider(state: &TieBreakerState) -> Option<PlayerId> {
    if state.raid_index >= SHOOTOUT_RAIDS {
        return None;
    }
    let slot = usize::from(state.raid_index / 2);
    let raiders = match raiding_side(state) {
        Side::A => &state.raiders_a,
        Side::B => &state.raiders_b,
    };
    raiders.get(slot).copied()
}

/// One recorded shootout raid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShootoutRaid {
    /// Shootout state after the raid.
    pub state: TieBreakerState,
    /// The side that raided.
    pub raiding_side: Side,
    /// Points to the raiding side.
    pub raiding_points: u32,
    /// Points to the defending side.
    pub defending_points: u32,
    /// Code for the recent-raids indicator.
    pub outcome_code: String,
}

/// Record the next shootout raid.
///
/// When this is the tenth raid the winner is decided, falling back to the
/// golden-raid coin flip drawn from `rng` if the shootout is level.
///
/// # Errors
///
/// Returns [`StateViolation::TieBreakerComplete`] once a winner exists,
/// [`StateViolation::InvalidRaiderState`] if the raider is not the one
/// scheduled, and [`StateViolation::InvalidAction`] for points alongside a
/// tackle.
pub fn record_raid<R: Rng + ?Sized>(
    state: &TieBreakerState,
    action: &RaidAction,
    rng: &mut R,
) -> Result<ShootoutRaid, RuleError> {
    if state.winner.is_some() {
        return Err(StateViolation::TieBreakerComplete.into());
    }
    let Some(expected) = scheduled_raider(state) else {
        return Err(StateViolation::TieBreakerComplete.into());
    };
    if action.raider_id != expected {
        return Err(StateViolation::InvalidRaiderState {
            raider_id: action.raider_id,
            reason: format!("shootout raid {} belongs to {expected}", state.raid_index),
        }
        .into());
    }
    if action.raider_out && action.raiding_points() > 0 {
        return Err(StateViolation::InvalidAction {
            reason: String::from("a tackled raider cannot also score touch or bonus points"),
        }
        .into());
    }

    let side = raiding_side(state);
    let (raiding_points, defending_points) = if action.raider_out {
        (0, TACKLE_POINTS)
    } else {
        (action.raiding_points(), 0)
    };

    let mut next = state.clone();
    next.score = next
        .score
        .with_added(side, raiding_points)
        .with_added(side.opponent(), defending_points);
    next.raid_index = next.raid_index.saturating_add(1);

    debug!(
        raid = next.raid_index,
        side = %side,
        raiding_points,
        defending_points,
        "Shootout raid recorded"
    );

    if next.raid_index >= SHOOTOUT_RAIDS {
        let winner = if let Some(leader) = next.score.leader() {
            leader
        } else {
            let golden = if rng.random_bool(0.5) { Side::A } else { Side::B };
            info!(side = %golden, "Shootout level, golden raid awarded by coin flip");
            next.golden_raid = Some(golden);
            golden
        };
        info!(
            winner = %winner,
            score_a = next.score.team_a,
            score_b = next.score.team_b,
            "Tie-breaker decided"
        );
        next.winner = Some(winner);
    }

    let outcome_code = if action.raider_out {
        RAIDER_OUT_CODE.to_owned()
    } else {
        raiding_points.to_string()
    };

    Ok(ShootoutRaid {
        state: next,
        raiding_side: side,
        raiding_points,
        defending_points,
        outcome_code,
    })
}
