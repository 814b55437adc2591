//! Substitutions: swapping an active player with a bench player.
//!
//! The incoming player takes over the outgoing player's court position
//! and the outgoing player goes to the bench. Out status belongs to the
//! court slot rather than the person: if the outgoing player was out, the
//! incoming player replaces them in the out list at the same position, so
//! the revival order is unchanged.

use raidline_types::{PlayerId, Roster};
use tracing::debug;

use crate::error::RosterError;

/// Result of a substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    /// The roster with the two slots swapped.
    pub roster: Roster,
    /// The out list with the outgoing player replaced by the incoming one.
    pub out_player_ids: Vec<PlayerId>,
}

/// Swap `active_id` (on court) with `bench_id` (on the bench).
///
/// # Errors
///
/// Returns [`RosterError::PlayerNotFound`] if either player is not on the
/// roster and [`RosterError::InvalidSlot`] if either is in the wrong slot.
pub fn substitute(
    roster: &Roster,
    out_player_ids: &[PlayerId],
    active_id: PlayerId,
    bench_id: PlayerId,
) -> Result<Substitution, RosterError> {
    let not_found = |player_id| RosterError::PlayerNotFound {
        player_id,
        team_id: roster.team_id,
    };

    let outgoing = roster.find(active_id).ok_or_else(|| not_found(active_id))?;
    let incoming = roster.find(bench_id).ok_or_else(|| not_found(bench_id))?;

    if !outgoing.slot.is_active() {
        return Err(RosterError::InvalidSlot {
            player_id: active_id,
            expected: "active",
        });
    }
    if incoming.slot.is_active() {
        return Err(RosterError::InvalidSlot {
            player_id: bench_id,
            expected: "on the bench",
        });
    }

    let court_slot = outgoing.slot;
    let bench_slot = incoming.slot;

    let mut next = roster.clone();
    for player in &mut next.players {
        if player.id == active_id {
            player.slot = bench_slot;
        } else if player.id == bench_id {
            player.slot = court_slot;
        }
    }

    let out: Vec<PlayerId> = out_player_ids
        .iter()
        .map(|&id| if id == active_id { bench_id } else { id })
        .collect();

    debug!(
        team = %roster.team_id,
        outgoing = %active_id,
        incoming = %bench_id,
        inherits_out = out.contains(&bench_id),
        "Substitution applied"
    );

    Ok(Substitution {
        roster: next,
        out_player_ids: out,
    })
}

/// Carry an out list recorded against `before` onto the players who hold
/// the same court slots in `now`.
///
/// Ids from `before` that held a court slot are replaced by the current
/// occupant of that slot. Other ids pass through. Queue order is kept.
pub fn carry_outs(before: &Roster, now: &Roster, out_player_ids: &[PlayerId]) -> Vec<PlayerId> {
    out_player_ids
        .iter()
        .map(|&id| {
            before
                .find(id)
                .filter(|p| p.slot.is_active())
                .and_then(|p| now.players.iter().find(|q| q.slot == p.slot))
                .map_or(id, |occupant| occupant.id)
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use raidline_types::RosterSlot;

    use super::*;
    use crate::raid::tests::make_roster;

    #[test]
    fn swaps_slots() {
        let roster = make_roster();
        let on_court = roster.players[2].id;
        let bench = roster.players[7].id;

        let sub = substitute(&roster, &[], on_court, bench).unwrap();

        assert_eq!(
            sub.roster.find(bench).unwrap().slot,
            RosterSlot::Active { position: 3 }
        );
        assert_eq!(sub.roster.find(on_court).unwrap().slot, RosterSlot::Bench);
        assert_eq!(sub.roster.active_count(), 7);
    }

    #[test]
    fn incoming_player_inherits_out_position() {
        let roster = make_roster();
        let first = roster.players[0].id;
        let on_court = roster.players[2].id;
        let last = roster.players[4].id;
        let bench = roster.players[8].id;

        let sub = substitute(&roster, &[first, on_court, last], on_court, bench).unwrap();
        assert_eq!(sub.out_player_ids, vec![first, bench, last]);
    }

    #[test]
    fn earlier_outs_follow_the_slot() {
        let roster = make_roster();
        let first = roster.players[0].id;
        let on_court = roster.players[2].id;
        let bench = roster.players[8].id;
        let sub = substitute(&roster, &[first], on_court, bench).unwrap();

        let outs = carry_outs(&roster, &sub.roster, &[on_court, first]);
        assert_eq!(outs, vec![bench, first]);

        let stranger = PlayerId::new();
        assert_eq!(
            carry_outs(&roster, &roster, &[stranger, first]),
            vec![stranger, first]
        );
    }

    #[test]
    fn rejects_unknown_player() {
        let roster = make_roster();
        let result = substitute(&roster, &[], PlayerId::new(), roster.players[7].id);
        assert!(matches!(result, Err(RosterError::PlayerNotFound { .. })));
    }

    #[test]
    fn rejects_wrong_slots() {
        let roster = make_roster();
        let bench_a = roster.players[7].id;
        let bench_b = roster.players[8].id;
        let court_a = roster.players[0].id;
        let court_b = roster.players[1].id;

        let result = substitute(&roster, &[], bench_a, bench_b);
        assert!(matches!(
            result,
            Err(RosterError::InvalidSlot {
                expected: "active",
                ..
            })
        ));

        let result = substitute(&roster, &[], court_a, court_b);
        assert!(matches!(
            result,
            Err(RosterError::InvalidSlot {
                expected: "on the bench",
                ..
            })
        ));
    }
}
