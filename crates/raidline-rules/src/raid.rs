//! Raid resolution: the scoring rules of a regulation raid.
//!
//! [`resolve_raid`] is a pure function from the current match record and a
//! submitted [`RaidAction`] to the next match record plus a [`RaidAward`]
//! describing what happened. It performs no I/O; the engine turns the
//! award into persistence and audio events.
//!
//! ## Resolution order
//!
//! 1. Validate: match live, raider on court and not out, defenders and
//!    tackler on court and not out, no points alongside a tackle.
//! 2. Do-or-Die: after two consecutive empty raids by the raiding side an
//!    empty submission is converted into a failed raid with the raider out.
//! 3. Score: touch + bonus to the raiders; 1 (or 2 for a super tackle with
//!    three or fewer active defenders) to the defenders on a tackle.
//! 4. Apply outs, then all-out: a side with every active player out is
//!    cleared and its opponent gets [`ALL_OUT_BONUS`].
//! 5. Revival: the raiders revive up to `touch_points` of their own out
//!    players on a success; the defenders revive one on a tackle. Oldest
//!    out first.
//! 6. Update the empty-raid counter and hand the raid to the other side.

use raidline_types::{
    EmptyRaidCounters, Match, MatchStatus, PlayerId, PointKind, RaidAction, RaidOutcome, Roster,
    Rosters, Side,
};
use tracing::debug;

use crate::error::StateViolation;

/// Consecutive empty raids after which the next raid is Do-or-Die.
pub const DO_OR_DIE_THRESHOLD: u8 = 2;

/// A tackle by this many active defenders or fewer is a super tackle.
pub const SUPER_TACKLE_MAX_DEFENDERS: usize = 3;

/// Points for an ordinary tackle.
pub const TACKLE_POINTS: u32 = 1;

/// Points for a super tackle.
pub const SUPER_TACKLE_POINTS: u32 = 2;

/// Bonus awarded to the opponent of an all-out side.
pub const ALL_OUT_BONUS: u32 = 2;

/// Recent-raids code for a tackled raider.
pub const RAIDER_OUT_CODE: &str = "W";

/// Inputs to raid resolution beyond the match record itself.
#[derive(Debug, Clone, Copy)]
pub struct RaidContext<'a> {
    /// Both teams' rosters, as they stand at raid time.
    pub rosters: &'a Rosters,
    /// Consecutive empty raids per side before this raid.
    pub empty_raids: EmptyRaidCounters,
}

/// Everything a resolved raid awarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaidAward {
    /// The side that raided.
    pub raiding_side: Side,
    /// The action after Do-or-Die conversion.
    pub action: RaidAction,
    /// Touch and bonus points to the raiding side.
    pub raiding_points: u32,
    /// Tackle points to the defending side.
    pub defending_points: u32,
    /// Sides put all-out by this raid, defending side first.
    pub all_out_sides: Vec<Side>,
    /// Whether the tackle was a super tackle.
    pub super_tackle: bool,
    /// Whether the raid was Do-or-Die.
    pub do_or_die: bool,
    /// Whether an empty Do-or-Die submission was converted to a tackle.
    pub dod_converted: bool,
    /// Players revived, in revival order.
    pub revived: Vec<PlayerId>,
    /// Code for the recent-raids indicator.
    pub outcome_code: String,
}

impl RaidAward {
    /// All-out bonus points awarded by this raid.
    pub fn all_out_points(&self) -> u32 {
        let sides = u32::try_from(self.all_out_sides.len()).unwrap_or(u32::MAX);
        ALL_OUT_BONUS.saturating_mul(sides)
    }

    /// Total points awarded to both sides.
    pub fn total_points(&self) -> u32 {
        self.raiding_points
            .saturating_add(self.defending_points)
            .saturating_add(self.all_out_points())
    }

    /// Non-zero point lines `(side, kind, points)` for the points ledger.
    pub fn point_lines(&self) -> Vec<(Side, PointKind, u32)> {
        let defending_side = self.raiding_side.opponent();
        let bonus = if self.action.bonus_point { 1 } else { 0 };
        let tackle_kind = if self.super_tackle {
            PointKind::SuperTackle
        } else {
            PointKind::Tackle
        };

        let mut lines = vec![
            (self.raiding_side, PointKind::Touch, self.action.touch_points),
            (self.raiding_side, PointKind::Bonus, bonus),
            (defending_side, tackle_kind, self.defending_points),
        ];
        lines.extend(
            self.all_out_sides
                .iter()
                .map(|side| (side.opponent(), PointKind::AllOut, ALL_OUT_BONUS)),
        );
        lines.retain(|&(_, _, points)| points > 0);
        lines
    }
}

/// Output of [`resolve_raid`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRaid {
    /// The match record after the raid.
    pub fixture: Match,
    /// Empty-raid counters after the raid.
    pub empty_raids: EmptyRaidCounters,
    /// What the raid awarded.
    pub award: RaidAward,
}

/// Whether `side`'s next raid is Do-or-Die.
pub const fn is_do_or_die(counters: EmptyRaidCounters, side: Side) -> bool {
    counters.get(side) >= DO_OR_DIE_THRESHOLD
}

/// Number of `side`'s active players who are not out.
pub fn players_on_court(fixture: &Match, rosters: &Rosters, side: Side) -> usize {
    rosters
        .get(side)
        .active_ids()
        .filter(|id| !fixture.is_out(*id))
        .count()
}

/// Check that `raider_id` may raid for `side`.
pub fn validate_raider(
    fixture: &Match,
    rosters: &Rosters,
    side: Side,
    raider_id: PlayerId,
) -> Result<(), StateViolation> {
    let reject = |reason: &str| StateViolation::InvalidRaiderState {
        raider_id,
        reason: reason.to_owned(),
    };

    let Some(player) = rosters.get(side).find(raider_id) else {
        return Err(reject("not on the raiding team"));
    };
    if !player.slot.is_active() {
        return Err(reject("not on court"));
    }
    if fixture.is_out(raider_id) {
        return Err(reject("currently out"));
    }
    Ok(())
}

/// Resolve one regulation raid.
///
/// # Errors
///
/// Returns [`StateViolation::MatchNotLive`] if the match is not live,
/// [`StateViolation::InvalidRaiderState`] if the raider may not raid, and
/// [`StateViolation::InvalidAction`] if the action is malformed.
pub fn resolve_raid(
    fixture: &Match,
    ctx: RaidContext<'_>,
    action: &RaidAction,
) -> Result<ResolvedRaid, StateViolation> {
    if fixture.status != MatchStatus::Live {
        return Err(StateViolation::MatchNotLive);
    }

    let raiding = fixture.active_raiding_team;
    let defending = raiding.opponent();

    validate_raider(fixture, ctx.rosters, raiding, action.raider_id)?;
    validate_action(fixture, ctx.rosters.get(defending), action)?;

    // --- Do-or-Die ---
    let do_or_die = is_do_or_die(ctx.empty_raids, raiding);
    let dod_converted = do_or_die && action.is_empty();
    let effective = if dod_converted {
        RaidAction {
            raider_out: true,
            outcome: RaidOutcome::Fail,
            ..action.clone()
        }
    } else {
        action.clone()
    };

    // --- Points ---
    let defenders_on_court = players_on_court(fixture, ctx.rosters, defending);
    let super_tackle = effective.raider_out && defenders_on_court <= SUPER_TACKLE_MAX_DEFENDERS;
    let raiding_points = effective.raiding_points();
    let defending_points = match (effective.raider_out, super_tackle) {
        (false, _) => 0,
        (true, false) => TACKLE_POINTS,
        (true, true) => SUPER_TACKLE_POINTS,
    };
    let mut score = fixture
        .score()
        .with_added(raiding, raiding_points)
        .with_added(defending, defending_points);

    // --- Outs and all-out ---
    let mut out = fixture.out_player_ids.clone();
    if effective.raider_out {
        out.push(effective.raider_id);
    }
    out.extend(effective.defenders_out.iter().copied());

    let all_out_sides: Vec<Side> = [defending, raiding]
        .into_iter()
        .filter(|&side| is_all_out(&out, ctx.rosters.get(side)))
        .collect();
    for &side in &all_out_sides {
        let roster = ctx.rosters.get(side);
        out.retain(|id| !roster.contains(*id));
        score = score.with_added(side.opponent(), ALL_OUT_BONUS);
    }

    // --- Revival ---
    let (benefiting, quota) = if effective.raider_out {
        (defending, 1)
    } else {
        (raiding, effective.touch_points)
    };
    let revived = if all_out_sides.contains(&benefiting) {
        Vec::new()
    } else {
        revive_fifo(&mut out, ctx.rosters.get(benefiting), quota)
    };

    // --- Empty-raid counter ---
    let dod_failed =
        do_or_die && (effective.raider_out || effective.outcome == RaidOutcome::Fail);
    let next_counter = if raiding_points > 0 || dod_failed {
        0
    } else {
        ctx.empty_raids.get(raiding).saturating_add(1)
    };

    let outcome_code = if effective.raider_out {
        RAIDER_OUT_CODE.to_owned()
    } else {
        raiding_points.to_string()
    };

    debug!(
        raider = %effective.raider_id,
        side = %raiding,
        raiding_points,
        defending_points,
        super_tackle,
        do_or_die,
        dod_converted,
        all_outs = all_out_sides.len(),
        revived = revived.len(),
        "Raid resolved"
    );

    let mut next = fixture.clone();
    next.set_score(score);
    next.out_player_ids = out;
    next.active_raiding_team = defending;

    Ok(ResolvedRaid {
        fixture: next,
        empty_raids: ctx.empty_raids.with(raiding, next_counter),
        award: RaidAward {
            raiding_side: raiding,
            action: effective,
            raiding_points,
            defending_points,
            all_out_sides,
            super_tackle,
            do_or_die,
            dod_converted,
            revived,
            outcome_code,
        },
    })
}

/// Validate the defending-side parts of an action and its shape.
fn validate_action(
    fixture: &Match,
    defending: &Roster,
    action: &RaidAction,
) -> Result<(), StateViolation> {
    let invalid = |reason: String| StateViolation::InvalidAction { reason };

    if action.raider_out && action.raiding_points() > 0 {
        return Err(invalid(String::from(
            "a tackled raider cannot also score touch or bonus points",
        )));
    }

    let mut seen: Vec<PlayerId> = Vec::with_capacity(action.defenders_out.len());
    for &id in &action.defenders_out {
        if seen.contains(&id) {
            return Err(invalid(format!("defender {id} listed twice")));
        }
        if !defending.is_active(id) || fixture.is_out(id) {
            return Err(invalid(format!("defender {id} is not on court")));
        }
        seen.push(id);
    }

    if let Some(tackler) = action.tackler_id {
        if !defending.is_active(tackler) || fixture.is_out(tackler) {
            return Err(invalid(format!("tackler {tackler} is not on court")));
        }
    }
    Ok(())
}

/// Whether every active player of `roster` is in `out`.
fn is_all_out(out: &[PlayerId], roster: &Roster) -> bool {
    let mut active = roster.active_ids().peekable();
    active.peek().is_some() && active.all(|id| out.contains(&id))
}

/// Revive up to `quota` of `roster`'s players from `out`, oldest first.
fn revive_fifo(out: &mut Vec<PlayerId>, roster: &Roster, quota: u32) -> Vec<PlayerId> {
    let quota = usize::try_from(quota).unwrap_or(usize::MAX);
    let mut revived = Vec::new();
    out.retain(|id| {
        if revived.len() < quota && roster.contains(*id) {
            revived.push(*id);
            false
        } else {
            true
        }
    });
    revived
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
pub(crate) mod tests {
    use raidline_types::{MatchId, Player, RosterSlot, TeamId};

    use super::*;

    /// A roster of seven active players and two on the bench.
    pub(crate) fn make_roster() -> Roster {
        let team_id = TeamId::new();
        let players = (1..=9_u8)
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

    pub(crate) fn make_rosters() -> Rosters {
        Rosters {
            team_a: make_roster(),
            team_b: make_roster(),
        }
    }

    pub(crate) fn live_match(rosters: &Rosters) -> Match {
        let mut fixture = Match::new(MatchId::new(), rosters.team_a.team_id, rosters.team_b.team_id);
        fixture.status = MatchStatus::Live;
        fixture
    }

    fn active(rosters: &Rosters, side: Side, n: usize) -> PlayerId {
        rosters.get(side).players[n].id
    }

    fn ctx(rosters: &Rosters) -> RaidContext<'_> {
        RaidContext {
            rosters,
            empty_raids: EmptyRaidCounters::default(),
        }
    }

    #[test]
    fn touch_points_score_and_flip_team() {
        let rosters = make_rosters();
        let mut fixture = live_match(&rosters);
        // Two defenders already out: five on court.
        fixture.out_player_ids = vec![active(&rosters, Side::B, 0), active(&rosters, Side::B, 1)];

        let mut action = RaidAction::empty(active(&rosters, Side::A, 0));
        action.touch_points = 2;
        action.defenders_out = vec![active(&rosters, Side::B, 2), active(&rosters, Side::B, 3)];

        let counters = EmptyRaidCounters::default().with(Side::A, 1);
        let resolved = resolve_raid(
            &fixture,
            RaidContext {
                rosters: &rosters,
                empty_raids: counters,
            },
            &action,
        )
        .unwrap();

        assert_eq!(resolved.fixture.team_a_score, 2);
        assert_eq!(resolved.fixture.team_b_score, 0);
        assert_eq!(resolved.empty_raids.get(Side::A), 0);
        assert_eq!(resolved.fixture.active_raiding_team, Side::B);
        assert_eq!(resolved.award.outcome_code, "2");
        assert_eq!(resolved.fixture.out_player_ids.len(), 4);
    }

    #[test]
    fn super_tackle_with_three_defenders() {
        let rosters = make_rosters();
        let mut fixture = live_match(&rosters);
        fixture.out_player_ids = (0..4).map(|n| active(&rosters, Side::B, n)).collect();
        let raider = active(&rosters, Side::A, 0);

        let mut action = RaidAction::empty(raider);
        action.raider_out = true;
        action.outcome = RaidOutcome::Fail;
        action.tackler_id = Some(active(&rosters, Side::B, 5));

        let resolved = resolve_raid(&fixture, ctx(&rosters), &action).unwrap();

        assert!(resolved.award.super_tackle);
        assert_eq!(resolved.fixture.team_b_score, 2);
        assert_eq!(resolved.fixture.team_a_score, 0);
        assert!(resolved.fixture.is_out(raider));
        assert_eq!(resolved.award.outcome_code, "W");
        // Defenders revive their earliest-out player.
        assert_eq!(resolved.award.revived, vec![active(&rosters, Side::B, 0)]);
    }

    #[test]
    fn ordinary_tackle_with_four_defenders() {
        let rosters = make_rosters();
        let mut fixture = live_match(&rosters);
        fixture.out_player_ids = (0..3).map(|n| active(&rosters, Side::B, n)).collect();

        let mut action = RaidAction::empty(active(&rosters, Side::A, 0));
        action.raider_out = true;
        action.outcome = RaidOutcome::Fail;

        let resolved = resolve_raid(&fixture, ctx(&rosters), &action).unwrap();
        assert!(!resolved.award.super_tackle);
        assert_eq!(resolved.fixture.team_b_score, 1);
    }

    #[test]
    fn all_out_clears_defenders_and_awards_bonus() {
        let rosters = make_rosters();
        let mut fixture = live_match(&rosters);
        fixture.out_player_ids = (0..6).map(|n| active(&rosters, Side::B, n)).collect();

        let mut action = RaidAction::empty(active(&rosters, Side::A, 0));
        action.touch_points = 1;
        action.defenders_out = vec![active(&rosters, Side::B, 6)];

        let resolved = resolve_raid(&fixture, ctx(&rosters), &action).unwrap();

        assert_eq!(resolved.award.all_out_sides, vec![Side::B]);
        assert_eq!(resolved.fixture.team_a_score, 3);
        assert!(
            resolved
                .fixture
                .out_player_ids
                .iter()
                .all(|id| !rosters.team_b.contains(*id))
        );
        assert_eq!(resolved.award.total_points(), 3);
    }

    #[test]
    fn raiding_side_all_out_on_last_raider_tackled() {
        let rosters = make_rosters();
        let mut fixture = live_match(&rosters);
        fixture.out_player_ids = (0..6).map(|n| active(&rosters, Side::A, n)).collect();

        let mut action = RaidAction::empty(active(&rosters, Side::A, 6));
        action.raider_out = true;
        action.outcome = RaidOutcome::Fail;

        let resolved = resolve_raid(&fixture, ctx(&rosters), &action).unwrap();

        assert_eq!(resolved.award.all_out_sides, vec![Side::A]);
        assert_eq!(resolved.fixture.team_b_score, 3);
        assert!(resolved.fixture.out_player_ids.is_empty());
    }

    #[test]
    fn empty_raid_after_two_empties_is_converted() {
        let rosters = make_rosters();
        let fixture = live_match(&rosters);
        let raider = active(&rosters, Side::A, 0);
        let counters = EmptyRaidCounters::default().with(Side::A, 2);

        let resolved = resolve_raid(
            &fixture,
            RaidContext {
                rosters: &rosters,
                empty_raids: counters,
            },
            &RaidAction::empty(raider),
        )
        .unwrap();

        assert!(resolved.award.do_or_die);
        assert!(resolved.award.dod_converted);
        assert!(resolved.award.action.raider_out);
        assert_eq!(resolved.award.action.outcome, RaidOutcome::Fail);
        assert!(resolved.fixture.is_out(raider));
        assert_eq!(resolved.fixture.team_b_score, 1);
        assert_eq!(resolved.empty_raids.get(Side::A), 0);
    }

    #[test]
    fn empty_raid_reported_as_fail_is_converted_too() {
        let rosters = make_rosters();
        let fixture = live_match(&rosters);
        let raider = active(&rosters, Side::A, 0);
        let counters = EmptyRaidCounters::default().with(Side::A, 2);
        let mut action = RaidAction::empty(raider);
        action.outcome = RaidOutcome::Fail;

        let resolved = resolve_raid(
            &fixture,
            RaidContext {
                rosters: &rosters,
                empty_raids: counters,
            },
            &action,
        )
        .unwrap();

        assert!(resolved.award.dod_converted);
        assert!(resolved.award.action.raider_out);
        assert!(resolved.fixture.is_out(raider));
        assert_eq!(resolved.fixture.team_b_score, 1);
        assert_eq!(resolved.empty_raids.get(Side::A), 0);
    }

    #[test]
    fn empty_raid_increments_counter() {
        let rosters = make_rosters();
        let fixture = live_match(&rosters);
        let resolved = resolve_raid(
            &fixture,
            ctx(&rosters),
            &RaidAction::empty(active(&rosters, Side::A, 0)),
        )
        .unwrap();
        assert_eq!(resolved.empty_raids.get(Side::A), 1);
        assert_eq!(resolved.empty_raids.get(Side::B), 0);
        assert_eq!(resolved.award.outcome_code, "0");
        assert_eq!(resolved.fixture.score().total(), 0);
    }

    #[test]
    fn scoring_raid_revives_oldest_out_first() {
        let rosters = make_rosters();
        let mut fixture = live_match(&rosters);
        let first = active(&rosters, Side::A, 3);
        let second = active(&rosters, Side::A, 1);
        let third = active(&rosters, Side::A, 2);
        fixture.out_player_ids = vec![first, active(&rosters, Side::B, 0), second, third];

        let mut action = RaidAction::empty(active(&rosters, Side::A, 0));
        action.touch_points = 2;
        action.defenders_out = vec![active(&rosters, Side::B, 1), active(&rosters, Side::B, 2)];

        let resolved = resolve_raid(&fixture, ctx(&rosters), &action).unwrap();
        assert_eq!(resolved.award.revived, vec![first, second]);
        assert!(resolved.fixture.is_out(third));
    }

    #[test]
    fn bonus_point_alone_does_not_revive() {
        let rosters = make_rosters();
        let mut fixture = live_match(&rosters);
        let out = active(&rosters, Side::A, 1);
        fixture.out_player_ids = vec![out];

        let mut action = RaidAction::empty(active(&rosters, Side::A, 0));
        action.bonus_point = true;

        let resolved = resolve_raid(&fixture, ctx(&rosters), &action).unwrap();
        assert_eq!(resolved.fixture.team_a_score, 1);
        assert!(resolved.award.revived.is_empty());
        assert!(resolved.fixture.is_out(out));
    }

    #[test]
    fn rejects_out_raider() {
        let rosters = make_rosters();
        let mut fixture = live_match(&rosters);
        let raider = active(&rosters, Side::A, 0);
        fixture.out_player_ids = vec![raider];

        let result = resolve_raid(&fixture, ctx(&rosters), &RaidAction::empty(raider));
        assert!(matches!(result, Err(StateViolation::InvalidRaiderState { .. })));
    }

    #[test]
    fn rejects_raider_from_defending_team() {
        let rosters = make_rosters();
        let fixture = live_match(&rosters);
        let result = resolve_raid(
            &fixture,
            ctx(&rosters),
            &RaidAction::empty(active(&rosters, Side::B, 0)),
        );
        assert!(matches!(result, Err(StateViolation::InvalidRaiderState { .. })));
    }

    #[test]
    fn rejects_bench_raider() {
        let rosters = make_rosters();
        let fixture = live_match(&rosters);
        let result = resolve_raid(
            &fixture,
            ctx(&rosters),
            &RaidAction::empty(active(&rosters, Side::A, 8)),
        );
        assert!(matches!(result, Err(StateViolation::InvalidRaiderState { .. })));
    }

    #[test]
    fn rejects_when_not_live() {
        let rosters = make_rosters();
        let mut fixture = live_match(&rosters);
        fixture.status = MatchStatus::HalfTime;
        let result = resolve_raid(
            &fixture,
            ctx(&rosters),
            &RaidAction::empty(active(&rosters, Side::A, 0)),
        );
        assert_eq!(result.unwrap_err(), StateViolation::MatchNotLive);
    }

    #[test]
    fn rejects_points_with_tackle() {
        let rosters = make_rosters();
        let fixture = live_match(&rosters);
        let mut action = RaidAction::empty(active(&rosters, Side::A, 0));
        action.raider_out = true;
        action.touch_points = 1;
        let result = resolve_raid(&fixture, ctx(&rosters), &action);
        assert!(matches!(result, Err(StateViolation::InvalidAction { .. })));
    }

    #[test]
    fn rejects_duplicate_or_out_defenders() {
        let rosters = make_rosters();
        let mut fixture = live_match(&rosters);
        let defender = active(&rosters, Side::B, 0);

        let mut action = RaidAction::empty(active(&rosters, Side::A, 0));
        action.touch_points = 2;
        action.defenders_out = vec![defender, defender];
        let result = resolve_raid(&fixture, ctx(&rosters), &action);
        assert!(matches!(result, Err(StateViolation::InvalidAction { .. })));

        fixture.out_player_ids = vec![defender];
        action.defenders_out = vec![defender];
        let result = resolve_raid(&fixture, ctx(&rosters), &action);
        assert!(matches!(result, Err(StateViolation::InvalidAction { .. })));
    }

    #[test]
    fn point_lines_sum_to_total() {
        let rosters = make_rosters();
        let mut fixture = live_match(&rosters);
        fixture.out_player_ids = (0..5).map(|n| active(&rosters, Side::B, n)).collect();

        let mut action = RaidAction::empty(active(&rosters, Side::A, 0));
        action.touch_points = 2;
        action.bonus_point = true;
        action.defenders_out = vec![active(&rosters, Side::B, 5), active(&rosters, Side::B, 6)];

        let resolved = resolve_raid(&fixture, ctx(&rosters), &action).unwrap();
        let lines = resolved.award.point_lines();
        let sum: u32 = lines.iter().map(|&(_, _, p)| p).sum();
        assert_eq!(sum, resolved.award.total_points());
        assert_eq!(sum, resolved.fixture.score().total());
        assert!(lines.contains(&(Side::A, PointKind::AllOut, ALL_OUT_BONUS)));
    }
}
