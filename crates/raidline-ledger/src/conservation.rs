//! Score conservation verification for the points ledger.
//!
//! The scoreboard is only ever changed by raid resolution and undo, and
//! both record their points in the ledger. The check is:
//!
//! ```text
//! for S in {A, B}: scoreboard(S) == awards(S) - reversals(S)
//! ```
//!
//! A violation produces a [`LedgerAnomaly`], which the engine logs at
//! `error` level without halting the match.

use raidline_types::{EntryDirection, LedgerEntry, ScorePair, Side};

use crate::LedgerAnomaly;

/// The result of a conservation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConservationResult {
    /// The scoreboard matches the ledger.
    Balanced,
    /// The scoreboard and the ledger disagree.
    Anomaly(LedgerAnomaly),
}

/// Net balance per side as `(team_a, team_b)`, or `None` on overflow.
pub fn net_balance(entries: &[LedgerEntry]) -> Option<(i64, i64)> {
    let mut team_a: i64 = 0;
    let mut team_b: i64 = 0;

    for entry in entries {
        let points = i64::from(entry.points);
        let signed = match entry.direction {
            EntryDirection::Award => points,
            EntryDirection::Reversal => points.checked_neg()?,
        };
        let total = match entry.side {
            Side::A => &mut team_a,
            Side::B => &mut team_b,
        };
        *total = total.checked_add(signed)?;
    }

    Some((team_a, team_b))
}

/// Verify that `scoreboard` equals the net balance of `entries`.
pub fn verify_conservation(entries: &[LedgerEntry], scoreboard: ScorePair) -> ConservationResult {
    let Some(ledger) = net_balance(entries) else {
        return ConservationResult::Anomaly(LedgerAnomaly {
            scoreboard,
            ledger: (0, 0),
            message: String::from("LEDGER_ANOMALY: arithmetic overflow while summing points"),
        });
    };

    let expected = (
        i64::from(scoreboard.team_a),
        i64::from(scoreboard.team_b),
    );

    if expected == ledger {
        ConservationResult::Balanced
    } else {
        ConservationResult::Anomaly(LedgerAnomaly {
            scoreboard,
            ledger,
            message: format!(
                "LEDGER_ANOMALY: scoreboard {}-{} but ledger {}-{}",
                scoreboard.team_a, scoreboard.team_b, ledger.0, ledger.1
            ),
        })
    }
}
