//! The points ledger: an append-only log of every point awarded.
//!
//! # Design
//!
//! - **Append-only**: entries are never modified or deleted.
//! - **Reversals**: undo appends one reversal per outstanding award of the
//!   undone raid event.
//! - **Conservation**: the net balance per side equals the scoreboard.

use chrono::Utc;
use tracing::debug;

use raidline_types::{EntryDirection, EventId, LedgerEntry, PointKind, ScorePair, Side};

use crate::LedgerError;
use crate::conservation::{ConservationResult, net_balance, verify_conservation};

/// The points ledger for one match.
#[derive(Debug, Default, Clone)]
pub struct PointsLedger {
    /// All entries, in insertion order.
    entries: Vec<LedgerEntry>,
}

impl PointsLedger {
    /// Create a new empty ledger.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Return the number of entries in the ledger.
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return whether the ledger has no entries.
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return all entries belonging to one raid event.
    pub fn entries_for_event(&self, event_id: EventId) -> Vec<&LedgerEntry> {
        self.entries
            .iter()
            .filter(|e| e.event_id == event_id)
            .collect()
    }

    /// Record points awarded to `side` by a raid event.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::ZeroPoints`] when `points` is zero.
    pub fn record_award(
        &mut self,
        event_id: EventId,
        side: Side,
        kind: PointKind,
        points: u32,
    ) -> Result<&LedgerEntry, LedgerError> {
        self.push(event_id, side, kind, points, EntryDirection::Award)
    }

    /// Record every non-zero line of a resolved raid.
    ///
    /// Zero-point lines are skipped rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if an entry cannot be appended.
    pub fn record_raid(
        &mut self,
        event_id: EventId,
        lines: &[(Side, PointKind, u32)],
    ) -> Result<usize, LedgerError> {
        let mut recorded: usize = 0;
        for &(side, kind, points) in lines {
            if points == 0 {
                continue;
            }
            self.record_award(event_id, side, kind, points)?;
            recorded = recorded.saturating_add(1);
        }
        Ok(recorded)
    }

    /// Append a reversal for every outstanding award of `event_id`.
    ///
    /// Awards already reversed are not reversed twice, so a raid that was
    /// undone, redone under a new event id, and undone again stays balanced.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NothingToReverse`] if the event has no
    /// outstanding awards. A raid that scored nothing has none, so callers
    /// undoing an empty raid should treat this as a no-op.
    pub fn reverse_event(&mut self, event_id: EventId) -> Result<usize, LedgerError> {
        let mut outstanding: Vec<(Side, PointKind, u32)> = Vec::new();
        for entry in self.entries.iter().filter(|e| e.event_id == event_id) {
            let line = (entry.side, entry.kind, entry.points);
            match entry.direction {
                EntryDirection::Award => outstanding.push(line),
                EntryDirection::Reversal => {
                    if let Some(pos) = outstanding.iter().position(|l| *l == line) {
                        outstanding.remove(pos);
                    }
                }
            }
        }

        if outstanding.is_empty() {
            return Err(LedgerError::NothingToReverse { event_id });
        }

        let count = outstanding.len();
        for (side, kind, points) in outstanding {
            self.push(event_id, side, kind, points, EntryDirection::Reversal)?;
        }
        debug!(event = %event_id, count, "Ledger awards reversed");
        Ok(count)
    }

    /// Net balance per side as `(team_a, team_b)`.
    pub fn balance(&self) -> (i64, i64) {
        net_balance(&self.entries).unwrap_or((i64::MAX, i64::MAX))
    }

    /// Verify that `scoreboard` equals the ledger balance.
    pub fn verify_conservation(&self, scoreboard: ScorePair) -> ConservationResult {
        verify_conservation(&self.entries, scoreboard)
    }

    fn push(
        &mut self,
        event_id: EventId,
        side: Side,
        kind: PointKind,
        points: u32,
        direction: EntryDirection,
    ) -> Result<&LedgerEntry, LedgerError> {
        if points == 0 {
            return Err(LedgerError::ZeroPoints);
        }

        let sequence = u64::try_from(self.entries.len())
            .map_err(|_| LedgerError::InternalError("ledger sequence overflow"))?
            .saturating_add(1);

        self.entries.push(LedgerEntry {
            sequence,
            event_id,
            side,
            kind,
            points,
            direction,
            recorded_at: Utc::now(),
        });

        // Return a reference to the entry we just pushed.
        self.entries.last().ok_or(LedgerError::InternalError(
            "failed to retrieve entry after append",
        ))
    }
}
