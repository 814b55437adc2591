//! Linear undo/redo history of regulation raids.
//!
//! One undo stack and one redo stack. Every resolved regulation raid
//! pushes a [`MatchSnapshot`]; a fresh forward raid discards the redo
//! stack, a raid re-applied by redo does not. Tie-breaker raids never
//! enter the history.

use raidline_types::{MatchSnapshot, Side};

/// The undo and redo stacks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    /// Resolved raids, oldest first.
    undo: Vec<MatchSnapshot>,
    /// Undone raids, most recently undone last.
    redo: Vec<MatchSnapshot>,
}

impl History {
    /// Create empty stacks.
    pub const fn new() -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
        }
    }

    /// Record a resolved raid.
    ///
    /// `from_redo` keeps the redo stack intact so further redos remain
    /// available; any other push discards it.
    pub fn record(&mut self, snapshot: MatchSnapshot, from_redo: bool) {
        if !from_redo {
            self.redo.clear();
        }
        self.undo.push(snapshot);
    }

    /// Pop the latest resolved raid for undo and park it on the redo stack.
    ///
    /// Returns a copy of the popped snapshot.
    pub fn undo(&mut self) -> Option<MatchSnapshot> {
        let snapshot = self.undo.pop()?;
        self.redo.push(snapshot.clone());
        Some(snapshot)
    }

    /// Pop the latest undone raid for redo.
    pub fn take_redo(&mut self) -> Option<MatchSnapshot> {
        self.redo.pop()
    }

    /// Discard every undone raid.
    pub fn clear_redo(&mut self) {
        self.redo.clear();
    }

    /// The most recent resolved raid.
    pub fn last(&self) -> Option<&MatchSnapshot> {
        self.undo.last()
    }

    /// Number of raids that can be undone.
    pub const fn undo_len(&self) -> usize {
        self.undo.len()
    }

    /// Number of raids that can be redone.
    pub const fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Resolved raids, oldest first.
    pub fn snapshots(&self) -> &[MatchSnapshot] {
        &self.undo
    }

    /// Raids by `side` in `half` that are still on the undo stack.
    pub fn raids_in_half(&self, half: u8, side: Side) -> u32 {
        let count = self
            .undo
            .iter()
            .filter(|s| s.half == half && s.raiding_side == side)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}
