//! The raid action submitted by the scorer for resolution.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::RaidOutcome;
use crate::ids::PlayerId;

/// One raid as reported by the scorer-of-record.
///
/// Exactly one of three shapes is legal: the raider is tackled
/// (`raider_out`), the raider scores (`touch_points > 0` or
/// `bonus_point`), or nothing happened (an empty raid).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RaidAction {
    /// The attacking player.
    pub raider_id: PlayerId,
    /// Defenders tagged by the raider.
    #[serde(default)]
    pub touch_points: u32,
    /// Whether the raider crossed the bonus line.
    #[serde(default)]
    pub bonus_point: bool,
    /// Whether the raider was tackled.
    #[serde(default)]
    pub raider_out: bool,
    /// Defenders put out by this raid.
    #[serde(default)]
    pub defenders_out: Vec<PlayerId>,
    /// The defender credited with the tackle, if any.
    #[serde(default)]
    pub tackler_id: Option<PlayerId>,
    /// Outcome as reported by the scorer.
    pub outcome: RaidOutcome,
}

impl RaidAction {
    /// Points the raiding side earns from this action: touch plus bonus.
    pub const fn raiding_points(&self) -> u32 {
        let bonus = if self.bonus_point { 1 } else { 0 };
        self.touch_points.saturating_add(bonus)
    }

    /// Whether the raid produced neither points nor a tackle.
    pub const fn is_empty(&self) -> bool {
        self.touch_points == 0 && !self.bonus_point && !self.raider_out
    }

    /// An empty raid by `raider_id`, reported as a success.
    pub const fn empty(raider_id: PlayerId) -> Self {
        Self {
            raider_id,
            touch_points: 0,
            bonus_point: false,
            raider_out: false,
            defenders_out: Vec::new(),
            tackler_id: None,
            outcome: RaidOutcome::Success,
        }
    }
}
