//! YAML match file: the fixture and both team sheets.
//!
//! ```yaml
//! fixture:
//!   id: 0192f0c4-...
//!   team_a_id: ...
//!   team_b_id: ...
//!   ...
//! rosters:
//!   - team_id: ...
//!     players: [...]
//! ```
//!
//! [`MatchFile`] doubles as the [`RosterProvider`] the engine attaches to.

use std::path::Path;

use raidline_core::collaborators::RosterProvider;
use raidline_types::{Match, Roster, TeamId};
use serde::Deserialize;

use crate::error::AppError;

/// Contents of a match file.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchFile {
    /// The fixture to score.
    pub fixture: Match,
    /// Team sheets. Must include both teams of the fixture.
    #[serde(default)]
    pub rosters: Vec<Roster>,
}

impl MatchFile {
    /// Read and parse a match file.
    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let contents = std::fs::read_to_string(path).map_err(|e| AppError::MatchFile {
            message: format!("failed to read {}: {e}", path.display()),
        })?;
        Self::parse(&contents)
    }

    /// Parse a match file from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, AppError> {
        serde_yml::from_str(yaml).map_err(|e| AppError::MatchFile {
            message: format!("failed to parse match YAML: {e}"),
        })
    }
}

impl RosterProvider for MatchFile {
    fn roster(&self, team_id: TeamId) -> Option<Roster> {
        self.rosters.iter().find(|r| r.team_id == team_id).cloned()
    }
}
