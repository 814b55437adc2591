//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Matches, teams, players, and persisted raid events each get their own
//! newtype so an identifier of one kind can never be passed where another
//! is expected. All IDs use UUID v7 (time-ordered) so persisted raid
//! events sort in the order they were scored.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a match (fixture) between two teams.
    MatchId
}

define_id! {
    /// Unique identifier for a team.
    TeamId
}

define_id! {
    /// Unique identifier for a player on a team roster.
    PlayerId
}

define_id! {
    /// Unique identifier for a persisted raid event.
    ///
    /// A fresh id is minted every time a raid is resolved, including when
    /// a raid is re-applied by redo.
    EventId
}
