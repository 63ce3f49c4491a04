use serde::{Deserialize, Serialize};

use crate::state::{game::GameState, history::HistoryEntry};

/// Version written into every persisted record. Records without it use the legacy layout.
pub const SCHEMA_VERSION: u32 = 2;

/// Persisted form of the current game state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRecord {
    /// Layout version.
    pub schema_version: u32,
    /// Game state as last mutated.
    #[serde(flatten)]
    pub game: GameState,
}

impl StateRecord {
    /// Wrap `game` with the current layout version.
    pub fn new(game: GameState) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            game,
        }
    }
}

/// Persisted form of the undo history, oldest entry first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Layout version.
    pub schema_version: u32,
    /// Snapshots, oldest first.
    pub entries: Vec<HistoryEntry>,
}

impl HistoryRecord {
    /// Wrap `entries` with the current layout version.
    pub fn new(entries: Vec<HistoryEntry>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            entries,
        }
    }
}
