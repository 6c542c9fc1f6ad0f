//! Title ID and game metadata types.
//!
//! The peer reports the running title as a 16-character hex ID.  The all-zero
//! ID means *no game is running*; in that state the other metadata queries
//! are meaningless, so callers check [`TitleId::is_no_game_running`] before
//! asking for anything else.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Title ID reported when no game is running.
pub const NO_GAME_TITLE_ID: &str = "0000000000000000";

/// Placeholder for a metadata field the peer could not provide.
pub const UNAVAILABLE: &str = "-";

/// Display name used when no game is running.
pub const NO_GAME_NAME: &str = "No game running";

/// The running title's ID as reported by `getTitleID`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TitleId(String);

impl TitleId {
    /// Wraps a raw reply, trimming surrounding whitespace.
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_string())
    }

    pub fn no_game() -> Self {
        Self(NO_GAME_TITLE_ID.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the all-zero sentinel.
    pub fn is_no_game_running(&self) -> bool {
        self.0 == NO_GAME_TITLE_ID
    }
}

impl fmt::Display for TitleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Metadata of the running game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInfo {
    pub title_id: TitleId,
    pub name: String,
    pub version: String,
    pub author: String,
}

impl GameInfo {
    /// The bundle reported when the sentinel title ID is observed.
    pub fn no_game_running() -> Self {
        Self {
            title_id: TitleId::no_game(),
            name: NO_GAME_NAME.to_string(),
            version: UNAVAILABLE.to_string(),
            author: UNAVAILABLE.to_string(),
        }
    }

    pub fn is_no_game_running(&self) -> bool {
        self.title_id.is_no_game_running()
    }
}

/// Normalises a metadata reply: trims it and substitutes [`UNAVAILABLE`]
/// for an empty answer.
pub fn metadata_or_default(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        UNAVAILABLE.to_string()
    } else {
        trimmed.to_string()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
