//! Game model — the reservable unit.
//!
//! A game is created by a DM, released to patrons and then to everyone by
//! time-driven lifecycle transitions, played, and finally expired. The
//! `status` column exists so each release announcement fires exactly once;
//! visibility itself is always derived from the release timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A scheduled game session players can reserve seats in.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Game {
    pub id: Uuid,

    /// The DM running the session
    pub dm_id: Uuid,

    pub name: String,

    /// Module / adventure code (e.g. "DDAL04-01")
    pub module: Option<String>,

    pub description: Option<String>,

    /// Party capacity — confirmed seats only, the waitlist is unbounded
    pub max_players: i32,

    /// Session start time
    pub start_at: DateTime<Utc>,

    /// Patron/priority release gate (None = no early access window)
    pub release_priority_at: Option<DateTime<Utc>>,

    /// General release gate (None = never generally released)
    pub release_open_at: Option<DateTime<Utc>>,

    /// Unready games are hidden from listings and reconciliation
    pub ready: bool,

    /// One-shot announcement cursor, advanced by the lifecycle tick
    pub status: GameStatus,

    /// Strictly increasing per-game counter backing waitlist positions.
    /// Never reused, even after removals.
    pub waitlist_seq: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Announcement state of a game. Terminal states are `Released` and
/// `Cancelled`; expiry is derived from `start_at`/`ready`, not stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Created, no release gate reached yet and not ready
    Draft,
    /// Ready, waiting on a release gate
    Pending,
    /// Priority gate passed — visible to patrons only
    Priority,
    /// General gate passed — visible to everyone
    Released,
    /// Withdrawn by the DM or an admin
    Cancelled,
}

impl Game {
    /// A game needs at least one release gate before the lifecycle tick
    /// will consider announcing it.
    pub fn has_release_gate(&self) -> bool {
        self.release_priority_at.is_some() || self.release_open_at.is_some()
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateGameRequest {
    #[validate(length(min = 1, max = 100, message = "Game name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(max = 64))]
    pub module: Option<String>,

    #[validate(length(max = 2000))]
    pub description: Option<String>,

    #[validate(range(min = 1, max = 50, message = "max_players must be 1-50"))]
    pub max_players: i32,

    pub start_at: DateTime<Utc>,

    pub release_priority_at: Option<DateTime<Utc>>,

    pub release_open_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct GameResponse {
    pub id: Uuid,
    pub dm_id: Uuid,
    pub name: String,
    pub module: Option<String>,
    pub description: Option<String>,
    pub max_players: i32,
    pub start_at: DateTime<Utc>,
    pub status: GameStatus,
    /// Display hint: priority gate passed, general gate not yet
    pub patron_exclusive: bool,
}
