//! Player model — a user's seat (or waitlist slot) in a specific game.
//!
//! Membership is a tagged variant rather than the storage layer's
//! `standby bool + waitlist_pos int` pair, so a confirmed entry cannot
//! carry a meaningless waitlist position. Repositories convert at the row
//! boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's roster entry in a game. Unique per (user, game).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerEntry {
    pub id: Uuid,
    pub game_id: Uuid,
    pub user_id: Uuid,

    pub membership: Membership,

    /// Optional character-sheet reference
    pub character: Option<String>,

    pub joined_at: DateTime<Utc>,
}

/// Seat state. Waitlist positions come from the game's strictly increasing
/// sequence counter; gaps after removals are expected and harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum Membership {
    /// Holds a guaranteed seat, counts toward `max_players`
    Confirmed,
    /// Awaiting a seat; lower position = promoted first
    Waitlisted { position: i32 },
}

impl Membership {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Membership::Confirmed)
    }

    pub fn waitlist_position(&self) -> Option<i32> {
        match self {
            Membership::Confirmed => None,
            Membership::Waitlisted { position } => Some(*position),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlayerResponse {
    pub user_id: Uuid,
    pub display_name: String,
    pub membership: Membership,
    pub character: Option<String>,
}
