//! User, rank, and bonus-credit models — the identity and capacity layer.
//!
//! A user is created on first authentication or first observed platform
//! interaction and never hard-deleted. Ranks are admin-managed reference
//! data; the highest-priority rank a user holds determines their base
//! signup capacity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A Muster user account.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v7 — time-sortable)
    pub id: Uuid,

    /// External chat-platform user id (snowflake string)
    pub platform_id: String,

    /// Display name shown in rosters and messages
    pub display_name: String,

    /// Avatar reference on the chat platform
    pub avatar: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A rank — grants base signup capacity and (optionally) patron status.
///
/// When a user holds several ranks, the one with the highest `priority`
/// wins for capacity purposes.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Rank {
    pub id: Uuid,

    pub name: String,

    /// Tie-break between held ranks: highest priority wins
    pub priority: i32,

    /// Signup capacity granted by this rank
    pub max_games: i32,

    /// Patron ranks see priority-released games early
    pub patron: bool,
}

/// A grant of additional signup capacity, additive to the rank-derived
/// base while unexpired.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BonusCredit {
    pub id: Uuid,

    pub user_id: Uuid,

    /// Extra signups granted
    pub credits: i32,

    /// Why the grant was made (audit trail)
    pub reason: Option<String>,

    /// None = never expires
    pub expires_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl BonusCredit {
    /// Whether the grant still counts at `now`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|e| e > now)
    }
}

/// A user's identity plus everything eligibility needs to know about them,
/// resolved once at the boundary and passed as plain data thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: Uuid,
    pub platform_id: String,
    pub display_name: String,
    /// Ranks held, as loaded from the user_ranks join
    pub ranks: Vec<Rank>,
}

impl UserIdentity {
    pub fn new(user: User, ranks: Vec<Rank>) -> Self {
        Self {
            id: user.id,
            platform_id: user.platform_id,
            display_name: user.display_name,
            ranks,
        }
    }

    /// Whether any held rank carries the patron flag.
    pub fn is_patron(&self) -> bool {
        self.ranks.iter().any(|r| r.patron)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpsertUserRequest {
    #[validate(length(min = 1, max = 32, message = "platform_id must be 1-32 characters"))]
    pub platform_id: String,

    #[validate(length(min = 1, max = 100, message = "display_name must be 1-100 characters"))]
    pub display_name: String,

    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRankRequest {
    #[validate(length(min = 1, max = 64, message = "Rank name must be 1-64 characters"))]
    pub name: String,

    pub priority: i32,

    #[validate(range(min = 0, max = 100, message = "max_games must be 0-100"))]
    pub max_games: i32,

    #[serde(default)]
    pub patron: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GrantBonusCreditRequest {
    pub user_id: Uuid,

    #[validate(range(min = 1, max = 100, message = "credits must be 1-100"))]
    pub credits: i32,

    #[validate(length(max = 256))]
    pub reason: Option<String>,

    pub expires_at: Option<DateTime<Utc>>,
}
