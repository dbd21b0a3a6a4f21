//! Sanction models — bans and strikes.
//!
//! A soft ban blocks future signups; a hard ban additionally evicts the
//! user from every future game; a permanent ban is a hard ban with no end.
//! Strikes are lesser sanctions that escalate into a soft ban once three
//! are concurrently unexpired.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A ban record. "Currently banned" means `starts_at <= now` and
/// `ends_at` is either null or still in the future.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ban {
    pub id: Uuid,

    /// Sanctioned user
    pub user_id: Uuid,

    /// Admin who issued the ban
    pub issued_by: Uuid,

    pub reason: String,

    pub kind: BanKind,

    pub starts_at: DateTime<Utc>,

    /// None = permanent
    pub ends_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BanKind {
    /// Blocks future signups only
    Soft,
    /// Blocks signups and evicts from all future games
    Hard,
    /// Hard ban with no expiry
    Permanent,
}

impl BanKind {
    /// Whether issuing this ban evicts existing future reservations.
    pub fn evicts(&self) -> bool {
        matches!(self, BanKind::Hard | BanKind::Permanent)
    }
}

impl Ban {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.starts_at <= now && self.ends_at.is_none_or(|e| e >= now)
    }
}

/// A strike. Expires a year after issue by default.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Strike {
    pub id: Uuid,

    pub user_id: Uuid,

    pub issued_by: Uuid,

    pub reason: String,

    pub issued_at: DateTime<Utc>,

    pub expires_at: DateTime<Utc>,
}

impl Strike {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct IssueBanRequest {
    pub user_id: Uuid,

    #[validate(length(min = 1, max = 512, message = "reason must be 1-512 characters"))]
    pub reason: String,

    /// Soft or hard. `duration_days = -1` forces a permanent (hard) ban.
    pub kind: BanKind,

    /// Positive day count, or -1 for a permanent ban.
    pub duration_days: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct IssueStrikeRequest {
    pub user_id: Uuid,

    #[validate(length(min = 1, max = 512, message = "reason must be 1-512 characters"))]
    pub reason: String,
}
