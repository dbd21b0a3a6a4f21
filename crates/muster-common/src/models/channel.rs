//! Game channel model — the mustering space binding for a game.
//!
//! One channel per game, created as game time approaches and destroyed a
//! fixed number of hours after start. The phase advances monotonically;
//! each phase's message fires at most once.

use bitflags::bitflags;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Binding between a game and its chat-platform channel.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct GameChannel {
    pub id: Uuid,

    /// The game this channel musters (unique)
    pub game_id: Uuid,

    /// External chat-platform channel id
    pub channel_id: String,

    pub phase: ChannelPhase,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Monotonic channel lifecycle phase: `Ready → ReminderSent → WarningSent
/// → Summarised`. Never regresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChannelPhase {
    /// Channel exists, mustering announcement posted
    Ready,
    /// Pre-game reminder ping posted
    ReminderSent,
    /// Final warning posted
    WarningSent,
    /// Post-game session-log template posted
    Summarised,
}

bitflags! {
    /// Per-member access granted on a game channel.
    ///
    /// Confirmed party members read and write; waitlisted members may only
    /// read; the DM additionally moderates.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ChannelAccess: u8 {
        const VIEW     = 1 << 0;
        const SEND     = 1 << 1;
        const MODERATE = 1 << 2;
    }
}

impl ChannelAccess {
    /// Waitlist: read-only.
    pub fn read_only() -> Self {
        Self::VIEW
    }

    /// Confirmed party: read/write.
    pub fn member() -> Self {
        Self::VIEW | Self::SEND
    }

    /// DM: read/write plus moderation.
    pub fn moderator() -> Self {
        Self::VIEW | Self::SEND | Self::MODERATE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_are_ordered() {
        assert!(ChannelPhase::Ready < ChannelPhase::ReminderSent);
        assert!(ChannelPhase::ReminderSent < ChannelPhase::WarningSent);
        assert!(ChannelPhase::WarningSent < ChannelPhase::Summarised);
    }

    #[test]
    fn access_levels_nest() {
        assert!(ChannelAccess::moderator().contains(ChannelAccess::member()));
        assert!(ChannelAccess::member().contains(ChannelAccess::read_only()));
        assert!(!ChannelAccess::read_only().contains(ChannelAccess::SEND));
    }
}
