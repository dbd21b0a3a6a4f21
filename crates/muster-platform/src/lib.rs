//! # muster-platform
//!
//! The chat-platform boundary. The engine only ever talks to
//! [`ChatPlatform`]; the REST implementation in [`rest`] is wired in at
//! startup. Everything here is deliberately narrow — the six capabilities
//! the core consumes and nothing else.

pub mod rest;

use async_trait::async_trait;
use muster_common::models::channel::ChannelAccess;
use serde::{Deserialize, Serialize};

/// A member's current access state on a channel, as the platform reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMember {
    /// External platform user id
    pub platform_id: String,
    pub access: ChannelAccess,
}

/// Errors from the chat platform boundary.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The channel no longer exists externally. Callers treat the persisted
    /// binding as destroyed and clean it up rather than raising.
    #[error("Channel {0} not found on the platform")]
    ChannelMissing(String),

    #[error("Platform API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, PlatformError>;

/// The capabilities Muster consumes from the chat platform.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Send a direct message to a user by external id.
    async fn send_dm(&self, platform_id: &str, content: &str) -> Result<()>;

    /// Create a channel with the given initial member access overwrites.
    /// Returns the new external channel id.
    async fn create_channel(
        &self,
        name: &str,
        topic: &str,
        members: &[ChannelMember],
    ) -> Result<String>;

    /// Delete a channel. Succeeds if the channel is already gone.
    async fn delete_channel(&self, channel_id: &str) -> Result<()>;

    /// Grant or update a member's access on a channel.
    async fn set_member_access(
        &self,
        channel_id: &str,
        platform_id: &str,
        access: ChannelAccess,
    ) -> Result<()>;

    /// Remove a member's access from a channel.
    async fn remove_member(&self, channel_id: &str, platform_id: &str) -> Result<()>;

    /// List current member access states on a channel.
    async fn channel_members(&self, channel_id: &str) -> Result<Vec<ChannelMember>>;

    /// Post a message in a channel. Returns the message id.
    async fn post_message(&self, channel_id: &str, content: &str) -> Result<String>;
}
