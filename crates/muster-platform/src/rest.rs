//! Async REST client for the chat platform's bot API.

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use muster_common::models::channel::ChannelAccess;

use crate::{ChannelMember, ChatPlatform, PlatformError, Result};

/// REST implementation of [`ChatPlatform`].
#[derive(Clone)]
pub struct RestPlatform {
    client: Client,
    base_url: String,
    guild_id: String,
    /// Category the per-game channels are created under (empty = root)
    category_id: String,
}

impl RestPlatform {
    pub fn new(
        token: impl Into<String>,
        base_url: &str,
        guild_id: impl Into<String>,
        category_id: impl Into<String>,
    ) -> Result<Self> {
        let token = {
            let t = token.into();
            if t.starts_with("Bot ") { t } else { format!("Bot {t}") }
        };
        let client = Client::builder()
            .default_headers({
                let mut h = reqwest::header::HeaderMap::new();
                h.insert(
                    reqwest::header::AUTHORIZATION,
                    reqwest::header::HeaderValue::from_str(&token).map_err(|e| {
                        PlatformError::Api {
                            status: 0,
                            message: e.to_string(),
                        }
                    })?,
                );
                h.insert(
                    reqwest::header::CONTENT_TYPE,
                    reqwest::header::HeaderValue::from_static("application/json"),
                );
                h
            })
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            guild_id: guild_id.into(),
            category_id: category_id.into(),
        })
    }

    // ── Internal ──────────────────────────────────────────────────────────────

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method, &url);
        if let Some(b) = body {
            req = req.json(b);
        }
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let msg = resp
                .json::<Value>()
                .await
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_owned))
                .unwrap_or_else(|| status.to_string());
            return Err(PlatformError::Api {
                status: status.as_u16(),
                message: msg,
            });
        }
        if status == StatusCode::NO_CONTENT {
            return serde_json::from_value(Value::Null)
                .map_err(|e| PlatformError::Api {
                    status: status.as_u16(),
                    message: e.to_string(),
                });
        }
        resp.json::<T>().await.map_err(PlatformError::Http)
    }

    /// Map a 404 on a channel-scoped call to [`PlatformError::ChannelMissing`].
    fn channel_scoped<T>(result: Result<T>, channel_id: &str) -> Result<T> {
        match result {
            Err(PlatformError::Api { status: 404, .. }) => {
                Err(PlatformError::ChannelMissing(channel_id.to_owned()))
            }
            other => other,
        }
    }

    fn overwrite_body(member: &ChannelMember) -> Value {
        json!({
            "user_id": member.platform_id,
            "view": member.access.contains(ChannelAccess::VIEW),
            "send": member.access.contains(ChannelAccess::SEND),
            "moderate": member.access.contains(ChannelAccess::MODERATE),
        })
    }
}

#[derive(serde::Deserialize)]
struct ChannelCreated {
    id: String,
}

#[derive(serde::Deserialize)]
struct MessagePosted {
    id: String,
}

#[derive(serde::Deserialize)]
struct MemberState {
    user_id: String,
    view: bool,
    send: bool,
    moderate: bool,
}

impl From<MemberState> for ChannelMember {
    fn from(m: MemberState) -> Self {
        let mut access = ChannelAccess::empty();
        access.set(ChannelAccess::VIEW, m.view);
        access.set(ChannelAccess::SEND, m.send);
        access.set(ChannelAccess::MODERATE, m.moderate);
        ChannelMember {
            platform_id: m.user_id,
            access,
        }
    }
}

#[async_trait::async_trait]
impl ChatPlatform for RestPlatform {
    async fn send_dm(&self, platform_id: &str, content: &str) -> Result<()> {
        let body = json!({ "content": content });
        self.request::<Value>(
            Method::POST,
            &format!("/users/{platform_id}/messages"),
            Some(&body),
        )
        .await?;
        Ok(())
    }

    async fn create_channel(
        &self,
        name: &str,
        topic: &str,
        members: &[ChannelMember],
    ) -> Result<String> {
        let overwrites: Vec<Value> = members.iter().map(Self::overwrite_body).collect();
        let mut body = json!({
            "name": name,
            "topic": topic,
            "permission_overwrites": overwrites,
        });
        if !self.category_id.is_empty() {
            body["parent_id"] = json!(self.category_id);
        }
        let created: ChannelCreated = self
            .request(
                Method::POST,
                &format!("/guilds/{}/channels", self.guild_id),
                Some(&body),
            )
            .await?;
        Ok(created.id)
    }

    async fn delete_channel(&self, channel_id: &str) -> Result<()> {
        let result = self
            .request::<Value>(Method::DELETE, &format!("/channels/{channel_id}"), None)
            .await;
        match result {
            // Already gone externally — deletion is idempotent
            Err(PlatformError::Api { status: 404, .. }) => Ok(()),
            other => other.map(|_| ()),
        }
    }

    async fn set_member_access(
        &self,
        channel_id: &str,
        platform_id: &str,
        access: ChannelAccess,
    ) -> Result<()> {
        let member = ChannelMember {
            platform_id: platform_id.to_owned(),
            access,
        };
        let body = Self::overwrite_body(&member);
        Self::channel_scoped(
            self.request::<Value>(
                Method::PUT,
                &format!("/channels/{channel_id}/permissions/{platform_id}"),
                Some(&body),
            )
            .await
            .map(|_| ()),
            channel_id,
        )
    }

    async fn remove_member(&self, channel_id: &str, platform_id: &str) -> Result<()> {
        Self::channel_scoped(
            self.request::<Value>(
                Method::DELETE,
                &format!("/channels/{channel_id}/permissions/{platform_id}"),
                None,
            )
            .await
            .map(|_| ()),
            channel_id,
        )
    }

    async fn channel_members(&self, channel_id: &str) -> Result<Vec<ChannelMember>> {
        let states: Vec<MemberState> = Self::channel_scoped(
            self.request(
                Method::GET,
                &format!("/channels/{channel_id}/permissions"),
                None,
            )
            .await,
            channel_id,
        )?;
        Ok(states.into_iter().map(Into::into).collect())
    }

    async fn post_message(&self, channel_id: &str, content: &str) -> Result<String> {
        let body = json!({ "content": content });
        let posted: MessagePosted = Self::channel_scoped(
            self.request(
                Method::POST,
                &format!("/channels/{channel_id}/messages"),
                Some(&body),
            )
            .await,
            channel_id,
        )?;
        Ok(posted.id)
    }
}
