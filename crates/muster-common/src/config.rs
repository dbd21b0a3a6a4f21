//! Application configuration loaded from environment variables and config files.
//!
//! Supports `.env` files for development and environment variables for production.
//! Config precedence: env vars > .env file > config.toml > defaults

use serde::Deserialize;
use std::sync::OnceLock;

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Get the global application configuration.
///
/// # Panics
/// Panics if config has not been initialized via [`init`].
pub fn get() -> &'static AppConfig {
    CONFIG
        .get()
        .expect("Config not initialized. Call muster_common::config::init() first.")
}

/// Initialize the global configuration from environment.
///
/// Should be called once at application startup, before any other code accesses config.
pub fn init() -> Result<&'static AppConfig, config::ConfigError> {
    // Load .env file if present (development)
    let _ = dotenvy::dotenv();

    let cfg = config::Config::builder()
        // Defaults
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080)?
        .set_default("database.max_connections", 20)?
        .set_default("database.min_connections", 5)?
        .set_default("platform.api_base", "https://discord.com/api/v10")?
        .set_default("platform.announce_channel_id", "")?
        .set_default("platform.category_id", "")?
        // Channel lifecycle windows relative to game start (spelled out in
        // the unit each option is named after)
        .set_default("channels.creation_days", 3)?
        .set_default("channels.remind_hours", 24)?
        .set_default("channels.warn_minutes", 60)?
        .set_default("channels.destroy_hours", 72)?
        // Background reconciliation intervals
        .set_default("scheduler.lifecycle_interval_secs", 60)?
        .set_default("scheduler.channel_interval_secs", 120)?
        .set_default("scheduler.membership_interval_secs", 30)?
        .set_default("admin.roles", Vec::<String>::new())?
        // Optional config file
        .add_source(config::File::with_name("config").required(false))
        // Environment variables (MUSTER_SERVER__HOST, MUSTER_DATABASE__URL, etc.)
        .add_source(
            config::Environment::with_prefix("MUSTER")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let app_config: AppConfig = cfg.try_deserialize()?;
    Ok(CONFIG.get_or_init(|| app_config))
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub platform: PlatformConfig,
    pub channels: ChannelWindowConfig,
    pub scheduler: SchedulerConfig,
    pub admin: AdminConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// JWT verification secret (HS256). Tokens are issued by the auth
    /// collaborator; Muster only verifies them.
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PlatformConfig {
    /// Chat platform REST API base URL
    pub api_base: String,
    /// Bot token used for all platform calls
    pub bot_token: String,
    /// Guild/server the bot operates in
    pub guild_id: String,
    /// Channel where release announcements are posted (empty = disabled)
    pub announce_channel_id: String,
    /// Category under which per-game channels are created (empty = root)
    pub category_id: String,
}

/// Time windows driving the per-game channel lifecycle.
#[derive(Debug, Deserialize, Clone)]
pub struct ChannelWindowConfig {
    /// Create the game channel this many days before start
    pub creation_days: i64,
    /// Post the reminder ping this many hours before start
    pub remind_hours: i64,
    /// Post the final warning this many minutes before start
    pub warn_minutes: i64,
    /// Destroy the channel this many hours after start
    pub destroy_hours: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SchedulerConfig {
    pub lifecycle_interval_secs: u64,
    pub channel_interval_secs: u64,
    pub membership_interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AdminConfig {
    /// Role names whose holders may force-add/remove players and issue
    /// sanctions. Treated as an opaque authorization predicate.
    pub roles: Vec<String>,
}

impl AdminConfig {
    /// True if any of the caller's roles grants admin rights.
    pub fn is_admin(&self, caller_roles: &[String]) -> bool {
        caller_roles.iter().any(|r| self.roles.contains(r))
    }
}
