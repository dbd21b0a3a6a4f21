//! Channel lifecycle controller.
//!
//! Drives each game's mustering channel through creation, reminder,
//! warning, summary, and destruction, off fixed time windows around the
//! game's start. Every transition is guarded on the persisted phase so a
//! repeated tick (or two concurrent ones) fires each message at most once.

use chrono::{DateTime, Duration, Utc};
use muster_common::config::ChannelWindowConfig;
use muster_common::error::MusterResult;
use muster_common::models::channel::{ChannelPhase, GameChannel};
use muster_common::models::game::Game;
use muster_common::snowflake::generate_id;
use muster_db::{repository, Database};
use muster_platform::{ChatPlatform, PlatformError};
use uuid::Uuid;

use crate::lifecycle;
use crate::roster::{self, Roster};

/// Post-start bounds of the summary window.
const SUMMARY_AFTER_HOURS: i64 = 1;
const SUMMARY_UNTIL_HOURS: i64 = 4;

/// Time windows around `game.start_at`, loaded from config.
#[derive(Debug, Clone, Copy)]
pub struct ChannelWindows {
    pub creation_days: i64,
    pub remind_hours: i64,
    pub warn_minutes: i64,
    pub destroy_hours: i64,
}

impl From<&ChannelWindowConfig> for ChannelWindows {
    fn from(c: &ChannelWindowConfig) -> Self {
        Self {
            creation_days: c.creation_days,
            remind_hours: c.remind_hours,
            warn_minutes: c.warn_minutes,
            destroy_hours: c.destroy_hours,
        }
    }
}

/// What the controller should do for one game right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelAction {
    Create,
    Remind,
    Warn,
    Summarise,
    Destroy,
}

/// Decide the due action for a game given its current channel binding.
///
/// Later windows shadow earlier ones: a game first seen inside the warning
/// window warns without ever reminding, and destruction wins over
/// everything.
pub fn due_action(
    game: &Game,
    channel: Option<&GameChannel>,
    windows: &ChannelWindows,
    now: DateTime<Utc>,
) -> Option<ChannelAction> {
    let start = game.start_at;

    match channel {
        None => {
            // Creation window: close enough to start, not yet started, and
            // the game still in active reconciliation.
            if lifecycle::is_expired(game, now) {
                return None;
            }
            let opens = start - Duration::days(windows.creation_days);
            (now >= opens && now < start).then_some(ChannelAction::Create)
        }
        Some(ch) => {
            if now >= start + Duration::hours(windows.destroy_hours) || !game.ready {
                return Some(ChannelAction::Destroy);
            }
            if ch.phase < ChannelPhase::Summarised
                && now >= start + Duration::hours(SUMMARY_AFTER_HOURS)
                && now < start + Duration::hours(SUMMARY_UNTIL_HOURS)
            {
                return Some(ChannelAction::Summarise);
            }
            if ch.phase < ChannelPhase::WarningSent
                && now >= start - Duration::minutes(windows.warn_minutes)
                && now < start
            {
                return Some(ChannelAction::Warn);
            }
            if ch.phase < ChannelPhase::ReminderSent
                && now >= start - Duration::hours(windows.remind_hours)
                && now < start
            {
                return Some(ChannelAction::Remind);
            }
            None
        }
    }
}

/// One controller tick over every game with (or due) a channel. Failures
/// are isolated per game.
pub async fn tick(
    db: &Database,
    platform: &dyn ChatPlatform,
    windows: &ChannelWindows,
) -> MusterResult<()> {
    let now = Utc::now();

    // Channels already bound, keyed by game — these drive remind/warn/
    // summarise/destroy. Rebuilt from persisted state every tick; nothing
    // survives a restart in memory.
    let bindings = repository::channels::list_all(&db.pool).await?;
    let mut seen: Vec<Uuid> = Vec::with_capacity(bindings.len());

    for binding in bindings {
        seen.push(binding.game_id);
        let Some(game) = repository::games::find_game(&db.pool, binding.game_id).await? else {
            // Game hard-deleted under the binding: destroy the channel.
            if let Err(e) = platform.delete_channel(&binding.channel_id).await {
                tracing::warn!(channel = %binding.channel_id, "Orphan channel delete failed: {e}");
            }
            repository::channels::delete_channel(&db.pool, binding.game_id).await?;
            continue;
        };
        let Some(action) = due_action(&game, Some(&binding), windows, now) else {
            continue;
        };
        if let Err(e) = apply(db, platform, &game, Some(&binding), action).await {
            tracing::warn!(game_id = %game.id, ?action, "Channel action failed: {e}");
        }
    }

    // Unbound active games — these can only be due for creation.
    for game in repository::games::list_active(&db.pool, now).await? {
        if seen.contains(&game.id) {
            continue;
        }
        let Some(action) = due_action(&game, None, windows, now) else {
            continue;
        };
        if let Err(e) = apply(db, platform, &game, None, action).await {
            tracing::warn!(game_id = %game.id, ?action, "Channel action failed: {e}");
        }
    }
    Ok(())
}

/// Apply one action. Phase advances are claimed before posting, so a
/// failed post is logged and dropped rather than duplicated.
async fn apply(
    db: &Database,
    platform: &dyn ChatPlatform,
    game: &Game,
    binding: Option<&GameChannel>,
    action: ChannelAction,
) -> MusterResult<()> {
    match action {
        ChannelAction::Create => create_channel(db, platform, game).await,
        ChannelAction::Remind | ChannelAction::Warn | ChannelAction::Summarise => {
            let binding = binding.expect("phase actions require a binding");
            let to = match action {
                ChannelAction::Remind => ChannelPhase::ReminderSent,
                ChannelAction::Warn => ChannelPhase::WarningSent,
                _ => ChannelPhase::Summarised,
            };
            // Claim the transition first; a concurrent tick loses the
            // guard and posts nothing.
            if !repository::channels::advance_phase(&db.pool, game.id, binding.phase, to).await? {
                return Ok(());
            }
            let roster = roster::load(db, game.id).await?;
            let content = match action {
                ChannelAction::Remind => reminder_message(game, &roster, db).await?,
                ChannelAction::Warn => warning_message(game, &roster, db).await?,
                _ => summary_template(game),
            };
            match platform.post_message(&binding.channel_id, &content).await {
                Ok(_) => {
                    tracing::info!(game_id = %game.id, ?to, "Channel phase advanced");
                    Ok(())
                }
                Err(PlatformError::ChannelMissing(_)) => {
                    tracing::warn!(game_id = %game.id, "Channel gone externally, dropping binding");
                    repository::channels::delete_channel(&db.pool, game.id).await?;
                    Ok(())
                }
                Err(e) => Err(crate::platform_err(e)),
            }
        }
        ChannelAction::Destroy => {
            let binding = binding.expect("destroy requires a binding");
            platform
                .delete_channel(&binding.channel_id)
                .await
                .map_err(crate::platform_err)?;
            repository::channels::delete_channel(&db.pool, game.id).await?;
            tracing::info!(game_id = %game.id, "Channel destroyed");
            Ok(())
        }
    }
}

async fn create_channel(
    db: &Database,
    platform: &dyn ChatPlatform,
    game: &Game,
) -> MusterResult<()> {
    let roster = roster::load(db, game.id).await?;
    let members = super::reconciler::expected_members(db, &roster).await?;

    let name = channel_name(game);
    let topic = format!(
        "Mustering for {} — starts {}",
        game.name,
        game.start_at.format("%Y-%m-%d %H:%M UTC")
    );
    let channel_id = platform
        .create_channel(&name, &topic, &members)
        .await
        .map_err(crate::platform_err)?;
    repository::channels::insert_channel(&db.pool, generate_id(), game.id, &channel_id).await?;

    let announcement = mustering_announcement(db, game, &roster).await?;
    if let Err(e) = platform.post_message(&channel_id, &announcement).await {
        tracing::warn!(game_id = %game.id, "Mustering announcement failed: {e}");
    }
    tracing::info!(game_id = %game.id, channel = %channel_id, "Channel created");
    Ok(())
}

/// Lowercase, hyphenated channel name from the game name.
fn channel_name(game: &Game) -> String {
    let slug: String = game
        .name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    let slug = slug.trim_matches('-').to_owned();
    format!("game-{}", if slug.is_empty() { "session".into() } else { slug })
}

async fn mustering_announcement(db: &Database, game: &Game, roster: &Roster) -> MusterResult<String> {
    let mut lines = vec![format!(
        "**{}** musters here — starting {}.",
        game.name,
        game.start_at.format("%Y-%m-%d %H:%M UTC")
    )];
    lines.push(format!("Party ({}/{}):", roster.confirmed.len(), game.max_players));
    for entry in &roster.confirmed {
        if let Some(user) = repository::users::find_user(&db.pool, entry.user_id).await? {
            lines.push(format!("- {}", user.display_name));
        }
    }
    if !roster.waitlist.is_empty() {
        lines.push("Waitlist:".into());
        for (i, entry) in roster.waitlist.iter().enumerate() {
            if let Some(user) = repository::users::find_user(&db.pool, entry.user_id).await? {
                lines.push(format!("{}. {}", i + 1, user.display_name));
            }
        }
    }
    Ok(lines.join("\n"))
}

/// Ping everyone on the roster, confirmed and waitlisted alike.
async fn mention_all(db: &Database, roster: &Roster) -> MusterResult<String> {
    let mut mentions = Vec::new();
    for entry in roster.confirmed.iter().chain(roster.waitlist.iter()) {
        if let Some(user) = repository::users::find_user(&db.pool, entry.user_id).await? {
            mentions.push(format!("<@{}>", user.platform_id));
        }
    }
    Ok(mentions.join(" "))
}

async fn reminder_message(game: &Game, roster: &Roster, db: &Database) -> MusterResult<String> {
    Ok(format!(
        "{} — reminder: **{}** starts {}. Drop out now if you cannot make it.",
        mention_all(db, roster).await?,
        game.name,
        game.start_at.format("%Y-%m-%d %H:%M UTC")
    ))
}

async fn warning_message(game: &Game, roster: &Roster, db: &Database) -> MusterResult<String> {
    Ok(format!(
        "{} — **{}** is about to start!",
        mention_all(db, roster).await?,
        game.name
    ))
}

fn summary_template(game: &Game) -> String {
    format!(
        "Session log for **{}**\n\
         DM: fill in below.\n\
         - Attendance:\n\
         - Outcome:\n\
         - Loot & rewards:\n\
         - Notes for next time:",
        game.name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use muster_common::models::game::GameStatus;

    const WINDOWS: ChannelWindows = ChannelWindows {
        creation_days: 3,
        remind_hours: 24,
        warn_minutes: 60,
        destroy_hours: 72,
    };

    fn game_starting_in(minutes: i64) -> (Game, DateTime<Utc>) {
        let now = Utc::now();
        let g = Game {
            id: generate_id(),
            dm_id: generate_id(),
            name: "Curse of Strahd".into(),
            module: None,
            description: None,
            max_players: 4,
            start_at: now + Duration::minutes(minutes),
            release_priority_at: None,
            release_open_at: Some(now - Duration::days(7)),
            ready: true,
            status: GameStatus::Released,
            waitlist_seq: 0,
            created_at: now,
            updated_at: now,
        };
        (g, now)
    }

    fn binding(game_id: Uuid, phase: ChannelPhase) -> GameChannel {
        let now = Utc::now();
        GameChannel {
            id: generate_id(),
            game_id,
            channel_id: "555".into(),
            phase,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn creation_fires_inside_the_window_only() {
        let (g, now) = game_starting_in(2 * 24 * 60); // 2 days out
        assert_eq!(due_action(&g, None, &WINDOWS, now), Some(ChannelAction::Create));

        let (g, now) = game_starting_in(5 * 24 * 60); // 5 days out
        assert_eq!(due_action(&g, None, &WINDOWS, now), None);
    }

    #[test]
    fn no_creation_for_unready_games() {
        let (mut g, now) = game_starting_in(60);
        g.ready = false;
        assert_eq!(due_action(&g, None, &WINDOWS, now), None);
    }

    #[test]
    fn reminder_fires_once_then_stays_quiet() {
        let (g, now) = game_starting_in(12 * 60); // 12h out
        let b = binding(g.id, ChannelPhase::Ready);
        assert_eq!(due_action(&g, Some(&b), &WINDOWS, now), Some(ChannelAction::Remind));

        // phase advanced — same window, no action
        let b = binding(g.id, ChannelPhase::ReminderSent);
        assert_eq!(due_action(&g, Some(&b), &WINDOWS, now), None);
    }

    #[test]
    fn warning_shadows_a_missed_reminder() {
        // first tick inside the warning window with the reminder never sent
        let (g, now) = game_starting_in(30);
        let b = binding(g.id, ChannelPhase::Ready);
        assert_eq!(due_action(&g, Some(&b), &WINDOWS, now), Some(ChannelAction::Warn));
    }

    #[test]
    fn summary_fires_between_one_and_four_hours_after_start() {
        let (g, now) = game_starting_in(-2 * 60); // started 2h ago
        let b = binding(g.id, ChannelPhase::WarningSent);
        assert_eq!(due_action(&g, Some(&b), &WINDOWS, now), Some(ChannelAction::Summarise));

        let (g, now) = game_starting_in(-30); // too early
        let b = binding(g.id, ChannelPhase::WarningSent);
        assert_eq!(due_action(&g, Some(&b), &WINDOWS, now), None);

        let (g, now) = game_starting_in(-5 * 60); // window closed
        let b = binding(g.id, ChannelPhase::WarningSent);
        assert_eq!(due_action(&g, Some(&b), &WINDOWS, now), None);

        // already summarised: never again
        let (g, now) = game_starting_in(-2 * 60);
        let b = binding(g.id, ChannelPhase::Summarised);
        assert_eq!(due_action(&g, Some(&b), &WINDOWS, now), None);
    }

    #[test]
    fn destruction_after_the_destroy_window_or_on_unready() {
        let (g, now) = game_starting_in(-73 * 60);
        let b = binding(g.id, ChannelPhase::Summarised);
        assert_eq!(due_action(&g, Some(&b), &WINDOWS, now), Some(ChannelAction::Destroy));

        let (mut g, now) = game_starting_in(60);
        g.ready = false;
        let b = binding(g.id, ChannelPhase::Ready);
        assert_eq!(due_action(&g, Some(&b), &WINDOWS, now), Some(ChannelAction::Destroy));
    }

    #[test]
    fn channel_names_are_slugged() {
        let (mut g, _) = game_starting_in(60);
        g.name = "Curse of Strahd!".into();
        assert_eq!(channel_name(&g), "game-curse-of-strahd");
    }
}
