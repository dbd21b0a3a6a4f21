//! Game lifecycle state machine — time-driven release transitions.
//!
//! Pending games go patron-visible when their priority gate passes and
//! publicly visible when their general gate passes; a game with only a
//! general gate skips straight to released. The stored status is purely an
//! announcement cursor — visibility is always re-derived from the
//! timestamps, and transitions are guarded updates so each announcement
//! fires exactly once.

use chrono::{DateTime, Duration, Utc};
use muster_common::error::MusterResult;
use muster_common::models::game::{Game, GameStatus};
use muster_db::{repository, Database};
use muster_platform::ChatPlatform;

/// Grace window after start before a game counts as expired.
const EXPIRY_GRACE_HOURS: i64 = 24;

/// The transition (if any) due for a game at `now`.
pub fn next_status(game: &Game, now: DateTime<Utc>) -> Option<GameStatus> {
    if !game.ready || !game.has_release_gate() {
        return None;
    }
    let open_passed = game.release_open_at.is_some_and(|t| now >= t);
    let priority_passed = game.release_priority_at.is_some_and(|t| now >= t);

    match game.status {
        GameStatus::Draft | GameStatus::Pending => {
            if open_passed {
                // No priority window configured (or both passed at once):
                // skip straight to general release.
                Some(GameStatus::Released)
            } else if priority_passed {
                Some(GameStatus::Priority)
            } else {
                None
            }
        }
        GameStatus::Priority => open_passed.then_some(GameStatus::Released),
        GameStatus::Released | GameStatus::Cancelled => None,
    }
}

/// Display treatment: the priority gate has passed but the general gate
/// has not — patrons see the game, everyone else does not.
pub fn is_patron_exclusive(game: &Game, now: DateTime<Utc>) -> bool {
    let priority_passed = game.release_priority_at.is_some_and(|t| now >= t);
    let open_passed = game.release_open_at.is_some_and(|t| now >= t);
    priority_passed && !open_passed
}

/// A game is expired once it is unready or past the post-start grace
/// window. Expired games drop out of reconciliation and their channel is
/// scheduled for destruction.
pub fn is_expired(game: &Game, now: DateTime<Utc>) -> bool {
    !game.ready || game.start_at < now - Duration::hours(EXPIRY_GRACE_HOURS)
}

/// One lifecycle tick: apply every due transition, announcing each one.
/// Failures are isolated per game.
pub async fn advance_all(
    db: &Database,
    platform: &dyn ChatPlatform,
    announce_channel_id: &str,
) -> MusterResult<()> {
    let now = Utc::now();
    let games = repository::games::list_announceable(&db.pool).await?;

    for game in games {
        let Some(next) = next_status(&game, now) else {
            continue;
        };
        if let Err(e) = advance_one(db, platform, announce_channel_id, &game, next).await {
            tracing::warn!(game_id = %game.id, "Lifecycle transition failed: {e}");
        }
    }
    Ok(())
}

async fn advance_one(
    db: &Database,
    platform: &dyn ChatPlatform,
    announce_channel_id: &str,
    game: &Game,
    next: GameStatus,
) -> MusterResult<()> {
    // Guarded on the current status: a concurrent tick that already
    // advanced the game makes this a no-op, and the announcement is skipped.
    let advanced =
        repository::games::advance_status(&db.pool, game.id, game.status, next).await?;
    if !advanced {
        return Ok(());
    }

    tracing::info!(game_id = %game.id, from = ?game.status, to = ?next, "Game released");

    if announce_channel_id.is_empty() {
        return Ok(());
    }
    let content = match next {
        GameStatus::Priority => format!(
            "**{}** is now open for patron signups — starts {}.",
            game.name,
            game.start_at.format("%Y-%m-%d %H:%M UTC")
        ),
        GameStatus::Released => format!(
            "**{}** is now open for signups — starts {}.",
            game.name,
            game.start_at.format("%Y-%m-%d %H:%M UTC")
        ),
        _ => return Ok(()),
    };
    platform
        .post_message(announce_channel_id, &content)
        .await
        .map_err(crate::platform_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use muster_common::snowflake::generate_id;

    fn game(
        status: GameStatus,
        priority: Option<i64>,
        open: Option<i64>,
        ready: bool,
    ) -> (Game, DateTime<Utc>) {
        // offsets are minutes relative to `now`: negative = already passed
        let now = Utc::now();
        let g = Game {
            id: generate_id(),
            dm_id: generate_id(),
            name: "Tomb of Annihilation".into(),
            module: None,
            description: None,
            max_players: 5,
            start_at: now + Duration::days(5),
            release_priority_at: priority.map(|m| now + Duration::minutes(m)),
            release_open_at: open.map(|m| now + Duration::minutes(m)),
            ready,
            status,
            waitlist_seq: 0,
            created_at: now,
            updated_at: now,
        };
        (g, now)
    }

    #[test]
    fn pending_goes_priority_when_gate_passes() {
        let (g, now) = game(GameStatus::Pending, Some(-5), Some(60), true);
        assert_eq!(next_status(&g, now), Some(GameStatus::Priority));
    }

    #[test]
    fn priority_goes_released_when_open_gate_passes() {
        let (g, now) = game(GameStatus::Priority, Some(-120), Some(-5), true);
        assert_eq!(next_status(&g, now), Some(GameStatus::Released));
    }

    #[test]
    fn draft_skips_to_released_with_only_open_gate() {
        let (g, now) = game(GameStatus::Draft, None, Some(-1), true);
        assert_eq!(next_status(&g, now), Some(GameStatus::Released));
    }

    #[test]
    fn no_transition_before_any_gate() {
        let (g, now) = game(GameStatus::Pending, Some(30), Some(120), true);
        assert_eq!(next_status(&g, now), None);
    }

    #[test]
    fn unready_games_never_transition() {
        let (g, now) = game(GameStatus::Pending, Some(-5), Some(-1), false);
        assert_eq!(next_status(&g, now), None);
    }

    #[test]
    fn released_is_terminal() {
        let (g, now) = game(GameStatus::Released, Some(-120), Some(-60), true);
        assert_eq!(next_status(&g, now), None);
    }

    #[test]
    fn patron_exclusive_between_the_gates() {
        let (g, now) = game(GameStatus::Priority, Some(-10), Some(60), true);
        assert!(is_patron_exclusive(&g, now));

        let (g, now) = game(GameStatus::Released, Some(-120), Some(-10), true);
        assert!(!is_patron_exclusive(&g, now));

        // no priority gate configured at all
        let (g, now) = game(GameStatus::Pending, None, Some(60), true);
        assert!(!is_patron_exclusive(&g, now));
    }

    #[test]
    fn expiry_from_grace_window_or_unready() {
        let (mut g, now) = game(GameStatus::Released, None, Some(-10), true);
        assert!(!is_expired(&g, now));

        g.start_at = now - Duration::hours(25);
        assert!(is_expired(&g, now));

        g.start_at = now + Duration::days(1);
        g.ready = false;
        assert!(is_expired(&g, now));
    }
}
