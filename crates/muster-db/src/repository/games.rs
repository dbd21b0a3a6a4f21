//! Game repository — CRUD plus the lifecycle and concurrency primitives.
//!
//! Functions taking `&mut PgConnection` are meant to run inside a caller's
//! transaction (the per-game critical sections); everything else runs on
//! the pool directly.

use chrono::{DateTime, Duration, Utc};
use muster_common::models::game::{Game, GameStatus};
use sqlx::PgConnection;
use uuid::Uuid;

/// Create a game in draft state.
#[allow(clippy::too_many_arguments)]
pub async fn create_game(
    pool: &sqlx::PgPool,
    id: Uuid,
    dm_id: Uuid,
    name: &str,
    module: Option<&str>,
    description: Option<&str>,
    max_players: i32,
    start_at: DateTime<Utc>,
    release_priority_at: Option<DateTime<Utc>>,
    release_open_at: Option<DateTime<Utc>>,
) -> Result<Game, sqlx::Error> {
    sqlx::query_as::<_, Game>(
        r#"
        INSERT INTO games
            (id, dm_id, name, module, description, max_players, start_at,
             release_priority_at, release_open_at, ready, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, true, 'pending')
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(dm_id)
    .bind(name)
    .bind(module)
    .bind(description)
    .bind(max_players)
    .bind(start_at)
    .bind(release_priority_at)
    .bind(release_open_at)
    .fetch_one(pool)
    .await
}

/// Get a game by id.
pub async fn find_game(pool: &sqlx::PgPool, game_id: Uuid) -> Result<Option<Game>, sqlx::Error> {
    sqlx::query_as::<_, Game>("SELECT * FROM games WHERE id = $1")
        .bind(game_id)
        .fetch_optional(pool)
        .await
}

/// Lock a game row for the duration of the caller's transaction.
///
/// This is the per-game mutex: every roster mutation that must observe a
/// consistent confirmed-count takes this lock first.
pub async fn lock_game(conn: &mut PgConnection, game_id: Uuid) -> Result<Option<Game>, sqlx::Error> {
    sqlx::query_as::<_, Game>("SELECT * FROM games WHERE id = $1 FOR UPDATE")
        .bind(game_id)
        .fetch_optional(conn)
        .await
}

/// Upcoming joinable games: released, ready, and not yet started. Patrons
/// additionally see games still inside their priority window.
pub async fn list_joinable(
    pool: &sqlx::PgPool,
    now: DateTime<Utc>,
    include_priority: bool,
) -> Result<Vec<Game>, sqlx::Error> {
    sqlx::query_as::<_, Game>(
        r#"
        SELECT * FROM games
        WHERE (status = 'released' OR (status = 'priority' AND $2))
          AND ready = true AND start_at >= $1
        ORDER BY start_at
        "#,
    )
    .bind(now)
    .bind(include_priority)
    .fetch_all(pool)
    .await
}

/// Games the lifecycle tick should consider for announcement: ready, not
/// terminal, and carrying at least one release gate.
pub async fn list_announceable(pool: &sqlx::PgPool) -> Result<Vec<Game>, sqlx::Error> {
    sqlx::query_as::<_, Game>(
        r#"
        SELECT * FROM games
        WHERE ready = true
          AND status IN ('draft', 'pending', 'priority')
          AND (release_priority_at IS NOT NULL OR release_open_at IS NOT NULL)
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Games still in active reconciliation: ready and started less than the
/// grace window ago. Expired and unready games fall out of this set.
pub async fn list_active(
    pool: &sqlx::PgPool,
    now: DateTime<Utc>,
) -> Result<Vec<Game>, sqlx::Error> {
    sqlx::query_as::<_, Game>(
        r#"
        SELECT * FROM games
        WHERE ready = true AND status <> 'cancelled' AND start_at >= $1
        ORDER BY start_at
        "#,
    )
    .bind(now - Duration::hours(24))
    .fetch_all(pool)
    .await
}

/// Advance a game's announcement status, guarded on the expected current
/// status so each transition fires exactly once under concurrent ticks.
pub async fn advance_status(
    pool: &sqlx::PgPool,
    game_id: Uuid,
    from: GameStatus,
    to: GameStatus,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE games SET status = $1, updated_at = now() WHERE id = $2 AND status = $3",
    )
    .bind(to)
    .bind(game_id)
    .bind(from)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Soft-delete: mark a game unready so it drops out of all reconciliation.
pub async fn set_ready(pool: &sqlx::PgPool, game_id: Uuid, ready: bool) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE games SET ready = $1, updated_at = now() WHERE id = $2")
        .bind(ready)
        .bind(game_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Claim the next waitlist position for a game.
///
/// The counter is strictly increasing and never reused, so concurrent
/// waitlist adds cannot collide on a position.
pub async fn next_waitlist_seq(conn: &mut PgConnection, game_id: Uuid) -> Result<i32, sqlx::Error> {
    let row: (i32,) = sqlx::query_as(
        "UPDATE games SET waitlist_seq = waitlist_seq + 1 WHERE id = $1 RETURNING waitlist_seq",
    )
    .bind(game_id)
    .fetch_one(conn)
    .await?;
    Ok(row.0)
}
