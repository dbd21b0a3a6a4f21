//! Player repository — roster rows and the capacity/ordering primitives.
//!
//! The storage layer keeps the legacy-friendly `standby bool +
//! waitlist_pos int` columns; rows are lifted into the tagged
//! [`Membership`] variant at this boundary. Mutations that must observe a
//! consistent confirmed-count run inside the caller's transaction under
//! the [`super::games::lock_game`] row lock.

use chrono::{DateTime, Utc};
use muster_common::models::player::{Membership, PlayerEntry};
use sqlx::PgConnection;
use uuid::Uuid;

/// Raw players row as stored.
#[derive(sqlx::FromRow)]
struct PlayerRow {
    id: Uuid,
    game_id: Uuid,
    user_id: Uuid,
    standby: bool,
    waitlist_pos: i32,
    character: Option<String>,
    joined_at: DateTime<Utc>,
}

impl From<PlayerRow> for PlayerEntry {
    fn from(row: PlayerRow) -> Self {
        let membership = if row.standby {
            Membership::Waitlisted {
                position: row.waitlist_pos,
            }
        } else {
            Membership::Confirmed
        };
        PlayerEntry {
            id: row.id,
            game_id: row.game_id,
            user_id: row.user_id,
            membership,
            character: row.character,
            joined_at: row.joined_at,
        }
    }
}

/// Find the entry for (game, user), if any.
pub async fn find_entry(
    pool: &sqlx::PgPool,
    game_id: Uuid,
    user_id: Uuid,
) -> Result<Option<PlayerEntry>, sqlx::Error> {
    let row = sqlx::query_as::<_, PlayerRow>(
        "SELECT * FROM players WHERE game_id = $1 AND user_id = $2",
    )
    .bind(game_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(Into::into))
}

/// All entries for a game: confirmed party first, then the waitlist in
/// ascending position order.
pub async fn list_entries(
    executor: impl sqlx::PgExecutor<'_>,
    game_id: Uuid,
) -> Result<Vec<PlayerEntry>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PlayerRow>(
        r#"
        SELECT * FROM players
        WHERE game_id = $1
        ORDER BY standby, waitlist_pos, joined_at
        "#,
    )
    .bind(game_id)
    .fetch_all(executor)
    .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

/// Entries for future games held by a user — the reservations that consume
/// signup credit. Waitlist slots count too.
pub async fn count_future_reservations(
    pool: &sqlx::PgPool,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(
        r#"
        SELECT count(*) FROM players p
        JOIN games g ON g.id = p.game_id
        WHERE p.user_id = $1 AND g.start_at >= $2
        "#,
    )
    .bind(user_id)
    .bind(now)
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

/// Atomic check-and-insert: confirm the user only if the party still has a
/// free seat. Returns None when the game is full (or vanished), at which
/// point the caller falls back to the waitlist.
pub async fn insert_confirmed_if_capacity(
    conn: &mut PgConnection,
    id: Uuid,
    game_id: Uuid,
    user_id: Uuid,
) -> Result<Option<PlayerEntry>, sqlx::Error> {
    let row = sqlx::query_as::<_, PlayerRow>(
        r#"
        INSERT INTO players (id, game_id, user_id, standby, waitlist_pos)
        SELECT $1, $2, $3, false, 0
        WHERE (SELECT count(*) FROM players WHERE game_id = $2 AND standby = false)
            < (SELECT max_players FROM games WHERE id = $2)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(game_id)
    .bind(user_id)
    .fetch_optional(conn)
    .await?;
    Ok(row.map(Into::into))
}

/// Insert a confirmed entry unconditionally (DM/admin force-add).
pub async fn insert_confirmed_forced(
    conn: &mut PgConnection,
    id: Uuid,
    game_id: Uuid,
    user_id: Uuid,
) -> Result<PlayerEntry, sqlx::Error> {
    let row = sqlx::query_as::<_, PlayerRow>(
        r#"
        INSERT INTO players (id, game_id, user_id, standby, waitlist_pos)
        VALUES ($1, $2, $3, false, 0)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(game_id)
    .bind(user_id)
    .fetch_one(conn)
    .await?;
    Ok(row.into())
}

/// Append a user to the waitlist at the given (already claimed) position.
pub async fn insert_waitlisted(
    conn: &mut PgConnection,
    id: Uuid,
    game_id: Uuid,
    user_id: Uuid,
    position: i32,
) -> Result<PlayerEntry, sqlx::Error> {
    let row = sqlx::query_as::<_, PlayerRow>(
        r#"
        INSERT INTO players (id, game_id, user_id, standby, waitlist_pos)
        VALUES ($1, $2, $3, true, $4)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(game_id)
    .bind(user_id)
    .bind(position)
    .fetch_one(conn)
    .await?;
    Ok(row.into())
}

/// Flip a waitlisted entry to confirmed. One-way and idempotent: returns
/// false if the entry was already confirmed or is gone.
pub async fn promote_entry(conn: &mut PgConnection, entry_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE players SET standby = false, waitlist_pos = 0 WHERE id = $1 AND standby = true",
    )
    .bind(entry_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Flip a specific user's waitlisted entry to confirmed in place
/// (force-add of someone already queued — no duplicate row, no capacity
/// check).
pub async fn confirm_in_place(
    conn: &mut PgConnection,
    game_id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE players SET standby = false, waitlist_pos = 0
        WHERE game_id = $1 AND user_id = $2 AND standby = true
        "#,
    )
    .bind(game_id)
    .bind(user_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Delete the entry for (game, user). Returns whether a row was removed.
pub async fn delete_entry(
    pool: &sqlx::PgPool,
    game_id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM players WHERE game_id = $1 AND user_id = $2")
        .bind(game_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Remove every future-game entry for a user (hard-ban eviction). Returns
/// the affected game ids so membership reconciliation can catch up.
pub async fn evict_future(
    conn: &mut PgConnection,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Vec<Uuid>, sqlx::Error> {
    let rows: Vec<(Uuid,)> = sqlx::query_as(
        r#"
        DELETE FROM players p
        USING games g
        WHERE p.game_id = g.id AND p.user_id = $1 AND g.start_at >= $2
        RETURNING p.game_id
        "#,
    )
    .bind(user_id)
    .bind(now)
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().map(|r| r.0).collect())
}
