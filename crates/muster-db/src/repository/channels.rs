//! Game channel repository — the persisted view-state for channel
//! lifecycle. Everything the controller knows about a channel is rebuilt
//! from these rows on restart.

use muster_common::models::channel::{ChannelPhase, GameChannel};
use uuid::Uuid;

/// Record a freshly created channel in `ready` phase. The unique game_id
/// constraint enforces the one-to-one binding.
pub async fn insert_channel(
    pool: &sqlx::PgPool,
    id: Uuid,
    game_id: Uuid,
    channel_id: &str,
) -> Result<GameChannel, sqlx::Error> {
    sqlx::query_as::<_, GameChannel>(
        r#"
        INSERT INTO game_channels (id, game_id, channel_id, phase)
        VALUES ($1, $2, $3, 'ready')
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(game_id)
    .bind(channel_id)
    .fetch_one(pool)
    .await
}

/// Find the channel binding for a game.
pub async fn find_by_game(
    pool: &sqlx::PgPool,
    game_id: Uuid,
) -> Result<Option<GameChannel>, sqlx::Error> {
    sqlx::query_as::<_, GameChannel>("SELECT * FROM game_channels WHERE game_id = $1")
        .bind(game_id)
        .fetch_optional(pool)
        .await
}

/// All channel bindings (startup recovery / destruction sweep).
pub async fn list_all(pool: &sqlx::PgPool) -> Result<Vec<GameChannel>, sqlx::Error> {
    sqlx::query_as::<_, GameChannel>("SELECT * FROM game_channels ORDER BY created_at")
        .fetch_all(pool)
        .await
}

/// Advance a channel's phase, guarded on the expected current phase so a
/// reminder/warning/summary fires at most once under concurrent ticks.
pub async fn advance_phase(
    pool: &sqlx::PgPool,
    game_id: Uuid,
    from: ChannelPhase,
    to: ChannelPhase,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE game_channels SET phase = $1, updated_at = now()
        WHERE game_id = $2 AND phase = $3
        "#,
    )
    .bind(to)
    .bind(game_id)
    .bind(from)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Drop the binding (channel destroyed, or found missing externally).
pub async fn delete_channel(pool: &sqlx::PgPool, game_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM game_channels WHERE game_id = $1")
        .bind(game_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
