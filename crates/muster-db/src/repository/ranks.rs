//! Rank repository — admin-managed reference data.

use muster_common::models::user::Rank;
use uuid::Uuid;

/// List all ranks, highest priority first.
pub async fn list_ranks(pool: &sqlx::PgPool) -> Result<Vec<Rank>, sqlx::Error> {
    sqlx::query_as::<_, Rank>("SELECT * FROM ranks ORDER BY priority DESC")
        .fetch_all(pool)
        .await
}

/// Create a rank.
pub async fn create_rank(
    pool: &sqlx::PgPool,
    id: Uuid,
    name: &str,
    priority: i32,
    max_games: i32,
    patron: bool,
) -> Result<Rank, sqlx::Error> {
    sqlx::query_as::<_, Rank>(
        r#"
        INSERT INTO ranks (id, name, priority, max_games, patron)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(priority)
    .bind(max_games)
    .bind(patron)
    .fetch_one(pool)
    .await
}

/// Assign a rank to a user. Idempotent.
pub async fn assign_rank(
    pool: &sqlx::PgPool,
    user_id: Uuid,
    rank_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO user_ranks (user_id, rank_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(rank_id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Remove a rank from a user.
pub async fn revoke_rank(
    pool: &sqlx::PgPool,
    user_id: Uuid,
    rank_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM user_ranks WHERE user_id = $1 AND rank_id = $2")
        .bind(user_id)
        .bind(rank_id)
        .execute(pool)
        .await?;
    Ok(())
}
