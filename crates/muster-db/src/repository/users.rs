//! User repository — identity records keyed by chat-platform id.

use muster_common::models::user::{Rank, User, UserIdentity};
use uuid::Uuid;

/// Find a user by internal id.
pub async fn find_user(pool: &sqlx::PgPool, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Create or refresh a user record. Idempotent on platform_id.
pub async fn upsert_user(
    pool: &sqlx::PgPool,
    id: Uuid,
    platform_id: &str,
    display_name: &str,
    avatar: Option<&str>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, platform_id, display_name, avatar)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (platform_id)
        DO UPDATE SET display_name = $3, avatar = $4, updated_at = now()
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(platform_id)
    .bind(display_name)
    .bind(avatar)
    .fetch_one(pool)
    .await
}

/// Ranks held by a user.
pub async fn list_ranks(pool: &sqlx::PgPool, user_id: Uuid) -> Result<Vec<Rank>, sqlx::Error> {
    sqlx::query_as::<_, Rank>(
        r#"
        SELECT r.* FROM ranks r
        JOIN user_ranks ur ON ur.rank_id = r.id
        WHERE ur.user_id = $1
        ORDER BY r.priority DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Resolve a user's full identity (user row + held ranks) in one step.
pub async fn load_identity(
    pool: &sqlx::PgPool,
    user_id: Uuid,
) -> Result<Option<UserIdentity>, sqlx::Error> {
    let Some(user) = find_user(pool, user_id).await? else {
        return Ok(None);
    };
    let ranks = list_ranks(pool, user_id).await?;
    Ok(Some(UserIdentity::new(user, ranks)))
}
