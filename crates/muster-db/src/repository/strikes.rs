//! Strike repository.

use chrono::{DateTime, Utc};
use muster_common::models::sanction::Strike;
use sqlx::PgConnection;
use uuid::Uuid;

/// Insert a strike inside the caller's transaction (escalation checks run
/// in the same transaction).
pub async fn insert_strike(
    conn: &mut PgConnection,
    id: Uuid,
    user_id: Uuid,
    issued_by: Uuid,
    reason: &str,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> Result<Strike, sqlx::Error> {
    sqlx::query_as::<_, Strike>(
        r#"
        INSERT INTO strikes (id, user_id, issued_by, reason, issued_at, expires_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(issued_by)
    .bind(reason)
    .bind(issued_at)
    .bind(expires_at)
    .fetch_one(conn)
    .await
}

/// Count strikes still unexpired at `now`.
pub async fn count_unexpired(
    conn: &mut PgConnection,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    let row: (i64,) =
        sqlx::query_as("SELECT count(*) FROM strikes WHERE user_id = $1 AND expires_at > $2")
            .bind(user_id)
            .bind(now)
            .fetch_one(conn)
            .await?;
    Ok(row.0)
}

/// Expire every outstanding strike for a user (escalation clears the slate).
/// Returns how many strikes were cleared.
pub async fn expire_all(
    conn: &mut PgConnection,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("UPDATE strikes SET expires_at = $2 WHERE user_id = $1 AND expires_at > $2")
            .bind(user_id)
            .bind(now)
            .execute(conn)
            .await?;
    Ok(result.rows_affected())
}

/// Strike history for a user, newest first.
pub async fn list_for_user(pool: &sqlx::PgPool, user_id: Uuid) -> Result<Vec<Strike>, sqlx::Error> {
    sqlx::query_as::<_, Strike>("SELECT * FROM strikes WHERE user_id = $1 ORDER BY issued_at DESC")
        .bind(user_id)
        .fetch_all(pool)
        .await
}
