//! Ban repository.

use chrono::{DateTime, Utc};
use muster_common::models::sanction::{Ban, BanKind};
use sqlx::PgConnection;
use uuid::Uuid;

/// Insert a ban record inside the caller's transaction (eviction for
/// hard/permanent bans happens in the same transaction).
#[allow(clippy::too_many_arguments)]
pub async fn insert_ban(
    conn: &mut PgConnection,
    id: Uuid,
    user_id: Uuid,
    issued_by: Uuid,
    reason: &str,
    kind: BanKind,
    starts_at: DateTime<Utc>,
    ends_at: Option<DateTime<Utc>>,
) -> Result<Ban, sqlx::Error> {
    sqlx::query_as::<_, Ban>(
        r#"
        INSERT INTO bans (id, user_id, issued_by, reason, kind, starts_at, ends_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(issued_by)
    .bind(reason)
    .bind(kind)
    .bind(starts_at)
    .bind(ends_at)
    .fetch_one(conn)
    .await
}

/// Bans active for a user at `now`, soonest expiry first with permanent
/// bans last — the first row is the one surfaced to the user.
pub async fn list_active(
    pool: &sqlx::PgPool,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Vec<Ban>, sqlx::Error> {
    sqlx::query_as::<_, Ban>(
        r#"
        SELECT * FROM bans
        WHERE user_id = $1 AND starts_at <= $2 AND (ends_at IS NULL OR ends_at >= $2)
        ORDER BY ends_at ASC NULLS LAST
        "#,
    )
    .bind(user_id)
    .bind(now)
    .fetch_all(pool)
    .await
}

/// Full ban history for a user, newest first.
pub async fn list_for_user(pool: &sqlx::PgPool, user_id: Uuid) -> Result<Vec<Ban>, sqlx::Error> {
    sqlx::query_as::<_, Ban>("SELECT * FROM bans WHERE user_id = $1 ORDER BY created_at DESC")
        .bind(user_id)
        .fetch_all(pool)
        .await
}
