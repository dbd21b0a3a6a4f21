//! Bonus credit repository.

use chrono::{DateTime, Utc};
use muster_common::models::user::BonusCredit;
use uuid::Uuid;

/// Grant bonus credits to a user.
pub async fn grant(
    pool: &sqlx::PgPool,
    id: Uuid,
    user_id: Uuid,
    credits: i32,
    reason: Option<&str>,
    expires_at: Option<DateTime<Utc>>,
) -> Result<BonusCredit, sqlx::Error> {
    sqlx::query_as::<_, BonusCredit>(
        r#"
        INSERT INTO bonus_credits (id, user_id, credits, reason, expires_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(credits)
    .bind(reason)
    .bind(expires_at)
    .fetch_one(pool)
    .await
}

/// All bonus grants for a user (active and expired — the ledger filters).
pub async fn list_for_user(
    pool: &sqlx::PgPool,
    user_id: Uuid,
) -> Result<Vec<BonusCredit>, sqlx::Error> {
    sqlx::query_as::<_, BonusCredit>(
        "SELECT * FROM bonus_credits WHERE user_id = $1 ORDER BY created_at",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}
