//! Credit ledger — signup capacity from ranks plus bonus grants, minus
//! pending reservations.
//!
//! Both reads are pure over data loaded at call time; there is no cached
//! balance to invalidate. A waitlist slot reserves capacity exactly like a
//! confirmed seat.

use chrono::{DateTime, Utc};
use muster_common::error::MusterResult;
use muster_common::models::user::{BonusCredit, Rank};
use muster_db::{repository, Database};
use serde::Serialize;
use uuid::Uuid;

/// Maximum signup capacity: `max_games` of the highest-priority held rank
/// plus all unexpired bonus grants. No ranks means a base of zero.
pub fn max_credit(ranks: &[Rank], bonuses: &[BonusCredit], now: DateTime<Utc>) -> i64 {
    let base = ranks
        .iter()
        .max_by_key(|r| r.priority)
        .map(|r| r.max_games as i64)
        .unwrap_or(0);
    let bonus: i64 = bonuses
        .iter()
        .filter(|b| b.is_active(now))
        .map(|b| b.credits as i64)
        .sum();
    base + bonus
}

/// Capacity remaining after pending reservations. Can go negative when a
/// rank is revoked or a grant expires under existing reservations; the
/// eligibility gate checks `<= 0`, presentation clamps at zero.
pub fn available_credit(max: i64, pending_reservations: i64) -> i64 {
    max - pending_reservations
}

/// A user's credit position, as exposed to the API.
#[derive(Debug, Clone, Serialize)]
pub struct CreditSummary {
    pub max: i64,
    pub available: i64,
    pub pending: i64,
}

/// Load and compute a user's credit position.
pub async fn summary(db: &Database, user_id: Uuid) -> MusterResult<CreditSummary> {
    let now = Utc::now();
    let ranks = repository::users::list_ranks(&db.pool, user_id).await?;
    let bonuses = repository::credits::list_for_user(&db.pool, user_id).await?;
    let pending =
        repository::players::count_future_reservations(&db.pool, user_id, now).await?;

    let max = max_credit(&ranks, &bonuses, now);
    Ok(CreditSummary {
        max,
        available: available_credit(max, pending).max(0),
        pending,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use muster_common::snowflake::generate_id;

    fn rank(priority: i32, max_games: i32) -> Rank {
        Rank {
            id: generate_id(),
            name: format!("rank-{priority}"),
            priority,
            max_games,
            patron: false,
        }
    }

    fn bonus(credits: i32, expires_at: Option<DateTime<Utc>>) -> BonusCredit {
        BonusCredit {
            id: generate_id(),
            user_id: generate_id(),
            credits,
            reason: None,
            expires_at,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn highest_priority_rank_wins() {
        let now = Utc::now();
        // the priority-5 rank grants fewer games and still wins
        let ranks = vec![rank(1, 4), rank(5, 2), rank(3, 9)];
        assert_eq!(max_credit(&ranks, &[], now), 2);
    }

    #[test]
    fn no_ranks_means_zero_base() {
        let now = Utc::now();
        assert_eq!(max_credit(&[], &[], now), 0);
        assert_eq!(max_credit(&[], &[bonus(3, None)], now), 3);
    }

    #[test]
    fn expired_bonuses_do_not_count() {
        let now = Utc::now();
        let bonuses = vec![
            bonus(2, None),
            bonus(5, Some(now - Duration::days(1))),
            bonus(1, Some(now + Duration::days(1))),
        ];
        assert_eq!(max_credit(&[rank(1, 1)], &bonuses, now), 4);
    }

    #[test]
    fn reservations_consume_capacity_one_for_one() {
        assert_eq!(available_credit(3, 0), 3);
        assert_eq!(available_credit(3, 2), 1);
        assert_eq!(available_credit(3, 3), 0);
        // rank revoked under existing reservations
        assert_eq!(available_credit(1, 2), -1);
    }
}
