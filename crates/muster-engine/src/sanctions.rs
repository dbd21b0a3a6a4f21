//! Sanctions registry — bans, strikes, and strike escalation.
//!
//! Hard and permanent bans evict the user from every future game in the
//! same transaction as the ban insert. The third concurrently unexpired
//! strike escalates into a twelve-week soft ban and clears the slate.

use chrono::{DateTime, Duration, Utc};
use muster_common::error::{MusterError, MusterResult};
use muster_common::models::sanction::{Ban, BanKind};
use muster_common::snowflake::generate_id;
use muster_db::{repository, Database};
use muster_platform::ChatPlatform;
use serde::Serialize;
use uuid::Uuid;

/// Unexpired strikes at which escalation fires.
pub const STRIKE_LIMIT: i64 = 3;
/// Default strike lifetime.
pub const STRIKE_TTL_DAYS: i64 = 365;
/// Length of the soft ban issued on escalation.
pub const ESCALATION_BAN_WEEKS: i64 = 12;

/// Pick the ban to surface for a user from their active set: the one
/// lifting soonest first, permanent bans last. The slice is expected
/// pre-filtered to active bans.
pub fn active_ban(bans: &[Ban], now: DateTime<Utc>) -> Option<&Ban> {
    bans.iter()
        .filter(|b| b.is_active(now))
        .min_by_key(|b| match b.ends_at {
            Some(end) => (0, end),
            None => (1, DateTime::<Utc>::MAX_UTC),
        })
}

/// Resolve a requested kind and duration into the term to store.
/// `duration_days == -1` forces a permanent ban; any other value must be
/// a positive day count. A zero or negative span would store a ban that
/// is already over while its eviction side effects still fire.
pub fn ban_term(
    kind: BanKind,
    duration_days: i64,
    now: DateTime<Utc>,
) -> MusterResult<(BanKind, Option<DateTime<Utc>>)> {
    match duration_days {
        -1 => Ok((BanKind::Permanent, None)),
        d if d >= 1 => Ok((kind, Some(now + Duration::days(d)))),
        _ => Err(MusterError::Validation {
            message: "duration_days must be -1 (permanent) or a positive day count".into(),
        }),
    }
}

/// Result of issuing a ban: the record plus the games the user was evicted
/// from (empty for soft bans). Membership reconciliation catches up with
/// the evictions on its next pass.
#[derive(Debug, Clone, Serialize)]
pub struct BanIssued {
    pub ban: Ban,
    pub evicted_games: Vec<Uuid>,
}

/// Issue a ban. `duration_days == -1` forces a permanent ban; hard and
/// permanent bans atomically remove every future reservation the user
/// holds. The sanctioned user is DM-notified best-effort after commit.
pub async fn issue_ban(
    db: &Database,
    platform: &dyn ChatPlatform,
    user_id: Uuid,
    issued_by: Uuid,
    reason: &str,
    kind: BanKind,
    duration_days: i64,
) -> MusterResult<BanIssued> {
    let now = Utc::now();
    let (kind, ends_at) = ban_term(kind, duration_days, now)?;

    let mut tx = db.pool.begin().await?;
    let ban = repository::bans::insert_ban(
        &mut *tx,
        generate_id(),
        user_id,
        issued_by,
        reason,
        kind,
        now,
        ends_at,
    )
    .await?;

    let evicted_games = if kind.evicts() {
        repository::players::evict_future(&mut *tx, user_id, now).await?
    } else {
        Vec::new()
    };
    tx.commit().await?;

    tracing::info!(
        user_id = %user_id,
        kind = ?kind,
        evicted = evicted_games.len(),
        "Ban issued"
    );

    notify_banned(db, platform, user_id, &ban, !evicted_games.is_empty()).await;

    Ok(BanIssued { ban, evicted_games })
}

/// Outcome of recording a strike.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum StrikeOutcome {
    /// Strike recorded; `active` strikes currently outstanding.
    Recorded { active: i64 },
    /// This strike tripped the limit: a soft ban was issued and all
    /// outstanding strikes were cleared.
    Escalated { ban: Ban },
}

/// What to do once a strike has landed, from the unexpired count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrikeDecision {
    /// Below the limit: keep the strike and report the outstanding count.
    Record { active: i64 },
    /// Limit reached: expire every outstanding strike and issue a soft
    /// ban running until `ban_ends`.
    Escalate { ban_ends: DateTime<Utc> },
}

/// The escalation rule. Only the strike that brings the unexpired count
/// to [`STRIKE_LIMIT`] escalates; because escalation clears the slate,
/// the count restarts from zero afterwards.
pub fn strike_decision(unexpired: i64, now: DateTime<Utc>) -> StrikeDecision {
    if unexpired < STRIKE_LIMIT {
        StrikeDecision::Record { active: unexpired }
    } else {
        StrikeDecision::Escalate {
            ban_ends: now + Duration::weeks(ESCALATION_BAN_WEEKS),
        }
    }
}

/// Record a strike with the default one-year expiry, escalating to a soft
/// ban when it is the third concurrently unexpired one.
pub async fn issue_strike(
    db: &Database,
    user_id: Uuid,
    issued_by: Uuid,
    reason: &str,
) -> MusterResult<StrikeOutcome> {
    let now = Utc::now();

    let mut tx = db.pool.begin().await?;
    repository::strikes::insert_strike(
        &mut *tx,
        generate_id(),
        user_id,
        issued_by,
        reason,
        now,
        now + Duration::days(STRIKE_TTL_DAYS),
    )
    .await?;

    let active = repository::strikes::count_unexpired(&mut *tx, user_id, now).await?;
    let ban_ends = match strike_decision(active, now) {
        StrikeDecision::Record { active } => {
            tx.commit().await?;
            return Ok(StrikeOutcome::Recorded { active });
        }
        StrikeDecision::Escalate { ban_ends } => ban_ends,
    };

    // Escalation: clear the slate and issue the ban in the same transaction.
    let cleared = repository::strikes::expire_all(&mut *tx, user_id, now).await?;
    let ban = repository::bans::insert_ban(
        &mut *tx,
        generate_id(),
        user_id,
        issued_by,
        "Accumulated strikes",
        BanKind::Soft,
        now,
        Some(ban_ends),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(user_id = %user_id, cleared, "Strikes escalated into soft ban");
    Ok(StrikeOutcome::Escalated { ban })
}

/// The ban (if any) to surface for a user right now.
pub async fn current_ban(db: &Database, user_id: Uuid) -> MusterResult<Option<Ban>> {
    let now = Utc::now();
    let bans = repository::bans::list_active(&db.pool, user_id, now).await?;
    Ok(active_ban(&bans, now).cloned())
}

/// Best-effort DM to the sanctioned user. Failures are logged, never
/// propagated — the ban is already committed.
async fn notify_banned(
    db: &Database,
    platform: &dyn ChatPlatform,
    user_id: Uuid,
    ban: &Ban,
    evicted: bool,
) {
    let user = match repository::users::find_user(&db.pool, user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return,
        Err(e) => {
            tracing::warn!(user_id = %user_id, "Failed to load user for ban notice: {e}");
            return;
        }
    };

    let mut content = match ban.ends_at {
        Some(end) => format!(
            "You have been banned from game signups until {}. Reason: {}",
            end.format("%Y-%m-%d %H:%M UTC"),
            ban.reason
        ),
        None => format!(
            "You have been permanently banned from game signups. Reason: {}",
            ban.reason
        ),
    };
    if evicted {
        content.push_str(" You have been removed from your upcoming games.");
    }

    if let Err(e) = platform.send_dm(&user.platform_id, &content).await {
        tracing::warn!(user_id = %user_id, "Failed to DM ban notice: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ban_ending(ends_at: Option<DateTime<Utc>>) -> Ban {
        let now = Utc::now();
        Ban {
            id: generate_id(),
            user_id: generate_id(),
            issued_by: generate_id(),
            reason: "test".into(),
            kind: BanKind::Soft,
            starts_at: now - Duration::days(1),
            ends_at,
            created_at: now,
        }
    }

    #[test]
    fn soonest_expiry_is_surfaced_first() {
        let now = Utc::now();
        let near = ban_ending(Some(now + Duration::days(2)));
        let far = ban_ending(Some(now + Duration::days(30)));
        let bans = [far.clone(), near.clone()];
        let picked = active_ban(&bans, now).unwrap();
        assert_eq!(picked.id, near.id);
    }

    #[test]
    fn permanent_bans_sort_last() {
        let now = Utc::now();
        let perm = ban_ending(None);
        let timed = ban_ending(Some(now + Duration::days(90)));
        let bans = [perm.clone(), timed.clone()];
        let picked = active_ban(&bans, now).unwrap();
        assert_eq!(picked.id, timed.id);

        // but a lone permanent ban is still reported
        let bans = [perm.clone()];
        let picked = active_ban(&bans, now).unwrap();
        assert_eq!(picked.id, perm.id);
    }

    #[test]
    fn minus_one_duration_means_permanent() {
        let now = Utc::now();
        let (kind, ends_at) = ban_term(BanKind::Hard, -1, now).unwrap();
        assert_eq!(kind, BanKind::Permanent);
        assert!(ends_at.is_none());
    }

    #[test]
    fn timed_ban_keeps_kind_and_requested_length() {
        let now = Utc::now();
        let (kind, ends_at) = ban_term(BanKind::Soft, 7, now).unwrap();
        assert_eq!(kind, BanKind::Soft);
        assert_eq!(ends_at, Some(now + Duration::days(7)));
    }

    #[test]
    fn zero_and_negative_durations_are_rejected() {
        let now = Utc::now();
        for days in [0, -7] {
            let err = ban_term(BanKind::Hard, days, now).unwrap_err();
            assert!(matches!(err, MusterError::Validation { .. }), "{days}: {err:?}");
        }
    }

    #[test]
    fn strikes_below_the_limit_only_record() {
        let now = Utc::now();
        assert_eq!(
            strike_decision(1, now),
            StrikeDecision::Record { active: 1 }
        );
        assert_eq!(
            strike_decision(STRIKE_LIMIT - 1, now),
            StrikeDecision::Record { active: STRIKE_LIMIT - 1 }
        );
    }

    #[test]
    fn third_strike_escalates_into_twelve_week_ban() {
        let now = Utc::now();
        assert_eq!(
            strike_decision(STRIKE_LIMIT, now),
            StrikeDecision::Escalate {
                ban_ends: now + Duration::weeks(ESCALATION_BAN_WEEKS)
            }
        );
    }

    #[test]
    fn expired_and_future_bans_are_ignored() {
        let now = Utc::now();
        let expired = ban_ending(Some(now - Duration::hours(1)));
        let mut future = ban_ending(Some(now + Duration::days(10)));
        future.starts_at = now + Duration::days(1);
        assert!(active_ban(&[expired, future], now).is_none());
    }
}
