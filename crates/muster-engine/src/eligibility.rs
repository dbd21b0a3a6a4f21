//! Eligibility evaluator — may this user sign up for this game?
//!
//! Pure decision logic over a snapshot loaded by [`can_join`]. Checks run
//! in a fixed order and the first failure wins. Read-only and safe to call
//! repeatedly; denials are results, not errors.

use chrono::{DateTime, Utc};
use muster_common::error::{MusterError, MusterResult};
use muster_common::models::game::Game;
use muster_common::models::player::Membership;
use muster_common::models::sanction::Ban;
use muster_db::{repository, Database};
use serde::Serialize;
use uuid::Uuid;

/// Outcome of an eligibility check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "decision")]
pub enum JoinDecision {
    Allowed,
    Denied { reason: DenyReason },
}

/// Why a signup was refused. Variants carry what the user-facing message
/// needs (e.g. when a ban lifts).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum DenyReason {
    /// The DM cannot join their own game
    OwnGame,
    /// Already holds a confirmed seat
    AlreadyConfirmed,
    /// Already queued on the waitlist
    AlreadyWaitlisted { position: i32 },
    /// Actively banned; `until` is None for permanent bans
    Banned { until: Option<DateTime<Utc>> },
    /// No signup credit left
    NoCredit,
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenyReason::OwnGame => write!(f, "You are the DM of this game"),
            DenyReason::AlreadyConfirmed => write!(f, "You already have a seat in this game"),
            DenyReason::AlreadyWaitlisted { position } => {
                write!(f, "You are already #{position} on the waitlist for this game")
            }
            DenyReason::Banned { until: Some(until) } => {
                write!(f, "You are banned until {}", until.format("%Y-%m-%d %H:%M UTC"))
            }
            DenyReason::Banned { until: None } => write!(f, "You are permanently banned"),
            DenyReason::NoCredit => write!(f, "You have no signup credit left"),
        }
    }
}

/// Evaluate the signup gates in order: own-game, duplicate entry, active
/// ban, credit. First failure wins.
pub fn evaluate(
    user_id: Uuid,
    game: &Game,
    existing: Option<&Membership>,
    active_ban: Option<&Ban>,
    available_credit: i64,
) -> JoinDecision {
    if game.dm_id == user_id {
        return JoinDecision::Denied {
            reason: DenyReason::OwnGame,
        };
    }

    if let Some(membership) = existing {
        let reason = match membership {
            Membership::Confirmed => DenyReason::AlreadyConfirmed,
            Membership::Waitlisted { position } => DenyReason::AlreadyWaitlisted {
                position: *position,
            },
        };
        return JoinDecision::Denied { reason };
    }

    if let Some(ban) = active_ban {
        return JoinDecision::Denied {
            reason: DenyReason::Banned { until: ban.ends_at },
        };
    }

    if available_credit <= 0 {
        return JoinDecision::Denied {
            reason: DenyReason::NoCredit,
        };
    }

    JoinDecision::Allowed
}

/// Load the snapshot for (user, game) and evaluate. No side effects.
pub async fn can_join(db: &Database, user_id: Uuid, game_id: Uuid) -> MusterResult<JoinDecision> {
    let now = Utc::now();

    let game = repository::games::find_game(&db.pool, game_id)
        .await?
        .ok_or_else(|| MusterError::NotFound {
            resource: "Game".into(),
        })?;

    let existing = repository::players::find_entry(&db.pool, game_id, user_id).await?;

    let bans = repository::bans::list_active(&db.pool, user_id, now).await?;
    let active_ban = crate::sanctions::active_ban(&bans, now);

    let ranks = repository::users::list_ranks(&db.pool, user_id).await?;
    let bonuses = repository::credits::list_for_user(&db.pool, user_id).await?;
    let pending = repository::players::count_future_reservations(&db.pool, user_id, now).await?;
    let available =
        crate::credit::available_credit(crate::credit::max_credit(&ranks, &bonuses, now), pending);

    Ok(evaluate(
        user_id,
        &game,
        existing.as_ref().map(|e| &e.membership),
        active_ban,
        available,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use muster_common::models::game::GameStatus;
    use muster_common::models::sanction::BanKind;
    use muster_common::snowflake::generate_id;

    fn game(dm_id: Uuid) -> Game {
        let now = Utc::now();
        Game {
            id: generate_id(),
            dm_id,
            name: "Sunless Citadel".into(),
            module: None,
            description: None,
            max_players: 4,
            start_at: now + Duration::days(7),
            release_priority_at: None,
            release_open_at: Some(now - Duration::days(1)),
            ready: true,
            status: GameStatus::Released,
            waitlist_seq: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn ban(ends_at: Option<DateTime<Utc>>) -> Ban {
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
    fn dm_cannot_join_own_game() {
        let dm = generate_id();
        let g = game(dm);
        assert_eq!(
            evaluate(dm, &g, None, None, 5),
            JoinDecision::Denied {
                reason: DenyReason::OwnGame
            }
        );
    }

    #[test]
    fn duplicate_signup_is_denied_with_specific_state() {
        let user = generate_id();
        let g = game(generate_id());
        assert_eq!(
            evaluate(user, &g, Some(&Membership::Confirmed), None, 5),
            JoinDecision::Denied {
                reason: DenyReason::AlreadyConfirmed
            }
        );
        assert_eq!(
            evaluate(user, &g, Some(&Membership::Waitlisted { position: 3 }), None, 5),
            JoinDecision::Denied {
                reason: DenyReason::AlreadyWaitlisted { position: 3 }
            }
        );
    }

    #[test]
    fn active_ban_denies_and_carries_expiry() {
        let user = generate_id();
        let g = game(generate_id());
        let until = Utc::now() + Duration::weeks(2);
        let b = ban(Some(until));
        assert_eq!(
            evaluate(user, &g, None, Some(&b), 5),
            JoinDecision::Denied {
                reason: DenyReason::Banned { until: Some(until) }
            }
        );
    }

    #[test]
    fn exhausted_credit_denies() {
        let user = generate_id();
        let g = game(generate_id());
        assert_eq!(
            evaluate(user, &g, None, None, 0),
            JoinDecision::Denied {
                reason: DenyReason::NoCredit
            }
        );
        assert_eq!(evaluate(user, &g, None, None, 1), JoinDecision::Allowed);
    }

    #[test]
    fn check_order_puts_duplicate_before_ban() {
        // a banned user who is already waitlisted hears "already registered",
        // not "banned" — duplicate check runs first
        let user = generate_id();
        let g = game(generate_id());
        let b = ban(None);
        assert_eq!(
            evaluate(user, &g, Some(&Membership::Waitlisted { position: 1 }), Some(&b), 0),
            JoinDecision::Denied {
                reason: DenyReason::AlreadyWaitlisted { position: 1 }
            }
        );
    }
}
