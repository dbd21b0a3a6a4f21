//! Game roster — the seat/waitlist structure for one game.
//!
//! The confirmed party is an unordered set bounded by `max_players`; the
//! waitlist is strictly ordered by the positions handed out by the game's
//! sequence counter. Promotion always takes the lowest positions first and
//! never skips, reorders, or double-promotes.
//!
//! All mutations run inside a transaction holding the game row lock
//! ([`repository::games::lock_game`]), which serializes signups,
//! force-adds, and promotions per game. Removal never promotes
//! synchronously — [`reconcile`] is the only promotion path.

use muster_common::error::{MusterError, MusterResult};
use muster_common::models::game::Game;
use muster_common::models::player::{Membership, PlayerEntry};
use muster_common::snowflake::generate_id;
use muster_db::{repository, Database};
use serde::Serialize;
use uuid::Uuid;

use crate::eligibility::{self, DenyReason, JoinDecision};

/// In-memory snapshot of a game's roster.
#[derive(Debug, Clone)]
pub struct Roster {
    pub game: Game,
    pub confirmed: Vec<PlayerEntry>,
    /// Ascending waitlist position order
    pub waitlist: Vec<PlayerEntry>,
}

impl Roster {
    /// Partition raw entries into party and ordered waitlist.
    pub fn new(game: Game, entries: Vec<PlayerEntry>) -> Self {
        let (waitlist, confirmed): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .partition(|e| !e.membership.is_confirmed());
        let mut waitlist = waitlist;
        waitlist.sort_by_key(|e| e.membership.waitlist_position().unwrap_or(0));
        Self {
            game,
            confirmed,
            waitlist,
        }
    }

    pub fn is_full(&self) -> bool {
        self.free_seats() == 0
    }

    /// Seats still open in the confirmed party.
    pub fn free_seats(&self) -> usize {
        (self.game.max_players as usize).saturating_sub(self.confirmed.len())
    }

    /// 1-based rank of a user within the waitlist ordering.
    pub fn position(&self, user_id: Uuid) -> Option<usize> {
        self.waitlist
            .iter()
            .position(|e| e.user_id == user_id)
            .map(|i| i + 1)
    }

    /// The entries the promotion pass would flip, in promotion order:
    /// lowest waitlist positions first, capped at the free seat count.
    pub fn promotion_plan(&self) -> Vec<&PlayerEntry> {
        self.waitlist.iter().take(self.free_seats()).collect()
    }
}

/// Load a game's roster snapshot.
pub async fn load(db: &Database, game_id: Uuid) -> MusterResult<Roster> {
    let game = repository::games::find_game(&db.pool, game_id)
        .await?
        .ok_or_else(|| MusterError::NotFound {
            resource: "Game".into(),
        })?;
    let entries = repository::players::list_entries(&db.pool, game_id).await?;
    Ok(Roster::new(game, entries))
}

/// Outcome of a signup attempt, surfaced verbatim to the user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum SignupOutcome {
    /// Got a guaranteed seat
    Confirmed,
    /// Party was full; queued at this 1-based waitlist position rank
    Waitlisted { position: usize },
    /// Refused by the eligibility gates
    Denied { reason: DenyReason, message: String },
}

/// Sign a user up: eligibility gates, then an atomic confirmed insert with
/// waitlist fallback. A capacity race loser is routed to the waitlist, not
/// failed.
pub async fn signup(db: &Database, user_id: Uuid, game_id: Uuid) -> MusterResult<SignupOutcome> {
    if let JoinDecision::Denied { reason } = eligibility::can_join(db, user_id, game_id).await? {
        let message = reason.to_string();
        return Ok(SignupOutcome::Denied { reason, message });
    }

    let mut tx = db.pool.begin().await?;
    repository::games::lock_game(&mut *tx, game_id)
        .await?
        .ok_or_else(|| MusterError::NotFound {
            resource: "Game".into(),
        })?;

    let inserted = repository::players::insert_confirmed_if_capacity(
        &mut *tx,
        generate_id(),
        game_id,
        user_id,
    )
    .await;

    match inserted {
        Ok(Some(_)) => {
            tx.commit().await?;
            tracing::debug!(user_id = %user_id, game_id = %game_id, "Signup confirmed");
            Ok(SignupOutcome::Confirmed)
        }
        Ok(None) => {
            // Party full — claim the next position and queue.
            let position = repository::games::next_waitlist_seq(&mut *tx, game_id).await?;
            repository::players::insert_waitlisted(
                &mut *tx,
                generate_id(),
                game_id,
                user_id,
                position,
            )
            .await?;
            tx.commit().await?;
            tracing::debug!(user_id = %user_id, game_id = %game_id, position, "Signup waitlisted");
            let roster = load(db, game_id).await?;
            Ok(SignupOutcome::Waitlisted {
                position: roster.position(user_id).unwrap_or(roster.waitlist.len()),
            })
        }
        Err(e) if is_unique_violation(&e) => {
            // Raced against our own duplicate — report the existing state.
            drop(tx);
            let existing = repository::players::find_entry(&db.pool, game_id, user_id).await?;
            let reason = match existing.map(|e| e.membership) {
                Some(Membership::Waitlisted { position }) => {
                    DenyReason::AlreadyWaitlisted { position }
                }
                _ => DenyReason::AlreadyConfirmed,
            };
            let message = reason.to_string();
            Ok(SignupOutcome::Denied { reason, message })
        }
        Err(e) => Err(e.into()),
    }
}

/// DM/admin override: confirm a user unconditionally. A user already on
/// the waitlist is flipped in place (no duplicate row, no capacity check).
pub async fn force_add(db: &Database, user_id: Uuid, game_id: Uuid) -> MusterResult<PlayerEntry> {
    let mut tx = db.pool.begin().await?;
    repository::games::lock_game(&mut *tx, game_id)
        .await?
        .ok_or_else(|| MusterError::NotFound {
            resource: "Game".into(),
        })?;

    if !repository::players::confirm_in_place(&mut *tx, game_id, user_id).await? {
        match repository::players::insert_confirmed_forced(&mut *tx, generate_id(), game_id, user_id)
            .await
        {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                // Already confirmed — force-add is idempotent.
            }
            Err(e) => return Err(e.into()),
        }
    }
    tx.commit().await?;

    repository::players::find_entry(&db.pool, game_id, user_id)
        .await?
        .ok_or_else(|| MusterError::NotFound {
            resource: "Player".into(),
        })
}

/// Remove a user's entry. Returns whether a row was removed. Never
/// promotes — the next reconciliation pass fills the seat.
pub async fn drop_out(db: &Database, user_id: Uuid, game_id: Uuid) -> MusterResult<bool> {
    let removed = repository::players::delete_entry(&db.pool, game_id, user_id).await?;
    if removed {
        tracing::debug!(user_id = %user_id, game_id = %game_id, "Player removed from roster");
    }
    Ok(removed)
}

/// Promote from the waitlist until the party is full or the waitlist is
/// empty, in ascending position order. Returns the newly promoted entries
/// so callers can notify them. Idempotent: a second pass with no
/// intervening change promotes nobody.
pub async fn reconcile(db: &Database, game_id: Uuid) -> MusterResult<Vec<PlayerEntry>> {
    let mut tx = db.pool.begin().await?;
    let game = repository::games::lock_game(&mut *tx, game_id)
        .await?
        .ok_or_else(|| MusterError::NotFound {
            resource: "Game".into(),
        })?;

    let entries = repository::players::list_entries(&mut *tx, game_id).await?;
    let roster = Roster::new(game, entries);

    let mut promoted = Vec::new();
    for entry in roster.promotion_plan() {
        // One-way flip; a false here means someone else already promoted
        // the entry, which the plan under the game lock rules out.
        if repository::players::promote_entry(&mut *tx, entry.id).await? {
            let mut e = entry.clone();
            e.membership = Membership::Confirmed;
            promoted.push(e);
        }
    }
    tx.commit().await?;

    if !promoted.is_empty() {
        tracing::info!(game_id = %game_id, count = promoted.len(), "Promoted from waitlist");
    }
    Ok(promoted)
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use muster_common::models::game::GameStatus;

    fn game(max_players: i32) -> Game {
        let now = Utc::now();
        Game {
            id: generate_id(),
            dm_id: generate_id(),
            name: "Lost Mine".into(),
            module: None,
            description: None,
            max_players,
            start_at: now + Duration::days(3),
            release_priority_at: None,
            release_open_at: Some(now - Duration::days(1)),
            ready: true,
            status: GameStatus::Released,
            waitlist_seq: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn entry(game_id: Uuid, membership: Membership) -> PlayerEntry {
        PlayerEntry {
            id: generate_id(),
            game_id,
            user_id: generate_id(),
            membership,
            character: None,
            joined_at: Utc::now(),
        }
    }

    #[test]
    fn waitlist_sorts_by_position_regardless_of_input_order() {
        let g = game(2);
        let entries = vec![
            entry(g.id, Membership::Waitlisted { position: 7 }),
            entry(g.id, Membership::Confirmed),
            entry(g.id, Membership::Waitlisted { position: 2 }),
            entry(g.id, Membership::Waitlisted { position: 4 }),
        ];
        let roster = Roster::new(g, entries);
        let positions: Vec<i32> = roster
            .waitlist
            .iter()
            .filter_map(|e| e.membership.waitlist_position())
            .collect();
        assert_eq!(positions, vec![2, 4, 7]);
        assert_eq!(roster.confirmed.len(), 1);
    }

    #[test]
    fn promotion_plan_fills_free_seats_in_order() {
        let g = game(3);
        let qa = entry(g.id, Membership::Waitlisted { position: 5 });
        let qb = entry(g.id, Membership::Waitlisted { position: 9 });
        let qc = entry(g.id, Membership::Waitlisted { position: 12 });
        let roster = Roster::new(
            g,
            vec![entry_confirmed(), qc.clone(), qa.clone(), qb.clone()],
        );

        // two free seats: the two lowest positions, in ascending order
        let plan = roster.promotion_plan();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].id, qa.id);
        assert_eq!(plan[1].id, qb.id);
    }

    fn entry_confirmed() -> PlayerEntry {
        entry(generate_id(), Membership::Confirmed)
    }

    #[test]
    fn promotion_plan_is_empty_when_full() {
        let g = game(1);
        let roster = Roster::new(
            g,
            vec![
                entry_confirmed(),
                entry(generate_id(), Membership::Waitlisted { position: 1 }),
            ],
        );
        assert!(roster.is_full());
        assert!(roster.promotion_plan().is_empty());
    }

    #[test]
    fn promotion_plan_caps_at_waitlist_length() {
        let g = game(5);
        let q = entry(g.id, Membership::Waitlisted { position: 3 });
        let roster = Roster::new(g, vec![q.clone()]);
        let plan = roster.promotion_plan();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].id, q.id);
    }

    #[test]
    fn position_is_one_based_rank_not_raw_counter() {
        let g = game(1);
        // raw positions 40 and 90: user-facing ranks are 1 and 2
        let first = entry(g.id, Membership::Waitlisted { position: 40 });
        let second = entry(g.id, Membership::Waitlisted { position: 90 });
        let roster = Roster::new(g, vec![second.clone(), first.clone()]);
        assert_eq!(roster.position(first.user_id), Some(1));
        assert_eq!(roster.position(second.user_id), Some(2));
        assert_eq!(roster.position(generate_id()), None);
    }

    #[test]
    fn dropping_a_seat_then_planning_promotes_exactly_one() {
        // max 2, A+B confirmed, C waitlisted; A drops
        let g = game(2);
        let b = entry(g.id, Membership::Confirmed);
        let c = entry(g.id, Membership::Waitlisted { position: 1 });
        let roster = Roster::new(g, vec![b, c.clone()]);
        let plan = roster.promotion_plan();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].id, c.id);
    }
}
