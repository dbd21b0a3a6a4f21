//! Channel membership reconciler.
//!
//! Diffs the channel membership the roster implies against what the
//! platform reports and issues the minimal add/remove/update set. Pure,
//! order-independent, and convergent: one pass fixes any divergence, a
//! second pass with no state change does nothing.

use std::collections::BTreeMap;

use muster_common::error::MusterResult;
use muster_common::models::channel::ChannelAccess;
use muster_common::models::game::Game;
use muster_db::{repository, Database};
use muster_platform::{ChannelMember, ChatPlatform, PlatformError};
use uuid::Uuid;

use crate::roster::{self, Roster};

/// The minimal operation set to converge actual membership on expected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipDiff {
    /// Expected but absent
    pub add: Vec<ChannelMember>,
    /// Present but not expected (platform ids)
    pub remove: Vec<String>,
    /// Present with the wrong access flags
    pub update: Vec<ChannelMember>,
}

impl MembershipDiff {
    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty() && self.update.is_empty()
    }
}

/// Compute the minimal diff between expected and actual membership.
pub fn diff(expected: &[ChannelMember], actual: &[ChannelMember]) -> MembershipDiff {
    let expected: BTreeMap<&str, ChannelAccess> = expected
        .iter()
        .map(|m| (m.platform_id.as_str(), m.access))
        .collect();
    let actual: BTreeMap<&str, ChannelAccess> = actual
        .iter()
        .map(|m| (m.platform_id.as_str(), m.access))
        .collect();

    let mut out = MembershipDiff::default();
    for (id, want) in &expected {
        match actual.get(id) {
            None => out.add.push(ChannelMember {
                platform_id: (*id).to_owned(),
                access: *want,
            }),
            Some(have) if have != want => out.update.push(ChannelMember {
                platform_id: (*id).to_owned(),
                access: *want,
            }),
            Some(_) => {}
        }
    }
    for id in actual.keys() {
        if !expected.contains_key(id) {
            out.remove.push((*id).to_owned());
        }
    }
    out
}

/// Access each participant should hold: confirmed party read/write,
/// waitlist read-only, DM moderator. A DM who also holds a player row
/// (force-adds allow that) appears once, as moderator — a duplicate
/// entry would let the later plain-member access win in [`diff`].
pub fn expected_access(roster: &Roster) -> Vec<(Uuid, ChannelAccess)> {
    let dm_id = roster.game.dm_id;
    let mut out = Vec::with_capacity(roster.confirmed.len() + roster.waitlist.len() + 1);
    out.push((dm_id, ChannelAccess::moderator()));
    for entry in &roster.confirmed {
        if entry.user_id != dm_id {
            out.push((entry.user_id, ChannelAccess::member()));
        }
    }
    for entry in &roster.waitlist {
        if entry.user_id != dm_id {
            out.push((entry.user_id, ChannelAccess::read_only()));
        }
    }
    out
}

/// Resolve [`expected_access`] user ids to platform members. Users with
/// no account row are skipped; they cannot be granted anything.
pub async fn expected_members(db: &Database, roster: &Roster) -> MusterResult<Vec<ChannelMember>> {
    let wanted = expected_access(roster);
    let mut members = Vec::with_capacity(wanted.len());
    for (user_id, access) in wanted {
        if let Some(user) = repository::users::find_user(&db.pool, user_id).await? {
            members.push(ChannelMember {
                platform_id: user.platform_id,
                access,
            });
        }
    }
    Ok(members)
}

/// Reconcile one game's channel membership against its roster. A channel
/// that turned out to be missing externally is treated as destroyed and
/// its binding cleaned up.
pub async fn reconcile_channel(
    db: &Database,
    platform: &dyn ChatPlatform,
    game: &Game,
) -> MusterResult<()> {
    let Some(binding) = repository::channels::find_by_game(&db.pool, game.id).await? else {
        return Ok(());
    };

    let roster = roster::load(db, game.id).await?;
    let expected = expected_members(db, &roster).await?;

    let actual = match platform.channel_members(&binding.channel_id).await {
        Ok(actual) => actual,
        Err(PlatformError::ChannelMissing(_)) => {
            tracing::warn!(game_id = %game.id, "Channel gone externally, dropping binding");
            repository::channels::delete_channel(&db.pool, game.id).await?;
            return Ok(());
        }
        Err(e) => return Err(crate::platform_err(e)),
    };

    let diff = diff(&expected, &actual);
    if diff.is_empty() {
        return Ok(());
    }
    tracing::debug!(
        game_id = %game.id,
        add = diff.add.len(),
        remove = diff.remove.len(),
        update = diff.update.len(),
        "Reconciling channel membership"
    );

    for member in diff.add.iter().chain(diff.update.iter()) {
        platform
            .set_member_access(&binding.channel_id, &member.platform_id, member.access)
            .await
            .map_err(crate::platform_err)?;
    }
    for platform_id in &diff.remove {
        platform
            .remove_member(&binding.channel_id, platform_id)
            .await
            .map_err(crate::platform_err)?;
        // Dropped-out notice is best-effort
        if let Err(e) = platform
            .send_dm(
                platform_id,
                &format!("You have been removed from **{}**.", roster.game.name),
            )
            .await
        {
            tracing::warn!(game_id = %game.id, "Failed to DM removal notice: {e}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use muster_common::models::game::GameStatus;
    use muster_common::models::player::{Membership, PlayerEntry};
    use muster_common::snowflake::generate_id;

    fn member(id: &str, access: ChannelAccess) -> ChannelMember {
        ChannelMember {
            platform_id: id.to_owned(),
            access,
        }
    }

    fn game_with_dm(dm_id: Uuid) -> Game {
        let now = Utc::now();
        Game {
            id: generate_id(),
            dm_id,
            name: "Lost Mine".into(),
            module: None,
            description: None,
            max_players: 4,
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

    fn entry(game_id: Uuid, user_id: Uuid, membership: Membership) -> PlayerEntry {
        PlayerEntry {
            id: generate_id(),
            game_id,
            user_id,
            membership,
            character: None,
            joined_at: Utc::now(),
        }
    }

    #[test]
    fn force_added_dm_keeps_moderator_access() {
        let dm_id = generate_id();
        let player_id = generate_id();
        let g = game_with_dm(dm_id);
        let roster = Roster::new(
            g.clone(),
            vec![
                entry(g.id, dm_id, Membership::Confirmed),
                entry(g.id, player_id, Membership::Confirmed),
            ],
        );

        let wanted = expected_access(&roster);
        assert_eq!(
            wanted,
            vec![
                (dm_id, ChannelAccess::moderator()),
                (player_id, ChannelAccess::member()),
            ]
        );
    }

    #[test]
    fn waitlisted_dm_is_not_demoted_to_read_only() {
        let dm_id = generate_id();
        let g = game_with_dm(dm_id);
        let roster = Roster::new(
            g.clone(),
            vec![entry(g.id, dm_id, Membership::Waitlisted { position: 1 })],
        );
        assert_eq!(
            expected_access(&roster),
            vec![(dm_id, ChannelAccess::moderator())]
        );
    }

    #[test]
    fn equal_membership_is_a_noop() {
        let expected = vec![
            member("100", ChannelAccess::moderator()),
            member("200", ChannelAccess::member()),
        ];
        let actual = vec![
            member("200", ChannelAccess::member()),
            member("100", ChannelAccess::moderator()),
        ];
        assert!(diff(&expected, &actual).is_empty());
    }

    #[test]
    fn absent_users_are_added_and_strays_removed() {
        let expected = vec![member("1", ChannelAccess::member())];
        let actual = vec![member("2", ChannelAccess::member())];
        let d = diff(&expected, &actual);
        assert_eq!(d.add, vec![member("1", ChannelAccess::member())]);
        assert_eq!(d.remove, vec!["2".to_owned()]);
        assert!(d.update.is_empty());
    }

    #[test]
    fn mismatched_access_becomes_update() {
        // promoted off the waitlist: read-only on the platform, member expected
        let expected = vec![member("7", ChannelAccess::member())];
        let actual = vec![member("7", ChannelAccess::read_only())];
        let d = diff(&expected, &actual);
        assert!(d.add.is_empty() && d.remove.is_empty());
        assert_eq!(d.update, vec![member("7", ChannelAccess::member())]);
    }

    #[test]
    fn applying_a_diff_converges_in_one_pass() {
        let expected = vec![
            member("1", ChannelAccess::moderator()),
            member("2", ChannelAccess::member()),
            member("3", ChannelAccess::read_only()),
        ];
        let actual = vec![
            member("2", ChannelAccess::read_only()),
            member("9", ChannelAccess::member()),
        ];
        let d = diff(&expected, &actual);

        // simulate applying the diff
        let mut state: BTreeMap<String, ChannelAccess> = actual
            .into_iter()
            .map(|m| (m.platform_id, m.access))
            .collect();
        for m in d.add.iter().chain(d.update.iter()) {
            state.insert(m.platform_id.clone(), m.access);
        }
        for id in &d.remove {
            state.remove(id);
        }
        let converged: Vec<ChannelMember> = state
            .into_iter()
            .map(|(platform_id, access)| ChannelMember {
                platform_id,
                access,
            })
            .collect();

        // second pass is a no-op
        assert!(diff(&expected, &converged).is_empty());
    }
}
