//! Reconciliation scheduler — the periodic driver.
//!
//! Three independent interval loops: game lifecycle transitions, channel
//! lifecycle actions, and roster promotion + channel membership
//! reconciliation. Each loop re-derives everything from persisted state on
//! every tick, so a restart needs no recovery step beyond connecting; a
//! failure on one game is logged and never aborts the rest of the tick.

use std::sync::Arc;
use std::time::Duration;

use muster_common::config::{PlatformConfig, SchedulerConfig};
use muster_common::error::MusterResult;
use muster_common::models::game::Game;
use muster_db::{repository, Database};
use muster_platform::ChatPlatform;
use tokio::task::JoinHandle;

use crate::channel::{controller, controller::ChannelWindows, reconciler};
use crate::roster;

/// Periodic reconciliation driver. Cheap to clone; loops share the pool
/// and the platform client.
#[derive(Clone)]
pub struct Scheduler {
    db: Database,
    platform: Arc<dyn ChatPlatform>,
    windows: ChannelWindows,
    intervals: SchedulerConfig,
    announce_channel_id: String,
}

impl Scheduler {
    pub fn new(
        db: Database,
        platform: Arc<dyn ChatPlatform>,
        windows: ChannelWindows,
        intervals: SchedulerConfig,
        platform_config: &PlatformConfig,
    ) -> Self {
        Self {
            db,
            platform,
            windows,
            intervals,
            announce_channel_id: platform_config.announce_channel_id.clone(),
        }
    }

    /// Spawn the three reconciliation loops. The handles run until the
    /// process exits.
    pub fn spawn(self) -> Vec<JoinHandle<()>> {
        tracing::info!(
            lifecycle_secs = self.intervals.lifecycle_interval_secs,
            channel_secs = self.intervals.channel_interval_secs,
            membership_secs = self.intervals.membership_interval_secs,
            "Starting reconciliation scheduler"
        );

        let lifecycle = {
            let s = self.clone();
            tokio::spawn(async move {
                let mut tick =
                    tokio::time::interval(Duration::from_secs(s.intervals.lifecycle_interval_secs));
                loop {
                    tick.tick().await;
                    if let Err(e) = crate::lifecycle::advance_all(
                        &s.db,
                        s.platform.as_ref(),
                        &s.announce_channel_id,
                    )
                    .await
                    {
                        tracing::error!("Lifecycle tick failed: {e}");
                    }
                }
            })
        };

        let channels = {
            let s = self.clone();
            tokio::spawn(async move {
                let mut tick =
                    tokio::time::interval(Duration::from_secs(s.intervals.channel_interval_secs));
                loop {
                    tick.tick().await;
                    if let Err(e) =
                        controller::tick(&s.db, s.platform.as_ref(), &s.windows).await
                    {
                        tracing::error!("Channel tick failed: {e}");
                    }
                }
            })
        };

        let membership = {
            let s = self;
            tokio::spawn(async move {
                let mut tick = tokio::time::interval(Duration::from_secs(
                    s.intervals.membership_interval_secs,
                ));
                loop {
                    tick.tick().await;
                    if let Err(e) = s.membership_tick().await {
                        tracing::error!("Membership tick failed: {e}");
                    }
                }
            })
        };

        vec![lifecycle, channels, membership]
    }

    /// Promote waitlists and converge channel membership for every active
    /// game. Per-game failures are isolated.
    async fn membership_tick(&self) -> MusterResult<()> {
        let now = chrono::Utc::now();
        for game in repository::games::list_active(&self.db.pool, now).await? {
            if let Err(e) = self.reconcile_game(&game).await {
                tracing::warn!(game_id = %game.id, "Game reconciliation failed: {e}");
            }
        }
        Ok(())
    }

    async fn reconcile_game(&self, game: &Game) -> MusterResult<()> {
        let promoted = roster::reconcile(&self.db, game.id).await?;
        for entry in &promoted {
            self.notify_promoted(game, entry.user_id).await;
        }
        reconciler::reconcile_channel(&self.db, self.platform.as_ref(), game).await
    }

    /// Best-effort promotion DM.
    async fn notify_promoted(&self, game: &Game, user_id: uuid::Uuid) {
        let user = match repository::users::find_user(&self.db.pool, user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(user_id = %user_id, "Failed to load promoted user: {e}");
                return;
            }
        };
        let content = format!(
            "A seat opened up: you are now confirmed for **{}**, starting {}.",
            game.name,
            game.start_at.format("%Y-%m-%d %H:%M UTC")
        );
        if let Err(e) = self.platform.send_dm(&user.platform_id, &content).await {
            tracing::warn!(user_id = %user_id, "Failed to DM promotion notice: {e}");
        }
    }
}
