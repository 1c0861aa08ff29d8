//! Fan-out of combat events across every tracked actor.

use super::actor::{ActorAmmoTracker, EndCombatReport, RecoveryReport, SnapshotReport};
use super::TrackerError;
use crate::config::{Fanout, TrackerConfig};
use crate::host::Host;
use crate::inventory::{ActorId, User};
use crate::record::SpentAmmo;
use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Result of one actor's share of a fan-out.
#[derive(Debug)]
pub struct ActorOutcome<T> {
    pub actor: ActorId,
    pub result: Result<T, TrackerError>,
}

impl<T> ActorOutcome<T> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Actors to track for a set of connected users.
///
/// Only players count; game masters and users without an assigned
/// character contribute nothing. A character shared by several users is
/// tracked once, at its first position.
pub fn tracked_actors(users: &[User]) -> Vec<ActorId> {
    let mut actors = Vec::new();
    for actor in users.iter().filter(|u| !u.is_gm).filter_map(|u| u.character) {
        if !actors.contains(&actor) {
            actors.push(actor);
        }
    }
    actors
}

struct TrackedActor {
    actor: ActorId,
    tracker: Mutex<ActorAmmoTracker>,
}

/// Ammo trackers for every actor in the game.
///
/// The set of actors is fixed at construction. Each actor's tracker sits
/// behind its own lock, so operations on one actor run in order while
/// different actors proceed independently.
pub struct GameAmmoTracker {
    trackers: Vec<TrackedActor>,
    config: Arc<TrackerConfig>,
}

impl GameAmmoTracker {
    /// Track an explicit, ordered set of actors.
    pub fn new(
        host: Arc<dyn Host>,
        actors: impl IntoIterator<Item = ActorId>,
        config: TrackerConfig,
    ) -> Self {
        let config = Arc::new(config);
        let trackers = actors
            .into_iter()
            .map(|actor| TrackedActor {
                actor,
                tracker: Mutex::new(ActorAmmoTracker::new(actor, host.clone(), config.clone())),
            })
            .collect();

        Self { trackers, config }
    }

    /// Track the characters assigned to the session's players.
    pub async fn from_players(
        host: Arc<dyn Host>,
        config: TrackerConfig,
    ) -> Result<Self, TrackerError> {
        let users = host.users().await?;
        let actors = tracked_actors(&users);
        info!(actors = actors.len(), "Tracking ammo for player characters");
        Ok(Self::new(host, actors, config))
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Tracked actors, in tracking order.
    pub fn actors(&self) -> Vec<ActorId> {
        self.trackers.iter().map(|t| t.actor).collect()
    }

    pub fn is_tracking(&self, actor: ActorId) -> bool {
        self.trackers.iter().any(|t| t.actor == actor)
    }

    /// Lock a single actor's tracker.
    pub fn tracker(&self, actor: ActorId) -> Option<&Mutex<ActorAmmoTracker>> {
        self.trackers
            .iter()
            .find(|t| t.actor == actor)
            .map(|t| &t.tracker)
    }

    /// Snapshot every actor's ammo.
    pub async fn start_combat(&self) -> Vec<ActorOutcome<SnapshotReport>> {
        info!(actors = self.trackers.len(), "Ammo tracker starting combat");
        let tasks = self.trackers.iter().map(|entry| async move {
            let result = entry.tracker.lock().await.start_combat().await;
            ActorOutcome {
                actor: entry.actor,
                result,
            }
        });
        self.run("start_combat", tasks).await
    }

    /// Tally every actor's ammo and send the summaries.
    pub async fn end_combat(&self) -> Vec<ActorOutcome<EndCombatReport>> {
        info!(actors = self.trackers.len(), "Ammo tracker ending combat");
        let tasks = self.trackers.iter().map(|entry| async move {
            let result = entry.tracker.lock().await.end_combat().await;
            ActorOutcome {
                actor: entry.actor,
                result,
            }
        });
        self.run("end_combat", tasks).await
    }

    /// Rebuild every actor's records from persisted flags.
    pub async fn restore(&self) -> Vec<ActorOutcome<usize>> {
        let tasks = self.trackers.iter().map(|entry| async move {
            let result = entry.tracker.lock().await.restore().await;
            ActorOutcome {
                actor: entry.actor,
                result,
            }
        });
        self.run("restore", tasks).await
    }

    /// Recover spent ammo for one actor.
    pub async fn recover_ammo(&self, actor: ActorId) -> Result<RecoveryReport, TrackerError> {
        let tracker = self
            .tracker(actor)
            .ok_or(TrackerError::UnknownActor(actor))?;
        tracker.lock().await.recover_ammo().await
    }

    /// Current spent view for one actor.
    pub async fn spent_ammo(&self, actor: ActorId) -> Result<Vec<SpentAmmo>, TrackerError> {
        let tracker = self
            .tracker(actor)
            .ok_or(TrackerError::UnknownActor(actor))?;
        Ok(tracker.lock().await.spent_ammo())
    }

    async fn run<T, F>(
        &self,
        operation: &'static str,
        tasks: impl IntoIterator<Item = F>,
    ) -> Vec<ActorOutcome<T>>
    where
        F: Future<Output = ActorOutcome<T>>,
    {
        let outcomes = match self.config.fanout {
            Fanout::Concurrent => join_all(tasks).await,
            Fanout::Sequential => {
                let mut outcomes = Vec::new();
                for task in tasks {
                    outcomes.push(task.await);
                }
                outcomes
            }
        };

        for outcome in &outcomes {
            if let Err(error) = &outcome.result {
                warn!(
                    actor = %outcome.actor,
                    error = %error,
                    operation,
                    "Skipping actor"
                );
            }
        }

        outcomes
    }
}
