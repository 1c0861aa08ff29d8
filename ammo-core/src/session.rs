//! AmmoSession - the process-wide tracker lifecycle.
//!
//! The session is created empty, becomes ready when the host signals that
//! its data is loaded, and is closed on shutdown. Combat events are only
//! accepted while ready, so no event can race tracker construction.

use crate::chat::ChatAction;
use crate::config::TrackerConfig;
use crate::host::Host;
use crate::inventory::ActorId;
use crate::tracker::{
    ActorOutcome, EndCombatReport, GameAmmoTracker, RecoveryReport, SnapshotReport, TrackerError,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Errors from AmmoSession operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Ammo tracker is not ready, waiting for the host ready signal")]
    NotReady,

    #[error("Ammo tracker session is closed")]
    Closed,

    #[error("Tracker error: {0}")]
    Tracker(#[from] TrackerError),
}

/// Signals forwarded from the host platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// Host data is loaded; build the trackers.
    Ready,
    CombatStarted,
    CombatEnded,
    /// A user pressed the recover button for an actor.
    RecoverRequested { actor: ActorId },
    Shutdown,
}

impl From<&ChatAction> for HostEvent {
    fn from(action: &ChatAction) -> Self {
        match action {
            ChatAction::RecoverAmmo { actor, .. } => HostEvent::RecoverRequested { actor: *actor },
        }
    }
}

/// What handling an event produced.
#[derive(Debug)]
pub enum EventOutcome {
    Initialized { actors: usize, restored: usize },
    CombatStarted(Vec<ActorOutcome<SnapshotReport>>),
    CombatEnded(Vec<ActorOutcome<EndCombatReport>>),
    Recovered(RecoveryReport),
    Closed,
}

enum SessionState {
    Pending,
    Ready(GameAmmoTracker),
    Closed,
}

/// Binds host events to a [`GameAmmoTracker`].
pub struct AmmoSession {
    host: Arc<dyn Host>,
    config: TrackerConfig,
    actors: Option<Vec<ActorId>>,
    state: SessionState,
}

impl AmmoSession {
    /// Create a session that will track the players' characters.
    pub fn new(host: Arc<dyn Host>, config: TrackerConfig) -> Self {
        Self {
            host,
            config,
            actors: None,
            state: SessionState::Pending,
        }
    }

    /// Track an explicit set of actors instead of the players' characters.
    pub fn with_actors(mut self, actors: Vec<ActorId>) -> Self {
        self.actors = Some(actors);
        self
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, SessionState::Ready(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, SessionState::Closed)
    }

    /// The tracker, once the session is ready.
    pub fn tracker(&self) -> Result<&GameAmmoTracker, SessionError> {
        match &self.state {
            SessionState::Ready(tracker) => Ok(tracker),
            SessionState::Pending => Err(SessionError::NotReady),
            SessionState::Closed => Err(SessionError::Closed),
        }
    }

    /// Build the trackers and restore any encounter persisted in item flags.
    ///
    /// Calling this again on a ready session rebuilds the trackers.
    pub async fn initialize(&mut self) -> Result<EventOutcome, SessionError> {
        if self.is_closed() {
            return Err(SessionError::Closed);
        }

        let tracker = match &self.actors {
            Some(actors) => {
                GameAmmoTracker::new(self.host.clone(), actors.iter().copied(), self.config.clone())
            }
            None => GameAmmoTracker::from_players(self.host.clone(), self.config.clone()).await?,
        };

        let restored = tracker
            .restore()
            .await
            .into_iter()
            .filter_map(|outcome| outcome.result.ok())
            .sum::<usize>();
        let actors = tracker.actors().len();
        info!(actors, restored, "Ammo tracker ready");

        self.state = SessionState::Ready(tracker);
        Ok(EventOutcome::Initialized { actors, restored })
    }

    /// Drop the trackers. Later events are rejected.
    pub fn shutdown(&mut self) {
        if !self.is_closed() {
            info!("Ammo tracker shut down");
        }
        self.state = SessionState::Closed;
    }

    /// Route a host event.
    pub async fn handle(&mut self, event: HostEvent) -> Result<EventOutcome, SessionError> {
        let result = self.dispatch(event).await;
        if let Err(error) = &result {
            warn!(error = %error, "Ammo tracker event rejected");
        }
        result
    }

    async fn dispatch(&mut self, event: HostEvent) -> Result<EventOutcome, SessionError> {
        match event {
            HostEvent::Ready => self.initialize().await,
            HostEvent::CombatStarted => Ok(EventOutcome::CombatStarted(
                self.tracker()?.start_combat().await,
            )),
            HostEvent::CombatEnded => Ok(EventOutcome::CombatEnded(
                self.tracker()?.end_combat().await,
            )),
            HostEvent::RecoverRequested { actor } => Ok(EventOutcome::Recovered(
                self.tracker()?.recover_ammo(actor).await?,
            )),
            HostEvent::Shutdown => {
                self.shutdown();
                Ok(EventOutcome::Closed)
            }
        }
    }
}
