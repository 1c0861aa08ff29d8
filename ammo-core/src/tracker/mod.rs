//! Combat ammo tracking.
//!
//! [`ActorAmmoTracker`] holds the start/end bookkeeping for one actor.
//! [`GameAmmoTracker`] owns one per tracked actor and fans combat events out
//! to all of them.

mod actor;
mod game;

pub use actor::{ActorAmmoTracker, EndCombatReport, ItemFailure, RecoveryReport, SnapshotReport};
pub use game::{tracked_actors, ActorOutcome, GameAmmoTracker};

use crate::host::HostError;
use crate::inventory::ActorId;
use thiserror::Error;

/// Errors from tracker operations.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Actor {0} could not be resolved")]
    MissingActor(ActorId),

    #[error("Actor {0} is not tracked")]
    UnknownActor(ActorId),

    #[error("Host error: {0}")]
    Host(#[from] HostError),
}
