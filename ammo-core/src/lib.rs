//! Spent-ammo tracking for tabletop combat encounters.
//!
//! This crate provides:
//! - Per-actor snapshots of ammunition at the start and end of combat
//! - Recovery of half the spent ammo (rounded down) after the fight
//! - Fan-out of combat events to every player character
//! - Host abstraction for inventories, flag storage, and chat
//! - An in-memory host with JSON persistence for tests and the CLI
//!
//! # Quick Start
//!
//! ```ignore
//! use ammo_core::{AmmoSession, HostEvent, InMemoryHost, InventoryItem, TrackerConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let host = Arc::new(InMemoryHost::new());
//!     let (_, legolas) = host.add_player("alice", "Legolas");
//!     let arrows = host.add_item(legolas, InventoryItem::ammo("Arrows", 20));
//!
//!     let mut session = AmmoSession::new(host.clone(), TrackerConfig::from_env()?);
//!     session.handle(HostEvent::Ready).await?;
//!     session.handle(HostEvent::CombatStarted).await?;
//!     host.spend(arrows, 6);
//!     session.handle(HostEvent::CombatEnded).await?;
//!     session.handle(HostEvent::RecoverRequested { actor: legolas }).await?;
//!
//!     assert_eq!(host.quantity(arrows), Some(17));
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod config;
pub mod flags;
pub mod host;
pub mod inventory;
pub mod memory;
pub mod persist;
pub mod record;
pub mod session;
pub mod testing;
pub mod tracker;

// Primary public API
pub use chat::{Audience, ChatAction, ChatMessage, Speaker};
pub use config::{ConfigError, Fanout, TrackerConfig};
pub use flags::{FlagKey, FLAG_NAMESPACE};
pub use host::{ActorDirectory, Host, HostError, HostResult, ItemStore, Notifier};
pub use inventory::{Actor, ActorId, InventoryItem, ItemId, ItemKind, User, UserId};
pub use memory::InMemoryHost;
pub use persist::{load_host, save_host, PersistError, SavedWorld};
pub use record::{AmmoRecord, AmmoRecords, RecoveredAmmo, SpentAmmo};
pub use session::{AmmoSession, EventOutcome, HostEvent, SessionError};
pub use testing::TestHarness;
pub use tracker::{
    ActorAmmoTracker, ActorOutcome, EndCombatReport, GameAmmoTracker, RecoveryReport,
    SnapshotReport, TrackerError,
};
