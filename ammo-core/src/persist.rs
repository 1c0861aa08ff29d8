//! Save/load for the in-memory host.
//!
//! A saved world carries users, actors, inventories, and every item flag, so
//! a tracker restored from it picks up an encounter exactly where it was.

use crate::flags::FlagKey;
use crate::inventory::{Actor, ActorId, InventoryItem, ItemId, User};
use crate::memory::{InMemoryHost, WorldState};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tokio::fs;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Current save file version.
const SAVE_VERSION: u32 = 1;

/// One actor's inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedInventory {
    pub actor: ActorId,
    pub items: Vec<InventoryItem>,
}

/// A single stored flag value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedFlag {
    pub item: ItemId,
    pub key: FlagKey,
    pub value: u32,
}

/// Complete in-memory world as written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedWorld {
    /// Save format version for compatibility checking.
    pub version: u32,

    /// When the save was created.
    pub saved_at: String,

    pub users: Vec<User>,
    pub actors: Vec<Actor>,
    pub inventories: Vec<SavedInventory>,

    #[serde(default)]
    pub flags: Vec<SavedFlag>,
}

impl SavedWorld {
    /// Capture the current state of a host.
    pub fn capture(host: &InMemoryHost) -> Self {
        host.with_state(|state| {
            // Inventories and flags follow actor order so saves diff cleanly
            let inventories: Vec<SavedInventory> = state
                .actors
                .iter()
                .map(|actor| SavedInventory {
                    actor: actor.id,
                    items: state.inventories.get(&actor.id).cloned().unwrap_or_default(),
                })
                .collect();

            let flags = inventories
                .iter()
                .flat_map(|inv| inv.items.iter())
                .flat_map(|item| {
                    FlagKey::ALL.into_iter().filter_map(move |key| {
                        state.flags.get(&(item.id, key)).map(|&value| SavedFlag {
                            item: item.id,
                            key,
                            value,
                        })
                    })
                })
                .collect();

            Self {
                version: SAVE_VERSION,
                saved_at: timestamp_now(),
                users: state.users.clone(),
                actors: state.actors.clone(),
                inventories,
                flags,
            }
        })
    }

    /// Build a host holding this world.
    pub fn into_host(self) -> InMemoryHost {
        let mut state = WorldState {
            users: self.users,
            actors: self.actors,
            ..WorldState::default()
        };
        for actor in &state.actors {
            state.inventories.insert(actor.id, Vec::new());
        }
        for inventory in self.inventories {
            state.inventories.insert(inventory.actor, inventory.items);
        }
        for flag in self.flags {
            state.flags.insert((flag.item, flag.key), flag.value);
        }
        InMemoryHost::from_state(state)
    }

    /// Save to a JSON file.
    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Load from a JSON file.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let content = fs::read_to_string(path).await?;
        let saved: Self = serde_json::from_str(&content)?;

        if saved.version != SAVE_VERSION {
            return Err(PersistError::VersionMismatch {
                expected: SAVE_VERSION,
                found: saved.version,
            });
        }

        Ok(saved)
    }
}

/// Convenience wrapper: capture a host and write it out.
pub async fn save_host(host: &InMemoryHost, path: impl AsRef<Path>) -> Result<(), PersistError> {
    SavedWorld::capture(host).save_json(path).await
}

/// Convenience wrapper: read a world file into a fresh host.
pub async fn load_host(path: impl AsRef<Path>) -> Result<InMemoryHost, PersistError> {
    Ok(SavedWorld::load_json(path).await?.into_host())
}

fn timestamp_now() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();

    format!("{}", now.as_secs())
}
