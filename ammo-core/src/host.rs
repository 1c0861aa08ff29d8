//! Contracts the host platform implements for the tracker.
//!
//! The host owns actors, items, flag storage, and chat. Every call is an
//! independent unit that either succeeds or fails on its own; there are no
//! multi-item transactions.

use crate::chat::ChatMessage;
use crate::flags::FlagKey;
use crate::inventory::{Actor, ActorId, InventoryItem, ItemId, User};
use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by host implementations.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Actor not found: {0}")]
    ActorNotFound(ActorId),

    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("Persistence failed for item {item}: {reason}")]
    Persistence { item: ItemId, reason: String },

    #[error("Notification failed: {0}")]
    Notification(String),
}

pub type HostResult<T> = Result<T, HostError>;

/// Resolves actors and the users connected to the session.
#[async_trait]
pub trait ActorDirectory: Send + Sync {
    /// Look up an actor. `None` if it no longer exists.
    async fn actor(&self, id: ActorId) -> HostResult<Option<Actor>>;

    /// Users currently connected to the session.
    async fn users(&self) -> HostResult<Vec<User>>;
}

/// Item enumeration, per-item flag storage, and quantity updates.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Current inventory of an actor.
    ///
    /// Fails with [`HostError::ActorNotFound`] if the actor cannot be resolved.
    async fn items(&self, actor: ActorId) -> HostResult<Vec<InventoryItem>>;

    /// Raw stored flag value, `None` if never written.
    async fn get_flag(&self, item: ItemId, key: FlagKey) -> HostResult<Option<u32>>;

    async fn set_flag(&self, item: ItemId, key: FlagKey, value: u32) -> HostResult<()>;

    async fn update_quantity(&self, item: ItemId, quantity: u32) -> HostResult<()>;

    /// Flag value with the key's default-value policy applied.
    async fn read_flag(&self, item: ItemId, key: FlagKey) -> HostResult<Option<u32>> {
        Ok(key.resolve(self.get_flag(item, key).await?))
    }

    /// The actor's items that count as ammunition.
    async fn ammo_items(&self, actor: ActorId) -> HostResult<Vec<InventoryItem>> {
        Ok(self
            .items(actor)
            .await?
            .into_iter()
            .filter(InventoryItem::is_ammo)
            .collect())
    }
}

/// Delivers chat messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: ChatMessage) -> HostResult<()>;
}

/// Everything the tracker needs from the host.
pub trait Host: ActorDirectory + ItemStore + Notifier {}

impl<T: ActorDirectory + ItemStore + Notifier + ?Sized> Host for T {}
