//! In-memory host.
//!
//! A complete [`Host`](crate::host::Host) backed by process memory. Used by
//! the headless driver and by tests; it can be told to fail writes for
//! specific items to exercise partial-failure paths.

use crate::chat::ChatMessage;
use crate::flags::FlagKey;
use crate::host::{ActorDirectory, HostError, HostResult, ItemStore, Notifier};
use crate::inventory::{Actor, ActorId, InventoryItem, ItemId, User, UserId};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError, RwLock};

#[derive(Debug, Default)]
pub(crate) struct WorldState {
    pub(crate) users: Vec<User>,
    pub(crate) actors: Vec<Actor>,
    pub(crate) inventories: HashMap<ActorId, Vec<InventoryItem>>,
    pub(crate) flags: HashMap<(ItemId, FlagKey), u32>,
}

impl WorldState {
    fn item_mut(&mut self, item: ItemId) -> Option<&mut InventoryItem> {
        self.inventories
            .values_mut()
            .flat_map(|items| items.iter_mut())
            .find(|i| i.id == item)
    }

    fn item(&self, item: ItemId) -> Option<&InventoryItem> {
        self.inventories
            .values()
            .flat_map(|items| items.iter())
            .find(|i| i.id == item)
    }
}

#[derive(Debug, Default)]
struct Failures {
    quantity_updates: HashSet<ItemId>,
    flag_writes: HashSet<ItemId>,
}

/// A self-contained world of users, actors, and items.
#[derive(Debug, Default)]
pub struct InMemoryHost {
    state: RwLock<WorldState>,
    failures: Mutex<Failures>,
    messages: Mutex<Vec<ChatMessage>>,
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_state(state: WorldState) -> Self {
        Self {
            state: RwLock::new(state),
            ..Self::default()
        }
    }

    pub(crate) fn with_state<R>(&self, f: impl FnOnce(&WorldState) -> R) -> R {
        f(&*self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn with_state_mut<R>(&self, f: impl FnOnce(&mut WorldState) -> R) -> R {
        f(&mut *self.state.write().unwrap_or_else(PoisonError::into_inner))
    }

    // ------------------------------------------------------------------
    // World setup
    // ------------------------------------------------------------------

    pub fn add_user(&self, user: User) -> UserId {
        let id = user.id;
        self.with_state_mut(|s| s.users.push(user));
        id
    }

    /// Add an actor with no owners.
    pub fn add_actor(&self, name: impl Into<String>) -> ActorId {
        let actor = Actor::new(name);
        let id = actor.id;
        self.with_state_mut(|s| {
            s.inventories.insert(id, Vec::new());
            s.actors.push(actor);
        });
        id
    }

    /// Add a player user who owns and controls a new actor.
    pub fn add_player(
        &self,
        user: impl Into<String>,
        character: impl Into<String>,
    ) -> (UserId, ActorId) {
        let actor = self.add_actor(character);
        let user = self.add_user(User::player(user).with_character(actor));
        self.with_state_mut(|s| {
            if let Some(a) = s.actors.iter_mut().find(|a| a.id == actor) {
                a.owners.push(user);
            }
        });
        (user, actor)
    }

    /// Delete an actor and everything it carries.
    pub fn remove_actor(&self, actor: ActorId) {
        self.with_state_mut(|s| {
            s.actors.retain(|a| a.id != actor);
            if let Some(items) = s.inventories.remove(&actor) {
                s.flags.retain(|(item, _), _| !items.iter().any(|i| i.id == *item));
            }
        });
    }

    /// Give an item to an actor.
    pub fn add_item(&self, actor: ActorId, item: InventoryItem) -> ItemId {
        let id = item.id;
        self.with_state_mut(|s| s.inventories.entry(actor).or_default().push(item));
        id
    }

    /// Delete an item and its flags, as when a stack is used up.
    pub fn remove_item(&self, item: ItemId) {
        self.with_state_mut(|s| {
            for items in s.inventories.values_mut() {
                items.retain(|i| i.id != item);
            }
            s.flags.retain(|(id, _), _| *id != item);
        });
    }

    /// Overwrite an item's quantity directly, bypassing failure injection.
    pub fn set_quantity(&self, item: ItemId, quantity: u32) -> bool {
        self.with_state_mut(|s| match s.item_mut(item) {
            Some(i) => {
                i.quantity = quantity;
                true
            }
            None => false,
        })
    }

    /// Consume up to `amount` of an item. Returns what was actually consumed.
    pub fn spend(&self, item: ItemId, amount: u32) -> u32 {
        self.with_state_mut(|s| match s.item_mut(item) {
            Some(i) => {
                let spent = amount.min(i.quantity);
                i.quantity -= spent;
                spent
            }
            None => 0,
        })
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    pub fn quantity(&self, item: ItemId) -> Option<u32> {
        self.with_state(|s| s.item(item).map(|i| i.quantity))
    }

    pub fn flag(&self, item: ItemId, key: FlagKey) -> Option<u32> {
        self.with_state(|s| s.flags.get(&(item, key)).copied())
    }

    pub fn find_actor(&self, name: &str) -> Option<ActorId> {
        let name = name.to_lowercase();
        self.with_state(|s| {
            s.actors
                .iter()
                .find(|a| a.name.to_lowercase() == name)
                .map(|a| a.id)
        })
    }

    pub fn find_item(&self, actor: ActorId, name: &str) -> Option<ItemId> {
        let name = name.to_lowercase();
        self.with_state(|s| {
            s.inventories
                .get(&actor)?
                .iter()
                .find(|i| i.name.to_lowercase() == name)
                .map(|i| i.id)
        })
    }

    pub fn actors(&self) -> Vec<Actor> {
        self.with_state(|s| s.actors.clone())
    }

    pub fn inventory(&self, actor: ActorId) -> Vec<InventoryItem> {
        self.with_state(|s| s.inventories.get(&actor).cloned().unwrap_or_default())
    }

    /// Every message delivered so far, oldest first.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drain delivered messages.
    pub fn take_messages(&self) -> Vec<ChatMessage> {
        std::mem::take(&mut *self.messages.lock().unwrap_or_else(PoisonError::into_inner))
    }

    // ------------------------------------------------------------------
    // Failure injection
    // ------------------------------------------------------------------

    /// Make every quantity update for `item` fail.
    pub fn fail_quantity_updates(&self, item: ItemId) {
        self.failures_mut(|f| f.quantity_updates.insert(item));
    }

    /// Make every flag write for `item` fail.
    pub fn fail_flag_writes(&self, item: ItemId) {
        self.failures_mut(|f| f.flag_writes.insert(item));
    }

    pub fn clear_failures(&self) {
        self.failures_mut(|f| *f = Failures::default());
    }

    fn failures_mut<R>(&self, f: impl FnOnce(&mut Failures) -> R) -> R {
        f(&mut *self.failures.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn check_failure(
        &self,
        item: ItemId,
        pick: impl FnOnce(&Failures) -> &HashSet<ItemId>,
        what: &str,
    ) -> HostResult<()> {
        let failing = self.failures_mut(|f| pick(&*f).contains(&item));
        if failing {
            return Err(HostError::Persistence {
                item,
                reason: format!("simulated {what} failure"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ActorDirectory for InMemoryHost {
    async fn actor(&self, id: ActorId) -> HostResult<Option<Actor>> {
        Ok(self.with_state(|s| s.actors.iter().find(|a| a.id == id).cloned()))
    }

    async fn users(&self) -> HostResult<Vec<User>> {
        Ok(self.with_state(|s| s.users.clone()))
    }
}

#[async_trait]
impl ItemStore for InMemoryHost {
    async fn items(&self, actor: ActorId) -> HostResult<Vec<InventoryItem>> {
        self.with_state(|s| {
            if !s.actors.iter().any(|a| a.id == actor) {
                return Err(HostError::ActorNotFound(actor));
            }
            Ok(s.inventories.get(&actor).cloned().unwrap_or_default())
        })
    }

    async fn get_flag(&self, item: ItemId, key: FlagKey) -> HostResult<Option<u32>> {
        self.with_state(|s| {
            if s.item(item).is_none() {
                return Err(HostError::ItemNotFound(item));
            }
            Ok(s.flags.get(&(item, key)).copied())
        })
    }

    async fn set_flag(&self, item: ItemId, key: FlagKey, value: u32) -> HostResult<()> {
        self.check_failure(item, |f| &f.flag_writes, "flag write")?;
        self.with_state_mut(|s| {
            if s.item(item).is_none() {
                return Err(HostError::ItemNotFound(item));
            }
            s.flags.insert((item, key), value);
            Ok(())
        })
    }

    async fn update_quantity(&self, item: ItemId, quantity: u32) -> HostResult<()> {
        self.check_failure(item, |f| &f.quantity_updates, "quantity update")?;
        self.with_state_mut(|s| match s.item_mut(item) {
            Some(i) => {
                i.quantity = quantity;
                Ok(())
            }
            None => Err(HostError::ItemNotFound(item)),
        })
    }
}

#[async_trait]
impl Notifier for InMemoryHost {
    async fn notify(&self, message: ChatMessage) -> HostResult<()> {
        tracing::debug!(lines = message.lines.len(), "Chat message delivered");
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
        Ok(())
    }
}
