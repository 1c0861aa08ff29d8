//! Testing utilities for the ammo tracker.
//!
//! This module provides tools for integration testing:
//! - `TestHarness` for scripted encounters against an [`InMemoryHost`]
//! - Assertion helpers for verifying quantities, flags, and chat output

use crate::chat::ChatMessage;
use crate::config::TrackerConfig;
use crate::flags::FlagKey;
use crate::host::Host;
use crate::inventory::{ActorId, InventoryItem, ItemId};
use crate::memory::InMemoryHost;
use crate::tracker::{ActorAmmoTracker, GameAmmoTracker};
use std::sync::Arc;

/// Test harness for running ammo scenarios.
pub struct TestHarness {
    /// The in-memory host everything runs against.
    pub host: Arc<InMemoryHost>,
    /// Config handed to trackers built by the harness.
    pub config: TrackerConfig,
}

impl TestHarness {
    /// Create an empty world with the default config.
    pub fn new() -> Self {
        Self::with_config(TrackerConfig::default())
    }

    pub fn with_config(config: TrackerConfig) -> Self {
        Self {
            host: Arc::new(InMemoryHost::new()),
            config,
        }
    }

    /// Add a player character carrying one stack of ammunition.
    pub fn add_archer(&self, name: &str, ammo: &str, quantity: u32) -> (ActorId, ItemId) {
        let player = format!("{}'s player", name);
        let (_, actor) = self.host.add_player(player, name);
        let item = self.host.add_item(actor, InventoryItem::ammo(ammo, quantity));
        (actor, item)
    }

    /// Give an existing actor another item.
    pub fn give(&self, actor: ActorId, item: InventoryItem) -> ItemId {
        self.host.add_item(actor, item)
    }

    /// Fire `amount` rounds of an item.
    pub fn shoot(&self, item: ItemId, amount: u32) -> u32 {
        self.host.spend(item, amount)
    }

    /// The host as the trait object trackers hold.
    pub fn shared_host(&self) -> Arc<dyn Host> {
        self.host.clone()
    }

    /// A standalone tracker for one actor.
    pub fn actor_tracker(&self, actor: ActorId) -> ActorAmmoTracker {
        ActorAmmoTracker::new(actor, self.shared_host(), Arc::new(self.config.clone()))
    }

    /// A game tracker over an explicit actor list.
    pub fn game_tracker(&self, actors: impl IntoIterator<Item = ActorId>) -> GameAmmoTracker {
        GameAmmoTracker::new(self.shared_host(), actors, self.config.clone())
    }

    pub fn quantity(&self, item: ItemId) -> Option<u32> {
        self.host.quantity(item)
    }

    /// Stored `(start, end)` flags for an item.
    pub fn flags(&self, item: ItemId) -> (Option<u32>, Option<u32>) {
        (
            self.host.flag(item, FlagKey::StartQuantity),
            self.host.flag(item, FlagKey::EndQuantity),
        )
    }

    /// Drain delivered chat messages.
    pub fn take_messages(&self) -> Vec<ChatMessage> {
        self.host.take_messages()
    }

    /// Content of the most recent chat message.
    pub fn last_message(&self) -> Option<String> {
        self.host.messages().last().map(ChatMessage::content)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert an item's current quantity.
#[track_caller]
pub fn assert_quantity(harness: &TestHarness, item: ItemId, expected: u32) {
    let actual = harness.quantity(item);
    assert_eq!(
        actual,
        Some(expected),
        "Expected quantity {expected}, got {actual:?}"
    );
}

/// Assert an item's stored start and end flags.
#[track_caller]
pub fn assert_flags(harness: &TestHarness, item: ItemId, start: u32, end: u32) {
    let actual = harness.flags(item);
    assert_eq!(
        actual,
        (Some(start), Some(end)),
        "Expected flags start={start} end={end}, got {actual:?}"
    );
}

/// Assert the most recent chat message contains `text`.
#[track_caller]
pub fn assert_last_message_contains(harness: &TestHarness, text: &str) {
    let last = harness.last_message();
    assert!(
        last.as_deref().is_some_and(|m| m.contains(text)),
        "Expected last message to contain '{text}', got {last:?}"
    );
}
