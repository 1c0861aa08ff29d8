//! Host-side inventory types.
//!
//! Actors, users, and the items they carry are owned by the host platform.
//! The tracker only ever holds identifiers and reads quantities through the
//! [`host`](crate::host) traits.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for actors (player characters).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub Uuid);

impl ActorId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ActorId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Unique identifier for inventory items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for connected users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Items
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Weapon,
    Armor,
    Ammunition,
    Potion,
    Scroll,
    Adventuring,
    Tool,
    Other,
}

impl ItemKind {
    /// Whether items of this kind are tracked as ammunition.
    pub fn is_ammo(self) -> bool {
        matches!(self, ItemKind::Ammunition)
    }
}

/// Inventory item as exposed by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    pub name: String,
    pub quantity: u32,
    pub kind: ItemKind,
}

impl InventoryItem {
    pub fn new(name: impl Into<String>, quantity: u32, kind: ItemKind) -> Self {
        Self {
            id: ItemId::new(),
            name: name.into(),
            quantity,
            kind,
        }
    }

    /// Shorthand for a stack of ammunition.
    pub fn ammo(name: impl Into<String>, quantity: u32) -> Self {
        Self::new(name, quantity, ItemKind::Ammunition)
    }

    pub fn is_ammo(&self) -> bool {
        self.kind.is_ammo()
    }
}

// ============================================================================
// Actors and Users
// ============================================================================

/// A character whose ammunition can be tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
    /// Users who control this actor and receive its whispers.
    #[serde(default)]
    pub owners: Vec<UserId>,
}

impl Actor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ActorId::new(),
            name: name.into(),
            owners: Vec::new(),
        }
    }
}

/// A user connected to the game session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// The player character assigned to this user, if any.
    pub character: Option<ActorId>,
    /// Game masters are never tracked as players.
    #[serde(default)]
    pub is_gm: bool,
}

impl User {
    pub fn player(name: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            name: name.into(),
            character: None,
            is_gm: false,
        }
    }

    pub fn game_master(name: impl Into<String>) -> Self {
        Self {
            is_gm: true,
            ..Self::player(name)
        }
    }

    pub fn with_character(mut self, actor: ActorId) -> Self {
        self.character = Some(actor);
        self
    }
}
