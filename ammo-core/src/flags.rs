//! Typed keys for per-item flag storage.
//!
//! The host stores tracker state on each item under a single namespace.
//! Only the keys enumerated here are ever written.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace all tracker flags are stored under.
pub const FLAG_NAMESPACE: &str = "spent-ammo";

/// A flag the tracker persists on an ammo item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlagKey {
    /// Quantity observed when combat started.
    #[serde(rename = "startQuantity")]
    StartQuantity,
    /// Quantity observed when combat ended.
    #[serde(rename = "endQuantity")]
    EndQuantity,
}

impl FlagKey {
    pub const ALL: [FlagKey; 2] = [FlagKey::StartQuantity, FlagKey::EndQuantity];

    /// Key name as stored by the host.
    pub fn as_str(self) -> &'static str {
        match self {
            FlagKey::StartQuantity => "startQuantity",
            FlagKey::EndQuantity => "endQuantity",
        }
    }

    /// Value a read yields when the flag was never written.
    ///
    /// A missing end quantity means the item was never re-observed after the
    /// snapshot, so it counts as fully consumed. A missing start quantity
    /// means the item was never tracked at all.
    pub fn default_value(self) -> Option<u32> {
        match self {
            FlagKey::StartQuantity => None,
            FlagKey::EndQuantity => Some(0),
        }
    }

    /// Apply the default-value policy to a raw stored value.
    pub fn resolve(self, stored: Option<u32>) -> Option<u32> {
        stored.or(self.default_value())
    }
}

impl fmt::Display for FlagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", FLAG_NAMESPACE, self.as_str())
    }
}
