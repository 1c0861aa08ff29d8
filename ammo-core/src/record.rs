//! Ammo records: the start/end snapshot kept for each tracked item.

use crate::inventory::{InventoryItem, ItemId};
use serde::{Deserialize, Serialize};

/// Amount of spent ammunition assumed salvageable after a fight.
///
/// Half of what was spent, rounded down: 5 spent gives 2 back.
pub fn recoverable(spent: u32) -> u32 {
    spent / 2
}

/// Start and end quantities of one ammo item across a combat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmmoRecord {
    pub item: ItemId,
    /// Item name at snapshot time, kept for items removed mid-combat.
    pub name: String,
    pub start_quantity: u32,
    /// Zero until the item is re-observed at combat end.
    pub end_quantity: u32,
}

impl AmmoRecord {
    /// Snapshot an item at combat start.
    pub fn snapshot(item: &InventoryItem) -> Self {
        Self {
            item: item.id,
            name: item.name.clone(),
            start_quantity: item.quantity,
            end_quantity: 0,
        }
    }

    pub fn spent(&self) -> u32 {
        self.start_quantity.saturating_sub(self.end_quantity)
    }

    pub fn recoverable(&self) -> u32 {
        recoverable(self.spent())
    }

    /// Reset both snapshots to `quantity`, leaving nothing spent.
    pub fn settle(&mut self, quantity: u32) {
        self.start_quantity = quantity;
        self.end_quantity = quantity;
    }

    /// The spent view of this record, or `None` if nothing was spent.
    pub fn spent_ammo(&self) -> Option<SpentAmmo> {
        let spent = self.spent();
        if spent == 0 {
            return None;
        }
        Some(SpentAmmo {
            item: self.item,
            name: self.name.clone(),
            start_quantity: self.start_quantity,
            end_quantity: self.end_quantity,
            spent,
            recoverable: recoverable(spent),
        })
    }
}

/// Derived view of a record whose item was consumed during combat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpentAmmo {
    pub item: ItemId,
    pub name: String,
    pub start_quantity: u32,
    pub end_quantity: u32,
    pub spent: u32,
    pub recoverable: u32,
}

/// Ammunition returned to an actor's inventory by a recovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveredAmmo {
    pub item: ItemId,
    pub name: String,
    /// How many were added back.
    pub amount: u32,
    /// Quantity after the recovery was applied.
    pub quantity: u32,
}

/// One actor's records, in snapshot order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmmoRecords {
    records: Vec<AmmoRecord>,
}

impl AmmoRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, replacing any existing record for the same item.
    pub fn insert(&mut self, record: AmmoRecord) {
        match self.get_mut(record.item) {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }

    pub fn get(&self, item: ItemId) -> Option<&AmmoRecord> {
        self.records.iter().find(|r| r.item == item)
    }

    pub fn get_mut(&mut self, item: ItemId) -> Option<&mut AmmoRecord> {
        self.records.iter_mut().find(|r| r.item == item)
    }

    pub fn contains(&self, item: ItemId) -> bool {
        self.get(item).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AmmoRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records with a positive spend. Recomputed on every call.
    pub fn spent_ammo(&self) -> Vec<SpentAmmo> {
        self.records.iter().filter_map(AmmoRecord::spent_ammo).collect()
    }
}

impl FromIterator<AmmoRecord> for AmmoRecords {
    fn from_iter<I: IntoIterator<Item = AmmoRecord>>(iter: I) -> Self {
        let mut records = Self::new();
        for record in iter {
            records.insert(record);
        }
        records
    }
}
