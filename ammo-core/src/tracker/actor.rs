//! Per-actor ammo bookkeeping.

use super::TrackerError;
use crate::chat::{self, ChatMessage};
use crate::config::TrackerConfig;
use crate::flags::FlagKey;
use crate::host::{Host, HostError, HostResult};
use crate::inventory::{Actor, ActorId, InventoryItem, ItemId};
use crate::record::{AmmoRecord, AmmoRecords, RecoveredAmmo, SpentAmmo};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A host call that failed for a single item.
#[derive(Debug)]
pub struct ItemFailure {
    pub item: ItemId,
    pub error: HostError,
}

/// Outcome of a combat-start snapshot.
#[derive(Debug, Default)]
pub struct SnapshotReport {
    /// Items snapshotted and stored, in snapshot order.
    pub tracked: Vec<ItemId>,
    /// Items whose snapshot could not be stored.
    pub failures: Vec<ItemFailure>,
}

/// Outcome of an end-of-combat tally.
#[derive(Debug, Default)]
pub struct EndCombatReport {
    /// Items re-observed and stored, with the quantity they ended on.
    pub observed: Vec<(ItemId, u32)>,
    pub spent: Vec<SpentAmmo>,
    /// Items whose end quantity could not be stored. They are left out of
    /// the spent view until a later tally stores them.
    pub failures: Vec<ItemFailure>,
}

/// Outcome of a recovery.
#[derive(Debug, Default)]
pub struct RecoveryReport {
    pub recovered: Vec<RecoveredAmmo>,
    /// Items that could not be recovered. Their records, flags, and
    /// quantities are as they were.
    pub failures: Vec<ItemFailure>,
}

impl RecoveryReport {
    pub fn total_recovered(&self) -> u32 {
        self.recovered.iter().map(|r| r.amount).sum()
    }

    /// True when there was nothing eligible, as opposed to every attempt failing.
    pub fn nothing_to_recover(&self) -> bool {
        self.recovered.is_empty() && self.failures.is_empty()
    }
}

/// Tracks ammo consumption for a single actor across combats.
///
/// Records are `None` until the first snapshot (or restore) and are replaced
/// at every combat start. A record only changes in memory once its flags
/// have been stored, so [`restore`](Self::restore) after a restart rebuilds
/// exactly what the tracker held.
pub struct ActorAmmoTracker {
    actor: ActorId,
    host: Arc<dyn Host>,
    config: Arc<TrackerConfig>,
    records: Option<AmmoRecords>,
    /// Items whose flags do not yet match their record. They are left out of
    /// the spent view and retried at the next end of combat.
    unsaved: Vec<ItemId>,
}

impl ActorAmmoTracker {
    pub fn new(actor: ActorId, host: Arc<dyn Host>, config: Arc<TrackerConfig>) -> Self {
        Self {
            actor,
            host,
            config,
            records: None,
            unsaved: Vec::new(),
        }
    }

    pub fn actor_id(&self) -> ActorId {
        self.actor
    }

    pub fn records(&self) -> Option<&AmmoRecords> {
        self.records.as_ref()
    }

    pub fn record(&self, item: ItemId) -> Option<&AmmoRecord> {
        self.records.as_ref().and_then(|r| r.get(item))
    }

    /// Items consumed since the last snapshot. Empty before any combat.
    pub fn spent_ammo(&self) -> Vec<SpentAmmo> {
        self.spent_records()
            .filter_map(AmmoRecord::spent_ammo)
            .collect()
    }

    fn spent_records(&self) -> impl Iterator<Item = &AmmoRecord> {
        self.records
            .iter()
            .flat_map(AmmoRecords::iter)
            .filter(|r| !self.unsaved.contains(&r.item))
    }

    /// Snapshot every ammo item the actor carries.
    ///
    /// Each item's start quantity and a provisional end quantity of zero are
    /// written to its flags. An item whose flags cannot be written is still
    /// tracked, and its flags are written again when combat ends.
    pub async fn start_combat(&mut self) -> Result<SnapshotReport, TrackerError> {
        let items = self.ammo_items().await?;
        let previous = self.records.take().unwrap_or_default();
        self.unsaved.clear();

        let host = self.host.as_ref();
        let writes = items.iter().map(|item| {
            let record = AmmoRecord::snapshot(item);
            let before = previous.get(item.id);
            async move {
                let result = write_record(host, &record, before).await;
                (record, result)
            }
        });
        let results = join_all(writes).await;

        let mut records = AmmoRecords::new();
        let mut report = SnapshotReport::default();
        for (record, result) in results {
            match result {
                Ok(()) => report.tracked.push(record.item),
                Err(error) => {
                    warn!(
                        actor = %self.actor,
                        item = %record.item,
                        error = %error,
                        "Ammo snapshot not stored, will retry at end of combat"
                    );
                    self.unsaved.push(record.item);
                    report.failures.push(ItemFailure {
                        item: record.item,
                        error,
                    });
                }
            }
            records.insert(record);
        }

        info!(actor = %self.actor, items = report.tracked.len(), "Ammo snapshot taken");
        self.records = Some(records);
        Ok(report)
    }

    /// Record end quantities and whisper a summary of what was spent.
    ///
    /// Only items still on the actor are re-observed. Anything removed since
    /// the snapshot keeps an end quantity of zero. Calling this again retries
    /// items whose flags could not be stored.
    pub async fn end_combat(&mut self) -> Result<EndCombatReport, TrackerError> {
        let Some(records) = self.records.as_ref() else {
            debug!(actor = %self.actor, "No ammo snapshot, nothing to tally");
            return Ok(EndCombatReport::default());
        };

        let targets: Vec<(ItemId, u32)> = self
            .ammo_items()
            .await?
            .into_iter()
            .filter(|item| records.contains(item.id))
            .map(|item| (item.id, item.quantity))
            .collect();
        let actor = self.resolve_actor().await?;

        let host = self.host.as_ref();
        let unsaved = &self.unsaved;
        let writes = targets.iter().map(|&(item, quantity)| {
            let record = records.get(item).filter(|_| unsaved.contains(&item)).map(|r| AmmoRecord {
                end_quantity: quantity,
                ..r.clone()
            });
            async move {
                let result = match record {
                    Some(record) => write_record(host, &record, None).await,
                    None => host.set_flag(item, FlagKey::EndQuantity, quantity).await,
                };
                (item, quantity, result)
            }
        });
        let results = join_all(writes).await;

        let mut report = EndCombatReport::default();
        for (item, quantity, result) in results {
            match result {
                Ok(()) => {
                    if let Some(record) = self.records.as_mut().and_then(|r| r.get_mut(item)) {
                        record.end_quantity = quantity;
                    }
                    self.unsaved.retain(|id| *id != item);
                    report.observed.push((item, quantity));
                }
                Err(error) => {
                    warn!(
                        actor = %self.actor,
                        item = %item,
                        error = %error,
                        "End quantity not stored, item left out of the tally"
                    );
                    if !self.unsaved.contains(&item) {
                        self.unsaved.push(item);
                    }
                    report.failures.push(ItemFailure { item, error });
                }
            }
        }

        report.spent = self.spent_ammo();
        info!(
            actor = %self.actor,
            observed = report.observed.len(),
            spent = report.spent.len(),
            "Ammo tallied at end of combat"
        );

        if !report.spent.is_empty() {
            self.send(chat::spent_ammo_message(&actor, &report.spent, &self.config))
                .await;
        }

        Ok(report)
    }

    /// Put half of the spent ammo back into the actor's inventory.
    ///
    /// Each recovered record is settled at the new quantity, so calling this
    /// again recovers nothing. Items are independent: a failed update leaves
    /// that item as it was and does not stop the others.
    pub async fn recover_ammo(&mut self) -> Result<RecoveryReport, TrackerError> {
        let actor = self.resolve_actor().await?;
        let spent: Vec<&AmmoRecord> = self.spent_records().filter(|r| r.spent() > 0).collect();
        let eligible: Vec<AmmoRecord> = spent
            .iter()
            .filter(|r| r.recoverable() > 0)
            .map(|r| (*r).clone())
            .collect();

        if eligible.is_empty() {
            debug!(actor = %self.actor, spent = spent.len(), "No recoverable ammo");
            let message = if spent.is_empty() {
                chat::already_recovered_message(&actor, &self.config)
            } else {
                chat::nothing_recoverable_message(&actor, &self.config)
            };
            self.send(message).await;
            return Ok(RecoveryReport::default());
        }

        let current: HashMap<ItemId, u32> = self
            .ammo_items()
            .await?
            .into_iter()
            .map(|item| (item.id, item.quantity))
            .collect();

        let host = self.host.as_ref();
        let attempts = eligible.iter().map(|record| {
            let quantity = current.get(&record.item).copied();
            async move { (record, recover_item(host, record, quantity).await) }
        });
        let outcomes = join_all(attempts).await;

        let mut report = RecoveryReport::default();
        for (record, outcome) in outcomes {
            match outcome {
                Ok(quantity) => {
                    if let Some(r) = self.records.as_mut().and_then(|r| r.get_mut(record.item)) {
                        r.settle(quantity);
                    }
                    report.recovered.push(RecoveredAmmo {
                        item: record.item,
                        name: record.name.clone(),
                        amount: record.recoverable(),
                        quantity,
                    });
                }
                Err(error) => {
                    warn!(
                        actor = %self.actor,
                        item = %record.item,
                        error = %error,
                        "Ammo recovery failed, record kept for retry"
                    );
                    report.failures.push(ItemFailure {
                        item: record.item,
                        error,
                    });
                }
            }
        }

        if report.recovered.is_empty() {
            warn!(actor = %self.actor, failed = report.failures.len(), "No ammo could be recovered");
        } else {
            info!(
                actor = %self.actor,
                items = report.recovered.len(),
                total = report.total_recovered(),
                "Ammo recovered"
            );
            self.send(chat::recovery_message(&actor, &report.recovered))
                .await;
        }

        Ok(report)
    }

    /// Rebuild records from the flags persisted on the actor's items.
    ///
    /// Items without a start quantity flag are left untracked. Returns the
    /// number of records restored.
    pub async fn restore(&mut self) -> Result<usize, TrackerError> {
        let items = self.ammo_items().await?;

        let host = self.host.as_ref();
        let reads = items
            .iter()
            .map(|item| async move { (item.id, read_record(host, item).await) });

        let mut records = AmmoRecords::new();
        for (item, result) in join_all(reads).await {
            match result {
                Ok(Some(record)) => records.insert(record),
                Ok(None) => {}
                Err(error) => {
                    warn!(actor = %self.actor, item = %item, error = %error, "Failed to read ammo flags");
                }
            }
        }

        let restored = records.len();
        debug!(actor = %self.actor, restored, "Ammo records restored from flags");
        self.records = (!records.is_empty()).then_some(records);
        self.unsaved.clear();
        Ok(restored)
    }

    async fn resolve_actor(&self) -> Result<Actor, TrackerError> {
        self.host
            .actor(self.actor)
            .await?
            .ok_or(TrackerError::MissingActor(self.actor))
    }

    async fn ammo_items(&self) -> Result<Vec<InventoryItem>, TrackerError> {
        match self.host.ammo_items(self.actor).await {
            Ok(items) => Ok(items),
            Err(HostError::ActorNotFound(id)) => Err(TrackerError::MissingActor(id)),
            Err(error) => Err(error.into()),
        }
    }

    async fn send(&self, message: ChatMessage) {
        if let Err(error) = self.host.notify(message).await {
            warn!(actor = %self.actor, error = %error, "Failed to deliver ammo message");
        }
    }
}

/// Store both flags of a record, end first.
///
/// An item without a start flag is untracked, so a failed first write leaves
/// nothing half-written. If the start write fails, the end flag is put back
/// to `previous` so the pair never mixes two records.
async fn write_record(
    host: &dyn Host,
    record: &AmmoRecord,
    previous: Option<&AmmoRecord>,
) -> HostResult<()> {
    host.set_flag(record.item, FlagKey::EndQuantity, record.end_quantity)
        .await?;
    if let Err(error) = host
        .set_flag(record.item, FlagKey::StartQuantity, record.start_quantity)
        .await
    {
        if let Some(previous) = previous {
            revert_flag(host, record.item, FlagKey::EndQuantity, previous.end_quantity).await;
        }
        return Err(error);
    }
    Ok(())
}

async fn revert_flag(host: &dyn Host, item: ItemId, key: FlagKey, value: u32) {
    if let Err(error) = host.set_flag(item, key, value).await {
        warn!(item = %item, flag = %key, error = %error, "Failed to roll back ammo flag");
    }
}

/// Add a record's recoverable ammo back onto its stack.
///
/// The settled flags are stored before the quantity changes, so the same
/// ammo can never be offered twice. If the quantity update then fails, the
/// flags are put back to the unsettled record.
async fn recover_item(host: &dyn Host, record: &AmmoRecord, current: Option<u32>) -> HostResult<u32> {
    let current = current.ok_or(HostError::ItemNotFound(record.item))?;
    let quantity = current.saturating_add(record.recoverable());

    let mut settled = record.clone();
    settled.settle(quantity);
    write_record(host, &settled, Some(record)).await?;

    if let Err(error) = host.update_quantity(record.item, quantity).await {
        revert_flag(host, record.item, FlagKey::EndQuantity, record.end_quantity).await;
        revert_flag(host, record.item, FlagKey::StartQuantity, record.start_quantity).await;
        return Err(error);
    }
    Ok(quantity)
}

/// Rebuild a record from an item's flags.
///
/// An end quantity still at the provisional zero while the item holds ammo
/// means the end of combat was never stored, so the current quantity stands
/// in for it.
async fn read_record(host: &dyn Host, item: &InventoryItem) -> HostResult<Option<AmmoRecord>> {
    let Some(start_quantity) = host.read_flag(item.id, FlagKey::StartQuantity).await? else {
        return Ok(None);
    };
    let end_quantity = match host.read_flag(item.id, FlagKey::EndQuantity).await? {
        Some(0) | None => item.quantity,
        Some(end) => end,
    };

    Ok(Some(AmmoRecord {
        item: item.id,
        name: item.name.clone(),
        start_quantity,
        end_quantity,
    }))
}
