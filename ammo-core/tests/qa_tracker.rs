//! QA tests for per-actor and game-wide ammo tracking.
//!
//! Everything runs against the in-memory host, so no setup is needed.
//! Run with: `cargo test -p ammo-core --test qa_tracker -- --nocapture`

use ammo_core::record::recoverable;
use ammo_core::testing::{assert_flags, assert_last_message_contains, assert_quantity};
use ammo_core::{
    Audience, ChatAction, Fanout, HostError, InventoryItem, ItemKind, Speaker, TestHarness,
    TrackerConfig, TrackerError,
};

/// Install a log subscriber once so `RUST_LOG` works under `--nocapture`.
fn setup() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// =============================================================================
// TEST 1: Snapshot at combat start
// =============================================================================

#[tokio::test]
async fn test_snapshot_records_every_ammo_item() {
    setup();
    let harness = TestHarness::new();
    let (actor, arrows) = harness.add_archer("Legolas", "Arrows", 20);
    let bolts = harness.give(actor, InventoryItem::ammo("Bolts", 10));
    harness.give(actor, InventoryItem::new("Longsword", 1, ItemKind::Weapon));

    let mut tracker = harness.actor_tracker(actor);
    let report = tracker.start_combat().await.expect("start failed");

    assert_eq!(report.tracked, vec![arrows, bolts]);
    assert!(report.failures.is_empty());

    let records = tracker.records().expect("records missing");
    assert_eq!(records.len(), 2);
    for record in records.iter() {
        assert_eq!(record.end_quantity, 0);
    }
    assert_eq!(tracker.record(arrows).unwrap().start_quantity, 20);
    assert_eq!(tracker.record(bolts).unwrap().start_quantity, 10);

    assert_flags(&harness, arrows, 20, 0);
    assert_flags(&harness, bolts, 10, 0);
}

#[tokio::test]
async fn test_second_snapshot_replaces_records() {
    setup();
    let harness = TestHarness::new();
    let (actor, arrows) = harness.add_archer("Legolas", "Arrows", 20);

    let mut tracker = harness.actor_tracker(actor);
    tracker.start_combat().await.unwrap();
    harness.shoot(arrows, 5);

    let bolts = harness.give(actor, InventoryItem::ammo("Bolts", 8));
    tracker.start_combat().await.unwrap();

    assert_eq!(tracker.record(arrows).unwrap().start_quantity, 15);
    assert_eq!(tracker.record(bolts).unwrap().start_quantity, 8);
    assert!(tracker.spent_ammo().is_empty());
}

// =============================================================================
// TEST 2: Diff at combat end
// =============================================================================

#[tokio::test]
async fn test_end_combat_reports_only_spent_items() {
    setup();
    let harness = TestHarness::new();
    let (actor, arrows) = harness.add_archer("Legolas", "Arrows", 20);
    let bolts = harness.give(actor, InventoryItem::ammo("Bolts", 10));

    let mut tracker = harness.actor_tracker(actor);
    tracker.start_combat().await.unwrap();
    harness.shoot(arrows, 6);
    let report = tracker.end_combat().await.expect("end failed");

    assert_eq!(report.observed, vec![(arrows, 14), (bolts, 10)]);
    assert_eq!(report.spent.len(), 1);

    let spent = &report.spent[0];
    assert_eq!(spent.item, arrows);
    assert_eq!(spent.name, "Arrows");
    assert_eq!((spent.start_quantity, spent.end_quantity), (20, 14));
    assert_eq!(spent.spent, 6);
    assert_eq!(spent.recoverable, 3);

    // Unspent bolts are still tracked, just not reported
    assert_flags(&harness, bolts, 10, 10);
    assert_eq!(tracker.spent_ammo(), report.spent);
}

#[tokio::test]
async fn test_nothing_spent_sends_no_message() {
    setup();
    let harness = TestHarness::new();
    let (actor, _) = harness.add_archer("Legolas", "Arrows", 20);

    let mut tracker = harness.actor_tracker(actor);
    tracker.start_combat().await.unwrap();
    let report = tracker.end_combat().await.unwrap();

    assert!(report.spent.is_empty());
    assert!(harness.take_messages().is_empty());
}

#[tokio::test]
async fn test_ammo_gained_mid_combat_is_not_spent() {
    setup();
    let harness = TestHarness::new();
    let (actor, arrows) = harness.add_archer("Legolas", "Arrows", 20);

    let mut tracker = harness.actor_tracker(actor);
    tracker.start_combat().await.unwrap();
    harness.host.set_quantity(arrows, 25);
    tracker.end_combat().await.unwrap();

    assert!(tracker.spent_ammo().is_empty());
    assert_eq!(tracker.record(arrows).unwrap().spent(), 0);
}

// =============================================================================
// TEST 3: Items removed during combat
// =============================================================================

#[tokio::test]
async fn test_removed_item_counts_as_fully_spent() {
    setup();
    let harness = TestHarness::new();
    let (actor, arrows) = harness.add_archer("Legolas", "Arrows", 20);

    let mut tracker = harness.actor_tracker(actor);
    tracker.start_combat().await.unwrap();
    harness.host.remove_item(arrows);

    let report = tracker.end_combat().await.expect("end failed");
    assert!(report.observed.is_empty());
    assert!(report.failures.is_empty());

    let spent = tracker.spent_ammo();
    assert_eq!(spent.len(), 1);
    assert_eq!(spent[0].end_quantity, 0);
    assert_eq!(spent[0].spent, 20);
    assert_eq!(spent[0].recoverable, 10);
}

#[tokio::test]
async fn test_recovering_removed_item_fails_for_that_item() {
    setup();
    let harness = TestHarness::new();
    let (actor, arrows) = harness.add_archer("Legolas", "Arrows", 20);

    let mut tracker = harness.actor_tracker(actor);
    tracker.start_combat().await.unwrap();
    harness.host.remove_item(arrows);
    tracker.end_combat().await.unwrap();

    let report = tracker.recover_ammo().await.expect("recover failed");
    assert!(report.recovered.is_empty());
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(
        report.failures[0].error,
        HostError::ItemNotFound(id) if id == arrows
    ));
    assert!(!report.nothing_to_recover());
}

// =============================================================================
// TEST 4: Rounding
// =============================================================================

#[test]
fn test_recoverable_rounds_down() {
    let expected = [0, 0, 1, 1, 2, 2];
    for (spent, want) in expected.into_iter().enumerate() {
        assert_eq!(recoverable(spent as u32), want, "spent {spent}");
    }
}

#[tokio::test]
async fn test_single_arrow_is_not_recoverable() {
    setup();
    let harness = TestHarness::new();
    let (actor, arrows) = harness.add_archer("Legolas", "Arrows", 20);

    let mut tracker = harness.actor_tracker(actor);
    tracker.start_combat().await.unwrap();
    harness.shoot(arrows, 1);
    tracker.end_combat().await.unwrap();

    let spent = tracker.spent_ammo();
    assert_eq!(spent[0].spent, 1);
    assert_eq!(spent[0].recoverable, 0);

    let report = tracker.recover_ammo().await.unwrap();
    assert!(report.nothing_to_recover());
    assert_quantity(&harness, arrows, 19);
    assert_last_message_contains(&harness, "Too little ammo was spent");
}

// =============================================================================
// TEST 5: Unspent items are excluded
// =============================================================================

#[tokio::test]
async fn test_spent_view_excludes_unspent() {
    setup();
    let harness = TestHarness::new();
    let (actor, arrows) = harness.add_archer("Legolas", "Arrows", 20);
    let bolts = harness.give(actor, InventoryItem::ammo("Bolts", 10));
    let stones = harness.give(actor, InventoryItem::ammo("Sling Stones", 30));

    let mut tracker = harness.actor_tracker(actor);
    tracker.start_combat().await.unwrap();
    harness.shoot(arrows, 4);
    harness.shoot(stones, 9);
    tracker.end_combat().await.unwrap();

    let spent: Vec<_> = tracker.spent_ammo().into_iter().map(|s| s.item).collect();
    assert_eq!(spent, vec![arrows, stones]);
    assert!(!spent.contains(&bolts));
}

// =============================================================================
// TEST 6: Recovery is idempotent
// =============================================================================

#[tokio::test]
async fn test_second_recovery_recovers_nothing() {
    setup();
    let harness = TestHarness::new();
    let (actor, arrows) = harness.add_archer("Legolas", "Arrows", 20);

    let mut tracker = harness.actor_tracker(actor);
    tracker.start_combat().await.unwrap();
    harness.shoot(arrows, 6);
    tracker.end_combat().await.unwrap();

    let first = tracker.recover_ammo().await.unwrap();
    assert_eq!(first.total_recovered(), 3);
    assert_quantity(&harness, arrows, 17);
    assert_flags(&harness, arrows, 17, 17);

    let second = tracker.recover_ammo().await.unwrap();
    assert!(second.nothing_to_recover());
    assert_eq!(second.total_recovered(), 0);
    assert_quantity(&harness, arrows, 17);

    let messages = harness.take_messages();
    let notice = messages.last().expect("no notice sent");
    assert!(notice.is_whisper());
    assert_eq!(notice.content(), "You already recovered this ammo.");
}

// =============================================================================
// TEST 7: Items recover independently
// =============================================================================

#[tokio::test]
async fn test_failed_item_does_not_block_others() {
    setup();
    let harness = TestHarness::new();
    let (actor, arrows) = harness.add_archer("Legolas", "Arrows", 20);
    let bolts = harness.give(actor, InventoryItem::ammo("Bolts", 10));

    let mut tracker = harness.actor_tracker(actor);
    tracker.start_combat().await.unwrap();
    harness.shoot(arrows, 6);
    harness.shoot(bolts, 4);
    tracker.end_combat().await.unwrap();

    harness.host.fail_quantity_updates(bolts);
    let report = tracker.recover_ammo().await.expect("recover failed");

    assert_eq!(report.recovered.len(), 1);
    assert_eq!(report.recovered[0].item, arrows);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].item, bolts);
    assert!(matches!(
        report.failures[0].error,
        HostError::Persistence { item, .. } if item == bolts
    ));

    assert_quantity(&harness, arrows, 17);
    assert_quantity(&harness, bolts, 6);

    // The failed record is untouched and still recoverable
    let bolt_record = tracker.record(bolts).unwrap();
    assert_eq!((bolt_record.start_quantity, bolt_record.end_quantity), (10, 6));
    assert_flags(&harness, bolts, 10, 6);
    assert_last_message_contains(&harness, "3x Arrows recovered");

    harness.host.clear_failures();
    let retry = tracker.recover_ammo().await.unwrap();
    assert_eq!(retry.recovered.len(), 1);
    assert_eq!(retry.recovered[0].item, bolts);
    assert_quantity(&harness, bolts, 8);
    assert_quantity(&harness, arrows, 17);
}

#[tokio::test]
async fn test_recovery_survives_flag_failure_and_restart() {
    setup();
    let harness = TestHarness::new();
    let (actor, arrows) = harness.add_archer("Legolas", "Arrows", 20);

    {
        let mut tracker = harness.actor_tracker(actor);
        tracker.start_combat().await.unwrap();
        harness.shoot(arrows, 6);
        tracker.end_combat().await.unwrap();

        harness.host.fail_flag_writes(arrows);
        let report = tracker.recover_ammo().await.unwrap();
        assert!(report.recovered.is_empty());
        assert_eq!(report.failures.len(), 1);
        assert_quantity(&harness, arrows, 14);
        assert_flags(&harness, arrows, 20, 14);
    }
    harness.host.clear_failures();

    let mut tracker = harness.actor_tracker(actor);
    tracker.restore().await.unwrap();
    let report = tracker.recover_ammo().await.unwrap();
    assert_eq!(report.total_recovered(), 3);
    assert_quantity(&harness, arrows, 17);
    assert_flags(&harness, arrows, 17, 17);

    let mut tracker = harness.actor_tracker(actor);
    tracker.restore().await.unwrap();
    assert!(tracker.recover_ammo().await.unwrap().nothing_to_recover());
    assert_quantity(&harness, arrows, 17);
}

#[tokio::test]
async fn test_quantity_failure_keeps_flags_across_restart() {
    setup();
    let harness = TestHarness::new();
    let (actor, arrows) = harness.add_archer("Legolas", "Arrows", 20);

    {
        let mut tracker = harness.actor_tracker(actor);
        tracker.start_combat().await.unwrap();
        harness.shoot(arrows, 6);
        tracker.end_combat().await.unwrap();

        harness.host.fail_quantity_updates(arrows);
        let report = tracker.recover_ammo().await.unwrap();
        assert_eq!(report.failures.len(), 1);
        assert_flags(&harness, arrows, 20, 14);
    }
    harness.host.clear_failures();

    let mut tracker = harness.actor_tracker(actor);
    tracker.restore().await.unwrap();
    tracker.recover_ammo().await.unwrap();
    assert_quantity(&harness, arrows, 17);
}

#[tokio::test]
async fn test_end_flag_failure_then_restart() {
    setup();
    let harness = TestHarness::new();
    let (actor, arrows) = harness.add_archer("Legolas", "Arrows", 20);

    {
        let mut tracker = harness.actor_tracker(actor);
        tracker.start_combat().await.unwrap();
        harness.shoot(arrows, 2);

        harness.host.fail_flag_writes(arrows);
        let report = tracker.end_combat().await.unwrap();
        assert_eq!(report.failures.len(), 1);
        assert!(report.spent.is_empty());
        assert!(tracker.spent_ammo().is_empty());
        assert!(harness.take_messages().is_empty());
    }
    harness.host.clear_failures();

    let mut tracker = harness.actor_tracker(actor);
    tracker.restore().await.unwrap();
    let report = tracker.recover_ammo().await.unwrap();
    assert_eq!(report.total_recovered(), 1);
    assert_quantity(&harness, arrows, 19);
}

#[tokio::test]
async fn test_end_flag_failure_is_retried_by_next_end() {
    setup();
    let harness = TestHarness::new();
    let (actor, arrows) = harness.add_archer("Legolas", "Arrows", 20);

    {
        let mut tracker = harness.actor_tracker(actor);
        tracker.start_combat().await.unwrap();
        harness.shoot(arrows, 2);

        harness.host.fail_flag_writes(arrows);
        tracker.end_combat().await.unwrap();
        harness.host.clear_failures();

        let report = tracker.end_combat().await.unwrap();
        assert!(report.failures.is_empty());
        assert_flags(&harness, arrows, 20, 18);
        assert_last_message_contains(&harness, "Arrows: 20 -> 18");
    }

    let mut tracker = harness.actor_tracker(actor);
    tracker.restore().await.unwrap();
    tracker.recover_ammo().await.unwrap();
    assert_quantity(&harness, arrows, 19);
}

#[tokio::test]
async fn test_start_flag_failure_then_restart() {
    setup();
    let harness = TestHarness::new();
    let (actor, arrows) = harness.add_archer("Legolas", "Arrows", 20);

    {
        let mut tracker = harness.actor_tracker(actor);
        tracker.start_combat().await.unwrap();
        harness.shoot(arrows, 4);
        tracker.end_combat().await.unwrap();

        harness.host.fail_flag_writes(arrows);
        let report = tracker.start_combat().await.unwrap();
        assert_eq!(report.failures.len(), 1);
        harness.host.clear_failures();

        harness.shoot(arrows, 6);
        tracker.end_combat().await.unwrap();
        assert_flags(&harness, arrows, 16, 10);
    }

    let mut tracker = harness.actor_tracker(actor);
    tracker.restore().await.unwrap();
    let report = tracker.recover_ammo().await.unwrap();
    assert_eq!(report.total_recovered(), 3);
    assert_quantity(&harness, arrows, 13);
}

#[tokio::test]
async fn test_fresh_item_with_failed_snapshot_is_not_restored() {
    setup();
    let harness = TestHarness::new();
    let (actor, arrows) = harness.add_archer("Legolas", "Arrows", 20);

    {
        let mut tracker = harness.actor_tracker(actor);
        harness.host.fail_flag_writes(arrows);
        tracker.start_combat().await.unwrap();
        harness.shoot(arrows, 6);
    }
    harness.host.clear_failures();

    let mut tracker = harness.actor_tracker(actor);
    assert_eq!(tracker.restore().await.unwrap(), 0);
    assert!(tracker.recover_ammo().await.unwrap().nothing_to_recover());
    assert_quantity(&harness, arrows, 14);
}

// =============================================================================
// TEST 8: Fan-out isolation
// =============================================================================

async fn check_fanout_isolation(fanout: Fanout) {
    let harness = TestHarness::with_config(TrackerConfig::default().with_fanout(fanout));
    let (legolas, arrows) = harness.add_archer("Legolas", "Arrows", 20);
    let (gimli, axes) = harness.add_archer("Gimli", "Throwing Axes", 4);
    let ghost = harness.host.add_actor("Ghost");

    let game = harness.game_tracker([legolas, ghost, gimli]);
    harness.host.remove_actor(ghost);

    let started = game.start_combat().await;
    assert_eq!(started.len(), 3);
    assert!(started[0].is_ok());
    assert!(matches!(
        started[1].result,
        Err(TrackerError::MissingActor(id)) if id == ghost
    ));
    assert!(started[2].is_ok());

    harness.shoot(arrows, 6);
    harness.shoot(axes, 2);

    // The ghost never took a snapshot, so ending combat is a no-op for it
    let ended = game.end_combat().await;
    assert_eq!(ended.len(), 3);
    assert!(ended.iter().all(|o| o.is_ok()));

    assert_eq!(game.spent_ammo(legolas).await.unwrap()[0].spent, 6);
    assert_eq!(game.spent_ammo(gimli).await.unwrap()[0].spent, 2);
    assert_eq!(harness.take_messages().len(), 2);
}

#[tokio::test]
async fn test_fanout_isolation_concurrent() {
    setup();
    check_fanout_isolation(Fanout::Concurrent).await;
}

#[tokio::test]
async fn test_fanout_isolation_sequential() {
    setup();
    check_fanout_isolation(Fanout::Sequential).await;
}

#[tokio::test]
async fn test_actor_without_ammo_is_harmless() {
    setup();
    let harness = TestHarness::new();
    let (legolas, arrows) = harness.add_archer("Legolas", "Arrows", 20);
    let (_, frodo) = harness.host.add_player("bob", "Frodo");

    let game = harness.game_tracker([frodo, legolas]);
    game.start_combat().await;
    harness.shoot(arrows, 2);
    let ended = game.end_combat().await;

    assert!(ended.iter().all(|o| o.is_ok()));
    assert!(game.spent_ammo(frodo).await.unwrap().is_empty());
    assert_eq!(harness.take_messages().len(), 1);
}

#[tokio::test]
async fn test_recover_routes_to_actor() {
    setup();
    let harness = TestHarness::new();
    let (legolas, arrows) = harness.add_archer("Legolas", "Arrows", 20);
    let (gimli, axes) = harness.add_archer("Gimli", "Throwing Axes", 4);

    let game = harness.game_tracker([legolas, gimli]);
    game.start_combat().await;
    harness.shoot(arrows, 6);
    harness.shoot(axes, 4);
    game.end_combat().await;

    game.recover_ammo(gimli).await.unwrap();
    assert_quantity(&harness, axes, 2);
    assert_quantity(&harness, arrows, 14);

    let stranger = harness.host.add_actor("Stranger");
    assert!(matches!(
        game.recover_ammo(stranger).await,
        Err(TrackerError::UnknownActor(id)) if id == stranger
    ));
}

// =============================================================================
// TEST 9: End-to-end Arrows scenario
// =============================================================================

#[tokio::test]
async fn test_arrows_scenario() {
    setup();
    let harness = TestHarness::new();
    let (actor, arrows) = harness.add_archer("Legolas", "Arrows", 20);
    let owners = harness.host.actors()[0].owners.clone();

    let mut tracker = harness.actor_tracker(actor);
    tracker.start_combat().await.unwrap();
    harness.shoot(arrows, 6);
    tracker.end_combat().await.unwrap();

    let summary = harness.take_messages().pop().expect("no summary sent");
    assert_eq!(summary.speaker, Speaker::Alias("Ammo Tracker".to_string()));
    assert_eq!(summary.audience, Audience::Whisper(owners));
    assert_eq!(
        summary.lines,
        vec!["Arrows: 20 -> 14", "Spent: 6", "Recoverable: 3"]
    );
    assert_eq!(
        summary.actions,
        vec![ChatAction::RecoverAmmo {
            actor,
            label: "Recover Ammo".to_string(),
        }]
    );

    tracker.recover_ammo().await.unwrap();
    assert_quantity(&harness, arrows, 17);

    let announcement = harness.take_messages().pop().expect("no announcement");
    assert_eq!(announcement.audience, Audience::Public);
    assert!(matches!(announcement.speaker, Speaker::Actor { id, .. } if id == actor));
    assert_eq!(
        announcement.lines,
        vec!["Legolas spends a minute recovering ammo", "3x Arrows recovered"]
    );

    tracker.recover_ammo().await.unwrap();
    assert_quantity(&harness, arrows, 17);
    assert_last_message_contains(&harness, "already recovered");
}

#[tokio::test]
async fn test_summary_separates_items_with_divider() {
    setup();
    let config = TrackerConfig::default()
        .with_divider("~~~")
        .with_speaker_alias("Quartermaster");
    let harness = TestHarness::with_config(config);
    let (actor, arrows) = harness.add_archer("Legolas", "Arrows", 20);
    let bolts = harness.give(actor, InventoryItem::ammo("Bolts", 10));

    let mut tracker = harness.actor_tracker(actor);
    tracker.start_combat().await.unwrap();
    harness.shoot(arrows, 5);
    harness.shoot(bolts, 5);
    tracker.end_combat().await.unwrap();

    let summary = harness.take_messages().pop().unwrap();
    assert_eq!(summary.speaker, Speaker::Alias("Quartermaster".to_string()));
    assert_eq!(
        summary.lines,
        vec![
            "Arrows: 20 -> 15",
            "Spent: 5",
            "Recoverable: 2",
            "~~~",
            "Bolts: 10 -> 5",
            "Spent: 5",
            "Recoverable: 2",
        ]
    );
}
