//! QA tests for the session lifecycle and event routing.
//!
//! Run with: `cargo test -p ammo-core --test qa_session -- --nocapture`

use ammo_core::testing::assert_quantity;
use ammo_core::{
    AmmoSession, ChatAction, EventOutcome, HostEvent, SessionError, TestHarness, TrackerConfig,
    User,
};

fn setup() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[tokio::test]
async fn test_combat_events_rejected_before_ready() {
    setup();
    let harness = TestHarness::new();
    let (actor, _) = harness.add_archer("Legolas", "Arrows", 20);
    let mut session = AmmoSession::new(harness.shared_host(), TrackerConfig::default());

    for event in [
        HostEvent::CombatStarted,
        HostEvent::CombatEnded,
        HostEvent::RecoverRequested { actor },
    ] {
        assert!(matches!(
            session.handle(event).await,
            Err(SessionError::NotReady)
        ));
    }
    assert!(harness.take_messages().is_empty());
}

#[tokio::test]
async fn test_combat_events_rejected_after_shutdown() {
    setup();
    let harness = TestHarness::new();
    let (actor, arrows) = harness.add_archer("Legolas", "Arrows", 20);
    let mut session = AmmoSession::new(harness.shared_host(), TrackerConfig::default());

    session.handle(HostEvent::Ready).await.unwrap();
    session.handle(HostEvent::CombatStarted).await.unwrap();
    harness.shoot(arrows, 6);
    session.handle(HostEvent::Shutdown).await.unwrap();
    assert!(session.is_closed());

    assert!(matches!(
        session.handle(HostEvent::CombatEnded).await,
        Err(SessionError::Closed)
    ));
    assert!(matches!(
        session.handle(HostEvent::RecoverRequested { actor }).await,
        Err(SessionError::Closed)
    ));
    assert_quantity(&harness, arrows, 14);
}

#[tokio::test]
async fn test_ready_skips_game_master_and_unassigned_users() {
    setup();
    let harness = TestHarness::new();
    let (legolas, _) = harness.add_archer("Legolas", "Arrows", 20);
    let npc = harness.host.add_actor("Innkeeper");
    harness.host.add_user(User::game_master("dm").with_character(npc));
    harness.host.add_user(User::player("spectator"));
    harness.host.add_user(User::player("co-pilot").with_character(legolas));

    let mut session = AmmoSession::new(harness.shared_host(), TrackerConfig::default());
    session.handle(HostEvent::Ready).await.unwrap();

    assert_eq!(session.tracker().unwrap().actors(), vec![legolas]);
}

#[tokio::test]
async fn test_explicit_actor_list() {
    setup();
    let harness = TestHarness::new();
    let (_, arrows) = harness.add_archer("Legolas", "Arrows", 20);
    let npc = harness.host.add_actor("Bandit Archer");
    let bandit_arrows = harness.give(npc, ammo_core::InventoryItem::ammo("Arrows", 12));

    let mut session =
        AmmoSession::new(harness.shared_host(), TrackerConfig::default()).with_actors(vec![npc]);
    session.handle(HostEvent::Ready).await.unwrap();
    session.handle(HostEvent::CombatStarted).await.unwrap();
    harness.shoot(arrows, 4);
    harness.shoot(bandit_arrows, 4);

    match session.handle(HostEvent::CombatEnded).await.unwrap() {
        EventOutcome::CombatEnded(outcomes) => {
            assert_eq!(outcomes.len(), 1);
            assert_eq!(outcomes[0].actor, npc);
        }
        other => panic!("Expected combat end, got {other:?}"),
    }
    assert_eq!(harness.take_messages().len(), 1);
}

#[tokio::test]
async fn test_recover_button_drives_recovery() {
    setup();
    let harness = TestHarness::new();
    let (_, arrows) = harness.add_archer("Legolas", "Arrows", 20);

    let mut session = AmmoSession::new(harness.shared_host(), TrackerConfig::default());
    session.handle(HostEvent::Ready).await.unwrap();
    session.handle(HostEvent::CombatStarted).await.unwrap();
    harness.shoot(arrows, 10);
    session.handle(HostEvent::CombatEnded).await.unwrap();

    let summary = harness.take_messages().pop().expect("no summary");
    let button: &ChatAction = summary.actions.first().expect("no recover button");
    assert_eq!(button.label(), "Recover Ammo");

    session.handle(HostEvent::from(button)).await.unwrap();
    assert_quantity(&harness, arrows, 15);

    session.handle(HostEvent::from(button)).await.unwrap();
    assert_quantity(&harness, arrows, 15);
}

#[tokio::test]
async fn test_ready_twice_rebuilds_from_flags() {
    setup();
    let harness = TestHarness::new();
    let (_, arrows) = harness.add_archer("Legolas", "Arrows", 20);

    let mut session = AmmoSession::new(harness.shared_host(), TrackerConfig::default());
    session.handle(HostEvent::Ready).await.unwrap();
    session.handle(HostEvent::CombatStarted).await.unwrap();
    harness.shoot(arrows, 2);

    let outcome = session.handle(HostEvent::Ready).await.unwrap();
    assert!(matches!(
        outcome,
        EventOutcome::Initialized { restored: 1, .. }
    ));

    session.handle(HostEvent::CombatEnded).await.unwrap();
    let summary = harness.take_messages().pop().unwrap();
    assert_eq!(summary.lines[0], "Arrows: 20 -> 18");
}
