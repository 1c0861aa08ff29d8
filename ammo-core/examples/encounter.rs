//! Walk a two-archer party through one encounter.
//!
//! Run with: `RUST_LOG=ammo_core=debug cargo run -p ammo-core --example encounter`

use ammo_core::{AmmoSession, HostEvent, InMemoryHost, InventoryItem, TrackerConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Ammo Tracker Encounter ===\n");

    let host = Arc::new(InMemoryHost::new());
    let (_, legolas) = host.add_player("alice", "Legolas");
    let arrows = host.add_item(legolas, InventoryItem::ammo("Arrows", 20));
    let (_, gimli) = host.add_player("bob", "Gimli");
    let axes = host.add_item(gimli, InventoryItem::ammo("Throwing Axes", 6));

    let mut session = AmmoSession::new(host.clone(), TrackerConfig::from_env()?);
    session.handle(HostEvent::Ready).await?;

    println!("1. Combat starts");
    session.handle(HostEvent::CombatStarted).await?;

    println!("2. Legolas looses 7 arrows, Gimli throws 3 axes");
    host.spend(arrows, 7);
    host.spend(axes, 3);

    println!("3. Combat ends\n");
    session.handle(HostEvent::CombatEnded).await?;
    for message in host.take_messages() {
        println!("{message}");
    }

    println!("4. Legolas recovers ammo\n");
    session
        .handle(HostEvent::RecoverRequested { actor: legolas })
        .await?;
    session
        .handle(HostEvent::RecoverRequested { actor: legolas })
        .await?;
    for message in host.take_messages() {
        println!("{message}");
    }

    println!(
        "Arrows: {:?}, Throwing Axes: {:?}",
        host.quantity(arrows),
        host.quantity(axes)
    );

    session.handle(HostEvent::Shutdown).await?;
    Ok(())
}
