//! Line-oriented driver for the ammo tracker.
//!
//! Each input line is one command. Host events go through an
//! [`AmmoSession`]; every chat message the in-memory host receives is
//! printed as it arrives.

use ammo_core::{
    load_host, save_host, ActorId, AmmoSession, EventOutcome, FlagKey, HostEvent, InMemoryHost,
    InventoryItem, ItemKind, TrackerConfig,
};
use std::error::Error;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Paths the driver works with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessConfig {
    pub world: PathBuf,
    pub script: Option<PathBuf>,
}

impl HeadlessConfig {
    /// Parse `<world> [script]`. Returns `None` without a world path.
    pub fn from_args(args: &[String]) -> Option<Self> {
        let mut positional = args.iter().filter(|a| !a.starts_with('-'));
        let world = PathBuf::from(positional.next()?);
        let script = positional.next().map(PathBuf::from);
        Some(Self { world, script })
    }
}

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ready,
    Start,
    End,
    Spend {
        actor: String,
        item: String,
        amount: u32,
    },
    Recover {
        actor: String,
    },
    Status,
    Save,
    Help,
    Quit,
}

/// Parse one line. Blank lines and `#` comments yield `Ok(None)`.
///
/// Item names may contain spaces: `spend Gimli Throwing Axes 2`.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let parts: Vec<&str> = line.split_whitespace().collect();
    let command = match parts.as_slice() {
        ["ready"] => Command::Ready,
        ["start"] => Command::Start,
        ["end"] => Command::End,
        ["status"] => Command::Status,
        ["save"] => Command::Save,
        ["help"] => Command::Help,
        ["quit"] | ["exit"] => Command::Quit,
        ["recover", actor] => Command::Recover {
            actor: actor.to_string(),
        },
        ["spend", actor, item @ .., amount] if !item.is_empty() => {
            let amount = amount
                .parse()
                .map_err(|_| format!("Invalid amount: {amount}"))?;
            Command::Spend {
                actor: actor.to_string(),
                item: item.join(" "),
                amount,
            }
        }
        ["spend", ..] => return Err("Usage: spend <actor> <item> <n>".to_string()),
        ["recover", ..] => return Err("Usage: recover <actor>".to_string()),
        _ => return Err(format!("Unknown command: {line}. Type help for help.")),
    };
    Ok(Some(command))
}

/// A small party used when the world file does not exist yet.
pub fn demo_world() -> InMemoryHost {
    let host = InMemoryHost::new();

    let (_, legolas) = host.add_player("alice", "Legolas");
    host.add_item(legolas, InventoryItem::ammo("Arrows", 20));
    host.add_item(legolas, InventoryItem::new("Longbow", 1, ItemKind::Weapon));

    let (_, gimli) = host.add_player("bob", "Gimli");
    host.add_item(gimli, InventoryItem::ammo("Throwing Axes", 6));
    host.add_item(gimli, InventoryItem::new("Battleaxe", 1, ItemKind::Weapon));

    let (_, pippin) = host.add_player("carol", "Pippin");
    host.add_item(pippin, InventoryItem::ammo("Sling Stones", 30));
    host.add_item(pippin, InventoryItem::new("Rations", 5, ItemKind::Adventuring));

    host
}

/// Run the driver until `quit` or end of input, then save the world.
pub async fn run_headless(config: HeadlessConfig) -> Result<(), Box<dyn Error>> {
    let host = if config.world.exists() {
        let host = load_host(&config.world).await?;
        info!(path = %config.world.display(), actors = host.actors().len(), "World loaded");
        println!("[LOADED] World loaded from {}", config.world.display());
        host
    } else {
        println!("[NEW] Demo party created, will save to {}", config.world.display());
        demo_world()
    };
    let host = Arc::new(host);

    let tracker_config = TrackerConfig::from_env()?;
    let mut session = AmmoSession::new(host.clone(), tracker_config);

    let input: Box<dyn BufRead> = match &config.script {
        Some(path) => Box::new(BufReader::new(std::fs::File::open(path)?)),
        None => Box::new(io::stdin().lock()),
    };
    let mut stdout = io::stdout();

    for line in input.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!(error = %e, "Failed to read input, stopping");
                eprintln!("Error reading input: {e}");
                break;
            }
        };

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                debug!(line = line.trim(), error = %e, "Rejected input line");
                println!("[ERROR] {e}");
                continue;
            }
        };

        println!("> {}", line.trim());
        if command == Command::Quit {
            break;
        }
        execute(&host, &mut session, &config, command).await;
        stdout.flush().ok();
    }

    session.shutdown();
    save_host(&host, &config.world).await?;
    info!(path = %config.world.display(), "World saved on exit");
    println!("[SAVED] World saved to {}", config.world.display());
    Ok(())
}

async fn execute(
    host: &InMemoryHost,
    session: &mut AmmoSession,
    config: &HeadlessConfig,
    command: Command,
) {
    debug!(?command, "Executing command");
    let event = match command {
        Command::Ready => HostEvent::Ready,
        Command::Start => HostEvent::CombatStarted,
        Command::End => HostEvent::CombatEnded,
        Command::Recover { actor } => match find_actor(host, &actor) {
            Some(actor) => HostEvent::RecoverRequested { actor },
            None => return,
        },
        Command::Spend {
            actor,
            item,
            amount,
        } => {
            spend(host, &actor, &item, amount);
            return;
        }
        Command::Status => {
            print_status(host);
            return;
        }
        Command::Save => {
            match save_host(host, &config.world).await {
                Ok(()) => println!("[SAVED] World saved to {}", config.world.display()),
                Err(e) => {
                    warn!(path = %config.world.display(), error = %e, "Save failed");
                    println!("[ERROR] Save failed: {e}");
                }
            }
            return;
        }
        Command::Help => {
            println!("[HELP] ready, start, end, spend <actor> <item> <n>, recover <actor>, status, save, quit");
            return;
        }
        Command::Quit => return,
    };

    match session.handle(event).await {
        Ok(outcome) => print_outcome(&outcome),
        Err(e) => {
            warn!(error = %e, "Host event failed");
            println!("[ERROR] {e}");
        }
    }

    for message in host.take_messages() {
        print!("{message}");
    }
}

fn find_actor(host: &InMemoryHost, name: &str) -> Option<ActorId> {
    let actor = host.find_actor(name);
    if actor.is_none() {
        println!("[ERROR] No actor named {name}");
    }
    actor
}

fn spend(host: &InMemoryHost, actor: &str, item: &str, amount: u32) {
    let Some(actor_id) = find_actor(host, actor) else {
        return;
    };
    let Some(item_id) = host.find_item(actor_id, item) else {
        println!("[ERROR] {actor} carries no {item}");
        return;
    };

    let spent = host.spend(item_id, amount);
    let left = host.quantity(item_id).unwrap_or_default();
    println!("[SPEND] {actor} uses {spent}x {item}, {left} left");
}

fn print_outcome(outcome: &EventOutcome) {
    match outcome {
        EventOutcome::Initialized { actors, restored } => {
            println!("[READY] Tracking {actors} actor(s), {restored} record(s) restored");
        }
        EventOutcome::CombatStarted(outcomes) => {
            let tracked: usize = outcomes
                .iter()
                .filter_map(|o| o.result.as_ref().ok())
                .map(|r| r.tracked.len())
                .sum();
            println!("[COMBAT] Snapshot of {tracked} ammo stack(s)");
            print_skipped(outcomes.iter().map(|o| (o.actor, o.result.as_ref().err())));
        }
        EventOutcome::CombatEnded(outcomes) => {
            println!("[COMBAT] Ended");
            print_skipped(outcomes.iter().map(|o| (o.actor, o.result.as_ref().err())));
        }
        EventOutcome::Recovered(report) => {
            for failure in &report.failures {
                println!("[ERROR] Could not recover {}: {}", failure.item, failure.error);
            }
        }
        EventOutcome::Closed => println!("[CLOSED]"),
    }
}

fn print_skipped<'a, E: std::fmt::Display + 'a>(
    outcomes: impl Iterator<Item = (ActorId, Option<&'a E>)>,
) {
    for (actor, error) in outcomes {
        if let Some(error) = error {
            println!("[SKIPPED] {actor}: {error}");
        }
    }
}

fn print_status(host: &InMemoryHost) {
    println!("[STATUS]");
    for actor in host.actors() {
        println!("  {}", actor.name);
        for item in host.inventory(actor.id).iter().filter(|i| i.is_ammo()) {
            let flag = |key| {
                host.flag(item.id, key)
                    .map_or_else(|| "-".to_string(), |v| v.to_string())
            };
            println!(
                "    {}: {} (start {}, end {})",
                item.name,
                item.quantity,
                flag(FlagKey::StartQuantity),
                flag(FlagKey::EndQuantity)
            );
        }
    }
}
