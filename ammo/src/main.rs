//! Spent-ammo tracker driver.
//!
//! Replays combat events against a world file and prints every chat message
//! the tracker sends. Commands are read one per line from a script file, or
//! from stdin when no script is given:
//!
//! ```bash
//! cargo run -p ammo -- world.json encounter.txt
//! ```

mod headless;

use headless::HeadlessConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let Some(config) = HeadlessConfig::from_args(&args) else {
        print_help();
        std::process::exit(2);
    };

    headless::run_headless(config).await
}

fn print_help() {
    println!("ammo - spent-ammo tracker for tabletop combat");
    println!();
    println!("USAGE:");
    println!("  ammo <WORLD> [SCRIPT]");
    println!();
    println!("ARGS:");
    println!("  <WORLD>    World file to load and save (a demo party is created if missing)");
    println!("  [SCRIPT]   Command file to replay (default: read stdin)");
    println!();
    println!("COMMANDS:");
    println!("  ready                      Host data loaded, start tracking");
    println!("  start                      Combat started");
    println!("  end                        Combat ended");
    println!("  spend <actor> <item> <n>   Use up ammunition");
    println!("  recover <actor>            Press the recover button");
    println!("  status                     Show ammo and stored flags");
    println!("  save                       Write the world file");
    println!("  quit                       Save and exit");
    println!();
    println!("ENVIRONMENT:");
    println!("  AMMO_TRACKER_ALIAS           Speaker alias for summaries");
    println!("  AMMO_TRACKER_RECOVER_LABEL   Label of the recover button");
    println!("  AMMO_TRACKER_FANOUT          concurrent | sequential");
    println!("  RUST_LOG                     Log filter (default: warn)");
}
