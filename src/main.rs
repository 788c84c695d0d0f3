//! Command-line simulator: pits two prefab rosters against each other and
//! prints the combat log.

use clap::Parser;
use skirmish::prefab_rosters::get_prefab_roster;
use skirmish::{Encounter, Faction, LowestHealthPolicy, RunnerConfig};
use std::error::Error;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(version, about = "Run a simulated skirmish between two prefab rosters")]
struct Args {
    /// Roster fighting on the player side
    #[arg(long, default_value = "adventurers")]
    players: String,

    /// Roster fighting on the enemy side
    #[arg(long, default_value = "goblin_raiders")]
    enemies: String,

    /// Seed for tie-breaks and critical hits
    #[arg(short, long)]
    seed: Option<u64>,

    /// Abandon the fight after this many turns
    #[arg(short, long)]
    max_turns: Option<u32>,

    /// RON file with runner settings; flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print events as JSON lines
    #[arg(long)]
    json: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log: String,
}

fn load_config(args: &Args) -> Result<RunnerConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => RunnerConfig::from_ron_str(&std::fs::read_to_string(path)?)?,
        None => RunnerConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(max_turns) = args.max_turns {
        config.max_turns = max_turns;
    }
    config.json_events |= args.json;
    Ok(config)
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let config = load_config(&args)?;
    info!(?config, "loaded runner config");

    let mut encounter = Encounter::from_config(format!("{}_vs_{}", args.players, args.enemies), &config);
    for (roster_id, faction) in [(&args.players, Faction::PLAYER), (&args.enemies, Faction::ENEMY)] {
        let roster = get_prefab_roster(roster_id).ok_or_else(|| format!("unknown roster '{}'", roster_id))?;
        for combatant in roster.build(faction) {
            encounter.add_combatant(combatant)?;
        }
    }

    let outcome = encounter.run(&mut LowestHealthPolicy::new(), config.max_turns)?;

    if config.json_events {
        for event in encounter.events().events() {
            println!("{}", serde_json::to_string(event)?);
        }
        println!("{}", serde_json::to_string(&outcome)?);
        return Ok(());
    }

    for line in encounter.events().formatted(encounter.state()) {
        println!("{}", line);
    }
    println!();
    match outcome.winner {
        Some(faction) if outcome.completed => {
            println!("{} side won after {} turns ({} rounds).", faction, outcome.turns, outcome.rounds)
        }
        _ => println!("No winner after {} turns.", outcome.turns),
    }
    for id in &outcome.survivors {
        if let Some(survivor) = encounter.combatant(*id) {
            println!(
                "  {} ({}): {}/{} HP",
                survivor.name,
                survivor.class_name,
                survivor.current_health(),
                survivor.max_health()
            );
        }
    }
    Ok(())
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
