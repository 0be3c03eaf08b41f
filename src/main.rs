use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use castle_idle::{
    autoplay,
    config::GameConfig,
    engine::Engine,
    resources::ResourceKind,
    state::GameSnapshot,
    web::{self, WebServerConfig},
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Castle idle realm runner")]
struct Cli {
    /// Path to the realm YAML file (built-in defaults when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the save directory
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); defaults to the config's
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Advance the realm headlessly
    Run {
        /// Number of ticks to drive
        #[arg(long, default_value_t = 1_200)]
        ticks: u64,

        /// Let the greedy player buy tiles and upgrade after every tick
        #[arg(long)]
        autoplay: bool,

        /// Sleep the configured interval and pass the measured elapsed time
        #[arg(long)]
        realtime: bool,
    },
    /// Serve the JSON API and tick on the configured interval
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Print the saved realm
    Show,
    /// Buy the tile at X Y
    Buy { x: u32, y: u32 },
    /// Upgrade the castle one level
    Upgrade,
    /// Discard the save and start over
    Reset,
    /// Print biomes, castle levels and buildings
    Catalog,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => GameConfig::from_yaml_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => GameConfig::default(),
    };
    if let Some(dir) = cli.save_dir {
        config.save.dir = dir;
    }

    let level_name = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    let level = level_name.parse().unwrap_or(log::LevelFilter::Info);
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();

    match cli.command {
        Command::Catalog => print_catalog(&config),
        Command::Serve { host, port } => {
            let engine = Engine::load_or_new(config)?;
            let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
            runtime.block_on(web::run(engine, WebServerConfig { host, port }))?;
        }
        Command::Run {
            ticks,
            autoplay: auto,
            realtime,
        } => run(&mut Engine::load_or_new(config)?, ticks, auto, realtime)?,
        Command::Show => print_snapshot(&Engine::load_or_new(config)?.snapshot()),
        Command::Buy { x, y } => buy(&mut Engine::load_or_new(config)?, x, y)?,
        Command::Upgrade => upgrade(&mut Engine::load_or_new(config)?)?,
        Command::Reset => {
            let engine = Engine::start_over(config)?;
            println!("Realm '{}' reset", engine.config().name);
        }
    }
    Ok(())
}

fn run(engine: &mut Engine, ticks: u64, auto: bool, realtime: bool) -> Result<()> {
    let started = Instant::now();
    if realtime {
        drive_realtime(engine, ticks, auto)?;
    } else {
        let mut failure = None;
        engine.run_fixed(ticks, |engine| {
            if auto && failure.is_none() {
                if let Err(err) = autoplay::play(engine) {
                    failure = Some(err);
                }
            }
        })?;
        if let Some(err) = failure {
            return Err(err.into());
        }
    }
    engine.save()?;
    log::info!(
        "ran {ticks} ticks in {:.1} ms",
        started.elapsed().as_secs_f64() * 1_000.0
    );
    print_snapshot(&engine.snapshot());
    Ok(())
}

fn buy(engine: &mut Engine, x: u32, y: u32) -> Result<()> {
    if engine.buy_tile(x, y)? {
        let biome = engine
            .state()
            .grid
            .get(x, y)
            .map(|tile| format!("{:?}", tile.biome))
            .unwrap_or_default();
        println!("Bought ({x}, {y}): {biome}");
    } else {
        println!(
            "Cannot buy ({x}, {y}): it must be unowned, border your land and cost {:.0} gold",
            engine.catalog().tile_cost
        );
    }
    Ok(())
}

fn upgrade(engine: &mut Engine) -> Result<()> {
    if engine.upgrade_castle()? {
        println!("Castle is now level {}", engine.state().castle_level());
    } else {
        match engine.state().next_upgrade_cost() {
            Some(cost) => println!("Cannot upgrade yet, need {cost}"),
            None => println!("Castle is already at max level"),
        }
    }
    Ok(())
}

fn drive_realtime(engine: &mut Engine, ticks: u64, auto: bool) -> Result<()> {
    let period = Duration::from_millis(engine.config().tick_interval_ms);
    let mut last = Instant::now();
    for _ in 0..ticks {
        thread::sleep(period);
        let now = Instant::now();
        engine.tick(now.duration_since(last).as_secs_f64() * 1_000.0)?;
        last = now;
        if auto {
            autoplay::play(engine)?;
        }
    }
    Ok(())
}

fn print_snapshot(snapshot: &GameSnapshot) {
    println!(
        "Realm '{}' | castle level {}/{} | {} tiles owned | {} ticks, {:.1}s played",
        snapshot.name,
        snapshot.castle_level,
        snapshot.castle_max_level,
        snapshot.grid.owned_count(),
        snapshot.progress.ticks,
        snapshot.progress.elapsed_ms / 1_000.0
    );
    for kind in ResourceKind::ALL {
        println!(
            "  {:<10} {:>12.1}  (+{:.3}/s = {:.3} x {:.3})",
            kind.as_str(),
            snapshot.resources.get(kind),
            snapshot.rates.total.get(kind),
            snapshot.rates.base.get(kind),
            snapshot.rates.modifiers.get(kind)
        );
    }
    for y in 0..snapshot.grid.height() {
        let row: String = (0..snapshot.grid.width())
            .map(|x| match snapshot.grid.get(x, y) {
                Some(tile) if tile.is_castle() => 'C',
                Some(tile) if tile.is_owned => biome_glyph(tile.biome),
                _ if snapshot.purchasable.contains(&(x, y)) => '+',
                _ => '.',
            })
            .collect();
        println!("  {row}");
    }
    match &snapshot.next_upgrade_cost {
        Some(cost) => println!("Next castle upgrade: {cost}"),
        None => println!("Castle at max level"),
    }
}

fn biome_glyph(biome: castle_idle::catalog::BiomeType) -> char {
    use castle_idle::catalog::BiomeType::*;
    match biome {
        Forest => 'F',
        Mountain => 'M',
        Plains => 'P',
        Lake => 'L',
        Quarry => 'Q',
        Mine => 'N',
        Desert => 'D',
        Grounds => 'g',
        Castle => 'C',
        Empty => '.',
    }
}

fn print_catalog(config: &GameConfig) {
    let catalog = &config.catalog;
    println!("Tile cost: {:.0} gold", catalog.tile_cost);
    println!("Biomes:");
    for def in &catalog.biomes {
        let modifiers: Vec<String> = def
            .modifiers
            .iter()
            .map(|(kind, factor)| format!("{kind} x{factor}"))
            .collect();
        let tag = if def.biome.is_purchasable() { "" } else { " (reserved)" };
        println!("  {}{}: {}", def.display, tag, modifiers.join(", "));
    }
    println!(
        "Castle: x{} per level, max level {}",
        catalog.castle.level_multiplier, catalog.castle.max_level
    );
    for level in 1..catalog.castle.max_level {
        if let Some(cost) = catalog.castle.upgrade_cost(level) {
            println!("  {} -> {}: {}", level, level + 1, cost);
        }
    }
    println!("Buildings:");
    for building in &catalog.buildings {
        println!(
            "  {} [{:?}] {}  {}",
            building.name, building.biome, building.cost, building.description
        );
    }
}
