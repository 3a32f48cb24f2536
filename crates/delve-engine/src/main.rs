//! # Delve
//!
//! Command-line driver for the Delve cave explorer.
//!
//! This binary ties together all subsystems:
//! - World: cave carving and ore placement
//! - Fog: discovery, reveal and persistence
//! - Gameplay: mining and the exploration session

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod config;
mod explore;
mod preview;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use delve_common::TileCoord;
use delve_fog::DiscoveryStore;
use delve_gameplay::ExplorationSession;
use delve_world::{BlockRegistry, WorldGenerator};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::EngineConfig;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a map and report what was placed
    Generate {
        /// Fixed world seed
        #[arg(long)]
        seed: Option<u64>,
        /// Map edge length in tiles
        #[arg(long)]
        size: Option<u32>,
        /// Print the map as text
        #[arg(long)]
        preview: bool,
    },
    /// Walk a scripted path through a fresh map, mining as it goes
    Explore {
        /// Fixed world seed
        #[arg(long)]
        seed: Option<u64>,
        /// Frames to simulate
        #[arg(long, default_value = "3600")]
        ticks: u32,
        /// Continue from discovery saved under this name
        #[arg(long)]
        load: Option<String>,
        /// Save discovery under this name when done
        #[arg(long)]
        save: Option<String>,
    },
}

/// Main entry point.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("delve=info".parse()?))
        .init();

    let args = Args::parse();
    info!("Delve {}", env!("CARGO_PKG_VERSION"));

    let mut config = match &args.config {
        Some(path) => EngineConfig::load_from(path),
        None => EngineConfig::load(),
    };

    match args.command {
        Command::Generate {
            seed,
            size,
            preview,
        } => {
            apply_overrides(&mut config, seed, size);
            generate(&config, preview)
        },
        Command::Explore {
            seed,
            ticks,
            load,
            save,
        } => {
            apply_overrides(&mut config, seed, None);
            explore(&config, ticks, load.as_deref(), save.as_deref())
        },
    }
}

fn apply_overrides(config: &mut EngineConfig, seed: Option<u64>, size: Option<u32>) {
    if seed.is_some() {
        config.world.seed = seed;
    }
    if let Some(size) = size {
        config.world.map_size = size;
    }
    config.validate();
}

fn generate(config: &EngineConfig, preview: bool) -> Result<()> {
    let registry = BlockRegistry::with_defaults();
    let generator = WorldGenerator::new(config.world.clone(), &registry)
        .context("invalid world configuration")?;

    let mut terrain = None;
    let report = generator.generate_map(&mut terrain)?;

    for placement in &report.ore_placements {
        let name = registry
            .get(placement.block)
            .map_or("unknown", |b| b.name.as_str());
        info!(
            "{name}: {}/{} tiles in {} veins ({} attempts)",
            placement.placed, placement.target, placement.veins, placement.attempts
        );
    }

    if let (true, Some(terrain)) = (preview, terrain.as_ref()) {
        print!("{}", preview::render(terrain, None, Some(TileCoord::new(0, 0))));
    }
    Ok(())
}

fn explore(
    config: &EngineConfig,
    ticks: u32,
    load: Option<&str>,
    save: Option<&str>,
) -> Result<()> {
    let mut session = ExplorationSession::new(
        config.world.clone(),
        config.reveal.clone(),
        config.mining.clone(),
        BlockRegistry::with_defaults(),
    )
    .context("invalid world configuration")?;
    let store = DiscoveryStore::new(&config.save_dir);

    match load {
        Some(name) => {
            if config.world.seed.is_none() {
                warn!("Resuming '{name}' without a fixed seed; terrain will not match the save");
            }
            session
                .resume(&store, name)
                .with_context(|| format!("failed to resume '{name}'"))?;
        },
        None => {
            session.generate_map()?;
        },
    }

    let summary = explore::run(&mut session, ticks);
    info!(
        "Explored for {:.1}s: {} tiles discovered, {} blocks mined",
        summary.ticks as f32 * explore::TICK_DT,
        summary.discovered,
        summary.blocks_mined
    );
    for (item, quantity) in &summary.items {
        info!("  item {}: {quantity}", item.raw());
    }

    if let Some(terrain) = session.terrain() {
        print!("{}", preview::render(terrain, Some(session.field()), None));
    }

    if let Some(name) = save {
        session
            .save_to(&store, name)
            .with_context(|| format!("failed to save discovery as '{name}'"))?;
    }
    Ok(())
}
