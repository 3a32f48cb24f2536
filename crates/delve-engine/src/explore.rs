//! Scripted exploration run.
//!
//! A walker starts at spawn and heads in one direction, mining through
//! discovered rock in its way. It turns clockwise at the map edge or when
//! mining fails.

use delve_common::{ItemTypeId, TileCoord};
use delve_fog::TileStatus;
use delve_gameplay::ExplorationSession;
use glam::Vec2;
use std::collections::BTreeMap;
use tracing::debug;

/// Simulated frame length in seconds.
pub const TICK_DT: f32 = 1.0 / 60.0;

const HEADINGS: [Vec2; 4] = [
    Vec2::new(1.0, 0.0),
    Vec2::new(0.0, -1.0),
    Vec2::new(-1.0, 0.0),
    Vec2::new(0.0, 1.0),
];

/// Player stand-in driven by a fixed script.
#[derive(Debug, Clone)]
pub struct Walker {
    /// World position
    pub position: Vec2,
    heading: usize,
    /// Tiles per second
    speed: f32,
}

impl Walker {
    /// Creates a walker at the center of the spawn tile.
    #[must_use]
    pub fn at_spawn() -> Self {
        Self {
            position: TileCoord::new(0, 0).center(),
            heading: 0,
            speed: 4.0,
        }
    }

    fn direction(&self) -> Vec2 {
        HEADINGS[self.heading]
    }

    /// Tile directly in front of the walker.
    #[must_use]
    pub fn tile_ahead(&self) -> TileCoord {
        TileCoord::from_world(self.position + self.direction() * 0.6)
    }

    /// Turns a quarter clockwise and recenters on the current tile.
    pub fn turn(&mut self) {
        self.heading = (self.heading + 1) % HEADINGS.len();
        self.position = TileCoord::from_world(self.position).center();
    }

    fn step(&mut self, dt: f32) {
        self.position += self.direction() * self.speed * dt;
    }
}

/// Outcome of an exploration run.
#[derive(Debug, Clone, Default)]
pub struct ExploreSummary {
    /// Ticks simulated
    pub ticks: u32,
    /// Fully discovered tiles at the end
    pub discovered: usize,
    /// Blocks broken
    pub blocks_mined: usize,
    /// Items collected, by item
    pub items: BTreeMap<ItemTypeId, u32>,
}

/// Runs `ticks` frames of scripted exploration on a generated session.
pub fn run(session: &mut ExplorationSession, ticks: u32) -> ExploreSummary {
    let mut walker = Walker::at_spawn();
    let mut summary = ExploreSummary {
        ticks,
        ..Default::default()
    };

    for _ in 0..ticks {
        session.tick(walker.position, TICK_DT);

        let ahead = walker.tile_ahead();
        if !session.field().is_covered(ahead) {
            walker.turn();
            continue;
        }
        if !session.has_solid_tile(ahead) {
            walker.step(TICK_DT);
            continue;
        }
        if !session.is_tile_discovered(ahead) {
            // Fog is still fading; wait for it.
            continue;
        }

        match session.mine(walker.position, ahead, TICK_DT) {
            Ok(Some(mined)) => {
                summary.blocks_mined += 1;
                if let Some(item) = mined.item {
                    *summary.items.entry(item).or_insert(0) += mined.quantity;
                }
            },
            Ok(None) => {},
            Err(e) => {
                debug!("Walker gave up on ({}, {}): {e}", ahead.x, ahead.y);
                session.cancel_mining();
                walker.turn();
            },
        }
    }

    summary.discovered = session.field().count(TileStatus::Discovered);
    summary
}
