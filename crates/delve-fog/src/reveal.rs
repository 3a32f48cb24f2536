//! Radius, chamber and forced reveal.
//!
//! The engine holds no terrain or discovery state of its own; both are passed
//! in on every call. Open tiles inside the discovery radius seed a chamber
//! flood fill that reveals the connected cave one tile at a time, nearest
//! tiles first.

use std::collections::VecDeque;

use ahash::AHashSet;
use delve_common::TileCoord;
use delve_world::TerrainQuery;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::field::{DiscoveryField, TileStatus};
use crate::save::DiscoverySaveData;

/// Largest radius any reveal covers.
pub const MAX_REVEAL_RADIUS: f32 = 64.0;

/// Reveal tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    /// Radius in tiles revealed around the player
    pub discovery_radius: f32,
    /// Seconds for fog to fade out
    pub fade_duration: f32,
    /// Alpha of undiscovered fog
    pub fog_alpha: f32,
    /// Seconds between position checks
    pub update_interval: f32,
    /// Movement in tiles that triggers a new reveal
    pub move_threshold: f32,
    /// Flood-fill connected open tiles
    pub chamber_reveal: bool,
    /// Largest chamber revealed by one flood fill
    pub max_chamber_size: usize,
    /// Seconds between two chamber tiles
    pub chamber_tile_delay: f32,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            discovery_radius: 4.5,
            fade_duration: 0.5,
            fog_alpha: 1.0,
            update_interval: 0.1,
            move_threshold: 0.1,
            chamber_reveal: true,
            max_chamber_size: 500,
            chamber_tile_delay: 0.02,
        }
    }
}

impl RevealConfig {
    /// Clamps values to sensible ranges.
    pub fn validate(&mut self) {
        self.discovery_radius = self.discovery_radius.clamp(0.0, MAX_REVEAL_RADIUS);
        self.fade_duration = self.fade_duration.clamp(0.0, 10.0);
        self.fog_alpha = self.fog_alpha.clamp(0.0, 1.0);
        self.update_interval = self.update_interval.clamp(0.0, 5.0);
        self.move_threshold = self.move_threshold.max(0.0);
        self.max_chamber_size = self.max_chamber_size.min(100_000);
        self.chamber_tile_delay = self.chamber_tile_delay.clamp(0.0, 1.0);
    }

    /// Creates an empty discovery field using this fade and fog setup.
    #[must_use]
    pub fn new_field(&self) -> DiscoveryField {
        DiscoveryField::new(self.fade_duration, self.fog_alpha)
    }
}

/// A flood-filled chamber being revealed over time.
#[derive(Debug, Clone)]
pub struct ChamberRevealJob {
    seed: TileCoord,
    tiles: Vec<TileCoord>,
    cursor: usize,
    accumulator: f32,
}

impl ChamberRevealJob {
    fn new(seed: TileCoord, mut tiles: Vec<TileCoord>) -> Self {
        tiles.sort_by_key(|t| t.distance_squared(seed));
        Self {
            seed,
            tiles,
            cursor: 0,
            accumulator: 0.0,
        }
    }

    /// Tile the flood fill started from.
    #[must_use]
    pub const fn seed(&self) -> TileCoord {
        self.seed
    }

    /// Chamber tiles in reveal order.
    #[must_use]
    pub fn tiles(&self) -> &[TileCoord] {
        &self.tiles
    }

    /// Tiles not yet processed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.tiles.len() - self.cursor
    }

    /// Whether every tile has been processed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.tiles.len()
    }

    /// Reveals the next tile that is still undiscovered.
    fn reveal_next(&mut self, field: &mut DiscoveryField) -> bool {
        while let Some(&tile) = self.tiles.get(self.cursor) {
            self.cursor += 1;
            if field.status(tile) == Some(TileStatus::Undiscovered) {
                return field.discover_tile(tile);
            }
        }
        false
    }
}

/// What one [`RevealEngine::update`] call did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevealTick {
    /// Tiles granted by a radius reveal this tick
    pub area_revealed: usize,
    /// Tiles granted by the chamber job this tick
    pub chamber_revealed: usize,
    /// Tiles whose fade completed this tick
    pub faded: Vec<TileCoord>,
}

/// Drives reveal operations against a discovery field.
#[derive(Debug, Clone)]
pub struct RevealEngine {
    config: RevealConfig,
    chamber: Option<ChamberRevealJob>,
    last_position: Option<Vec2>,
    update_timer: f32,
    /// Set when part of the last area reveal was deferred to a later poll.
    retry_pending: bool,
}

impl RevealEngine {
    /// Creates an engine.
    #[must_use]
    pub fn new(config: RevealConfig) -> Self {
        Self {
            config,
            chamber: None,
            last_position: None,
            update_timer: 0.0,
            retry_pending: false,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &RevealConfig {
        &self.config
    }

    /// Active chamber job, if any.
    #[must_use]
    pub const fn chamber_job(&self) -> Option<&ChamberRevealJob> {
        self.chamber.as_ref()
    }

    /// Whether a chamber is being revealed.
    #[must_use]
    pub const fn has_active_chamber(&self) -> bool {
        self.chamber.is_some()
    }

    /// Whether deferred open tiles will be retried once the chamber job ends.
    #[must_use]
    pub const fn has_pending_retry(&self) -> bool {
        self.retry_pending
    }

    /// Position of the last radius reveal driven by polling.
    #[must_use]
    pub const fn last_position(&self) -> Option<Vec2> {
        self.last_position
    }

    /// Reveals the area around the starting position right away.
    pub fn start(
        &mut self,
        field: &mut DiscoveryField,
        terrain: &impl TerrainQuery,
        position: Vec2,
    ) -> usize {
        self.update_timer = 0.0;
        self.retry_pending = false;
        self.last_position = Some(position);
        self.reveal_area(field, terrain, position, self.config.discovery_radius)
    }

    /// Advances polling, the chamber job and all fades by `dt` seconds.
    ///
    /// A poll reveals around `position` when the player has moved. A player
    /// standing still gets the last area revealed again once the chamber job
    /// that deferred part of it has finished.
    pub fn update(
        &mut self,
        field: &mut DiscoveryField,
        terrain: &impl TerrainQuery,
        position: Vec2,
        dt: f32,
    ) -> RevealTick {
        let mut tick = RevealTick::default();

        self.update_timer += dt;
        if self.update_timer >= self.config.update_interval {
            self.update_timer = 0.0;
            let moved = self
                .last_position
                .map_or(true, |last| last.distance(position) > self.config.move_threshold);
            let retry = self.retry_pending && self.chamber.is_none();
            if moved {
                self.retry_pending = false;
                tick.area_revealed =
                    self.reveal_area(field, terrain, position, self.config.discovery_radius);
                self.last_position = Some(position);
            } else if retry {
                self.retry_pending = false;
                let center = self.last_position.unwrap_or(position);
                tick.area_revealed =
                    self.reveal_area(field, terrain, center, self.config.discovery_radius);
            }
        }

        tick.chamber_revealed = self.advance_chamber(field, dt);
        tick.faded = field.tick(dt);
        tick
    }

    /// Reveals tiles within `radius` of the tile containing `position`.
    ///
    /// Tiles are visited nearest first. Open tiles met while a chamber job
    /// is running are left fogged and retried by a later poll. Returns how
    /// many tiles were granted.
    pub fn reveal_area(
        &mut self,
        field: &mut DiscoveryField,
        terrain: &impl TerrainQuery,
        position: Vec2,
        radius: f32,
    ) -> usize {
        let center = TileCoord::from_world(position);
        let mut granted = 0;

        for tile in tiles_within(center, radius) {
            let Some(status) = field.status(tile) else {
                continue;
            };
            if status.is_granted() {
                continue;
            }
            if self.config.chamber_reveal && !terrain.is_solid(tile) {
                if self.chamber.is_some() {
                    self.retry_pending = true;
                    continue;
                }
                if self.reveal_chamber(field, terrain, tile) {
                    granted += 1;
                    continue;
                }
            }
            if field.discover_tile(tile) {
                granted += 1;
            }
        }
        granted
    }

    /// Reveals an area with a one-off radius. The configured radius is kept.
    pub fn force_reveal_area(
        &mut self,
        field: &mut DiscoveryField,
        terrain: &impl TerrainQuery,
        position: Vec2,
        radius: f32,
    ) -> usize {
        self.reveal_area(field, terrain, position, radius)
    }

    /// Starts a chamber reveal at the tile containing `position`.
    pub fn force_reveal_chamber(
        &mut self,
        field: &mut DiscoveryField,
        terrain: &impl TerrainQuery,
        position: Vec2,
    ) -> bool {
        self.reveal_chamber(field, terrain, TileCoord::from_world(position))
    }

    /// Flood-fills the open chamber around `seed` and starts revealing it.
    ///
    /// Returns `false` when a chamber job is already running or the seed is
    /// not an open, covered, undiscovered tile. The seed itself is revealed
    /// immediately.
    pub fn reveal_chamber(
        &mut self,
        field: &mut DiscoveryField,
        terrain: &impl TerrainQuery,
        seed: TileCoord,
    ) -> bool {
        if self.chamber.is_some() {
            return false;
        }
        let tiles = flood_chamber(field, terrain, seed, self.config.max_chamber_size);
        if tiles.is_empty() {
            return false;
        }
        if tiles.len() >= self.config.max_chamber_size {
            // The chamber may continue past the cap.
            self.retry_pending = true;
        }

        let mut job = ChamberRevealJob::new(seed, tiles);
        debug!("Chamber at ({}, {}): {} tiles", seed.x, seed.y, job.tiles().len());
        job.reveal_next(field);
        if !job.is_finished() {
            self.chamber = Some(job);
        }
        true
    }

    /// Abandons the active chamber job.
    pub fn cancel_chamber(&mut self) {
        self.chamber = None;
    }

    /// Restores discovery from a snapshot and drops pending chamber work.
    pub fn load_discovery(&mut self, field: &mut DiscoveryField, data: &DiscoverySaveData) {
        self.cancel_chamber();
        field.load(data);
    }

    fn advance_chamber(&mut self, field: &mut DiscoveryField, dt: f32) -> usize {
        let Some(job) = self.chamber.as_mut() else {
            return 0;
        };

        let mut revealed = 0;
        job.accumulator += dt;
        while job.accumulator >= self.config.chamber_tile_delay && !job.is_finished() {
            job.accumulator -= self.config.chamber_tile_delay;
            if job.reveal_next(field) {
                revealed += 1;
            }
        }

        if job.is_finished() {
            debug!("Chamber at ({}, {}) fully revealed", job.seed.x, job.seed.y);
            self.chamber = None;
        }
        revealed
    }
}

/// Tiles whose centers lie within `radius` of `center`, nearest first.
///
/// Non-finite or negative radii select nothing; larger radii are capped at
/// [`MAX_REVEAL_RADIUS`].
fn tiles_within(center: TileCoord, radius: f32) -> Vec<TileCoord> {
    if !radius.is_finite() || radius < 0.0 {
        return Vec::new();
    }
    let radius = radius.min(MAX_REVEAL_RADIUS);
    let reach = radius.ceil() as i32;
    let mut tiles: Vec<TileCoord> = (-reach..=reach)
        .flat_map(|dy| (-reach..=reach).map(move |dx| center.offset(dx, dy)))
        .filter(|tile| tile.distance(center) <= radius)
        .collect();
    tiles.sort_by_key(|tile| (tile.distance_squared(center), *tile));
    tiles
}

/// Breadth-first search through open, covered, undiscovered tiles.
fn flood_chamber(
    field: &DiscoveryField,
    terrain: &impl TerrainQuery,
    seed: TileCoord,
    max_tiles: usize,
) -> Vec<TileCoord> {
    let eligible = |tile: TileCoord| {
        !terrain.is_solid(tile) && field.status(tile) == Some(TileStatus::Undiscovered)
    };
    if max_tiles == 0 || !eligible(seed) {
        return Vec::new();
    }

    let mut visited = AHashSet::new();
    let mut queue = VecDeque::new();
    let mut tiles = Vec::new();
    visited.insert(seed);
    queue.push_back(seed);

    while let Some(tile) = queue.pop_front() {
        tiles.push(tile);
        if tiles.len() >= max_tiles {
            break;
        }
        for next in tile.neighbors4() {
            if eligible(next) && visited.insert(next) {
                queue.push_back(next);
            }
        }
    }
    tiles
}
