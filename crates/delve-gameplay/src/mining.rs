//! Timed mining of discovered terrain.
//!
//! A tile can only be mined once the player has fully discovered it. Mining
//! progress accumulates across calls while the same tile stays targeted and
//! in range; switching target starts over.

use delve_common::{BlockTypeId, ItemTypeId, TileCoord};
use delve_fog::DiscoveryField;
use delve_world::{BlockRegistry, TerrainGrid};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while mining.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MiningError {
    /// Target is out of range
    #[error("target out of range: distance {distance:.1} > max {max:.1}")]
    OutOfRange {
        /// Distance from the player to the tile center
        distance: f32,
        /// Maximum allowed distance
        max: f32,
    },

    /// Tile is still under fog
    #[error("tile ({x}, {y}) is not discovered")]
    NotDiscovered {
        /// X coordinate
        x: i32,
        /// Y coordinate
        y: i32,
    },

    /// No solid tile to mine
    #[error("no solid tile at ({x}, {y})")]
    NotSolid {
        /// X coordinate
        x: i32,
        /// Y coordinate
        y: i32,
    },

    /// Tile material has no block definition
    #[error("unknown block type: {0}")]
    UnknownBlock(BlockTypeId),

    /// No map has been generated
    #[error("no map generated")]
    NoMap,
}

/// Result type for mining operations.
pub type MiningResult<T> = Result<T, MiningError>;

/// Mining configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiningConfig {
    /// Maximum distance from the player to the tile center
    pub max_range: f32,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self { max_range: 3.0 }
    }
}

impl MiningConfig {
    /// Clamps values to sensible ranges.
    pub fn validate(&mut self) {
        self.max_range = self.max_range.clamp(0.5, 32.0);
    }
}

/// Progress on the current target.
#[derive(Debug, Clone, Default)]
pub struct MiningState {
    /// Tile being mined
    pub target: Option<TileCoord>,
    /// Block being mined
    pub block: Option<BlockTypeId>,
    /// Progress (0.0 to 1.0)
    pub progress: f32,
}

impl MiningState {
    /// Create a new mining state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start mining a tile.
    pub fn start(&mut self, tile: TileCoord, block: BlockTypeId) {
        self.target = Some(tile);
        self.block = Some(block);
        self.progress = 0.0;
    }

    /// Cancel current mining.
    pub fn cancel(&mut self) {
        self.target = None;
        self.block = None;
        self.progress = 0.0;
    }

    /// Advances progress. Returns true once the block breaks.
    pub fn update(&mut self, dt: f32, mining_time: f32) -> bool {
        if self.target.is_none() {
            return false;
        }
        if mining_time <= 0.0 {
            self.progress = 1.0;
            return true;
        }
        self.progress += dt / mining_time;
        if self.progress >= 1.0 {
            self.progress = 1.0;
            return true;
        }
        false
    }

    /// Check if currently mining.
    #[must_use]
    pub fn is_mining(&self) -> bool {
        self.target.is_some()
    }

    /// Get the completion percentage (0-100).
    #[must_use]
    pub fn percentage(&self) -> u8 {
        (self.progress * 100.0).min(100.0) as u8
    }
}

/// A block that finished mining.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinedBlock {
    /// Tile that was removed
    pub tile: TileCoord,
    /// Block that occupied it
    pub block: BlockTypeId,
    /// Dropped item
    pub item: Option<ItemTypeId>,
    /// Number of items dropped
    pub quantity: u32,
}

/// Terrain and discovery state a mining attempt works against.
pub struct MiningContext<'a> {
    /// Terrain to remove tiles from
    pub terrain: &'a mut TerrainGrid,
    /// Discovery state gating which tiles may be mined
    pub field: &'a DiscoveryField,
    /// Block definitions
    pub registry: &'a BlockRegistry,
    /// Drop quantity source
    pub rng: &'a mut fastrand::Rng,
}

/// Mining manager.
#[derive(Debug, Default)]
pub struct MiningManager {
    config: MiningConfig,
    state: MiningState,
}

impl MiningManager {
    /// Create with custom configuration.
    #[must_use]
    pub fn new(config: MiningConfig) -> Self {
        Self {
            config,
            state: MiningState::new(),
        }
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &MiningConfig {
        &self.config
    }

    /// Get the current mining state.
    #[must_use]
    pub fn state(&self) -> &MiningState {
        &self.state
    }

    /// Crack overlay for the current target.
    #[must_use]
    pub fn mining_stage(&self, registry: &BlockRegistry) -> Option<u8> {
        let block = registry.get(self.state.block?)?;
        block.mining_stage(self.state.progress)
    }

    fn check_range(&self, player: Vec2, tile: TileCoord) -> MiningResult<()> {
        let distance = player.distance(tile.center());
        if distance > self.config.max_range {
            return Err(MiningError::OutOfRange {
                distance,
                max: self.config.max_range,
            });
        }
        Ok(())
    }

    /// Starts or continues mining `tile` for `dt` seconds.
    ///
    /// Returns the mined block once progress completes; the tile is then
    /// removed from the terrain. Any error abandons current progress.
    pub fn try_mine(
        &mut self,
        player: Vec2,
        tile: TileCoord,
        ctx: MiningContext<'_>,
        dt: f32,
    ) -> MiningResult<Option<MinedBlock>> {
        let result = self.advance(player, tile, ctx, dt);
        if result.is_err() {
            self.state.cancel();
        }
        result
    }

    fn advance(
        &mut self,
        player: Vec2,
        tile: TileCoord,
        ctx: MiningContext<'_>,
        dt: f32,
    ) -> MiningResult<Option<MinedBlock>> {
        self.check_range(player, tile)?;

        if !ctx.field.is_tile_discovered(tile) {
            return Err(MiningError::NotDiscovered {
                x: tile.x,
                y: tile.y,
            });
        }
        let Some(material) = ctx.terrain.material(tile) else {
            return Err(MiningError::NotSolid {
                x: tile.x,
                y: tile.y,
            });
        };
        let block = ctx
            .registry
            .get(material)
            .ok_or(MiningError::UnknownBlock(material))?;

        if self.state.target != Some(tile) {
            self.state.start(tile, material);
        }

        if !self.state.update(dt, block.mining_time) {
            return Ok(None);
        }

        self.state.cancel();
        ctx.terrain.remove_tile(tile);
        let quantity = block
            .drop_item
            .map_or(0, |_| block.roll_drop_amount(ctx.rng));

        debug!(
            "Mined {} at ({}, {}), dropped {quantity}",
            block.name, tile.x, tile.y
        );
        Ok(Some(MinedBlock {
            tile,
            block: material,
            item: block.drop_item,
            quantity,
        }))
    }

    /// Abandons current progress.
    pub fn cancel(&mut self) {
        self.state.cancel();
    }
}
