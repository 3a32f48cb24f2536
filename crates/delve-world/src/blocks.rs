//! Block reference data.
//!
//! Block types are immutable configuration consumed by generation (the base
//! material and ore veins) and by mining (duration and drops).

use ahash::AHashMap;
use delve_common::{BlockTypeId, ItemTypeId};
use serde::{Deserialize, Serialize};

/// Built-in block type IDs.
pub mod block_ids {
    use delve_common::BlockTypeId;

    /// Plain stone, the base material of every solid tile
    pub const STONE: BlockTypeId = BlockTypeId::new(1);
    /// Copper ore
    pub const COPPER_ORE: BlockTypeId = BlockTypeId::new(2);
    /// Iron ore
    pub const IRON_ORE: BlockTypeId = BlockTypeId::new(3);
    /// Gold ore
    pub const GOLD_ORE: BlockTypeId = BlockTypeId::new(4);
}

/// Built-in item IDs dropped by the default blocks.
pub mod item_ids {
    use delve_common::ItemTypeId;

    /// Stone rubble
    pub const STONE: ItemTypeId = ItemTypeId::new(1);
    /// Raw copper
    pub const COPPER: ItemTypeId = ItemTypeId::new(2);
    /// Raw iron
    pub const IRON: ItemTypeId = ItemTypeId::new(3);
    /// Gold nugget
    pub const GOLD: ItemTypeId = ItemTypeId::new(4);
}

/// A minable block type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockType {
    /// Block ID
    pub id: BlockTypeId,
    /// Display name
    pub name: String,
    /// Key of the tile graphic used by the presentation layer
    pub tile: String,
    /// Seconds of continuous mining needed to break the block
    pub mining_time: f32,
    /// Item dropped when mined
    pub drop_item: Option<ItemTypeId>,
    /// Minimum drop quantity
    pub min_drop: u32,
    /// Maximum drop quantity (inclusive)
    pub max_drop: u32,
    /// Number of crack overlays shown while mining
    pub mining_stages: u8,
}

impl BlockType {
    /// Creates a block with default mining properties.
    #[must_use]
    pub fn new(id: BlockTypeId, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id,
            tile: name.to_lowercase().replace(' ', "_"),
            name,
            mining_time: 3.0,
            drop_item: None,
            min_drop: 1,
            max_drop: 3,
            mining_stages: 3,
        }
    }

    /// Sets the mining duration in seconds.
    #[must_use]
    pub fn with_mining_time(mut self, seconds: f32) -> Self {
        self.mining_time = seconds;
        self
    }

    /// Sets the dropped item and its quantity range.
    #[must_use]
    pub fn with_drop(mut self, item: ItemTypeId, min: u32, max: u32) -> Self {
        self.drop_item = Some(item);
        self.min_drop = min;
        self.max_drop = max.max(min);
        self
    }

    /// Rolls a drop quantity in `[min_drop, max_drop]`.
    pub fn roll_drop_amount(&self, rng: &mut fastrand::Rng) -> u32 {
        rng.u32(self.min_drop..=self.max_drop.max(self.min_drop))
    }

    /// Crack overlay index for a mining progress in `[0, 1]`.
    ///
    /// Returns `None` before mining starts, once the block is broken, or when
    /// the block has no overlays.
    #[must_use]
    pub fn mining_stage(&self, progress: f32) -> Option<u8> {
        if progress <= 0.0 || progress >= 1.0 || self.mining_stages == 0 {
            return None;
        }
        let stage = (progress * f32::from(self.mining_stages)).floor() as u8;
        Some(stage.min(self.mining_stages - 1))
    }
}

/// Registry of all known block types.
#[derive(Debug, Clone, Default)]
pub struct BlockRegistry {
    blocks: AHashMap<BlockTypeId, BlockType>,
}

impl BlockRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding stone and the three default ores.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(
            BlockType::new(block_ids::STONE, "Stone Block")
                .with_mining_time(1.5)
                .with_drop(item_ids::STONE, 1, 3),
        );
        registry.register(
            BlockType::new(block_ids::COPPER_ORE, "Copper Ore")
                .with_mining_time(2.5)
                .with_drop(item_ids::COPPER, 1, 2),
        );
        registry.register(
            BlockType::new(block_ids::IRON_ORE, "Iron Ore")
                .with_mining_time(3.5)
                .with_drop(item_ids::IRON, 1, 2),
        );
        registry.register(
            BlockType::new(block_ids::GOLD_ORE, "Gold Ore")
                .with_mining_time(5.0)
                .with_drop(item_ids::GOLD, 1, 1),
        );
        registry
    }

    /// Registers a block type, replacing any previous entry with the same ID.
    pub fn register(&mut self, block: BlockType) {
        self.blocks.insert(block.id, block);
    }

    /// Looks up a block type.
    #[must_use]
    pub fn get(&self, id: BlockTypeId) -> Option<&BlockType> {
        self.blocks.get(&id)
    }

    /// Checks whether a block type is registered.
    #[must_use]
    pub fn contains(&self, id: BlockTypeId) -> bool {
        self.blocks.contains_key(&id)
    }

    /// Number of registered block types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
