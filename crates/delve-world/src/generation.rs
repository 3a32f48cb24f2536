//! Procedural map generation.

use std::time::{Duration, Instant};

use delve_common::{BlockTypeId, WorldError, WorldResult};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::blocks::{block_ids, BlockRegistry};
use crate::caves::{CaveConfig, CaveGenerator};
use crate::ores::{OreDistributionSpec, OreDistributor, OrePlacement};
use crate::terrain::TerrainGrid;

/// World generator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Fixed seed; a random one is drawn per run when unset
    pub seed: Option<u64>,
    /// Map edge length in tiles
    pub map_size: u32,
    /// Edge length of the open square around spawn
    pub spawn_clear_size: u32,
    /// Initial solid probability
    pub cave_density: f32,
    /// Cellular-automaton passes
    pub smoothing_iterations: u32,
    /// Material of every solid tile before ores are placed
    pub base_block: BlockTypeId,
    /// Ore specs, applied in order
    pub ores: Vec<OreDistributionSpec>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: None,
            map_size: 64,
            spawn_clear_size: 3,
            cave_density: 0.45,
            smoothing_iterations: 5,
            base_block: block_ids::STONE,
            ores: vec![
                OreDistributionSpec::new(block_ids::COPPER_ORE, 5.0, 3, 7),
                OreDistributionSpec::new(block_ids::IRON_ORE, 3.0, 2, 6),
                OreDistributionSpec::new(block_ids::GOLD_ORE, 1.0, 1, 4),
            ],
        }
    }
}

impl GeneratorConfig {
    fn cave_config(&self) -> CaveConfig {
        CaveConfig {
            density: self.cave_density,
            smoothing_iterations: self.smoothing_iterations,
            spawn_clear_size: self.spawn_clear_size,
        }
    }
}

/// Summary of one generation run.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    /// Seed used
    pub seed: u64,
    /// Map edge length
    pub map_size: u32,
    /// Solid tiles placed
    pub tile_count: usize,
    /// Per-ore results
    pub ore_placements: Vec<OrePlacement>,
    /// Wall-clock generation time
    pub duration: Duration,
}

/// Terrain together with the report describing how it was made.
#[derive(Debug, Clone)]
pub struct GeneratedWorld {
    /// The generated terrain
    pub terrain: TerrainGrid,
    /// Generation summary
    pub report: GenerationReport,
}

/// Procedural world generator.
#[derive(Debug, Clone)]
pub struct WorldGenerator {
    config: GeneratorConfig,
    caves: CaveGenerator,
}

impl WorldGenerator {
    /// Creates a generator after checking the configuration against the
    /// block registry.
    pub fn new(config: GeneratorConfig, registry: &BlockRegistry) -> WorldResult<Self> {
        if config.map_size == 0 {
            return Err(WorldError::InvalidMapSize(config.map_size));
        }
        if !registry.contains(config.base_block) {
            return Err(WorldError::UnknownBlock(config.base_block));
        }
        for ore in &config.ores {
            ore.validate()?;
            if !registry.contains(ore.block) {
                return Err(WorldError::UnknownBlock(ore.block));
            }
        }
        let caves = CaveGenerator::new(config.cave_config())?;
        Ok(Self { config, caves })
    }

    /// Creates a generator with default config and a fixed seed.
    pub fn with_seed(seed: u64, registry: &BlockRegistry) -> WorldResult<Self> {
        Self::new(
            GeneratorConfig {
                seed: Some(seed),
                ..Default::default()
            },
            registry,
        )
    }

    /// Returns the generator configuration.
    #[must_use]
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generates a map from the configured seed, or a fresh random one.
    pub fn generate(&self) -> WorldResult<GeneratedWorld> {
        let seed = self.config.seed.unwrap_or_else(|| fastrand::u64(..));
        self.generate_with_seed(seed)
    }

    /// Generates a map from an explicit seed.
    pub fn generate_with_seed(&self, seed: u64) -> WorldResult<GeneratedWorld> {
        let started = Instant::now();
        let mut rng = fastrand::Rng::with_seed(seed);

        let cells = self.caves.generate(self.config.map_size, &mut rng)?;
        let mut terrain = TerrainGrid::from_solidity(&cells, self.config.base_block);
        let ore_placements = OreDistributor::place_ores(&mut terrain, &self.config.ores, &mut rng);

        let report = GenerationReport {
            seed,
            map_size: self.config.map_size,
            tile_count: terrain.solid_count(),
            ore_placements,
            duration: started.elapsed(),
        };
        Ok(GeneratedWorld { terrain, report })
    }

    /// Replaces `slot` with a newly generated map.
    ///
    /// Existing terrain is dropped first, so calling this repeatedly never
    /// accumulates state.
    pub fn generate_map(&self, slot: &mut Option<TerrainGrid>) -> WorldResult<GenerationReport> {
        *slot = None;
        let GeneratedWorld { terrain, report } = self.generate()?;
        *slot = Some(terrain);

        info!(
            "Generated {size}x{size} map (seed {}): {} tiles in {:.2}ms",
            report.seed,
            report.tile_count,
            report.duration.as_secs_f64() * 1000.0,
            size = report.map_size,
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_deterministic() {
        let registry = BlockRegistry::with_defaults();
        let generator = WorldGenerator::with_seed(42, &registry).expect("valid config");

        let a = generator.generate().expect("generation failed");
        let b = generator.generate().expect("generation failed");

        assert_eq!(a.terrain, b.terrain);
        assert_eq!(a.report.tile_count, b.report.tile_count);
    }

    #[test]
    fn test_different_seeds_different_terrain() {
        let registry = BlockRegistry::with_defaults();
        let generator = WorldGenerator::new(GeneratorConfig::default(), &registry)
            .expect("valid config");

        let a = generator.generate_with_seed(42).expect("generation failed");
        let b = generator.generate_with_seed(999).expect("generation failed");

        assert_ne!(a.terrain, b.terrain);
    }

    #[test]
    fn test_rejects_bad_config() {
        let registry = BlockRegistry::with_defaults();

        let zero = GeneratorConfig {
            map_size: 0,
            ..Default::default()
        };
        assert_eq!(
            WorldGenerator::new(zero, &registry).err(),
            Some(WorldError::InvalidMapSize(0))
        );

        let unknown = GeneratorConfig {
            base_block: BlockTypeId::new(77),
            ..Default::default()
        };
        assert_eq!(
            WorldGenerator::new(unknown, &registry).err(),
            Some(WorldError::UnknownBlock(BlockTypeId::new(77)))
        );

        let bad_ore = GeneratorConfig {
            ores: vec![OreDistributionSpec::new(block_ids::IRON_ORE, 5.0, 4, 2)],
            ..Default::default()
        };
        assert!(matches!(
            WorldGenerator::new(bad_ore, &registry),
            Err(WorldError::InvalidOreSpec { .. })
        ));
    }

    #[test]
    fn test_report_matches_terrain() {
        let registry = BlockRegistry::with_defaults();
        let generator = WorldGenerator::with_seed(7, &registry).expect("valid config");
        let world = generator.generate().expect("generation failed");

        assert_eq!(world.report.seed, 7);
        assert_eq!(world.report.tile_count, world.terrain.solid_count());
        assert_eq!(world.report.ore_placements.len(), 3);
        for placement in &world.report.ore_placements {
            let count = world
                .terrain
                .material_counts()
                .get(&placement.block)
                .copied()
                .unwrap_or(0);
            assert_eq!(count, placement.placed);
        }
    }

    #[test]
    fn test_generate_map_is_idempotent() {
        let registry = BlockRegistry::with_defaults();
        let generator = WorldGenerator::with_seed(5, &registry).expect("valid config");
        let mut slot = None;

        let first = generator.generate_map(&mut slot).expect("generation failed");
        let snapshot = slot.clone();
        let second = generator.generate_map(&mut slot).expect("generation failed");

        assert_eq!(first.tile_count, second.tile_count);
        assert_eq!(slot, snapshot);
    }

    #[test]
    fn test_spawn_tile_open() {
        let registry = BlockRegistry::with_defaults();
        let generator = WorldGenerator::with_seed(99, &registry).expect("valid config");
        let world = generator.generate().expect("generation failed");
        for dy in -1..=1 {
            for dx in -1..=1 {
                assert!(!world
                    .terrain
                    .has_solid_tile(delve_common::TileCoord::new(dx, dy)));
            }
        }
    }
}
