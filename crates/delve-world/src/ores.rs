//! Ore vein placement.
//!
//! Veins grow from a random solid start cell by repeatedly claiming a random
//! frontier cell. A cell that already holds a non-base material is never
//! overwritten, so specs applied later cannot eat earlier veins.

use ahash::AHashSet;
use delve_common::{BlockTypeId, WorldError, WorldResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::terrain::TerrainGrid;

/// How much of one ore to place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OreDistributionSpec {
    /// Ore block type
    pub block: BlockTypeId,
    /// Target share of solid tiles, in percent (0-100)
    pub percentage: f32,
    /// Smallest vein
    pub min_vein_size: u32,
    /// Largest vein (inclusive)
    pub max_vein_size: u32,
}

impl OreDistributionSpec {
    /// Creates a spec.
    #[must_use]
    pub const fn new(block: BlockTypeId, percentage: f32, min_vein_size: u32, max_vein_size: u32) -> Self {
        Self {
            block,
            percentage,
            min_vein_size,
            max_vein_size,
        }
    }

    /// Checks the percentage and vein bounds.
    pub fn validate(&self) -> WorldResult<()> {
        let invalid = |reason: &str| WorldError::InvalidOreSpec {
            block: self.block,
            reason: reason.to_string(),
        };
        if !(0.0..=100.0).contains(&self.percentage) {
            return Err(invalid("percentage must be within 0..=100"));
        }
        if self.min_vein_size == 0 {
            return Err(invalid("minimum vein size must be at least 1"));
        }
        if self.max_vein_size < self.min_vein_size {
            return Err(invalid("maximum vein size is below the minimum"));
        }
        Ok(())
    }

    /// Number of ore tiles wanted out of `total_solid` solid tiles.
    #[must_use]
    pub fn target_count(&self, total_solid: usize) -> usize {
        (total_solid as f64 * f64::from(self.percentage) / 100.0).round() as usize
    }
}

/// Outcome of placing one spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrePlacement {
    /// Ore block type
    pub block: BlockTypeId,
    /// Tiles wanted
    pub target: usize,
    /// Tiles actually converted
    pub placed: usize,
    /// Random start cells tried
    pub attempts: usize,
    /// Veins that claimed at least one tile
    pub veins: usize,
}

impl OrePlacement {
    /// Whether fewer tiles were placed than targeted.
    #[must_use]
    pub const fn is_short(&self) -> bool {
        self.placed < self.target
    }
}

/// Places ore veins into terrain.
#[derive(Debug, Default)]
pub struct OreDistributor;

impl OreDistributor {
    /// Attempts allowed per targeted tile before giving up on a spec.
    pub const ATTEMPTS_PER_TILE: usize = 10;

    /// Applies every spec in order and reports each result.
    ///
    /// Targets are computed from the solid count before any ore is placed.
    pub fn place_ores(
        grid: &mut TerrainGrid,
        specs: &[OreDistributionSpec],
        rng: &mut fastrand::Rng,
    ) -> Vec<OrePlacement> {
        let total_solid = grid.solid_count();
        specs
            .iter()
            .map(|spec| Self::place_spec(grid, spec, total_solid, rng))
            .collect()
    }

    fn place_spec(
        grid: &mut TerrainGrid,
        spec: &OreDistributionSpec,
        total_solid: usize,
        rng: &mut fastrand::Rng,
    ) -> OrePlacement {
        let target = spec.target_count(total_solid);
        let max_attempts = target * Self::ATTEMPTS_PER_TILE;
        let size = grid.size();

        let mut placement = OrePlacement {
            block: spec.block,
            target,
            placed: 0,
            attempts: 0,
            veins: 0,
        };

        while placement.placed < target && placement.attempts < max_attempts {
            placement.attempts += 1;
            let start = (rng.u32(0..size), rng.u32(0..size));
            if !grid.is_unclaimed_at(start.0, start.1) {
                continue;
            }
            let vein_size = rng.usize(spec.min_vein_size as usize..=spec.max_vein_size as usize);
            let grown = Self::place_vein(grid, start, vein_size, spec.block, rng);
            if grown > 0 {
                placement.placed += grown;
                placement.veins += 1;
            }
        }

        if placement.is_short() {
            debug!(
                "Ore {} short of target: placed {}/{} after {} attempts",
                spec.block, placement.placed, placement.target, placement.attempts
            );
        } else {
            debug!(
                "Ore {}: placed {} tiles in {} veins",
                spec.block, placement.placed, placement.veins
            );
        }
        placement
    }

    /// Grows a single vein from `start` and returns how many tiles it claimed.
    ///
    /// Candidates are drawn at random and keep their queue order. A cell is
    /// queued unless it is already a candidate or part of this vein; cells
    /// off the map or already claimed are rejected when drawn. The vein stops
    /// at `vein_size` tiles or when no candidates remain.
    pub fn place_vein(
        grid: &mut TerrainGrid,
        start: (u32, u32),
        vein_size: usize,
        block: BlockTypeId,
        rng: &mut fastrand::Rng,
    ) -> usize {
        let size = i64::from(grid.size());
        let start = (i64::from(start.0), i64::from(start.1));
        let mut candidates = vec![start];
        let mut queued = AHashSet::from_iter([start]);
        let mut vein = AHashSet::new();

        while vein.len() < vein_size && !candidates.is_empty() {
            let (x, y) = candidates.remove(rng.usize(0..candidates.len()));
            queued.remove(&(x, y));

            let on_map = (0..size).contains(&x) && (0..size).contains(&y);
            if !on_map || !grid.is_unclaimed_at(x as u32, y as u32) {
                continue;
            }
            grid.set_material_at(x as u32, y as u32, block);
            vein.insert((x, y));

            for next in [(x + 1, y), (x - 1, y), (x, y + 1), (x, y - 1)] {
                if !vein.contains(&next) && queued.insert(next) {
                    candidates.push(next);
                }
            }
        }
        vein.len()
    }
}
