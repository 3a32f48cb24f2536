//! Cellular-automaton cave carving.
//!
//! A random solid/open pattern is smoothed a fixed number of times. Each pass
//! counts the 8 neighbors of every cell, with cells outside the map counted
//! as solid, so generated maps tend to be closed at the border.

use delve_common::{WorldError, WorldResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Boolean solid/open grid produced by the cave generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolidityGrid {
    size: u32,
    cells: Vec<bool>,
}

impl SolidityGrid {
    /// Creates a grid with every cell set to `solid`.
    pub fn new(size: u32, solid: bool) -> WorldResult<Self> {
        if size == 0 {
            return Err(WorldError::InvalidMapSize(size));
        }
        Ok(Self {
            size,
            cells: vec![solid; (size as usize) * (size as usize)],
        })
    }

    /// Creates a noise grid where each cell is solid with probability `density`.
    pub fn random(size: u32, density: f32, rng: &mut fastrand::Rng) -> WorldResult<Self> {
        let mut grid = Self::new(size, false)?;
        for cell in &mut grid.cells {
            *cell = rng.f32() < density;
        }
        Ok(grid)
    }

    /// Edge length of the grid.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.size as usize) + (x as usize)
    }

    /// Whether the cell is solid. Out-of-range cells are reported open.
    #[must_use]
    pub fn is_solid(&self, x: u32, y: u32) -> bool {
        x < self.size && y < self.size && self.cells[self.index(x, y)]
    }

    /// Sets a cell; out-of-range writes are ignored.
    pub fn set(&mut self, x: u32, y: u32, solid: bool) {
        if x < self.size && y < self.size {
            let index = self.index(x, y);
            self.cells[index] = solid;
        }
    }

    /// Counts solid cells among the 8 neighbors, treating the outside as solid.
    #[must_use]
    pub fn solid_neighbor_count(&self, x: u32, y: u32) -> u8 {
        let size = i64::from(self.size);
        let mut count = 0;
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let nx = i64::from(x) + dx;
                let ny = i64::from(y) + dy;
                let inside = (0..size).contains(&nx) && (0..size).contains(&ny);
                if !inside || self.cells[(ny * size + nx) as usize] {
                    count += 1;
                }
            }
        }
        count
    }

    /// Applies one smoothing pass and returns the new grid.
    ///
    /// Every cell reads from `self`; nothing is updated in place.
    #[must_use]
    pub fn smoothed(&self) -> Self {
        let mut next = self.cells.clone();
        for y in 0..self.size {
            for x in 0..self.size {
                let index = self.index(x, y);
                next[index] = match self.solid_neighbor_count(x, y) {
                    n if n > 4 => true,
                    n if n < 4 => false,
                    _ => self.cells[index],
                };
            }
        }
        Self {
            size: self.size,
            cells: next,
        }
    }

    /// Forces a centered square of `extent × extent` cells open.
    pub fn clear_center(&mut self, extent: u32) {
        if extent == 0 {
            return;
        }
        let center = i64::from(self.size / 2);
        let half = i64::from(extent / 2);
        for dy in -half..=half {
            for dx in -half..=half {
                let (x, y) = (center + dx, center + dy);
                if x >= 0 && y >= 0 {
                    self.set(x as u32, y as u32, false);
                }
            }
        }
    }

    /// Number of solid cells.
    #[must_use]
    pub fn solid_count(&self) -> usize {
        self.cells.iter().filter(|&&solid| solid).count()
    }

    /// Raw cells, row by row.
    #[must_use]
    pub fn cells(&self) -> &[bool] {
        &self.cells
    }
}

/// Cave carving parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaveConfig {
    /// Probability that a cell starts solid
    pub density: f32,
    /// Number of smoothing passes
    pub smoothing_iterations: u32,
    /// Edge length of the square forced open at the map center
    pub spawn_clear_size: u32,
}

impl Default for CaveConfig {
    fn default() -> Self {
        Self {
            density: 0.45,
            smoothing_iterations: 5,
            spawn_clear_size: 3,
        }
    }
}

/// Cellular-automaton cave generator.
#[derive(Debug, Clone)]
pub struct CaveGenerator {
    config: CaveConfig,
}

impl CaveGenerator {
    /// Creates a generator, rejecting densities outside `[0, 1]`.
    pub fn new(config: CaveConfig) -> WorldResult<Self> {
        if !(0.0..=1.0).contains(&config.density) {
            return Err(WorldError::InvalidDensity(config.density));
        }
        Ok(Self { config })
    }

    /// Returns the generator configuration.
    #[must_use]
    pub const fn config(&self) -> &CaveConfig {
        &self.config
    }

    /// Generates a `size × size` grid: noise, smoothing, then spawn clearing.
    pub fn generate(&self, size: u32, rng: &mut fastrand::Rng) -> WorldResult<SolidityGrid> {
        let mut grid = SolidityGrid::random(size, self.config.density, rng)?;
        for _ in 0..self.config.smoothing_iterations {
            grid = grid.smoothed();
        }
        grid.clear_center(self.config.spawn_clear_size);

        debug!(
            "Carved {size}x{size} caves: {} solid after {} passes",
            grid.solid_count(),
            self.config.smoothing_iterations
        );
        Ok(grid)
    }
}

/// Generates a cave grid from a seed with the default spawn clearing.
pub fn generate_caves(
    size: u32,
    density: f32,
    smoothing_iterations: u32,
    seed: u64,
) -> WorldResult<SolidityGrid> {
    let generator = CaveGenerator::new(CaveConfig {
        density,
        smoothing_iterations,
        ..CaveConfig::default()
    })?;
    generator.generate(size, &mut fastrand::Rng::with_seed(seed))
}
