//! Terrain grid: solidity plus per-cell material.

use ahash::AHashMap;
use delve_common::{BlockTypeId, TileCoord};

use crate::caves::SolidityGrid;

/// Read access to terrain solidity, used by discovery and mining.
pub trait TerrainQuery {
    /// Whether a solid tile exists at the coordinate.
    fn is_solid(&self, tile: TileCoord) -> bool;
}

/// Dense `size × size` terrain.
///
/// Grid cell `(gx, gy)` is the world tile `(gx - size/2, gy - size/2)`, so the
/// map center is tile `(0, 0)`. Material is only meaningful on solid cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerrainGrid {
    size: u32,
    base_material: BlockTypeId,
    solid: Vec<bool>,
    material: Vec<BlockTypeId>,
}

impl TerrainGrid {
    /// Builds terrain from a carved cave grid, filling every cell with the
    /// base material.
    #[must_use]
    pub fn from_solidity(grid: &SolidityGrid, base_material: BlockTypeId) -> Self {
        let cells = grid.cells();
        Self {
            size: grid.size(),
            base_material,
            solid: cells.to_vec(),
            material: vec![base_material; cells.len()],
        }
    }

    /// Edge length in tiles.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Material every cell starts with.
    #[must_use]
    pub const fn base_material(&self) -> BlockTypeId {
        self.base_material
    }

    fn half(&self) -> i32 {
        (self.size / 2) as i32
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.size && y < self.size).then(|| (y as usize) * (self.size as usize) + x as usize)
    }

    /// Converts grid indices to a world tile.
    #[must_use]
    pub fn grid_to_tile(&self, x: u32, y: u32) -> TileCoord {
        TileCoord::new(x as i32 - self.half(), y as i32 - self.half())
    }

    /// Converts a world tile to grid indices, or `None` outside the map.
    #[must_use]
    pub fn tile_to_grid(&self, tile: TileCoord) -> Option<(u32, u32)> {
        let x = i64::from(tile.x) + i64::from(self.half());
        let y = i64::from(tile.y) + i64::from(self.half());
        let size = i64::from(self.size);
        ((0..size).contains(&x) && (0..size).contains(&y)).then_some((x as u32, y as u32))
    }

    /// Whether the grid cell is solid. Out-of-range cells are open.
    #[must_use]
    pub fn is_solid_at(&self, x: u32, y: u32) -> bool {
        self.index(x, y).is_some_and(|i| self.solid[i])
    }

    /// Material of a solid grid cell.
    #[must_use]
    pub fn material_at(&self, x: u32, y: u32) -> Option<BlockTypeId> {
        self.index(x, y)
            .filter(|&i| self.solid[i])
            .map(|i| self.material[i])
    }

    /// Whether a solid cell still holds the base material.
    #[must_use]
    pub fn is_unclaimed_at(&self, x: u32, y: u32) -> bool {
        self.material_at(x, y) == Some(self.base_material)
    }

    /// Overwrites the material of a solid cell. Open cells are left alone.
    pub fn set_material_at(&mut self, x: u32, y: u32, material: BlockTypeId) -> bool {
        match self.index(x, y) {
            Some(i) if self.solid[i] => {
                self.material[i] = material;
                true
            }
            _ => false,
        }
    }

    /// Whether a solid tile exists at a world tile.
    #[must_use]
    pub fn has_solid_tile(&self, tile: TileCoord) -> bool {
        self.tile_to_grid(tile)
            .is_some_and(|(x, y)| self.is_solid_at(x, y))
    }

    /// Material at a world tile, if solid.
    #[must_use]
    pub fn material(&self, tile: TileCoord) -> Option<BlockTypeId> {
        self.tile_to_grid(tile)
            .and_then(|(x, y)| self.material_at(x, y))
    }

    /// Removes a solid tile and returns the material it held.
    ///
    /// Removal is permanent; the cell never becomes solid again.
    pub fn remove_tile(&mut self, tile: TileCoord) -> Option<BlockTypeId> {
        let (x, y) = self.tile_to_grid(tile)?;
        let index = self.index(x, y)?;
        if !self.solid[index] {
            return None;
        }
        self.solid[index] = false;
        Some(self.material[index])
    }

    /// Number of solid cells.
    #[must_use]
    pub fn solid_count(&self) -> usize {
        self.solid.iter().filter(|&&s| s).count()
    }

    /// Number of solid cells per material.
    #[must_use]
    pub fn material_counts(&self) -> AHashMap<BlockTypeId, usize> {
        let mut counts = AHashMap::new();
        for (solid, material) in self.solid.iter().zip(&self.material) {
            if *solid {
                *counts.entry(*material).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Iterates over every world tile of the map.
    pub fn tiles(&self) -> impl Iterator<Item = TileCoord> + '_ {
        (0..self.size).flat_map(move |y| (0..self.size).map(move |x| self.grid_to_tile(x, y)))
    }
}

impl TerrainQuery for TerrainGrid {
    fn is_solid(&self, tile: TileCoord) -> bool {
        self.has_solid_tile(tile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::block_ids;

    fn grid_with(size: u32, solid: &[(u32, u32)]) -> TerrainGrid {
        let mut cells = SolidityGrid::new(size, false).expect("valid size");
        for &(x, y) in solid {
            cells.set(x, y, true);
        }
        TerrainGrid::from_solidity(&cells, block_ids::STONE)
    }

    #[test]
    fn test_centered_coordinates() {
        let grid = grid_with(8, &[]);
        assert_eq!(grid.grid_to_tile(4, 4), TileCoord::new(0, 0));
        assert_eq!(grid.grid_to_tile(0, 0), TileCoord::new(-4, -4));
        assert_eq!(grid.tile_to_grid(TileCoord::new(3, 3)), Some((7, 7)));
        assert_eq!(grid.tile_to_grid(TileCoord::new(4, 0)), None);
        assert_eq!(grid.tile_to_grid(TileCoord::new(-5, 0)), None);
    }

    #[test]
    fn test_solid_and_material_queries() {
        let mut grid = grid_with(8, &[(5, 4)]);
        let tile = TileCoord::new(1, 0);

        assert!(grid.has_solid_tile(tile));
        assert!(grid.is_solid(tile));
        assert_eq!(grid.material(tile), Some(block_ids::STONE));
        assert!(!grid.has_solid_tile(TileCoord::new(0, 0)));
        assert_eq!(grid.material(TileCoord::new(0, 0)), None);
        assert!(!grid.has_solid_tile(TileCoord::new(100, 100)));

        assert!(grid.set_material_at(5, 4, block_ids::IRON_ORE));
        assert_eq!(grid.material(tile), Some(block_ids::IRON_ORE));
        assert!(!grid.is_unclaimed_at(5, 4));
        assert!(!grid.set_material_at(0, 0, block_ids::IRON_ORE));
    }

    #[test]
    fn test_remove_tile_is_permanent() {
        let mut grid = grid_with(8, &[(5, 4)]);
        let tile = TileCoord::new(1, 0);

        assert_eq!(grid.remove_tile(tile), Some(block_ids::STONE));
        assert!(!grid.has_solid_tile(tile));
        assert_eq!(grid.material(tile), None);
        assert_eq!(grid.remove_tile(tile), None);
        assert_eq!(grid.solid_count(), 0);
    }

    #[test]
    fn test_material_counts() {
        let mut grid = grid_with(4, &[(0, 0), (1, 0), (2, 0)]);
        grid.set_material_at(1, 0, block_ids::GOLD_ORE);
        let counts = grid.material_counts();
        assert_eq!(counts.get(&block_ids::STONE), Some(&2));
        assert_eq!(counts.get(&block_ids::GOLD_ORE), Some(&1));
    }

    #[test]
    fn test_tiles_cover_map() {
        let grid = grid_with(4, &[]);
        let tiles: Vec<_> = grid.tiles().collect();
        assert_eq!(tiles.len(), 16);
        assert_eq!(tiles[0], TileCoord::new(-2, -2));
        assert_eq!(tiles[15], TileCoord::new(1, 1));
    }
}
