//! Coordinate types for tiles and chunks.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Edge length of a chunk in tiles.
pub const CHUNK_SIZE: u32 = 32;

/// Tile coordinate (one cell of the world grid).
///
/// Tiles are one world unit wide, so the tile containing a world position is
/// found by flooring both components.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Pod,
    Zeroable,
)]
#[repr(C)]
pub struct TileCoord {
    /// X coordinate in tile space
    pub x: i32,
    /// Y coordinate in tile space
    pub y: i32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the tile containing a world position.
    #[must_use]
    pub fn from_world(position: Vec2) -> Self {
        Self {
            x: position.x.floor() as i32,
            y: position.y.floor() as i32,
        }
    }

    /// Returns the world position of the tile center.
    #[must_use]
    pub fn center(self) -> Vec2 {
        Vec2::new(self.x as f32 + 0.5, self.y as f32 + 0.5)
    }

    /// Returns this coordinate shifted by an offset.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Squared distance between tile centers.
    #[must_use]
    pub const fn distance_squared(self, other: Self) -> i64 {
        let dx = (self.x as i64) - (other.x as i64);
        let dy = (self.y as i64) - (other.y as i64);
        dx * dx + dy * dy
    }

    /// Euclidean distance between tile centers.
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (self.distance_squared(other) as f32).sqrt()
    }

    /// The four edge-adjacent neighbors (right, left, up, down).
    #[must_use]
    pub const fn neighbors4(self) -> [Self; 4] {
        [
            self.offset(1, 0),
            self.offset(-1, 0),
            self.offset(0, 1),
            self.offset(0, -1),
        ]
    }

    /// Converts to the chunk containing this tile.
    #[must_use]
    pub const fn to_chunk_coord(self, chunk_size: u32) -> ChunkCoord {
        let size = chunk_size as i32;
        ChunkCoord {
            x: self.x.div_euclid(size),
            y: self.y.div_euclid(size),
        }
    }
}

/// Chunk coordinate (identifies a square group of tiles).
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Pod,
    Zeroable,
)]
#[repr(C)]
pub struct ChunkCoord {
    /// X coordinate in chunk space
    pub x: i32,
    /// Y coordinate in chunk space
    pub y: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the lowest tile coordinate inside this chunk.
    #[must_use]
    pub const fn origin_tile(self, chunk_size: u32) -> TileCoord {
        TileCoord {
            x: self.x * chunk_size as i32,
            y: self.y * chunk_size as i32,
        }
    }

    /// Iterates every tile of the chunk, row by row.
    pub fn tiles(self, chunk_size: u32) -> impl Iterator<Item = TileCoord> {
        let origin = self.origin_tile(chunk_size);
        let size = chunk_size as i32;
        (0..size).flat_map(move |dy| (0..size).map(move |dx| origin.offset(dx, dy)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_negative_tiles_floor_into_chunks() {
        assert_eq!(TileCoord::new(-1, -1).to_chunk_coord(32), ChunkCoord::new(-1, -1));
        assert_eq!(TileCoord::new(-32, 0).to_chunk_coord(32), ChunkCoord::new(-1, 0));
        assert_eq!(TileCoord::new(-33, 31).to_chunk_coord(32), ChunkCoord::new(-2, 0));
        assert_eq!(TileCoord::new(32, 64).to_chunk_coord(32), ChunkCoord::new(1, 2));
    }

    #[test]
    fn test_from_world_floors() {
        assert_eq!(TileCoord::from_world(Vec2::new(0.9, 0.1)), TileCoord::new(0, 0));
        assert_eq!(TileCoord::from_world(Vec2::new(-0.1, -1.5)), TileCoord::new(-1, -2));
        assert_eq!(TileCoord::new(2, -3).center(), Vec2::new(2.5, -2.5));
    }

    #[test]
    fn test_chunk_tiles_cover_chunk() {
        let chunk = ChunkCoord::new(-1, 2);
        let tiles: Vec<_> = chunk.tiles(4).collect();
        assert_eq!(tiles.len(), 16);
        assert!(tiles.iter().all(|t| t.to_chunk_coord(4) == chunk));
        assert_eq!(tiles[0], TileCoord::new(-4, 8));
    }

    proptest! {
        #[test]
        fn prop_tile_lies_inside_its_chunk(x in -10_000i32..10_000, y in -10_000i32..10_000) {
            let tile = TileCoord::new(x, y);
            let chunk = tile.to_chunk_coord(CHUNK_SIZE);
            let origin = chunk.origin_tile(CHUNK_SIZE);
            prop_assert!(origin.x <= x && x < origin.x + CHUNK_SIZE as i32);
            prop_assert!(origin.y <= y && y < origin.y + CHUNK_SIZE as i32);
        }
    }
}
