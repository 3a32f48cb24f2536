//! Per-tile discovery state.
//!
//! A tile present in the field is covered: it belongs to the fogged world.
//! Fog is drawn on a covered tile until its status reaches
//! [`TileStatus::Discovered`], which only [`DiscoveryField::load`] can undo.

use ahash::{AHashMap, AHashSet};
use delve_common::{ChunkCoord, TileCoord, CHUNK_SIZE};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::fade::FadeScheduler;
use crate::save::DiscoverySaveData;

/// Discovery status of a covered tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileStatus {
    /// Fully fogged
    Undiscovered,
    /// Discovery granted, fog fading out
    Discovering,
    /// Fog removed
    Discovered,
}

impl TileStatus {
    /// Whether discovery has been granted.
    #[must_use]
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Discovering | Self::Discovered)
    }
}

/// Authoritative record of what the player has seen.
#[derive(Debug, Clone)]
pub struct DiscoveryField {
    tiles: AHashMap<TileCoord, TileStatus>,
    /// Granted tiles grouped by chunk
    chunks: AHashMap<ChunkCoord, AHashSet<TileCoord>>,
    fades: FadeScheduler,
    fog_alpha: f32,
}

impl Default for DiscoveryField {
    fn default() -> Self {
        Self::new(0.5, 1.0)
    }
}

impl DiscoveryField {
    /// Creates an empty field.
    #[must_use]
    pub fn new(fade_duration: f32, fog_alpha: f32) -> Self {
        Self {
            tiles: AHashMap::new(),
            chunks: AHashMap::new(),
            fades: FadeScheduler::new(fade_duration),
            fog_alpha,
        }
    }

    /// Removes every tile, fade and chunk entry.
    pub fn clear(&mut self) {
        self.tiles.clear();
        self.chunks.clear();
        self.fades.clear();
    }

    /// Covers every tile of a centered `map_size × map_size` map.
    ///
    /// Tiles that were already granted keep their status.
    pub fn cover_map_with_fog(&mut self, map_size: u32) -> usize {
        let half = (map_size / 2) as i32;
        let mut covered = 0;
        for y in 0..map_size as i32 {
            for x in 0..map_size as i32 {
                covered += usize::from(self.cover(TileCoord::new(x - half, y - half)));
            }
        }
        debug!("Covered {covered} tiles of a {map_size}x{map_size} map with fog");
        covered
    }

    /// Covers every tile of one chunk that has not been granted yet.
    pub fn cover_chunk_with_fog(&mut self, chunk: ChunkCoord, chunk_size: u32) -> usize {
        chunk
            .tiles(chunk_size)
            .map(|tile| usize::from(self.cover(tile)))
            .sum()
    }

    fn cover(&mut self, tile: TileCoord) -> bool {
        if self.tiles.contains_key(&tile) {
            return false;
        }
        self.tiles.insert(tile, TileStatus::Undiscovered);
        true
    }

    /// Status of a covered tile.
    #[must_use]
    pub fn status(&self, tile: TileCoord) -> Option<TileStatus> {
        self.tiles.get(&tile).copied()
    }

    /// Whether the tile belongs to the fogged world.
    #[must_use]
    pub fn is_covered(&self, tile: TileCoord) -> bool {
        self.tiles.contains_key(&tile)
    }

    /// Whether fog is currently drawn on the tile.
    #[must_use]
    pub fn has_fog(&self, tile: TileCoord) -> bool {
        self.status(tile)
            .is_some_and(|s| s != TileStatus::Discovered)
    }

    /// Whether the tile has been fully discovered. Uncovered tiles never are.
    #[must_use]
    pub fn is_tile_discovered(&self, tile: TileCoord) -> bool {
        self.status(tile) == Some(TileStatus::Discovered)
    }

    /// Current fog alpha, or `None` where no fog is drawn.
    #[must_use]
    pub fn fog_alpha(&self, tile: TileCoord) -> Option<f32> {
        match self.status(tile)? {
            TileStatus::Undiscovered => Some(self.fog_alpha),
            TileStatus::Discovering => Some(self.fades.alpha(tile).unwrap_or(0.0)),
            TileStatus::Discovered => None,
        }
    }

    /// Grants discovery of a tile and starts its fade.
    ///
    /// Returns `false` without doing anything when the tile is uncovered or
    /// already discovered. A tile that is still fading restarts from its
    /// current alpha.
    pub fn discover_tile(&mut self, tile: TileCoord) -> bool {
        let start_alpha = match self.fog_alpha(tile) {
            Some(alpha) => alpha,
            None => return false,
        };
        self.tiles.insert(tile, TileStatus::Discovering);
        self.index_chunk(tile);
        self.fades.start(tile, start_alpha);
        true
    }

    fn index_chunk(&mut self, tile: TileCoord) {
        self.chunks
            .entry(tile.to_chunk_coord(CHUNK_SIZE))
            .or_default()
            .insert(tile);
    }

    /// Advances every fade; returns tiles that became discovered, sorted.
    pub fn tick(&mut self, dt: f32) -> Vec<TileCoord> {
        let finished = self.fades.advance(dt);
        for tile in &finished {
            self.tiles.insert(*tile, TileStatus::Discovered);
        }
        finished
    }

    /// Stops a tile's fade and completes its discovery at once.
    pub fn cancel_fade(&mut self, tile: TileCoord) -> bool {
        if self.fades.cancel(tile).is_none() {
            return false;
        }
        self.tiles.insert(tile, TileStatus::Discovered);
        true
    }

    /// Running fades.
    #[must_use]
    pub const fn fades(&self) -> &FadeScheduler {
        &self.fades
    }

    /// Granted tiles in one chunk.
    #[must_use]
    pub fn chunk_tiles(&self, chunk: ChunkCoord) -> Option<&AHashSet<TileCoord>> {
        self.chunks.get(&chunk)
    }

    /// Number of chunks holding at least one granted tile.
    #[must_use]
    pub fn discovered_chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Number of covered tiles.
    #[must_use]
    pub fn covered_count(&self) -> usize {
        self.tiles.len()
    }

    /// Number of tiles with the given status.
    #[must_use]
    pub fn count(&self, status: TileStatus) -> usize {
        self.tiles.values().filter(|&&s| s == status).count()
    }

    /// Snapshot of every fully discovered tile, ordered by chunk then tile.
    ///
    /// Tiles still fading are left out; they load back as fog.
    #[must_use]
    pub fn save(&self) -> DiscoverySaveData {
        let mut tiles: Vec<TileCoord> = self
            .chunks
            .values()
            .flat_map(|set| set.iter().copied())
            .filter(|tile| self.is_tile_discovered(*tile))
            .collect();
        tiles.sort_unstable_by_key(|t| (t.to_chunk_coord(CHUNK_SIZE), *t));
        DiscoverySaveData::new(tiles)
    }

    /// Replaces all discovery state with a snapshot.
    ///
    /// Covered tiles return to fog, then every saved tile is marked
    /// discovered without a fade.
    pub fn load(&mut self, data: &DiscoverySaveData) {
        self.fades.clear();
        self.chunks.clear();
        for status in self.tiles.values_mut() {
            *status = TileStatus::Undiscovered;
        }
        for &tile in &data.tiles {
            self.tiles.insert(tile, TileStatus::Discovered);
            self.index_chunk(tile);
        }
        info!("Restored {} discovered tiles", data.tiles.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn covered_field(map_size: u32) -> DiscoveryField {
        let mut field = DiscoveryField::new(0.5, 1.0);
        field.cover_map_with_fog(map_size);
        field
    }

    #[test]
    fn test_cover_map_centered() {
        let field = covered_field(8);
        assert_eq!(field.covered_count(), 64);
        assert!(field.is_covered(TileCoord::new(-4, -4)));
        assert!(field.is_covered(TileCoord::new(3, 3)));
        assert!(!field.is_covered(TileCoord::new(4, 0)));
        assert!(field.has_fog(TileCoord::new(0, 0)));
        assert_eq!(field.fog_alpha(TileCoord::new(0, 0)), Some(1.0));
    }

    #[test]
    fn test_discover_tile_lifecycle() {
        let mut field = covered_field(8);
        let tile = TileCoord::new(1, 2);

        assert!(field.discover_tile(tile));
        assert_eq!(field.status(tile), Some(TileStatus::Discovering));
        assert!(!field.is_tile_discovered(tile));
        assert!(field.has_fog(tile));

        field.tick(0.25);
        assert!(field.fog_alpha(tile).is_some_and(|a| a < 1.0 && a > 0.0));

        let finished = field.tick(0.25);
        assert_eq!(finished, vec![tile]);
        assert!(field.is_tile_discovered(tile));
        assert!(!field.has_fog(tile));
        assert!(!field.discover_tile(tile));
    }

    #[test]
    fn test_discover_uncovered_is_noop() {
        let mut field = covered_field(4);
        assert!(!field.discover_tile(TileCoord::new(50, 50)));
        assert!(!field.is_tile_discovered(TileCoord::new(50, 50)));
        assert_eq!(field.discovered_chunk_count(), 0);
    }

    #[test]
    fn test_rediscover_restarts_from_current_alpha() {
        let mut field = covered_field(4);
        let tile = TileCoord::new(0, 0);
        field.discover_tile(tile);
        field.tick(0.25);
        let alpha = field.fog_alpha(tile).expect("still fading");

        assert!(field.discover_tile(tile));
        let fade = field.fades().get(tile).expect("restarted");
        assert!((fade.start_alpha() - alpha).abs() < f32::EPSILON);
        assert_eq!(field.fades().len(), 1);
    }

    #[test]
    fn test_cancel_fade_completes_discovery() {
        let mut field = covered_field(4);
        let tile = TileCoord::new(-1, 0);
        field.discover_tile(tile);

        assert!(field.cancel_fade(tile));
        assert!(field.is_tile_discovered(tile));
        assert!(field.fades().is_empty());
        assert!(!field.cancel_fade(tile));
    }

    #[test]
    fn test_chunk_index_tracks_granted_tiles() {
        let mut field = DiscoveryField::default();
        field.cover_chunk_with_fog(ChunkCoord::new(-1, 0), CHUNK_SIZE);
        assert_eq!(field.covered_count(), (CHUNK_SIZE * CHUNK_SIZE) as usize);

        let tile = TileCoord::new(-5, 7);
        field.discover_tile(tile);
        let set = field
            .chunk_tiles(ChunkCoord::new(-1, 0))
            .expect("chunk indexed");
        assert!(set.contains(&tile));
    }

    #[test]
    fn test_cover_chunk_skips_granted() {
        let mut field = covered_field(4);
        let tile = TileCoord::new(0, 0);
        field.discover_tile(tile);
        field.tick(1.0);

        let added = field.cover_chunk_with_fog(ChunkCoord::new(0, 0), CHUNK_SIZE);
        assert_eq!(added, (CHUNK_SIZE * CHUNK_SIZE) as usize - 4);
        assert!(field.is_tile_discovered(tile));
    }

    #[test]
    fn test_save_sorted_by_chunk_then_tile() {
        let mut field = DiscoveryField::default();
        field.cover_map_with_fog(128);
        for tile in [
            TileCoord::new(40, 1),
            TileCoord::new(-1, 0),
            TileCoord::new(3, 3),
            TileCoord::new(2, 5),
        ] {
            field.discover_tile(tile);
        }
        field.tick(1.0);

        let data = field.save();
        assert_eq!(
            data.tiles,
            vec![
                TileCoord::new(-1, 0),
                TileCoord::new(2, 5),
                TileCoord::new(3, 3),
                TileCoord::new(40, 1),
            ]
        );
    }

    #[test]
    fn test_load_replaces_state() {
        let mut field = covered_field(8);
        field.discover_tile(TileCoord::new(0, 0));
        field.discover_tile(TileCoord::new(1, 0));
        field.tick(1.0);
        field.discover_tile(TileCoord::new(2, 0));

        let data = DiscoverySaveData::new(vec![TileCoord::new(-2, -2), TileCoord::new(1, 0)]);
        field.load(&data);

        assert!(!field.is_tile_discovered(TileCoord::new(0, 0)));
        assert!(field.has_fog(TileCoord::new(0, 0)));
        assert_eq!(field.status(TileCoord::new(2, 0)), Some(TileStatus::Undiscovered));
        assert!(field.is_tile_discovered(TileCoord::new(-2, -2)));
        assert!(field.is_tile_discovered(TileCoord::new(1, 0)));
        assert!(field.fades().is_empty());
        assert_eq!(field.count(TileStatus::Discovered), 2);
        assert_eq!(field.save(), DiscoverySaveData::new(vec![TileCoord::new(-2, -2), TileCoord::new(1, 0)]));
    }

    #[test]
    fn test_save_skips_fading_tiles() {
        let mut field = covered_field(8);
        field.discover_tile(TileCoord::new(0, 0));
        field.tick(1.0);
        field.discover_tile(TileCoord::new(1, 1));
        assert_eq!(field.status(TileCoord::new(1, 1)), Some(TileStatus::Discovering));

        let data = field.save();
        assert_eq!(data.tiles, vec![TileCoord::new(0, 0)]);

        let mut restored = covered_field(8);
        restored.load(&data);
        assert!(!restored.is_tile_discovered(TileCoord::new(1, 1)));
        assert!(restored.has_fog(TileCoord::new(1, 1)));
        assert_eq!(
            restored.count(TileStatus::Discovered),
            field.count(TileStatus::Discovered)
        );
    }

    proptest! {
        #[test]
        fn test_save_load_preserves_discovered_set(
            picks in proptest::collection::vec((-8i32..8, -8i32..8), 0..60),
        ) {
            let mut field = covered_field(16);
            for (x, y) in &picks {
                field.discover_tile(TileCoord::new(*x, *y));
            }
            field.tick(1.0);
            let data = field.save();

            let mut restored = covered_field(16);
            restored.load(&data);

            for y in -8..8 {
                for x in -8..8 {
                    let tile = TileCoord::new(x, y);
                    prop_assert_eq!(field.is_tile_discovered(tile), restored.is_tile_discovered(tile));
                }
            }
            prop_assert_eq!(restored.save(), data);
        }
    }
}
