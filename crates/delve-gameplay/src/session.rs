//! Exploration session: one map, its fog and the player's tools.
//!
//! The session is the only owner of mutable game state. Each collaborator
//! receives exactly the pieces it needs on every call.

use delve_common::{DelveResult, TileCoord, WorldResult};
use delve_fog::{
    DiscoveryField, DiscoverySaveData, DiscoveryStore, RevealConfig, RevealEngine, RevealTick,
};
use delve_world::{BlockRegistry, GenerationReport, GeneratorConfig, TerrainGrid, WorldGenerator};
use glam::Vec2;
use tracing::info;

use crate::mining::{MinedBlock, MiningConfig, MiningContext, MiningError, MiningManager, MiningResult};

/// Single-threaded owner of terrain, discovery and mining.
#[derive(Debug)]
pub struct ExplorationSession {
    registry: BlockRegistry,
    generator: WorldGenerator,
    terrain: Option<TerrainGrid>,
    field: DiscoveryField,
    reveal: RevealEngine,
    mining: MiningManager,
    rng: fastrand::Rng,
    started: bool,
}

impl ExplorationSession {
    /// Creates a session. No map exists until [`Self::generate_map`] runs.
    pub fn new(
        world: GeneratorConfig,
        reveal: RevealConfig,
        mining: MiningConfig,
        registry: BlockRegistry,
    ) -> WorldResult<Self> {
        let generator = WorldGenerator::new(world, &registry)?;
        Ok(Self {
            field: reveal.new_field(),
            reveal: RevealEngine::new(reveal),
            mining: MiningManager::new(mining),
            registry,
            generator,
            terrain: None,
            rng: fastrand::Rng::new(),
            started: false,
        })
    }

    /// Creates a session with default settings and a fixed seed.
    pub fn with_seed(seed: u64) -> WorldResult<Self> {
        Self::new(
            GeneratorConfig {
                seed: Some(seed),
                ..Default::default()
            },
            RevealConfig::default(),
            MiningConfig::default(),
            BlockRegistry::with_defaults(),
        )
    }

    /// Generates a fresh map and covers it with fog.
    ///
    /// All previous terrain, discovery and mining progress is discarded.
    pub fn generate_map(&mut self) -> WorldResult<GenerationReport> {
        self.mining.cancel();
        self.reveal.cancel_chamber();
        self.field.clear();

        let report = self.generator.generate_map(&mut self.terrain)?;
        self.field.cover_map_with_fog(report.map_size);
        self.rng = fastrand::Rng::with_seed(report.seed);
        self.started = false;
        Ok(report)
    }

    /// Runs one frame with the player at `player`.
    ///
    /// The first tick after generation reveals the starting area at once.
    pub fn tick(&mut self, player: Vec2, dt: f32) -> RevealTick {
        let Some(terrain) = self.terrain.as_ref() else {
            return RevealTick::default();
        };
        if !self.started {
            self.started = true;
            let area_revealed = self.reveal.start(&mut self.field, terrain, player);
            return RevealTick {
                area_revealed,
                ..RevealTick::default()
            };
        }
        self.reveal.update(&mut self.field, terrain, player, dt)
    }

    /// Mines `tile` for `dt` seconds.
    pub fn mine(
        &mut self,
        player: Vec2,
        tile: TileCoord,
        dt: f32,
    ) -> MiningResult<Option<MinedBlock>> {
        let terrain = self.terrain.as_mut().ok_or(MiningError::NoMap)?;
        let ctx = MiningContext {
            terrain,
            field: &self.field,
            registry: &self.registry,
            rng: &mut self.rng,
        };
        self.mining.try_mine(player, tile, ctx, dt)
    }

    /// Abandons mining progress.
    pub fn cancel_mining(&mut self) {
        self.mining.cancel();
    }

    /// Whether the tile is fully discovered.
    #[must_use]
    pub fn is_tile_discovered(&self, tile: TileCoord) -> bool {
        self.field.is_tile_discovered(tile)
    }

    /// Whether a solid tile exists.
    #[must_use]
    pub fn has_solid_tile(&self, tile: TileCoord) -> bool {
        self.terrain
            .as_ref()
            .is_some_and(|t| t.has_solid_tile(tile))
    }

    /// Reveals an area with a one-off radius.
    pub fn force_reveal_area(&mut self, position: Vec2, radius: f32) -> usize {
        match self.terrain.as_ref() {
            Some(terrain) => {
                self.reveal
                    .force_reveal_area(&mut self.field, terrain, position, radius)
            },
            None => 0,
        }
    }

    /// Starts a chamber reveal at the tile containing `position`.
    pub fn force_reveal_chamber(&mut self, position: Vec2) -> bool {
        match self.terrain.as_ref() {
            Some(terrain) => self
                .reveal
                .force_reveal_chamber(&mut self.field, terrain, position),
            None => false,
        }
    }

    /// Snapshot of discovery state.
    #[must_use]
    pub fn save(&self) -> DiscoverySaveData {
        self.field.save()
    }

    /// Replaces discovery state with a snapshot.
    pub fn load(&mut self, data: &DiscoverySaveData) {
        self.reveal.load_discovery(&mut self.field, data);
    }

    /// Writes discovery state to a store.
    pub fn save_to(&self, store: &DiscoveryStore, name: &str) -> DelveResult<()> {
        store.save(name, &self.save())?;
        Ok(())
    }

    /// Restores discovery state from a store.
    pub fn load_from(&mut self, store: &DiscoveryStore, name: &str) -> DelveResult<()> {
        let data = store.load(name)?;
        self.load(&data);
        info!("Session restored from save '{name}'");
        Ok(())
    }

    /// Regenerates the configured map and restores a saved discovery onto it.
    ///
    /// Saves hold discovery only, so the world seed must be fixed for the
    /// terrain to match the one that was explored.
    pub fn resume(&mut self, store: &DiscoveryStore, name: &str) -> DelveResult<GenerationReport> {
        let report = self.generate_map()?;
        self.load_from(store, name)?;
        Ok(report)
    }

    /// Current terrain.
    #[must_use]
    pub const fn terrain(&self) -> Option<&TerrainGrid> {
        self.terrain.as_ref()
    }

    /// Discovery state.
    #[must_use]
    pub const fn field(&self) -> &DiscoveryField {
        &self.field
    }

    /// Reveal engine.
    #[must_use]
    pub const fn reveal(&self) -> &RevealEngine {
        &self.reveal
    }

    /// Mining manager.
    #[must_use]
    pub const fn mining(&self) -> &MiningManager {
        &self.mining
    }

    /// Block definitions.
    #[must_use]
    pub const fn registry(&self) -> &BlockRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delve_common::DelveError;
    use delve_fog::TileStatus;
    use tempfile::TempDir;

    const SPAWN: Vec2 = Vec2::new(0.5, 0.5);

    fn explored_session(seed: u64) -> ExplorationSession {
        let mut session = ExplorationSession::with_seed(seed).expect("valid config");
        session.generate_map().expect("generation failed");
        session.tick(SPAWN, 0.0);
        for _ in 0..1500 {
            session.tick(SPAWN, 0.02);
        }
        session
    }

    /// A discovered solid tile within reach of spawn.
    fn minable_near_spawn(session: &ExplorationSession) -> Option<TileCoord> {
        (-2..=2)
            .flat_map(|y| (-2..=2).map(move |x| TileCoord::new(x, y)))
            .filter(|t| t.center().distance(SPAWN) <= 3.0)
            .find(|t| session.has_solid_tile(*t) && session.is_tile_discovered(*t))
    }

    #[test]
    fn test_tick_without_map_is_noop() {
        let mut session = ExplorationSession::with_seed(1).expect("valid config");
        assert_eq!(session.tick(SPAWN, 0.1), RevealTick::default());
        assert_eq!(
            session.mine(SPAWN, TileCoord::new(1, 0), 0.1),
            Err(MiningError::NoMap)
        );
        assert_eq!(session.force_reveal_area(SPAWN, 3.0), 0);
        assert!(!session.force_reveal_chamber(SPAWN));
    }

    #[test]
    fn test_generate_covers_map_with_fog() {
        let mut session = ExplorationSession::with_seed(3).expect("valid config");
        let report = session.generate_map().expect("generation failed");

        assert_eq!(session.field().covered_count(), 64 * 64);
        assert_eq!(session.field().count(TileStatus::Undiscovered), 64 * 64);
        assert_eq!(
            report.tile_count,
            session.terrain().map_or(0, TerrainGrid::solid_count)
        );
    }

    #[test]
    fn test_first_tick_reveals_spawn() {
        let mut session = ExplorationSession::with_seed(3).expect("valid config");
        session.generate_map().expect("generation failed");

        let tick = session.tick(SPAWN, 0.016);
        assert!(tick.area_revealed > 0);
        assert!(session
            .field()
            .status(TileCoord::new(0, 0))
            .is_some_and(TileStatus::is_granted));
    }

    #[test]
    fn test_regenerate_resets_discovery() {
        let mut session = explored_session(4);
        assert!(session.is_tile_discovered(TileCoord::new(0, 0)));

        session.generate_map().expect("generation failed");
        assert!(!session.is_tile_discovered(TileCoord::new(0, 0)));
        assert!(!session.reveal().has_active_chamber());
    }

    #[test]
    fn test_mine_discovered_tile() {
        let mut session = explored_session(8);
        let Some(tile) = minable_near_spawn(&session) else {
            return;
        };

        let mut mined = None;
        for _ in 0..20 {
            if let Some(block) = session.mine(SPAWN, tile, 0.5).expect("mining allowed") {
                mined = Some(block);
                break;
            }
        }
        let mined = mined.expect("tile should break");
        assert_eq!(mined.tile, tile);
        assert!(!session.has_solid_tile(tile));
        assert!(session.is_tile_discovered(tile));
    }

    #[test]
    fn test_cannot_mine_under_fog() {
        let mut session = ExplorationSession::with_seed(8).expect("valid config");
        session.generate_map().expect("generation failed");

        let result = session.mine(SPAWN, TileCoord::new(2, 0), 0.5);
        assert!(matches!(
            result,
            Err(MiningError::NotDiscovered { .. } | MiningError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_force_reveal_area() {
        let mut session = ExplorationSession::with_seed(6).expect("valid config");
        session.generate_map().expect("generation failed");

        let granted = session.force_reveal_area(Vec2::new(20.5, 20.5), 2.0);
        assert!(granted > 0);
        assert!((session.reveal().config().discovery_radius - 4.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_save_load_through_store() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = DiscoveryStore::new(temp_dir.path());

        let session = explored_session(12);
        session.save_to(&store, "run").expect("save should succeed");

        let mut restored = ExplorationSession::with_seed(12).expect("valid config");
        restored.generate_map().expect("generation failed");
        restored.load_from(&store, "run").expect("load should succeed");

        assert_eq!(restored.save(), session.save());
        assert!(restored.is_tile_discovered(TileCoord::new(0, 0)));
    }

    #[test]
    fn test_resume_regenerates_and_restores() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = DiscoveryStore::new(temp_dir.path());

        let session = explored_session(21);
        session.save_to(&store, "slot").expect("save should succeed");

        let mut resumed = ExplorationSession::with_seed(21).expect("valid config");
        let report = resumed.resume(&store, "slot").expect("resume should succeed");
        assert_eq!(report.seed, 21);
        assert_eq!(resumed.save(), session.save());
        assert_eq!(
            resumed.terrain().map(TerrainGrid::solid_count),
            session.terrain().map(TerrainGrid::solid_count)
        );
    }

    #[test]
    fn test_resume_missing_save() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = DiscoveryStore::new(temp_dir.path());

        let mut session = ExplorationSession::with_seed(2).expect("valid config");
        let err = session.resume(&store, "nothing").expect_err("no such save");
        assert!(matches!(err, DelveError::NotFound(ref name) if name == "nothing"));
    }
}
