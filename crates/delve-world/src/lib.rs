//! # Delve World
//!
//! Procedural terrain for Delve.
//!
//! This crate handles:
//! - Block reference data
//! - Cellular-automaton cave carving
//! - Ore vein placement
//! - The terrain grid queried and mined during play

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod blocks;
pub mod caves;
pub mod generation;
pub mod ores;
pub mod terrain;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::blocks::*;
    pub use crate::caves::*;
    pub use crate::generation::*;
    pub use crate::ores::*;
    pub use crate::terrain::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use delve_common::TileCoord;

    #[test]
    fn test_generated_ore_sits_on_solid_tiles() {
        let registry = BlockRegistry::with_defaults();
        let generator = WorldGenerator::with_seed(2024, &registry).expect("valid config");
        let world = generator.generate().expect("generation failed");

        for tile in world.terrain.tiles() {
            match world.terrain.material(tile) {
                Some(block) => assert!(registry.contains(block)),
                None => assert!(!world.terrain.is_solid(tile)),
            }
        }
        assert!(world.terrain.tiles().any(|t| t == TileCoord::new(0, 0)));
    }
}
