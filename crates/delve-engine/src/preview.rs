//! Text rendering of maps for the terminal.

use delve_common::{BlockTypeId, TileCoord};
use delve_fog::DiscoveryField;
use delve_world::{block_ids, TerrainGrid};

/// Character for a solid tile of the given material.
fn material_glyph(block: BlockTypeId) -> char {
    match block {
        block_ids::STONE => '#',
        block_ids::COPPER_ORE => 'c',
        block_ids::IRON_ORE => 'i',
        block_ids::GOLD_ORE => 'g',
        _ => '?',
    }
}

/// Renders terrain row by row, top row first.
///
/// With a discovery field, tiles still under fog are drawn as `~`.
pub fn render(terrain: &TerrainGrid, field: Option<&DiscoveryField>, player: Option<TileCoord>) -> String {
    let size = terrain.size();
    let mut out = String::with_capacity(((size + 1) * size) as usize);

    for y in (0..size).rev() {
        for x in 0..size {
            let tile = terrain.grid_to_tile(x, y);
            let glyph = if player == Some(tile) {
                '@'
            } else if field.is_some_and(|f| f.has_fog(tile)) {
                '~'
            } else {
                terrain.material(tile).map_or('.', material_glyph)
            };
            out.push(glyph);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use delve_world::SolidityGrid;

    fn terrain() -> TerrainGrid {
        let mut cells = SolidityGrid::new(4, false).expect("valid size");
        cells.set(0, 0, true);
        cells.set(3, 3, true);
        let mut grid = TerrainGrid::from_solidity(&cells, block_ids::STONE);
        grid.set_material_at(3, 3, block_ids::GOLD_ORE);
        grid
    }

    #[test]
    fn test_render_terrain() {
        let text = render(&terrain(), None, None);
        assert_eq!(text, "...g\n....\n....\n#...\n");
    }

    #[test]
    fn test_render_player_and_fog() {
        let grid = terrain();
        let mut field = DiscoveryField::default();
        field.cover_map_with_fog(4);
        field.discover_tile(TileCoord::new(1, 1));
        field.cancel_fade(TileCoord::new(1, 1));

        let text = render(&grid, Some(&field), Some(TileCoord::new(0, 0)));
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows[0], "~~~g");
        assert_eq!(rows[1], "~~@~");
        assert_eq!(rows[2], "~~~~");
    }
}
