pub mod tile;
pub mod topology;

pub use tile::{CropVnum, RoomVnum, Season, SectorVnum, Tile};
pub use topology::{SectorMatch, DIRECTIONS};

/// Per-axis wraparound of the map edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wrap {
    pub x: bool,
    pub y: bool,
}

/// The evolver's private copy of the map grid.
///
/// Tiles are stored row-major (`index = y * width + x`). `land` lists the
/// indices of every tile that was not ocean when the snapshot was loaded, in
/// map order; only those tiles are visited by an evolution pass.
#[derive(Debug, Clone, PartialEq)]
pub struct World {
    pub width: u32,
    pub height: u32,
    pub wrap: Wrap,
    pub tiles: Vec<Tile>,
    pub land: Vec<usize>,
}

impl World {
    /// Build a world from row-major tiles and link up the land list.
    ///
    /// # Panics
    /// Panics if `tiles.len() != width * height`.
    pub fn new(width: u32, height: u32, wrap: Wrap, tiles: Vec<Tile>, ocean: SectorVnum) -> Self {
        assert_eq!(
            tiles.len(),
            width as usize * height as usize,
            "tile count must match a {}x{} grid",
            width,
            height
        );

        let land = tiles
            .iter()
            .enumerate()
            .filter(|(_, t)| t.sector != ocean)
            .map(|(i, _)| i)
            .collect();

        World {
            width,
            height,
            wrap,
            tiles,
            land,
        }
    }

    /// A grid where every tile has the same sector.
    pub fn uniform(width: u32, height: u32, wrap: Wrap, sector: SectorVnum, ocean: SectorVnum) -> Self {
        let tiles = (0..width * height).map(|id| Tile::new(id, sector)).collect();
        Self::new(width, height, wrap, tiles, ocean)
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// (x, y) of the tile at `index`.
    pub fn coords(&self, index: usize) -> (i32, i32) {
        let w = self.width as usize;
        ((index % w) as i32, (index / w) as i32)
    }

    /// Index of (x, y), or None when off the grid. Does not wrap.
    pub fn index_of(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OCEAN: SectorVnum = 6;
    const NO_WRAP: Wrap = Wrap { x: false, y: false };

    #[test]
    fn land_list_skips_ocean_in_map_order() {
        let mut world = World::uniform(3, 2, NO_WRAP, OCEAN, OCEAN);
        world.tiles[4].sector = 0;
        world.tiles[1].sector = 2;
        let world = World::new(3, 2, NO_WRAP, world.tiles, OCEAN);
        assert_eq!(world.land, vec![1, 4]);
    }

    #[test]
    fn all_ocean_world_has_no_land() {
        let world = World::uniform(4, 4, NO_WRAP, OCEAN, OCEAN);
        assert_eq!(world.tile_count(), 16);
        assert!(world.land.is_empty());
    }

    #[test]
    fn coords_and_index_agree() {
        let world = World::uniform(5, 3, NO_WRAP, 0, OCEAN);
        for i in 0..world.tile_count() {
            let (x, y) = world.coords(i);
            assert_eq!(world.index_of(x, y), Some(i));
            assert_eq!(world.tiles[i].id as usize, i);
        }
        assert_eq!(world.coords(7), (2, 1));
        assert_eq!(world.index_of(-1, 0), None);
        assert_eq!(world.index_of(5, 0), None);
        assert_eq!(world.index_of(0, 3), None);
    }

    #[test]
    #[should_panic(expected = "tile count")]
    fn mismatched_tile_count_panics() {
        World::new(2, 2, NO_WRAP, vec![Tile::new(0, 0)], OCEAN);
    }
}
