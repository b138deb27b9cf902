use crate::registry::SectorRegistry;
use crate::world::tile::{SectorVnum, Tile};
use crate::world::World;

/// Shifts to the 8 neighbors, in direction order: N, E, S, W, NW, NE, SW, SE.
/// North is +y.
pub const DIRECTIONS: [(i32, i32); 8] = [
    (0, 1),   // north
    (1, 0),   // east
    (0, -1),  // south
    (-1, 0),  // west
    (-1, 1),  // northwest
    (1, 1),   // northeast
    (-1, -1), // southwest
    (1, -1),  // southeast
];

/// What a neighborhood query is looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectorMatch {
    /// A specific sector id.
    Sector(SectorVnum),
    /// Any sector whose flags include all of these bits.
    Flags(u64),
}

impl SectorMatch {
    /// Checks the tile's current sector, then (if `include_base`) its base sector.
    pub fn matches(&self, tile: &Tile, sectors: &SectorRegistry, include_base: bool) -> bool {
        match *self {
            SectorMatch::Sector(vnum) => {
                tile.sector == vnum || (include_base && tile.base_sector == vnum)
            }
            SectorMatch::Flags(flags) => {
                sectors.has_flags(tile.sector, flags)
                    || (include_base && sectors.has_flags(tile.base_sector, flags))
            }
        }
    }
}

fn shift_axis(coord: i32, delta: i32, size: u32, wraps: bool) -> Option<i32> {
    let size = size as i32;
    let moved = coord + delta;
    if (0..size).contains(&moved) {
        Some(moved)
    } else if wraps {
        Some(moved.rem_euclid(size))
    } else {
        None
    }
}

impl World {
    /// Index of the tile `(dx, dy)` away from `index`.
    ///
    /// Axes configured to wrap fold out-of-range coordinates back onto the
    /// map; on a non-wrapping axis an out-of-range shift has no tile.
    pub fn shift(&self, index: usize, dx: i32, dy: i32) -> Option<usize> {
        let (x, y) = self.coords(index);
        let nx = shift_axis(x, dx, self.width, self.wrap.x)?;
        let ny = shift_axis(y, dy, self.height, self.wrap.y)?;
        self.index_of(nx, ny)
    }

    /// Neighbor in one of the 8 `DIRECTIONS`.
    pub fn neighbor(&self, index: usize, dir: usize) -> Option<usize> {
        let (dx, dy) = DIRECTIONS[dir];
        self.shift(index, dx, dy)
    }
}

/// Whole-tile Euclidean distance from plain coordinates (no wraparound
/// correction), truncated toward zero.
pub fn map_distance(world: &World, a: usize, b: usize) -> i32 {
    let (x1, y1) = world.coords(a);
    let (x2, y2) = world.coords(b);
    let dx = (x1 - x2) as f64;
    let dy = (y1 - y2) as f64;
    (dx * dx + dy * dy).sqrt() as i32
}

/// Number of the 8 neighbors satisfying `target`.
pub fn count_adjacent_matching(
    world: &World,
    sectors: &SectorRegistry,
    index: usize,
    target: SectorMatch,
    include_base: bool,
) -> usize {
    (0..DIRECTIONS.len())
        .filter_map(|dir| world.neighbor(index, dir))
        .filter(|&n| target.matches(&world.tiles[n], sectors, include_base))
        .count()
}

/// Number of neighbors whose sector (or base sector) is `sector`.
pub fn count_adjacent(
    world: &World,
    sectors: &SectorRegistry,
    index: usize,
    sector: SectorVnum,
    include_base: bool,
) -> usize {
    count_adjacent_matching(world, sectors, index, SectorMatch::Sector(sector), include_base)
}

/// Number of neighbors whose sector (or base sector) carries all of `flags`.
pub fn count_adjacent_flagged(
    world: &World,
    sectors: &SectorRegistry,
    index: usize,
    flags: u64,
    include_base: bool,
) -> usize {
    count_adjacent_matching(world, sectors, index, SectorMatch::Flags(flags), include_base)
}

/// Whether any tile within `radius` of `index` satisfies `target`.
///
/// Scans the square of side `2 * radius + 1` around the tile (the tile
/// itself excluded) and accepts candidates whose `map_distance` is at most
/// `radius`. The radius is capped at the larger map dimension.
pub fn within_distance(
    world: &World,
    sectors: &SectorRegistry,
    index: usize,
    target: SectorMatch,
    radius: u32,
    include_base: bool,
) -> bool {
    let r = radius.min(world.width.max(world.height)) as i32;
    for dx in -r..=r {
        for dy in -r..=r {
            if dx == 0 && dy == 0 {
                continue;
            }
            let Some(other) = world.shift(index, dx, dy) else {
                continue;
            };
            if other != index
                && target.matches(&world.tiles[other], sectors, include_base)
                && map_distance(world, index, other) <= r
            {
                return true;
            }
        }
    }
    false
}
