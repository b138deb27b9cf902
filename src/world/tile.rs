/// Sector (terrain type) id as used in data files and snapshots.
pub type SectorVnum = i32;
/// Crop type id.
pub type CropVnum = i32;
/// Map position id: `y * width + x`.
pub type RoomVnum = u32;

/// Sentinel for "no sector" / "no crop".
pub const NOTHING: i32 = -1;

// Tile affect bits
pub const AFF_NO_EVOLVE: u64 = 1 << 5;

// Evolver bits (set by the server when it writes the snapshot)
pub const EVOLVER_OWNED: u64 = 1 << 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

// === Tile ===

#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub id: RoomVnum,
    pub island_id: i32,
    pub sector: SectorVnum,
    pub base_sector: SectorVnum,
    pub natural_sector: SectorVnum,
    pub crop: Option<CropVnum>,
    pub affects: u64,
    pub evolver_flags: u64,
    /// Unix time of the last sector change.
    pub sector_time: i64,
}

impl Tile {
    /// An unclaimed tile of `sector` whose base and natural sector match it.
    pub fn new(id: RoomVnum, sector: SectorVnum) -> Self {
        Self {
            id,
            island_id: NOTHING,
            sector,
            base_sector: sector,
            natural_sector: sector,
            crop: None,
            affects: 0,
            evolver_flags: 0,
            sector_time: 0,
        }
    }

    pub fn never_evolves(&self) -> bool {
        self.affects & AFF_NO_EVOLVE != 0
    }

    pub fn is_owned(&self) -> bool {
        self.evolver_flags & EVOLVER_OWNED != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_tile_is_unowned_and_evolvable() {
        let tile = Tile::new(12, 3);
        assert_eq!(tile.id, 12);
        assert_eq!(tile.sector, 3);
        assert_eq!(tile.base_sector, 3);
        assert_eq!(tile.natural_sector, 3);
        assert_eq!(tile.crop, None);
        assert!(!tile.is_owned());
        assert!(!tile.never_evolves());
    }

    #[test]
    fn flag_helpers_read_their_bits() {
        let mut tile = Tile::new(0, 1);
        tile.affects = AFF_NO_EVOLVE;
        tile.evolver_flags = EVOLVER_OWNED;
        assert!(tile.never_evolves());
        assert!(tile.is_owned());

        tile.affects = 1 << 4;
        tile.evolver_flags = 1 << 3;
        assert!(!tile.never_evolves());
        assert!(!tile.is_owned());
    }
}
