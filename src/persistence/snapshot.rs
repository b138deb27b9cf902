use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::world::{SectorVnum, Tile, World, Wrap};
use crate::world::tile::NOTHING;

/// Encoded size of the `{width, height}` header.
pub const MAP_HEADER_SIZE: usize = 8;
/// Encoded size of one `MapRecord`.
pub const MAP_RECORD_SIZE: usize = 44;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{}: {len} bytes is too short for a map header", path.display())]
    TruncatedHeader { path: PathBuf, len: usize },
    #[error("{}: bad map dimensions {width}x{height}", path.display())]
    BadDimensions {
        path: PathBuf,
        width: u32,
        height: u32,
    },
    #[error("{}: expected {expected} bytes of tile records, found {actual}", path.display())]
    SizeMismatch {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },
    #[error("Deserialization error: {0}")]
    Decode(#[source] bincode::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapHeader {
    pub width: u32,
    pub height: u32,
}

/// One tile as the server writes it, little-endian, fixed-size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapRecord {
    pub island_id: i32,
    pub sector: SectorVnum,
    pub base_sector: SectorVnum,
    pub natural_sector: SectorVnum,
    /// `NOTHING` when the tile has no crop.
    pub crop: i32,
    pub affects: u64,
    pub evolver_flags: u64,
    pub sector_time: i64,
}

impl MapRecord {
    fn into_tile(self, id: u32) -> Tile {
        Tile {
            id,
            island_id: self.island_id,
            sector: self.sector,
            base_sector: self.base_sector,
            natural_sector: self.natural_sector,
            crop: (self.crop != NOTHING).then_some(self.crop),
            affects: self.affects,
            evolver_flags: self.evolver_flags,
            sector_time: self.sector_time,
        }
    }
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> SnapshotError + '_ {
    move |source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Decode a whole snapshot image.
pub fn decode_snapshot(
    data: &[u8],
    path: &Path,
    wrap: Wrap,
    ocean: SectorVnum,
) -> Result<World, SnapshotError> {
    if data.len() < MAP_HEADER_SIZE {
        return Err(SnapshotError::TruncatedHeader {
            path: path.to_path_buf(),
            len: data.len(),
        });
    }
    let (head, body) = data.split_at(MAP_HEADER_SIZE);
    let header: MapHeader = bincode::deserialize(head).map_err(SnapshotError::Decode)?;

    let bad_dimensions = || SnapshotError::BadDimensions {
        path: path.to_path_buf(),
        width: header.width,
        height: header.height,
    };
    if header.width == 0 || header.height == 0 {
        return Err(bad_dimensions());
    }
    let expected = (header.width as usize)
        .checked_mul(header.height as usize)
        .and_then(|n| n.checked_mul(MAP_RECORD_SIZE))
        .ok_or_else(bad_dimensions)?;
    if body.len() != expected {
        return Err(SnapshotError::SizeMismatch {
            path: path.to_path_buf(),
            expected,
            actual: body.len(),
        });
    }

    let tiles = body
        .chunks_exact(MAP_RECORD_SIZE)
        .enumerate()
        .map(|(id, chunk)| {
            bincode::deserialize::<MapRecord>(chunk)
                .map(|record| record.into_tile(id as u32))
                .map_err(SnapshotError::Decode)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(World::new(header.width, header.height, wrap, tiles, ocean))
}

/// Copy the server's snapshot to `private`, load the copy, and delete it.
///
/// Returns `Ok(None)` when the server has not written a snapshot: there is
/// nothing to evolve this cycle.
pub fn load_private_snapshot(
    canonical: &Path,
    private: &Path,
    wrap: Wrap,
    ocean: SectorVnum,
) -> Result<Option<World>, SnapshotError> {
    match fs::copy(canonical, private) {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %canonical.display(), "No map snapshot to evolve");
            return Ok(None);
        }
        Err(e) => return Err(io_error(canonical)(e)),
    }

    let data = fs::read(private).map_err(io_error(private));
    if let Err(e) = fs::remove_file(private) {
        warn!(path = %private.display(), error = %e, "Cannot remove private map copy");
    }
    let world = decode_snapshot(&data?, private, wrap, ocean)?;

    debug!(
        width = world.width,
        height = world.height,
        land = world.land.len(),
        "Map snapshot loaded"
    );
    Ok(Some(world))
}
