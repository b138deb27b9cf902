use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::world::{RoomVnum, SectorVnum};

/// Suffix of the in-progress diff file.
pub const TEMP_SUFFIX: &str = ".temp";

/// Encoded size of one `DiffRecord`.
pub const DIFF_RECORD_SIZE: usize = 12;

#[derive(Debug, Error)]
pub enum DiffError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot encode diff record: {0}")]
    Encode(#[source] bincode::Error),
    #[error("cannot decode diff record: {0}")]
    Decode(#[source] bincode::Error),
    #[error("{}: length {len} is not a multiple of 12", path.display())]
    Corrupt { path: PathBuf, len: usize },
}

/// One changed tile: `{vnum: u32, old: i32, new: i32}`, little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffRecord {
    pub vnum: RoomVnum,
    pub old_sector: SectorVnum,
    pub new_sector: SectorVnum,
}

/// Destination for changed-tile records, written as changes happen.
pub trait DiffSink {
    fn record(&mut self, record: DiffRecord) -> Result<(), DiffError>;
}

impl DiffSink for Vec<DiffRecord> {
    fn record(&mut self, record: DiffRecord) -> Result<(), DiffError> {
        self.push(record);
        Ok(())
    }
}

/// Writes the diff to `<path>.temp` and publishes it with a rename.
///
/// Dropping the writer without calling `commit` leaves only the temp file;
/// the canonical path is never partially written.
pub struct DiffWriter {
    target: PathBuf,
    temp: PathBuf,
    out: BufWriter<File>,
    written: usize,
}

pub fn temp_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(TEMP_SUFFIX);
    PathBuf::from(name)
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> DiffError + '_ {
    move |source| DiffError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl DiffWriter {
    pub fn create(target: &Path) -> Result<Self, DiffError> {
        let temp = temp_path(target);
        let file = File::create(&temp).map_err(io_error(&temp))?;
        Ok(Self {
            target: target.to_path_buf(),
            temp,
            out: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush, sync and rename onto the canonical path. Returns that path.
    pub fn commit(self) -> Result<PathBuf, DiffError> {
        let DiffWriter {
            target, temp, out, ..
        } = self;

        let result = out
            .into_inner()
            .map_err(|e| e.into_error())
            .and_then(|file| file.sync_all())
            .and_then(|()| fs::rename(&temp, &target));

        if let Err(e) = result {
            let _ = fs::remove_file(&temp);
            return Err(io_error(&temp)(e));
        }
        Ok(target)
    }
}

impl DiffSink for DiffWriter {
    fn record(&mut self, record: DiffRecord) -> Result<(), DiffError> {
        bincode::serialize_into(&mut self.out, &record).map_err(DiffError::Encode)?;
        self.written += 1;
        Ok(())
    }
}

/// Decode a committed diff file.
pub fn read_diff(path: &Path) -> Result<Vec<DiffRecord>, DiffError> {
    let data = fs::read(path).map_err(io_error(path))?;
    if data.len() % DIFF_RECORD_SIZE != 0 {
        return Err(DiffError::Corrupt {
            path: path.to_path_buf(),
            len: data.len(),
        });
    }
    data.chunks_exact(DIFF_RECORD_SIZE)
        .map(|chunk| bincode::deserialize(chunk).map_err(DiffError::Decode))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn rec(vnum: u32, old: i32, new: i32) -> DiffRecord {
        DiffRecord {
            vnum,
            old_sector: old,
            new_sector: new,
        }
    }

    #[test]
    fn record_layout_is_twelve_little_endian_bytes() {
        let bytes = bincode::serialize(&rec(4, 0, 39)).unwrap();
        assert_eq!(bytes.len(), DIFF_RECORD_SIZE);
        assert_eq!(bytes, [4, 0, 0, 0, 0, 0, 0, 0, 39, 0, 0, 0]);

        let bytes = bincode::serialize(&rec(1, -1, 2)).unwrap();
        assert_eq!(&bytes[4..8], &[0xff, 0xff, 0xff, 0xff]);
    }

    #[test]
    fn temp_path_appends_suffix() {
        assert_eq!(
            temp_path(Path::new("lib/world/evolutions")),
            PathBuf::from("lib/world/evolutions.temp")
        );
    }

    #[test]
    fn commit_publishes_records_in_order() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("evolutions");

        let mut writer = DiffWriter::create(&target).unwrap();
        writer.record(rec(4, 0, 39)).unwrap();
        writer.record(rec(9, 1, 2)).unwrap();
        assert_eq!(writer.written(), 2);
        assert!(!target.exists());
        assert!(temp_path(&target).exists());

        let published = writer.commit().unwrap();
        assert_eq!(published, target);
        assert!(!temp_path(&target).exists());
        assert_eq!(read_diff(&target).unwrap(), vec![rec(4, 0, 39), rec(9, 1, 2)]);
    }

    #[test]
    fn empty_commit_creates_empty_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("evolutions");
        DiffWriter::create(&target).unwrap().commit().unwrap();
        assert_eq!(fs::metadata(&target).unwrap().len(), 0);
        assert!(read_diff(&target).unwrap().is_empty());
    }

    #[test]
    fn uncommitted_writer_leaves_canonical_file_alone() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("evolutions");
        fs::write(&target, bincode::serialize(&rec(1, 2, 3)).unwrap()).unwrap();

        {
            let mut writer = DiffWriter::create(&target).unwrap();
            writer.record(rec(7, 7, 7)).unwrap();
        }
        assert_eq!(read_diff(&target).unwrap(), vec![rec(1, 2, 3)]);
    }

    #[test]
    fn create_fails_when_directory_is_missing() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("no-such-dir").join("evolutions");
        let err = DiffWriter::create(&target).err().unwrap();
        assert!(matches!(err, DiffError::Io { .. }));
    }

    #[test]
    fn truncated_diff_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("evolutions");
        fs::write(&target, [1u8, 2, 3, 4, 5]).unwrap();
        let err = read_diff(&target).unwrap_err();
        assert!(matches!(err, DiffError::Corrupt { len: 5, .. }));
    }

    #[test]
    fn vec_sink_collects() {
        let mut sink: Vec<DiffRecord> = Vec::new();
        sink.record(rec(1, 2, 3)).unwrap();
        assert_eq!(sink, vec![rec(1, 2, 3)]);
    }
}
