pub mod crop;
pub mod reader;
pub mod sector;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::evolver::EvolverConfig;
use crate::world::{CropVnum, SectorVnum};
use reader::DataReader;

pub use crop::{CropType, CROPF_REQUIRES_WATER};
pub use sector::{
    EvoKind, Evolution, SectorType, SECTF_FRESH_WATER, SECTF_SEPARATE_NOT_ADJACENTS,
    SECTF_SEPARATE_NOT_NEARS,
};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{file}: file is empty")]
    EmptyFile { file: String },
    #[error("{file}: file ended without '$' after {kind} #{vnum}")]
    UnterminatedFile {
        file: String,
        kind: &'static str,
        vnum: i32,
    },
    #[error("{file}:{line}: {context}: {message}")]
    Format {
        file: String,
        line: usize,
        context: String,
        message: String,
    },
}

/// Sector types keyed by vnum, immutable once loaded.
#[derive(Debug, Clone, Default)]
pub struct SectorRegistry {
    sectors: HashMap<SectorVnum, SectorType>,
}

impl SectorRegistry {
    /// Build from a list; on duplicate vnums the first entry stays.
    pub fn from_sectors(sectors: Vec<SectorType>) -> Self {
        let mut registry = Self::default();
        for sect in sectors {
            registry.insert(sect);
        }
        registry
    }

    /// Returns false (and keeps the existing entry) if the vnum is taken.
    pub fn insert(&mut self, sect: SectorType) -> bool {
        if self.sectors.contains_key(&sect.vnum) {
            return false;
        }
        self.sectors.insert(sect.vnum, sect);
        true
    }

    pub fn get(&self, vnum: SectorVnum) -> Option<&SectorType> {
        self.sectors.get(&vnum)
    }

    pub fn contains(&self, vnum: SectorVnum) -> bool {
        self.sectors.contains_key(&vnum)
    }

    /// True when `vnum` is registered and carries every bit in `flags`.
    pub fn has_flags(&self, vnum: SectorVnum, flags: u64) -> bool {
        self.get(vnum).is_some_and(|s| s.is_flagged(flags))
    }

    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CropRegistry {
    crops: HashMap<CropVnum, CropType>,
}

impl CropRegistry {
    pub fn from_crops(crops: Vec<CropType>) -> Self {
        let mut registry = Self::default();
        for crop in crops {
            registry.insert(crop);
        }
        registry
    }

    pub fn insert(&mut self, crop: CropType) -> bool {
        if self.crops.contains_key(&crop.vnum) {
            return false;
        }
        self.crops.insert(crop.vnum, crop);
        true
    }

    pub fn get(&self, vnum: CropVnum) -> Option<&CropType> {
        self.crops.get(&vnum)
    }

    pub fn len(&self) -> usize {
        self.crops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crops.is_empty()
    }
}

/// Everything the rule engine looks up by vnum.
#[derive(Debug, Clone, Default)]
pub struct Registries {
    pub sectors: SectorRegistry,
    pub crops: CropRegistry,
}

impl Registries {
    pub fn load(config: &EvolverConfig) -> Result<Self, RegistryError> {
        let sectors = load_sectors(Path::new(&config.sector_directory), &config.index_file)?;
        let crops = load_crops(Path::new(&config.crop_directory), &config.index_file)?;
        info!(sectors = sectors.len(), crops = crops.len(), "Registries loaded");
        Ok(Self { sectors, crops })
    }
}

fn read_file(path: &Path) -> Result<String, RegistryError> {
    fs::read_to_string(path).map_err(|source| RegistryError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// File names listed in `dir/index_file`, up to the closing `$`.
pub fn read_index(dir: &Path, index_file: &str) -> Result<Vec<PathBuf>, RegistryError> {
    let path = dir.join(index_file);
    let content = read_file(&path)?;
    let mut reader = DataReader::new(path.display().to_string(), &content);

    let mut files = Vec::new();
    while let Some(line) = reader.next_line() {
        for token in line.split_whitespace() {
            if token == "$" {
                return Ok(files);
            }
            files.push(dir.join(token));
        }
    }
    Err(reader.format_error("index", "file ended without '$'"))
}

/// Walk the `#vnum ... $` records of one file, handing each body to `parse`.
fn load_records<T>(
    path: &Path,
    kind: &'static str,
    mut parse: impl FnMut(&mut DataReader<'_>, i32) -> Result<T, RegistryError>,
    mut store: impl FnMut(T) -> bool,
) -> Result<(), RegistryError> {
    let content = read_file(path)?;
    let file = path.display().to_string();
    let mut reader = DataReader::new(file.clone(), &content);
    let mut last_vnum = None;

    loop {
        let Some(line) = reader.next_line() else {
            return Err(match last_vnum {
                None => RegistryError::EmptyFile { file },
                Some(vnum) => RegistryError::UnterminatedFile { file, kind, vnum },
            });
        };

        if line.starts_with('$') {
            return Ok(());
        }

        let Some(vnum) = line.strip_prefix('#') else {
            let context = match last_vnum {
                Some(v) => format!("after {} #{}", kind, v),
                None => format!("{} file", kind),
            };
            return Err(reader.format_error(&context, format!("expected '#' or '$', got '{}'", line)));
        };
        let vnum: i32 = reader.number(vnum.trim(), kind, "vnum")?;

        let record = parse(&mut reader, vnum)?;
        if !store(record) {
            warn!(kind, vnum, file = %file, "Duplicate vnum, keeping the first definition");
        }
        last_vnum = Some(vnum);
    }
}

pub fn load_sectors(dir: &Path, index_file: &str) -> Result<SectorRegistry, RegistryError> {
    let mut registry = SectorRegistry::default();
    for path in read_index(dir, index_file)? {
        debug!(file = %path.display(), "Loading sector file");
        load_records(&path, "sector", sector::parse_sector, |s| registry.insert(s))?;
    }
    Ok(registry)
}

pub fn load_crops(dir: &Path, index_file: &str) -> Result<CropRegistry, RegistryError> {
    let mut registry = CropRegistry::default();
    for path in read_index(dir, index_file)? {
        debug!(file = %path.display(), "Loading crop file");
        load_records(&path, "crop", crop::parse_crop, |c| registry.insert(c))?;
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const PLAINS: &str = "#0\nPlains~\nPlains~\n'.' 0 1 1 0 0\nE\n10 1 100.00 39\nS\n";
    const FOREST: &str = "#1\nForest~\nForest~\n'&' 0 1 2 0 0\nS\n";

    fn write(dir: &TempDir, name: &str, content: &str) {
        fs::write(dir.path().join(name), content).unwrap();
    }

    #[test]
    fn loads_every_file_in_the_index() {
        let dir = TempDir::new().unwrap();
        write(&dir, "index", "0.sect\n1.sect\n$\n");
        write(&dir, "0.sect", &format!("{}$\n", PLAINS));
        write(&dir, "1.sect", &format!("* forests\n{}$~\n", FOREST));

        let sectors = load_sectors(dir.path(), "index").unwrap();
        assert_eq!(sectors.len(), 2);
        assert_eq!(sectors.get(0).unwrap().evolutions.len(), 1);
        assert_eq!(sectors.get(1).unwrap().name, "Forest");
    }

    #[test]
    fn several_records_in_one_file() {
        let dir = TempDir::new().unwrap();
        write(&dir, "index", "all.sect $\n");
        write(&dir, "all.sect", &format!("{}{}$\n", PLAINS, FOREST));
        let sectors = load_sectors(dir.path(), "index").unwrap();
        assert!(sectors.contains(0));
        assert!(sectors.contains(1));
    }

    #[test]
    fn duplicate_vnum_keeps_first_and_keeps_parsing() {
        let dir = TempDir::new().unwrap();
        let dup = "#0\nImpostor~\nImpostor~\n'?' 0 1 1 0 0\nE\n4 0 50.00 1\nS\n";
        write(&dir, "index", "a.sect\n$\n");
        write(&dir, "a.sect", &format!("{}{}{}$\n", PLAINS, dup, FOREST));

        let sectors = load_sectors(dir.path(), "index").unwrap();
        assert_eq!(sectors.len(), 2);
        assert_eq!(sectors.get(0).unwrap().name, "Plains");
        assert!(sectors.contains(1));
    }

    #[test]
    fn missing_index_terminator_is_fatal() {
        let dir = TempDir::new().unwrap();
        write(&dir, "index", "0.sect\n");
        write(&dir, "0.sect", &format!("{}$\n", PLAINS));
        let err = load_sectors(dir.path(), "index").unwrap_err();
        assert!(matches!(err, RegistryError::Format { .. }));
    }

    #[test]
    fn missing_data_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        write(&dir, "index", "gone.sect\n$\n");
        let err = load_sectors(dir.path(), "index").unwrap_err();
        assert!(matches!(err, RegistryError::Io { .. }));
        assert!(err.to_string().contains("gone.sect"));
    }

    #[test]
    fn empty_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        write(&dir, "index", "e.sect\n$\n");
        write(&dir, "e.sect", "\n");
        let err = load_sectors(dir.path(), "index").unwrap_err();
        assert!(matches!(err, RegistryError::EmptyFile { .. }));
    }

    #[test]
    fn file_without_dollar_is_fatal() {
        let dir = TempDir::new().unwrap();
        write(&dir, "index", "t.sect\n$\n");
        write(&dir, "t.sect", PLAINS);
        let err = load_sectors(dir.path(), "index").unwrap_err();
        assert!(matches!(
            err,
            RegistryError::UnterminatedFile { vnum: 0, kind: "sector", .. }
        ));
    }

    #[test]
    fn stray_line_between_records_is_fatal() {
        let dir = TempDir::new().unwrap();
        write(&dir, "index", "s.sect\n$\n");
        write(&dir, "s.sect", &format!("{}garbage\n$\n", PLAINS));
        let err = load_sectors(dir.path(), "index").unwrap_err();
        assert!(err.to_string().contains("after sector #0"));
        assert!(err.to_string().contains("garbage"));
    }

    #[test]
    fn malformed_record_names_file_and_record() {
        let dir = TempDir::new().unwrap();
        write(&dir, "index", "bad.sect\n$\n");
        write(&dir, "bad.sect", "#12\nBad~\nBad~\n'.' 0 1\nS\n$\n");
        let err = load_sectors(dir.path(), "index").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("bad.sect:4"));
        assert!(msg.contains("sector #12"));
    }

    #[test]
    fn loads_crops() {
        let dir = TempDir::new().unwrap();
        write(&dir, "index", "c.crop\n$\n");
        write(
            &dir,
            "c.crop",
            "#5\nwheat~\nWheat Field~\n10 1 a\n0 100 0 100\nS\n#6\nrice~\nRice~\n10 2 0\n0 50 0 50\nS\n$\n",
        );
        let crops = load_crops(dir.path(), "index").unwrap();
        assert_eq!(crops.len(), 2);
        assert!(crops.get(5).unwrap().requires_water());
        assert!(!crops.get(6).unwrap().requires_water());
    }

    #[test]
    fn has_flags_requires_registration_and_all_bits() {
        let mut river = SectorType::new(5, "River");
        river.flags = SECTF_FRESH_WATER | 1;
        let sectors = SectorRegistry::from_sectors(vec![river]);
        assert!(sectors.has_flags(5, SECTF_FRESH_WATER));
        assert!(sectors.has_flags(5, SECTF_FRESH_WATER | 1));
        assert!(!sectors.has_flags(5, SECTF_FRESH_WATER | 2));
        assert!(!sectors.has_flags(99, 0));
    }

    #[test]
    fn from_sectors_keeps_first_duplicate() {
        let sectors = SectorRegistry::from_sectors(vec![
            SectorType::new(1, "First"),
            SectorType::new(1, "Second"),
        ]);
        assert_eq!(sectors.len(), 1);
        assert_eq!(sectors.get(1).unwrap().name, "First");
    }
}
