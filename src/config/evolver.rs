use serde::Deserialize;
use std::path::Path;

use crate::simulation::season::ClimateBands;
use crate::world::{SectorVnum, Wrap};

pub const VALID_LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
pub const VALID_LOG_FORMATS: [&str; 2] = ["text", "json"];

#[derive(Debug, Clone, Deserialize)]
pub struct EvolverConfig {
    #[serde(default = "default_sector_directory")]
    pub sector_directory: String,
    #[serde(default = "default_crop_directory")]
    pub crop_directory: String,
    #[serde(default = "default_index_file")]
    pub index_file: String,
    #[serde(default = "default_map_file")]
    pub map_file: String,
    #[serde(default = "default_private_map_file")]
    pub private_map_file: String,
    #[serde(default = "default_evolution_file")]
    pub evolution_file: String,
    #[serde(default = "default_wrap_x")]
    pub wrap_x: bool,
    #[serde(default)]
    pub wrap_y: bool,
    #[serde(default = "default_ocean_sector")]
    pub ocean_sector: SectorVnum,
    #[serde(default = "default_tropic_latitude")]
    pub tropic_latitude: f64,
    #[serde(default = "default_arctic_latitude")]
    pub arctic_latitude: f64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_sector_directory() -> String {
    "lib/world/sect/".to_string()
}
fn default_crop_directory() -> String {
    "lib/world/crop/".to_string()
}
fn default_index_file() -> String {
    "index".to_string()
}
fn default_map_file() -> String {
    "lib/world/evolver.map".to_string()
}
fn default_private_map_file() -> String {
    "lib/world/evolver.map.copy".to_string()
}
fn default_evolution_file() -> String {
    "lib/world/evolutions".to_string()
}
fn default_wrap_x() -> bool {
    true
}
fn default_ocean_sector() -> SectorVnum {
    6
}
fn default_tropic_latitude() -> f64 {
    23.5
}
fn default_arctic_latitude() -> f64 {
    66.5
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}

impl Default for EvolverConfig {
    fn default() -> Self {
        Self {
            sector_directory: default_sector_directory(),
            crop_directory: default_crop_directory(),
            index_file: default_index_file(),
            map_file: default_map_file(),
            private_map_file: default_private_map_file(),
            evolution_file: default_evolution_file(),
            wrap_x: default_wrap_x(),
            wrap_y: false,
            ocean_sector: default_ocean_sector(),
            tropic_latitude: default_tropic_latitude(),
            arctic_latitude: default_arctic_latitude(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

impl EvolverConfig {
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        Self::from_toml_str(&content, path)
    }

    /// Like `from_file`, but a missing file means every default.
    pub fn load_or_default(path: &Path) -> Result<Self, String> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str, source_path: &Path) -> Result<Self, String> {
        let config: EvolverConfig =
            toml::from_str(content).map_err(|e| format!("{}: {}", source_path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        let mut errors = Vec::new();

        let paths = [
            ("sector_directory", &self.sector_directory, default_sector_directory()),
            ("crop_directory", &self.crop_directory, default_crop_directory()),
            ("index_file", &self.index_file, default_index_file()),
            ("map_file", &self.map_file, default_map_file()),
            ("private_map_file", &self.private_map_file, default_private_map_file()),
            ("evolution_file", &self.evolution_file, default_evolution_file()),
        ];
        for (key, value, example) in paths {
            if value.trim().is_empty() {
                errors.push(format!(
                    "{} must not be empty. Example: {} = \"{}\"",
                    key, key, example
                ));
            }
        }

        if self.map_file == self.private_map_file {
            errors.push(format!(
                "private_map_file must differ from map_file, both are '{}'. Example: private_map_file = \"{}\"",
                self.map_file,
                default_private_map_file()
            ));
        }

        if !(self.tropic_latitude > 0.0 && self.tropic_latitude < 90.0) {
            errors.push(format!(
                "tropic_latitude must be between 0 and 90, got {}. Example: tropic_latitude = 23.5",
                self.tropic_latitude
            ));
        }

        if !(self.arctic_latitude > 0.0 && self.arctic_latitude < 90.0) {
            errors.push(format!(
                "arctic_latitude must be between 0 and 90, got {}. Example: arctic_latitude = 66.5",
                self.arctic_latitude
            ));
        }

        if self.tropic_latitude >= self.arctic_latitude {
            errors.push(format!(
                "tropic_latitude must be below arctic_latitude, got {} and {}. Example: tropic_latitude = 23.5",
                self.tropic_latitude, self.arctic_latitude
            ));
        }

        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            errors.push(format!(
                "log_level must be one of {:?}, got '{}'. Example: log_level = \"info\"",
                VALID_LOG_LEVELS, self.log_level
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.log_format.as_str()) {
            errors.push(format!(
                "log_format must be one of {:?}, got '{}'. Example: log_format = \"text\"",
                VALID_LOG_FORMATS, self.log_format
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("\n"))
        }
    }

    pub fn wrap(&self) -> Wrap {
        Wrap {
            x: self.wrap_x,
            y: self.wrap_y,
        }
    }

    pub fn climate_bands(&self) -> ClimateBands {
        ClimateBands {
            tropic_latitude: self.tropic_latitude,
            arctic_latitude: self.arctic_latitude,
        }
    }
}
