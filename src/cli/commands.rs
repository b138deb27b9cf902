use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tracing::info;

use crate::cli::notify::notify_parent;
use crate::config::evolver::EvolverConfig;
use crate::persistence::diff::{DiffError, DiffWriter};
use crate::persistence::snapshot::{load_private_snapshot, SnapshotError};
use crate::registry::{Registries, RegistryError};
use crate::simulation::engine::{EvolveParams, RuleContext};
use crate::simulation::evolve_map;
use crate::simulation::rng::ParkMiller;
use crate::simulation::statistics::EvolutionStatistics;

#[derive(Debug, Error)]
pub enum EvolveError {
    #[error("cannot load world data: {0}")]
    Registry(#[from] RegistryError),
    #[error("cannot load map snapshot: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error("cannot write evolutions: {0}")]
    Diff(#[from] DiffError),
}

/// Per-invocation arguments from the parent process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub nearby_distance: u32,
    pub day_of_year: u32,
    pub water_crop_distance: u32,
    pub notify_pid: Option<i32>,
    /// Overrides the wall-clock seed.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub seed: u64,
    /// None when there was no snapshot to evolve.
    pub statistics: Option<EvolutionStatistics>,
    pub diff_path: Option<PathBuf>,
    pub notified: bool,
}

fn unix_timestamp_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// Load everything, evolve the map once, publish the diff, and tell the parent.
pub fn run_evolution(config: &EvolverConfig, opts: &RunOptions) -> Result<RunOutcome, EvolveError> {
    let now = unix_timestamp_now();
    let seed = opts.seed.unwrap_or(now as u64);
    let mut rng = ParkMiller::new(seed);
    info!(
        seed,
        nearby_distance = opts.nearby_distance,
        day_of_year = opts.day_of_year,
        water_crop_distance = opts.water_crop_distance,
        "Starting evolution run"
    );

    let registries = Registries::load(config)?;

    let Some(mut world) = load_private_snapshot(
        Path::new(&config.map_file),
        Path::new(&config.private_map_file),
        config.wrap(),
        config.ocean_sector,
    )?
    else {
        info!(map_file = %config.map_file, "No world map to evolve");
        return Ok(RunOutcome {
            seed,
            statistics: None,
            diff_path: None,
            notified: false,
        });
    };
    info!(
        width = world.width,
        height = world.height,
        land_tiles = world.land.len(),
        "World map loaded"
    );

    let mut writer = DiffWriter::create(Path::new(&config.evolution_file))?;

    let ctx = RuleContext {
        registries: &registries,
        params: EvolveParams {
            nearby_distance: opts.nearby_distance,
            day_of_year: opts.day_of_year,
            water_crop_distance: opts.water_crop_distance,
            bands: config.climate_bands(),
            now,
        },
        ocean: config.ocean_sector,
    };
    let statistics = evolve_map(&mut world, &ctx, &mut rng, &mut writer)?;
    let diff_path = writer.commit()?;
    statistics.log_summary();

    let notified = opts.notify_pid.is_some_and(notify_parent);

    Ok(RunOutcome {
        seed,
        statistics: Some(statistics),
        diff_path: Some(diff_path),
        notified,
    })
}
