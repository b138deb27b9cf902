pub mod engine;
pub mod rng;
pub mod season;
pub mod spread;
pub mod statistics;

use std::time::Instant;

use tracing::trace;

use crate::persistence::diff::{DiffError, DiffRecord, DiffSink};
use crate::simulation::engine::{evolve_one, RuleContext};
use crate::simulation::rng::RandomSource;
use crate::simulation::spread::spread_one;
use crate::simulation::statistics::EvolutionStatistics;
use crate::world::{SectorVnum, World};

/// Change one tile's sector, stamp it with `now`, and record the change.
pub fn set_sector(
    world: &mut World,
    index: usize,
    sector: SectorVnum,
    now: i64,
    sink: &mut impl DiffSink,
) -> Result<DiffRecord, DiffError> {
    let tile = &mut world.tiles[index];
    let record = DiffRecord {
        vnum: tile.id,
        old_sector: tile.sector,
        new_sector: sector,
    };
    tile.sector = sector;
    tile.sector_time = now;
    sink.record(record)?;
    Ok(record)
}

/// Run one evolution pass over every land tile, in map order.
///
/// Each tile first tries its own rules; only a tile that did not change
/// gets to spread into its neighbors. Every change goes to `sink` as it
/// happens.
pub fn evolve_map(
    world: &mut World,
    ctx: &RuleContext<'_>,
    rng: &mut impl RandomSource,
    sink: &mut impl DiffSink,
) -> Result<EvolutionStatistics, DiffError> {
    let start = Instant::now();
    let mut stats = EvolutionStatistics::new(world.land.len());

    for i in 0..world.land.len() {
        let index = world.land[i];
        match evolve_one(world, index, ctx, rng) {
            Some(transition) => {
                let record = set_sector(world, index, transition.to, ctx.params.now, sink)?;
                trace!(
                    vnum = record.vnum,
                    old = record.old_sector,
                    new = record.new_sector,
                    cause = %transition.cause,
                    "Tile evolved"
                );
                stats.record_evolved(transition.cause);
            }
            None => {
                let converted = spread_one(world, index, ctx, rng, sink)?;
                stats.record_spread(converted);
            }
        }
    }

    stats.duration_ms = start.elapsed().as_secs_f32() * 1000.0;
    Ok(stats)
}
