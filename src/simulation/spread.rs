use tracing::trace;

use crate::persistence::diff::{DiffError, DiffSink};
use crate::registry::EvoKind;
use crate::simulation::engine::{Cause, RuleContext};
use crate::simulation::rng::RandomSource;
use crate::simulation::set_sector;
use crate::world::{World, DIRECTIONS};

/// Let the tile at `index` convert its neighbors through its SPREADS-TO rules.
///
/// Every rule gets one percent roll. On success the first eligible neighbor
/// converts outright and each further eligible neighbor needs a fresh roll at
/// the same percent. A direction converted by one rule is not offered to the
/// rules after it. Changes are applied and recorded immediately. Returns the
/// number of neighbors converted.
pub fn spread_one(
    world: &mut World,
    index: usize,
    ctx: &RuleContext<'_>,
    rng: &mut impl RandomSource,
    sink: &mut impl DiffSink,
) -> Result<usize, DiffError> {
    let sectors = &ctx.registries.sectors;
    let Some(sect) = sectors.get(world.tiles[index].sector) else {
        return Ok(0);
    };

    let mut used = [false; DIRECTIONS.len()];
    let mut changed = 0;

    for evo in sect.evolutions_of(EvoKind::SpreadsTo) {
        if !rng.percent_roll(evo.percent) {
            continue;
        }
        if !sectors.contains(evo.becomes) {
            continue;
        }
        let Some(target) = evo.target_sector() else {
            continue;
        };

        let mut converted = false;
        for (dir, dir_used) in used.iter_mut().enumerate() {
            if *dir_used {
                continue;
            }
            let Some(n) = world.neighbor(index, dir) else {
                continue;
            };
            let neighbor = &world.tiles[n];
            if neighbor.sector != target || neighbor.sector == evo.becomes || neighbor.never_evolves() {
                continue;
            }
            if converted && !rng.percent_roll(evo.percent) {
                continue;
            }

            let record = set_sector(world, n, evo.becomes, ctx.params.now, sink)?;
            trace!(
                from = world.tiles[index].id,
                vnum = record.vnum,
                old = record.old_sector,
                new = record.new_sector,
                cause = %Cause::Spread,
                "Tile spread"
            );
            *dir_used = true;
            converted = true;
            changed += 1;
        }
    }

    Ok(changed)
}
