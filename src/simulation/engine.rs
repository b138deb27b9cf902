use std::fmt;

use crate::registry::{
    EvoKind, Evolution, Registries, SectorType, SECTF_FRESH_WATER, SECTF_SEPARATE_NOT_ADJACENTS,
    SECTF_SEPARATE_NOT_NEARS,
};
use crate::simulation::rng::RandomSource;
use crate::simulation::season::{season_at, ClimateBands};
use crate::world::topology::{count_adjacent_matching, within_distance};
use crate::world::{Season, SectorMatch, SectorVnum, World};

/// Seconds per unit of a TIMED rule's value.
pub const SECS_PER_MINUTE: i64 = 60;

/// Neighbors needed for ADJACENT-MANY.
const ADJACENT_MANY_COUNT: usize = 6;

/// Order in which rule kinds are tried; the first kind whose rule holds wins.
pub const PRECEDENCE: [EvoKind; 17] = [
    EvoKind::Owned,
    EvoKind::Unowned,
    EvoKind::Timed,
    EvoKind::Random,
    EvoKind::Spring,
    EvoKind::Summer,
    EvoKind::Autumn,
    EvoKind::Winter,
    EvoKind::AdjacentOne,
    EvoKind::NotAdjacent,
    EvoKind::AdjacentMany,
    EvoKind::NearSector,
    EvoKind::NotNearSector,
    EvoKind::AdjacentSectorFlag,
    EvoKind::NotAdjacentSectorFlag,
    EvoKind::NearSectorFlag,
    EvoKind::NotNearSectorFlag,
];

/// Per-run inputs shared by every tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvolveParams {
    pub nearby_distance: u32,
    pub day_of_year: u32,
    /// 0 disables the crop-water check.
    pub water_crop_distance: u32,
    pub bands: ClimateBands,
    /// Unix time of this run.
    pub now: i64,
}

/// Everything rule evaluation reads besides the world itself.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub registries: &'a Registries,
    pub params: EvolveParams,
    pub ocean: SectorVnum,
}

/// Why a tile changed sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Cause {
    Rule(EvoKind),
    CropWithoutWater,
    Spread,
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cause::Rule(kind) => write!(f, "{}", kind),
            Cause::CropWithoutWater => f.write_str("CROP-WITHOUT-WATER"),
            Cause::Spread => f.write_str("SPREADS-TO"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: SectorVnum,
    pub to: SectorVnum,
    pub cause: Cause,
}

/// First rule of `kind` on `sect` whose percent roll succeeds.
///
/// Draws one roll per same-kind rule, in file order, until one passes.
pub fn lookup_rule<'s>(
    sect: &'s SectorType,
    kind: EvoKind,
    rng: &mut impl RandomSource,
) -> Option<&'s Evolution> {
    sect.evolutions_of(kind).find(|evo| rng.percent_roll(evo.percent))
}

/// What a rule's `value` refers to, or None if it cannot name anything.
fn target_of(evo: &Evolution) -> Option<SectorMatch> {
    match evo.kind {
        EvoKind::AdjacentSectorFlag
        | EvoKind::NotAdjacentSectorFlag
        | EvoKind::NearSectorFlag
        | EvoKind::NotNearSectorFlag => evo.target_flags().map(SectorMatch::Flags),
        _ => evo.target_sector().map(SectorMatch::Sector),
    }
}

/// Lazily computed per-tile facts.
struct TileView<'w, 'c> {
    world: &'w World,
    ctx: &'c RuleContext<'c>,
    index: usize,
    season: Option<Season>,
}

impl TileView<'_, '_> {
    fn season(&mut self) -> Season {
        if let Some(season) = self.season {
            return season;
        }
        let (_, y) = self.world.coords(self.index);
        let season = season_at(
            y as u32,
            self.world.height,
            self.ctx.params.day_of_year,
            &self.ctx.params.bands,
        );
        self.season = Some(season);
        season
    }

    fn adjacent(&self, target: SectorMatch) -> usize {
        count_adjacent_matching(
            self.world,
            &self.ctx.registries.sectors,
            self.index,
            target,
            true,
        )
    }

    fn near(&self, target: SectorMatch) -> bool {
        within_distance(
            self.world,
            &self.ctx.registries.sectors,
            self.index,
            target,
            self.ctx.params.nearby_distance,
            true,
        )
    }

    /// True when no rule of `evo.kind` finds its target (or only `evo` itself
    /// is checked, if the sector asks for separate checks).
    fn none_found(
        &self,
        sect: &SectorType,
        evo: &Evolution,
        separate_flag: u64,
        found: impl Fn(&Self, SectorMatch) -> bool,
    ) -> bool {
        let absent = |e: &Evolution| target_of(e).is_none_or(|t| !found(self, t));
        if sect.is_flagged(separate_flag) {
            absent(evo)
        } else {
            sect.evolutions_of(evo.kind).all(absent)
        }
    }

    /// Whether a looked-up rule's condition holds for this tile.
    fn holds(&mut self, sect: &SectorType, evo: &Evolution) -> bool {
        let tile = &self.world.tiles[self.index];
        match evo.kind {
            EvoKind::Owned | EvoKind::Unowned | EvoKind::Random => true,
            EvoKind::Timed => {
                let wait = evo.value.saturating_mul(SECS_PER_MINUTE);
                self.ctx.params.now > tile.sector_time.saturating_add(wait)
            }
            EvoKind::Spring => self.season() == Season::Spring,
            EvoKind::Summer => self.season() == Season::Summer,
            EvoKind::Autumn => self.season() == Season::Autumn,
            EvoKind::Winter => self.season() == Season::Winter,
            EvoKind::AdjacentOne | EvoKind::AdjacentSectorFlag => {
                target_of(evo).is_some_and(|t| self.adjacent(t) >= 1)
            }
            EvoKind::AdjacentMany => {
                target_of(evo).is_some_and(|t| self.adjacent(t) >= ADJACENT_MANY_COUNT)
            }
            EvoKind::NearSector | EvoKind::NearSectorFlag => {
                target_of(evo).is_some_and(|t| self.near(t))
            }
            EvoKind::NotAdjacent | EvoKind::NotAdjacentSectorFlag => {
                self.none_found(sect, evo, SECTF_SEPARATE_NOT_ADJACENTS, |v, t| {
                    v.adjacent(t) >= 1
                })
            }
            EvoKind::NotNearSector | EvoKind::NotNearSectorFlag => {
                self.none_found(sect, evo, SECTF_SEPARATE_NOT_NEARS, |v, t| v.near(t))
            }
            // player-action kinds are applied by the game server, not here
            _ => false,
        }
    }
}

/// Kinds that only apply to tiles in a given ownership state; checked before
/// any roll is drawn.
fn applies_to(kind: EvoKind, owned: bool) -> bool {
    match kind {
        EvoKind::Owned => owned,
        EvoKind::Unowned => !owned,
        _ => true,
    }
}

/// Decide the next sector for the tile at `index`, if it changes.
///
/// Does not modify the world; the caller applies the transition and records
/// it. Returns None when the tile is exempt, has no rules, nothing matched,
/// or the matched result is the sector it already has.
pub fn evolve_one(
    world: &World,
    index: usize,
    ctx: &RuleContext<'_>,
    rng: &mut impl RandomSource,
) -> Option<Transition> {
    let tile = &world.tiles[index];
    if tile.never_evolves() || tile.sector == ctx.ocean {
        return None;
    }
    let sectors = &ctx.registries.sectors;
    let sect = sectors.get(tile.sector).filter(|s| s.has_evolutions())?;

    let mut view = TileView {
        world,
        ctx,
        index,
        season: None,
    };

    for kind in PRECEDENCE {
        if !applies_to(kind, tile.is_owned()) {
            continue;
        }
        let Some(evo) = lookup_rule(sect, kind, rng) else {
            continue;
        };
        if !view.holds(sect, evo) {
            continue;
        }
        if !sectors.contains(evo.becomes) {
            continue;
        }
        return change(tile.sector, evo.becomes, Cause::Rule(kind));
    }

    crop_without_water(world, index, ctx, rng)
}

/// A crop that needs fresh water and has none nearby may die back to the
/// tile's base sector, on a coin flip.
fn crop_without_water(
    world: &World,
    index: usize,
    ctx: &RuleContext<'_>,
    rng: &mut impl RandomSource,
) -> Option<Transition> {
    let distance = ctx.params.water_crop_distance;
    if distance == 0 {
        return None;
    }
    let tile = &world.tiles[index];
    let crop = ctx.registries.crops.get(tile.crop?)?;
    if !crop.requires_water() {
        return None;
    }

    let sectors = &ctx.registries.sectors;
    let water = SectorMatch::Flags(SECTF_FRESH_WATER);
    if within_distance(world, sectors, index, water, distance, true) {
        return None;
    }

    if rng.range(0, 1) != 0 || !sectors.contains(tile.base_sector) {
        return None;
    }
    change(tile.sector, tile.base_sector, Cause::CropWithoutWater)
}

fn change(from: SectorVnum, to: SectorVnum, cause: Cause) -> Option<Transition> {
    (from != to).then_some(Transition { from, to, cause })
}
