use crate::registry::reader::{ascii_flags, DataReader};
use crate::registry::RegistryError;
use crate::world::SectorVnum;

// Sector flags
pub const SECTF_FRESH_WATER: u64 = 1 << 6;
/// Each NOT_ADJACENT(_SECTOR_FLAG) rule is checked on its own.
pub const SECTF_SEPARATE_NOT_ADJACENTS: u64 = 1 << 23;
/// Each NOT_NEAR_SECTOR(_FLAG) rule is checked on its own.
pub const SECTF_SEPARATE_NOT_NEARS: u64 = 1 << 24;

/// Evolution rule kinds, numbered as they appear in data files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EvoKind {
    ChoppedDown,
    CropGrows,
    AdjacentOne,
    AdjacentMany,
    Random,
    TrenchStart,
    TrenchFull,
    NearSector,
    PlantsTo,
    MagicGrowth,
    NotAdjacent,
    NotNearSector,
    Spring,
    Summer,
    Autumn,
    Winter,
    BurnsTo,
    SpreadsTo,
    HarvestTo,
    DefaultBurn,
    Timed,
    Owned,
    Unowned,
    AdjacentSectorFlag,
    NotAdjacentSectorFlag,
    NearSectorFlag,
    NotNearSectorFlag,
}

impl EvoKind {
    /// Every kind, indexed by its file code.
    pub const ALL: [EvoKind; 27] = [
        EvoKind::ChoppedDown,
        EvoKind::CropGrows,
        EvoKind::AdjacentOne,
        EvoKind::AdjacentMany,
        EvoKind::Random,
        EvoKind::TrenchStart,
        EvoKind::TrenchFull,
        EvoKind::NearSector,
        EvoKind::PlantsTo,
        EvoKind::MagicGrowth,
        EvoKind::NotAdjacent,
        EvoKind::NotNearSector,
        EvoKind::Spring,
        EvoKind::Summer,
        EvoKind::Autumn,
        EvoKind::Winter,
        EvoKind::BurnsTo,
        EvoKind::SpreadsTo,
        EvoKind::HarvestTo,
        EvoKind::DefaultBurn,
        EvoKind::Timed,
        EvoKind::Owned,
        EvoKind::Unowned,
        EvoKind::AdjacentSectorFlag,
        EvoKind::NotAdjacentSectorFlag,
        EvoKind::NearSectorFlag,
        EvoKind::NotNearSectorFlag,
    ];

    pub fn from_code(code: i32) -> Option<EvoKind> {
        usize::try_from(code).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn name(self) -> &'static str {
        match self {
            EvoKind::ChoppedDown => "CHOPPED-DOWN",
            EvoKind::CropGrows => "CROP-GROWS",
            EvoKind::AdjacentOne => "ADJACENT-ONE",
            EvoKind::AdjacentMany => "ADJACENT-MANY",
            EvoKind::Random => "RANDOM",
            EvoKind::TrenchStart => "TRENCH-START",
            EvoKind::TrenchFull => "TRENCH-FULL",
            EvoKind::NearSector => "NEAR-SECTOR",
            EvoKind::PlantsTo => "PLANTS-TO",
            EvoKind::MagicGrowth => "MAGIC-GROWTH",
            EvoKind::NotAdjacent => "NOT-ADJACENT",
            EvoKind::NotNearSector => "NOT-NEAR-SECTOR",
            EvoKind::Spring => "SPRING",
            EvoKind::Summer => "SUMMER",
            EvoKind::Autumn => "AUTUMN",
            EvoKind::Winter => "WINTER",
            EvoKind::BurnsTo => "BURNS-TO",
            EvoKind::SpreadsTo => "SPREADS-TO",
            EvoKind::HarvestTo => "HARVEST-TO",
            EvoKind::DefaultBurn => "DEFAULT-BURN",
            EvoKind::Timed => "TIMED",
            EvoKind::Owned => "OWNED",
            EvoKind::Unowned => "UNOWNED",
            EvoKind::AdjacentSectorFlag => "ADJACENT-SECTOR-FLAG",
            EvoKind::NotAdjacentSectorFlag => "NOT-ADJACENT-SECTOR-FLAG",
            EvoKind::NearSectorFlag => "NEAR-SECTOR-FLAG",
            EvoKind::NotNearSectorFlag => "NOT-NEAR-SECTOR-FLAG",
        }
    }
}

impl std::fmt::Display for EvoKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One row of a sector's evolution table (an `E` record).
#[derive(Debug, Clone, PartialEq)]
pub struct Evolution {
    pub kind: EvoKind,
    /// A sector id or a sector flag set, depending on `kind`.
    pub value: i64,
    /// Chance in percent, two decimal places meaningful.
    pub percent: f64,
    pub becomes: SectorVnum,
}

impl Evolution {
    pub fn target_sector(&self) -> Option<SectorVnum> {
        SectorVnum::try_from(self.value).ok()
    }

    pub fn target_flags(&self) -> Option<u64> {
        u64::try_from(self.value).ok()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectorType {
    pub vnum: SectorVnum,
    pub name: String,
    pub title: String,
    pub roadside_icon: char,
    pub mapout: i32,
    pub climate: i32,
    pub movement_loss: i32,
    pub flags: u64,
    pub build_flags: u64,
    /// In file order; order decides which rule of a kind is tried first.
    pub evolutions: Vec<Evolution>,
}

impl SectorType {
    pub fn new(vnum: SectorVnum, name: &str) -> Self {
        Self {
            vnum,
            name: name.to_string(),
            title: name.to_string(),
            roadside_icon: '.',
            mapout: 0,
            climate: 0,
            movement_loss: 1,
            flags: 0,
            build_flags: 0,
            evolutions: Vec::new(),
        }
    }

    pub fn is_flagged(&self, flags: u64) -> bool {
        self.flags & flags == flags
    }

    pub fn has_evolutions(&self) -> bool {
        !self.evolutions.is_empty()
    }

    pub fn evolutions_of(&self, kind: EvoKind) -> impl Iterator<Item = &Evolution> + '_ {
        self.evolutions.iter().filter(move |e| e.kind == kind)
    }
}

/// Parse the body of one `#vnum` sector record, through its closing `S`.
pub fn parse_sector(reader: &mut DataReader<'_>, vnum: SectorVnum) -> Result<SectorType, RegistryError> {
    let context = format!("sector #{}", vnum);
    let mut sect = SectorType::new(vnum, "");

    sect.name = reader.read_string(&context)?;
    sect.title = reader.read_string(&context)?;

    // line 3: 'icon' mapout climate movement flags build-flags
    let line = reader.expect_line(&context, "line 3")?;
    let Some((icon, rest)) = parse_quoted_icon(line) else {
        return Err(reader.format_error(&context, format!("bad line 3: '{}'", line)));
    };
    let f = reader.fields(rest, 5, &context, "line 3")?;
    sect.roadside_icon = icon;
    sect.mapout = reader.number(f[0], &context, "mapout")?;
    sect.climate = reader.number(f[1], &context, "climate")?;
    sect.movement_loss = reader.number(f[2], &context, "movement loss")?;
    sect.flags = ascii_flags(f[3]);
    sect.build_flags = ascii_flags(f[4]);

    loop {
        let line = reader.expect_line(&context, "a sub-record letter")?;
        match line.as_bytes()[0] {
            b'E' => {
                let data = reader.expect_line(&context, "E line data")?;
                sect.evolutions.push(parse_evolution(reader, data, &context)?);
            }
            b'C' => {
                reader.read_string(&context)?;
            }
            b'D' | b'X' => {
                reader.read_string(&context)?;
                reader.read_string(&context)?;
            }
            b'I' => {}
            b'M' => {
                reader.expect_line(&context, "M line data")?;
            }
            b'S' => return Ok(sect),
            _ => {
                return Err(reader.format_error(
                    &context,
                    format!("unexpected sub-record '{}'", line),
                ));
            }
        }
    }
}

fn parse_evolution<'a>(
    reader: &DataReader<'a>,
    data: &'a str,
    context: &str,
) -> Result<Evolution, RegistryError> {
    let f = reader.fields(data, 4, context, "E line")?;
    let code: i32 = reader.number(f[0], context, "evolution type")?;
    let Some(kind) = EvoKind::from_code(code) else {
        return Err(reader.format_error(context, format!("unknown evolution type {}", code)));
    };
    let value: i64 = reader.number(f[1], context, "evolution value")?;
    let percent: f64 = reader.number(f[2], context, "evolution percent")?;
    if !(0.0..=100.0).contains(&percent) {
        return Err(reader.format_error(
            context,
            format!("evolution percent {} outside 0-100", percent),
        ));
    }
    let becomes: SectorVnum = reader.number(f[3], context, "evolution result")?;

    Ok(Evolution {
        kind,
        value,
        percent,
        becomes,
    })
}

/// Split `'c' rest...` into the icon char and the remainder.
fn parse_quoted_icon(line: &str) -> Option<(char, &str)> {
    let rest = line.strip_prefix('\'')?;
    let mut chars = rest.char_indices();
    let (_, icon) = chars.next()?;
    let (close, quote) = chars.next()?;
    if quote != '\'' {
        return None;
    }
    Some((icon, &rest[close + 1..]))
}
