use crate::registry::reader::{ascii_flags, DataReader};
use crate::registry::RegistryError;
use crate::world::CropVnum;

// Crop flags
pub const CROPF_REQUIRES_WATER: u64 = 1 << 0;

#[derive(Debug, Clone, PartialEq)]
pub struct CropType {
    pub vnum: CropVnum,
    pub name: String,
    pub title: String,
    pub mapout: i32,
    pub climate: i32,
    pub flags: u64,
    /// Spawn bounds, in percent of map width/height.
    pub x_min: i32,
    pub x_max: i32,
    pub y_min: i32,
    pub y_max: i32,
}

impl CropType {
    pub fn new(vnum: CropVnum, name: &str) -> Self {
        Self {
            vnum,
            name: name.to_string(),
            title: name.to_string(),
            mapout: 0,
            climate: 0,
            flags: 0,
            x_min: 0,
            x_max: 100,
            y_min: 0,
            y_max: 100,
        }
    }

    pub fn requires_water(&self) -> bool {
        self.flags & CROPF_REQUIRES_WATER != 0
    }
}

pub fn parse_crop(reader: &mut DataReader<'_>, vnum: CropVnum) -> Result<CropType, RegistryError> {
    let context = format!("crop #{}", vnum);
    let mut crop = CropType::new(vnum, "");

    crop.name = reader.read_string(&context)?;
    crop.title = reader.read_string(&context)?;

    let line = reader.expect_line(&context, "line 3")?;
    let f = reader.fields(line, 3, &context, "line 3")?;
    crop.mapout = reader.number(f[0], &context, "mapout")?;
    crop.climate = reader.number(f[1], &context, "climate")?;
    crop.flags = ascii_flags(f[2]);

    let line = reader.expect_line(&context, "line 4")?;
    let f = reader.fields(line, 4, &context, "line 4")?;
    crop.x_min = reader.number(f[0], &context, "x_min")?;
    crop.x_max = reader.number(f[1], &context, "x_max")?;
    crop.y_min = reader.number(f[2], &context, "y_min")?;
    crop.y_max = reader.number(f[3], &context, "y_max")?;

    loop {
        let line = reader.expect_line(&context, "a sub-record letter")?;
        match line.as_bytes()[0] {
            b'D' | b'X' => {
                reader.read_string(&context)?;
                reader.read_string(&context)?;
            }
            b'I' => {}
            b'M' => {
                reader.expect_line(&context, "M line data")?;
            }
            b'S' => return Ok(crop),
            _ => {
                return Err(reader.format_error(
                    &context,
                    format!("unexpected sub-record '{}'", line),
                ));
            }
        }
    }
}
