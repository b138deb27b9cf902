use crate::world::Season;

/// Latitude limits of the always-warm and always-frozen bands, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateBands {
    pub tropic_latitude: f64,
    pub arctic_latitude: f64,
}

impl Default for ClimateBands {
    fn default() -> Self {
        Self {
            tropic_latitude: 23.5,
            arctic_latitude: 66.5,
        }
    }
}

impl ClimateBands {
    /// Tropic band as a percent of one hemisphere (equator to pole).
    pub fn tropics_percent(&self) -> f64 {
        self.tropic_latitude / 0.9
    }

    /// Arctic band as a percent of one hemisphere.
    pub fn arctic_percent(&self) -> f64 {
        (90.0 - self.arctic_latitude) / 0.9
    }
}

/// Season on row `y` of a map `height` rows tall, on `day_of_year` (0-359).
///
/// Row 0 is the southern edge and row `y` sits at latitude
/// `y * 180 / height - 90`. Rows inside the tropic band follow a fixed
/// month cycle, rows past the arctic line are always winter, and everything
/// between uses two linear boundaries per half-year whose slopes come from
/// the band widths. The southern hemisphere mirrors the labels.
pub fn season_at(y: u32, height: u32, day_of_year: u32, bands: &ClimateBands) -> Season {
    let ycoord = y as i32;
    let h = f64::from(height);
    let doy = day_of_year as i32;
    let month = doy / 30;

    let latitude = (f64::from(ycoord) * 180.0 / h - 90.0).abs();
    if latitude <= bands.tropic_latitude {
        return match month {
            0 | 1 => Season::Spring,
            10.. => Season::Autumn,
            _ => Season::Summer,
        };
    }

    if latitude >= bands.arctic_latitude {
        return Season::Winter;
    }

    let mid = (h / 2.0).round();

    let northern = ycoord >= (height / 2) as i32;
    let y_max = mid as i32;
    let (ap, tp) = (bands.arctic_percent(), bands.tropics_percent());
    let ym = f64::from(y_max);

    let (a_slope, b_slope, half_y) = if northern {
        let y_arctic = (ym - ap * ym / 100.0).round() as i32;
        let y_tropics = (tp * ym / 100.0).round() as i32;
        let span = f64::from((y_arctic - 1) - (y_tropics + 1));
        (span / 120.0, span / 90.0, (ycoord - y_max).abs() - y_tropics)
    } else {
        let y_arctic = (ap * ym / 100.0).round() as i32;
        let y_tropics = (ym - tp * ym / 100.0).round() as i32;
        let span = f64::from((y_tropics - 1) - (y_arctic + 1));
        (span / 120.0, span / 90.0, ycoord - y_arctic)
    };
    let half_y = f64::from(half_y);

    let (cold, mild, warm) = if doy < 180 {
        let winter_line = (f64::from(doy + 1) * a_slope).round();
        let spring_line = (f64::from(doy - 89) * b_slope).round();
        let mild = if northern { Season::Spring } else { Season::Autumn };
        (half_y >= winter_line, half_y >= spring_line, mild)
    } else {
        let winter_line = (f64::from(doy - 360) * -a_slope).round();
        let autumn_line = (f64::from(doy - 268) * -b_slope).round();
        let mild = if northern { Season::Autumn } else { Season::Spring };
        (half_y >= winter_line, half_y >= autumn_line, mild)
    };

    match (cold, mild, northern) {
        (true, _, true) => Season::Winter,
        (true, _, false) => Season::Summer,
        (false, true, _) => warm,
        (false, false, true) => Season::Summer,
        (false, false, false) => Season::Winter,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const H: u32 = 1000;

    fn season(y: u32, doy: u32) -> Season {
        season_at(y, H, doy, &ClimateBands::default())
    }

    #[test]
    fn default_bands_are_symmetric_percents() {
        let bands = ClimateBands::default();
        assert!((bands.tropics_percent() - 26.111).abs() < 0.001);
        assert!((bands.arctic_percent() - 26.111).abs() < 0.001);
    }

    #[test]
    fn tropics_follow_month_cycle() {
        assert_eq!(season(500, 0), Season::Spring);
        assert_eq!(season(500, 59), Season::Spring);
        assert_eq!(season(500, 60), Season::Summer);
        assert_eq!(season(600, 179), Season::Summer);
        assert_eq!(season(420, 299), Season::Summer);
        assert_eq!(season(420, 300), Season::Autumn);
        assert_eq!(season(500, 359), Season::Autumn);
    }

    #[test]
    fn polar_rows_are_always_winter() {
        for doy in [0, 90, 180, 270, 359] {
            assert_eq!(season(0, doy), Season::Winter);
            assert_eq!(season(100, doy), Season::Winter);
            assert_eq!(season(999, doy), Season::Winter);
            assert_eq!(season(900, doy), Season::Winter);
        }
    }

    #[test]
    fn northern_temperate_first_half() {
        assert_eq!(season(850, 0), Season::Winter);
        assert_eq!(season(850, 150), Season::Spring);
        assert_eq!(season(850, 179), Season::Summer);
    }

    #[test]
    fn northern_temperate_second_half() {
        // half_y = 219; winter line at doy 300 is round(60 * 1.9667) = 118
        assert_eq!(season(850, 300), Season::Winter);
        // doy 200: winter line 315, autumn line round(68 * 2.622) = 178
        assert_eq!(season(850, 200), Season::Autumn);
        // doy 180: winter line 354, autumn line 231
        assert_eq!(season(850, 180), Season::Summer);
    }

    #[test]
    fn southern_temperate_mirrors_labels() {
        assert_eq!(season(150, 0), Season::Summer);
        assert_eq!(season(150, 150), Season::Winter);
        // half_y = 19; doy 100: winter line 199, spring line round(11 * 2.622) = 29
        assert_eq!(season(150, 100), Season::Winter);
        // doy 80: spring line round(-9 * 2.622) = -24
        assert_eq!(season(150, 80), Season::Autumn);
    }

    #[test]
    fn wider_tropics_swallow_temperate_rows() {
        let bands = ClimateBands {
            tropic_latitude: 60.0,
            arctic_latitude: 80.0,
        };
        assert_eq!(season_at(800, H, 100, &bands), Season::Summer);
        assert_eq!(season_at(980, H, 100, &bands), Season::Winter);
    }

    #[test]
    fn odd_heights_use_row_latitude() {
        let bands = ClimateBands {
            tropic_latitude: 18.0,
            arctic_latitude: 66.5,
        };
        // row 2 of 5 is at -18 degrees
        assert_eq!(season_at(2, 5, 100, &bands), Season::Summer);
        assert_eq!(season_at(2, 5, 10, &bands), Season::Spring);
        // rows 0 and 4 sit at -90 and +54
        assert_eq!(season_at(0, 5, 100, &bands), Season::Winter);
        assert_ne!(season_at(4, 5, 100, &bands), season_at(2, 5, 100, &bands));
    }
}
