//! Unit normalization for IWXXM output.
//!
//! IWXXM reports horizontal visibility and runway visual range in metres
//! regardless of the TAC unit, rounded to the Annex 3 reporting increments.

use serde::Serialize;

const METRES_PER_STATUTE_MILE: f64 = 1609.34;
const METRES_PER_FOOT: f64 = 0.3048;

/// Length units appearing in TAC visibility and RVR groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LengthUnit {
    Metres,
    StatuteMiles,
    Feet,
}

impl LengthUnit {
    /// The UCUM code used in IWXXM uom attributes.
    pub fn ucum(&self) -> &'static str {
        match self {
            LengthUnit::Metres => "m",
            LengthUnit::StatuteMiles => "[mi_i]",
            LengthUnit::Feet => "[ft_i]",
        }
    }
}

/// Convert a visibility value to whole metres, rounded down to the Annex 3
/// reporting increment: 50 m steps below 800 m, 100 m steps below 5 km,
/// 1 km steps at or above 5 km. The 9999 "10 km or more" sentinel (and any
/// value at or beyond it, e.g. converted P6SM) becomes 10000.
pub fn visibility_in_metres(value: f64, unit: LengthUnit) -> u32 {
    let metres = match unit {
        LengthUnit::StatuteMiles => value * METRES_PER_STATUTE_MILE,
        LengthUnit::Feet => value * METRES_PER_FOOT,
        LengthUnit::Metres => value,
    };
    let metres = metres.max(0.0) as u32;
    if metres >= 9999 {
        10000
    } else if metres < 800 {
        metres - metres % 50
    } else if metres < 5000 {
        metres - metres % 100
    } else {
        metres - metres % 1000
    }
}

/// Convert a runway visual range to whole metres, rounded down to the
/// Annex 3 RVR increments: 25 m steps below 400 m, 50 m steps below
/// 800 m, 100 m steps at or above.
pub fn rvr_in_metres(value: f64, unit: LengthUnit) -> u32 {
    let metres = match unit {
        LengthUnit::Feet => value * METRES_PER_FOOT,
        LengthUnit::StatuteMiles => value * METRES_PER_STATUTE_MILE,
        LengthUnit::Metres => value,
    };
    let metres = metres.max(0.0) as u32;
    if metres < 400 {
        metres - metres % 25
    } else if metres < 800 {
        metres - metres % 50
    } else {
        metres - metres % 100
    }
}

/// Cardinal/intercardinal compass point to a whole-degree bearing string.
/// North is reported as 360, never 0.
pub fn cardinal_to_degrees(points: &str) -> Option<&'static str> {
    match points {
        "N" => Some("360"),
        "NE" => Some("45"),
        "E" => Some("90"),
        "SE" => Some("135"),
        "S" => Some("180"),
        "SW" => Some("225"),
        "W" => Some("270"),
        "NW" => Some("315"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_p6sm_is_above_ten_km() {
        // 7.00 mi, the P6SM sentinel, lands beyond the 10 km cap.
        assert!(visibility_in_metres(7.0, LengthUnit::StatuteMiles) >= 10000);
    }

    #[test]
    fn test_fraction_mile_rounding() {
        // 1/2SM = 804.67 m -> 100 m step -> 800.
        assert_eq!(visibility_in_metres(0.5, LengthUnit::StatuteMiles), 800);
        // 1/4SM = 402.3 m -> 50 m step -> 400.
        assert_eq!(visibility_in_metres(0.25, LengthUnit::StatuteMiles), 400);
    }

    #[test]
    fn test_metres_passthrough_steps() {
        assert_eq!(visibility_in_metres(775.0, LengthUnit::Metres), 750);
        assert_eq!(visibility_in_metres(4321.0, LengthUnit::Metres), 4300);
        assert_eq!(visibility_in_metres(8000.0, LengthUnit::Metres), 8000);
    }

    #[test]
    fn test_ten_km_sentinel() {
        assert_eq!(visibility_in_metres(9999.0, LengthUnit::Metres), 10000);
    }

    #[test]
    fn test_rvr_feet_conversion() {
        // 1000 ft = 304.8 m -> 25 m step -> 300.
        assert_eq!(rvr_in_metres(1000.0, LengthUnit::Feet), 300);
        // 5500 ft = 1676.4 m -> 100 m step -> 1600.
        assert_eq!(rvr_in_metres(5500.0, LengthUnit::Feet), 1600);
    }

    #[test]
    fn test_cardinal_points() {
        assert_eq!(cardinal_to_degrees("N"), Some("360"));
        assert_eq!(cardinal_to_degrees("SW"), Some("225"));
        assert_eq!(cardinal_to_degrees("NNE"), None);
    }
}
