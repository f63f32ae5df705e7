//! Bearing/distance location phrases from FMH-1 remarks.
//!
//! Lightning and convection remarks locate phenomena with compass points
//! ("SW"), ranged points ("10NE"), spans ("NE-SE"), OHD, ALQDS and
//! AND-separated lists, optionally qualified by a VC or DSNT distance
//! class. The parser reduces a phrase to sectors of (counter-)clockwise
//! bearing bounds; adjacent sectors sharing an edge and an equal range
//! merge into one.

use std::sync::OnceLock;

use regex::Regex;

use crate::report::{DistanceClass, Sector};

fn compass_bounds(point: &str) -> Option<(f32, f32)> {
    let bounds = match point {
        "N" => (337.5, 22.5),
        "NE" => (22.5, 67.5),
        "E" => (67.5, 112.5),
        "SE" => (112.5, 157.5),
        "S" => (157.5, 202.5),
        "SW" => (202.5, 247.5),
        "W" => (247.5, 292.5),
        "NW" => (292.5, 337.5),
        _ => return None,
    };
    Some(bounds)
}

fn point_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{0,4})([NEWS]{1,3})$").expect("point pattern"))
}

/// Parse one location phrase into (distance class, sectors) lists. The
/// VC and DSNT qualifiers claim the compass words that follow them; the
/// remainder is located at the station.
pub fn parse_location_phrase(phrase: &str) -> Vec<(DistanceClass, Vec<Sector>)> {
    let mut at_station = Vec::new();
    let mut vicinity = Vec::new();
    let mut distant = Vec::new();

    let mut current = &mut at_station;
    for word in phrase.split_whitespace() {
        match word {
            "VC" => current = &mut vicinity,
            "DSNT" => current = &mut distant,
            _ => current.push(word),
        }
    }

    let mut out = Vec::new();
    for (class, words) in [
        (DistanceClass::Vicinity, vicinity),
        (DistanceClass::Distant, distant),
        (DistanceClass::AtStation, at_station),
    ] {
        if words.is_empty() {
            continue;
        }
        let sectors = parse_sectors(&words);
        if !sectors.is_empty() {
            out.push((class, sectors));
        }
    }
    out
}

/// Parse AND-separated sector words into bearing/range sectors.
fn parse_sectors(words: &[&str]) -> Vec<Sector> {
    let mut sectors: Vec<Sector> = Vec::new();

    for word in words {
        if *word == "AND" || *word == "-" {
            continue;
        }
        if *word == "OHD" {
            if !sectors.iter().any(Sector::is_overhead) {
                sectors.push(Sector {
                    text: "OHD".to_string(),
                    ccw: 0.0,
                    cw: 0.0,
                    distance: None,
                });
            }
            continue;
        }
        if *word == "ALQDS" || *word == "ALQS" {
            sectors.push(Sector {
                text: word.to_string(),
                ccw: 0.0,
                cw: 360.0,
                distance: None,
            });
            continue;
        }

        // A span like "10NE-SE": the sector runs from the first point's
        // counter-clockwise edge to the last point's clockwise edge.
        let mut ccw = None;
        let mut cw = None;
        let mut distances: Vec<u32> = Vec::new();
        let mut text = String::new();
        for part in word.split('-') {
            let Some(caps) = point_re().captures(part) else {
                continue;
            };
            let digits = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            if let Ok(d) = digits.parse::<u32>() {
                if d > 0 {
                    distances.push(d);
                }
            }
            let point = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            let bounds = compass_bounds(point)
                .or_else(|| compass_bounds(&point[..1]));
            let Some((lo, hi)) = bounds else { continue };
            if ccw.is_none() {
                ccw = Some(lo);
            }
            cw = Some(hi);
            if !text.is_empty() {
                text.push('-');
            }
            text.push_str(point);
        }
        if let (Some(ccw), Some(cw)) = (ccw, cw) {
            let distance = match distances.as_slice() {
                [] => None,
                [d] => Some((*d, *d)),
                ds => Some((ds[0], *ds.last().unwrap())),
            };
            sectors.push(Sector {
                text,
                ccw,
                cw,
                distance,
            });
        }
    }

    merge_adjacent(sectors)
}

/// Combine consecutive sectors whose edges touch and whose ranges agree.
fn merge_adjacent(sectors: Vec<Sector>) -> Vec<Sector> {
    let mut merged: Vec<Sector> = Vec::new();
    for sector in sectors {
        if let Some(last) = merged.last_mut() {
            if last.cw == sector.ccw && last.distance == sector.distance {
                last.cw = sector.cw;
                last.text = format!("{}-{}", last.text, sector.text);
                continue;
            }
        }
        merged.push(sector);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_point() {
        let locs = parse_location_phrase("SW");
        assert_eq!(locs.len(), 1);
        let (class, sectors) = &locs[0];
        assert_eq!(*class, DistanceClass::AtStation);
        assert_eq!(sectors[0].ccw, 202.5);
        assert_eq!(sectors[0].cw, 247.5);
        assert_eq!(sectors[0].distance, None);
    }

    #[test]
    fn test_distant_span() {
        let locs = parse_location_phrase("DSNT NE-SE");
        let (class, sectors) = &locs[0];
        assert_eq!(*class, DistanceClass::Distant);
        assert_eq!(sectors.len(), 1);
        assert_eq!(sectors[0].ccw, 22.5);
        assert_eq!(sectors[0].cw, 157.5);
    }

    #[test]
    fn test_ranged_point() {
        let locs = parse_location_phrase("10NE");
        assert_eq!(locs[0].1[0].distance, Some((10, 10)));
    }

    #[test]
    fn test_adjacent_points_merge() {
        let locs = parse_location_phrase("NE AND SE");
        // NE (22.5..67.5) does not touch SE (112.5..157.5): two sectors.
        assert_eq!(locs[0].1.len(), 2);
        let locs = parse_location_phrase("N AND NE");
        assert_eq!(locs[0].1.len(), 1);
        assert_eq!(locs[0].1[0].ccw, 337.5);
        assert_eq!(locs[0].1[0].cw, 67.5);
    }

    #[test]
    fn test_vicinity_and_station_split() {
        let locs = parse_location_phrase("VC W S");
        assert_eq!(locs.len(), 1);
        assert_eq!(locs[0].0, DistanceClass::Vicinity);
        assert_eq!(locs[0].1.len(), 2);
    }

    #[test]
    fn test_overhead() {
        let locs = parse_location_phrase("OHD");
        assert!(locs[0].1[0].is_overhead());
    }
}
