//! Station metadata supplied by the caller.

use serde::{Deserialize, Serialize};

/// Aerodrome metadata merged into the identification portion of a report
/// before encoding. The decoders only see the reported identifier; the
/// surrounding system looks up the rest from its station list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Station {
    /// Long name, e.g. "CHICAGO O'HARE INTERNATIONAL AIRPORT".
    pub name: Option<String>,
    /// Alternate designator when the reported identifier is not the
    /// published one (3-6 alphanumerics).
    pub alternate: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    /// Field elevation in the configured unit, when known.
    pub elevation: Option<f64>,
}

impl Station {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Station {
            latitude,
            longitude,
            ..Default::default()
        }
    }

    /// The `gml:pos` coordinate string, latitude first.
    pub fn pos(&self) -> String {
        format!("{} {}", self.latitude, self.longitude)
    }
}
