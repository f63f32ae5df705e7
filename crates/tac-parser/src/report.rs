//! The METAR/SPECI report record.
//!
//! A decoder builds one `Report` per call. Every matched token carries
//! exactly one source span; multi-occurrence groups accumulate in order.
//! The record is deliberately a closed set of typed fields rather than a
//! string-keyed map, so encoders get compile-time coverage of every
//! element kind.

use chrono::{DateTime, Utc};
use iwxxm_common::{LengthUnit, Span, Station};
use serde::Serialize;

/// A matched token: its text and source span.
#[derive(Debug, Clone, Serialize)]
pub struct Tagged {
    pub text: String,
    pub span: Span,
}

/// BELOW/ABOVE qualifier recovered from an M/P prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operator {
    Above,
    Below,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Above => "ABOVE",
            Operator::Below => "BELOW",
        }
    }
}

/// Wind speed units as reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpeedUnit {
    Knots,
    MetresPerSecond,
}

impl SpeedUnit {
    pub fn ucum(&self) -> &'static str {
        match self {
            SpeedUnit::Knots => "[kn_i]",
            SpeedUnit::MetresPerSecond => "m/s",
        }
    }
}

/// Issuance time: the ddHHmmZ group resolved against the reference clock.
#[derive(Debug, Clone, Serialize)]
pub struct IssueTime {
    pub text: String,
    pub span: Span,
    /// Resolved instant; None when the group digits form no valid time.
    pub time: Option<DateTime<Utc>>,
}

/// Surface wind group, possibly extended by a later variable-direction
/// token. Direction and speeds are kept as reported (digits, "VRB",
/// "///", "//") and interpreted at encode time.
#[derive(Debug, Clone, Serialize)]
pub struct Wind {
    pub text: String,
    pub span: Span,
    pub dd: String,
    pub ff: String,
    pub ff_plus: bool,
    pub gg: Option<String>,
    pub gg_plus: bool,
    pub unit: SpeedUnit,
    /// Extreme counter-clockwise direction from a dddVddd group.
    pub ccw: Option<String>,
    /// Extreme clockwise direction from a dddVddd group.
    pub cw: Option<String>,
}

impl Wind {
    /// Parse a dddffGfffKT-shaped group. P prefixes on speeds mark
    /// "greater than the reportable maximum" and set the plus flags.
    pub(crate) fn parse(text: String, span: Span) -> Wind {
        let (unit, body) = if let Some(stripped) = text.strip_suffix("MPS") {
            (SpeedUnit::MetresPerSecond, stripped)
        } else {
            (SpeedUnit::Knots, text.strip_suffix("KT").unwrap_or(&text))
        };

        let dd = body[..3].to_string();
        let mut ff = body[3..].to_string();
        let mut ff_plus = false;
        let mut gg = None;
        let mut gg_plus = false;

        if let Some(idx) = ff.find('G') {
            let mut gust = ff[idx + 1..].to_string();
            ff.truncate(idx);
            if let Some(rest) = gust.strip_prefix('P') {
                gg_plus = true;
                gust = rest.to_string();
            }
            gg = Some(gust);
        }
        if let Some(rest) = ff.strip_prefix('P') {
            ff_plus = true;
            ff = rest.to_string();
        }

        Wind {
            text,
            span,
            dd,
            ff,
            ff_plus,
            gg,
            gg_plus,
            unit,
            ccw: None,
            cw: None,
        }
    }
}

/// Prevailing horizontal visibility, in statute miles (fraction form) or
/// whole metres. A directional minimum-visibility group merges into the
/// same entry.
#[derive(Debug, Clone, Serialize)]
pub struct Visibility {
    pub text: String,
    pub span: Span,
    /// "7.00"-style miles or "0800"-style metres; may contain '/' when
    /// the group was reported missing.
    pub value: String,
    pub unit: LengthUnit,
    pub oper: Option<Operator>,
    /// Directional minimum visibility in metres.
    pub min: Option<String>,
    /// Bearing of the minimum, whole degrees, "/" when unknown.
    pub min_bearing: Option<String>,
}

/// Past RVR tendency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RvrTendency {
    Upward,
    Downward,
    NoChange,
    Missing,
}

impl RvrTendency {
    pub fn as_str(&self) -> &'static str {
        match self {
            RvrTendency::Upward => "UPWARD",
            RvrTendency::Downward => "DOWNWARD",
            RvrTendency::NoChange => "NO_CHANGE",
            RvrTendency::Missing => "MISSING_VALUE",
        }
    }
}

/// Runway visual range: four index-aligned parallel sequences, one
/// element appended per reported group.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RvrGroup {
    pub text: Vec<String>,
    pub span: Vec<Span>,
    pub runway: Vec<String>,
    pub mean: Vec<String>,
    pub oper: Vec<Option<Operator>>,
    pub tendency: Vec<RvrTendency>,
    pub unit: Vec<LengthUnit>,
}

impl RvrGroup {
    pub fn len(&self) -> usize {
        self.runway.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runway.is_empty()
    }
}

/// Variable RVR (FMH-1): parallel sequences of runway and low/high bounds.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VariableRvrGroup {
    pub text: Vec<String>,
    pub span: Vec<Span>,
    pub runway: Vec<String>,
    pub lo: Vec<String>,
    pub hi: Vec<String>,
    pub oper: Vec<Option<Operator>>,
    pub unit: Vec<LengthUnit>,
}

impl VariableRvrGroup {
    pub fn is_empty(&self) -> bool {
        self.runway.is_empty()
    }
}

/// Ordered accumulation of same-kind tokens (weather, sky layers, ...).
#[derive(Debug, Clone, Default, Serialize)]
pub struct TokenList {
    pub entries: Vec<Tagged>,
}

impl TokenList {
    pub fn push(&mut self, text: impl Into<String>, span: Span) {
        self.entries.push(Tagged {
            text: text.into(),
            span,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Air and dew-point temperature, whole degrees Celsius as signed strings.
#[derive(Debug, Clone, Serialize)]
pub struct Temperatures {
    pub text: String,
    pub span: Span,
    pub air: Option<String>,
    pub dewpoint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PressureUnit {
    HectoPascals,
    InchesOfMercury,
}

/// Altimeter setting. QNH in hectopascals wins over the inches form when
/// both are reported.
#[derive(Debug, Clone, Serialize)]
pub struct Altimeter {
    pub text: String,
    pub span: Span,
    /// Whole hPa digits, or "29.92"-style inches; may be "////".
    pub value: String,
    pub unit: PressureUnit,
}

/// Wind shear over one runway, or all runways when `runway` is None.
#[derive(Debug, Clone, Serialize)]
pub struct WindShear {
    pub text: String,
    pub span: Span,
    pub runway: Option<String>,
}

/// Sea surface temperature plus sea state or significant wave height.
#[derive(Debug, Clone, Serialize)]
pub struct SeaState {
    pub text: String,
    pub span: Span,
    /// Signed whole degrees Celsius, or the raw "//" when missing.
    pub temperature: String,
    pub state: Option<String>,
    pub wave_height: Option<String>,
}

/// One runway-state group (deposit/contamination/depth/friction digits or
/// SNOCLO/CLRD).
#[derive(Debug, Clone, Serialize)]
pub struct RunwayState {
    pub text: String,
    pub span: Span,
    pub runway: String,
    pub state: String,
}

/// Trend qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrendKind {
    Becmg,
    Tempo,
}

/// Weather elements shared between the base observation and trend groups.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WeatherGroup {
    pub wind: Option<Wind>,
    pub cavok: Option<Span>,
    pub vsby: Option<Visibility>,
    /// Precipitation and NSW tokens, in reported order.
    pub pcp: TokenList,
    pub obv: TokenList,
    pub sky: TokenList,
}

/// One trend forecast (BECMG/TEMPO) with its validity window.
#[derive(Debug, Clone, Serialize)]
pub struct Trend {
    pub kind: TrendKind,
    pub span: Span,
    pub from: Option<DateTime<Utc>>,
    pub til: Option<DateTime<Utc>>,
    pub wx: WeatherGroup,
}

/// The decoded METAR/SPECI record.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// "METAR" or "SPECI".
    pub kind: Option<Tagged>,
    pub ident: Option<Tagged>,
    /// Caller-supplied aerodrome metadata, merged before encoding.
    pub station: Option<Station>,
    pub issue_time: Option<IssueTime>,
    pub auto: Option<Span>,
    pub correction: Option<Span>,
    pub nil: Option<Span>,
    pub nosig: Option<Span>,
    pub wx: WeatherGroup,
    pub vcnty: TokenList,
    pub rvr: Option<RvrGroup>,
    pub variable_rvr: Option<VariableRvrGroup>,
    pub temps: Option<Temperatures>,
    pub altimeter: Option<Altimeter>,
    pub recent_weather: TokenList,
    pub wind_shear: Option<WindShear>,
    pub sea_state: Option<SeaState>,
    pub runway_state: Vec<RunwayState>,
    pub trends: Vec<Trend>,
    pub remarks: Remarks,
    /// Unrecognized text found before RMK (FMH-1 post-pass).
    pub unparsed: Option<String>,
    /// Observer-added text found after RMK (FMH-1 post-pass).
    pub additive: Option<String>,
    /// Set when decoding stopped early; the record holds the partial
    /// decode up to that point.
    pub err_msg: Option<String>,
    pub translation_time: DateTime<Utc>,
}

impl Report {
    pub fn new(now: DateTime<Utc>) -> Self {
        Report {
            kind: None,
            ident: None,
            station: None,
            issue_time: None,
            auto: None,
            correction: None,
            nil: None,
            nosig: None,
            wx: WeatherGroup::default(),
            vcnty: TokenList::default(),
            rvr: None,
            variable_rvr: None,
            temps: None,
            altimeter: None,
            recent_weather: TokenList::default(),
            wind_shear: None,
            sea_state: None,
            runway_state: Vec::new(),
            trends: Vec::new(),
            remarks: Remarks::default(),
            unparsed: None,
            additive: None,
            err_msg: None,
            translation_time: now,
        }
    }

    pub fn is_nil(&self) -> bool {
        self.nil.is_some()
    }

    pub fn is_automated(&self) -> bool {
        self.auto.is_some()
    }
}

// ---------------------------------------------------------------------------
// FMH-1 remarks

/// Peak wind since the last routine report.
#[derive(Debug, Clone, Serialize)]
pub struct PeakWind {
    pub text: String,
    pub span: Span,
    pub dd: String,
    pub ff: String,
    pub unit: SpeedUnit,
    pub time: Option<DateTime<Utc>>,
}

/// Wind shift, possibly marking a frontal passage.
#[derive(Debug, Clone, Serialize)]
pub struct WindShift {
    pub text: String,
    pub span: Span,
    pub time: Option<DateTime<Utc>>,
    pub fropa: bool,
}

/// Sea-level pressure from the SLPppp group. The 3-digit encoding is
/// decade-ambiguous; `corrected` is set when temperature/wind evidence
/// forced a ±100 hPa substitution over the nearest-to-1000 assumption.
#[derive(Debug, Clone, Serialize)]
pub struct SeaLevelPressure {
    pub text: String,
    pub span: Span,
    pub value: Option<f64>,
    pub corrected: bool,
}

/// A precipitation amount in hundredths of an inch over a period.
#[derive(Debug, Clone, Serialize)]
pub struct PrecipAmount {
    pub text: String,
    pub span: Span,
    /// "0.25"-style inches; None when reported missing.
    pub value: Option<String>,
    /// An all-zero group means a trace: less than 0.01 in.
    pub trace: bool,
    pub period_hours: Option<u8>,
}

/// 6- or 24-hour maximum/minimum temperatures, tenths of a degree.
#[derive(Debug, Clone, Serialize)]
pub struct MaxMinTemps {
    pub text: String,
    pub span: Span,
    pub period_hours: u8,
    pub max: Option<String>,
    pub min: Option<String>,
}

/// 3-hour pressure tendency: WMO 0-10-063 characteristic + change in hPa.
#[derive(Debug, Clone, Serialize)]
pub struct PressureTendency {
    pub text: String,
    pub span: Span,
    pub character: char,
    pub change: Option<String>,
}

/// Qualitative distance class for observed phenomena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DistanceClass {
    AtStation,
    Vicinity,
    Distant,
}

/// A compass sector with optional range, from the location sub-parser.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sector {
    pub text: String,
    pub ccw: f32,
    pub cw: f32,
    /// (nearest, farthest) statute miles when a range was reported.
    pub distance: Option<(u32, u32)>,
}

impl Sector {
    pub fn is_overhead(&self) -> bool {
        self.text.contains("OHD")
    }
}

/// One lightning remark: frequency, sorted type list and located sectors.
#[derive(Debug, Clone, Serialize)]
pub struct LightningGroup {
    pub text: String,
    pub span: Span,
    pub frequency: Option<String>,
    pub types: Vec<String>,
    pub locations: Vec<(DistanceClass, Vec<Sector>)>,
}

/// One thunderstorm/CB location remark with optional movement.
#[derive(Debug, Clone, Serialize)]
pub struct ConvectionGroup {
    pub text: String,
    pub span: Span,
    pub cloud_type: String,
    pub locations: Vec<(DistanceClass, Vec<Sector>)>,
    /// Compass direction of motion, or "OHD".
    pub movement: Option<String>,
}

/// Failed-sensor indicators grouped by location ("none" for unlocated).
#[derive(Debug, Clone, Default, Serialize)]
pub struct SensorStatus {
    pub text: String,
    pub spans: Vec<Span>,
    pub sensors: Vec<(String, Vec<String>)>,
}

impl SensorStatus {
    pub fn add(&mut self, location: String, sensor: String) {
        if let Some((_, list)) = self.sensors.iter_mut().find(|(l, _)| *l == location) {
            list.push(sensor);
        } else {
            self.sensors.push((location, vec![sensor]));
        }
    }
}

/// Snow depth on the ground, whole inches.
#[derive(Debug, Clone, Serialize)]
pub struct SnowDepth {
    pub text: String,
    pub span: Span,
    pub value: String,
}

/// The FMH-1 remarks section. Everything here is optional; remark groups
/// with no production end up in `Report::additive` untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Remarks {
    pub ostype: Option<Tagged>,
    pub temp_dec: Option<Tagged>,
    pub slp: Option<SeaLevelPressure>,
    pub peak_wind: Option<PeakWind>,
    pub wind_shift: Option<WindShift>,
    pub pcpn1h: Option<PrecipAmount>,
    pub pcpn6h: Option<PrecipAmount>,
    pub pcpn24h: Option<PrecipAmount>,
    pub snow_depth: Option<SnowDepth>,
    pub pressure_tendency: Option<PressureTendency>,
    /// PRESRR/PRESFR: true when rising rapidly.
    pub pressure_rising: Option<bool>,
    pub maxmin6h: Option<MaxMinTemps>,
    pub maxmin24h: Option<MaxMinTemps>,
    pub lightning: Vec<LightningGroup>,
    pub convection: Vec<ConvectionGroup>,
    pub sensor_status: Option<SensorStatus>,
    pub nospeci: Option<Tagged>,
    pub maintenance: Option<Span>,
}
