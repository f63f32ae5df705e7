//! TAF → IWXXM 3.0 encoder.
//!
//! The document shares one valid-period element: the base forecast's
//! phenomenon time references it by gml id rather than duplicating it.
//! Change groups become sibling changeForecast elements whose change
//! indicator comes from a fixed enumeration over the BECMG/TEMPO/PROB
//! combinations. The US amendment-limitation clause is a secondary
//! pattern match over text captured, not interpreted, by the decoder.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use iwxxm_common::time::{iso_format, on_or_after};
use iwxxm_common::units::visibility_in_metres;
use iwxxm_common::{gml_id, XmlElement};
use tac_parser::taf::{ChangeKind, TafPeriod, TafReport, TafState};

use crate::codes::CodeRegistry;
use crate::config::{self, TranslationConfig};
use crate::metar::{bool_str, nil_uom};

/// Encodes TAF records against the IWXXM 3.0 TAF schema.
pub struct TafEncoder {
    codes: CodeRegistry,
    config: TranslationConfig,
}

impl TafEncoder {
    pub fn new(codes: CodeRegistry, config: TranslationConfig) -> Self {
        TafEncoder { codes, config }
    }

    pub fn encode(&self, taf: &TafReport, raw_tac: &str) -> XmlElement {
        Builder {
            enc: self,
            taf,
            raw: raw_tac,
            shared_valid_id: None,
        }
        .build()
    }
}

struct Builder<'a> {
    enc: &'a TafEncoder,
    taf: &'a TafReport,
    raw: &'a str,
    /// The overall valid-period id, consumed by the base forecast's
    /// phenomenonTime on non-US TAFs.
    shared_valid_id: Option<String>,
}

impl Builder<'_> {
    fn build(mut self) -> XmlElement {
        let taf = self.taf;
        let mut root = XmlElement::new("TAF");
        root.set("xmlns", config::IWXXM_URI);
        root.set("xmlns:aixm", config::AIXM_URI);
        root.set("xmlns:gml", config::GML_URI);
        root.set("xmlns:xlink", config::XLINK_URI);
        root.set("xmlns:xsi", config::XSI_URI);

        let us_taf = self.is_us_taf();
        let us_extensions = us_taf && self.non_annex_element_count() > 0;
        if us_extensions {
            root.set("xmlns:iwxxm-us", config::IWXXM_US_URI);
            root.set(
                "xsi:schemaLocation",
                format!(
                    "{} {} {} {}taf.xsd",
                    config::IWXXM_URI,
                    config::IWXXM_URL,
                    config::IWXXM_US_URI,
                    config::IWXXM_US_URL
                ),
            );
        } else {
            root.set(
                "xsi:schemaLocation",
                format!("{} {}", config::IWXXM_URI, config::IWXXM_URL),
            );
        }

        let canceled = taf.state == TafState::Canceled;
        let nil = taf.state == TafState::Nil;
        if canceled {
            root.set("isCancelReport", "true");
        }
        root.set(
            "reportStatus",
            match taf.bbb.chars().next() {
                Some('A') => "AMENDMENT",
                Some('C') => "CORRECTION",
                _ => "NORMAL",
            },
        );
        root.set("permissibleUsage", "OPERATIONAL");

        let failed = taf.err_msg.is_some();
        if let Some(err) = &taf.err_msg {
            let collapsed = self.raw.split_whitespace().collect::<Vec<_>>().join(" ");
            root.set("translationFailedTAC", collapsed);
            root.set("permissibleUsageSupplementary", err);
        }
        root.set("gml:id", gml_id());

        self.issue_time(&mut root);
        self.aerodrome(&mut root);

        if canceled {
            if let Some(valid) = &taf.prev_valid {
                let el = root.child("cancelledReportValidPeriod");
                self.time_period(el, valid.from, valid.to);
            }
            return root;
        }
        if let Some(valid) = &taf.valid {
            let el = root.child("validPeriod");
            let id = self.time_period(el, valid.from, valid.to);
            if !us_taf {
                self.shared_valid_id = Some(id);
            }
        }
        if failed {
            return root;
        }

        if nil || taf.groups.is_empty() {
            root.child("baseForecast")
                .set("nilReason", config::NIL_MSSG_URL);
            return root;
        }

        let base = &taf.groups[0];
        self.base_forecast(&mut root, &base.prevailing);
        for occasional in &base.occasional {
            self.change_forecast(&mut root, occasional);
        }
        for group in &taf.groups[1..] {
            self.change_forecast(&mut root, &group.prevailing);
            for occasional in &group.occasional {
                self.change_forecast(&mut root, occasional);
            }
        }

        if let Some(amd) = &taf.amd {
            let mut extension = XmlElement::new("extension");
            self.amendment_limits(&mut extension, &amd.text);
            root.push(extension);
        }
        root
    }

    fn is_us_taf(&self) -> bool {
        let Some(ident) = self.taf.ident.as_ref().map(|i| i.text.as_str()) else {
            return false;
        };
        matches!(ident.chars().next(), Some('K') | Some('P'))
            || matches!(&ident[..2.min(ident.len())], "TJ" | "TI" | "NS")
    }

    fn non_annex_element_count(&self) -> usize {
        let mut count = usize::from(self.taf.amd.is_some());
        for group in &self.taf.groups {
            if group.prevailing.llws.is_some() {
                count += 1;
            }
        }
        count
    }

    fn issue_time(&mut self, root: &mut XmlElement) {
        let el = root.child("issueTime");
        match self.taf.issue_time {
            Some(time) => {
                let instant = el.child("gml:TimeInstant");
                instant.set("gml:id", gml_id());
                instant.child("gml:timePosition").set_text(iso_format(time));
            }
            None => el.set("nilReason", config::NIL_MSSG_URL),
        }
    }

    fn aerodrome(&mut self, root: &mut XmlElement) {
        let el = root.child("aerodrome");
        let heliport = el.child("aixm:AirportHeliport");
        heliport.set("gml:id", gml_id());
        let slice = heliport
            .child("aixm:timeSlice")
            .child("aixm:AirportHeliportTimeSlice");
        slice.set("gml:id", gml_id());
        slice.child("gml:validTime");
        slice.child("aixm:interpretation").set_text("SNAPSHOT");

        let reported = self
            .taf
            .ident
            .as_ref()
            .map(|t| t.text.trim().to_uppercase())
            .unwrap_or_default();
        let designator = self
            .taf
            .station
            .as_ref()
            .and_then(|s| s.alternate.as_deref())
            .map(|s| s.trim().to_uppercase())
            .unwrap_or_else(|| reported.clone());
        if (3..=6).contains(&designator.len())
            && designator
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        {
            slice.child("aixm:designator").set_text(&designator);
        }
        if let Some(name) = self.taf.station.as_ref().and_then(|s| s.name.as_deref()) {
            let name = name.trim().to_uppercase();
            if !name.is_empty() {
                slice.child("aixm:name").set_text(name);
            }
        }
        if reported.len() == 4 && reported.chars().all(|c| c.is_ascii_uppercase()) {
            slice
                .child("aixm:locationIndicatorICAO")
                .set_text(&reported);
        }

        if let Some(station) = &self.taf.station {
            let point = slice.child("aixm:ARP").child("aixm:ElevatedPoint");
            point.set("srsDimension", &self.enc.config.srs_dimension);
            point.set("srsName", &self.enc.config.srs_name);
            point.set("axisLabels", &self.enc.config.axis_labels);
            point.set("gml:id", gml_id());
            point.child("gml:pos").set_text(station.pos());
            if self.enc.config.srs_dimension == "3" {
                if let Some(elevation) = station.elevation {
                    let elev = point.child("aixm:elevation");
                    elev.set("uom", &self.enc.config.elevation_uom);
                    elev.set_text(format!("{elevation}"));
                    point
                        .child("aixm:verticalDatum")
                        .set_text(&self.enc.config.vertical_datum);
                }
            }
        }
    }

    /// Emit a gml:TimePeriod under `parent`, returning its reference id.
    fn time_period(
        &self,
        parent: &mut XmlElement,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> String {
        let period = parent.child("gml:TimePeriod");
        let id = gml_id();
        period.set("gml:id", &id);
        let begin = period.child("gml:beginPosition");
        match from {
            Some(t) => begin.set_text(iso_format(t)),
            None => begin.set("indeterminatePosition", "unknown"),
        }
        let end = period.child("gml:endPosition");
        match to {
            Some(t) => end.set_text(iso_format(t)),
            None => end.set("indeterminatePosition", "unknown"),
        }
        format!("#{id}")
    }

    fn base_forecast(&mut self, root: &mut XmlElement, period: &TafPeriod) {
        let mut body = XmlElement::new("MeteorologicalAerodromeForecast");
        let phenomenon = body.child("phenomenonTime");
        // The base forecast shares the already-emitted valid period.
        match self.shared_valid_id.take() {
            Some(id) => phenomenon.set("xlink:href", id),
            None => {
                let window = period.time.as_ref();
                self.time_period(
                    phenomenon,
                    window.and_then(|w| w.from),
                    window.and_then(|w| w.to),
                );
            }
        }
        self.result(&mut body, period, true);
        root.child("baseForecast").push(body);
    }

    fn change_forecast(&mut self, root: &mut XmlElement, period: &TafPeriod) {
        let mut body = XmlElement::new("MeteorologicalAerodromeForecast");
        let phenomenon = body.child("phenomenonTime");
        let window = period.time.as_ref();
        self.time_period(
            phenomenon,
            window.and_then(|w| w.from),
            window.and_then(|w| w.to),
        );
        self.result(&mut body, period, false);
        root.child("changeForecast").push(body);
    }

    fn result(&mut self, body: &mut XmlElement, period: &TafPeriod, base: bool) {
        body.set("cloudAndVisibilityOK", bool_str(period.cavok));
        if !base {
            body.set("changeIndicator", change_indicator(period));
        }
        body.set("gml:id", gml_id());

        // CAVOK suppresses everything except wind and temperature.
        if !period.cavok {
            if let Some(vsby) = &period.vsby {
                let metres = visibility_in_metres(vsby.value.parse().unwrap_or(0.0), vsby.unit);
                let el = body.child("prevailingVisibility");
                el.set("uom", "m");
                el.set_text(metres.min(10000).to_string());
                if metres >= 10000 {
                    body.child("prevailingVisibilityOperator").set_text("ABOVE");
                }
            }
        }
        self.wind(body, period);
        if !period.cavok {
            for tagged in [&period.pcp, &period.vcnty, &period.obv].into_iter().flatten() {
                self.weather(body, &tagged.text);
            }
            if period.nsw.is_some() {
                body.child("weather")
                    .set("nilReason", config::NIL_NOOPRSIG_URL);
            }
            if let Some(sky) = &period.sky {
                self.sky(body, &sky.text);
            }
            if let Some(llws) = &period.llws {
                self.llws(body, llws);
            }
        }
        self.temperature(body, period);
    }

    fn wind(&mut self, body: &mut XmlElement, period: &TafPeriod) {
        let Some(w) = &period.wind else {
            return;
        };
        let el = body.child("surfaceWind");
        let fc = el.child("AerodromeSurfaceWindForecast");
        if w.dd == "VRB" {
            fc.set("variableWindDirection", "true");
        } else {
            fc.set("variableWindDirection", "false");
            if w.dd.parse::<i64>().is_ok() {
                let dir = fc.child("meanWindDirection");
                dir.set_text(&w.dd);
                dir.set("uom", "deg");
            }
        }
        if w.ff.parse::<i64>().is_ok() {
            let speed = fc.child("meanWindSpeed");
            speed.set_text(&w.ff);
            speed.set("uom", w.unit.ucum());
        }
        if w.ff_plus {
            fc.child("meanWindSpeedOperator").set_text("ABOVE");
        }
        if let Some(gg) = &w.gg {
            let gust = fc.child("windGustSpeed");
            gust.set_text(gg);
            gust.set("uom", w.unit.ucum());
            if w.gg_plus {
                fc.child("windGustSpeedOperator").set_text("ABOVE");
            }
        }
    }

    fn weather(&mut self, body: &mut XmlElement, phrase: &str) {
        for ww in phrase.split_whitespace() {
            match self.enc.codes.lookup(config::WEATHER_CONTAINER_ID, ww) {
                Some(entry) => {
                    let el = body.child("weather");
                    el.set("xlink:href", &entry.uri);
                    if self.enc.config.wants_title(config::titles::WEATHER) {
                        el.set("xlink:title", &entry.title);
                    }
                }
                None => self.split_phenomenon(body, ww),
            }
        }
    }

    /// An unmatched phenomenon may be two registry entries run together;
    /// peel trailing two-character codes until both halves resolve.
    fn split_phenomenon(&mut self, body: &mut XmlElement, ww: &str) {
        let mut pos = ww.len().saturating_sub(2);
        while pos > 1 {
            let (head, tail) = ww.split_at(pos);
            let head_entry = self.enc.codes.lookup(config::WEATHER_CONTAINER_ID, head);
            let tail_entry = self.enc.codes.lookup(config::WEATHER_CONTAINER_ID, tail);
            if let (Some(head_entry), Some(tail_entry)) = (head_entry, tail_entry) {
                for entry in [head_entry, tail_entry] {
                    let el = body.child("weather");
                    el.set("xlink:href", &entry.uri);
                    if self.enc.config.wants_title(config::titles::WEATHER) {
                        el.set("xlink:title", &entry.title);
                    }
                }
                return;
            }
            pos = pos.saturating_sub(2);
        }
    }

    fn sky(&mut self, body: &mut XmlElement, phrase: &str) {
        let cloud = body.child("cloud");
        let mut forecast_started = false;
        for layer in phrase.split_whitespace() {
            if layer == "NSC" {
                cloud.set("nilReason", config::NIL_NOOPRSIG_URL);
                continue;
            }
            if let Some(height) = layer.strip_prefix("VV") {
                if let Ok(h) = height.parse::<i64>() {
                    let fc = cloud.child("AerodromeCloudForecast");
                    fc.set("gml:id", gml_id());
                    let vv = fc.child("verticalVisibility");
                    vv.set_text((h * 100).to_string());
                    vv.set("uom", "[ft_i]");
                    forecast_started = true;
                }
                continue;
            }
            if !forecast_started {
                let fc = cloud.child("AerodromeCloudForecast");
                fc.set("gml:id", gml_id());
                forecast_started = true;
            }
            if let Some(fc) = cloud.last_child_mut() {
                cloud_layer(fc, layer, &self.enc.config);
            }
        }
    }

    fn llws(&mut self, body: &mut XmlElement, llws: &tac_parser::taf::Llws) {
        let ext = body
            .child("extension")
            .child("iwxxm-us:NonConvectiveLowLevelWindShear");
        let dir = ext.child("iwxxm-us:windDirection");
        dir.set("uom", "deg");
        dir.set_text(llws.dd.to_string());
        let speed = ext.child("iwxxm-us:windSpeed");
        speed.set("uom", "[kn_i]");
        speed.set_text(llws.ff.to_string());
        let layer = ext.child("iwxxm-us:layerAboveAerodrome");
        let lower = layer.child("iwxxm-us:lowerLimit");
        lower.set("uom", "[ft_i]");
        lower.set_text("0");
        let upper = layer.child("iwxxm-us:upperLimit");
        upper.set("uom", "[ft_i]");
        upper.set_text((llws.height * 100).to_string());
    }

    fn temperature(&mut self, body: &mut XmlElement, period: &TafPeriod) {
        let Some(temps) = &period.temp else {
            return;
        };
        let fc = body
            .child("temperature")
            .child("AerodromeAirTemperatureForecast");
        if let Some(max) = &temps.max {
            let el = fc.child("maximumAirTemperature");
            el.set_text(&max.value);
            el.set("uom", "Cel");
            if let Some(at) = max.at {
                let instant = fc
                    .child("maximumAirTemperatureTime")
                    .child("gml:TimeInstant");
                instant.set("gml:id", gml_id());
                instant.child("gml:timePosition").set_text(iso_format(at));
            }
        }
        if let Some(min) = &temps.min {
            let el = fc.child("minimumAirTemperature");
            el.set_text(&min.value);
            el.set("uom", "Cel");
            if let Some(at) = min.at {
                let instant = fc
                    .child("minimumAirTemperatureTime")
                    .child("gml:TimeInstant");
                instant.set("gml:id", gml_id());
                instant.child("gml:timePosition").set_text(iso_format(at));
            }
        }
    }

    /// The AMD clause is a constrained natural-language phrase; recover
    /// the limited parameters and the optional limitation window.
    fn amendment_limits(&self, extension: &mut XmlElement, clause: &str) {
        let limits = extension.child("iwxxm-us:TAFAmendmentLimitations");

        if clause.starts_with("AMD NOT SKED") {
            limits
                .child("iwxxm-us:amendableTAFParameter")
                .set("xlink:href", format!("{}/NONE", config::OFCM_CODE_REGISTRY_URL));
        } else {
            for (tag, name) in [
                ("CLD", "CEILING"),
                ("VIS", "VISIBILITY"),
                ("WIND", "WIND"),
                ("WX", "WEATHER"),
            ] {
                if clause
                    .split_whitespace()
                    .any(|word| word == tag)
                {
                    limits.child("iwxxm-us:amendableTAFParameter").set(
                        "xlink:href",
                        format!("{}/{}", config::OFCM_CODE_REGISTRY_URL, name),
                    );
                }
            }
        }

        let (from, to) = self.limitation_window(clause);
        let period = limits.child("iwxxm-us:periodOfLimitation");
        period.set("gml:id", gml_id());
        let begin = period.child("gml:beginPosition");
        match from {
            Some(t) => begin.set_text(iso_format(t)),
            None => begin.set("indeterminatePosition", "unknown"),
        }
        let end = period.child("gml:endPosition");
        match to {
            Some(t) => end.set_text(iso_format(t)),
            None => end.set("indeterminatePosition", "unknown"),
        }
    }

    fn limitation_window(
        &self,
        clause: &str,
    ) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        let valid_from = self.taf.valid.as_ref().and_then(|v| v.from);
        let valid_to = self.taf.valid.as_ref().and_then(|v| v.to);
        let issued = self.taf.issue_time;

        if let Some(caps) = aft_til_re().captures(clause) {
            let word = &caps[1];
            let digits = &caps[2];
            let day: u32 = digits[..2].parse().unwrap_or(0);
            let hour: u32 = digits[2..4].parse().unwrap_or(0);
            let at = valid_from.and_then(|base| on_or_after(base, day, hour));
            return if word == "TIL" {
                (issued, at)
            } else {
                (at, valid_to)
            };
        }
        if let Some(caps) = window_re().captures(clause) {
            let parse = |digits: &str| {
                let day: u32 = digits[..2].parse().unwrap_or(0);
                let hour: u32 = digits[2..4].parse().unwrap_or(0);
                valid_from.and_then(|base| on_or_after(base, day, hour))
            };
            return (parse(&caps[1]), parse(&caps[2]));
        }
        // No explicit window: the limitation spans the whole forecast.
        (issued.or(valid_from), valid_to)
    }
}

fn change_indicator(period: &TafPeriod) -> &'static str {
    match period.kind {
        ChangeKind::Fm => "FROM",
        ChangeKind::Becmg => "BECOMING",
        ChangeKind::Tempo => "TEMPORARY_FLUCTUATIONS",
        ChangeKind::Prob => {
            let text = period
                .time
                .as_ref()
                .map(|t| t.text.as_str())
                .unwrap_or_default();
            let tempo = text.contains("TEMPO");
            if text.starts_with("PROB40") {
                if tempo {
                    "PROBABILITY_40_TEMPORARY_FLUCTUATIONS"
                } else {
                    "PROBABILITY_40"
                }
            } else if tempo {
                "PROBABILITY_30_TEMPORARY_FLUCTUATIONS"
            } else {
                "PROBABILITY_30"
            }
        }
    }
}

fn cloud_layer(parent: &mut XmlElement, layer: &str, cfg: &TranslationConfig) {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^(?P<amt>VV|SKC|CLR|FEW|SCT|BKN|[0O]VC)(?P<hgt>\d{3})?").expect("layer")
    });
    let Some(caps) = re.captures(layer) else {
        return;
    };
    let amount = caps.name("amt").map(|m| m.as_str()).unwrap_or("");
    let amount = if amount == "0VC" { "OVC" } else { amount };

    let body = parent.child("layer").child("CloudLayer");
    let amount_el = body.child("amount");
    amount_el.set("xlink:href", format!("{}{}", config::CLDCVR_URL, amount));
    if cfg.wants_title(config::titles::CLOUD_AMOUNT) {
        amount_el.set("xlink:title", amount);
    }

    let base = body.child("base");
    base.set("uom", "[ft_i]");
    match caps.name("hgt").map(|m| m.as_str().parse::<i64>()) {
        Some(Ok(h)) => base.set_text((h * 100).to_string()),
        _ => {
            if amount == "SKC" || amount == "CLR" {
                nil_uom(base, config::NIL_NA_URL);
            }
        }
    }

    if layer.ends_with("CB") {
        body.child("cloudType")
            .set("xlink:href", config::CUMULONIMBUS);
    } else if layer.ends_with("TCU") {
        let el = body.child("cloudType");
        el.set("xlink:href", config::TWRNGCUMULUS);
        if cfg.wants_title(config::titles::CLOUD_TYPE) {
            el.set("xlink:title", "Towering cumulus");
        }
    }
}

fn aft_til_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(AFT|TIL)\s+(\d{6})").expect("aft/til"))
}

fn window_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{4})/(\d{4})").expect("window"))
}
