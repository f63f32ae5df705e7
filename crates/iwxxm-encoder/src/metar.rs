//! METAR/SPECI → IWXXM 3.0 encoder (ICAO Annex 3 body).
//!
//! The builder walks a decoded report into the document in schema order.
//! Mandatory elements are always present: a missing or unobservable
//! source datum becomes a nil-reason attribute. The FMH-1 encoder layers
//! its US extension blocks on top of this body (see `fmh1`).

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use iwxxm_common::time::iso_format;
use iwxxm_common::units::{rvr_in_metres, visibility_in_metres};
use iwxxm_common::{gml_id, LengthUnit, XmlElement};
use tac_parser::report::{
    Operator, PressureUnit, Report, Trend, TrendKind, Visibility, WeatherGroup, Wind,
};

use crate::codes::CodeRegistry;
use crate::config::{self, TranslationConfig};

/// Encodes METAR/SPECI records. Construction loads nothing; the code
/// registry passed in is shared and read-only, so one encoder may serve
/// concurrent callers.
pub struct MetarEncoder {
    pub(crate) codes: CodeRegistry,
    pub(crate) config: TranslationConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EncoderDialect {
    Annex3,
    Fmh1,
}

impl MetarEncoder {
    pub fn new(codes: CodeRegistry, config: TranslationConfig) -> Self {
        MetarEncoder { codes, config }
    }

    pub fn codes(&self) -> &CodeRegistry {
        &self.codes
    }

    pub fn config(&self) -> &TranslationConfig {
        &self.config
    }

    /// Encode one Annex 3 report. `raw_tac` is carried into the
    /// translationFailedTAC attribute when the decode was partial;
    /// `now` is unused here but kept symmetric with the decode side.
    pub fn encode_annex3(&self, report: &Report, raw_tac: &str) -> XmlElement {
        Builder::new(self, report, raw_tac, EncoderDialect::Annex3).build()
    }

    pub(crate) fn builder<'a>(
        &'a self,
        report: &'a Report,
        raw_tac: &'a str,
        dialect: EncoderDialect,
    ) -> Builder<'a> {
        Builder::new(self, report, raw_tac, dialect)
    }
}

pub(crate) struct Builder<'a> {
    pub(crate) enc: &'a MetarEncoder,
    pub(crate) report: &'a Report,
    raw: &'a str,
    dialect: EncoderDialect,
    pub(crate) nil_present: bool,
    automated: bool,
    issue_time_id: Option<String>,
    runway_cache: HashMap<String, String>,
}

pub(crate) fn nil(el: &mut XmlElement, reason: &str) {
    el.set("nilReason", reason);
    el.set("xsi:nil", "true");
}

pub(crate) fn nil_uom(el: &mut XmlElement, reason: &str) {
    el.set("uom", "N/A");
    nil(el, reason);
}

impl<'a> Builder<'a> {
    fn new(
        enc: &'a MetarEncoder,
        report: &'a Report,
        raw: &'a str,
        dialect: EncoderDialect,
    ) -> Self {
        Builder {
            enc,
            report,
            raw,
            dialect,
            nil_present: report.is_nil(),
            automated: report.is_automated(),
            issue_time_id: None,
            runway_cache: HashMap::new(),
        }
    }

    pub(crate) fn build(self) -> XmlElement {
        self.build_parts().0
    }

    /// Build the document and report whether the body is nil (NIL report
    /// or translation failure); the FMH-1 wrapper skips its extension
    /// work in that case.
    pub(crate) fn build_parts(mut self) -> (XmlElement, bool) {
        let mut root = self.preamble();
        self.issue_time(&mut root);
        self.aerodrome(&mut root);
        self.observation_time(&mut root);
        self.observation(&mut root);
        if !self.nil_present {
            self.forecasts(&mut root);
        }
        // NCD turns the report automated mid-encode.
        root.set("automatedStation", bool_str(self.automated));
        (root, self.nil_present)
    }

    fn preamble(&mut self) -> XmlElement {
        let kind = self
            .report
            .kind
            .as_ref()
            .map(|k| k.text.as_str())
            .unwrap_or("METAR");
        let mut root = XmlElement::new(format!("iwxxm:{kind}"));
        root.set("xmlns:iwxxm", config::IWXXM_URI);
        root.set("xmlns:aixm", config::AIXM_URI);
        root.set("xmlns:gml", config::GML_URI);
        root.set("xmlns:xlink", config::XLINK_URI);
        root.set("xmlns:xsi", config::XSI_URI);
        match self.dialect {
            EncoderDialect::Annex3 => {
                root.set(
                    "xsi:schemaLocation",
                    format!("{} {}", config::IWXXM_URI, config::IWXXM_URL),
                );
            }
            EncoderDialect::Fmh1 => {
                root.set("xmlns:iwxxm-us", config::IWXXM_US_URI);
                root.set(
                    "xsi:schemaLocation",
                    format!(
                        "{} {} {} {}",
                        config::IWXXM_URI,
                        config::IWXXM_URL,
                        config::IWXXM_US_URI,
                        config::IWXXM_US_METAR_URL
                    ),
                );
            }
        }

        root.set(
            "reportStatus",
            if self.report.correction.is_some() {
                "CORRECTION"
            } else {
                "NORMAL"
            },
        );
        root.set("automatedStation", bool_str(self.automated));
        root.set("permissibleUsage", "OPERATIONAL");
        root.set("translatedBulletinID", "TTAAiiCCCCYYGGgg");
        root.set(
            "translationCentreDesignator",
            &self.enc.config.centre_designator,
        );
        root.set("translationCentreName", &self.enc.config.centre_name);
        root.set(
            "translationTime",
            iso_format(self.report.translation_time),
        );

        if let Some(err) = &self.report.err_msg {
            let collapsed = self.raw.split_whitespace().collect::<Vec<_>>().join(" ");
            root.set("translationFailedTAC", collapsed);
            root.set("permissibleUsageSupplementary", err);
            self.nil_present = true;
        }
        root.set("gml:id", gml_id());
        root
    }

    fn issue_time(&mut self, root: &mut XmlElement) {
        let el = root.child("iwxxm:issueTime");
        match self.report.issue_time.as_ref().and_then(|t| t.time) {
            Some(time) => {
                let instant = el.child("gml:TimeInstant");
                let id = gml_id();
                instant.set("gml:id", &id);
                instant.child("gml:timePosition").set_text(iso_format(time));
                self.issue_time_id = Some(format!("#{id}"));
            }
            None => el.set("nilReason", config::NIL_MSSG_URL),
        }
    }

    fn aerodrome(&mut self, root: &mut XmlElement) {
        let el = root.child("iwxxm:aerodrome");
        let heliport = el.child("aixm:AirportHeliport");
        heliport.set("gml:id", gml_id());
        let slice = heliport
            .child("aixm:timeSlice")
            .child("aixm:AirportHeliportTimeSlice");
        slice.set("gml:id", gml_id());
        slice.child("gml:validTime");
        slice.child("aixm:interpretation").set_text("SNAPSHOT");

        let reported = self
            .report
            .ident
            .as_ref()
            .map(|t| t.text.trim().to_uppercase())
            .unwrap_or_default();
        let designator = self
            .report
            .station
            .as_ref()
            .and_then(|s| s.alternate.as_deref())
            .map(|s| s.trim().to_uppercase())
            .unwrap_or_else(|| reported.clone());
        if is_alternate_designator(&designator) {
            slice.child("aixm:designator").set_text(&designator);
        }
        if let Some(name) = self
            .report
            .station
            .as_ref()
            .and_then(|s| s.name.as_deref())
        {
            let name = name.trim().to_uppercase();
            if !name.is_empty() {
                slice.child("aixm:name").set_text(name);
            }
        }
        // The ICAO location indicator is strictly four letters.
        if is_icao_id(&reported) {
            slice
                .child("aixm:locationIndicatorICAO")
                .set_text(&reported);
        }

        if let Some(station) = &self.report.station {
            let point = el
                .find_mut("aixm:AirportHeliport/aixm:timeSlice/aixm:AirportHeliportTimeSlice")
                .expect("slice just built")
                .child("aixm:ARP")
                .child("aixm:ElevatedPoint");
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

    fn observation_time(&mut self, root: &mut XmlElement) {
        let el = root.child("iwxxm:observationTime");
        match &self.issue_time_id {
            Some(id) => el.set("xlink:href", id),
            None => el.set("nilReason", config::NIL_MSSG_URL),
        }
    }

    fn observation(&mut self, root: &mut XmlElement) {
        if self.nil_present {
            root.child("iwxxm:observation")
                .set("nilReason", config::NIL_MSSG_URL);
            return;
        }
        let body = self.result();
        root.child("iwxxm:observation").push(body);
    }

    /// The observation body, in schema order. Mandatory elements are
    /// nil-filled; visibility and RVR are conditionally mandatory.
    fn result(&mut self) -> XmlElement {
        let report = self.report;
        let mut obs = XmlElement::new("iwxxm:MeteorologicalAerodromeObservation");
        obs.set("gml:id", gml_id());
        let cavok = report.wx.cavok.is_some();
        obs.set("cloudAndVisibilityOK", bool_str(cavok));

        self.temps(&mut obs);
        self.altimeter(&mut obs);
        self.wind(&mut obs, report.wx.wind.as_ref(), false);

        match &report.wx.vsby {
            Some(vsby) => self.vsby(&mut obs, Some(vsby)),
            None if !cavok => self.vsby(&mut obs, None),
            None => {}
        }

        match &report.rvr {
            Some(rvr) => self.rvr(&mut obs, rvr),
            None if !cavok && self.rvr_expected() => {
                let el = obs.child("iwxxm:rvr");
                nil(el, config::NIL_MSSG_URL);
            }
            None => {}
        }
        if self.dialect == EncoderDialect::Fmh1 {
            if let Some(vrbrvr) = &report.variable_rvr {
                self.vrbrvr(&mut obs, vrbrvr);
            }
        }

        self.weather_list(&mut obs, &report.wx.pcp, "iwxxm:presentWeather");
        self.weather_list(&mut obs, &report.wx.obv, "iwxxm:presentWeather");
        self.weather_list(&mut obs, &report.vcnty, "iwxxm:presentWeather");
        if !report.wx.sky.is_empty() {
            self.sky(&mut obs, &report.wx.sky, false);
        }

        if self.dialect == EncoderDialect::Annex3 {
            if !report.recent_weather.is_empty() {
                self.recent_weather(&mut obs);
            }
            if report.wind_shear.is_some() {
                self.wind_shear(&mut obs);
            }
            if report.sea_state.is_some() {
                self.sea_state(&mut obs);
            }
            if !report.runway_state.is_empty() {
                self.runway_state(&mut obs);
            }
        }
        obs
    }

    /// RVR must be supplied once prevailing visibility drops below the
    /// configured threshold.
    fn rvr_expected(&self) -> bool {
        let Some(vsby) = &self.report.wx.vsby else {
            return false;
        };
        let Ok(value) = vsby.value.parse::<f64>() else {
            return false;
        };
        visibility_in_metres(value, vsby.unit) < self.enc.config.rvr_maximum_distance
    }

    fn temps(&mut self, obs: &mut XmlElement) {
        for (name, value) in [
            (
                "iwxxm:airTemperature",
                self.report.temps.as_ref().and_then(|t| t.air.as_deref()),
            ),
            (
                "iwxxm:dewpointTemperature",
                self.report
                    .temps
                    .as_ref()
                    .and_then(|t| t.dewpoint.as_deref()),
            ),
        ] {
            let el = obs.child(name);
            match value {
                Some(v) if v.parse::<f64>().is_ok() => {
                    el.set_text(v);
                    el.set("uom", "Cel");
                }
                _ => nil_uom(el, config::NIL_NOOBSV_URL),
            }
        }
    }

    fn altimeter(&mut self, obs: &mut XmlElement) {
        let el = obs.child("iwxxm:qnh");
        let value = self.report.altimeter.as_ref().and_then(|alt| {
            // Pressure is always reported in hPa.
            match alt.unit {
                PressureUnit::HectoPascals => {
                    alt.value.parse::<i64>().ok().map(|v| v.to_string())
                }
                PressureUnit::InchesOfMercury => alt
                    .value
                    .parse::<f64>()
                    .ok()
                    .map(|v| format!("{:.1}", v * 33.8639)),
            }
        });
        match value {
            Some(v) => {
                el.set_text(v);
                el.set("uom", "hPa");
            }
            None => nil_uom(el, config::NIL_NOOBSV_URL),
        }
    }

    pub(crate) fn wind(&mut self, parent: &mut XmlElement, wind: Option<&Wind>, trend: bool) {
        let el = parent.child("iwxxm:surfaceWind");
        let Some(w) = wind else {
            nil(el, config::NIL_NOOBSV_URL);
            return;
        };
        if w.text.starts_with("/////") {
            nil(el, config::NIL_NOOBSV_URL);
            return;
        }

        let body = if trend {
            el.child("iwxxm:AerodromeSurfaceWindTrendForecast")
        } else {
            let body = el.child("iwxxm:AerodromeSurfaceWind");
            body.set(
                "variableWindDirection",
                bool_str(w.dd == "VRB" || w.ccw.is_some()),
            );
            body
        };

        match w.dd.parse::<i64>() {
            Ok(dd) => {
                let dir = body.child("iwxxm:meanWindDirection");
                dir.set_text(dd.to_string());
                dir.set("uom", "deg");
            }
            Err(_) if w.dd != "VRB" => {
                let dir = body.child("iwxxm:meanWindDirection");
                nil_uom(dir, config::NIL_NOOBSV_URL);
            }
            Err(_) => {}
        }

        let speed = body.child("iwxxm:meanWindSpeed");
        match w.ff.parse::<i64>() {
            Ok(ff) => {
                speed.set_text(ff.to_string());
                speed.set("uom", w.unit.ucum());
            }
            Err(_) => nil_uom(speed, config::NIL_NOOBSV_URL),
        }
        if w.ff_plus {
            body.child("iwxxm:meanWindSpeedOperator").set_text("ABOVE");
        }

        if let Some(gg) = &w.gg {
            let gust = body.child("iwxxm:windGustSpeed");
            gust.set_text(gg);
            gust.set("uom", w.unit.ucum());
            if w.gg_plus {
                body.child("iwxxm:windGustSpeedOperator").set_text("ABOVE");
            }
        }

        if let (Some(cw), Some(ccw)) = (&w.cw, &w.ccw) {
            if let (Ok(cw), Ok(ccw)) = (cw.parse::<i64>(), ccw.parse::<i64>()) {
                let el = body.child("iwxxm:extremeClockwiseWindDirection");
                el.set_text(cw.to_string());
                el.set("uom", "deg");
                let el = body.child("iwxxm:extremeCounterClockwiseWindDirection");
                el.set_text(ccw.to_string());
                el.set("uom", "deg");
            }
        }
    }

    fn vsby(&mut self, obs: &mut XmlElement, vsby: Option<&Visibility>) {
        let el = obs.child("iwxxm:visibility");
        let Some(v) = vsby else {
            nil(el, config::NIL_NOOBSV_URL);
            return;
        };
        if v.text.contains("//") {
            nil(el, config::NIL_NOOBSV_URL);
            return;
        }

        let body = el.child("iwxxm:AerodromeHorizontalVisibility");
        let prevailing = body.child("iwxxm:prevailingVisibility");
        prevailing.set("uom", "m");
        // Always re-expressed in metres, per Annex 3 Table A3-5; 10 km
        // or more collapses to the capped sentinel with operator ABOVE.
        let metres = visibility_in_metres(v.value.parse::<f64>().unwrap_or(0.0), v.unit);
        let mut oper = v.oper;
        if metres >= 10000 {
            prevailing.set_text("10000");
            oper = Some(Operator::Above);
        } else {
            prevailing.set_text(metres.to_string());
        }
        if let Some(oper) = oper {
            body.child("iwxxm:prevailingVisibilityOperator")
                .set_text(oper.as_str());
        }

        if let (Some(min), Some(bearing)) = (&v.min, &v.min_bearing) {
            if let Ok(min) = min.parse::<f64>() {
                let el = body.child("iwxxm:minimumVisibility");
                el.set_text(visibility_in_metres(min, LengthUnit::Metres).to_string());
                el.set("uom", "m");
                let el = body.child("iwxxm:minimumVisibilityDirection");
                el.set_text(bearing);
                el.set("uom", "deg");
            }
        }
    }

    fn rvr(&mut self, obs: &mut XmlElement, rvr: &tac_parser::report::RvrGroup) {
        for i in 0..rvr.len() {
            let body = obs
                .child("iwxxm:rvr")
                .child("iwxxm:AerodromeRunwayVisualRange");
            body.set("pastTendency", rvr.tendency[i].as_str());
            let runway = body.child("iwxxm:runway");
            let cache_hit = self.runway_ref(&rvr.runway[i]);
            apply_runway(runway, cache_hit);

            let mean = body.child("iwxxm:meanRVR");
            match rvr.mean[i].parse::<f64>() {
                Ok(value) => {
                    mean.set_text(rvr_in_metres(value, rvr.unit[i]).to_string());
                    mean.set("uom", "m");
                    if let Some(oper) = rvr.oper[i] {
                        body.child("iwxxm:meanRVROperator").set_text(oper.as_str());
                    }
                }
                Err(_) => nil_uom(mean, config::NIL_NOOBSV_URL),
            }
        }
    }

    /// Variable RVR (FMH-1): the mean is withheld, the bounds ride in a
    /// US extension.
    fn vrbrvr(&mut self, obs: &mut XmlElement, group: &tac_parser::report::VariableRvrGroup) {
        for i in 0..group.runway.len() {
            let body = obs
                .child("iwxxm:rvr")
                .child("iwxxm:AerodromeRunwayVisualRange");
            let runway = body.child("iwxxm:runway");
            let cache_hit = self.runway_ref(&group.runway[i]);
            apply_runway(runway, cache_hit);

            let mean = body.child("iwxxm:meanRVR");
            nil_uom(mean, config::NIL_WTHLD_URL);

            let ext = body
                .child("iwxxm:extension")
                .child("iwxxm-us:AerodromeVariableRVR");
            for (name, value) in [
                ("iwxxm-us:minimumRVR", &group.lo[i]),
                ("iwxxm-us:maximumRVR", &group.hi[i]),
            ] {
                let el = ext.child(name);
                el.set("uom", "m");
                if let Ok(v) = value.parse::<f64>() {
                    el.set_text(rvr_in_metres(v, group.unit[i]).to_string());
                }
            }
            if let Some(oper) = group.oper[i] {
                ext.child("iwxxm-us:variableRVROperator")
                    .set_text(oper.as_str());
            }
        }
    }

    /// Present weather, recent weather and trend weather all resolve
    /// through the same registry container with the same fallback.
    pub(crate) fn weather_list(
        &mut self,
        parent: &mut XmlElement,
        list: &tac_parser::report::TokenList,
        element: &str,
    ) {
        for entry in &list.entries {
            let ww = entry.text.as_str();
            let el = parent.child(element);
            if ww == "//" {
                nil(el, config::NIL_NOOBSV_URL);
                continue;
            }
            if ww == "NSW" {
                nil(el, config::NIL_NOOPRSIG_URL);
                continue;
            }
            match self.enc.codes.lookup(config::WEATHER_CONTAINER_ID, ww) {
                Some(entry) => {
                    el.set("xlink:href", &entry.uri);
                    if self.enc.config.wants_title(config::titles::WEATHER) {
                        el.set("xlink:title", &entry.title);
                    }
                }
                None => {
                    // Unmatched phenomenon: fall back to the unknown
                    // precipitation family, keeping the original text.
                    let up = unknown_precip_token(ww);
                    if let Some(entry) = self
                        .enc
                        .codes
                        .lookup(config::WEATHER_CONTAINER_ID, &up)
                        .or_else(|| self.enc.codes.lookup(config::WEATHER_CONTAINER_ID, "UP"))
                    {
                        el.set("xlink:href", &entry.uri);
                        el.set("xlink:title", format!("{}: {}", entry.title, ww));
                    } else {
                        nil(el, config::NIL_UNKNWN_URL);
                    }
                }
            }
        }
    }

    pub(crate) fn sky(
        &mut self,
        parent: &mut XmlElement,
        sky: &tac_parser::report::TokenList,
        trend: bool,
    ) {
        let cloud = parent.child("iwxxm:cloud");
        let first = sky.entries[0].text.as_str();
        if first == "NSC" {
            nil(cloud, config::NIL_NOOPRSIG_URL);
            return;
        }
        if first == "NCD" {
            nil(cloud, config::NIL_NOAUTODEC_URL);
            self.automated = true;
            return;
        }

        let body_name = if trend {
            "iwxxm:AerodromeCloudForecast"
        } else {
            "iwxxm:AerodromeCloud"
        };
        let body = cloud.child(body_name);
        if trend {
            body.set("gml:id", gml_id());
        }
        let automated = self.automated;
        for layer in sky.entries.iter().take(4) {
            let text = layer.text.as_str();
            if let Some(kind) = text.strip_prefix("///") {
                if kind == "CB" || kind == "TCU" {
                    cloud_layer(body, "/", "/", kind, automated, self.enc);
                    continue;
                }
            }
            let caps = cloud_layer_re().captures(text);
            if let Some(caps) = caps {
                let amount = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                let height = caps.get(3).map(|m| m.as_str()).unwrap_or("");
                let kind = caps.get(4).map(|m| m.as_str()).unwrap_or("");
                cloud_layer(body, amount, height, kind, automated, self.enc);
            }
        }
    }

    fn recent_weather(&mut self, obs: &mut XmlElement) {
        for entry in &self.report.recent_weather.entries {
            let ww = entry.text.as_str();
            let el = obs.child("iwxxm:recentWeather");
            if ww == "//" {
                nil(el, config::NIL_NOOBSV_URL);
                break;
            }
            match self.enc.codes.lookup(config::WEATHER_CONTAINER_ID, ww) {
                Some(code) => {
                    el.set("xlink:href", &code.uri);
                    if self.enc.config.wants_title(config::titles::WEATHER) {
                        el.set("xlink:title", &code.title);
                    }
                }
                None => {
                    let up = unknown_precip_token(ww);
                    if let Some(code) = self
                        .enc
                        .codes
                        .lookup(config::WEATHER_CONTAINER_ID, &up)
                        .or_else(|| self.enc.codes.lookup(config::WEATHER_CONTAINER_ID, "UP"))
                    {
                        el.set("xlink:href", &code.uri);
                        el.set("xlink:title", format!("{}: {}", code.title, ww));
                    } else {
                        nil(el, config::NIL_UNKNWN_URL);
                    }
                }
            }
        }
    }

    fn wind_shear(&mut self, obs: &mut XmlElement) {
        let report = self.report;
        let Some(ws) = &report.wind_shear else {
            return;
        };
        let body = obs.child("iwxxm:windShear").child("iwxxm:AerodromeWindShear");
        match &ws.runway {
            None => body.set("allRunways", "true"),
            Some(rwy) => {
                let runway = body.child("iwxxm:runway");
                let cache_hit = self.runway_ref(rwy);
                apply_runway(runway, cache_hit);
            }
        }
    }

    fn sea_state(&mut self, obs: &mut XmlElement) {
        let Some(sea) = &self.report.sea_state else {
            return;
        };
        let body = obs
            .child("iwxxm:seaCondition")
            .child("iwxxm:AerodromeSeaCondition");

        let temp = body.child("iwxxm:seaSurfaceTemperature");
        match sea.temperature.parse::<i64>() {
            Ok(t) => {
                temp.set_text(t.to_string());
                temp.set("uom", "Cel");
            }
            Err(_) => nil_uom(temp, config::NIL_NOOBSV_URL),
        }

        if let Some(height) = &sea.wave_height {
            let el = body.child("iwxxm:significantWaveHeight");
            match height.parse::<i64>() {
                Ok(dm) => {
                    el.set_text(format!("{:.1}", dm as f64 * 0.1));
                    el.set("uom", "m");
                }
                Err(_) => nil_uom(el, config::NIL_NOOBSV_URL),
            }
        }

        if let Some(state) = &sea.state {
            let el = body.child("iwxxm:seaState");
            match self.enc.codes.lookup(config::SEACND_CONTAINER_ID, state) {
                Some(code) => {
                    el.set("xlink:href", &code.uri);
                    if self.enc.config.wants_title(config::titles::SEA_CONDITION) {
                        el.set("xlink:title", &code.title);
                    }
                }
                None => nil(el, config::NIL_NOOBSV_URL),
            }
        }
    }

    fn runway_state(&mut self, obs: &mut XmlElement) {
        let report = self.report;
        for state in &report.runway_state {
            let el = obs.child("iwxxm:runwayState");
            if state.state == "SNOCLO" {
                nil(el, config::NIL_SNOCLO_URL);
                continue;
            }
            let body = el.child("iwxxm:AerodromeRunwayState");
            let all_runways = state.runway.is_empty() || state.runway == "88";
            body.set("allRunways", bool_str(all_runways));
            if state.runway == "99" {
                body.set("fromPreviousReport", "true");
            }
            if state.state.starts_with("CLRD") {
                body.set("cleared", "true");
            }

            if !all_runways {
                let runway = body.child("iwxxm:runway");
                if state.runway == "99" {
                    runway.set("nilReason", config::NIL_NA_URL);
                } else {
                    let cache_hit = self.runway_ref(&state.runway);
                    apply_runway(runway, cache_hit);
                }
            }

            let digits: Vec<char> = state.state.chars().collect();
            if digits.first().is_some_and(|c| c.is_ascii_digit()) {
                let deposit = body.child("iwxxm:depositType");
                let token = digits[0].to_string();
                match self.enc.codes.lookup(config::RWYDEPST_CONTAINER_ID, &token) {
                    Some(code) => {
                        deposit.set("xlink:href", &code.uri);
                        if self.enc.config.wants_title(config::titles::RUNWAY_DEPOSIT) {
                            deposit.set("xlink:title", &code.title);
                        }
                    }
                    None => nil(deposit, config::NIL_UNKNWN_URL),
                }
            }
            if digits.get(1).is_some_and(|c| c.is_ascii_digit()) {
                let contamination = body.child("iwxxm:contamination");
                let token = digits[1].to_string();
                let code = self
                    .enc
                    .codes
                    .lookup(config::RWYCNTMS_CONTAINER_ID, &token)
                    .or_else(|| self.enc.codes.lookup(config::RWYCNTMS_CONTAINER_ID, "15"));
                match code {
                    Some(code) => {
                        contamination.set("xlink:href", &code.uri);
                        if self
                            .enc
                            .config
                            .wants_title(config::titles::RUNWAY_COVERAGE)
                        {
                            contamination.set("xlink:title", &code.title);
                        }
                    }
                    None => nil(contamination, config::NIL_UNKNWN_URL),
                }
            }

            let depth: String = state.state.chars().skip(2).take(2).collect();
            if depth.chars().all(|c| c.is_ascii_digit()) && depth.len() == 2 {
                let el = body.child("iwxxm:depthOfDeposit");
                if depth == "99" {
                    nil_uom(el, config::NIL_UNKNWN_URL);
                } else {
                    el.set("uom", "mm");
                    el.set_text(deposit_depth_mm(&depth));
                }
            } else if depth == "//" {
                let el = body.child("iwxxm:depthOfDeposit");
                nil_uom(el, config::NIL_NOOBSV_URL);
            }

            let friction: String = state.state.chars().skip(4).take(2).collect();
            if friction.chars().all(|c| c.is_ascii_digit()) && friction.len() == 2 {
                let el = body.child("iwxxm:estimatedSurfaceFrictionOrBrakingAction");
                el.set("xlink:href", format!("{}{}", config::RWYFRCTN_URL, friction));
                if self
                    .enc
                    .config
                    .wants_title(config::titles::RUNWAY_FRICTION)
                {
                    el.set("xlink:title", friction_title(&friction));
                }
            } else if friction == "//" {
                let el = body.child("iwxxm:estimatedSurfaceFrictionOrBrakingAction");
                el.set("nilReason", config::NIL_MSSG_URL);
            }
        }
    }

    fn forecasts(&mut self, root: &mut XmlElement) {
        if self.report.nosig.is_some() {
            let el = root.child("iwxxm:trendForecast");
            el.set("xsi:nil", "true");
            el.set("nilReason", config::NIL_NOSIGC_URL);
            return;
        }
        let trends: Vec<Trend> = self.report.trends.clone();
        for trend in &trends {
            self.trend_forecast(root, trend);
        }
    }

    fn trend_forecast(&mut self, root: &mut XmlElement, trend: &Trend) {
        let mut body = XmlElement::new("iwxxm:MeteorologicalAerodromeTrendForecast");
        body.set("gml:id", gml_id());
        body.set(
            "changeIndicator",
            match trend.kind {
                TrendKind::Becmg => "BECOMING",
                TrendKind::Tempo => "TEMPORARY_FLUCTUATIONS",
            },
        );
        body.set("cloudAndVisibilityOK", bool_str(trend.wx.cavok.is_some()));
        self.trend_phenomenon_time(&mut body, trend);
        self.trend_weather(&mut body, &trend.wx);
        root.child("iwxxm:trendForecast").push(body);
    }

    /// Trend windows may be half-open; the missing bound is emitted as
    /// an indeterminate position rather than dropped.
    fn trend_phenomenon_time(&mut self, body: &mut XmlElement, trend: &Trend) {
        let el = body.child("iwxxm:phenomenonTime");
        if trend.from.is_none() && trend.til.is_none() {
            el.set("nilReason", config::NIL_MSSG_URL);
            return;
        }
        let period = el.child("gml:TimePeriod");
        period.set("gml:id", gml_id());
        let begin = period.child("gml:beginPosition");
        match (trend.from, trend.til) {
            (Some(from), _) => begin.set_text(iso_format(from)),
            (None, Some(til)) => {
                begin.set("indeterminatePosition", "before");
                begin.set_text(iso_format(til));
            }
            (None, None) => begin.set("indeterminatePosition", "unknown"),
        }
        let end = period.child("gml:endPosition");
        match (trend.til, trend.from) {
            (Some(til), _) => end.set_text(iso_format(til)),
            (None, Some(from)) => {
                end.set("indeterminatePosition", "after");
                end.set_text(iso_format(from));
            }
            (None, None) => end.set("indeterminatePosition", "unknown"),
        }
    }

    fn trend_weather(&mut self, body: &mut XmlElement, wx: &WeatherGroup) {
        if let Some(vsby) = &wx.vsby {
            if !vsby.text.contains("//") {
                let metres =
                    visibility_in_metres(vsby.value.parse::<f64>().unwrap_or(0.0), vsby.unit);
                let mut oper = vsby.oper;
                let el = body.child("iwxxm:prevailingVisibility");
                el.set("uom", "m");
                if metres >= 10000 {
                    el.set_text("10000");
                    oper = Some(Operator::Above);
                } else {
                    el.set_text(metres.to_string());
                }
                if let Some(oper) = oper {
                    body.child("iwxxm:prevailingVisibilityOperator")
                        .set_text(oper.as_str());
                }
            }
        }
        if wx.wind.is_some() {
            self.wind(body, wx.wind.as_ref(), true);
        }
        self.weather_list(body, &wx.pcp, "iwxxm:weather");
        self.weather_list(body, &wx.obv, "iwxxm:weather");
        if !wx.sky.is_empty() {
            self.sky(body, &wx.sky, true);
        }
    }

    /// Runway-direction dedup: the first reference returns a fresh id to
    /// define, later references return the stored cross-reference.
    fn runway_ref(&mut self, rwy: &str) -> RunwayRef {
        if let Some(href) = self.runway_cache.get(rwy) {
            return RunwayRef::Reference(href.clone());
        }
        let id = gml_id();
        self.runway_cache.insert(rwy.to_string(), format!("#{id}"));
        RunwayRef::Definition {
            id,
            designator: rwy.to_string(),
        }
    }
}

pub(crate) enum RunwayRef {
    Reference(String),
    Definition { id: String, designator: String },
}

pub(crate) fn apply_runway(parent: &mut XmlElement, runway: RunwayRef) {
    match runway {
        RunwayRef::Reference(href) => parent.set("xlink:href", href),
        RunwayRef::Definition { id, designator } => {
            let direction = parent.child("aixm:RunwayDirection");
            direction.set("gml:id", id);
            let slice = direction
                .child("aixm:timeSlice")
                .child("aixm:RunwayDirectionTimeSlice");
            slice.set("gml:id", gml_id());
            slice.child("gml:validTime");
            slice.child("aixm:interpretation").set_text("SNAPSHOT");
            slice.child("aixm:designator").set_text(designator);
        }
    }
}

fn cloud_layer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(VV|FEW|SCT|BKN|(0|O)VC|///|CLR|SKC)([/\d]{3})?(CB|TCU|///)?")
            .expect("cloud layer pattern")
    })
}

fn cloud_layer(
    parent: &mut XmlElement,
    amount: &str,
    height: &str,
    kind: &str,
    automated: bool,
    enc: &MetarEncoder,
) {
    let unobserved = if automated {
        config::NIL_NOAUTODEC_URL
    } else {
        config::NIL_NOOBSV_URL
    };

    // Vertical visibility replaces the layer set entirely.
    if amount == "VV" {
        let el = parent.child("iwxxm:verticalVisibility");
        match height.parse::<i64>() {
            Ok(h) => {
                el.set("uom", "[ft_i]");
                el.set_text((h * 100).to_string());
            }
            Err(_) => nil_uom(el, config::NIL_NOOBSV_URL),
        }
        return;
    }

    let layer = parent.child("iwxxm:layer");
    if amount == "///" && (height == "///" || height.is_empty()) && kind.is_empty() {
        nil(layer, unobserved);
        return;
    }

    let body = layer.child("iwxxm:CloudLayer");
    let amount_el = body.child("iwxxm:amount");
    match cloud_cover_title(amount) {
        Some(title) => {
            let normalized = match amount {
                "CLR" => "SKC",
                "0VC" => "OVC",
                other => other,
            };
            amount_el.set("xlink:href", format!("{}{}", config::CLDCVR_URL, normalized));
            if enc.config.wants_title(config::titles::CLOUD_AMOUNT) {
                amount_el.set("xlink:title", title);
            }
        }
        None => nil(amount_el, unobserved),
    }

    let base = body.child("iwxxm:base");
    match height.parse::<i64>() {
        Ok(h) => {
            base.set_text((h * 100).to_string());
            base.set("uom", "[ft_i]");
        }
        Err(_) => {
            let reason = if amount == "CLR" {
                config::NIL_NA_URL
            } else {
                unobserved
            };
            nil_uom(base, reason);
        }
    }

    // Annex 3 admits exactly two significant convective types.
    match kind {
        "CB" => {
            let el = body.child("iwxxm:cloudType");
            el.set("xlink:href", config::CUMULONIMBUS);
            if enc.config.wants_title(config::titles::CLOUD_TYPE) {
                el.set("xlink:title", "Cumulonimbus");
            }
        }
        "TCU" => {
            let el = body.child("iwxxm:cloudType");
            el.set("xlink:href", config::TWRNGCUMULUS);
            if enc.config.wants_title(config::titles::CLOUD_TYPE) {
                el.set("xlink:title", "Towering Cumulus");
            }
        }
        "///" => {
            let el = body.child("iwxxm:cloudType");
            nil(el, config::NIL_NOOBSV_URL);
        }
        _ => {}
    }
}

fn cloud_cover_title(amount: &str) -> Option<&'static str> {
    match amount {
        "CLR" => Some("Sky clear within limits"),
        "SKC" => Some("Sky clear"),
        "FEW" => Some("Few"),
        "SCT" => Some("Scattered"),
        "BKN" => Some("Broken"),
        "OVC" | "0VC" => Some("Overcast"),
        _ => None,
    }
}

/// Deposit depths 92-98 are coded steps in whole millimetres.
fn deposit_depth_mm(depth: &str) -> String {
    match depth {
        "92" => "100",
        "93" => "150",
        "94" => "200",
        "95" => "250",
        "96" => "300",
        "97" => "350",
        "98" => "400",
        other => other,
    }
    .to_string()
}

fn friction_title(friction: &str) -> String {
    match friction {
        "91" => "Braking action poor".to_string(),
        "92" => "Braking action medium to poor".to_string(),
        "93" => "Braking action medium".to_string(),
        "94" => "Braking action medium to good".to_string(),
        "95" => "Braking action good".to_string(),
        "99" => "Unreliable".to_string(),
        other => format!(
            "Friction coefficient: {:.2}",
            other.parse::<i64>().unwrap_or(0) as f64 * 0.01
        ),
    }
}

/// Reduce an unmatched phenomenon to its unknown-precipitation family
/// token: the modifier and character prefixes survive, the rest is UP.
fn unknown_precip_token(ww: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^(?P<mod>[-+]?)(?P<char>SH|FZ|TS)").expect("up"));
    match re.captures(ww) {
        Some(caps) => format!("{}{}UP", &caps["mod"], &caps["char"]),
        None => "UP".to_string(),
    }
}

fn is_icao_id(s: &str) -> bool {
    s.len() == 4 && s.chars().all(|c| c.is_ascii_uppercase())
}

fn is_alternate_designator(s: &str) -> bool {
    (3..=6).contains(&s.len())
        && s.chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

pub(crate) fn bool_str(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_precip_token() {
        assert_eq!(unknown_precip_token("+SHXX"), "+SHUP");
        assert_eq!(unknown_precip_token("FZZZ"), "FZUP");
        assert_eq!(unknown_precip_token("XX"), "UP");
    }

    #[test]
    fn test_icao_and_alternate_checks() {
        assert!(is_icao_id("KORD"));
        assert!(!is_icao_id("K1RD"));
        assert!(is_alternate_designator("1V4"));
        assert!(!is_alternate_designator("ab"));
    }

    #[test]
    fn test_deposit_depth_table() {
        assert_eq!(deposit_depth_mm("92"), "100");
        assert_eq!(deposit_depth_mm("12"), "12");
    }
}
