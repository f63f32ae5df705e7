//! METAR/SPECI grammar driver.
//!
//! One parser serves both dialects; the dialect descriptor selects the
//! token-pattern set and the productions that differ (Annex 3 strips
//! remarks and parses supplement/trend sections; FMH-1 makes the main
//! section fully optional and parses remarks as first-class grammar).
//! The grammar is ordered-choice: each production tries alternatives
//! most-specific first and backtracks by restoring the scanner cursor.

use chrono::{DateTime, Duration, Utc};
use iwxxm_common::{cardinal_to_degrees, time::nearest_time, LengthUnit};

use crate::report::{
    Altimeter, IssueTime, Operator, PressureUnit, Report, RunwayState, RvrGroup, RvrTendency,
    SeaState, Tagged, Temperatures, Trend, TrendKind, VariableRvrGroup, Visibility, WeatherGroup,
    Wind, WindShear,
};
use crate::scanner::{Scanner, Token};
use crate::tokens::MetarTokens;

/// Decode an international METAR/SPECI per ICAO Annex 3. Content from
/// the RMK keyword onward is discarded before parsing; any other
/// unidentified content renders the report invalid (partial decode plus
/// `err_msg`).
pub fn decode_annex3(raw: &str, now: DateTime<Utc>) -> Report {
    decode(raw, now, Dialect::Annex3)
}

/// Decode a US METAR/SPECI per FMH-1. The remarks section is parsed as
/// grammar; recognized groups become record fields, everything else
/// survives verbatim in the `additive` field.
pub fn decode_fmh1(raw: &str, now: DateTime<Utc>) -> Report {
    decode(raw, now, Dialect::Fmh1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dialect {
    Annex3,
    Fmh1,
}

fn decode(raw: &str, now: DateTime<Utc>, dialect: Dialect) -> Report {
    let mut text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if dialect == Dialect::Annex3 {
        if let Some(i) = text.find(" RMK ") {
            text.truncate(i);
        }
    }
    if let Some(i) = text.find('=') {
        text.truncate(i);
    }
    let text = text.trim_end().to_string();
    tracing::debug!(report = %text, "decoding METAR/SPECI");

    let mut parser = MetarParser::new(&text, now, dialect);
    let parsed = parser.parse().is_ok() && parser.sc.at_end();
    if parsed {
        parser.finish();
    } else {
        if parser.report.altimeter.is_some() {
            parser.sc.forget_expected("altimeter");
        }
        parser.report.err_msg = Some(parser.sc.err_msg());
    }
    parser.report
}

/// Production outcome: `Err` propagates token exhaustion up to the
/// decode entry point; optional productions convert it back to `false`.
pub(crate) type PResult = Result<(), Fail>;
#[derive(Debug)]
pub(crate) struct Fail;

pub(crate) struct MetarParser<'a> {
    pub(crate) sc: Scanner<'a>,
    pub(crate) toks: &'static MetarTokens,
    pub(crate) dialect: Dialect,
    pub(crate) report: Report,
    /// The open trend group; semantic actions write here when present.
    trend: Option<Trend>,
    pub(crate) now: DateTime<Utc>,
}

impl<'a> MetarParser<'a> {
    fn new(input: &'a str, now: DateTime<Utc>, dialect: Dialect) -> Self {
        let toks = match dialect {
            Dialect::Annex3 => MetarTokens::annex3(),
            Dialect::Fmh1 => MetarTokens::fmh1(),
        };
        MetarParser {
            sc: Scanner::new(input),
            toks,
            dialect,
            report: Report::new(now),
            trend: None,
            now,
        }
    }

    fn parse(&mut self) -> PResult {
        self.p_kind()?;
        self.p_ident()?;
        self.p_itime()?;
        match self.dialect {
            Dialect::Annex3 => {
                if self.try_nil() {
                    return Ok(());
                }
                self.try_cor();
                self.try_auto();
                self.p_main_annex3()?;
                self.p_supplement();
                self.p_trends()
            }
            Dialect::Fmh1 => {
                self.try_cor();
                self.try_auto();
                self.p_main_fmh1();
                self.p_remarks_section();
                Ok(())
            }
        }
    }

    fn finish(&mut self) {
        if self.report.is_nil() {
            return;
        }
        self.flush_trend();
        // Adjacent trends must not gap or overlap: a trend with no "til"
        // ends where the next one begins.
        for i in 1..self.report.trends.len() {
            if self.report.trends[i - 1].til.is_none() {
                self.report.trends[i - 1].til = self.report.trends[i].from;
            }
        }
        if self.dialect == Dialect::Fmh1 {
            self.unparsed_pass();
        }
    }

    // -- grammar ----------------------------------------------------------

    fn p_main_annex3(&mut self) -> PResult {
        self.p_wind()?;
        self.try_wind_vrb();
        if !self.try_cavok() {
            if !self.try_vsby1() {
                self.p_vsby2()?;
                self.try_minvsby();
            }
            for _ in 0..4 {
                if !self.try_rvr() {
                    break;
                }
            }
            for _ in 0..3 {
                if !self.try_weather() {
                    break;
                }
            }
            if !self.try_noclouds() {
                let mut layers = 0;
                while layers < 4 && self.try_sky() {
                    layers += 1;
                }
                if layers == 0 {
                    return Err(Fail);
                }
            }
        }
        self.p_temps()?;
        self.p_altimeter()?;
        self.try_altimeter();
        Ok(())
    }

    fn p_main_fmh1(&mut self) {
        if self.try_wind() {
            self.try_wind_vrb();
        }
        let _ = self.try_vsby1() || self.try_vsby2();
        for _ in 0..4 {
            if !(self.try_vrbrvr() || self.try_rvr()) {
                break;
            }
        }
        for _ in 0..3 {
            if !self.try_weather() {
                break;
            }
        }
        if !self.try_noclouds() {
            let mut layers = 0;
            while layers < 4 && self.try_sky() {
                layers += 1;
            }
        }
        self.try_temps();
        self.try_altimeter();
    }

    fn p_supplement(&mut self) {
        for _ in 0..3 {
            if !self.try_rewx() {
                break;
            }
        }
        self.try_windshear();
        for _ in 0..2 {
            if !self.try_seastate() {
                break;
            }
        }
        while self.try_rwystate() {}
    }

    fn p_trends(&mut self) -> PResult {
        if let Some(tok) = self.sc.accept(&self.toks.nosig) {
            self.sc.record(&tok);
            self.report.nosig = Some(tok.span);
            return Ok(());
        }
        while self.try_trendtype() {
            for _ in 0..2 {
                if !(self.try_trend_boundary()) {
                    break;
                }
            }
            self.try_twind();
            self.try_cavok();
            let _ = self.try_vsby1() || self.try_vsby2();
            self.try_nsw();
            for _ in 0..3 {
                if !self.try_trend_weather() {
                    break;
                }
            }
            if !self.try_noclouds() {
                let mut layers = 0;
                while layers < 4 && self.try_sky() {
                    layers += 1;
                }
            }
        }
        Ok(())
    }

    // -- required productions ---------------------------------------------

    fn p_kind(&mut self) -> PResult {
        let tok = self.sc.accept(&self.toks.kind).ok_or(Fail)?;
        self.sc.record(&tok);
        self.report.kind = Some(Tagged {
            text: tok.text,
            span: tok.span,
        });
        Ok(())
    }

    fn p_ident(&mut self) -> PResult {
        let tok = self.sc.accept(&self.toks.ident).ok_or(Fail)?;
        self.sc.record(&tok);
        self.report.ident = Some(Tagged {
            text: tok.text,
            span: tok.span,
        });
        Ok(())
    }

    fn p_itime(&mut self) -> PResult {
        let tok = self.sc.accept(&self.toks.itime).ok_or(Fail)?;
        self.sc.record(&tok);
        let day: u32 = tok.text[0..2].parse().unwrap_or(0);
        let hour: u32 = tok.text[2..4].parse().unwrap_or(99);
        let minute: u32 = tok.text[4..6].parse().unwrap_or(99);
        self.report.issue_time = Some(IssueTime {
            time: nearest_time(self.now, day, hour, minute),
            text: tok.text,
            span: tok.span,
        });
        Ok(())
    }

    fn p_wind(&mut self) -> PResult {
        if self.try_wind() {
            Ok(())
        } else {
            Err(Fail)
        }
    }

    fn p_vsby2(&mut self) -> PResult {
        if self.try_vsby2() {
            Ok(())
        } else {
            Err(Fail)
        }
    }

    fn p_temps(&mut self) -> PResult {
        if self.try_temps() {
            Ok(())
        } else {
            Err(Fail)
        }
    }

    fn p_altimeter(&mut self) -> PResult {
        if self.try_altimeter() {
            Ok(())
        } else {
            Err(Fail)
        }
    }

    // -- optional productions and semantic actions ------------------------

    fn try_nil(&mut self) -> bool {
        if let Some(tok) = self.sc.accept(&self.toks.nil) {
            self.sc.record(&tok);
            self.report.nil = Some(tok.span);
            true
        } else {
            false
        }
    }

    fn try_cor(&mut self) -> bool {
        if let Some(tok) = self.sc.accept(&self.toks.cor) {
            self.sc.record(&tok);
            self.report.correction = Some(tok.span);
            true
        } else {
            false
        }
    }

    fn try_auto(&mut self) -> bool {
        if let Some(tok) = self.sc.accept(&self.toks.auto) {
            self.sc.record(&tok);
            self.report.auto = Some(tok.span);
            true
        } else {
            false
        }
    }

    /// The weather-element record currently being written: the open
    /// trend group when one exists, the base observation otherwise.
    fn wx(&mut self) -> &mut WeatherGroup {
        match self.trend.as_mut() {
            Some(trend) => &mut trend.wx,
            None => &mut self.report.wx,
        }
    }

    fn try_wind(&mut self) -> bool {
        let Some(tok) = self.sc.accept(&self.toks.wind) else {
            return false;
        };
        self.sc.record(&tok);
        self.store_wind(tok);
        true
    }

    fn try_twind(&mut self) -> bool {
        let Some(tok) = self.sc.accept(&self.toks.twind) else {
            return false;
        };
        self.sc.record(&tok);
        self.store_wind(tok);
        true
    }

    fn store_wind(&mut self, tok: Token) {
        self.wx().wind = Some(Wind::parse(tok.text, tok.span));
    }

    /// The dddVddd suffix extends the previous wind entry rather than
    /// creating a new field; the merge is order-dependent by design.
    fn try_wind_vrb(&mut self) -> bool {
        if self.wx().wind.is_none() {
            return false;
        }
        let Some(tok) = self.sc.accept(&self.toks.wind_vrb) else {
            return false;
        };
        self.sc.record(&tok);
        let (ccw, cw) = tok.text.split_once('V').unwrap_or(("", ""));
        let (ccw, cw) = (ccw.to_string(), cw.to_string());
        let wind = self.wx().wind.as_mut().unwrap();
        wind.span = wind.span.merge(&tok.span);
        wind.text = format!("{} {}", wind.text, tok.text);
        wind.ccw = Some(ccw);
        wind.cw = Some(cw);
        true
    }

    fn try_cavok(&mut self) -> bool {
        if let Some(tok) = self.sc.accept(&self.toks.cavok) {
            self.sc.record(&tok);
            self.wx().cavok = Some(tok.span);
            true
        } else {
            false
        }
    }

    fn try_vsby1(&mut self) -> bool {
        let Some(tok) = self.sc.accept(&self.toks.vsby1) else {
            return false;
        };
        self.sc.record(&tok);
        let caps = self.toks.vsby1.re.captures(&tok.text);
        let mut vis = 0.0f64;
        let mut oper = None;
        if let Some(caps) = caps {
            if let Some(whole) = caps.name("whole").or_else(|| caps.name("whole2")) {
                vis += whole.as_str().parse::<f64>().unwrap_or(0.0);
            }
            if let Some(frac) = caps.name("frac").or_else(|| caps.name("mfrac")) {
                let mut frac = frac.as_str();
                if let Some(rest) = frac.strip_prefix('M') {
                    oper = Some(Operator::Below);
                    frac = rest;
                }
                if let Some((num, den)) = frac.split_once('/') {
                    let num: f64 = num.parse().unwrap_or(0.0);
                    let den: f64 = den.parse().unwrap_or(1.0);
                    if den > 0.0 {
                        vis += num / den;
                    }
                }
            }
        }
        self.wx().vsby = Some(Visibility {
            value: format!("{vis:.2}"),
            text: tok.text,
            span: tok.span,
            unit: LengthUnit::StatuteMiles,
            oper,
            min: None,
            min_bearing: None,
        });
        true
    }

    fn try_vsby2(&mut self) -> bool {
        let Some(tok) = self.sc.accept(&self.toks.vsby2) else {
            return false;
        };
        self.sc.record(&tok);
        let mut body = tok.text.trim_end_matches("NDV").trim_end().to_string();
        let mut oper = None;
        if let Some(rest) = body.strip_prefix('M') {
            oper = Some(Operator::Below);
            body = rest.to_string();
        } else if let Some(rest) = body.strip_prefix('P') {
            oper = Some(Operator::Above);
            body = rest.to_string();
        }
        self.wx().vsby = Some(Visibility {
            value: body,
            text: tok.text,
            span: tok.span,
            unit: LengthUnit::Metres,
            oper,
            min: None,
            min_bearing: None,
        });
        true
    }

    /// Directional minimum visibility merges into the visibility entry.
    fn try_minvsby(&mut self) -> bool {
        if self.wx().vsby.is_none() {
            return false;
        }
        let Some(tok) = self.sc.accept(&self.toks.minvsby) else {
            return false;
        };
        self.sc.record(&tok);
        let min = tok.text[..4].to_string();
        let bearing = cardinal_to_degrees(&tok.text[4..]).unwrap_or("/").to_string();
        let vsby = self.wx().vsby.as_mut().unwrap();
        vsby.span = vsby.span.merge(&tok.span);
        vsby.min = Some(min);
        vsby.min_bearing = Some(bearing);
        true
    }

    /// Each RVR group appends one element to four index-aligned parallel
    /// sequences; there is never one field per runway.
    fn try_rvr(&mut self) -> bool {
        let Some(tok) = self.sc.accept(&self.toks.rvr) else {
            return false;
        };
        self.sc.record(&tok);
        let caps = self.toks.rvr.re.captures(&tok.text).expect("rvr shape");
        let oper = match caps.name("oper").map(|m| m.as_str()) {
            Some("P") => Some(Operator::Above),
            Some("M") => Some(Operator::Below),
            _ => None,
        };
        let tendency = match caps.name("tend").map(|m| m.as_str()) {
            Some("U") => RvrTendency::Upward,
            Some("D") => RvrTendency::Downward,
            Some("N") => RvrTendency::NoChange,
            _ => RvrTendency::Missing,
        };
        let mut mean = caps.name("mean").map(|m| m.as_str()).unwrap_or("").to_string();
        let mut unit = LengthUnit::Metres;
        if let Some(stripped) = mean.strip_suffix("FT") {
            mean = stripped.to_string();
            unit = LengthUnit::Feet;
        }

        let rvr = self.report.rvr.get_or_insert_with(RvrGroup::default);
        rvr.runway
            .push(caps.name("rwy").map(|m| m.as_str()).unwrap_or("").to_string());
        rvr.mean.push(mean);
        rvr.oper.push(oper);
        rvr.tendency.push(tendency);
        rvr.unit.push(unit);
        rvr.span.push(tok.span);
        rvr.text.push(tok.text);
        true
    }

    fn try_vrbrvr(&mut self) -> bool {
        if self.dialect != Dialect::Fmh1 {
            return false;
        }
        let Some(tok) = self.sc.accept(&self.toks.vrbrvr) else {
            return false;
        };
        self.sc.record(&tok);
        let caps = self.toks.vrbrvr.re.captures(&tok.text).expect("vrbrvr shape");
        let mut lo = caps.name("lo").map(|m| m.as_str()).unwrap_or("").to_string();
        let mut hi = caps.name("hi").map(|m| m.as_str()).unwrap_or("").to_string();
        let mut oper = None;
        if let Some(rest) = lo.strip_prefix('M') {
            oper = Some(Operator::Below);
            lo = rest.to_string();
        } else if let Some(rest) = hi.strip_prefix('P') {
            oper = Some(Operator::Above);
            hi = rest.to_string();
        }
        let unit = if caps.name("ft").is_some() {
            LengthUnit::Feet
        } else {
            LengthUnit::Metres
        };

        let group = self
            .report
            .variable_rvr
            .get_or_insert_with(VariableRvrGroup::default);
        group
            .runway
            .push(caps.name("rwy").map(|m| m.as_str()).unwrap_or("").to_string());
        group.lo.push(lo);
        group.hi.push(hi);
        group.oper.push(oper);
        group.unit.push(unit);
        group.span.push(tok.span);
        group.text.push(tok.text);
        true
    }

    /// (Pcp|DryTstm|Obv|Vcnty), most specific first.
    fn try_weather(&mut self) -> bool {
        if let Some(tok) = self.sc.accept(&self.toks.pcp) {
            self.sc.record(&tok);
            self.wx().pcp.push(tok.text, tok.span);
            return true;
        }
        if let Some(tok) = self.sc.accept(&self.toks.drytstm) {
            self.sc.record(&tok);
            self.wx().pcp.push(tok.text, tok.span);
            return true;
        }
        if let Some(tok) = self.sc.accept(&self.toks.obv) {
            self.sc.record(&tok);
            self.wx().obv.push(tok.text, tok.span);
            return true;
        }
        if let Some(tok) = self.sc.accept(&self.toks.vcnty) {
            self.sc.record(&tok);
            self.report.vcnty.push(tok.text, tok.span);
            return true;
        }
        false
    }

    /// Trend weather: vicinity groups belong to the observation only.
    fn try_trend_weather(&mut self) -> bool {
        if let Some(tok) = self.sc.accept(&self.toks.pcp) {
            self.sc.record(&tok);
            self.wx().pcp.push(tok.text, tok.span);
            return true;
        }
        if let Some(tok) = self.sc.accept(&self.toks.drytstm) {
            self.sc.record(&tok);
            self.wx().pcp.push(tok.text, tok.span);
            return true;
        }
        if let Some(tok) = self.sc.accept(&self.toks.obv) {
            self.sc.record(&tok);
            self.wx().obv.push(tok.text, tok.span);
            return true;
        }
        false
    }

    fn try_nsw(&mut self) -> bool {
        if let Some(tok) = self.sc.accept(&self.toks.nsw) {
            self.sc.record(&tok);
            self.wx().pcp.push(tok.text, tok.span);
            true
        } else {
            false
        }
    }

    fn try_noclouds(&mut self) -> bool {
        if let Some(tok) = self.sc.accept(&self.toks.noclouds) {
            self.sc.record(&tok);
            self.wx().sky.push(tok.text, tok.span);
            true
        } else {
            false
        }
    }

    fn try_sky(&mut self) -> bool {
        let mark = self.sc.mark();
        let Some(tok) = self.sc.accept(&self.toks.sky) else {
            return false;
        };
        // An all-missing layer is only admissible at automated stations;
        // elsewhere the token is rejected so the next grammar alternative
        // can claim the text.
        if tok.text == "///" && !self.report.is_automated() {
            self.sc.reset(mark);
            return false;
        }
        self.sc.record(&tok);
        self.wx().sky.push(tok.text, tok.span);
        true
    }

    fn try_temps(&mut self) -> bool {
        let Some(tok) = self.sc.accept(&self.toks.temps) else {
            return false;
        };
        self.sc.record(&tok);
        let caps = self.toks.temps.re.captures(&tok.text).expect("temps shape");
        let air = caps.name("air").and_then(|m| signed_degrees(m.as_str()));
        let dewpoint = caps
            .name("dewpoint")
            .and_then(|m| signed_degrees(m.as_str()));
        self.report.temps = Some(Temperatures {
            text: tok.text,
            span: tok.span,
            air,
            dewpoint,
        });
        true
    }

    /// QNH in hectopascals is preferred; the inches form is kept only
    /// when no Q group was seen. A redundant inches group is consumed
    /// but left unrecorded so the white-out pass surfaces it.
    fn try_altimeter(&mut self) -> bool {
        let Some(tok) = self.sc.accept(&self.toks.altimeter) else {
            return false;
        };
        if tok.text.starts_with('Q') {
            self.sc.record(&tok);
            self.report.altimeter = Some(Altimeter {
                value: tok.text[1..].to_string(),
                text: tok.text,
                span: tok.span,
                unit: PressureUnit::HectoPascals,
            });
        } else if self.report.altimeter.is_none() {
            self.sc.record(&tok);
            let value = match tok.text[1..].parse::<i64>() {
                Ok(hundredths) => format!("{:.2}", hundredths as f64 * 0.01),
                Err(_) => "////".to_string(),
            };
            self.report.altimeter = Some(Altimeter {
                value,
                text: tok.text,
                span: tok.span,
                unit: PressureUnit::InchesOfMercury,
            });
        }
        true
    }

    fn try_rewx(&mut self) -> bool {
        let Some(tok) = self.sc.accept(&self.toks.rewx) else {
            return false;
        };
        self.sc.record(&tok);
        let phenomenon = tok.text[2..].to_string();
        self.report.recent_weather.push(phenomenon, tok.span);
        true
    }

    fn try_windshear(&mut self) -> bool {
        let Some(tok) = self.sc.accept(&self.toks.windshear) else {
            return false;
        };
        self.sc.record(&tok);
        let caps = self.toks.windshear.re.captures(&tok.text);
        let runway = caps
            .and_then(|c| c.name("rwy").map(|m| m.as_str().to_string()));
        self.report.wind_shear = Some(WindShear {
            text: tok.text,
            span: tok.span,
            runway,
        });
        true
    }

    fn try_seastate(&mut self) -> bool {
        let Some(tok) = self.sc.accept(&self.toks.seastate) else {
            return false;
        };
        self.sc.record(&tok);
        let caps = self.toks.seastate.re.captures(&tok.text).expect("seastate shape");
        let temp = caps.name("temp").map(|m| m.as_str()).unwrap_or("//");
        let temperature = signed_degrees(temp).unwrap_or_else(|| temp.to_string());
        let value = caps.name("value").map(|m| m.as_str().to_string());
        let is_wave_height = caps.name("kind").map(|m| m.as_str()) == Some("H");

        match self.report.sea_state.as_mut() {
            Some(existing) => {
                existing.text = format!("{} {}", existing.text, tok.text);
                existing.span = existing.span.merge(&tok.span);
                if is_wave_height {
                    existing.wave_height = value;
                } else {
                    existing.state = value;
                }
            }
            None => {
                self.report.sea_state = Some(SeaState {
                    temperature,
                    state: if is_wave_height { None } else { value.clone() },
                    wave_height: if is_wave_height { value } else { None },
                    text: tok.text,
                    span: tok.span,
                });
            }
        }
        true
    }

    fn try_rwystate(&mut self) -> bool {
        let Some(tok) = self.sc.accept(&self.toks.rwystate) else {
            return false;
        };
        self.sc.record(&tok);
        let caps = self.toks.rwystate.re.captures(&tok.text).expect("rwystate shape");
        self.report.runway_state.push(RunwayState {
            runway: caps.name("rwy").map(|m| m.as_str()).unwrap_or("").to_string(),
            state: caps.name("state").map(|m| m.as_str()).unwrap_or("").to_string(),
            text: tok.text,
            span: tok.span,
        });
        true
    }

    /// A new trend qualifier flushes the previous trend group into the
    /// report's ordered list and opens a fresh one.
    fn try_trendtype(&mut self) -> bool {
        let Some(tok) = self.sc.accept(&self.toks.trendtype) else {
            return false;
        };
        self.sc.record(&tok);
        self.flush_trend();
        let kind = if tok.text == "BECMG" {
            TrendKind::Becmg
        } else {
            TrendKind::Tempo
        };
        self.trend = Some(Trend {
            kind,
            span: tok.span,
            from: None,
            til: None,
            wx: WeatherGroup::default(),
        });
        true
    }

    fn flush_trend(&mut self) {
        if let Some(trend) = self.trend.take() {
            self.report.trends.push(trend);
        }
    }

    /// (AT|FM)hhmm sets the window start, TLhhmm the end, both resolved
    /// against the issuance date with midnight rollover.
    fn try_trend_boundary(&mut self) -> bool {
        if let Some(tok) = self.sc.accept(&self.toks.ftime) {
            self.sc.record(&tok);
            let t = self.boundary_time(&tok.text);
            if let Some(trend) = self.trend.as_mut() {
                trend.from = t;
            }
            return true;
        }
        if let Some(tok) = self.sc.accept(&self.toks.ttime) {
            self.sc.record(&tok);
            let t = self.boundary_time(&tok.text);
            if let Some(trend) = self.trend.as_mut() {
                trend.til = t;
            }
            return true;
        }
        false
    }

    fn boundary_time(&self, text: &str) -> Option<DateTime<Utc>> {
        let digits = &text[text.len() - 4..];
        let hour: u32 = digits[..2].parse().ok()?;
        let minute: u32 = digits[2..].parse().ok()?;
        let base = self.report.issue_time.as_ref()?.time?;

        let (hour, day_carry) = if hour == 24 { (0, 1) } else { (hour, 0) };
        if hour > 23 || minute > 59 {
            return None;
        }
        let mut t = base
            .date_naive()
            .and_hms_opt(hour, minute, 0)?
            .and_utc()
            + Duration::days(day_carry);
        // A boundary earlier than issuance crosses midnight UTC.
        if t < base {
            t += Duration::days(1);
        }
        Some(t)
    }
}

/// "M05"/"-05" to "-5", "07" to "7"; MM and // are missing.
fn signed_degrees(s: &str) -> Option<String> {
    if s == "MM" || s == "//" {
        return None;
    }
    s.replace('M', "-").parse::<i32>().ok().map(|v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::signed_degrees;

    #[test]
    fn test_signed_degrees() {
        assert_eq!(signed_degrees("M05"), Some("-5".to_string()));
        assert_eq!(signed_degrees("07"), Some("7".to_string()));
        assert_eq!(signed_degrees("-12"), Some("-12".to_string()));
        assert_eq!(signed_degrees("MM"), None);
        assert_eq!(signed_degrees("//"), None);
    }
}
