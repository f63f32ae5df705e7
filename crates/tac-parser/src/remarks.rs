//! FMH-1 remarks productions.
//!
//! The remarks section is real grammar, not free text: recognized groups
//! write record fields like any other token, and an any-token fallback
//! keeps the scanner moving. After a successful parse the white-out pass
//! blanks every recorded span from a copy of the input; what survives
//! before RMK is an error span, what survives after RMK is observer text
//! and is never discarded.

use chrono::{DateTime, Duration, Timelike, Utc};

use crate::locations::parse_location_phrase;
use crate::metar::MetarParser;
use crate::report::{
    ConvectionGroup, LightningGroup, MaxMinTemps, PeakWind, PrecipAmount, PressureTendency,
    SeaLevelPressure, SensorStatus, SnowDepth, SpeedUnit, Tagged, Temperatures, WindShift,
};
use crate::scanner::Token;
use crate::tokens::RemarkTokens;

impl MetarParser<'_> {
    pub(crate) fn p_remarks_section(&mut self) {
        // The RMK keyword itself stays unrecorded: the white-out pass
        // uses it to split unparsed from additive text.
        if self.sc.accept(&self.toks.rmk).is_none() {
            return;
        }
        while !self.sc.at_end() {
            self.remark_once();
        }
    }

    /// One remark group, ordered-choice. The trailing any-token makes
    /// this total: every call consumes at least one token.
    fn remark_once(&mut self) {
        let r = RemarkTokens::get();
        if self.rmk_ostype(r)
            || self.rmk_tempdec(r)
            || self.rmk_mslp(r)
            || self.rmk_pcpn1h(r)
            || self.rmk_ptndcy(r)
            || self.rmk_ssindc(r)
            || self.rmk_maintenance(r)
            || self.rmk_maxmin6h(r)
            || self.rmk_pkwnd(r)
            || self.rmk_ltg(r)
            || self.rmk_pcpn6h(r)
            || self.rmk_xtrmet(r)
            || self.rmk_pchgr(r)
            || self.rmk_wshft(r)
            || self.rmk_pcpn24h(r)
            || self.rmk_tstm(r)
            || self.rmk_snodpth(r)
            || self.rmk_nospeci(r)
            || self.rmk_fropa(r)
        {
            return;
        }
        // Unrecognized token: consumed but unrecorded, so it lands in
        // the additive text.
        let _ = self.sc.accept(&r.any);
    }

    fn rmk_ostype(&mut self, r: &'static RemarkTokens) -> bool {
        let Some(tok) = self.sc.accept(&r.ostype) else {
            return false;
        };
        self.sc.record(&tok);
        self.report.remarks.ostype = Some(Tagged {
            text: tok.text,
            span: tok.span,
        });
        true
    }

    /// Tsnnnsnnn: temperature and dew point in tenths; overrides the
    /// whole-degree values from the body of the report.
    fn rmk_tempdec(&mut self, r: &'static RemarkTokens) -> bool {
        let Some(tok) = self.sc.accept(&r.tempdec) else {
            return false;
        };
        self.sc.record(&tok);
        let s = &tok.text;
        let air = tenths(&s[2..5], &s[1..2]);
        let dewpoint = tenths(&s[6..9], &s[5..6]);
        match self.report.temps.as_mut() {
            Some(temps) => {
                if air.is_some() {
                    temps.air = air.clone();
                }
                if dewpoint.is_some() {
                    temps.dewpoint = dewpoint.clone();
                }
            }
            None => {
                self.report.temps = Some(Temperatures {
                    text: tok.text.clone(),
                    span: tok.span,
                    air: air.clone(),
                    dewpoint: dewpoint.clone(),
                });
            }
        }
        self.report.remarks.temp_dec = Some(Tagged {
            text: tok.text,
            span: tok.span,
        });
        true
    }

    /// SLPppp: tenths of hPa with the thousands/hundreds dropped. The
    /// decade nearest 1000 hPa is assumed unless simultaneously decoded
    /// temperature and wind strongly imply the alternate decade.
    fn rmk_mslp(&mut self, r: &'static RemarkTokens) -> bool {
        let Some(tok) = self.sc.accept(&r.mslp) else {
            return false;
        };
        self.sc.record(&tok);
        let Ok(raw) = tok.text[3..].parse::<f64>() else {
            self.report.remarks.slp = Some(SeaLevelPressure {
                text: tok.text,
                span: tok.span,
                value: None,
                corrected: false,
            });
            return true;
        };

        let mut p = raw / 10.0;
        if p >= 60.0 {
            p += 900.0;
        } else {
            p += 1000.0;
        }
        let air: Option<f64> = self
            .report
            .temps
            .as_ref()
            .and_then(|t| t.air.as_ref())
            .and_then(|a| a.parse().ok());
        let ff: Option<i32> = self
            .report
            .wx
            .wind
            .as_ref()
            .and_then(|w| w.ff.parse().ok());
        // A record high read as a low pressure occurs with extreme cold
        // and near-calm wind; a record low read as a high with storm
        // winds. US records: 1078.6 and 924 hPa.
        let mut corrected = false;
        if (960.0..980.0).contains(&p) {
            if let (Some(air), Some(ff)) = (air, ff) {
                if air < -25.0 && ff < 10 {
                    p += 100.0;
                    corrected = true;
                }
            }
        } else if p > 1020.0 && p < 1060.0 && ff.map_or(false, |ff| ff > 20) {
            p -= 100.0;
            corrected = true;
        }
        if corrected {
            tracing::warn!(
                group = %tok.text,
                pressure = p,
                "sea-level pressure decade corrected on temperature/wind evidence"
            );
        }
        self.report.remarks.slp = Some(SeaLevelPressure {
            text: tok.text,
            span: tok.span,
            value: Some(p),
            corrected,
        });
        true
    }

    fn rmk_pcpn1h(&mut self, r: &'static RemarkTokens) -> bool {
        let Some(tok) = self.sc.accept(&r.pcpn1h) else {
            return false;
        };
        self.sc.record(&tok);
        self.report.remarks.pcpn1h = Some(precip_amount(&tok, 1, Some(1)));
        true
    }

    fn rmk_ptndcy(&mut self, r: &'static RemarkTokens) -> bool {
        let Some(tok) = self.sc.accept(&r.ptndcy3h) else {
            return false;
        };
        self.sc.record(&tok);
        let character = tok.text.chars().nth(1).unwrap_or('/');
        let change = tok.text[2..]
            .parse::<i64>()
            .ok()
            .map(|v| format!("{:.1}", v as f64 * 0.1));
        self.report.remarks.pressure_tendency = Some(PressureTendency {
            text: tok.text,
            span: tok.span,
            character,
            change,
        });
        true
    }

    fn rmk_ssindc(&mut self, r: &'static RemarkTokens) -> bool {
        let Some(tok) = self.sc.accept(&r.ssindc) else {
            return false;
        };
        self.sc.record(&tok);
        let mut parts = tok.text.split_whitespace();
        let sensor = parts.next().unwrap_or("").to_string();
        let rest: Vec<&str> = parts.collect();
        let location = if rest.is_empty() {
            "none".to_string()
        } else {
            let joined = rest.join(" ");
            match runway_designator(&joined) {
                Some(rwy) => format!("R{rwy}"),
                None => joined,
            }
        };
        let status = self
            .report
            .remarks
            .sensor_status
            .get_or_insert_with(SensorStatus::default);
        if status.text.is_empty() {
            status.text = tok.text.clone();
        } else {
            status.text = format!("{} {}", status.text, tok.text);
        }
        status.spans.push(tok.span);
        status.add(location, sensor);
        true
    }

    fn rmk_maintenance(&mut self, r: &'static RemarkTokens) -> bool {
        let Some(tok) = self.sc.accept(&r.maintenance) else {
            return false;
        };
        self.sc.record(&tok);
        self.report.remarks.maintenance = Some(tok.span);
        true
    }

    fn rmk_maxmin6h(&mut self, r: &'static RemarkTokens) -> bool {
        let is_max;
        let tok = if let Some(tok) = self.sc.accept(&r.maxt6h) {
            is_max = true;
            tok
        } else if let Some(tok) = self.sc.accept(&r.mint6h) {
            is_max = false;
            tok
        } else {
            return false;
        };
        self.sc.record(&tok);
        let value = tenths(&tok.text[2..], &tok.text[1..2]);
        match self.report.remarks.maxmin6h.as_mut() {
            Some(group) => {
                group.text = format!("{} {}", group.text, tok.text);
                group.span = group.span.merge(&tok.span);
                if is_max {
                    group.max = value;
                } else {
                    group.min = value;
                }
            }
            None => {
                self.report.remarks.maxmin6h = Some(MaxMinTemps {
                    text: tok.text.clone(),
                    span: tok.span,
                    period_hours: 6,
                    max: if is_max { value.clone() } else { None },
                    min: if is_max { None } else { value },
                });
            }
        }
        true
    }

    fn rmk_pkwnd(&mut self, r: &'static RemarkTokens) -> bool {
        let Some(tok) = self.sc.accept(&r.pkwnd) else {
            return false;
        };
        self.sc.record(&tok);
        let group = tok.text.split_whitespace().last().unwrap_or("");
        let (wind, hhmm) = group.split_once('/').unwrap_or((group, ""));
        let unit = self
            .report
            .wx
            .wind
            .as_ref()
            .map(|w| w.unit)
            .unwrap_or(SpeedUnit::Knots);
        self.report.remarks.peak_wind = Some(PeakWind {
            dd: wind[..3].to_string(),
            ff: wind[3..].to_string(),
            unit,
            time: self.remark_clock_time(hhmm),
            text: tok.text,
            span: tok.span,
        });
        true
    }

    fn rmk_ltg(&mut self, r: &'static RemarkTokens) -> bool {
        let Some(head) = self.sc.accept(&r.ltg) else {
            return false;
        };
        self.sc.record(&head);

        let (frequency, type_text) = match head.text.split_once(char::is_whitespace) {
            Some((freq, rest)) => (Some(freq.to_string()), rest.trim_start().to_string()),
            None => (None, head.text.clone()),
        };
        let mut types: Vec<String> = type_text
            .trim_start_matches("LTG")
            .as_bytes()
            .chunks(2)
            .map(|c| String::from_utf8_lossy(c).into_owned())
            .filter(|c| c.len() == 2)
            .collect();
        types.sort();

        let (words, phrase, span) = self.consume_location_words(r, head.span);
        for word in &words {
            self.sc.record(word);
        }
        self.report.remarks.lightning.push(LightningGroup {
            text: trimmed_concat(&head.text, &phrase),
            span,
            frequency,
            types,
            locations: parse_location_phrase(&phrase),
        });
        true
    }

    fn rmk_pcpn6h(&mut self, r: &'static RemarkTokens) -> bool {
        let Some(tok) = self.sc.accept(&r.pcpn6h) else {
            return false;
        };
        self.sc.record(&tok);
        // The 6xxxx group covers 3 or 6 hours depending on which routine
        // cycle the report belongs to.
        let mut period = None;
        if self.report.kind.as_ref().map(|k| k.text.as_str()) == Some("METAR") {
            if let Some(itime) = &self.report.issue_time {
                period = match &itime.text[2..5] {
                    "025" | "085" | "145" | "205" => Some(3),
                    "055" | "115" | "175" | "235" => Some(6),
                    _ => None,
                };
            }
        }
        self.report.remarks.pcpn6h = Some(precip_amount(&tok, 1, period));
        true
    }

    fn rmk_xtrmet(&mut self, r: &'static RemarkTokens) -> bool {
        let Some(tok) = self.sc.accept(&r.xtrmet) else {
            return false;
        };
        self.sc.record(&tok);
        let s = &tok.text;
        self.report.remarks.maxmin24h = Some(MaxMinTemps {
            max: tenths(&s[2..5], &s[1..2]),
            min: tenths(&s[6..9], &s[5..6]),
            text: tok.text.clone(),
            span: tok.span,
            period_hours: 24,
        });
        true
    }

    fn rmk_pchgr(&mut self, r: &'static RemarkTokens) -> bool {
        let Some(tok) = self.sc.accept(&r.pchgr) else {
            return false;
        };
        self.sc.record(&tok);
        self.report.remarks.pressure_rising = Some(tok.text.as_bytes()[4] == b'R');
        true
    }

    fn rmk_wshft(&mut self, r: &'static RemarkTokens) -> bool {
        let Some(tok) = self.sc.accept(&r.wshft) else {
            return false;
        };
        self.sc.record(&tok);
        let hhmm = tok.text.split_whitespace().nth(1).unwrap_or("");
        self.report.remarks.wind_shift = Some(WindShift {
            time: self.remark_clock_time(hhmm),
            fropa: false,
            text: tok.text,
            span: tok.span,
        });
        true
    }

    fn rmk_pcpn24h(&mut self, r: &'static RemarkTokens) -> bool {
        let Some(tok) = self.sc.accept(&r.pcpn24h) else {
            return false;
        };
        self.sc.record(&tok);
        self.report.remarks.pcpn24h = Some(precip_amount(&tok, 1, Some(24)));
        true
    }

    fn rmk_tstm(&mut self, r: &'static RemarkTokens) -> bool {
        let mark = self.sc.mark();
        let Some(head) = self.sc.accept(&r.tstm) else {
            return false;
        };
        let (words, phrase, span) = self.consume_location_words(r, head.span);
        let movement_tok = self.sc.accept(&r.movmnt);
        let locations = parse_location_phrase(&phrase);
        // A bare cloud-type word with neither location nor movement is
        // not a convection remark; hand the text back.
        if locations.is_empty() && movement_tok.is_none() {
            self.sc.reset(mark);
            return false;
        }
        self.sc.record(&head);
        for word in &words {
            self.sc.record(word);
        }
        let movement = movement_tok.map(|tok| {
            self.sc.record(&tok);
            tok.text
                .split_whitespace()
                .last()
                .unwrap_or("")
                .to_string()
        });
        self.report.remarks.convection.push(ConvectionGroup {
            cloud_type: head.text.clone(),
            text: trimmed_concat(&head.text, &phrase),
            span,
            locations,
            movement,
        });
        true
    }

    fn rmk_snodpth(&mut self, r: &'static RemarkTokens) -> bool {
        let Some(tok) = self.sc.accept(&r.snodpth) else {
            return false;
        };
        self.sc.record(&tok);
        self.report.remarks.snow_depth = Some(SnowDepth {
            value: tok.text[2..].to_string(),
            text: tok.text,
            span: tok.span,
        });
        true
    }

    fn rmk_nospeci(&mut self, r: &'static RemarkTokens) -> bool {
        let Some(tok) = self.sc.accept(&r.nospeci) else {
            return false;
        };
        self.sc.record(&tok);
        self.report.remarks.nospeci = Some(Tagged {
            text: tok.text,
            span: tok.span,
        });
        true
    }

    /// FROPA qualifies a preceding wind shift; on its own it falls
    /// through to the any-token fallback.
    fn rmk_fropa(&mut self, r: &'static RemarkTokens) -> bool {
        if self.report.remarks.wind_shift.is_none() {
            return false;
        }
        let Some(tok) = self.sc.accept(&r.fropa) else {
            return false;
        };
        self.sc.record(&tok);
        if let Some(shift) = self.report.remarks.wind_shift.as_mut() {
            shift.fropa = true;
        }
        true
    }

    /// Greedily consume compass/distance words following a lightning or
    /// convection head token. Recording is left to the caller, which may
    /// still back out of the production.
    fn consume_location_words(
        &mut self,
        r: &'static RemarkTokens,
        head_span: iwxxm_common::Span,
    ) -> (Vec<Token>, String, iwxxm_common::Span) {
        let mut words: Vec<Token> = Vec::new();
        let mut span = head_span;
        while let Some(tok) = self.sc.accept(&r.locword) {
            span = span.merge(&tok.span);
            words.push(tok);
        }
        let phrase = words
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        (words, phrase, span)
    }

    /// Resolve an (hh)mm remark time against the issuance time; a peak
    /// wind or wind shift can never postdate the report.
    fn remark_clock_time(&self, hhmm: &str) -> Option<DateTime<Utc>> {
        let itime = self.report.issue_time.as_ref()?.time?;
        match hhmm.len() {
            2 => {
                let minute: u32 = hhmm.parse().ok()?;
                itime.with_minute(minute)
            }
            4 => {
                let hour: u32 = hhmm[..2].parse().ok()?;
                let minute: u32 = hhmm[2..].parse().ok()?;
                let mut t = itime
                    .date_naive()
                    .and_hms_opt(hour, minute, 0)?
                    .and_utc();
                if t > itime {
                    t -= Duration::days(1);
                }
                Some(t)
            }
            _ => None,
        }
    }

    /// Blank every recorded span out of a copy of the input; what is
    /// left before RMK is unparsed (an error), after RMK observer text.
    pub(crate) fn unparsed_pass(&mut self) {
        let input = self.sc.input();
        let mut buf = input.as_bytes().to_vec();
        for &(start, end) in self.sc.recorded_ranges() {
            for b in &mut buf[start..end] {
                *b = b' ';
            }
        }
        let remainder = String::from_utf8_lossy(&buf).into_owned();
        let (before, after) = match remainder.find("RMK") {
            Some(pos) => (&remainder[..pos], Some(&remainder[pos + 3..])),
            None => (remainder.as_str(), None),
        };
        let before = collapse(before);
        if !before.is_empty() {
            self.report.unparsed = Some(before);
        }
        if let Some(after) = after {
            let after = collapse(after);
            if !after.is_empty() {
                self.report.additive = Some(after);
            }
        }
    }
}

fn collapse(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn trimmed_concat(head: &str, rest: &str) -> String {
    if rest.is_empty() {
        head.to_string()
    } else {
        format!("{head} {rest}")
    }
}

/// "snnn" with a separate sign digit ('1' negative) to a tenths string.
fn tenths(digits: &str, sign: &str) -> Option<String> {
    let value: f64 = digits.parse().ok()?;
    let value = value * 0.1;
    Some(format!(
        "{:.1}",
        if sign == "1" { -value } else { value }
    ))
}

/// Hundredths-of-an-inch precipitation group; all zeros mean a trace.
fn precip_amount(tok: &Token, skip: usize, period: Option<u8>) -> PrecipAmount {
    let digits = &tok.text[skip..];
    let (value, trace) = match digits.parse::<i64>() {
        Ok(0) => (Some("0.01".to_string()), true),
        Ok(v) => (Some(format!("{:.2}", v as f64 * 0.01)), false),
        Err(_) => (None, false),
    };
    PrecipAmount {
        text: tok.text.clone(),
        span: tok.span,
        value,
        trace,
        period_hours: period,
    }
}

fn runway_designator(s: &str) -> Option<String> {
    let rest = s.strip_prefix("RWY").or_else(|| s.strip_prefix('R'))?;
    let rest = rest.trim_start();
    let digits: String = rest
        .chars()
        .take_while(|c| c.is_ascii_digit() || matches!(c, 'L' | 'C' | 'R'))
        .collect();
    if digits.chars().take(2).all(|c| c.is_ascii_digit()) && digits.len() >= 2 {
        Some(digits)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{runway_designator, tenths};

    #[test]
    fn test_tenths() {
        assert_eq!(tenths("217", "0"), Some("21.7".to_string()));
        assert_eq!(tenths("059", "1"), Some("-5.9".to_string()));
        assert_eq!(tenths("///", "0"), None);
    }

    #[test]
    fn test_runway_designator() {
        assert_eq!(runway_designator("RWY06"), Some("06".to_string()));
        assert_eq!(runway_designator("R24L"), Some("24L".to_string()));
        assert_eq!(runway_designator("NE"), None);
    }
}
