//! TAF decoder.
//!
//! Same architecture as the METAR decoders: ordered-choice scanner,
//! per-group context switching, typed record out. A TAF is an ordered
//! list of groups; the first is the base forecast anchored to the
//! overall valid period, each later FM/BECMG group opens a new
//! prevailing condition (closing the previous FM window), and
//! TEMPO/PROB groups attach to the enclosing prevailing group as
//! occasional conditions.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use iwxxm_common::time::{nearest_time, on_or_after};
use iwxxm_common::{LengthUnit, Span, Station};
use serde::Serialize;

use crate::report::{Tagged, Wind};
use crate::scanner::Scanner;
use crate::tokens::TafTokens;

/// Overall disposition of the forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TafState {
    Normal,
    /// NIL: identification and time only.
    Nil,
    /// CNL: the original period is preserved as the previous time and
    /// the current window collapses to zero length at issuance.
    Canceled,
}

/// Change-group qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangeKind {
    Fm,
    Becmg,
    Tempo,
    Prob,
}

/// A validity window with its source text.
#[derive(Debug, Clone, Serialize)]
pub struct TafWindow {
    pub text: String,
    pub span: Span,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Forecast visibility: a table-normalized statute-mile value or whole
/// metres.
#[derive(Debug, Clone, Serialize)]
pub struct TafVisibility {
    pub text: String,
    pub span: Span,
    pub value: String,
    pub unit: LengthUnit,
}

#[derive(Debug, Clone, Serialize)]
pub struct TempExtreme {
    pub value: String,
    pub at: Option<DateTime<Utc>>,
}

/// TX/TN forecast temperature extremes with their valid times.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TafTemps {
    pub text: String,
    pub spans: Vec<Span>,
    pub max: Option<TempExtreme>,
    pub min: Option<TempExtreme>,
}

/// Non-convective low-level wind shear (WShhh/dddffKT).
#[derive(Debug, Clone, Serialize)]
pub struct Llws {
    pub text: String,
    pub span: Span,
    /// Layer top in hundreds of feet.
    pub height: u32,
    pub dd: u32,
    pub ff: u32,
}

/// One forecast condition: the elements valid over one window.
#[derive(Debug, Clone, Serialize)]
pub struct TafPeriod {
    pub kind: ChangeKind,
    pub time: Option<TafWindow>,
    pub cavok: bool,
    pub wind: Option<Wind>,
    pub vsby: Option<TafVisibility>,
    pub pcp: Option<Tagged>,
    pub obv: Option<Tagged>,
    pub vcnty: Option<Tagged>,
    pub nsw: Option<Tagged>,
    pub sky: Option<Tagged>,
    pub temp: Option<TafTemps>,
    pub llws: Option<Llws>,
}

impl Default for TafPeriod {
    fn default() -> Self {
        TafPeriod {
            kind: ChangeKind::Fm,
            time: None,
            cavok: false,
            wind: None,
            vsby: None,
            pcp: None,
            obv: None,
            vcnty: None,
            nsw: None,
            sky: None,
            temp: None,
            llws: None,
        }
    }
}

/// A prevailing condition plus the occasional (TEMPO/PROB) conditions
/// embedded in it.
#[derive(Debug, Clone, Serialize)]
pub struct TafGroup {
    pub prevailing: TafPeriod,
    pub occasional: Vec<TafPeriod>,
}

/// The decoded TAF record.
#[derive(Debug, Clone, Serialize)]
pub struct TafReport {
    /// The TAF prefix line, when present ("TAF", "TAF AMD", ...).
    pub kind: Option<Tagged>,
    /// WMO BBB indicator letter recovered from the prefix; a blank for
    /// a routine issuance.
    pub bbb: String,
    pub ident: Option<Tagged>,
    pub issue_time: Option<DateTime<Utc>>,
    /// The overall valid period.
    pub valid: Option<TafWindow>,
    /// Original valid period of a cancelled TAF.
    pub prev_valid: Option<TafWindow>,
    pub state: TafState,
    pub groups: Vec<TafGroup>,
    /// Raw amendment-limitation clause; interpreted at encode time.
    pub amd: Option<Tagged>,
    pub station: Option<Station>,
    pub err_msg: Option<String>,
    pub translation_time: DateTime<Utc>,
}

impl TafReport {
    fn new(now: DateTime<Utc>) -> Self {
        TafReport {
            kind: None,
            bbb: " ".to_string(),
            ident: None,
            issue_time: None,
            valid: None,
            prev_valid: None,
            state: TafState::Normal,
            groups: Vec::new(),
            amd: None,
            station: None,
            err_msg: None,
            translation_time: now,
        }
    }
}

/// Decode a TAF. Never fails: a report that cannot be fully parsed is
/// returned with `err_msg` set and whatever was recovered.
pub fn decode(raw: &str, now: DateTime<Utc>) -> TafReport {
    let mut text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if let Some(i) = text.find("RMK") {
        if i > 0 {
            text.truncate(i);
        }
    }
    text = text.replace('=', "");
    let text = text.trim().to_string();
    tracing::debug!(forecast = %text, "decoding TAF");

    let mut parser = TafParser {
        sc: Scanner::new(&text),
        toks: TafTokens::get(),
        now,
        taf: TafReport::new(now),
        group: TafPeriod::default(),
    };
    match parser.parse() {
        Ok(()) => parser.finish(),
        Err(Fail) => parser.taf.err_msg = Some(parser.sc.err_msg()),
    }
    parser.taf
}

type PResult = Result<(), Fail>;
struct Fail;

struct TafParser<'a> {
    sc: Scanner<'a>,
    toks: &'static TafTokens,
    now: DateTime<Utc>,
    taf: TafReport,
    /// The condition being filled; flushed by `add_group`.
    group: TafPeriod,
}

impl TafParser<'_> {
    fn parse(&mut self) -> PResult {
        self.try_prefix();
        self.p_ident()?;
        self.try_itime();
        if self.sc.accept(&self.toks.nil).is_some() {
            self.taf.state = TafState::Nil;
            return Ok(());
        }
        self.p_vtime()?;
        if self.sc.accept(&self.toks.cnl).is_some() {
            self.taf.state = TafState::Canceled;
            return Ok(());
        }
        self.p_weather()?;
        self.add_group(ChangeKind::Fm);

        loop {
            if self.try_becmg_time() {
                self.p_weather()?;
                self.add_group(ChangeKind::Becmg);
            } else if self.try_tempo_time() {
                self.p_weather()?;
                self.add_group(ChangeKind::Tempo);
            } else if self.try_prob_time() {
                self.p_weather()?;
                self.add_group(ChangeKind::Prob);
            } else if self.try_fm_time() {
                self.p_weather()?;
                self.add_group(ChangeKind::Fm);
            } else {
                break;
            }
        }
        // Trailing unidentified tokens are dropped, not fatal.
        while let Some(tok) = self.sc.accept(&self.toks.any) {
            tracing::debug!(token = %tok.text, "ignoring trailing TAF token");
        }
        Ok(())
    }

    fn finish(&mut self) {
        if self.taf.issue_time.is_none() {
            self.taf.issue_time = self.taf.valid.as_ref().and_then(|v| v.from);
        }
        match self.taf.state {
            TafState::Nil => {}
            TafState::Canceled => {
                self.taf.groups.clear();
                self.taf.prev_valid = self.taf.valid.clone();
                let issued = self.taf.issue_time;
                if let Some(valid) = self.taf.valid.as_mut() {
                    valid.from = issued;
                }
            }
            TafState::Normal => {
                // The last prevailing FM condition runs to the end of
                // the forecast period.
                let period_end = self.taf.valid.as_ref().and_then(|v| v.to);
                if let Some(group) = self.taf.groups.last_mut() {
                    if group.prevailing.kind == ChangeKind::Fm {
                        if let Some(time) = group.prevailing.time.as_mut() {
                            time.to = period_end;
                        }
                    }
                }
            }
        }
    }

    /// Close out the current condition under the given qualifier.
    fn add_group(&mut self, kind: ChangeKind) {
        let mut period = std::mem::take(&mut self.group);
        period.kind = kind;
        match kind {
            ChangeKind::Fm | ChangeKind::Becmg => {
                // A new FM condition supersedes the previous prevailing
                // one from its start time.
                if kind == ChangeKind::Fm {
                    let start = period.time.as_ref().and_then(|t| t.from);
                    if let (Some(start), Some(last)) = (start, self.taf.groups.last_mut()) {
                        if let Some(time) = last.prevailing.time.as_mut() {
                            time.to = Some(start);
                        }
                    }
                }
                self.taf.groups.push(TafGroup {
                    prevailing: period,
                    occasional: Vec::new(),
                });
            }
            ChangeKind::Tempo | ChangeKind::Prob => {
                if let Some(last) = self.taf.groups.last_mut() {
                    last.occasional.push(period);
                }
            }
        }
    }

    fn try_prefix(&mut self) {
        if let Some(tok) = self.sc.accept(&self.toks.prefix) {
            if let Some(indicator) = tok.text.split_whitespace().nth(1) {
                self.taf.bbb = indicator.to_string();
            }
            self.taf.kind = Some(Tagged {
                text: tok.text,
                span: tok.span,
            });
        }
    }

    fn p_ident(&mut self) -> PResult {
        let tok = self.sc.accept(&self.toks.ident).ok_or(Fail)?;
        self.taf.ident = Some(Tagged {
            text: tok.text,
            span: tok.span,
        });
        Ok(())
    }

    fn try_itime(&mut self) {
        if let Some(tok) = self.sc.accept(&self.toks.itime) {
            let day: u32 = tok.text[..2].parse().unwrap_or(0);
            let hour: u32 = tok.text[2..4].parse().unwrap_or(99);
            let minute: u32 = tok.text[4..6].parse().unwrap_or(99);
            self.taf.issue_time = nearest_time(self.now, day, hour, minute);
        }
    }

    fn p_vtime(&mut self) -> PResult {
        let tok = self.sc.accept(&self.toks.vtime).ok_or(Fail)?;
        let s = &tok.text;
        let (from, to) = if s.len() == 9 {
            let day: u32 = s[..2].parse().unwrap_or(0);
            let start_hour: u32 = s[2..4].parse().unwrap_or(99);
            let end_day: u32 = s[5..7].parse().unwrap_or(0);
            let end_hour: u32 = s[7..9].parse().unwrap_or(99);
            let from = nearest_time(self.now, day, start_hour, 0);
            let to = from.and_then(|f| on_or_after(f, end_day, end_hour));
            (from, to)
        } else {
            // Legacy ddhhhh form: start hour to end hour, same day or
            // rolling past midnight.
            let day: u32 = s[..2].parse().unwrap_or(0);
            let start_hour: u32 = s[2..4].parse().unwrap_or(99);
            let end_hour: i64 = s[4..6].parse().unwrap_or(0);
            let from = nearest_time(self.now, day, start_hour, 0);
            let mut period = end_hour - start_hour as i64;
            if period <= 0 {
                period += 24;
            }
            (from, from.map(|f| f + Duration::hours(period)))
        };

        self.taf.valid = Some(TafWindow {
            text: s.clone(),
            span: tok.span,
            from,
            to,
        });
        // The base condition starts no later than issuance.
        let base_from = match (from, self.taf.issue_time) {
            (Some(f), Some(i)) => Some(f.min(i)),
            _ => from,
        };
        self.group.time = Some(TafWindow {
            text: s.clone(),
            span: tok.span,
            from: base_from,
            to,
        });
        Ok(())
    }

    fn try_fm_time(&mut self) -> bool {
        let Some(tok) = self.sc.accept(&self.toks.ftime) else {
            return false;
        };
        let day: u32 = tok.text[2..4].parse().unwrap_or(0);
        let hour: u32 = tok.text[4..6].parse().unwrap_or(99);
        let minute: u32 = tok.text[6..8].parse().unwrap_or(99);
        let from = self.fm_instant(day, hour, minute);
        let to = self.taf.valid.as_ref().and_then(|v| v.to);
        self.group.time = Some(TafWindow {
            text: tok.text,
            span: tok.span,
            from,
            to,
        });
        true
    }

    /// Resolve an FM day/hour/minute inside the valid period; a time
    /// more than 30 minutes before the period start belongs to the
    /// following month.
    fn fm_instant(&self, day: u32, hour: u32, minute: u32) -> Option<DateTime<Utc>> {
        let base = self.taf.valid.as_ref()?.from?;
        if hour > 23 || minute > 59 {
            return None;
        }
        let in_month = |year: i32, month: u32| {
            Utc.with_ymd_and_hms(year, month, day, hour, minute, 0).single()
        };
        let mut t = in_month(base.year(), base.month())?;
        if t <= base - Duration::minutes(30) {
            let (year, month) = if base.month() == 12 {
                (base.year() + 1, 1)
            } else {
                (base.year(), base.month() + 1)
            };
            if let Some(rolled) = in_month(year, month) {
                t = rolled;
            }
        }
        Some(t)
    }

    fn try_becmg_time(&mut self) -> bool {
        let Some(tok) = self.sc.accept(&self.toks.btime) else {
            return false;
        };
        self.store_window(tok.text, tok.span);
        true
    }

    fn try_tempo_time(&mut self) -> bool {
        let Some(tok) = self.sc.accept(&self.toks.ttime) else {
            return false;
        };
        self.store_window(tok.text, tok.span);
        true
    }

    fn try_prob_time(&mut self) -> bool {
        let Some(tok) = self.sc.accept(&self.toks.ptime) else {
            return false;
        };
        self.store_window(tok.text, tok.span);
        true
    }

    /// d1h1/d2h2 windows are relative to the period start, with day and
    /// month rollover when the group time precedes it.
    fn store_window(&mut self, text: String, span: Span) {
        let digits = text.split_whitespace().last().unwrap_or("");
        let (from, to) = if digits.len() == 9 {
            let start_day: u32 = digits[..2].parse().unwrap_or(0);
            let start_hour: u32 = digits[2..4].parse().unwrap_or(99);
            let end_day: u32 = digits[5..7].parse().unwrap_or(0);
            let end_hour: u32 = digits[7..9].parse().unwrap_or(99);
            let base = self.taf.valid.as_ref().and_then(|v| v.from);
            let from = base.and_then(|b| on_or_after(b, start_day, start_hour));
            let to = from.and_then(|f| on_or_after(f, end_day, end_hour));
            (from, to)
        } else {
            (None, None)
        };
        self.group.time = Some(TafWindow {
            text,
            span,
            from,
            to,
        });
    }

    /// (Wind|Cavok|Vsby|Pcp|Obv|Vcnty|Nsw|Sky|Temp|LLWS|Amd)+
    fn p_weather(&mut self) -> PResult {
        let mut matched = 0usize;
        loop {
            if let Some(tok) = self.sc.accept(&self.toks.wind) {
                self.group.wind = Some(Wind::parse(tok.text, tok.span));
            } else if self.sc.accept(&self.toks.cavok).is_some() {
                self.group.cavok = true;
            } else if let Some(tok) = self.sc.accept(&self.toks.vsby) {
                self.group.vsby = Some(parse_visibility(tok.text, tok.span));
            } else if let Some(tok) = self.sc.accept(&self.toks.pcp) {
                self.group.pcp = Some(Tagged {
                    text: tok.text,
                    span: tok.span,
                });
            } else if let Some(tok) = self.sc.accept(&self.toks.obv) {
                self.group.obv = Some(Tagged {
                    text: tok.text,
                    span: tok.span,
                });
            } else if let Some(tok) = self.sc.accept(&self.toks.vcnty) {
                self.group.vcnty = Some(Tagged {
                    text: tok.text,
                    span: tok.span,
                });
            } else if let Some(tok) = self.sc.accept(&self.toks.nsw) {
                self.group.nsw = Some(Tagged {
                    text: tok.text,
                    span: tok.span,
                });
            } else if let Some(tok) = self.sc.accept(&self.toks.sky) {
                self.group.sky = Some(Tagged {
                    text: tok.text,
                    span: tok.span,
                });
            } else if let Some(tok) = self.sc.accept(&self.toks.temp) {
                self.store_temp(tok.text, tok.span);
            } else if let Some(tok) = self.sc.accept(&self.toks.llws) {
                self.store_llws(tok.text, tok.span);
            } else if let Some(tok) = self.sc.accept(&self.toks.amd) {
                self.taf.amd = Some(Tagged {
                    text: tok.text,
                    span: tok.span,
                });
            } else {
                break;
            }
            matched += 1;
        }
        if matched == 0 {
            Err(Fail)
        } else {
            Ok(())
        }
    }

    fn store_temp(&mut self, text: String, span: Span) {
        let is_max = text.as_bytes().get(1) == Some(&b'X');
        let (value_part, stamp) = match text.split_once('/') {
            Some(pair) => pair,
            None => return,
        };
        let value = value_part[2..].trim().replace('M', "-");
        let stamp = stamp.trim();
        let day: u32 = stamp[..2].parse().unwrap_or(0);
        let hour: u32 = stamp[2..4].parse().unwrap_or(99);
        let at = self
            .taf
            .valid
            .as_ref()
            .and_then(|v| v.from)
            .and_then(|base| on_or_after(base, day, hour));

        let temps = self.group.temp.get_or_insert_with(TafTemps::default);
        if temps.text.is_empty() {
            temps.text = text;
        } else {
            temps.text = format!("{} {}", temps.text, text);
        }
        temps.spans.push(span);
        let extreme = TempExtreme { value, at };
        if is_max {
            temps.max = Some(extreme);
        } else {
            temps.min = Some(extreme);
        }
    }

    fn store_llws(&mut self, text: String, span: Span) {
        let height: u32 = text[2..5].parse().unwrap_or(0);
        let dd: u32 = text[6..9].parse().unwrap_or(0);
        let ff: u32 = text[9..text.len() - 2].parse().unwrap_or(0);
        self.group.llws = Some(Llws {
            text,
            span,
            height,
            dd,
            ff,
        });
    }
}

/// Normalize a forecast visibility token. Statute-mile values reduce to
/// a decimal-mile string ("P6SM" is the 7.00 at-or-above sentinel);
/// metre values pass through with 9999 promoted to the 10000 sentinel.
fn parse_visibility(text: String, span: Span) -> TafVisibility {
    if let Some(miles) = text.strip_suffix("SM") {
        let value = match miles.split_whitespace().collect::<Vec<_>>().join(" ").as_str() {
            "P6" => "7.00".to_string(),
            "1/4" => "0.25".to_string(),
            "1/2" => "0.50".to_string(),
            "3/4" => "0.75".to_string(),
            "1 1/4" | "11/4" => "1.25".to_string(),
            "1 1/2" | "11/2" => "1.50".to_string(),
            "1 3/4" | "13/4" => "1.75".to_string(),
            whole => match whole.parse::<f64>() {
                Ok(v) if v <= 6.0 => format!("{v:.2}"),
                _ => "7.00".to_string(),
            },
        };
        TafVisibility {
            text,
            span,
            value,
            unit: LengthUnit::StatuteMiles,
        }
    } else {
        let value = if text == "9999" {
            "10000".to_string()
        } else {
            text.clone()
        };
        TafVisibility {
            text,
            span,
            value,
            unit: LengthUnit::Metres,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iwxxm_common::Span;

    fn span() -> Span {
        Span::from_offsets("x", 0, 1)
    }

    #[test]
    fn test_parse_visibility_p6sm() {
        let v = parse_visibility("P6SM".to_string(), span());
        assert_eq!(v.value, "7.00");
        assert_eq!(v.unit, LengthUnit::StatuteMiles);
    }

    #[test]
    fn test_parse_visibility_fraction() {
        let v = parse_visibility("1 1/2SM".to_string(), span());
        assert_eq!(v.value, "1.50");
    }

    #[test]
    fn test_parse_visibility_metres_sentinel() {
        let v = parse_visibility("9999".to_string(), span());
        assert_eq!(v.value, "10000");
        assert_eq!(v.unit, LengthUnit::Metres);
    }
}
