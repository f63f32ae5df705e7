//! TAF decoder tests: group structure, window arithmetic and states.

use chrono::{DateTime, TimeZone, Utc};
use tac_parser::taf::{decode, ChangeKind, TafState};

fn clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 12, 18, 0, 0).unwrap()
}

fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, minute, 0).unwrap()
}

const US_TAF: &str = "TAF AMD KDCA 121745Z 1218/1324 VRB04KT P6SM FEW040 SCT250 \
TX29/1220Z TN20/1311Z \
FM121900 16005KT P6SM -SHRA VCTS BKN040CB WS020/27045KT \
FM130100 12004KT 5SM -SHRA BKN040 \
PROB30 1306/1309 3SM -RA \
AMD LTD TO CLD VIS AND WIND TIL 130200=";

#[test]
fn test_prefix_and_identification() {
    let taf = decode(US_TAF, clock());
    assert_eq!(taf.err_msg, None);
    assert_eq!(taf.bbb, "AMD");
    assert_eq!(taf.ident.as_ref().unwrap().text, "KDCA");
    assert_eq!(taf.issue_time.unwrap(), at(12, 17, 45));
}

#[test]
fn test_overall_valid_period() {
    let taf = decode(US_TAF, clock());
    let valid = taf.valid.as_ref().unwrap();
    assert_eq!(valid.from.unwrap(), at(12, 18, 0));
    // End hour 24 rolls into the following day.
    assert_eq!(valid.to.unwrap(), at(14, 0, 0));
}

#[test]
fn test_group_structure() {
    let taf = decode(US_TAF, clock());
    assert_eq!(taf.groups.len(), 3);
    assert_eq!(taf.groups[0].prevailing.kind, ChangeKind::Fm);
    assert_eq!(taf.groups[1].prevailing.kind, ChangeKind::Fm);
    assert_eq!(taf.groups[2].prevailing.kind, ChangeKind::Fm);
    // The PROB group attaches to the enclosing prevailing condition.
    assert_eq!(taf.groups[2].occasional.len(), 1);
    assert_eq!(taf.groups[2].occasional[0].kind, ChangeKind::Prob);
}

#[test]
fn test_base_group_anchors_to_valid_period() {
    let taf = decode(US_TAF, clock());
    let base = &taf.groups[0].prevailing;
    let window = base.time.as_ref().unwrap();
    // The base condition starts no later than issuance.
    assert_eq!(window.from.unwrap(), at(12, 17, 45));
    // It ends where the first FM group begins.
    assert_eq!(window.to.unwrap(), at(12, 19, 0));
}

#[test]
fn test_fm_windows_chain_without_gaps() {
    let taf = decode(US_TAF, clock());
    let first = taf.groups[1].prevailing.time.as_ref().unwrap();
    let second = taf.groups[2].prevailing.time.as_ref().unwrap();
    assert_eq!(first.from.unwrap(), at(12, 19, 0));
    assert_eq!(first.to.unwrap(), second.from.unwrap());
    assert_eq!(second.from.unwrap(), at(13, 1, 0));
    // The last prevailing FM condition runs out the forecast period.
    assert_eq!(second.to.unwrap(), at(14, 0, 0));
}

#[test]
fn test_base_elements() {
    let taf = decode(US_TAF, clock());
    let base = &taf.groups[0].prevailing;
    assert_eq!(base.wind.as_ref().unwrap().dd, "VRB");
    assert_eq!(base.vsby.as_ref().unwrap().value, "7.00");
    assert_eq!(base.sky.as_ref().unwrap().text, "FEW040 SCT250");
    let temps = base.temp.as_ref().unwrap();
    assert_eq!(temps.max.as_ref().unwrap().value, "29");
    assert_eq!(temps.max.as_ref().unwrap().at.unwrap(), at(12, 20, 0));
    assert_eq!(temps.min.as_ref().unwrap().value, "20");
    assert_eq!(temps.min.as_ref().unwrap().at.unwrap(), at(13, 11, 0));
}

#[test]
fn test_low_level_wind_shear() {
    let taf = decode(US_TAF, clock());
    let llws = taf.groups[1].prevailing.llws.as_ref().unwrap();
    assert_eq!(llws.height, 20);
    assert_eq!(llws.dd, 270);
    assert_eq!(llws.ff, 45);
}

#[test]
fn test_prob_window_relative_to_period() {
    let taf = decode(US_TAF, clock());
    let prob = &taf.groups[2].occasional[0];
    let window = prob.time.as_ref().unwrap();
    assert_eq!(window.from.unwrap(), at(13, 6, 0));
    assert_eq!(window.to.unwrap(), at(13, 9, 0));
    assert_eq!(prob.vsby.as_ref().unwrap().value, "3.00");
    assert_eq!(prob.pcp.as_ref().unwrap().text, "-RA");
}

#[test]
fn test_amendment_clause_captured_verbatim() {
    let taf = decode(US_TAF, clock());
    assert_eq!(
        taf.amd.as_ref().unwrap().text,
        "AMD LTD TO CLD VIS AND WIND TIL 130200"
    );
}

#[test]
fn test_nil_taf() {
    let taf = decode("TAF KXYZ 121745Z NIL=", clock());
    assert_eq!(taf.state, TafState::Nil);
    assert!(taf.groups.is_empty());
    assert_eq!(taf.issue_time.unwrap(), at(12, 17, 45));
}

#[test]
fn test_cancelled_taf_collapses_window() {
    let taf = decode("TAF KORD 121745Z 1218/1324 CNL=", clock());
    assert_eq!(taf.state, TafState::Canceled);
    assert!(taf.groups.is_empty());
    // The original period survives as the previous time; the current
    // window collapses to start at issuance.
    let prev = taf.prev_valid.as_ref().unwrap();
    assert_eq!(prev.from.unwrap(), at(12, 18, 0));
    assert_eq!(taf.valid.as_ref().unwrap().from.unwrap(), at(12, 17, 45));
    assert_eq!(taf.valid.as_ref().unwrap().to.unwrap(), at(14, 0, 0));
}

#[test]
fn test_becmg_keeps_own_window() {
    let taf = decode(
        "EGLL 121100Z 1212/1318 24010KT 9999 SCT030 BECMG 1218/1221 4000 RA BKN012",
        clock(),
    );
    assert_eq!(taf.err_msg, None);
    assert_eq!(taf.groups.len(), 2);
    let becmg = &taf.groups[1].prevailing;
    assert_eq!(becmg.kind, ChangeKind::Becmg);
    let window = becmg.time.as_ref().unwrap();
    assert_eq!(window.from.unwrap(), at(12, 18, 0));
    assert_eq!(window.to.unwrap(), at(12, 21, 0));
}

#[test]
fn test_missing_prefix_defaults_bbb() {
    let taf = decode("EGLL 121100Z 1212/1318 24010KT 9999 SCT030", clock());
    assert_eq!(taf.bbb, " ");
    assert_eq!(taf.ident.as_ref().unwrap().text, "EGLL");
}

#[test]
fn test_legacy_valid_period_form() {
    let taf = decode("EGLL 121100Z 121221 24010KT 9999 SCT030", clock());
    let valid = taf.valid.as_ref().unwrap();
    assert_eq!(valid.from.unwrap(), at(12, 12, 0));
    assert_eq!(valid.to.unwrap(), at(12, 21, 0));
}

#[test]
fn test_metre_visibility_sentinel() {
    let taf = decode("EGLL 121100Z 1212/1318 24010KT 9999 SCT030", clock());
    assert_eq!(
        taf.groups[0].prevailing.vsby.as_ref().unwrap().value,
        "10000"
    );
}

#[test]
fn test_structural_failure_sets_err_msg() {
    let taf = decode("TAF KORD 121745Z", clock());
    assert!(taf.err_msg.is_some());
    assert_eq!(taf.ident.as_ref().unwrap().text, "KORD");
}

#[test]
fn test_group_day_rollover() {
    // A TEMPO window whose start day precedes the period start belongs
    // to the following month.
    let taf = decode(
        "EGLL 311100Z 3112/0118 24010KT 9999 SCT030 TEMPO 0112/0118 4000 RA",
        Utc.with_ymd_and_hms(2024, 3, 31, 11, 0, 0).unwrap(),
    );
    assert_eq!(taf.err_msg, None);
    let tempo = &taf.groups[0].occasional[0];
    let window = tempo.time.as_ref().unwrap();
    assert_eq!(
        window.from.unwrap(),
        Utc.with_ymd_and_hms(2024, 4, 1, 12, 0, 0).unwrap()
    );
}
