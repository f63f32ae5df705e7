//! FMH-1 METAR/SPECI decoder tests: main-section overrides, the remarks
//! grammar and the unparsed/additive post-pass.

use chrono::{DateTime, TimeZone, Utc};
use iwxxm_common::LengthUnit;
use tac_parser::decode_fmh1;
use tac_parser::report::{DistanceClass, Report};

fn clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 20, 0, 0).unwrap()
}

const US_REPORT: &str = "METAR KORD 011955Z COR 19015G25KT 160V230 1 1/2SM \
R28R/2600FT R27L/1000V4000FT TSRA BR FEW015 BKN040CB 22/21 A2992 RMK AO2 \
PK WND 20032/25 WSHFT 1730 FROPA TSB32RAB32 SLP993 FRQ LTGICCG DSNT SW \
CB W MOV E P0009 T02280206 10228 20206 58033 PNO $";

fn decode(raw: &str) -> Report {
    decode_fmh1(raw, clock())
}

#[test]
fn test_us_report_decodes_cleanly() {
    let report = decode(US_REPORT);
    assert_eq!(report.err_msg, None);
    assert_eq!(report.ident.as_ref().unwrap().text, "KORD");
    assert!(report.correction.is_some());
}

#[test]
fn test_main_section_elements() {
    let report = decode(US_REPORT);
    let wind = report.wx.wind.as_ref().unwrap();
    assert_eq!(wind.dd, "190");
    assert_eq!(wind.gg.as_deref(), Some("25"));
    assert_eq!(wind.ccw.as_deref(), Some("160"));
    assert_eq!(report.wx.vsby.as_ref().unwrap().value, "1.50");
    assert_eq!(report.temps.as_ref().unwrap().text, "22/21");
    assert_eq!(report.altimeter.as_ref().unwrap().value, "29.92");
}

#[test]
fn test_rvr_feet_and_variable_rvr() {
    let report = decode(US_REPORT);
    let rvr = report.rvr.as_ref().unwrap();
    assert_eq!(rvr.runway, vec!["28R"]);
    assert_eq!(rvr.mean, vec!["2600"]);
    assert_eq!(rvr.unit, vec![LengthUnit::Feet]);

    let vrb = report.variable_rvr.as_ref().unwrap();
    assert_eq!(vrb.runway, vec!["27L"]);
    assert_eq!(vrb.lo, vec!["1000"]);
    assert_eq!(vrb.hi, vec!["4000"]);
    assert_eq!(vrb.unit, vec![LengthUnit::Feet]);
}

#[test]
fn test_peak_wind_and_wind_shift() {
    let report = decode(US_REPORT);
    let peak = report.remarks.peak_wind.as_ref().unwrap();
    assert_eq!(peak.dd, "200");
    assert_eq!(peak.ff, "32");
    // A two-digit time is minutes past the issuance hour.
    assert_eq!(
        peak.time.unwrap(),
        Utc.with_ymd_and_hms(2024, 3, 1, 19, 25, 0).unwrap()
    );

    let shift = report.remarks.wind_shift.as_ref().unwrap();
    assert_eq!(
        shift.time.unwrap(),
        Utc.with_ymd_and_hms(2024, 3, 1, 17, 30, 0).unwrap()
    );
    assert!(shift.fropa);
}

#[test]
fn test_sea_level_pressure() {
    let report = decode(US_REPORT);
    let slp = report.remarks.slp.as_ref().unwrap();
    assert_eq!(slp.value, Some(999.3));
    assert!(!slp.corrected);
}

#[test]
fn test_sea_level_pressure_decade_correction() {
    // 962.5 hPa at -30 degrees and near-calm wind reads as a mistaken
    // record high: the alternate decade is substituted and flagged.
    let report = decode("METAR PAFA 011955Z 18003KT 10SM CLR M30/M34 A3050 RMK SLP625");
    let slp = report.remarks.slp.as_ref().unwrap();
    assert_eq!(slp.value, Some(1062.5));
    assert!(slp.corrected);
}

#[test]
fn test_temperature_decile_overrides_whole_degrees() {
    let report = decode(US_REPORT);
    let temps = report.temps.as_ref().unwrap();
    assert_eq!(temps.air.as_deref(), Some("22.8"));
    assert_eq!(temps.dewpoint.as_deref(), Some("20.6"));
}

#[test]
fn test_hourly_precipitation_and_tendency() {
    let report = decode(US_REPORT);
    let pcpn = report.remarks.pcpn1h.as_ref().unwrap();
    assert_eq!(pcpn.value.as_deref(), Some("0.09"));
    assert!(!pcpn.trace);

    let tendency = report.remarks.pressure_tendency.as_ref().unwrap();
    assert_eq!(tendency.character, '8');
    assert_eq!(tendency.change.as_deref(), Some("3.3"));
}

#[test]
fn test_trace_precipitation() {
    let report = decode("METAR KSEA 011953Z 18004KT 10SM OVC015 12/10 A3001 RMK AO2 P0000");
    let pcpn = report.remarks.pcpn1h.as_ref().unwrap();
    assert!(pcpn.trace);
    assert_eq!(pcpn.value.as_deref(), Some("0.01"));
}

#[test]
fn test_six_hour_extremes_merge() {
    let report = decode(US_REPORT);
    let extremes = report.remarks.maxmin6h.as_ref().unwrap();
    assert_eq!(extremes.period_hours, 6);
    assert_eq!(extremes.max.as_deref(), Some("22.8"));
    assert_eq!(extremes.min.as_deref(), Some("20.6"));
}

#[test]
fn test_lightning_remark() {
    let report = decode(US_REPORT);
    let ltg = &report.remarks.lightning[0];
    assert_eq!(ltg.frequency.as_deref(), Some("FRQ"));
    assert_eq!(ltg.types, vec!["CG", "IC"]);
    let (class, sectors) = &ltg.locations[0];
    assert_eq!(*class, DistanceClass::Distant);
    assert_eq!(sectors[0].ccw, 202.5);
    assert_eq!(sectors[0].cw, 247.5);
}

#[test]
fn test_convection_remark_with_movement() {
    let report = decode(US_REPORT);
    let convection = &report.remarks.convection[0];
    assert_eq!(convection.cloud_type, "CB");
    assert_eq!(convection.movement.as_deref(), Some("E"));
    let (class, sectors) = &convection.locations[0];
    assert_eq!(*class, DistanceClass::AtStation);
    assert_eq!(sectors[0].ccw, 247.5);
}

#[test]
fn test_sensor_outage_and_maintenance() {
    let report = decode(US_REPORT);
    let status = report.remarks.sensor_status.as_ref().unwrap();
    assert_eq!(status.sensors[0].0, "none");
    assert_eq!(status.sensors[0].1, vec!["PNO"]);
    assert!(report.remarks.maintenance.is_some());
}

#[test]
fn test_sensor_outage_with_runway_location() {
    let report =
        decode("METAR KBOS 011954Z 04012KT 10SM SCT025 14/07 A2999 RMK AO2 VISNO RWY04");
    let status = report.remarks.sensor_status.as_ref().unwrap();
    assert_eq!(status.sensors[0].0, "R04");
    assert_eq!(status.sensors[0].1, vec!["VISNO"]);
}

#[test]
fn test_additive_holds_only_post_rmk_text() {
    let report = decode(US_REPORT);
    // The precipitation-history group has no production; it survives in
    // the observer text, never discarded.
    assert_eq!(report.additive.as_deref(), Some("TSB32RAB32"));
    assert!(report.unparsed.is_none());
}

#[test]
fn test_unparsed_field_absent_when_everything_matches() {
    let report = decode("METAR KSEA 011953Z 18004KT 10SM OVC015 12/10 A3001 RMK AO2 SLP134");
    assert!(report.unparsed.is_none());
    assert!(report.additive.is_none());
}

#[test]
fn test_junk_before_rmk_is_a_decode_error() {
    let report = decode("METAR KSEA 011953Z 18004KT 10SM OVC015 12/10 A3001 BOGUS RMK AO2");
    assert!(report.err_msg.is_some());
    // Identification survives the failure.
    assert_eq!(report.ident.as_ref().unwrap().text, "KSEA");
}

#[test]
fn test_observing_system_type() {
    let report = decode(US_REPORT);
    assert_eq!(report.remarks.ostype.as_ref().unwrap().text, "AO2");
}

#[test]
fn test_whole_mile_visibility() {
    let report = decode("METAR KSEA 011953Z 18004KT 10SM OVC015 12/10 A3001");
    let vsby = report.wx.vsby.unwrap();
    assert_eq!(vsby.value, "10.00");
    assert_eq!(vsby.unit, LengthUnit::StatuteMiles);
}

#[test]
fn test_main_section_fully_optional() {
    let report = decode("METAR KSEA 011953Z RMK AO2");
    assert_eq!(report.err_msg, None);
    assert!(report.wx.wind.is_none());
    assert_eq!(report.remarks.ostype.as_ref().unwrap().text, "AO2");
}

#[test]
fn test_six_hour_precipitation_period_from_cycle() {
    let report = decode("METAR KSEA 011753Z 18004KT 10SM OVC015 12/10 A3001 RMK AO2 60015");
    let pcpn = report.remarks.pcpn6h.as_ref().unwrap();
    assert_eq!(pcpn.period_hours, Some(6));
    assert_eq!(pcpn.value.as_deref(), Some("0.15"));

    let report = decode("METAR KSEA 011453Z 18004KT 10SM OVC015 12/10 A3001 RMK AO2 60015");
    assert_eq!(
        report.remarks.pcpn6h.as_ref().unwrap().period_hours,
        Some(3)
    );
}
