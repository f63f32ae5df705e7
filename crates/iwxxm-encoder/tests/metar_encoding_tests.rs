//! Annex 3 and FMH-1 METAR encoding tests.

mod common;

use common::{clock, config, registry};
use iwxxm_common::{Station, XmlElement};
use tac_parser::{decode_annex3, decode_fmh1};
use iwxxm_encoder::MetarEncoder;

fn encoder() -> MetarEncoder {
    MetarEncoder::new(registry(), config())
}

fn children_named<'a>(el: &'a XmlElement, name: &str) -> Vec<&'a XmlElement> {
    el.children().iter().filter(|c| c.name() == name).collect()
}

const FULL_REPORT: &str = "METAR LFPG 121030Z 24015G27KT 210V280 1400 R27L/0800U \
R09R/P1500 +SHRA BR VCTS FEW015 SCT030CB 10/08 Q1013 RETS WS R27L W15/S4 \
R27L/590230";

fn encode(raw: &str) -> XmlElement {
    let mut report = decode_annex3(raw, clock());
    report.station = Some(Station {
        name: Some("Paris Charles de Gaulle".to_string()),
        alternate: None,
        latitude: 49.01,
        longitude: 2.55,
        elevation: Some(119.0),
    });
    encoder().encode_annex3(&report, raw)
}

#[test]
fn test_document_root_and_metadata() {
    let doc = encode(FULL_REPORT);
    assert_eq!(doc.name(), "iwxxm:METAR");
    assert_eq!(
        doc.get("xsi:schemaLocation"),
        Some("http://icao.int/iwxxm/3.0 https://schemas.wmo.int/iwxxm/3.0/iwxxm.xsd")
    );
    assert_eq!(doc.get("reportStatus"), Some("NORMAL"));
    assert_eq!(doc.get("automatedStation"), Some("false"));
    assert_eq!(doc.get("permissibleUsage"), Some("OPERATIONAL"));
    assert_eq!(doc.get("translationCentreDesignator"), Some("KWNO"));
    assert_eq!(doc.get("translationTime"), Some("2024-03-12T11:00:00Z"));
    assert!(doc.get("gml:id").unwrap().starts_with("uuid."));
}

#[test]
fn test_observation_time_references_issue_time() {
    let doc = encode(FULL_REPORT);
    let instant = doc.find("iwxxm:issueTime/gml:TimeInstant").unwrap();
    let id = instant.get("gml:id").unwrap();
    let obs_time = doc.find("iwxxm:observationTime").unwrap();
    assert_eq!(obs_time.get("xlink:href").unwrap(), format!("#{id}"));
}

#[test]
fn test_aerodrome_block() {
    let doc = encode(FULL_REPORT);
    let slice = doc
        .find("iwxxm:aerodrome/aixm:AirportHeliport/aixm:timeSlice/aixm:AirportHeliportTimeSlice")
        .unwrap();
    assert_eq!(slice.find("aixm:designator").unwrap().text(), Some("LFPG"));
    assert_eq!(
        slice.find("aixm:locationIndicatorICAO").unwrap().text(),
        Some("LFPG")
    );
    assert_eq!(
        slice.find("aixm:name").unwrap().text(),
        Some("PARIS CHARLES DE GAULLE")
    );
    let pos = slice.find("aixm:ARP/aixm:ElevatedPoint/gml:pos").unwrap();
    assert_eq!(pos.text(), Some("49.01 2.55"));
}

#[test]
fn test_observation_body_elements() {
    let doc = encode(FULL_REPORT);
    let obs = doc
        .find("iwxxm:observation/iwxxm:MeteorologicalAerodromeObservation")
        .unwrap();
    assert_eq!(obs.get("cloudAndVisibilityOK"), Some("false"));
    assert_eq!(obs.find("iwxxm:airTemperature").unwrap().text(), Some("10"));
    assert_eq!(obs.find("iwxxm:qnh").unwrap().text(), Some("1013"));

    let wind = obs
        .find("iwxxm:surfaceWind/iwxxm:AerodromeSurfaceWind")
        .unwrap();
    assert_eq!(wind.get("variableWindDirection"), Some("true"));
    assert_eq!(
        wind.find("iwxxm:meanWindDirection").unwrap().text(),
        Some("240")
    );
    assert_eq!(wind.find("iwxxm:meanWindSpeed").unwrap().text(), Some("15"));
    assert_eq!(wind.find("iwxxm:windGustSpeed").unwrap().text(), Some("27"));
    assert_eq!(
        wind.find("iwxxm:extremeClockwiseWindDirection").unwrap().text(),
        Some("280")
    );

    let vis = obs
        .find("iwxxm:visibility/iwxxm:AerodromeHorizontalVisibility")
        .unwrap();
    assert_eq!(
        vis.find("iwxxm:prevailingVisibility").unwrap().text(),
        Some("1400")
    );
}

#[test]
fn test_weather_registry_lookup() {
    let doc = encode(FULL_REPORT);
    let obs = doc
        .find("iwxxm:observation/iwxxm:MeteorologicalAerodromeObservation")
        .unwrap();
    let weather = children_named(obs, "iwxxm:presentWeather");
    assert_eq!(weather.len(), 3);
    assert_eq!(
        weather[0].get("xlink:href"),
        Some("http://codes.wmo.int/306/4678/+SHRA")
    );
    assert_eq!(
        weather[1].get("xlink:href"),
        Some("http://codes.wmo.int/306/4678/BR")
    );
    assert_eq!(
        weather[2].get("xlink:href"),
        Some("http://codes.wmo.int/306/4678/VCTS")
    );
}

#[test]
fn test_unmatched_weather_falls_back_to_unknown_family() {
    let raw = "METAR LFPG 121030Z 24010KT 2000 +SHGS BKN020 10/08 Q1013";
    let doc = encode(raw);
    let obs = doc
        .find("iwxxm:observation/iwxxm:MeteorologicalAerodromeObservation")
        .unwrap();
    let weather = children_named(obs, "iwxxm:presentWeather");
    // +SHGS is not in the sample vocabulary: the +SHUP family entry
    // stands in, preserving the original text in the title.
    assert_eq!(
        weather[0].get("xlink:href"),
        Some("http://codes.wmo.int/306/4678/+SHUP")
    );
    assert_eq!(
        weather[0].get("xlink:title"),
        Some("Heavy showers of unknown precipitation: +SHGS")
    );
}

#[test]
fn test_runway_direction_dedup() {
    let doc = encode(FULL_REPORT);
    let obs = doc
        .find("iwxxm:observation/iwxxm:MeteorologicalAerodromeObservation")
        .unwrap();
    let rvrs = children_named(obs, "iwxxm:rvr");
    assert_eq!(rvrs.len(), 2);

    // First reference to 27L emits the full definition.
    let first = rvrs[0]
        .find("iwxxm:AerodromeRunwayVisualRange/iwxxm:runway/aixm:RunwayDirection")
        .unwrap();
    let id = first.get("gml:id").unwrap();
    assert_eq!(
        first
            .find("aixm:timeSlice/aixm:RunwayDirectionTimeSlice/aixm:designator")
            .unwrap()
            .text(),
        Some("27L")
    );

    // The wind-shear reference to the same runway is a cross-reference.
    let ws_runway = obs
        .find("iwxxm:windShear/iwxxm:AerodromeWindShear/iwxxm:runway")
        .unwrap();
    assert_eq!(ws_runway.get("xlink:href").unwrap(), format!("#{id}"));
    assert!(ws_runway.is_empty());
}

#[test]
fn test_rvr_values_and_tendency() {
    let doc = encode(FULL_REPORT);
    let obs = doc
        .find("iwxxm:observation/iwxxm:MeteorologicalAerodromeObservation")
        .unwrap();
    let rvrs = children_named(obs, "iwxxm:rvr");
    let first = rvrs[0].find("iwxxm:AerodromeRunwayVisualRange").unwrap();
    assert_eq!(first.get("pastTendency"), Some("UPWARD"));
    assert_eq!(first.find("iwxxm:meanRVR").unwrap().text(), Some("800"));
    let second = rvrs[1].find("iwxxm:AerodromeRunwayVisualRange").unwrap();
    assert_eq!(
        second.find("iwxxm:meanRVROperator").unwrap().text(),
        Some("ABOVE")
    );
}

#[test]
fn test_ten_km_reexpressed_with_above_operator() {
    let doc = encode("METAR LICJ 220950Z 18005KT 9999 FEW020 22/18 Q1013");
    let vis = doc
        .find("iwxxm:observation/iwxxm:MeteorologicalAerodromeObservation/iwxxm:visibility/iwxxm:AerodromeHorizontalVisibility")
        .unwrap();
    assert_eq!(
        vis.find("iwxxm:prevailingVisibility").unwrap().text(),
        Some("10000")
    );
    assert_eq!(
        vis.find("iwxxm:prevailingVisibilityOperator").unwrap().text(),
        Some("ABOVE")
    );
}

#[test]
fn test_cloud_layers() {
    let doc = encode(FULL_REPORT);
    let cloud = doc
        .find("iwxxm:observation/iwxxm:MeteorologicalAerodromeObservation/iwxxm:cloud/iwxxm:AerodromeCloud")
        .unwrap();
    let layers = children_named(cloud, "iwxxm:layer");
    assert_eq!(layers.len(), 2);
    let first = layers[0].find("iwxxm:CloudLayer").unwrap();
    assert_eq!(first.find("iwxxm:base").unwrap().text(), Some("1500"));
    let second = layers[1].find("iwxxm:CloudLayer").unwrap();
    assert_eq!(
        second.find("iwxxm:cloudType").unwrap().get("xlink:href"),
        Some("http://codes.wmo.int/49-2/SigConvectiveCloudType/CB")
    );
}

#[test]
fn test_sea_and_runway_state() {
    let doc = encode(FULL_REPORT);
    let obs = doc
        .find("iwxxm:observation/iwxxm:MeteorologicalAerodromeObservation")
        .unwrap();
    let sea = obs
        .find("iwxxm:seaCondition/iwxxm:AerodromeSeaCondition")
        .unwrap();
    assert_eq!(
        sea.find("iwxxm:seaSurfaceTemperature").unwrap().text(),
        Some("15")
    );
    assert_eq!(
        sea.find("iwxxm:seaState").unwrap().get("xlink:href"),
        Some("http://codes.wmo.int/bufr4/codeflag/0-22-061/4")
    );

    let runway_state = obs
        .find("iwxxm:runwayState/iwxxm:AerodromeRunwayState")
        .unwrap();
    // State 590230: deposit 5, contamination 9, depth 02 mm, friction 30.
    assert_eq!(
        runway_state.find("iwxxm:depositType").unwrap().get("xlink:href"),
        Some("http://codes.wmo.int/bufr4/codeflag/0-20-086/5")
    );
    assert_eq!(
        runway_state
            .find("iwxxm:contamination")
            .unwrap()
            .get("xlink:href"),
        Some("http://codes.wmo.int/bufr4/codeflag/0-20-087/9")
    );
    assert_eq!(
        runway_state.find("iwxxm:depthOfDeposit").unwrap().text(),
        Some("02")
    );
    assert_eq!(
        runway_state
            .find("iwxxm:estimatedSurfaceFrictionOrBrakingAction")
            .unwrap()
            .get("xlink:href"),
        Some("http://codes.wmo.int/bufr4/codeflag/0-20-089/30")
    );
}

#[test]
fn test_nil_report_yields_nil_observation() {
    let doc = encode("METAR KXYZ 010000Z NIL=");
    let obs = doc.find("iwxxm:observation").unwrap();
    assert_eq!(
        obs.get("nilReason"),
        Some("http://codes.wmo.int/common/nil/missing")
    );
    assert!(obs.is_empty());
    assert!(doc.find("iwxxm:trendForecast").is_none());
}

#[test]
fn test_translation_failure_annotates_document() {
    let raw = "METAR KORD 011955Z 22015G25KT";
    let doc = encode(raw);
    assert_eq!(doc.get("translationFailedTAC"), Some(raw));
    assert!(doc
        .get("permissibleUsageSupplementary")
        .unwrap()
        .contains("after position column"));
    // The body beyond identification and time is nil.
    let obs = doc.find("iwxxm:observation").unwrap();
    assert!(obs.is_empty());
}

#[test]
fn test_missing_mandatory_elements_are_nilled() {
    let doc = encode("METAR LFPG 121030Z 24010KT CAVOK ///// Q////");
    let obs = doc
        .find("iwxxm:observation/iwxxm:MeteorologicalAerodromeObservation")
        .unwrap();
    assert_eq!(obs.get("cloudAndVisibilityOK"), Some("true"));
    let air = obs.find("iwxxm:airTemperature").unwrap();
    assert_eq!(air.get("xsi:nil"), Some("true"));
    assert_eq!(
        air.get("nilReason"),
        Some("http://codes.wmo.int/common/nil/notObservable")
    );
    let qnh = obs.find("iwxxm:qnh").unwrap();
    assert_eq!(qnh.get("xsi:nil"), Some("true"));
}

#[test]
fn test_nosig_trend() {
    let doc = encode("METAR LFPG 121030Z 24010KT CAVOK 18/09 Q1015 NOSIG");
    let trend = doc.find("iwxxm:trendForecast").unwrap();
    assert_eq!(
        trend.get("nilReason"),
        Some("http://codes.wmo.int/common/nil/noSignificantChange")
    );
    assert_eq!(trend.get("xsi:nil"), Some("true"));
}

#[test]
fn test_trend_forecasts_as_siblings() {
    let doc = encode(
        "METAR EGLL 010850Z 24010KT 9999 FEW020 15/10 Q1020 \
BECMG FM0900 BKN015 TEMPO FM1000 4000 RA",
    );
    let trends = children_named(&doc, "iwxxm:trendForecast");
    assert_eq!(trends.len(), 2);
    let becmg = trends[0]
        .find("iwxxm:MeteorologicalAerodromeTrendForecast")
        .unwrap();
    assert_eq!(becmg.get("changeIndicator"), Some("BECOMING"));
    let tempo = trends[1]
        .find("iwxxm:MeteorologicalAerodromeTrendForecast")
        .unwrap();
    assert_eq!(tempo.get("changeIndicator"), Some("TEMPORARY_FLUCTUATIONS"));
    // Back-filled window: the BECMG period ends where TEMPO begins.
    let becmg_end = becmg
        .find("iwxxm:phenomenonTime/gml:TimePeriod/gml:endPosition")
        .unwrap();
    let tempo_begin = tempo
        .find("iwxxm:phenomenonTime/gml:TimePeriod/gml:beginPosition")
        .unwrap();
    assert_eq!(becmg_end.text(), tempo_begin.text());
    assert_eq!(
        tempo.find("iwxxm:prevailingVisibility").unwrap().text(),
        Some("4000")
    );
}

#[test]
fn test_fmh1_extension_block() {
    let raw = "METAR KORD 011955Z 19015G25KT 1 1/2SM R28R/2600FT TSRA BR FEW015 \
BKN040CB 22/21 A2992 RMK AO2 PK WND 20032/25 SLP993 P0009 T02280206 PNO $ HELLO";
    let report = decode_fmh1(raw, clock());
    assert_eq!(report.err_msg, None);
    let doc = encoder().encode_fmh1(&report, raw);
    assert_eq!(doc.get("xmlns:iwxxm-us"), Some("http://www.weather.gov/iwxxm-us/3.0"));

    let obs = doc
        .find("iwxxm:observation/iwxxm:MeteorologicalAerodromeObservation")
        .unwrap();
    let extension = obs
        .find("iwxxm:extension/MeteorologicalAerodromeObservationExtension")
        .unwrap();
    assert_eq!(
        extension.find("seaLevelPressure").unwrap().text(),
        Some("999.3")
    );
    // Unrecognized observer text is carried verbatim.
    assert_eq!(
        extension.find("humanReadableText").unwrap().text(),
        Some("HELLO")
    );
    let quantity = extension
        .find("statisticallyProcessedQuantity/StatisticallyProcessedProperty")
        .unwrap();
    assert_eq!(quantity.find("valuePeriod").unwrap().text(), Some("PT1H"));
    assert_eq!(quantity.find("processedValue").unwrap().text(), Some("0.09"));

    // Peak wind rides inside the surface wind element.
    let peak = obs
        .find("iwxxm:surfaceWind/iwxxm:AerodromeSurfaceWind/iwxxm:extension/iwxxm-us:AerodromePeakWind")
        .unwrap();
    assert_eq!(peak.find("iwxxm-us:windDirection").unwrap().text(), Some("200"));
    assert_eq!(peak.find("iwxxm-us:windSpeed").unwrap().text(), Some("32"));

    // Sensor outages attach at the report level.
    let failed = doc
        .find("iwxxm:extension/InoperativeSensors/failedSensors/FailedSensors/parameter")
        .unwrap();
    assert_eq!(
        failed.get("xlink:href"),
        Some("https://codes.nws.noaa.gov/FMH-1/MeteorologicalSensor/PRECIPITATION")
    );
}

#[test]
fn test_fmh1_omits_annex3_supplement() {
    let raw = "METAR KORD 011955Z 19015KT 10SM FEW015 22/21 A2992";
    let report = decode_fmh1(raw, clock());
    let doc = encoder().encode_fmh1(&report, raw);
    let obs = doc
        .find("iwxxm:observation/iwxxm:MeteorologicalAerodromeObservation")
        .unwrap();
    assert!(obs.find("iwxxm:seaCondition").is_none());
    assert!(obs.find("iwxxm:runwayState").is_none());
}
