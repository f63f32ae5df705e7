//! FMH-1 METAR/SPECI encoder.
//!
//! The Annex 3 body is built first through the shared builder with the
//! FMH-1 dialect selected (IWXXM-US namespace, variable RVR, no
//! supplement section); this module then attaches the US extension
//! blocks carrying the remarks content.

use iwxxm_common::time::iso_format;
use iwxxm_common::units::cardinal_to_degrees;
use iwxxm_common::{gml_id, XmlElement};
use tac_parser::report::{
    ConvectionGroup, DistanceClass, LightningGroup, MaxMinTemps, PrecipAmount, Report, Sector,
    SensorStatus,
};

use crate::config;
use crate::metar::{nil_uom, EncoderDialect, MetarEncoder};

fn fmh1_url(path: &str) -> String {
    format!("{}/FMH-1/{}", config::OFCM_CODE_REGISTRY_URL, path)
}

impl MetarEncoder {
    /// Encode one FMH-1 report, Annex 3 body plus US extension blocks.
    pub fn encode_fmh1(&self, report: &Report, raw_tac: &str) -> XmlElement {
        let (mut root, nil_present) = self
            .builder(report, raw_tac, EncoderDialect::Fmh1)
            .build_parts();
        if nil_present {
            return root;
        }

        self.wind_extensions(&mut root, report);

        let mut extra = XmlElement::new("MeteorologicalAerodromeObservationExtension");
        extra.set("xmlns", config::IWXXM_US_URI);
        encode_extra_measurements(&mut extra, report);
        if let Some(observation) =
            root.find_mut("iwxxm:observation/iwxxm:MeteorologicalAerodromeObservation")
        {
            if !extra.is_empty() {
                observation.child("iwxxm:extension").push(extra);
            }
        }

        if let Some(status) = &report.remarks.sensor_status {
            sensor_outages(&mut root, status);
        }
        root
    }

    /// Peak wind and wind shift ride inside AerodromeSurfaceWind. When
    /// the wind group itself was missing, the nil element is replaced by
    /// one whose direction and speed are explicitly not observable.
    fn wind_extensions(&self, root: &mut XmlElement, report: &Report) {
        let peak = report.remarks.peak_wind.as_ref();
        let shift = report.remarks.wind_shift.as_ref();
        if peak.is_none() && shift.is_none() {
            return;
        }
        let Some(surface_wind) = root.find_mut(
            "iwxxm:observation/iwxxm:MeteorologicalAerodromeObservation/iwxxm:surfaceWind",
        ) else {
            return;
        };

        if surface_wind.find("iwxxm:AerodromeSurfaceWind").is_none() {
            if surface_wind.get("nilReason").is_none() {
                return;
            }
            surface_wind.remove_attr("nilReason");
            surface_wind.remove_attr("xsi:nil");
            let body = surface_wind.child("iwxxm:AerodromeSurfaceWind");
            nil_uom(body.child("iwxxm:meanWindDirection"), config::NIL_NOOBSV_URL);
            nil_uom(body.child("iwxxm:meanWindSpeed"), config::NIL_NOOBSV_URL);
        }
        let body = surface_wind
            .find_mut("iwxxm:AerodromeSurfaceWind")
            .expect("surface wind body");

        if let Some(peak) = peak {
            let ext = body.child("iwxxm:extension").child("iwxxm-us:AerodromePeakWind");
            let dir = ext.child("iwxxm-us:windDirection");
            dir.set("uom", "deg");
            match peak.dd.parse::<i64>() {
                Ok(dd) => dir.set_text(dd.to_string()),
                Err(_) => dir.set_text(&peak.dd),
            }
            let speed = ext.child("iwxxm-us:windSpeed");
            speed.set("uom", peak.unit.ucum());
            speed.set_text(&peak.ff);
            let occurrence = ext.child("iwxxm-us:timeOfOccurrence");
            match peak.time {
                Some(time) => {
                    let instant = occurrence.child("gml:TimeInstant");
                    instant.set("gml:id", gml_id());
                    instant.child("gml:timePosition").set_text(iso_format(time));
                }
                None => occurrence.set("nilReason", config::NIL_MSSG_URL),
            }
        }

        if let Some(shift) = shift {
            let ext = body.child("iwxxm:extension").child("iwxxm-us:AerodromeWindShift");
            ext.set(
                "frontalPassage",
                if shift.fropa { "true" } else { "false" },
            );
            let when = ext.child("iwxxm-us:timeOfWindShift");
            match shift.time {
                Some(time) => {
                    let instant = when.child("gml:TimeInstant");
                    instant.set("gml:id", gml_id());
                    instant.child("gml:timePosition").set_text(iso_format(time));
                }
                None => when.set("nilReason", config::NIL_MSSG_URL),
            }
        }
    }
}

fn encode_extra_measurements(parent: &mut XmlElement, report: &Report) {
    let remarks = &report.remarks;

    if let Some(ostype) = &remarks.ostype {
        let el = parent.child("observingSystemType");
        match observing_system_href(&ostype.text) {
            Some(href) => el.set("xlink:href", href),
            None => el.set("nilReason", config::NIL_UNKNWN_URL),
        }
    }
    if let Some(additive) = &report.additive {
        parent.child("humanReadableText").set_text(additive);
    }
    if let Some(slp) = &remarks.slp {
        let el = parent.child("seaLevelPressure");
        match slp.value {
            Some(value) => {
                el.set_text(format!("{value:.1}"));
                el.set("uom", "hPa");
            }
            None => nil_uom(el, config::NIL_MSSG_URL),
        }
    }
    if let Some(tendency) = &remarks.pressure_tendency {
        match &tendency.change {
            Some(change) => {
                let el = parent.child("pressureTendency3hr");
                el.set("uom", "hPa");
                el.set_text(change);
                parent
                    .child("pressureTendencyCharacteristic3hr")
                    .set("xlink:href", format!("{}/{}", config::PRSRTNDCY_URL, tendency.character));
            }
            None => {
                let el = parent.child("pressureTendency3hr");
                nil_uom(el, config::NIL_MSSG_URL);
            }
        }
    }
    if let Some(rising) = remarks.pressure_rising {
        parent.child("pressureChangeIndicator").set(
            "xlink:href",
            fmh1_url(&format!(
                "PressureChangingRapidly/{}",
                if rising { "RISING" } else { "FALLING" }
            )),
        );
    }
    if let Some(depth) = &remarks.snow_depth {
        let el = parent.child("snowDepth");
        match depth.value.parse::<i64>() {
            Ok(value) => {
                el.set_text(value.to_string());
                el.set("uom", "[in_i]");
            }
            Err(_) => nil_uom(el, config::NIL_MSSG_URL),
        }
    }

    let mut phenomena = XmlElement::new("VisuallyObservablePhenomena");
    for group in &remarks.lightning {
        lightning(&mut phenomena, group);
    }
    for group in &remarks.convection {
        convection(&mut phenomena, group);
    }
    if !phenomena.is_empty() {
        parent.child("visuallyObservablePhenomena").push(phenomena);
    }

    for amount in [&remarks.pcpn1h, &remarks.pcpn6h, &remarks.pcpn24h]
        .into_iter()
        .flatten()
    {
        processed_quantity(parent, amount);
    }
    for temps in [&remarks.maxmin6h, &remarks.maxmin24h].into_iter().flatten() {
        max_min_temperatures(parent, temps);
    }
    if remarks.nospeci.is_some() {
        parent.child("noSpecials").set_text("true");
    }
    if remarks.maintenance.is_some() {
        parent.child("maintenanceIndicator").set_text("true");
    }
}

/// Precipitation totals become statistically processed accumulation
/// quantities; an all-zero group is a trace, qualified BELOW.
fn processed_quantity(parent: &mut XmlElement, amount: &PrecipAmount) {
    let prop = parent
        .child("statisticallyProcessedQuantity")
        .child("StatisticallyProcessedProperty");
    prop.child("processedWeatherElement").set(
        "xlink:href",
        fmh1_url("StatisticallyProcessedWeatherElements/PRECIPITATION"),
    );
    prop.child("valueType")
        .set("xlink:href", config::ACCUMULATION_URL);
    let period = prop.child("valuePeriod");
    match amount.period_hours {
        Some(hours) => period.set_text(format!("PT{hours}H")),
        None => period.set("nilReason", config::NIL_MSSG_URL),
    }
    if amount.trace {
        prop.child("qualifier").set_text("BELOW");
    }
    let value = prop.child("processedValue");
    match &amount.value {
        Some(v) => {
            value.set_text(v);
            value.set("uom", "[in_i]");
        }
        None => nil_uom(value, config::NIL_MSSG_URL),
    }
}

fn max_min_temperatures(parent: &mut XmlElement, temps: &MaxMinTemps) {
    let body = parent
        .child("maxMinTemperatures")
        .child("MaxMinTemperatures");
    body.child("precedingPeriod")
        .set_text(format!("PT{}H", temps.period_hours));
    for (name, value) in [
        ("maxTemperature", &temps.max),
        ("minTemperature", &temps.min),
    ] {
        let el = body.child(name);
        match value {
            Some(v) => {
                el.set_text(v);
                el.set("uom", "Cel");
            }
            None => nil_uom(el, config::NIL_MSSG_URL),
        }
    }
}

fn lightning(parent: &mut XmlElement, group: &LightningGroup) {
    let frequency_el = group.frequency.as_deref().and_then(|f| {
        frequency_href(f).map(|href| {
            let mut el = XmlElement::new("frequency");
            el.set("xlink:href", href);
            el
        })
    });
    let types_el = if group.types.is_empty() {
        None
    } else {
        let mut el = XmlElement::new("type");
        el.set(
            "xlink:href",
            fmh1_url(&format!("LightningType/{}", group.types.concat())),
        );
        Some(el)
    };

    if group.locations.is_empty() {
        let observed = parent.child("lightning").child("ObservedLightning");
        push_present(observed, [frequency_el.clone(), types_el.clone()]);
        return;
    }

    for (class, sectors) in &group.locations {
        let distance_el = distance_element(*class);
        let mut overhead = false;
        for sector in sectors {
            if sector.is_overhead() {
                overhead = true;
                continue;
            }
            let mut sector_el = XmlElement::new("sector");
            bearing_and_range(sector_el.child("Sector"), sector, false);

            let observed = parent.child("lightning").child("ObservedLightning");
            push_present(
                observed,
                [
                    distance_el.clone(),
                    frequency_el.clone(),
                    types_el.clone(),
                    Some(sector_el),
                ],
            );
        }
        if overhead {
            let mut distance = XmlElement::new("qualitativeDistance");
            distance.set("xlink:href", fmh1_url("QualitativeDistance/OVERHEAD"));
            let observed = parent.child("lightning").child("ObservedLightning");
            push_present(
                observed,
                [Some(distance), frequency_el.clone(), types_el.clone()],
            );
        }
        if sectors.is_empty() {
            let observed = parent.child("lightning").child("ObservedLightning");
            push_present(
                observed,
                [distance_el.clone(), frequency_el.clone(), types_el.clone()],
            );
        }
    }
}

fn convection(parent: &mut XmlElement, group: &ConvectionGroup) {
    let Some(ctype) = convective_type_href(&group.cloud_type) else {
        return;
    };
    let mut cloud_type_el = XmlElement::new("convectiveCloudType");
    cloud_type_el.set("xlink:href", ctype);

    let movement_el = group.movement.as_deref().map(|direction| {
        if direction.contains("OHD") {
            let mut el = XmlElement::new("movingOverhead");
            el.set_text("true");
            el
        } else {
            let mut el = XmlElement::new("directionOfMotion");
            el.set("uom", "deg");
            el.set_text(cardinal_to_degrees(direction).unwrap_or("0"));
            el
        }
    });

    if group.locations.is_empty() {
        let observed = parent.child("convection").child("ConvectiveCloudLocation");
        push_present(observed, [Some(cloud_type_el.clone()), movement_el.clone()]);
        return;
    }

    for (class, sectors) in &group.locations {
        let distance_el = distance_element(*class);
        let mut overhead = false;
        for sector in sectors {
            if sector.is_overhead() {
                overhead = true;
                continue;
            }
            let mut sector_el = XmlElement::new("sector");
            bearing_and_range(sector_el.child("Sector"), sector, true);

            let observed = parent.child("convection").child("ConvectiveCloudLocation");
            push_present(
                observed,
                [
                    Some(cloud_type_el.clone()),
                    distance_el.clone(),
                    Some(sector_el),
                    movement_el.clone(),
                ],
            );
        }
        if overhead {
            let mut distance = XmlElement::new("qualitativeDistance");
            distance.set("xlink:href", fmh1_url("QualitativeDistance/OVERHEAD"));
            let observed = parent.child("convection").child("ConvectiveCloudLocation");
            push_present(
                observed,
                [
                    Some(cloud_type_el.clone()),
                    Some(distance),
                    movement_el.clone(),
                ],
            );
        }
    }
}

/// Bearing bounds and, for convection, the observed range in miles.
fn bearing_and_range(parent: &mut XmlElement, sector: &Sector, with_distance: bool) {
    let ccw = parent.child("extremeCCWDirection");
    ccw.set("uom", "deg");
    ccw.set_text(format_degrees(sector.ccw));
    if with_distance {
        if let Some((near, _)) = sector.distance {
            let el = parent.child("extremeCCWDistance");
            el.set("uom", "[mi_i]");
            el.set_text(near.to_string());
        }
    }
    let cw = parent.child("extremeCWDirection");
    cw.set("uom", "deg");
    cw.set_text(format_degrees(sector.cw));
    if with_distance {
        if let Some((_, far)) = sector.distance {
            let el = parent.child("extremeCWDistance");
            el.set("uom", "[mi_i]");
            el.set_text(far.to_string());
        }
    }
}

fn sensor_outages(root: &mut XmlElement, status: &SensorStatus) {
    let block = root.child("iwxxm:extension").child("InoperativeSensors");
    block.set("xmlns", config::IWXXM_US_URI);
    for (location, sensors) in &status.sensors {
        let failed = block.child("failedSensors").child("FailedSensors");
        for sensor in sensors {
            let el = failed.child("parameter");
            match sensor_href(sensor) {
                Some(href) => el.set("xlink:href", href),
                None => el.set("nilReason", config::NIL_UNKNWN_URL),
            }
        }
        if location != "none" {
            failed
                .child("location")
                .child("SensorLocation")
                .child("description")
                .set_text(location);
        }
    }
}

fn push_present<const N: usize>(parent: &mut XmlElement, elements: [Option<XmlElement>; N]) {
    for element in elements.into_iter().flatten() {
        parent.push(element);
    }
}

fn distance_element(class: DistanceClass) -> Option<XmlElement> {
    let href = match class {
        DistanceClass::AtStation => return None,
        DistanceClass::Vicinity => fmh1_url("QualitativeDistance/VICINITY"),
        DistanceClass::Distant => fmh1_url("QualitativeDistance/DISTANT"),
    };
    let mut el = XmlElement::new("qualitativeDistance");
    el.set("xlink:href", href);
    Some(el)
}

fn format_degrees(value: f32) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i32)
    } else {
        format!("{value:.1}")
    }
}

fn observing_system_href(token: &str) -> Option<String> {
    let kind = match token {
        "AO1" | "A01" => "AO1",
        "AO2" | "A02" => "AO2",
        "AO1A" | "A01A" => "AO1A",
        "AO2A" | "A02A" => "AO2A",
        _ => return None,
    };
    Some(fmh1_url(&format!("ObservingSystemType/{kind}")))
}

fn frequency_href(token: &str) -> Option<String> {
    let kind = match token {
        "OCNL" => "OCCASIONAL",
        "FRQ" => "FREQUENT",
        "CONS" => "CONTINUOUS",
        _ => return None,
    };
    Some(fmh1_url(&format!("LightningFrequency/{kind}")))
}

fn convective_type_href(token: &str) -> Option<String> {
    let kind = match token {
        "CB" => "CUMULONIMBUS",
        "TS" => "THUNDERSTORM",
        "CBMAM" => "CUMULONIMBUS_WITH_MAMMATUS",
        _ => return None,
    };
    Some(fmh1_url(&format!("ConvectiveCloudType/{kind}")))
}

fn sensor_href(sensor: &str) -> Option<String> {
    let kind = match sensor {
        "RVRNO" => "RUNWAY_VISUAL_RANGE",
        "PWINO" => "PRESENT_WEATHER",
        "PNO" => "PRECIPITATION",
        "FZRANO" => "FREEZING_PRECIPITATION",
        "TSNO" => "THUNDERSTORM",
        "VISNO" => "VISIBILITY",
        "CHINO" => "CEILING",
        "SLPNO" => "PRESSURE",
        _ => return None,
    };
    Some(fmh1_url(&format!("MeteorologicalSensor/{kind}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_degrees() {
        assert_eq!(format_degrees(22.5), "22.5");
        assert_eq!(format_degrees(360.0), "360");
        assert_eq!(format_degrees(0.0), "0");
    }

    #[test]
    fn test_href_tables() {
        assert!(observing_system_href("A02").unwrap().ends_with("/AO2"));
        assert!(sensor_href("CHINO").unwrap().ends_with("/CEILING"));
        assert!(convective_type_href("CBMAM")
            .unwrap()
            .ends_with("CUMULONIMBUS_WITH_MAMMATUS"));
        assert_eq!(frequency_href("XXX"), None);
    }
}
