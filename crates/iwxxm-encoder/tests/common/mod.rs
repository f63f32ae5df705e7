//! Shared fixtures for encoder tests: a small code-registry vocabulary
//! and a fixed reference clock.

use chrono::{DateTime, TimeZone, Utc};
use iwxxm_encoder::codes::{CodeRegistry, METAR_CONTAINERS};
use iwxxm_encoder::TranslationConfig;

pub const SAMPLE_CODES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns:skos="http://www.w3.org/2004/02/skos/core#"
         xmlns:rdfs="http://www.w3.org/2000/01/rdf-schema#">
  <skos:Collection rdf:about="http://codes.wmo.int/306/4678">
    <skos:member><skos:Concept rdf:about="http://codes.wmo.int/306/4678/RA">
      <rdfs:label xml:lang="en">Rain</rdfs:label></skos:Concept></skos:member>
    <skos:member><skos:Concept rdf:about="http://codes.wmo.int/306/4678/-RA">
      <rdfs:label xml:lang="en">Light rain</rdfs:label></skos:Concept></skos:member>
    <skos:member><skos:Concept rdf:about="http://codes.wmo.int/306/4678/-SHRA">
      <rdfs:label xml:lang="en">Light showers of rain</rdfs:label></skos:Concept></skos:member>
    <skos:member><skos:Concept rdf:about="http://codes.wmo.int/306/4678/+SHRA">
      <rdfs:label xml:lang="en">Heavy showers of rain</rdfs:label></skos:Concept></skos:member>
    <skos:member><skos:Concept rdf:about="http://codes.wmo.int/306/4678/TSRA">
      <rdfs:label xml:lang="en">Thunderstorm with rain</rdfs:label></skos:Concept></skos:member>
    <skos:member><skos:Concept rdf:about="http://codes.wmo.int/306/4678/TS">
      <rdfs:label xml:lang="en">Thunderstorm</rdfs:label></skos:Concept></skos:member>
    <skos:member><skos:Concept rdf:about="http://codes.wmo.int/306/4678/BR">
      <rdfs:label xml:lang="en">Mist</rdfs:label></skos:Concept></skos:member>
    <skos:member><skos:Concept rdf:about="http://codes.wmo.int/306/4678/FG">
      <rdfs:label xml:lang="en">Fog</rdfs:label></skos:Concept></skos:member>
    <skos:member><skos:Concept rdf:about="http://codes.wmo.int/306/4678/VCTS">
      <rdfs:label xml:lang="en">Thunderstorm in the vicinity</rdfs:label></skos:Concept></skos:member>
    <skos:member><skos:Concept rdf:about="http://codes.wmo.int/306/4678/UP">
      <rdfs:label xml:lang="en">Unknown precipitation</rdfs:label></skos:Concept></skos:member>
    <skos:member><skos:Concept rdf:about="http://codes.wmo.int/306/4678/+SHUP">
      <rdfs:label xml:lang="en">Heavy showers of unknown precipitation</rdfs:label></skos:Concept></skos:member>
  </skos:Collection>
  <skos:Collection rdf:about="http://codes.wmo.int/bufr4/codeflag/0-22-061">
    <skos:member><skos:Concept rdf:about="http://codes.wmo.int/bufr4/codeflag/0-22-061/3">
      <rdfs:label xml:lang="en">Slight</rdfs:label></skos:Concept></skos:member>
    <skos:member><skos:Concept rdf:about="http://codes.wmo.int/bufr4/codeflag/0-22-061/4">
      <rdfs:label xml:lang="en">Moderate</rdfs:label></skos:Concept></skos:member>
  </skos:Collection>
  <skos:Collection rdf:about="http://codes.wmo.int/bufr4/codeflag/0-20-086">
    <skos:member><skos:Concept rdf:about="http://codes.wmo.int/bufr4/codeflag/0-20-086/5">
      <rdfs:label xml:lang="en">Wet snow</rdfs:label></skos:Concept></skos:member>
  </skos:Collection>
  <skos:Collection rdf:about="http://codes.wmo.int/bufr4/codeflag/0-20-087">
    <skos:member><skos:Concept rdf:about="http://codes.wmo.int/bufr4/codeflag/0-20-087/9">
      <rdfs:label xml:lang="en">51 to 100 percent</rdfs:label></skos:Concept></skos:member>
  </skos:Collection>
</rdf:RDF>"#;

pub fn registry() -> CodeRegistry {
    CodeRegistry::parse(SAMPLE_CODES, &METAR_CONTAINERS, "en").expect("sample vocabulary")
}

pub fn config() -> TranslationConfig {
    TranslationConfig::default()
}

pub fn clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 12, 11, 0, 0).unwrap()
}
