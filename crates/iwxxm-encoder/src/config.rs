//! Translation configuration and fixed schema constants.
//!
//! The namespace URIs and schema locations are an external compatibility
//! contract with the IWXXM 3.0 and WMO collect schemas, not a design
//! choice; consumers validate documents against exactly these pairs.

use serde::{Deserialize, Serialize};

// IWXXM 3.0 namespaces and schema locations.
pub const IWXXM_URI: &str = "http://icao.int/iwxxm/3.0";
pub const IWXXM_URL: &str = "https://schemas.wmo.int/iwxxm/3.0/iwxxm.xsd";
pub const IWXXM_US_URI: &str = "http://www.weather.gov/iwxxm-us/3.0";
pub const IWXXM_US_URL: &str = "https://nws.weather.gov/schemas/iwxxm-us/3.0/";
pub const IWXXM_US_METAR_URL: &str =
    "https://nws.weather.gov/schemas/iwxxm-us/3.0/metarSpeci.xsd";

pub const AIXM_URI: &str = "http://www.aixm.aero/schema/5.1.1";
pub const GML_URI: &str = "http://www.opengis.net/gml/3.2";
pub const XLINK_URI: &str = "http://www.w3.org/1999/xlink";
pub const XSI_URI: &str = "http://www.w3.org/2001/XMLSchema-instance";

// WMO code-registry nil reasons.
pub const NIL_NOSIGC_URL: &str = "http://codes.wmo.int/common/nil/noSignificantChange";
pub const NIL_NOOBSV_URL: &str = "http://codes.wmo.int/common/nil/notObservable";
pub const NIL_NOOPRSIG_URL: &str =
    "http://codes.wmo.int/common/nil/nothingOfOperationalSignificance";
pub const NIL_NOAUTODEC_URL: &str = "http://codes.wmo.int/common/nil/notDetectedByAutoSystem";
pub const NIL_NA_URL: &str = "http://codes.wmo.int/common/nil/inapplicable";
pub const NIL_MSSG_URL: &str = "http://codes.wmo.int/common/nil/missing";
pub const NIL_UNKNWN_URL: &str = "http://codes.wmo.int/common/nil/unknown";
pub const NIL_WTHLD_URL: &str = "http://codes.wmo.int/common/nil/withheld";
pub const NIL_SNOCLO_URL: &str = "http://codes.wmo.int/bufr4/codeflag/0-20-085/1";

// Misc registry tables and entries.
pub const CLDCVR_URL: &str = "http://codes.wmo.int/49-2/CloudAmountReportedAtAerodrome/";
pub const RWYFRCTN_URL: &str = "http://codes.wmo.int/bufr4/codeflag/0-20-089/";
pub const CUMULONIMBUS: &str = "http://codes.wmo.int/49-2/SigConvectiveCloudType/CB";
pub const TWRNGCUMULUS: &str = "http://codes.wmo.int/49-2/SigConvectiveCloudType/TCU";
pub const PRSRTNDCY_URL: &str = "http://codes.wmo.int/bufr4/codeflag/0-10-063";
pub const ACCUMULATION_URL: &str = "http://codes.wmo.int/grib2/codeflag/4.10/1";

// US code registry for FMH-1 extension vocabularies.
pub const OFCM_CODE_REGISTRY_URL: &str = "https://codes.nws.noaa.gov";

// Vocabulary containers in the WMO code-registry file.
pub const WEATHER_CONTAINER_ID: &str = "4678";
pub const SEACND_CONTAINER_ID: &str = "0-22-061";
pub const RWYDEPST_CONTAINER_ID: &str = "0-20-086";
pub const RWYCNTMS_CONTAINER_ID: &str = "0-20-087";

/// Bit flags selecting which optional xlink:title attributes appear in
/// output documents.
pub mod titles {
    pub const WEATHER: u32 = 1 << 0;
    pub const CLOUD_AMOUNT: u32 = 1 << 1;
    pub const CLOUD_TYPE: u32 = 1 << 2;
    pub const SEA_CONDITION: u32 = 1 << 3;
    pub const RUNWAY_DEPOSIT: u32 = 1 << 4;
    pub const RUNWAY_COVERAGE: u32 = 1 << 5;
    pub const RUNWAY_FRICTION: u32 = 1 << 6;
}

/// Site-specific encoder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Full name of the centre running the translation.
    pub centre_name: String,
    /// Four-letter designator of the translation centre.
    pub centre_designator: String,
    /// Preferred language for xlink:title text pulled from the registry.
    pub preferred_language: String,
    /// `titles` bit flags; zero suppresses optional titles entirely.
    pub titles: u32,
    pub srs_name: String,
    /// "2" or "3"; three-dimensional positions carry elevation.
    pub srs_dimension: String,
    pub axis_labels: String,
    pub vertical_datum: String,
    pub elevation_uom: String,
    /// RVR is expected whenever prevailing visibility falls below this
    /// many metres.
    pub rvr_maximum_distance: u32,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        TranslationConfig {
            centre_name: "NCEP Central Operations".to_string(),
            centre_designator: "KWNO".to_string(),
            preferred_language: "en".to_string(),
            titles: 0,
            srs_name: "https://www.opengis.net/def/crs/EPSG/0/4326".to_string(),
            srs_dimension: "2".to_string(),
            axis_labels: "Lat Long".to_string(),
            vertical_datum: "EGM_96".to_string(),
            elevation_uom: "M".to_string(),
            rvr_maximum_distance: 1500,
        }
    }
}

impl TranslationConfig {
    pub fn wants_title(&self, flag: u32) -> bool {
        self.titles & flag != 0
    }
}
