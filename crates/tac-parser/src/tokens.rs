//! Token definitions for the TAC grammars.
//!
//! Each token kind is a named, anchored regular expression; the names are
//! the plain-English descriptions used in decode diagnostics. The FMH-1
//! dialect reuses the Annex 3 set with an explicit list of pattern
//! overrides, selected once at construction.

use std::sync::OnceLock;

use regex::Regex;

pub(crate) struct TokenDef {
    pub name: &'static str,
    pub re: Regex,
    /// Require a blank or end-of-text after the match. Off only for
    /// patterns that manage their own trailing context.
    pub boundary: bool,
}

impl TokenDef {
    pub fn new(name: &'static str, pattern: &str) -> Self {
        TokenDef {
            name,
            re: Regex::new(&format!("^(?:{pattern})")).expect("token pattern"),
            boundary: true,
        }
    }

    fn unbounded(name: &'static str, pattern: &str) -> Self {
        TokenDef {
            boundary: false,
            ..TokenDef::new(name, pattern)
        }
    }
}

/// Token set for a METAR/SPECI dialect.
pub(crate) struct MetarTokens {
    pub kind: TokenDef,
    pub ident: TokenDef,
    pub itime: TokenDef,
    pub nil: TokenDef,
    pub cor: TokenDef,
    pub auto: TokenDef,
    pub wind: TokenDef,
    pub wind_vrb: TokenDef,
    pub cavok: TokenDef,
    pub vsby1: TokenDef,
    pub vsby2: TokenDef,
    pub minvsby: TokenDef,
    pub rvr: TokenDef,
    pub vrbrvr: TokenDef,
    pub nsw: TokenDef,
    pub drytstm: TokenDef,
    pub pcp: TokenDef,
    pub obv: TokenDef,
    pub vcnty: TokenDef,
    pub noclouds: TokenDef,
    pub sky: TokenDef,
    pub temps: TokenDef,
    pub altimeter: TokenDef,
    pub rewx: TokenDef,
    pub windshear: TokenDef,
    pub seastate: TokenDef,
    pub rwystate: TokenDef,
    pub nosig: TokenDef,
    pub trendtype: TokenDef,
    pub ftime: TokenDef,
    pub ttime: TokenDef,
    pub twind: TokenDef,
    pub rmk: TokenDef,
}

const PCP_PATTERN: &str = r"[+-]?(TS|SH|FZ)?(DZ|RA|SN|SG|IC|PE|GR|GS|PL|UP){1,3}";
const OBV_PATTERN: &str = r"[+-]?(MI|PR|BC|DR|BL|FZ)?(BR|FG|FU|VA|DU|SA|HZ|PY|P(O|0)|SQ|FC|SS|DS|SN|//)";
const VCNTY_PATTERN: &str = r"VC(FG|P(O|0)|FC|DS|SS|TS|SH|VA|BLSN|BLSA)";
const SKY_PATTERN: &str = r"(VV|FEW|SCT|BKN|(0|O)VC|///)(\d{3}|///)?(CB|TCU|///)?";
const RVR_PATTERN: &str =
    r"R(?P<rwy>[/\d]{2}[RCL]?)/(?P<oper>[MP])?(?P<mean>[/\d]{4}(FT)?)/?(?P<tend>[UDN]?)";
const VRBRVR_PATTERN: &str = r"R(?P<rwy>\d{2}[RCL]?)/(?P<lo>M?\d{4})V(?P<hi>P?\d{4})(?P<ft>FT)?";
// The statute-mile form, alternatives ordered most specific first so the
// leftmost-first engine prefers whole+fraction over whole alone.
const VSBY1_PATTERN: &str = r"(?P<whole>\d{1,3})\s+(?P<frac>\d/\d{1,2})SM|(?P<mfrac>M?\d/\d{1,2})SM|(?P<whole2>\d{1,3})SM|/{2,4}SM";

impl MetarTokens {
    fn annex3_set() -> Self {
        MetarTokens {
            kind: TokenDef::new("Keyword METAR or SPECI", r"METAR|SPECI"),
            ident: TokenDef::new("ICAO Identifier", r"[A-Z][A-Z0-9]{3}"),
            itime: TokenDef::new("issuance time ddHHmmZ", r"\d{6}Z"),
            nil: TokenDef::new("NIL", r"NIL"),
            cor: TokenDef::new("COR", r"COR"),
            auto: TokenDef::new("AUTO", r"AUT(O|0)"),
            wind: TokenDef::new(
                "wind",
                r"(VRB|\d{3}|///)P?(\d{2,3}|//)(GP?\d{2,3})?(MPS|KT)",
            ),
            wind_vrb: TokenDef::new("variable wind direction", r"\d{3}V\d{3}"),
            cavok: TokenDef::new("CAVOK", r"CAV(O|0)K"),
            vsby1: TokenDef::new("visibility in statute miles", VSBY1_PATTERN),
            vsby2: TokenDef::new("visibility in metres", r"[PM]?[/\d]{4}(\s?NDV)?"),
            minvsby: TokenDef::new("directional minimum visibility", r"\d{4}[NEWS]{0,2}"),
            rvr: TokenDef::new("runway visual range", RVR_PATTERN),
            vrbrvr: TokenDef::new("variable runway visual range", VRBRVR_PATTERN),
            nsw: TokenDef::new("NSW", r"NSW"),
            drytstm: TokenDef::new("thunderstorm", r"[+-]?TS"),
            pcp: TokenDef::new("precipitation", PCP_PATTERN),
            obv: TokenDef::new("obstruction to vision", OBV_PATTERN),
            vcnty: TokenDef::new("precipitation in the vicinity", VCNTY_PATTERN),
            noclouds: TokenDef::new("NCD, NSC, CLR, SKC", r"NSC|NCD|SKC|CLR"),
            sky: TokenDef::new("cloud layer", SKY_PATTERN),
            temps: TokenDef::new(
                "air and dew-point temperature",
                r"(?P<air>(M|-)?\d{2}|MM|//)/(?P<dewpoint>(M|-)?\d{2}|MM|//)",
            ),
            altimeter: TokenDef::new("altimeter", r"(Q|A)(\d{3,4}|////)"),
            rewx: TokenDef::new(
                "recent weather",
                r"RE(FZ|SH|TS)?(DZ|RASN|RA|(BL)?SN|SG|GR|GS|SS|DS|FC|VA|PL|UP|//)|RETS",
            ),
            windshear: TokenDef::new(
                "windshear",
                r"WS\s(R(WY)?(?P<rwy>\d{2}[RLC]?)|ALL\sRWY)",
            ),
            seastate: TokenDef::new(
                "state of the sea",
                r"W(?P<temp>(M|-)?\d\d|//)/(?P<kind>S|H)(?P<value>[/\d]{1,3})",
            ),
            rwystate: TokenDef::new(
                "state of the runway",
                r"R(?P<rwy>\d{0,2}[LCR]?)/(?P<state>[\d/]{6}|SNOCLO|CLRD[/\d]{0,2})",
            ),
            nosig: TokenDef::new("NOSIG", r"N(O|0)SIG"),
            trendtype: TokenDef::new("trend qualifier", r"BECMG|TEMPO"),
            ftime: TokenDef::new("start of trend time period", r"(AT|FM)\d{4}"),
            ttime: TokenDef::new("end of trend time period", r"TL\d{4}"),
            twind: TokenDef::new(
                "wind (no VRB allowed)",
                r"(\d{3}|///)P?(\d{2,3}|//)(GP?\d{2,3})?(MPS|KT)",
            ),
            rmk: TokenDef::new("RMK", r"RMK"),
        }
    }

    /// FMH-1 overrides: knots-only wind, no missing-value visibility
    /// forms, A-only altimeter, SKC/CLR sky clear, optional dew point.
    fn fmh1_set() -> Self {
        MetarTokens {
            wind: TokenDef::new("wind", r"(VRB|\d{3}|///)P?(\d{2,3}|//)(GP?\d{2,3})?KT"),
            vsby1: TokenDef::new(
                "visibility in statute miles",
                r"(?P<whole>\d{1,3})\s+(?P<frac>\d/\d{1,2})SM|(?P<mfrac>M?\d/\d{1,2})SM|(?P<whole2>\d{1,3})SM",
            ),
            vsby2: TokenDef::new("visibility in meters", r"[PM]?\d{4}"),
            noclouds: TokenDef::new("CLR, SKC", r"SKC|CLR"),
            temps: TokenDef::new(
                "air and dew-point temperature",
                r"(?P<air>(M|-)?\d{2}|MM|//)/(?P<dewpoint>(M|-)?\d{2}|MM|//)?",
            ),
            altimeter: TokenDef::new("altimeter", r"A(\d{4}|////)"),
            ..Self::annex3_set()
        }
    }

    pub fn annex3() -> &'static Self {
        static TOKENS: OnceLock<MetarTokens> = OnceLock::new();
        TOKENS.get_or_init(Self::annex3_set)
    }

    pub fn fmh1() -> &'static Self {
        static TOKENS: OnceLock<MetarTokens> = OnceLock::new();
        TOKENS.get_or_init(Self::fmh1_set)
    }
}

/// Extra productions for the FMH-1 remarks section, in ordered-choice
/// priority.
pub(crate) struct RemarkTokens {
    pub ostype: TokenDef,
    pub tempdec: TokenDef,
    pub mslp: TokenDef,
    pub pcpn1h: TokenDef,
    pub ptndcy3h: TokenDef,
    pub ssindc: TokenDef,
    pub maintenance: TokenDef,
    pub maxt6h: TokenDef,
    pub mint6h: TokenDef,
    pub pkwnd: TokenDef,
    pub ltg: TokenDef,
    pub pcpn6h: TokenDef,
    pub xtrmet: TokenDef,
    pub pchgr: TokenDef,
    pub wshft: TokenDef,
    pub pcpn24h: TokenDef,
    pub tstm: TokenDef,
    pub movmnt: TokenDef,
    pub snodpth: TokenDef,
    pub nospeci: TokenDef,
    pub fropa: TokenDef,
    pub locword: TokenDef,
    pub any: TokenDef,
}

impl RemarkTokens {
    fn build() -> Self {
        RemarkTokens {
            ostype: TokenDef::new("observing system type", r"A(0|O)(1|2)A?"),
            tempdec: TokenDef::new("temperature in tenths", r"T[01]\d{3}[01]\d{3}"),
            mslp: TokenDef::new("sea-level pressure", r"SLP(\d{3}|///)"),
            pcpn1h: TokenDef::new("hourly precipitation", r"P(\d{3,4}|/{3,4})"),
            ptndcy3h: TokenDef::new("pressure tendency", r"5(\d{4}|////)"),
            ssindc: TokenDef::new(
                "sensor status indicator",
                r"(RVR|PWI|P|FZRA|TS|SLP)NO|(VISNO|CHINO)(\s+(R(WY)?\s*\d\d[LCR]?|NE|SE|SW|NW|N|E|S|W))?",
            ),
            maintenance: TokenDef::new("maintenance indicator", r"\$"),
            maxt6h: TokenDef::new("6-hour maximum temperature", r"1(\d{4}|////)"),
            mint6h: TokenDef::new("6-hour minimum temperature", r"2(\d{4}|////)"),
            pkwnd: TokenDef::new("peak wind", r"PK\s+WND\s+\d{5,6}/\d{2,4}"),
            ltg: TokenDef::new("lightning", r"((OCNL|FRQ|CONS)\s+)?LTG(CG|IC|CC|CA){0,4}"),
            pcpn6h: TokenDef::new("6-hour precipitation", r"6(\d{4}|////)"),
            xtrmet: TokenDef::new("24-hour extreme temperatures", r"4[\d/]{8}"),
            pchgr: TokenDef::new("pressure changing rapidly", r"PRES(R|F)R"),
            wshft: TokenDef::new("wind shift", r"WSHFT\s+\d{2,4}"),
            pcpn24h: TokenDef::new("24-hour precipitation", r"7(\d{4}|////)"),
            tstm: TokenDef::new("thunderstorm location", r"CBMAM|CB|TS"),
            movmnt: TokenDef::new("direction of movement", r"MOV(D|G)?\s+([NEWS]{1,3}|OHD)"),
            snodpth: TokenDef::new("snow depth", r"4/(\d{3}|///)"),
            nospeci: TokenDef::new("NOSPECI", r"NOSPECI"),
            fropa: TokenDef::new("frontal passage", r"FROPA"),
            locword: TokenDef::new(
                "location",
                r"OHD|ALQD?S|VC|DSNT|AND|\d{0,4}[NEWS]{1,3}(-\d{0,4}[NEWS]{1,3})*",
            ),
            any: TokenDef::new("plain text", r"\S+"),
        }
    }

    pub fn get() -> &'static Self {
        static TOKENS: OnceLock<RemarkTokens> = OnceLock::new();
        TOKENS.get_or_init(Self::build)
    }
}

/// Token set for the TAF grammar.
pub(crate) struct TafTokens {
    pub prefix: TokenDef,
    pub ident: TokenDef,
    pub itime: TokenDef,
    pub nil: TokenDef,
    pub vtime: TokenDef,
    pub cnl: TokenDef,
    pub ftime: TokenDef,
    pub btime: TokenDef,
    pub ttime: TokenDef,
    pub ptime: TokenDef,
    pub wind: TokenDef,
    pub cavok: TokenDef,
    pub vsby: TokenDef,
    pub pcp: TokenDef,
    pub obv: TokenDef,
    pub vcnty: TokenDef,
    pub nsw: TokenDef,
    pub sky: TokenDef,
    pub temp: TokenDef,
    pub llws: TokenDef,
    pub amd: TokenDef,
    pub any: TokenDef,
}

impl TafTokens {
    fn build() -> Self {
        TafTokens {
            prefix: TokenDef::new("TAF", r"TAF(\s+(AMD|COR|CC[A-Z]|RTD))?"),
            ident: TokenDef::new("ICAO Identifier", r"[A-Z][A-Z0-9]{3}"),
            itime: TokenDef::new("issuance time ddHHmmZ", r"\d{6}Z"),
            nil: TokenDef::new("NIL", r"NIL"),
            vtime: TokenDef::new("valid period", r"\d{4}/\d{4}|\d{6}"),
            cnl: TokenDef::new("CNL", r"CNL"),
            ftime: TokenDef::new("FM group", r"FM\d{6}"),
            btime: TokenDef::new("BECMG group", r"BECMG\s+\d{4}/\d{4}"),
            ttime: TokenDef::new("TEMPO group", r"TEMPO\s+\d{4}/\d{4}"),
            ptime: TokenDef::new("PROB group", r"PROB\d{2}(\s+TEMPO)?\s+\d{4}/\d{4}"),
            wind: TokenDef::new("wind", r"(VRB|\d{3}|///)P?\d{2,3}(GP?\d{2,3})?(KT|MPS)"),
            cavok: TokenDef::new("CAVOK", r"CAVOK"),
            vsby: TokenDef::new("visibility", r"((1\s*)?[13]/[24]|\d|P6)SM|\d{4}"),
            pcp: TokenDef::new(
                "precipitation",
                r"[+-]?(SH|TS|FZ)?(DZ|RA|SN|SG|IC|PE|GR|GS|UP|PL)+(\s+[+-]?(SH|TS|FZ)?(DZ|RA|SN|SG|IC|PE|GR|GS|UP|PL)+)*|TS(\s+[+-]?(SH|TS|FZ)?(DZ|RA|SN|SG|IC|PE|GR|GS|UP|PL)+)?",
            ),
            obv: TokenDef::new(
                "obstruction to vision",
                r"(MI|PR|BC|DR|BL|FZ)?(BR|FG|FU|VA|DU|SA|HZ|PY|PO|SQ|\+?(FC|SS|DS)|SN)(\s+(MI|PR|BC|DR|BL|FZ)?(BR|FG|FU|VA|DU|SA|HZ|PY|PO|SQ|\+?(FC|SS|DS)|SN))*",
            ),
            vcnty: TokenDef::new("precipitation in the vicinity", r"VC\w+"),
            nsw: TokenDef::new("NSW", r"NSW"),
            sky: TokenDef::new(
                "sky condition",
                r"SKC|CLR|NSC|((FEW|SCT|BKN|[0O]VC|VV)\d{3}(CB|TCU)?)(\s+(FEW|SCT|BKN|[0O]VC|VV)\d{3}(CB|TCU)?)*",
            ),
            temp: TokenDef::new(
                "forecast temperature",
                r"T[NX]([M-]?\d{2})\s*/\s*\d{4}Z",
            ),
            llws: TokenDef::new("low-level wind shear", r"WS\d{3}/\d{5,6}KT"),
            amd: TokenDef::unbounded("amendment limits", r"AMD\s+(NOT|LTD)\s+\S.*"),
            any: TokenDef::new("plain text", r"\S+"),
        }
    }

    pub fn get() -> &'static Self {
        static TOKENS: OnceLock<TafTokens> = OnceLock::new();
        TOKENS.get_or_init(Self::build)
    }
}
