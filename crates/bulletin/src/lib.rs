//! Meteorological bulletin aggregation.
//!
//! Encoded IWXXM documents are cached under their WMO Abbreviated
//! Heading Line and drained into WMO `collect` 2014 envelope documents,
//! one bulletin per distinct heading. The cache is plain mutable state:
//! callers sharing one aggregator across tasks serialize access with a
//! mutex, one critical section per cache or drain operation.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use iwxxm_common::{gml_id, TacError, XmlElement};

const COLLECT_URI: &str = "http://def.wmo.int/collect/2014";
const COLLECT_SCHEMA: &str =
    "http://def.wmo.int/collect/2014 http://schemas.wmo.int/collect/1.2/collect.xsd";

/// WMO Abbreviated Heading Line: "TTAAII CCCC YYGGgg [BBB]". Bulletin
/// grouping is strict string equality on the heading.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AhlKey {
    pub ttaaii: String,
    pub cccc: String,
    pub yygggg: String,
    pub bbb: Option<String>,
}

impl FromStr for AhlKey {
    type Err = TacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        match parts.as_slice() {
            [ttaaii, cccc, yygggg] => Ok(AhlKey {
                ttaaii: (*ttaaii).to_string(),
                cccc: (*cccc).to_string(),
                yygggg: (*yygggg).to_string(),
                bbb: None,
            }),
            [ttaaii, cccc, yygggg, bbb] => Ok(AhlKey {
                ttaaii: (*ttaaii).to_string(),
                cccc: (*cccc).to_string(),
                yygggg: (*yygggg).to_string(),
                bbb: Some((*bbb).to_string()),
            }),
            _ => Err(TacError::InvalidAhl(s.to_string())),
        }
    }
}

impl fmt::Display for AhlKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.bbb {
            Some(bbb) => write!(f, "{} {} {} {}", self.ttaaii, self.cccc, self.yygggg, bbb),
            None => write!(f, "{} {} {}", self.ttaaii, self.cccc, self.yygggg),
        }
    }
}

impl AhlKey {
    /// Bulletin file name: A_L{TTAAII}{CCCC}{YYGGgg}{BBB}_C_{CCCC}_{stamp}.xml
    fn filename(&self, now: DateTime<Utc>) -> String {
        format!(
            "A_L{}{}{}{}_C_{}_{}.xml",
            self.ttaaii,
            self.cccc,
            self.yygggg,
            self.bbb.as_deref().unwrap_or(""),
            self.cccc,
            now.format("%Y%m%d%H%M%S")
        )
    }
}

/// One assembled bulletin: the envelope document and its identifier.
#[derive(Debug, Clone)]
pub struct Bulletin {
    pub ahl: AhlKey,
    pub filename: String,
    pub document: XmlElement,
}

impl Bulletin {
    pub fn to_xml_string(&self) -> Result<String, TacError> {
        self.document.to_xml_string()
    }
}

/// Caches encoded documents by heading and drains them into bulletins.
#[derive(Debug, Default)]
pub struct BulletinCache {
    docs: HashMap<AhlKey, Vec<XmlElement>>,
}

impl BulletinCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one encoded document for the given heading.
    pub fn cache(&mut self, document: XmlElement, ahl: AhlKey) {
        self.docs.entry(ahl).or_default().push(document);
    }

    pub fn len(&self) -> usize {
        self.docs.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Wrap all documents under one heading into an envelope and drop
    /// the heading from the cache. Returns None once the cache is empty.
    pub fn drain_one(&mut self, now: DateTime<Utc>) -> Option<Bulletin> {
        let ahl = self.docs.keys().next().cloned()?;
        let documents = self.docs.remove(&ahl)?;

        let mut envelope = XmlElement::new("MeteorologicalBulletin");
        envelope.set("xmlns", COLLECT_URI);
        envelope.set("xmlns:gml", "http://www.opengis.net/gml/3.2");
        envelope.set("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance");
        envelope.set("xsi:schemaLocation", COLLECT_SCHEMA);
        envelope.set("gml:id", gml_id());

        let count = documents.len();
        for document in documents {
            envelope.child("meteorologicalInformation").push(document);
        }
        let filename = ahl.filename(now);
        envelope.child("bulletinIdentifier").set_text(&filename);
        debug!(ahl = %ahl, documents = count, %filename, "assembled bulletin");

        Some(Bulletin {
            ahl,
            filename,
            document: envelope,
        })
    }

    /// Drain every pending heading; repeated drains exhaust the cache.
    pub fn drain_all(&mut self, now: DateTime<Utc>) -> Vec<Bulletin> {
        let mut bulletins = Vec::new();
        while let Some(bulletin) = self.drain_one(now) {
            bulletins.push(bulletin);
        }
        bulletins
    }
}
