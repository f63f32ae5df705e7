//! WMO code-registry vocabulary loader.
//!
//! The registry ships as one RDF/XML file holding named collections of
//! concepts; each concept's URI ends in the TAC short token and carries
//! language-tagged labels. The loader streams the file once at encoder
//! construction and builds immutable per-container lookup tables, safe
//! for unsynchronized concurrent reads afterwards.

use std::collections::HashMap;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use iwxxm_common::{TacError, TacResult};

/// One vocabulary entry: the concept URI and its human-readable title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeEntry {
    pub uri: String,
    pub title: String,
}

/// Immutable short-token → (URI, title) tables, one per container id.
#[derive(Debug, Default)]
pub struct CodeRegistry {
    tables: HashMap<String, HashMap<String, CodeEntry>>,
}

/// The containers the METAR/SPECI and TAF encoders need.
pub const METAR_CONTAINERS: [&str; 4] = [
    crate::config::WEATHER_CONTAINER_ID,
    crate::config::SEACND_CONTAINER_ID,
    crate::config::RWYDEPST_CONTAINER_ID,
    crate::config::RWYCNTMS_CONTAINER_ID,
];

impl CodeRegistry {
    /// Read a vocabulary file from disk.
    pub fn load(
        path: impl AsRef<Path>,
        containers: &[&str],
        preferred_language: &str,
    ) -> TacResult<Self> {
        let xml = std::fs::read_to_string(path)?;
        Self::parse(&xml, containers, preferred_language)
    }

    /// Parse vocabulary XML. Every requested container must be present.
    pub fn parse(xml: &str, containers: &[&str], preferred_language: &str) -> TacResult<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut tables: HashMap<String, HashMap<String, CodeEntry>> = HashMap::new();
        let mut collection: Option<String> = None;
        let mut concept_uri: Option<String> = None;
        let mut labels: Vec<(String, String)> = Vec::new();
        let mut label_lang: Option<String> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"Collection" | b"Container" => {
                        collection = attr_value(&e, b"about")?.map(|uri| last_segment(&uri));
                    }
                    b"Concept" => {
                        concept_uri = attr_value(&e, b"about")?;
                        labels.clear();
                    }
                    b"label" | b"prefLabel" if concept_uri.is_some() => {
                        label_lang = Some(
                            attr_value(&e, b"lang")?.unwrap_or_else(|| "en".to_string()),
                        );
                    }
                    _ => {}
                },
                Ok(Event::Text(t)) => {
                    if let Some(lang) = label_lang.take() {
                        let text = t.unescape().map_err(TacError::from)?.into_owned();
                        labels.push((lang, text));
                    }
                }
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"Collection" | b"Container" => collection = None,
                    b"Concept" => {
                        if let (Some(container), Some(uri)) = (&collection, concept_uri.take()) {
                            if containers.contains(&container.as_str()) {
                                let token = last_segment(&uri);
                                let title = pick_title(&labels, preferred_language)
                                    .unwrap_or_else(|| token.clone());
                                tables
                                    .entry(container.clone())
                                    .or_default()
                                    .insert(token, CodeEntry { uri, title });
                            }
                        }
                        labels.clear();
                    }
                    b"label" | b"prefLabel" => label_lang = None,
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(TacError::Registry(e.to_string())),
            }
        }

        for container in containers {
            if !tables.contains_key(*container) {
                return Err(TacError::ContainerNotFound((*container).to_string()));
            }
        }
        debug!(
            containers = tables.len(),
            "loaded code-registry vocabulary tables"
        );
        Ok(CodeRegistry { tables })
    }

    pub fn lookup(&self, container: &str, token: &str) -> Option<&CodeEntry> {
        self.tables.get(container)?.get(token)
    }
}

fn attr_value(
    e: &quick_xml::events::BytesStart<'_>,
    local: &[u8],
) -> TacResult<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == local {
            let value = attr
                .unescape_value()
                .map_err(|err| TacError::Registry(err.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn last_segment(uri: &str) -> String {
    uri.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(uri)
        .to_string()
}

fn pick_title(labels: &[(String, String)], preferred: &str) -> Option<String> {
    labels
        .iter()
        .find(|(lang, _)| lang == preferred)
        .or_else(|| labels.iter().find(|(lang, _)| lang == "en"))
        .or_else(|| labels.first())
        .map(|(_, text)| text.clone())
}
