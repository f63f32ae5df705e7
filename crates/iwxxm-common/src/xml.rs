//! Owned XML element tree.
//!
//! The IWXXM encoders assemble documents out of schema order (shared
//! elements are built first and cross-referenced later), so they need a
//! mutable tree rather than a streaming writer. Serialization goes
//! through `quick_xml::Writer`, which handles escaping.

use std::io::Cursor;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::TacResult;

/// One XML element: qualified name, ordered attributes, optional leading
/// text, ordered children.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    name: String,
    attrs: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        XmlElement {
            name: name.into(),
            attrs: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set an attribute, replacing any existing value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(attr) = self.attrs.iter_mut().find(|(k, _)| *k == key) {
            attr.1 = value;
        } else {
            self.attrs.push((key, value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn remove_attr(&mut self, key: &str) {
        self.attrs.retain(|(k, _)| k != key);
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Append a new child element and return a mutable reference to it.
    pub fn child(&mut self, name: impl Into<String>) -> &mut XmlElement {
        self.children.push(XmlElement::new(name));
        self.children.last_mut().unwrap()
    }

    /// Append an already-built element.
    pub fn push(&mut self, element: XmlElement) {
        self.children.push(element);
    }

    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut [XmlElement] {
        &mut self.children
    }

    pub fn last_child_mut(&mut self) -> Option<&mut XmlElement> {
        self.children.last_mut()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// First descendant matching a `/`-separated path of qualified names,
    /// searched one level per path segment.
    pub fn find(&self, path: &str) -> Option<&XmlElement> {
        let mut current = self;
        for tag in path.split('/') {
            current = current.children.iter().find(|c| c.name == tag)?;
        }
        Some(current)
    }

    pub fn find_mut(&mut self, path: &str) -> Option<&mut XmlElement> {
        let mut current = self;
        for tag in path.split('/') {
            current = current.children.iter_mut().find(|c| c.name == tag)?;
        }
        Some(current)
    }

    /// Serialize to a UTF-8 XML string (no declaration, no pretty
    /// printing — the interchange format is whitespace-insensitive).
    pub fn to_xml_string(&self) -> TacResult<String> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        self.write(&mut writer)?;
        let bytes = writer.into_inner().into_inner();
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn write(&self, writer: &mut Writer<Cursor<Vec<u8>>>) -> TacResult<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (k, v) in &self.attrs {
            start.push_attribute((k.as_str(), v.as_str()));
        }

        if self.text.is_none() && self.children.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        if let Some(text) = &self.text {
            writer.write_event(Event::Text(BytesText::new(text)))?;
        }
        for child in &self.children {
            child.write(writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_element_self_closes() {
        let el = XmlElement::new("iwxxm:trendForecast");
        assert_eq!(el.to_xml_string().unwrap(), "<iwxxm:trendForecast/>");
    }

    #[test]
    fn test_attributes_and_text() {
        let mut el = XmlElement::new("iwxxm:airTemperature");
        el.set("uom", "Cel");
        el.set_text("-3");
        assert_eq!(
            el.to_xml_string().unwrap(),
            "<iwxxm:airTemperature uom=\"Cel\">-3</iwxxm:airTemperature>"
        );
    }

    #[test]
    fn test_set_replaces() {
        let mut el = XmlElement::new("x");
        el.set("a", "1");
        el.set("a", "2");
        assert_eq!(el.get("a"), Some("2"));
        assert_eq!(el.to_xml_string().unwrap(), "<x a=\"2\"/>");
    }

    #[test]
    fn test_nested_find() {
        let mut root = XmlElement::new("root");
        root.child("a").child("b").set_text("deep");
        assert_eq!(root.find("a/b").unwrap().text(), Some("deep"));
        assert!(root.find("a/c").is_none());
    }

    #[test]
    fn test_text_is_escaped() {
        let mut el = XmlElement::new("t");
        el.set_text("a < b & c");
        assert_eq!(el.to_xml_string().unwrap(), "<t>a &lt; b &amp; c</t>");
    }
}
