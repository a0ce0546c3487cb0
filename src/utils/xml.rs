//! Lightweight XML element tree used by the response normalizers.
//!
//! Both upstream APIs return documents where a repeatable element shows up
//! once or many times depending on the record. [`XmlElement::children`] always
//! yields an ordered sequence, so normalizers never branch on cardinality.
//!
//! Attributes are stored on the element they belong to, and namespace
//! prefixes are dropped from element and attribute names
//! (`opensearch:totalResults` becomes `totalResults`).

use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;

/// Errors raised while building the element tree
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// Syntax error reported by the reader
    #[error(transparent)]
    Syntax(#[from] quick_xml::Error),

    /// Malformed attribute
    #[error("malformed attribute: {0}")]
    Attribute(#[from] AttrError),

    /// Document contains no element at all
    #[error("document has no root element")]
    Empty,

    /// Closing tag without a matching opening tag
    #[error("unexpected closing tag")]
    Unbalanced,

    /// Input ended before an element was closed
    #[error("element <{0}> is never closed")]
    Unclosed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum XmlContent {
    Element(XmlElement),
    Text(String),
}

/// One parsed XML element with its attributes and content in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    name: String,
    attributes: BTreeMap<String, String>,
    content: Vec<XmlContent>,
}

impl XmlElement {
    /// Parse a document and return its root element
    pub fn parse(xml: &str) -> Result<Self, XmlError> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<XmlElement> = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Start(start) => stack.push(Self::from_start(&start)?),
                Event::Empty(start) => {
                    let element = Self::from_start(&start)?;
                    if let Some(root) = close(&mut stack, element) {
                        return Ok(root);
                    }
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or(XmlError::Unbalanced)?;
                    if let Some(root) = close(&mut stack, element) {
                        return Ok(root);
                    }
                }
                Event::Text(text) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = text.unescape_with(resolve_entity)?;
                        parent.content.push(XmlContent::Text(text.into_owned()));
                    }
                }
                Event::CData(data) => {
                    if let Some(parent) = stack.last_mut() {
                        let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                        parent.content.push(XmlContent::Text(text));
                    }
                }
                Event::Eof => {
                    return Err(match stack.pop() {
                        Some(open) => XmlError::Unclosed(open.name),
                        None => XmlError::Empty,
                    });
                }
                // Declarations, comments, doctypes and processing instructions carry no data
                _ => {}
            }
        }
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self, XmlError> {
        let mut attributes = BTreeMap::new();
        for attr in start.attributes() {
            let attr = attr?;
            if attr.key.as_namespace_binding().is_some() {
                continue;
            }
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value_with(resolve_entity)?.into_owned();
            attributes.insert(key, value);
        }

        Ok(Self {
            name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            attributes,
            content: Vec::new(),
        })
    }

    /// Local element name, without namespace prefix
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attribute value by local name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// All child elements in document order
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.content.iter().filter_map(|c| match c {
            XmlContent::Element(e) => Some(e),
            XmlContent::Text(_) => None,
        })
    }

    /// Every direct child named `name`, as a sequence regardless of how many exist
    pub fn children(&self, name: &str) -> Vec<&XmlElement> {
        self.elements().filter(|e| e.name == name).collect()
    }

    /// First direct child named `name`
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.name == name)
    }

    /// Walk down through the first child matching each name in `path`
    pub fn find(&self, path: &[&str]) -> Option<&XmlElement> {
        path.iter()
            .try_fold(self, |element, name| element.child(name))
    }

    /// Concatenated text of this element and all its descendants
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for content in &self.content {
            match content {
                XmlContent::Text(t) => out.push_str(t),
                XmlContent::Element(e) => e.collect_text(out),
            }
        }
    }

    /// Trimmed text of the first child named `name`; `None` when missing or blank
    pub fn child_text(&self, name: &str) -> Option<String> {
        self.child(name).and_then(XmlElement::trimmed_text)
    }

    /// Trimmed text of this element; `None` when blank
    pub fn trimmed_text(&self) -> Option<String> {
        let text = self.text();
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

/// Substituted for named entities with no known expansion
const UNKNOWN_ENTITY: &str = "\u{FFFD}";

/// Expand a named entity reference.
///
/// Covers the XML built-ins plus HTML names seen in upstream titles and
/// abstracts. Any other name expands to U+FFFD instead of failing the
/// document. Numeric references are handled by the reader.
fn resolve_entity(name: &str) -> Option<&'static str> {
    Some(match name {
        "lt" => "<",
        "gt" => ">",
        "amp" => "&",
        "apos" => "'",
        "quot" => "\"",
        "nbsp" => "\u{A0}",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "hellip" => "\u{2026}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201C}",
        "rdquo" => "\u{201D}",
        "aacute" => "\u{E1}",
        "eacute" => "\u{E9}",
        "iacute" => "\u{ED}",
        "oacute" => "\u{F3}",
        "uacute" => "\u{FA}",
        "egrave" => "\u{E8}",
        "auml" => "\u{E4}",
        "ouml" => "\u{F6}",
        "uuml" => "\u{FC}",
        "ccedil" => "\u{E7}",
        "ntilde" => "\u{F1}",
        "szlig" => "\u{DF}",
        "alpha" => "\u{3B1}",
        "beta" => "\u{3B2}",
        "gamma" => "\u{3B3}",
        "delta" => "\u{3B4}",
        "mu" => "\u{3BC}",
        "micro" => "\u{B5}",
        "plusmn" => "\u{B1}",
        "times" => "\u{D7}",
        "deg" => "\u{B0}",
        _ => UNKNOWN_ENTITY,
    })
}

/// Attach a finished element to its parent, or hand it back if it is the root.
fn close(stack: &mut [XmlElement], element: XmlElement) -> Option<XmlElement> {
    match stack.last_mut() {
        Some(parent) => {
            parent.content.push(XmlContent::Element(element));
            None
        }
        None => Some(element),
    }
}
