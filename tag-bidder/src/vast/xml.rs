//! Minimal XML element tree.
//!
//! VAST decoding needs path lookups (`Extensions/Extension/Price`), attribute
//! access and text content, nothing more. [`parse`] builds an owned tree with
//! `quick-xml` and rejects documents that are not well-formed.

use quick_xml::{Reader, events::Event};

use crate::error::{Result, TagBidderError};

/// Deepest element nesting [`parse`] accepts. VAST documents stay far below it.
pub const MAX_DEPTH: usize = 64;

/// An XML element with its attributes, child elements and direct text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    /// Tag name, including any namespace prefix.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value of the attribute `name`, unescaped.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }

    /// Direct text and CDATA content, trimmed.
    #[must_use]
    pub fn text(&self) -> &str {
        self.text.trim()
    }

    /// Child elements in document order.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// First direct child named `name`.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|child| child.name == name)
    }

    /// First element matching a `/`-separated path of child names, searched
    /// depth-first in document order.
    #[must_use]
    pub fn find(&self, path: &str) -> Option<&Self> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        self.find_segments(&segments)
    }

    /// Every element matching a `/`-separated path of child names.
    #[must_use]
    pub fn find_all(&self, path: &str) -> Vec<&Self> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut found = Vec::new();
        self.collect_segments(&segments, &mut found);
        found
    }

    fn find_segments(&self, segments: &[&str]) -> Option<&Self> {
        let Some((first, rest)) = segments.split_first() else {
            return Some(self);
        };
        self.children
            .iter()
            .filter(|child| child.name == *first)
            .find_map(|child| child.find_segments(rest))
    }

    fn collect_segments<'e>(&'e self, segments: &[&str], found: &mut Vec<&'e Self>) {
        let Some((first, rest)) = segments.split_first() else {
            found.push(self);
            return;
        };
        for child in self.children.iter().filter(|child| child.name == *first) {
            child.collect_segments(rest, found);
        }
    }
}

fn malformed(message: impl std::fmt::Display) -> TagBidderError {
    TagBidderError::MalformedResponse(message.to_string())
}

fn start_element(event: &quick_xml::events::BytesStart<'_>) -> Result<Element> {
    let name = String::from_utf8_lossy(event.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attribute in event.attributes() {
        let attribute = attribute.map_err(malformed)?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute.unescape_value().map_err(malformed)?.into_owned();
        attributes.push((key, value));
    }
    Ok(Element { name, attributes, ..Element::default() })
}

/// Parses `xml` and returns its root element.
///
/// # Errors
///
/// Returns [`TagBidderError::MalformedResponse`] for empty input, syntax
/// errors, mismatched or unclosed tags, documents with more than one root and
/// elements nested deeper than [`MAX_DEPTH`].
pub fn parse(xml: &str) -> Result<Element> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let completed = match reader.read_event().map_err(malformed)? {
            Event::Start(start) => {
                if stack.len() >= MAX_DEPTH {
                    return Err(malformed(format!("elements nested deeper than {MAX_DEPTH}")));
                }
                stack.push(start_element(&start)?);
                None
            }
            Event::Empty(start) => Some(start_element(&start)?),
            Event::End(_) => Some(stack.pop().ok_or_else(|| malformed("unexpected closing tag"))?),
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.unescape().map_err(malformed)?);
                }
                None
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
                None
            }
            Event::Eof => break,
            _ => None,
        };

        if let Some(element) = completed {
            match stack.last_mut() {
                Some(parent) => parent.children.push(element),
                None if root.is_some() => return Err(malformed("multiple root elements")),
                None => root = Some(element),
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(malformed(format!("unclosed element <{}>", open.name)));
    }
    root.ok_or_else(|| malformed("document has no root element"))
}
