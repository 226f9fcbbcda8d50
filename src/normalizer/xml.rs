//! Minimal owned XML tree built on top of `quick-xml` events.
//!
//! Element and attribute names are stored by local name only, so
//! `<atom:link>`, `<link>` and `<{ns}link>` all compare equal.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::app::{FeedstashError, Result};

/// Nesting limit for feed documents. Real feeds stay well below this.
const MAX_DEPTH: usize = 256;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub local_name: String,
    pub attributes: Vec<(String, String)>,
    /// Character data before the first child element.
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn attribute(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == local_name)
            .map(|(_, value)| value.as_str())
    }

    /// Leading text with surrounding whitespace removed, `None` when blank.
    pub fn trimmed_text(&self) -> Option<&str> {
        let text = self.text.trim();
        (!text.is_empty()).then_some(text)
    }
}

fn parse_error(msg: impl std::fmt::Display) -> FeedstashError {
    FeedstashError::Parse(msg.to_string())
}

/// Parses a whole document and returns its root element.
pub fn parse_document(body: &[u8]) -> Result<XmlElement> {
    let mut reader = Reader::from_reader(body);
    let mut buf = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event_into(&mut buf).map_err(|e| {
            parse_error(format!("at byte {}: {}", reader.buffer_position(), e))
        })? {
            Event::Start(e) => {
                if root.is_some() {
                    return Err(parse_error("junk after document element"));
                }
                if stack.len() >= MAX_DEPTH {
                    return Err(parse_error(format!(
                        "nesting depth exceeds {} levels",
                        MAX_DEPTH
                    )));
                }
                stack.push(open_element(&e, &reader)?);
            }
            Event::Empty(e) => {
                if root.is_some() {
                    return Err(parse_error("junk after document element"));
                }
                let element = open_element(&e, &reader)?;
                close_element(element, &mut stack, &mut root);
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| parse_error("unexpected closing tag"))?;
                close_element(element, &mut stack, &mut root);
            }
            Event::Text(e) => {
                let text = e.unescape().map_err(parse_error)?;
                append_text(&mut stack, &text);
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e);
                append_text(&mut stack, &text);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(parse_error(format!(
            "unclosed element <{}>",
            open.local_name
        )));
    }

    root.ok_or_else(|| parse_error("no root element found"))
}

fn open_element(e: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<XmlElement> {
    let local_name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();

    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(parse_error)?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .decode_and_unescape_value(reader.decoder())
            .map_err(parse_error)?
            .into_owned();
        attributes.push((key, value));
    }

    Ok(XmlElement {
        local_name,
        attributes,
        ..Default::default()
    })
}

fn close_element(
    element: XmlElement,
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}

// Text after a child element (the "tail") is not part of the parent's text.
// Text outside the root (BOM, whitespace) is ignored.
fn append_text(stack: &mut [XmlElement], text: &str) {
    if let Some(current) = stack.last_mut() {
        if current.children.is_empty() {
            current.text.push_str(text);
        }
    }
}
