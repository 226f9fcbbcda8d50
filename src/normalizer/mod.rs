//! Feed parsing and summary cleaning.
//!
//! RSS 2.0 `<item>` and Atom `<entry>` elements are both mapped onto
//! [`RawEntry`]. Matching is done on local names only, so namespaced
//! extensions and default-namespace Atom documents need no special casing.

mod clean;
pub mod xml;

pub use clean::clean_summary;

use crate::app::Result;
use crate::domain::{RawEntry, PLACEHOLDER_TITLE};
use xml::XmlElement;

const ENTRY_NAMES: [&str; 2] = ["item", "entry"];
const SUMMARY_NAMES: [&str; 3] = ["description", "summary", "content"];
const PUBLISHED_NAMES: [&str; 3] = ["pubDate", "published", "updated"];

#[derive(Clone, Debug, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Extracts every `item`/`entry` element of the document, in document order.
    pub fn normalize(&self, body: &[u8]) -> Result<Vec<RawEntry>> {
        let root = xml::parse_document(body)?;

        let mut elements = Vec::new();
        collect_entries(&root, &mut elements);

        Ok(elements.into_iter().map(extract_entry).collect())
    }
}

// Pre-order walk over the descendants of `element`. The root itself is
// never treated as an entry.
fn collect_entries<'a>(element: &'a XmlElement, out: &mut Vec<&'a XmlElement>) {
    for child in &element.children {
        if ENTRY_NAMES.contains(&child.local_name.as_str()) {
            out.push(child);
        }
        collect_entries(child, out);
    }
}

// `guid`, `title`, `link` and the published stamp are claimed by their first
// occurrence, blank or not. The summary goes to the first non-blank candidate.
fn extract_entry(element: &XmlElement) -> RawEntry {
    let mut guid: Option<Option<String>> = None;
    let mut title: Option<Option<String>> = None;
    let mut link: Option<Option<String>> = None;
    let mut published: Option<Option<String>> = None;
    let mut summary: Option<String> = None;

    for child in &element.children {
        let name = child.local_name.as_str();
        let text = child.trimmed_text();

        let slot = match name {
            "guid" => &mut guid,
            "title" => &mut title,
            "link" => {
                link.get_or_insert_with(|| {
                    child
                        .attribute("href")
                        .filter(|href| !href.is_empty())
                        .or(text)
                        .map(str::to_string)
                });
                continue;
            }
            n if SUMMARY_NAMES.contains(&n) => {
                if summary.is_none() {
                    summary = text.map(str::to_string);
                }
                continue;
            }
            n if PUBLISHED_NAMES.contains(&n) => &mut published,
            _ => continue,
        };

        slot.get_or_insert_with(|| text.map(str::to_string));
    }

    let mut guid = guid.flatten();
    let title = title.flatten();
    let link = link.flatten();
    let published = published.flatten();

    if guid.is_none() {
        guid = link.clone();
    }

    let title = title
        .or_else(|| summary.clone())
        .unwrap_or_else(|| PLACEHOLDER_TITLE.to_string());

    RawEntry {
        guid,
        title,
        link,
        published,
        summary,
    }
}
