use serde::{Deserialize, Serialize};

/// Title assigned to entries that carry neither a title nor a summary.
pub const PLACEHOLDER_TITLE: &str = "(no title)";

/// A feed entry as extracted from RSS/Atom XML, before it is stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    /// Identity key. Falls back to `link` when the feed supplies none.
    pub guid: Option<String>,
    pub title: String,
    pub link: Option<String>,
    /// Feed-supplied timestamp, kept verbatim.
    pub published: Option<String>,
    pub summary: Option<String>,
}

impl RawEntry {
    /// Whether the entry can be deduplicated against later fetches.
    pub fn has_identity(&self) -> bool {
        self.guid.as_deref().is_some_and(|g| !g.is_empty())
    }
}

/// A stored item. Never updated or removed once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub guid: Option<String>,
    pub title: Option<String>,
    pub link: Option<String>,
    pub published: Option<String>,
    pub summary: Option<String>,
    /// UTC insertion time, `YYYY-MM-DDTHH:MM:SS.ffffffZ`.
    pub fetched_at: String,
}
