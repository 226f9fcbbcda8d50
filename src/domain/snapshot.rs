use serde::Serialize;

use crate::domain::Item;
use crate::normalizer::clean_summary;

/// One line of the JSONL snapshot: a stored item with its summary cleaned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotRecord {
    pub guid: Option<String>,
    pub title: Option<String>,
    pub link: Option<String>,
    pub published: Option<String>,
    pub summary: Option<String>,
    pub fetched_at: String,
}

impl From<Item> for SnapshotRecord {
    fn from(item: Item) -> Self {
        Self {
            summary: clean_summary(item.summary.as_deref()),
            guid: item.guid,
            title: item.title,
            link: item.link,
            published: item.published,
            fetched_at: item.fetched_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_is_cleaned() {
        let item = Item {
            guid: Some("a".into()),
            title: Some("Title".into()),
            link: None,
            published: None,
            summary: Some("<p>Storm &amp; flood</p> Read more".into()),
            fetched_at: "2025-10-25T00:00:00.000000Z".into(),
        };
        let record = SnapshotRecord::from(item);
        assert_eq!(record.summary.as_deref(), Some("Storm & flood"));
        assert_eq!(record.guid.as_deref(), Some("a"));
    }

    #[test]
    fn test_serializes_null_summary() {
        let record = SnapshotRecord {
            guid: Some("a".into()),
            title: Some("T".into()),
            link: None,
            published: None,
            summary: None,
            fetched_at: "2025-10-25T00:00:00.000000Z".into(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"guid":"a","title":"T","link":null,"published":null,"summary":null,"fetched_at":"2025-10-25T00:00:00.000000Z"}"#
        );
    }
}
