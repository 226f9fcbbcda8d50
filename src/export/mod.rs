//! JSONL snapshot of stored items.
//!
//! One JSON object per line with the fields `guid, title, link, published,
//! summary, fetched_at`. Summaries go through [`clean_summary`] on the way
//! out. The file is a best-effort cache: it is truncated and rewritten on
//! each export and a failure part-way leaves it partially written.
//!
//! [`clean_summary`]: crate::normalizer::clean_summary

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::app::{FeedstashError, Result};
use crate::domain::{Item, SnapshotRecord};
use crate::store::{format_timestamp, Store};

/// Snapshot file name used when none is configured.
pub const DEFAULT_SNAPSHOT_NAME: &str = "rss_items.jsonl";

/// Row selection for an export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportFilter {
    /// Inclusive lower bound on `fetched_at`, already in store format.
    pub since: Option<String>,
    /// Row cap, applied after ordering and the `since` filter.
    pub limit: Option<usize>,
}

impl ExportFilter {
    /// Builds a filter from user input, normalising `since` with [`parse_since`].
    pub fn new(since: Option<&str>, limit: Option<usize>) -> Result<Self> {
        Ok(Self {
            since: since.map(parse_since).transpose()?,
            limit,
        })
    }
}

/// Normalises a user supplied timestamp to the store's `fetched_at` format.
///
/// Accepts RFC 3339 (`2025-10-25T08:00:00+08:00`), naive ISO-8601 with or
/// without a trailing `Z` and fractional seconds (taken as UTC), and bare
/// dates (midnight UTC).
pub fn parse_since(input: &str) -> Result<String> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(format_timestamp(dt.with_timezone(&Utc)));
    }

    let naive = input.strip_suffix('Z').unwrap_or(input);
    let parsed = NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M"))
        .or_else(|_| {
            NaiveDate::parse_from_str(naive, "%Y-%m-%d")
                .map(|d| d.and_hms_opt(0, 0, 0).unwrap_or_default())
        })
        .map_err(|e| FeedstashError::InvalidTimestamp(format!("{}: {}", input, e)))?;

    Ok(format_timestamp(parsed.and_utc()))
}

/// Snapshot path used beside a database: `<db dir>/rss_items.jsonl`.
pub fn default_snapshot_path(db_path: &Path) -> PathBuf {
    match db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(dir) => dir.join(DEFAULT_SNAPSHOT_NAME),
        None => Path::new("data").join(DEFAULT_SNAPSHOT_NAME),
    }
}

/// Writes `items` to `path` as JSONL, creating missing parent directories.
/// Returns the number of records written.
pub fn write_snapshot<I>(items: I, path: &Path) -> Result<usize>
where
    I: IntoIterator<Item = Item>,
{
    let io_err = |source: std::io::Error| FeedstashError::Export {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
    let mut written = 0;

    for item in items {
        let line = serde_json::to_string(&SnapshotRecord::from(item))?;
        writer.write_all(line.as_bytes()).map_err(io_err)?;
        writer.write_all(b"\n").map_err(io_err)?;
        written += 1;
    }

    writer.flush().map_err(io_err)?;
    Ok(written)
}

/// Selects items from `store` and writes them to `path`.
pub fn export<S: Store + ?Sized>(store: &S, path: &Path, filter: &ExportFilter) -> Result<usize> {
    let items = store.select_since(filter.since.as_deref(), filter.limit)?;
    let written = write_snapshot(items, path)?;
    tracing::info!("Exported {} items to {}", written, path.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::domain::RawEntry;
    use crate::store::SqliteStore;

    fn entry(guid: &str, summary: &str) -> RawEntry {
        RawEntry {
            guid: Some(guid.into()),
            title: guid.to_uppercase(),
            link: None,
            published: None,
            summary: Some(summary.into()),
        }
    }

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_parse_since_formats() {
        assert_eq!(
            parse_since("2025-10-25T00:00:00Z").unwrap(),
            "2025-10-25T00:00:00.000000Z"
        );
        assert_eq!(
            parse_since("2025-10-25T00:00:00").unwrap(),
            "2025-10-25T00:00:00.000000Z"
        );
        assert_eq!(
            parse_since("2025-10-25T08:30:00.25+08:00").unwrap(),
            "2025-10-25T00:30:00.250000Z"
        );
        assert_eq!(
            parse_since("2025-10-25T01:02:03.123456Z").unwrap(),
            "2025-10-25T01:02:03.123456Z"
        );
        assert_eq!(parse_since("2025-10-25").unwrap(), "2025-10-25T00:00:00.000000Z");
    }

    #[test]
    fn test_parse_since_rejects_garbage() {
        assert!(matches!(
            parse_since("yesterday"),
            Err(FeedstashError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_default_snapshot_path() {
        assert_eq!(
            default_snapshot_path(Path::new("data/rss_items.db")),
            Path::new("data").join("rss_items.jsonl")
        );
        assert_eq!(
            default_snapshot_path(Path::new("items.db")),
            Path::new("data").join("rss_items.jsonl")
        );
    }

    #[test]
    fn test_export_writes_cleaned_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out").join("snapshot.jsonl");
        let store = SqliteStore::in_memory().unwrap();
        store
            .insert_items(&[
                entry("a", "<p>Hello &amp; welcome</p>"),
                entry(
                    "b",
                    "<p>We use cookies to ensure the best experience. Read more</p>",
                ),
            ])
            .unwrap();

        let written = export(&store, &out, &ExportFilter::default()).unwrap();
        assert_eq!(written, 2);

        let lines = read_lines(&out);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["guid"], "a");
        assert_eq!(lines[0]["title"], "A");
        assert_eq!(lines[0]["summary"], "Hello & welcome");
        assert!(lines[0]["link"].is_null());
        assert!(lines[1]["summary"].is_null());

        let mut keys: Vec<_> = lines[0].as_object().unwrap().keys().cloned().collect();
        keys.sort();
        let mut expected = vec!["fetched_at", "guid", "link", "published", "summary", "title"];
        expected.sort();
        assert_eq!(keys, expected);
    }

    #[test]
    fn test_export_future_since_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("snapshot.jsonl");
        let store = SqliteStore::in_memory().unwrap();
        store.insert_items(&[entry("a", "x")]).unwrap();

        let filter = ExportFilter::new(Some("9999-01-01T00:00:00Z"), None).unwrap();
        assert_eq!(export(&store, &out, &filter).unwrap(), 0);
        assert_eq!(fs::read_to_string(&out).unwrap(), "");
    }

    #[test]
    fn test_export_limit_applies_after_since() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("snapshot.jsonl");
        let store = SqliteStore::in_memory().unwrap();
        store
            .insert_items(&[entry("a", "x"), entry("b", "y"), entry("c", "z")])
            .unwrap();
        let all = store.select_since(None, None).unwrap();

        let filter = ExportFilter {
            since: Some(all[1].fetched_at.clone()),
            limit: Some(1),
        };
        assert_eq!(export(&store, &out, &filter).unwrap(), 1);
        assert_eq!(read_lines(&out)[0]["guid"], "b");
    }

    #[test]
    fn test_non_ascii_written_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("snapshot.jsonl");
        let store = SqliteStore::in_memory().unwrap();
        store.insert_items(&[entry("ñ", "Bagyong “Kristine”")]).unwrap();

        export(&store, &out, &ExportFilter::default()).unwrap();
        let raw = fs::read_to_string(&out).unwrap();
        assert!(raw.contains("Bagyong “Kristine”"));
        assert!(raw.ends_with('\n'));
    }
}
