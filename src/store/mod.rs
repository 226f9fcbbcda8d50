pub mod sqlite;

use crate::app::Result;
use crate::domain::{Item, RawEntry};

pub use sqlite::{format_timestamp, SqliteStore, TIMESTAMP_FORMAT};

/// Append-only item storage keyed on `guid`.
pub trait Store {
    /// Inserts entries, silently skipping any whose `guid` is already stored.
    /// Returns the number of rows actually written.
    fn insert_items(&self, entries: &[RawEntry]) -> Result<usize>;

    /// Items ordered by `fetched_at` ascending, optionally restricted to
    /// `fetched_at >= since` and capped at `limit` rows.
    fn select_since(&self, since: Option<&str>, limit: Option<usize>) -> Result<Vec<Item>>;

    fn count_items(&self) -> Result<usize>;
}
