use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Duration, SubsecRound, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use rusqlite_migration::{Migrations, M};

use crate::app::{FeedstashError, Result};
use crate::domain::{Item, RawEntry};
use crate::store::Store;

/// Fixed-width UTC format used for `fetched_at`. Lexicographic order of
/// these strings matches chronological order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
    last_fetched_at: Mutex<Option<DateTime<Utc>>>,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path`, creating missing parent
    /// directories first.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::from_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(conn),
            last_fetched_at: Mutex::new(None),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.conn()?;
        migrations.to_latest(&mut conn)?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            FeedstashError::Storage(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    /// Current time, bumped past the previous stamp so stamps handed out by
    /// this store are strictly increasing even if the wall clock steps back.
    fn next_fetched_at(&self) -> Result<String> {
        let mut last = self.last_fetched_at.lock().map_err(|e| {
            FeedstashError::Storage(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })?;

        let mut now = Utc::now().trunc_subsecs(6);
        if let Some(prev) = *last {
            if now <= prev {
                now = prev + Duration::microseconds(1);
            }
        }
        *last = Some(now);

        Ok(format_timestamp(now))
    }

    fn row_to_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<Item> {
        Ok(Item {
            guid: row.get(0)?,
            title: row.get(1)?,
            link: row.get(2)?,
            published: row.get(3)?,
            summary: row.get(4)?,
            fetched_at: row.get(5)?,
        })
    }
}

impl Store for SqliteStore {
    fn insert_items(&self, entries: &[RawEntry]) -> Result<usize> {
        let mut conn = self.conn()?;

        let tx = conn.transaction()?;
        let mut count = 0;

        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO items (guid, title, link, published, summary, fetched_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;

            for entry in entries {
                if !entry.has_identity() {
                    tracing::debug!(title = %entry.title, "Storing item without guid or link, it cannot be deduplicated");
                }
                let fetched_at = self.next_fetched_at()?;
                let inserted = stmt.execute(params![
                    entry.guid,
                    entry.title,
                    entry.link,
                    entry.published,
                    entry.summary,
                    fetched_at
                ])?;
                if inserted == 0 {
                    tracing::debug!(guid = ?entry.guid, "Skipping already stored item");
                }
                count += inserted;
            }
        }

        tx.commit()?;
        Ok(count)
    }

    fn select_since(&self, since: Option<&str>, limit: Option<usize>) -> Result<Vec<Item>> {
        let conn = self.conn()?;

        let mut sql =
            String::from("SELECT guid, title, link, published, summary, fetched_at FROM items");
        let mut values: Vec<Value> = Vec::new();

        if let Some(since) = since {
            sql.push_str(" WHERE fetched_at >= ?");
            values.push(Value::Text(since.to_string()));
        }
        sql.push_str(" ORDER BY fetched_at ASC, id ASC");
        if let Some(limit) = limit {
            sql.push_str(" LIMIT ?");
            values.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
        }

        tracing::debug!(%sql, ?since, ?limit, "Selecting items");

        let mut stmt = conn.prepare(&sql)?;
        let items = stmt
            .query_map(params_from_iter(values.iter()), Self::row_to_item)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(items)
    }

    fn count_items(&self) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
