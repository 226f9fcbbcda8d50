use std::path::PathBuf;

use url::Url;

use crate::app::{AppContext, FeedstashError, Result};
use crate::config::Config;
use crate::export::{self, ExportFilter};
use crate::poller::{format_interval, parse_interval, Poller, PollerConfig, StopToken};
use crate::store::SqliteStore;

pub struct PollArgs {
    pub urls: Vec<String>,
    pub interval: Option<String>,
    pub db: Option<PathBuf>,
    pub snapshot: Option<PathBuf>,
    pub once: bool,
}

/// Resolves command-line overrides against `config` into a poller setup.
pub fn poll_config(config: &Config, args: PollArgs) -> Result<(PathBuf, PollerConfig)> {
    let urls = if args.urls.is_empty() {
        config.feeds.clone()
    } else {
        args.urls
    };
    if urls.is_empty() {
        return Err(FeedstashError::Config("No feed URLs configured".into()));
    }
    for url in &urls {
        Url::parse(url)?;
    }

    let interval = match args.interval {
        Some(s) => parse_interval(&s)?,
        None => config.poll.interval()?,
    };

    // A --db override moves the default snapshot along with it.
    let (db_path, default_snapshot) = match args.db {
        Some(db) => {
            let snapshot = export::default_snapshot_path(&db);
            (db, snapshot)
        }
        None => (
            config.storage.db_path.clone(),
            config.storage.snapshot_path(),
        ),
    };
    let snapshot_path = args.snapshot.unwrap_or(default_snapshot);

    Ok((
        db_path,
        PollerConfig {
            urls,
            interval,
            once: args.once,
            snapshot_path,
            initial_snapshot: config.poll.initial_snapshot,
        },
    ))
}

pub async fn poll(config: &Config, args: PollArgs, stop: StopToken) -> Result<usize> {
    let (db_path, poller_config) = poll_config(config, args)?;

    println!(
        "Polling {} feeds every {} into {}",
        poller_config.urls.len(),
        format_interval(poller_config.interval),
        db_path.display()
    );

    let ctx = AppContext::with_timeout(&db_path, config.poll.timeout())?;
    let poller = Poller::from_context(&ctx, poller_config);
    let inserted = poller.run(stop).await;

    println!("Stopped: {} new items stored", inserted);
    Ok(inserted)
}

pub fn export(
    config: &Config,
    db: Option<PathBuf>,
    out: Option<PathBuf>,
    since: Option<&str>,
    limit: Option<usize>,
) -> Result<usize> {
    let filter = ExportFilter::new(since, limit)?;
    let db_path = db.unwrap_or_else(|| config.storage.db_path.clone());
    let out_path = out.unwrap_or_else(|| config.storage.snapshot_path());

    if !db_path.exists() {
        tracing::error!("DB file not found: {}", db_path.display());
        return Err(FeedstashError::Config(format!(
            "DB file not found: {}",
            db_path.display()
        )));
    }

    let store = SqliteStore::new(&db_path)?;
    let written = export::export(&store, &out_path, &filter)?;

    println!("Exported {} items to {}", written, out_path.display());
    Ok(written)
}

pub fn config_info(path: Option<PathBuf>, init: bool) -> Result<()> {
    let path = match path {
        Some(p) => p,
        None => Config::default_config_path()?,
    };

    if init {
        Config::write_default(&path)?;
        println!("Wrote default config to {}", path.display());
    } else if path.exists() {
        println!("Config file: {}", path.display());
    } else {
        println!("Config file: {} (not present, using defaults)", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::time::Duration;

    use super::*;

    fn args() -> PollArgs {
        PollArgs {
            urls: Vec::new(),
            interval: None,
            db: None,
            snapshot: None,
            once: false,
        }
    }

    #[test]
    fn test_poll_config_uses_config_defaults() {
        let config = Config::default();
        let (db_path, poller) = poll_config(&config, args()).unwrap();

        assert_eq!(db_path, Path::new("data").join("rss_items.db"));
        assert_eq!(poller.urls.len(), 8);
        assert_eq!(poller.interval, Duration::from_secs(300));
        assert_eq!(poller.snapshot_path, Path::new("data").join("rss_items.jsonl"));
        assert!(poller.initial_snapshot);
    }

    #[test]
    fn test_poll_config_overrides() {
        let config = Config::default();
        let (db_path, poller) = poll_config(
            &config,
            PollArgs {
                urls: vec!["https://example.com/feed.xml".into()],
                interval: Some("2m".into()),
                db: Some(PathBuf::from("/tmp/x/items.db")),
                snapshot: None,
                once: true,
            },
        )
        .unwrap();

        assert_eq!(db_path, PathBuf::from("/tmp/x/items.db"));
        assert_eq!(poller.urls, vec!["https://example.com/feed.xml"]);
        assert_eq!(poller.interval, Duration::from_secs(120));
        assert_eq!(poller.snapshot_path, PathBuf::from("/tmp/x/rss_items.jsonl"));
        assert!(poller.once);
    }

    #[test]
    fn test_poll_config_rejects_invalid_url() {
        let config = Config::default();
        let result = poll_config(
            &config,
            PollArgs {
                urls: vec!["not a url".into()],
                ..args()
            },
        );
        assert!(matches!(result, Err(FeedstashError::InvalidUrl(_))));
    }

    #[test]
    fn test_poll_config_rejects_empty_feed_list() {
        let config = Config {
            feeds: Vec::new(),
            ..Config::default()
        };
        assert!(matches!(
            poll_config(&config, args()),
            Err(FeedstashError::Config(_))
        ));
    }

    #[test]
    fn test_export_requires_existing_db() {
        let dir = tempfile::tempdir().unwrap();
        let result = export(
            &Config::default(),
            Some(dir.path().join("missing.db")),
            Some(dir.path().join("out.jsonl")),
            None,
            None,
        );
        assert!(result.is_err());
        assert!(!dir.path().join("missing.db").exists());
    }
}
