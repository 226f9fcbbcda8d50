use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::app::error::Result;
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::normalizer::Normalizer;
use crate::store::SqliteStore;

pub struct AppContext {
    pub store: Arc<SqliteStore>,
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
    pub normalizer: Normalizer,
}

impl AppContext {
    pub fn with_timeout(db_path: &Path, timeout: Duration) -> Result<Self> {
        let store = Arc::new(SqliteStore::new(db_path)?);
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::with_timeout(timeout)?);

        Ok(Self {
            store,
            fetcher,
            normalizer: Normalizer::new(),
        })
    }
}
