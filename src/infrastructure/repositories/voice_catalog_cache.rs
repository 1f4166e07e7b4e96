use crate::domain::shared::Clock;
use chrono::{DateTime, Duration, Utc};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

struct Entry<T> {
    value: T,
    fetched_at: DateTime<Utc>,
}

/// Single-value cache with a time-to-live measured against an injected clock.
///
/// Concurrent callers that find the entry stale wait on the same lock, so at
/// most one refresh is in flight. A failed refresh leaves the old entry alone.
pub struct CatalogCache<T> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entry: Mutex<Option<Entry<T>>>,
}

impl<T: Clone> CatalogCache<T> {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entry: Mutex::new(None),
        }
    }

    pub async fn get_or_refresh<F, Fut, E>(&self, refresh: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut entry = self.entry.lock().await;
        let now = self.clock.now();

        if let Some(cached) = entry.as_ref() {
            if now - cached.fetched_at < self.ttl {
                return Ok(cached.value.clone());
            }
        }

        let value = refresh().await?;
        *entry = Some(Entry {
            value: value.clone(),
            fetched_at: now,
        });
        Ok(value)
    }
}
