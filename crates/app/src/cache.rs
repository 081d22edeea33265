//! Keyed query cache with mutation-driven invalidation.
//!
//! Each read operation is keyed by its operation name plus its input
//! parameters. A fresh resolved entry is served from cache; an identical
//! read already in flight shares the same underlying call (the entry holds
//! a [`Shared`] future); a failed fetch is never cached, so the next
//! observation retries on demand. Writes invalidate the keys that depend on
//! the written entity.
//!
//! Values are stored as `serde_json::Value` and (de)serialized at the typed
//! accessor, so one map serves every operation.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crossskill_client::StoreError;
use crossskill_core::types::EntityId;

/// Cache key: operation name plus input parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    CurrentUser,
    Profile(EntityId),
    UserSkills(EntityId),
    Catalog,
    Listings,
    Categories,
    Departments,
}

/// Observable state of a dependent read.
///
/// `Pending` covers both an in-flight fetch and a read whose prerequisite
/// input is not yet available; it is distinct from `Ready` with an empty
/// collection and from `Failed`.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState<T> {
    Pending,
    Ready(T),
    Failed(String),
}

impl<T> QueryState<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, QueryState::Pending)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            QueryState::Ready(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> From<Result<T, StoreError>> for QueryState<T> {
    fn from(result: Result<T, StoreError>) -> Self {
        match result {
            Ok(value) => QueryState::Ready(value),
            Err(e) => QueryState::Failed(e.to_string()),
        }
    }
}

type FetchResult = Result<Value, StoreError>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

enum Entry {
    InFlight(SharedFetch),
    Ready { value: Value, fetched_at: Instant },
}

/// Keyed store of read results shared across screens.
pub struct QueryCache {
    ttl: Duration,
    entries: Mutex<HashMap<QueryKey, Entry>>,
}

impl QueryCache {
    /// Create a cache with the given freshness window.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Serve `key` from cache, join an in-flight fetch for it, or run
    /// `fetch` and cache the result.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<T, StoreError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, StoreError>> + Send + 'static,
    {
        let shared = {
            let mut entries = self.lock();
            match entries.get(&key) {
                Some(Entry::Ready { value, fetched_at }) if fetched_at.elapsed() < self.ttl => {
                    return decode(value.clone());
                }
                Some(Entry::InFlight(shared)) => shared.clone(),
                _ => {
                    // Stale or absent: start one underlying call and let
                    // every concurrent identical read share it.
                    let fut = fetch();
                    let shared: SharedFetch = async move {
                        match fut.await {
                            Ok(value) => serde_json::to_value(value)
                                .map_err(|e| StoreError::Decode(e.to_string())),
                            Err(e) => Err(e),
                        }
                    }
                    .boxed()
                    .shared();
                    entries.insert(key.clone(), Entry::InFlight(shared.clone()));
                    shared
                }
            }
        };

        let result = shared.clone().await;

        {
            let mut entries = self.lock();
            // Only settle the entry if it is still the fetch we awaited;
            // an invalidation or a newer fetch may have replaced it.
            if let Some(Entry::InFlight(current)) = entries.get(&key) {
                if current.ptr_eq(&shared) {
                    match &result {
                        Ok(value) => {
                            entries.insert(
                                key.clone(),
                                Entry::Ready {
                                    value: value.clone(),
                                    fetched_at: Instant::now(),
                                },
                            );
                        }
                        // Failed fetches are not cached; the next
                        // observation retries on demand.
                        Err(_) => {
                            entries.remove(&key);
                        }
                    }
                }
            }
        }

        result.and_then(decode)
    }

    /// Mark a key stale. The next observation re-fetches.
    pub fn invalidate(&self, key: &QueryKey) {
        if self.lock().remove(key).is_some() {
            tracing::debug!(?key, "Query invalidated");
        }
    }

    /// Drop every cached read (used when the session ends).
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<QueryKey, Entry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(|e| StoreError::Decode(e.to_string()))
}
