//! Content-addressed request cache.
//!
//! At most one request is in flight per key: later callers for the same key
//! await the request that is already running. Successful results are kept
//! until invalidated; failures are dropped so a manual retry fetches again.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::{BoxFuture, FutureExt, Shared};

use crate::app::ApiError;

type Outcome<V> = Result<Arc<V>, ApiError>;
type SharedFetch<V> = Shared<BoxFuture<'static, Outcome<V>>>;

enum Entry<V> {
    InFlight { id: u64, fetch: SharedFetch<V> },
    Ready(Arc<V>),
}

pub struct RequestCache<K, V> {
    entries: Mutex<HashMap<K, Entry<V>>>,
    next_id: AtomicU64,
}

impl<K, V> Default for RequestCache<K, V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl<K, V> RequestCache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + 'static,
    V: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key`, join the in-flight request for it,
    /// or start `fetch`.
    pub async fn get<F, Fut>(&self, key: K, fetch: F) -> Outcome<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
    {
        let (id, shared) = {
            let mut entries = self.lock();
            match entries.get(&key) {
                Some(Entry::Ready(value)) => {
                    tracing::debug!("Cache hit for {:?}", key);
                    return Ok(value.clone());
                }
                Some(Entry::InFlight { id, fetch }) => {
                    tracing::debug!("Joining in-flight request for {:?}", key);
                    (*id, fetch.clone())
                }
                None => self.start(&mut entries, key.clone(), fetch()),
            }
        };

        let outcome = shared.await;
        self.settle(&key, id, &outcome);
        outcome
    }

    /// Always issue a new request, replacing any cached or in-flight entry.
    pub async fn refresh<F, Fut>(&self, key: K, fetch: F) -> Outcome<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
    {
        tracing::debug!("Bypassing cache for {:?}", key);
        let (id, shared) = {
            let mut entries = self.lock();
            self.start(&mut entries, key.clone(), fetch())
        };

        let outcome = shared.await;
        self.settle(&key, id, &outcome);
        outcome
    }

    /// The settled value for `key`, if any.
    pub fn peek(&self, key: &K) -> Option<Arc<V>> {
        match self.lock().get(key) {
            Some(Entry::Ready(value)) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn is_in_flight(&self, key: &K) -> bool {
        matches!(self.lock().get(key), Some(Entry::InFlight { .. }))
    }

    /// Forget `key`. A request already running for it still completes for
    /// its current subscribers but is not stored.
    pub fn invalidate(&self, key: &K) {
        self.lock().remove(key);
    }

    pub fn invalidate_where<P: Fn(&K) -> bool>(&self, predicate: P) {
        self.lock().retain(|k, _| !predicate(k));
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, Entry<V>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn start<Fut>(
        &self,
        entries: &mut HashMap<K, Entry<V>>,
        key: K,
        fetch: Fut,
    ) -> (u64, SharedFetch<V>)
    where
        Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let shared = fetch.map(|result| result.map(Arc::new)).boxed().shared();
        entries.insert(
            key,
            Entry::InFlight {
                id,
                fetch: shared.clone(),
            },
        );
        (id, shared)
    }

    /// Store the outcome if the entry still belongs to request `id`.
    fn settle(&self, key: &K, id: u64, outcome: &Outcome<V>) {
        let mut entries = self.lock();
        let owned = matches!(entries.get(key), Some(Entry::InFlight { id: current, .. }) if *current == id);
        if !owned {
            return;
        }
        match outcome {
            Ok(value) => {
                entries.insert(key.clone(), Entry::Ready(value.clone()));
            }
            Err(_) => {
                entries.remove(key);
            }
        }
    }
}
