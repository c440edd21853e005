//! Cache layer that orchestrates storage lookups with single-flight loading.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::storage::MemoryStorage;
use super::traits::{CacheResult, QueryKey};

type SharedLoad<V, E> = Shared<BoxFuture<'static, Result<V, E>>>;
type Pending<V, E> = HashMap<String, SharedLoad<V, E>>;

/// Cache layer that manages caching logic and loading.
///
/// Concurrent misses for the same key share one loader call. Every waiter
/// receives the loader's value, or its error; errors are never stored.
///
/// Each load runs as its own task and settles storage itself, so it
/// completes even when every caller waiting on it has gone away.
pub struct CacheLayer<V, E> {
  storage: Arc<MemoryStorage<V>>,
  pending: Arc<Mutex<Pending<V, E>>>,
}

fn lock<V, E>(pending: &Mutex<Pending<V, E>>) -> MutexGuard<'_, Pending<V, E>> {
  pending.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<V, E> CacheLayer<V, E>
where
  V: Clone + Send + Sync + 'static,
  E: Clone + Send + Sync + 'static,
{
  /// Create a new cache layer with the given storage bounds.
  pub fn new(ttl: Duration, max_entries: usize) -> Self {
    Self {
      storage: Arc::new(MemoryStorage::new(ttl, max_entries)),
      pending: Arc::new(Mutex::new(HashMap::new())),
    }
  }

  /// Return the cached value for `key`, or load it.
  ///
  /// 1. Live entry in storage: returned, `loader` is not called
  /// 2. Another caller is already loading this key: wait for its result
  /// 3. Otherwise spawn `loader` and store a successful result
  pub async fn fetch<K, F, Fut>(&self, key: &K, loader: F) -> Result<CacheResult<V>, E>
  where
    K: QueryKey,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, E>> + Send + 'static,
  {
    let hash = key.cache_hash();

    if let Some(cached) = self.storage.get(&hash) {
      tracing::debug!("Cache hit for {}", key.description());
      return Ok(CacheResult::from_cache(cached.value, cached.cached_at));
    }

    let (load, leader) = {
      let mut pending = lock(&self.pending);

      // A load may have completed between the first lookup and taking the lock
      if let Some(cached) = self.storage.get(&hash) {
        return Ok(CacheResult::from_cache(cached.value, cached.cached_at));
      }

      match pending.get(&hash) {
        Some(load) => {
          tracing::debug!("Joining in-flight load for {}", key.description());
          (load.clone(), false)
        }
        None => {
          tracing::debug!("Cache miss for {}, loading", key.description());
          let load = self.spawn_load(hash.clone(), key.description(), loader());
          pending.insert(hash, load.clone());
          (load, true)
        }
      }
    };

    let data = load.await?;
    Ok(if leader {
      CacheResult::from_network(data)
    } else {
      CacheResult::joined(data)
    })
  }

  /// Run `load` on its own task. The task stores a successful value and
  /// clears the pending entry before any waiter sees the outcome.
  fn spawn_load<Fut>(&self, hash: String, description: String, load: Fut) -> SharedLoad<V, E>
  where
    Fut: Future<Output = Result<V, E>> + Send + 'static,
  {
    let storage = Arc::clone(&self.storage);
    let pending = Arc::clone(&self.pending);

    let task = tokio::spawn(async move {
      let outcome = load.await;

      let mut in_flight = lock(&pending);
      match &outcome {
        Ok(value) => {
          storage.insert(&hash, value.clone());
          tracing::debug!("Cached {} ({} entries)", description, storage.len());
        }
        Err(_) => tracing::debug!("Load failed for {}, not caching", description),
      }
      in_flight.remove(&hash);

      outcome
    });

    task
      .map(|joined| match joined {
        Ok(outcome) => outcome,
        // The task only ends early by panicking or by runtime shutdown
        Err(e) => std::panic::resume_unwind(
          e.try_into_panic()
            .unwrap_or_else(|e| Box::new(e.to_string()) as Box<dyn Any + Send>),
        ),
      })
      .boxed()
      .shared()
  }
}

impl<V, E> Clone for CacheLayer<V, E> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      pending: Arc::clone(&self.pending),
    }
  }
}
