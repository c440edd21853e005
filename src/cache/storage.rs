//! In-memory cache storage with write-based expiry and LRU eviction.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// A single cached value.
#[derive(Debug, Clone)]
pub struct CachedEntry<V> {
  /// The cached value
  pub value: V,
  /// When the value was stored
  pub cached_at: DateTime<Utc>,
}

#[derive(Debug)]
struct Slot<V> {
  entry: CachedEntry<V>,
  expires_at: Instant,
  /// Access clock value of the last read or write, for LRU eviction
  last_used: u64,
}

#[derive(Debug)]
struct Inner<V> {
  slots: HashMap<String, Slot<V>>,
  clock: u64,
}

impl<V> Inner<V> {
  fn tick(&mut self) -> u64 {
    self.clock += 1;
    self.clock
  }
}

/// Bounded in-memory storage.
///
/// Entries live for a fixed TTL counted from the write; reads do not extend
/// it. When more than `max_entries` are stored, the least recently used
/// entry is dropped.
#[derive(Debug)]
pub struct MemoryStorage<V> {
  inner: Mutex<Inner<V>>,
  ttl: Duration,
  max_entries: usize,
}

impl<V: Clone> MemoryStorage<V> {
  pub fn new(ttl: Duration, max_entries: usize) -> Self {
    Self {
      inner: Mutex::new(Inner {
        slots: HashMap::new(),
        clock: 0,
      }),
      ttl,
      max_entries,
    }
  }

  fn lock(&self) -> MutexGuard<'_, Inner<V>> {
    // Nothing in here can be left half-updated by a panic.
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Get a live entry, marking it as recently used. Expired entries are
  /// removed and reported as a miss.
  pub fn get(&self, key: &str) -> Option<CachedEntry<V>> {
    let mut inner = self.lock();
    let now = Instant::now();

    let expired = inner.slots.get(key)?.expires_at <= now;
    if expired {
      inner.slots.remove(key);
      tracing::debug!("Cache entry {} expired", key);
      return None;
    }

    let tick = inner.tick();
    let slot = inner.slots.get_mut(key)?;
    slot.last_used = tick;
    Some(slot.entry.clone())
  }

  /// Store a value, replacing any previous entry for the key.
  pub fn insert(&self, key: &str, value: V) {
    if self.max_entries == 0 {
      return;
    }

    let mut inner = self.lock();
    let now = Instant::now();
    inner.slots.retain(|_, slot| slot.expires_at > now);

    let tick = inner.tick();
    inner.slots.insert(
      key.to_string(),
      Slot {
        entry: CachedEntry {
          value,
          cached_at: Utc::now(),
        },
        expires_at: now + self.ttl,
        last_used: tick,
      },
    );

    while inner.slots.len() > self.max_entries {
      let Some(oldest) = inner
        .slots
        .iter()
        .min_by_key(|(_, slot)| slot.last_used)
        .map(|(k, _)| k.clone())
      else {
        break;
      };
      inner.slots.remove(&oldest);
      tracing::debug!("Evicted least recently used cache entry {}", oldest);
    }
  }

  /// Number of stored entries, including ones that expired but have not been
  /// swept yet.
  pub fn len(&self) -> usize {
    self.lock().slots.len()
  }
}
