//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};

/// Key for a cached query result.
pub trait QueryKey {
  /// Stable, fixed-length identifier used as the storage key.
  fn cache_hash(&self) -> String;

  /// Human-readable form for logs.
  fn description(&self) -> String;
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// When the data was cached (if from cache)
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  /// Data this caller loaded itself.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      cached_at: None,
    }
  }

  /// Data loaded by a concurrent caller this one waited on.
  pub fn joined(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Joined,
      cached_at: None,
    }
  }

  /// Data served from storage.
  pub fn from_cache(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::Cache,
      cached_at: Some(cached_at),
    }
  }
}

/// Indicates where cached data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Loaded by this caller
  Network,
  /// Loaded by another caller's in-flight request
  Joined,
  /// Stored entry within its TTL
  Cache,
}
