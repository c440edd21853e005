//! Generic in-process caching layer.
//!
//! This module provides a resource-agnostic caching mechanism that:
//! - Stores values under hashed query keys for a fixed time from write
//! - Bounds the entry count with least-recently-used eviction
//! - Collapses concurrent misses for one key into a single load
//! - Never stores failed loads

mod layer;
mod storage;
mod traits;

pub use layer::CacheLayer;
pub use traits::{CacheResult, CacheSource, QueryKey};
