//! Serde-deserializable types matching SWAPI response envelopes.
//!
//! Records themselves live in `types`; this module only covers the wrapper
//! shapes the endpoints return.

use serde::Deserialize;

/// The paged envelope returned by `GET /<resource>/?page=N`.
///
/// `results` is required: a body without it (or a bare array) is a shape
/// mismatch and sends the fetcher down the fallback path.
#[derive(Debug, Deserialize)]
pub struct ApiPagedResponse<T> {
  #[serde(default)]
  pub count: u64,
  #[serde(default)]
  pub next: Option<String>,
  #[serde(default)]
  #[allow(dead_code)]
  pub previous: Option<String>,
  pub results: Vec<T>,
}
