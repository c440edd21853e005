//! Cache keys for SWAPI collections.

use sha2::{Digest, Sha256};

use crate::cache::QueryKey;

use super::types::ResourceKind;

/// Key stand-in for "no search term".
const ALL: &str = "ALL";

/// One cached collection: a resource narrowed by an optional search term.
#[derive(Clone, Debug)]
pub struct CollectionKey {
  pub kind: ResourceKind,
  pub search: Option<String>,
}

impl CollectionKey {
  pub fn new(kind: ResourceKind, search: Option<&str>) -> Self {
    Self {
      kind,
      search: search.map(String::from),
    }
  }

  /// Lower-cased search term, or [`ALL`] when absent or blank.
  fn normalized_search(&self) -> String {
    match self.search.as_deref().map(str::trim) {
      Some(s) if !s.is_empty() => s.to_lowercase(),
      _ => ALL.to_string(),
    }
  }
}

impl QueryKey for CollectionKey {
  fn cache_hash(&self) -> String {
    let input = format!("{}:{}", self.kind.path(), self.normalized_search());

    // SHA256 hash for stable, fixed-length keys
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let result = hasher.finalize();
    hex::encode(result)
  }

  fn description(&self) -> String {
    match self.search.as_deref().map(str::trim) {
      Some(s) if !s.is_empty() => format!("{} matching '{}'", self.kind, s),
      _ => format!("all {}", self.kind),
    }
  }
}
