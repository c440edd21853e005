//! Field-based sorting for cached collections.
//!
//! A [`SortEngine`] holds an ordered list of [`SortStrategy`] values. Each
//! strategy answers to one field name and a set of resource kinds. Requests
//! for a field nobody answers to keep the fetch order instead of failing.

mod strategies;

use chrono::{DateTime, FixedOffset};
use std::cmp::Ordering;

use crate::swapi::types::ResourceKind;

pub use strategies::builtin_strategies;

/// Read access to the fields the built-in strategies sort on.
///
/// Kind-specific fields default to absent so each record type only exposes
/// what it has.
pub trait Sortable {
  fn name(&self) -> Option<&str>;

  fn created(&self) -> Option<DateTime<FixedOffset>>;

  fn gender(&self) -> Option<&str> {
    None
  }

  fn height(&self) -> Option<&str> {
    None
  }

  fn mass(&self) -> Option<&str> {
    None
  }

  fn population(&self) -> Option<&str> {
    None
  }
}

/// Total order over two records.
pub type Comparator = fn(&dyn Sortable, &dyn Sortable) -> Ordering;

/// A named comparator scoped to the resource kinds it makes sense for.
#[derive(Clone, Copy)]
pub struct SortStrategy {
  pub field: &'static str,
  pub supports: fn(ResourceKind) -> bool,
  pub compare: Comparator,
}

impl SortStrategy {
  fn matches(&self, field: &str, kind: ResourceKind) -> bool {
    self.field.eq_ignore_ascii_case(field) && (self.supports)(kind)
  }
}

impl std::fmt::Debug for SortStrategy {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SortStrategy")
      .field("field", &self.field)
      .finish_non_exhaustive()
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
  #[default]
  Asc,
  Desc,
}

impl SortDirection {
  /// `desc` in any casing is descending, everything else ascending.
  pub fn parse(raw: &str) -> Self {
    if raw.trim().eq_ignore_ascii_case("desc") {
      Self::Desc
    } else {
      Self::Asc
    }
  }
}

/// Registry of sort strategies, dispatched by field name and resource kind.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct SortEngine {
  strategies: Vec<SortStrategy>,
}

impl Default for SortEngine {
  fn default() -> Self {
    builtin_strategies()
      .into_iter()
      .fold(Self::empty(), Self::with_strategy)
  }
}

impl SortEngine {
  /// An engine with no strategies; every field keeps fetch order.
  pub fn empty() -> Self {
    Self {
      strategies: Vec::new(),
    }
  }

  /// Register an additional strategy. Earlier registrations win on ties.
  pub fn with_strategy(mut self, strategy: SortStrategy) -> Self {
    self.strategies.push(strategy);
    self
  }

  /// First strategy answering to `field` for `kind`.
  pub fn strategy_for(&self, field: &str, kind: ResourceKind) -> Option<&SortStrategy> {
    self.strategies.iter().find(|s| s.matches(field, kind))
  }

  /// Return `items` ordered by `field`. The sort is stable, so ties and
  /// unknown fields keep the input order.
  pub fn sort<'a, T: Sortable>(
    &self,
    items: &'a [T],
    kind: ResourceKind,
    field: &str,
    direction: SortDirection,
  ) -> Vec<&'a T> {
    let mut sorted: Vec<&T> = items.iter().collect();

    let Some(strategy) = self.strategy_for(field, kind) else {
      tracing::warn!(
        "Unknown sort field '{}' for {}: keeping original order",
        field,
        kind
      );
      return sorted;
    };

    tracing::debug!(
      "Sorting {} {} by '{}' ({:?})",
      items.len(),
      kind,
      strategy.field,
      direction
    );

    let compare = strategy.compare;
    match direction {
      SortDirection::Asc => sorted.sort_by(|a, b| compare(*a, *b)),
      SortDirection::Desc => sorted.sort_by(|a, b| compare(*b, *a)),
    }
    sorted
  }
}
