//! Built-in sort strategies.
//!
//! Every comparator is total: missing or malformed values fall back to a
//! fixed default (first for text and dates, zero for numbers) rather than
//! failing the sort.

use std::cmp::Ordering;

use super::{SortStrategy, Sortable};
use crate::swapi::normalize::{self, UNKNOWN_GENDER};
use crate::swapi::types::ResourceKind;

/// The strategies every engine starts with, in dispatch order.
pub fn builtin_strategies() -> Vec<SortStrategy> {
  vec![
    SortStrategy {
      field: "name",
      supports: any_kind,
      compare: by_name,
    },
    SortStrategy {
      field: "created",
      supports: any_kind,
      compare: by_created,
    },
    SortStrategy {
      field: "gender",
      supports: people_only,
      compare: by_gender,
    },
    SortStrategy {
      field: "height",
      supports: people_only,
      compare: by_height,
    },
    SortStrategy {
      field: "mass",
      supports: people_only,
      compare: by_mass,
    },
    SortStrategy {
      field: "population",
      supports: planets_only,
      compare: by_population,
    },
  ]
}

fn any_kind(_: ResourceKind) -> bool {
  true
}

fn people_only(kind: ResourceKind) -> bool {
  kind == ResourceKind::People
}

fn planets_only(kind: ResourceKind) -> bool {
  kind == ResourceKind::Planet
}

/// Case-insensitive comparison without allocating lowered copies.
fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
  a.chars()
    .flat_map(char::to_lowercase)
    .cmp(b.chars().flat_map(char::to_lowercase))
}

/// `None` sorts before any value.
fn cmp_text(a: Option<&str>, b: Option<&str>) -> Ordering {
  match (a, b) {
    (Some(a), Some(b)) => cmp_ignore_case(a, b),
    (a, b) => a.is_some().cmp(&b.is_some()),
  }
}

fn by_name(a: &dyn Sortable, b: &dyn Sortable) -> Ordering {
  cmp_text(a.name(), b.name())
}

fn by_created(a: &dyn Sortable, b: &dyn Sortable) -> Ordering {
  a.created().cmp(&b.created())
}

fn by_gender(a: &dyn Sortable, b: &dyn Sortable) -> Ordering {
  cmp_ignore_case(
    a.gender().unwrap_or(UNKNOWN_GENDER),
    b.gender().unwrap_or(UNKNOWN_GENDER),
  )
}

fn by_height(a: &dyn Sortable, b: &dyn Sortable) -> Ordering {
  normalize::numeric_or_zero(a.height()).total_cmp(&normalize::numeric_or_zero(b.height()))
}

fn by_mass(a: &dyn Sortable, b: &dyn Sortable) -> Ordering {
  normalize::numeric_or_zero(a.mass()).total_cmp(&normalize::numeric_or_zero(b.mass()))
}

fn by_population(a: &dyn Sortable, b: &dyn Sortable) -> Ordering {
  normalize::numeric_or_zero(a.population())
    .total_cmp(&normalize::numeric_or_zero(b.population()))
}
