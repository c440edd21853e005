use chrono::{DateTime, FixedOffset};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;

use super::normalize;
use crate::sorting::Sortable;

/// The two collections the proxy serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
  People,
  Planet,
}

impl ResourceKind {
  /// Path segment of the upstream endpoint.
  pub fn path(self) -> &'static str {
    match self {
      Self::People => "people",
      Self::Planet => "planets",
    }
  }
}

impl fmt::Display for ResourceKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.path())
  }
}

/// An upstream entity the proxy can fetch, cache and sort.
///
/// Field cleanup happens while decoding, so a deserialized record is already
/// normalized and is never mutated afterwards.
pub trait Record:
  Sortable + Clone + fmt::Debug + Send + Sync + Serialize + DeserializeOwned + 'static
{
  const KIND: ResourceKind;
}

fn unknown_gender() -> String {
  normalize::UNKNOWN_GENDER.to_string()
}

/// A person from `/people/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Person {
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default, deserialize_with = "normalize::deserialize_numeric")]
  pub height: Option<String>,
  #[serde(default, deserialize_with = "normalize::deserialize_numeric")]
  pub mass: Option<String>,
  #[serde(default)]
  pub hair_color: Option<String>,
  #[serde(default)]
  pub skin_color: Option<String>,
  #[serde(default)]
  pub eye_color: Option<String>,
  #[serde(default)]
  pub birth_year: Option<String>,
  #[serde(
    default = "unknown_gender",
    deserialize_with = "normalize::deserialize_gender"
  )]
  pub gender: String,
  #[serde(default)]
  pub homeworld: Option<String>,
  #[serde(default)]
  pub films: Vec<String>,
  #[serde(default)]
  pub species: Vec<String>,
  #[serde(default)]
  pub vehicles: Vec<String>,
  #[serde(default)]
  pub starships: Vec<String>,
  #[serde(
    default,
    deserialize_with = "normalize::deserialize_timestamp",
    serialize_with = "normalize::serialize_timestamp"
  )]
  pub created: Option<DateTime<FixedOffset>>,
  #[serde(
    default,
    deserialize_with = "normalize::deserialize_timestamp",
    serialize_with = "normalize::serialize_timestamp"
  )]
  pub edited: Option<DateTime<FixedOffset>>,
  #[serde(default)]
  pub url: Option<String>,
}

/// A planet from `/planets/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Planet {
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub rotation_period: Option<String>,
  #[serde(default)]
  pub orbital_period: Option<String>,
  #[serde(default)]
  pub diameter: Option<String>,
  #[serde(default)]
  pub climate: Option<String>,
  #[serde(default)]
  pub gravity: Option<String>,
  #[serde(default)]
  pub terrain: Option<String>,
  #[serde(default)]
  pub surface_water: Option<String>,
  #[serde(default, deserialize_with = "normalize::deserialize_numeric")]
  pub population: Option<String>,
  #[serde(default)]
  pub residents: Vec<String>,
  #[serde(default)]
  pub films: Vec<String>,
  #[serde(
    default,
    deserialize_with = "normalize::deserialize_timestamp",
    serialize_with = "normalize::serialize_timestamp"
  )]
  pub created: Option<DateTime<FixedOffset>>,
  #[serde(
    default,
    deserialize_with = "normalize::deserialize_timestamp",
    serialize_with = "normalize::serialize_timestamp"
  )]
  pub edited: Option<DateTime<FixedOffset>>,
  #[serde(default)]
  pub url: Option<String>,
}

impl Record for Person {
  const KIND: ResourceKind = ResourceKind::People;
}

impl Record for Planet {
  const KIND: ResourceKind = ResourceKind::Planet;
}

impl Sortable for Person {
  fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }

  fn created(&self) -> Option<DateTime<FixedOffset>> {
    self.created
  }

  fn gender(&self) -> Option<&str> {
    Some(&self.gender)
  }

  fn height(&self) -> Option<&str> {
    self.height.as_deref()
  }

  fn mass(&self) -> Option<&str> {
    self.mass.as_deref()
  }
}

impl Sortable for Planet {
  fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }

  fn created(&self) -> Option<DateTime<FixedOffset>> {
    self.created
  }

  fn population(&self) -> Option<&str> {
    self.population.as_deref()
  }
}
