use axum::extract::rejection::QueryRejection;
use axum::extract::{OriginalUri, Query, State};
use axum::http::Method;
use axum::Json;
use serde::Deserialize;

use crate::pagination::Page;
use crate::service::{PageRequest, DEFAULT_SORT_FIELD};
use crate::sorting::SortDirection;
use crate::swapi::types::{Person, Planet};

use super::error::{ApiError, ApiFailure};
use super::AppState;

/// Raw query parameters. Parsed by hand so a bad value names its parameter.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
  page: Option<String>,
  size: Option<String>,
  search: Option<String>,
  sort: Option<String>,
  dir: Option<String>,
}

impl PageParams {
  fn into_request(self, default_page_size: i64) -> Result<PageRequest, ApiError> {
    Ok(PageRequest {
      page: parse_int("page", self.page.as_deref(), 0)?,
      size: parse_int("size", self.size.as_deref(), default_page_size)?,
      search: non_blank(self.search),
      sort: non_blank(self.sort).unwrap_or_else(|| DEFAULT_SORT_FIELD.to_string()),
      dir: self
        .dir
        .as_deref()
        .map(SortDirection::parse)
        .unwrap_or_default(),
    })
  }
}

fn parse_int(name: &'static str, raw: Option<&str>, default: i64) -> Result<i64, ApiError> {
  match raw.map(str::trim) {
    None | Some("") => Ok(default),
    Some(value) => value.parse().map_err(|_| ApiError::InvalidParameter {
      name,
      expected: "integer",
    }),
  }
}

fn non_blank(value: Option<String>) -> Option<String> {
  value.filter(|v| !v.trim().is_empty())
}

fn page_request(
  state: &AppState,
  params: Result<Query<PageParams>, QueryRejection>,
) -> Result<PageRequest, ApiError> {
  let Query(params) = params.map_err(|rejection| {
    tracing::debug!("Rejected query string: {}", rejection);
    ApiError::MalformedQuery
  })?;
  params.into_request(state.default_page_size)
}

pub async fn people(
  State(state): State<AppState>,
  OriginalUri(uri): OriginalUri,
  params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<Page<Person>>, ApiFailure> {
  let request = page_request(&state, params).map_err(|e| e.at(uri.path()))?;
  let page = state
    .service
    .get_people(&request)
    .await
    .map_err(|e| ApiError::from(e).at(uri.path()))?;
  Ok(Json(page))
}

pub async fn planets(
  State(state): State<AppState>,
  OriginalUri(uri): OriginalUri,
  params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<Page<Planet>>, ApiFailure> {
  let request = page_request(&state, params).map_err(|e| e.at(uri.path()))?;
  let page = state
    .service
    .get_planets(&request)
    .await
    .map_err(|e| ApiError::from(e).at(uri.path()))?;
  Ok(Json(page))
}

pub async fn not_found(OriginalUri(uri): OriginalUri) -> ApiFailure {
  ApiError::NotFound.at(uri.path())
}

pub async fn method_not_allowed(method: Method, OriginalUri(uri): OriginalUri) -> ApiFailure {
  ApiError::MethodNotAllowed {
    method: method.to_string(),
  }
  .at(uri.path())
}
