//! Request-level facade: cached collection -> sort -> page.

use std::sync::Arc;

use crate::pagination::{paginate, Page};
use crate::sorting::{SortDirection, SortEngine};
use crate::swapi::cached_client::{CachedRecord, CachedSwapiClient};
use crate::swapi::client::FetchError;
use crate::swapi::types::{Person, Planet};

/// Sort field applied when a request leaves it blank.
pub const DEFAULT_SORT_FIELD: &str = "name";

/// One page request for a resource.
#[derive(Debug, Clone)]
pub struct PageRequest {
  pub page: i64,
  pub size: i64,
  pub search: Option<String>,
  pub sort: String,
  pub dir: SortDirection,
}

impl Default for PageRequest {
  fn default() -> Self {
    Self {
      page: 0,
      size: 15,
      search: None,
      sort: DEFAULT_SORT_FIELD.to_string(),
      dir: SortDirection::Asc,
    }
  }
}

/// Serves sorted, paginated pages of cached collections.
#[derive(Clone)]
pub struct SwService {
  client: CachedSwapiClient,
  sort_engine: Arc<SortEngine>,
}

impl SwService {
  pub fn new(client: CachedSwapiClient, sort_engine: SortEngine) -> Self {
    Self {
      client,
      sort_engine: Arc::new(sort_engine),
    }
  }

  pub async fn get_people(&self, request: &PageRequest) -> Result<Page<Person>, FetchError> {
    self.get_page(request).await
  }

  pub async fn get_planets(&self, request: &PageRequest) -> Result<Page<Planet>, FetchError> {
    self.get_page(request).await
  }

  /// Load the collection for `request.search`, order it and cut out the
  /// requested page.
  pub async fn get_page<R: CachedRecord>(
    &self,
    request: &PageRequest,
  ) -> Result<Page<R>, FetchError> {
    tracing::info!(
      "Request: {} (page={}, size={}, search='{}', sort='{}', dir={:?})",
      R::KIND,
      request.page,
      request.size,
      request.search.as_deref().unwrap_or_default(),
      request.sort,
      request.dir
    );

    let all = self.client.load_all::<R>(request.search.as_deref()).await?;

    let sort_field = match request.sort.trim() {
      "" => DEFAULT_SORT_FIELD,
      field => field,
    };
    let sorted = self
      .sort_engine
      .sort(all.as_slice(), R::KIND, sort_field, request.dir);

    let page = paginate(sorted, request.page, request.size).map(R::clone);

    tracing::info!(
      "Response: {} items (total={}, page={}, size={})",
      page.items.len(),
      page.total,
      page.page,
      page.size
    );
    Ok(page)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{Config, UpstreamConfig};
  use crate::testing::{page_body, MockResponse, MockUpstream};

  fn service_for(upstream: &MockUpstream) -> SwService {
    let config = Config {
      upstream: UpstreamConfig {
        base_url: upstream.base_url(),
        ..Default::default()
      },
      ..Default::default()
    };
    SwService::new(
      CachedSwapiClient::new(&config).unwrap(),
      SortEngine::default(),
    )
  }

  fn names(page: &Page<Person>) -> Vec<&str> {
    page.items.iter().filter_map(|p| p.name.as_deref()).collect()
  }

  #[tokio::test]
  async fn test_search_sort_and_paginate() {
    let upstream = MockUpstream::start().await;
    upstream.respond_always(MockResponse::json(page_body(
      None,
      r#"[{"name":"Luke Skywalker"},{"name":"Anakin Skywalker"},{"name":"Shmi Skywalker"}]"#,
    )));
    let service = service_for(&upstream);

    let page = service
      .get_people(&PageRequest {
        size: 2,
        search: Some("skY".to_string()),
        ..Default::default()
      })
      .await
      .unwrap();

    assert_eq!(page.total, 3);
    assert_eq!(names(&page), vec!["Anakin Skywalker", "Luke Skywalker"]);
    assert_eq!(upstream.requests(), vec!["/api/people/?page=1&search=skY"]);
  }

  #[tokio::test]
  async fn test_sort_by_created_descending() {
    let upstream = MockUpstream::start().await;
    upstream.respond_always(MockResponse::json(page_body(
      None,
      r#"[
        {"name":"A","created":"2020-01-01T00:00:00Z"},
        {"name":"B","created":"2021-01-01T00:00:00Z"}
      ]"#,
    )));
    let service = service_for(&upstream);

    let page = service
      .get_people(&PageRequest {
        sort: "created".to_string(),
        dir: SortDirection::Desc,
        ..Default::default()
      })
      .await
      .unwrap();

    assert_eq!(names(&page), vec!["B", "A"]);
  }

  #[tokio::test]
  async fn test_out_of_range_page_keeps_total() {
    let upstream = MockUpstream::start().await;
    let results: Vec<String> = (0..10).map(|i| format!(r#"{{"name":"P{}"}}"#, i)).collect();
    upstream.respond_always(MockResponse::json(page_body(
      None,
      &format!("[{}]", results.join(",")),
    )));
    let service = service_for(&upstream);

    let page = service
      .get_people(&PageRequest {
        page: 5,
        size: 15,
        ..Default::default()
      })
      .await
      .unwrap();

    assert_eq!(page.total, 10);
    assert!(page.items.is_empty());
    assert_eq!((page.page, page.size), (5, 15));
  }

  #[tokio::test]
  async fn test_blank_sort_defaults_to_name_and_unknown_keeps_order() {
    let upstream = MockUpstream::start().await;
    upstream.respond_always(MockResponse::json(page_body(
      None,
      r#"[{"name":"Naboo"},{"name":"Alderaan"}]"#,
    )));
    let service = service_for(&upstream);

    let by_default = service
      .get_planets(&PageRequest {
        sort: " ".to_string(),
        ..Default::default()
      })
      .await
      .unwrap();
    let planets: Vec<_> = by_default.items.iter().filter_map(|p| p.name.as_deref()).collect();
    assert_eq!(planets, vec!["Alderaan", "Naboo"]);

    let unsorted = service
      .get_planets(&PageRequest {
        sort: "climate".to_string(),
        ..Default::default()
      })
      .await
      .unwrap();
    let planets: Vec<_> = unsorted.items.iter().filter_map(|p| p.name.as_deref()).collect();
    assert_eq!(planets, vec!["Naboo", "Alderaan"]);
  }
}
