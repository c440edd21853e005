use color_eyre::{eyre::eyre, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use crate::config::UpstreamConfig;
use crate::swapi::api_types::ApiPagedResponse;
use crate::swapi::types::{Record, ResourceKind};

/// Failure while materializing a collection from upstream.
///
/// Cloneable so every caller waiting on a shared load gets the same error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
  #[error("upstream answered {status} for {url}")]
  Status { status: u16, url: String },

  #[error("unexpected response shape from {url}: {reason}")]
  Decode { url: String, reason: String },

  #[error("unusable upstream url '{url}': {reason}")]
  InvalidUrl { url: String, reason: String },

  #[error("request to {url} failed: {reason}")]
  Transport { url: String, reason: String },

  #[error("upstream did not complete within {0:?}")]
  Timeout(Duration),
}

impl FetchError {
  /// Failures caused by the upstream not honouring the paged contract.
  /// These send the fetcher to the flat endpoint instead of failing.
  pub fn is_format_problem(&self) -> bool {
    matches!(
      self,
      Self::Status { .. } | Self::Decode { .. } | Self::InvalidUrl { .. }
    )
  }
}

/// SWAPI client that materializes whole collections.
///
/// Walks `next` links page by page, falls back to the flat endpoint when the
/// paged one misbehaves, and bounds the whole operation by a page cap and a
/// timeout.
#[derive(Clone)]
pub struct SwapiClient {
  http: reqwest::Client,
  /// Endpoint root, always with a trailing slash so joins stay under it
  root: Url,
  /// Last path segment of `root`, stripped from next links that repeat it
  root_segment: Option<String>,
  timeout: Duration,
  max_pages: usize,
}

impl SwapiClient {
  pub fn new(config: &UpstreamConfig) -> Result<Self> {
    let mut root = Url::parse(&config.base_url)
      .map_err(|e| eyre!("Invalid upstream url {}: {}", config.base_url, e))?;
    if !root.path().ends_with('/') {
      let path = format!("{}/", root.path());
      root.set_path(&path);
    }

    let root_segment = root
      .path_segments()
      .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
      .map(String::from);

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    let http = reqwest::Client::builder()
      .default_headers(headers)
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      root,
      root_segment,
      timeout: config.timeout(),
      max_pages: config.max_pages.max(1),
    })
  }

  /// Override the overall fetch timeout.
  #[allow(dead_code)]
  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  /// Fetch the complete collection of `R`, optionally narrowed by a search
  /// term. Blank search terms are ignored.
  pub async fn fetch_all<R: Record>(&self, search: Option<&str>) -> Result<Vec<R>, FetchError> {
    let search = search.filter(|s| !s.trim().is_empty());
    tracing::info!(
      "Fetching all {} (search: '{}')",
      R::KIND,
      search.unwrap_or_default()
    );

    tokio::time::timeout(self.timeout, self.fetch_with_fallback::<R>(search))
      .await
      .map_err(|_| {
        tracing::error!("Fetching {} timed out after {:?}", R::KIND, self.timeout);
        FetchError::Timeout(self.timeout)
      })?
  }

  async fn fetch_with_fallback<R: Record>(
    &self,
    search: Option<&str>,
  ) -> Result<Vec<R>, FetchError> {
    match self.walk_pages::<R>(search).await {
      Ok(records) => {
        tracing::info!(
          "Pagination complete - {} total {} (search: '{}')",
          records.len(),
          R::KIND,
          search.unwrap_or_default()
        );
        Ok(records)
      }
      Err(e) if e.is_format_problem() => {
        tracing::warn!("Pagination of {} failed, trying fallback: {}", R::KIND, e);
        self.fetch_flat::<R>(search).await
      }
      Err(e) => {
        tracing::error!("Unexpected pagination error for {}: {}", R::KIND, e);
        Err(e)
      }
    }
  }

  /// Follow `next` links from page 1 until they run out or the page cap is
  /// reached, concatenating results in visitation order.
  async fn walk_pages<R: Record>(&self, search: Option<&str>) -> Result<Vec<R>, FetchError> {
    let mut url = self.page_url(R::KIND, 1, search)?;
    let mut records = Vec::new();
    let mut pages = 0;

    loop {
      let page: ApiPagedResponse<R> = self.get_json(&url).await?;
      pages += 1;
      tracing::debug!(
        "Retrieved {} page {}: {} items (count {}), next: {:?}",
        R::KIND,
        pages,
        page.results.len(),
        page.count,
        page.next
      );
      records.extend(page.results);

      let Some(next) = page.next.filter(|n| !n.trim().is_empty()) else {
        break;
      };
      if pages >= self.max_pages {
        tracing::warn!(
          "Stopped walking {} after {} pages; upstream still reports more",
          R::KIND,
          pages
        );
        break;
      }

      url = self.resolve_next(&next)?;
      tracing::debug!("Following next link '{}' -> '{}'", next, url);
    }

    Ok(records)
  }

  /// Single request to the non-paginated endpoint, filtered locally.
  ///
  /// An HTTP error status here yields an empty collection; other failures
  /// propagate.
  async fn fetch_flat<R: Record>(&self, search: Option<&str>) -> Result<Vec<R>, FetchError> {
    let url = self.resource_url(R::KIND)?;

    match self.get_json::<Vec<R>>(&url).await {
      Ok(records) => {
        let records = filter_by_name(records, search);
        tracing::info!(
          "Fallback endpoint returned {} {} (search: '{}')",
          records.len(),
          R::KIND,
          search.unwrap_or_default()
        );
        Ok(records)
      }
      Err(FetchError::Status { status, url }) => {
        tracing::error!(
          "{} fallback failed - status {} from {}, serving empty collection",
          R::KIND,
          status,
          url
        );
        Ok(Vec::new())
      }
      Err(e) => Err(e),
    }
  }

  async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, FetchError> {
    let transport = |e: reqwest::Error| FetchError::Transport {
      url: url.to_string(),
      reason: e.to_string(),
    };

    let response = self.http.get(url.clone()).send().await.map_err(transport)?;

    let status = response.status();
    if !status.is_success() {
      return Err(FetchError::Status {
        status: status.as_u16(),
        url: url.to_string(),
      });
    }

    let body = response.bytes().await.map_err(transport)?;
    serde_json::from_slice(&body).map_err(|e| FetchError::Decode {
      url: url.to_string(),
      reason: e.to_string(),
    })
  }

  /// `<root>/<resource>/`
  fn resource_url(&self, kind: ResourceKind) -> Result<Url, FetchError> {
    let path = format!("{}/", kind.path());
    self.root.join(&path).map_err(|e| FetchError::InvalidUrl {
      url: path,
      reason: e.to_string(),
    })
  }

  /// `<root>/<resource>/?page=N[&search=S]`
  fn page_url(
    &self,
    kind: ResourceKind,
    page: u32,
    search: Option<&str>,
  ) -> Result<Url, FetchError> {
    let mut url = self.resource_url(kind)?;
    {
      let mut query = url.query_pairs_mut();
      query.append_pair("page", &page.to_string());
      if let Some(search) = search {
        query.append_pair("search", search);
      }
    }
    Ok(url)
  }

  /// Turn a `next` link into a request URL.
  ///
  /// Absolute links are used as-is. Relative ones resolve against the root,
  /// after dropping one leading segment that repeats the root's own last
  /// segment (`/api/people/?page=2` against `.../api/`).
  fn resolve_next(&self, next: &str) -> Result<Url, FetchError> {
    let next = next.trim();
    let invalid = |e: url::ParseError| FetchError::InvalidUrl {
      url: next.to_string(),
      reason: e.to_string(),
    };

    let lower = next.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
      return Url::parse(next).map_err(invalid);
    }

    let mut path = next;
    if let Some(segment) = &self.root_segment {
      let prefix = format!("/{}/", segment);
      if path.starts_with(&prefix) {
        path = &path[prefix.len() - 1..];
      }
    }

    self.root.join(path.trim_start_matches('/')).map_err(invalid)
  }
}

/// Case-insensitive substring match on the record name.
fn filter_by_name<R: Record>(records: Vec<R>, search: Option<&str>) -> Vec<R> {
  let Some(needle) = search.map(str::to_lowercase) else {
    return records;
  };

  records
    .into_iter()
    .filter(|r| {
      r.name()
        .is_some_and(|name| name.to_lowercase().contains(&needle))
    })
    .collect()
}
