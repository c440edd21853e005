//! Cached SWAPI client that wraps SwapiClient with transparent caching.

use color_eyre::Result;
use std::sync::Arc;

use crate::cache::{CacheLayer, CacheResult, CacheSource};
use crate::config::Config;

use super::cache::CollectionKey;
use super::client::{FetchError, SwapiClient};
use super::types::{Person, Planet, Record};

type CollectionCache<R> = CacheLayer<Arc<Vec<R>>, FetchError>;

/// Records with a dedicated collection cache in [`CachedSwapiClient`].
pub trait CachedRecord: Record {
  fn cache(client: &CachedSwapiClient) -> &CollectionCache<Self>;
}

impl CachedRecord for Person {
  fn cache(client: &CachedSwapiClient) -> &CollectionCache<Self> {
    &client.people
  }
}

impl CachedRecord for Planet {
  fn cache(client: &CachedSwapiClient) -> &CollectionCache<Self> {
    &client.planets
  }
}

/// SWAPI client with transparent caching support.
///
/// Each resource has its own bounded cache of complete, normalized
/// collections keyed by search term.
#[derive(Clone)]
pub struct CachedSwapiClient {
  inner: SwapiClient,
  people: CollectionCache<Person>,
  planets: CollectionCache<Planet>,
}

impl CachedSwapiClient {
  /// Create a new cached SWAPI client.
  pub fn new(config: &Config) -> Result<Self> {
    let inner = SwapiClient::new(&config.upstream)?;
    Ok(Self::with_client(inner, config))
  }

  pub fn with_client(inner: SwapiClient, config: &Config) -> Self {
    let ttl = config.cache.ttl();
    let max_entries = config.cache.max_entries;

    Self {
      inner,
      people: CacheLayer::new(ttl, max_entries),
      planets: CacheLayer::new(ttl, max_entries),
    }
  }

  /// The complete collection of `R` matching `search`, from cache when
  /// possible.
  pub async fn load_all<R: CachedRecord>(
    &self,
    search: Option<&str>,
  ) -> Result<Arc<Vec<R>>, FetchError> {
    let key = CollectionKey::new(R::KIND, search);

    let result: CacheResult<Arc<Vec<R>>> = R::cache(self)
      .fetch(&key, || {
        let inner = self.inner.clone();
        let search = search.map(String::from);
        async move { inner.fetch_all::<R>(search.as_deref()).await.map(Arc::new) }
      })
      .await?;

    match (result.source, result.cached_at) {
      (CacheSource::Cache, Some(cached_at)) => tracing::debug!(
        "Loaded {} {} from cache (stored {})",
        result.data.len(),
        R::KIND,
        cached_at
      ),
      (source, _) => tracing::debug!("Loaded {} {} ({:?})", result.data.len(), R::KIND, source),
    }

    Ok(result.data)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::UpstreamConfig;
  use crate::sorting::Sortable;
  use crate::testing::{page_body, MockResponse, MockUpstream};

  fn cached_client(upstream: &MockUpstream) -> CachedSwapiClient {
    let config = Config {
      upstream: UpstreamConfig {
        base_url: upstream.base_url(),
        ..Default::default()
      },
      ..Default::default()
    };
    CachedSwapiClient::new(&config).unwrap()
  }

  #[tokio::test]
  async fn test_second_load_is_served_from_cache() {
    let upstream = MockUpstream::start().await;
    upstream.respond_always(MockResponse::json(page_body(None, r#"[{"name":"Yoda"}]"#)));
    let client = cached_client(&upstream);

    let first = client.load_all::<Person>(None).await.unwrap();
    let second = client.load_all::<Person>(None).await.unwrap();

    assert_eq!(first.len(), 1);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(upstream.requests().len(), 1);
  }

  #[tokio::test]
  async fn test_search_keys_differ_but_ignore_case() {
    let upstream = MockUpstream::start().await;
    upstream.respond_always(MockResponse::json(page_body(None, r#"[{"name":"Yoda"}]"#)));
    let client = cached_client(&upstream);

    client.load_all::<Person>(Some("yo")).await.unwrap();
    client.load_all::<Person>(Some("YO")).await.unwrap();
    client.load_all::<Person>(None).await.unwrap();

    assert_eq!(
      upstream.requests(),
      vec!["/api/people/?page=1&search=yo", "/api/people/?page=1"]
    );
  }

  #[tokio::test]
  async fn test_resources_are_cached_separately() {
    let upstream = MockUpstream::start().await;
    upstream.enqueue(MockResponse::json(page_body(None, r#"[{"name":"Yoda"}]"#)));
    upstream.enqueue(MockResponse::json(page_body(None, r#"[{"name":"Dagobah"}]"#)));
    let client = cached_client(&upstream);

    let people = client.load_all::<Person>(None).await.unwrap();
    let planets = client.load_all::<Planet>(None).await.unwrap();

    assert_eq!(people[0].name(), Some("Yoda"));
    assert_eq!(planets[0].name(), Some("Dagobah"));
  }

  #[tokio::test]
  async fn test_concurrent_requests_share_one_fetch_chain() {
    let upstream = MockUpstream::start().await;
    upstream.enqueue(
      MockResponse::json(page_body(Some("/people/?page=2"), r#"[{"name":"A"}]"#))
        .delayed(std::time::Duration::from_millis(100)),
    );
    upstream.enqueue(MockResponse::json(page_body(None, r#"[{"name":"B"}]"#)));
    let client = cached_client(&upstream);

    let tasks: Vec<_> = (0..10)
      .map(|_| {
        let client = client.clone();
        tokio::spawn(async move { client.load_all::<Person>(Some("a")).await })
      })
      .collect();

    for task in tasks {
      let people = task.await.unwrap().unwrap();
      assert_eq!(people.len(), 2);
    }
    assert_eq!(upstream.requests().len(), 2);
  }

  #[tokio::test]
  async fn test_dropped_caller_does_not_poison_later_requests() {
    let upstream = MockUpstream::start().await;
    upstream.respond_always(
      MockResponse::json(page_body(None, r#"[{"name":"Yoda"}]"#))
        .delayed(std::time::Duration::from_millis(300)),
    );
    let config = Config {
      upstream: UpstreamConfig {
        base_url: upstream.base_url(),
        ..Default::default()
      },
      ..Default::default()
    };
    let inner = SwapiClient::new(&config.upstream)
      .unwrap()
      .with_timeout(std::time::Duration::from_secs(1));
    let client = CachedSwapiClient::with_client(inner, &config);

    let abandoned = tokio::time::timeout(
      std::time::Duration::from_millis(50),
      client.load_all::<Person>(None),
    )
    .await;
    assert!(abandoned.is_err());

    tokio::time::sleep(std::time::Duration::from_millis(1500)).await;

    let people = client.load_all::<Person>(None).await.unwrap();
    assert_eq!(people[0].name(), Some("Yoda"));
    assert_eq!(upstream.requests(), vec!["/api/people/?page=1"]);
  }

  #[tokio::test]
  async fn test_failed_fetch_is_not_cached() {
    let upstream = MockUpstream::start().await;
    // neither the paged nor the flat decode succeeds
    upstream.enqueue(MockResponse::json("{}"));
    upstream.enqueue(MockResponse::json("{}"));
    upstream.enqueue(MockResponse::json(page_body(None, r#"[{"name":"Hoth"}]"#)));
    let client = cached_client(&upstream);

    assert!(client.load_all::<Planet>(None).await.is_err());

    let planets = client.load_all::<Planet>(None).await.unwrap();
    assert_eq!(planets[0].name(), Some("Hoth"));
    assert_eq!(upstream.requests().len(), 3);
  }
}
