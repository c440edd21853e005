//! Scripted in-process upstream for HTTP tests.

use axum::extract::{OriginalUri, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct MockResponse {
  status: StatusCode,
  body: String,
  delay: Option<Duration>,
}

impl MockResponse {
  pub fn json(body: impl Into<String>) -> Self {
    Self {
      status: StatusCode::OK,
      body: body.into(),
      delay: None,
    }
  }

  pub fn status(code: u16) -> Self {
    Self {
      status: StatusCode::from_u16(code).unwrap(),
      body: r#"{"detail":"error"}"#.to_string(),
      delay: None,
    }
  }

  pub fn delayed(mut self, delay: Duration) -> Self {
    self.delay = Some(delay);
    self
  }
}

#[derive(Default)]
struct MockState {
  queue: Mutex<VecDeque<MockResponse>>,
  always: Mutex<Option<MockResponse>>,
  requests: Mutex<Vec<String>>,
}

/// Serves queued responses in order, then the `respond_always` response,
/// then 404. Records every request's path and query.
pub struct MockUpstream {
  port: u16,
  state: Arc<MockState>,
  task: JoinHandle<()>,
}

impl MockUpstream {
  pub async fn start() -> Self {
    let state = Arc::new(MockState::default());
    let app = Router::new().fallback(respond).with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let task = tokio::spawn(async move {
      axum::serve(listener, app).await.unwrap();
    });

    Self { port, state, task }
  }

  /// Endpoint root, shaped like the real one (`.../api`).
  pub fn base_url(&self) -> String {
    format!("http://127.0.0.1:{}/api", self.port)
  }

  pub fn enqueue(&self, response: MockResponse) {
    self.state.queue.lock().unwrap().push_back(response);
  }

  pub fn respond_always(&self, response: MockResponse) {
    *self.state.always.lock().unwrap() = Some(response);
  }

  pub fn requests(&self) -> Vec<String> {
    self.state.requests.lock().unwrap().clone()
  }
}

impl Drop for MockUpstream {
  fn drop(&mut self) {
    self.task.abort();
  }
}

async fn respond(State(state): State<Arc<MockState>>, OriginalUri(uri): OriginalUri) -> Response {
  let target = uri
    .path_and_query()
    .map(|pq| pq.as_str().to_string())
    .unwrap_or_else(|| uri.path().to_string());
  state.requests.lock().unwrap().push(target);

  let next = state.queue.lock().unwrap().pop_front();
  let response = next.or_else(|| state.always.lock().unwrap().clone());

  let Some(response) = response else {
    return StatusCode::NOT_FOUND.into_response();
  };

  if let Some(delay) = response.delay {
    tokio::time::sleep(delay).await;
  }

  (
    response.status,
    [(header::CONTENT_TYPE, "application/json")],
    response.body,
  )
    .into_response()
}

/// A paged envelope body.
pub fn page_body(next: Option<&str>, results: &str) -> String {
  let next = match next {
    Some(n) => format!("\"{}\"", n),
    None => "null".to_string(),
  };
  format!(
    r#"{{"count":0,"next":{},"previous":null,"results":{}}}"#,
    next, results
  )
}
