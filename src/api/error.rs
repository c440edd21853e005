//! Error envelope returned by every failing route.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::swapi::client::FetchError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
  #[error("Parameter '{name}' must be of type {expected}.")]
  InvalidParameter {
    name: &'static str,
    expected: &'static str,
  },

  #[error("Malformed query string.")]
  MalformedQuery,

  #[error("Resource not found.")]
  NotFound,

  #[error("Method {method} is not allowed. Supported: GET.")]
  MethodNotAllowed { method: String },

  #[error(transparent)]
  Upstream(#[from] FetchError),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      Self::InvalidParameter { .. } | Self::MalformedQuery => StatusCode::BAD_REQUEST,
      Self::NotFound => StatusCode::NOT_FOUND,
      Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
      Self::Upstream(FetchError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
      Self::Upstream(_) => StatusCode::BAD_GATEWAY,
    }
  }

  /// Caller-facing message. Upstream details stay in the logs.
  fn public_message(&self) -> String {
    match self {
      Self::Upstream(FetchError::Timeout(_)) => {
        "Upstream service did not respond in time. Please try again later.".to_string()
      }
      Self::Upstream(_) => "Upstream service unavailable. Please try again later.".to_string(),
      other => other.to_string(),
    }
  }

  /// Attach the request path the error is reported against.
  pub fn at(self, path: &str) -> ApiFailure {
    ApiFailure {
      error: self,
      path: path.to_string(),
    }
  }
}

/// Wire shape shared by all error responses.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
  pub timestamp: DateTime<Utc>,
  pub status: u16,
  pub error: String,
  pub message: String,
  pub path: String,
}

/// An [`ApiError`] bound to the path of the request that produced it.
#[derive(Debug)]
pub struct ApiFailure {
  error: ApiError,
  path: String,
}

impl IntoResponse for ApiFailure {
  fn into_response(self) -> Response {
    let status = self.error.status();
    let message = self.error.public_message();

    if status.is_server_error() {
      tracing::error!(
        "{} -> {} {} ({})",
        self.path,
        status.as_u16(),
        message,
        self.error
      );
    } else {
      tracing::warn!("{} -> {} {}", self.path, status.as_u16(), message);
    }

    let body = ErrorResponse {
      timestamp: Utc::now(),
      status: status.as_u16(),
      error: status.canonical_reason().unwrap_or("Error").to_string(),
      message,
      path: self.path,
    };

    (status, Json(body)).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;

  #[test]
  fn test_status_mapping() {
    let invalid = ApiError::InvalidParameter {
      name: "page",
      expected: "integer",
    };
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
    assert_eq!(
      ApiError::from(FetchError::Timeout(Duration::from_secs(10))).status(),
      StatusCode::GATEWAY_TIMEOUT
    );
    assert_eq!(
      ApiError::from(FetchError::Transport {
        url: "http://internal:1/api/people/".into(),
        reason: "connection refused".into(),
      })
      .status(),
      StatusCode::BAD_GATEWAY
    );
  }

  #[test]
  fn test_messages_do_not_leak_upstream_details() {
    let err = ApiError::from(FetchError::Transport {
      url: "http://internal:1/api/people/".into(),
      reason: "connection refused".into(),
    });
    let message = err.public_message();
    assert!(!message.contains("internal"));
    assert!(!message.contains("refused"));

    let invalid = ApiError::InvalidParameter {
      name: "size",
      expected: "integer",
    };
    assert_eq!(
      invalid.public_message(),
      "Parameter 'size' must be of type integer."
    );
  }
}
