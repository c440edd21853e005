//! HTTP surface: paged people and planets endpoints.

pub mod error;
pub mod routes;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::service::SwService;

/// Shared state for every route.
#[derive(Clone)]
pub struct AppState {
  pub service: SwService,
  /// Page size applied when a request has no `size`.
  pub default_page_size: i64,
}

/// Build the router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
  Router::new()
    .route(
      "/api/people",
      get(routes::people).fallback(routes::method_not_allowed),
    )
    .route(
      "/api/planets",
      get(routes::planets).fallback(routes::method_not_allowed),
    )
    .fallback(routes::not_found)
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
