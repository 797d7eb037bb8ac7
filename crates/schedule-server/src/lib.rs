//! HTTP calendar service built on `schedule-engine`.
//!
//! Registers users, schedules (possibly recurring) meetings, records each
//! member's presence response and answers two queries: which of a user's
//! meetings fall in a window, and when a group of users is next free.
//!
//! Arguments are passed as query strings (GET) or urlencoded forms
//! (POST/PUT); results are JSON. The OpenAPI document is served at
//! `/swagger/doc.json`.

pub mod config;
mod handlers;
pub mod openapi;
pub mod params;
pub mod store;

use std::future::Future;
use std::sync::Arc;

use axum::{
    routing::{get, put},
    Router,
};
use schedule_engine::SearchLimits;
use tower_http::trace::TraceLayer;

pub use handlers::ApiError;
pub use store::{Store, StoreError};

/// State shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// User and meeting registries
    pub store: Arc<Store>,
    /// Lookahead bound for free-time searches
    pub limits: SearchLimits,
}

impl AppState {
    #[must_use]
    pub fn new(limits: SearchLimits) -> Self {
        Self {
            store: Arc::new(Store::new()),
            limits,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(SearchLimits::default())
    }
}

/// Build the API router with all endpoints
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/swagger/doc.json",
            get(openapi::openapi_json).fallback(handlers::not_implemented),
        )
        .route(
            "/user",
            get(handlers::get_user)
                .post(handlers::create_user)
                .fallback(handlers::not_implemented),
        )
        .route(
            "/meeting",
            get(handlers::get_meeting)
                .post(handlers::create_meeting)
                .fallback(handlers::not_implemented),
        )
        .route(
            "/response",
            put(handlers::put_response).fallback(handlers::not_implemented),
        )
        .route(
            "/user_meetings",
            get(handlers::get_user_meetings).fallback(handlers::not_implemented),
        )
        .route(
            "/find_free_time",
            get(handlers::find_free_time).fallback(handlers::not_implemented),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API on `listener` until `shutdown` resolves.
pub async fn serve<F>(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown: F,
) -> Result<(), std::io::Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Schedule service listening on http://{}", addr);
    }
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
