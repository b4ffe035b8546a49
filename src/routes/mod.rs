//! Gateway Routes
//!
//! HTTP surface consumed by the session layer's [`ApiClient`](crate::api::ApiClient):
//! - `/api/esearch-summary-history/` - paginated search with history tokens
//! - `/api/efetch/` - full article records by repeated `ids`
//! - `/api/health` - liveness

pub mod details;
pub mod error;
pub mod health;
pub mod search;

pub use error::GatewayError;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::cors_layer;
use crate::models::AppState;

/// Create the gateway router with CORS and request tracing applied.
pub fn create_router(state: AppState) -> Router {
    info!("Creating gateway router");

    let cors = cors_layer(&state.config.server.cors_allowed_origins);

    Router::new()
        .merge(search::router(state.clone()))
        .merge(details::router(state.clone()))
        .merge(health::router(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}
