//! # muster-api
//!
//! REST API layer for Muster. Thin plumbing over the engine: signup,
//! dropout, rosters, credit summaries, and admin sanctions.

pub mod middleware;
pub mod routes;

use axum::Router;
use muster_db::Database;
use muster_platform::ChatPlatform;
use std::sync::Arc;

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    /// Chat platform client — sanctions and force-removals notify through it.
    pub platform: Arc<dyn ChatPlatform>,
}

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(routes::games::router())
        .merge(routes::users::router())
        .merge(routes::sanctions::router())
        .merge(routes::health::router());

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}
