//! Route definitions and router construction.

use axum::Router;
use axum::http::{HeaderValue, Method, Uri};
use axum::routing::{delete, get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::CorsConfig;
use crate::error::ApiError;
use crate::handlers;
use crate::state::AppState;

/// Build CORS layer from configuration.
fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    match config {
        CorsConfig::AllowAll => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        CorsConfig::AllowOrigins(origins) => {
            let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }
}

/// API routes without the `/api` prefix.
pub(crate) fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/envs", get(handlers::envs::get))
        .route("/repos", get(handlers::repos::list))
        .route("/repos/charts", get(handlers::repos::list_charts))
        .route("/repos/add", post(handlers::repos::add))
        .route("/repos/remove/", delete(handlers::repos::remove_unnamed))
        .route("/repos/remove/{reponame}", delete(handlers::repos::remove))
        .route("/repos/update", put(handlers::repos::update))
        .fallback(unknown_route)
}

/// Create the main router.
///
/// Axum 0.8 uses brace syntax for path parameters: `{reponame}`
pub fn create_router(state: AppState, cors_config: &CorsConfig) -> Router {
    Router::new()
        .route("/", get(welcome))
        .nest("/api", api_routes().with_state(state))
        .layer(build_cors_layer(cors_config))
        .layer(TraceLayer::new_for_http())
}

async fn welcome() -> &'static str {
    "Welcome to the chart repository proxy"
}

async fn unknown_route(method: Method, uri: Uri) -> ApiError {
    ApiError::BadRequest(format!("no route for {} {}", method, uri))
}
