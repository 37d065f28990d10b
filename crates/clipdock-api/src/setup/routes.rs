//! Router assembly: public and authenticated routes plus the middleware
//! stack around them.

use crate::auth::{auth_middleware, AuthState, TokenVerifier};
use crate::handlers::{health, videos};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use clipdock_core::Config;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

const DEFAULT_HTTP_CONCURRENCY: usize = 1024;

/// Build the full application router.
///
/// `/healthz` stays outside the auth boundary; everything under `/api`
/// passes through the bearer-token middleware first.
pub fn setup_routes(state: AppState) -> Router {
    let auth_state = Arc::new(AuthState {
        verifier: Arc::new(TokenVerifier::new(state.config.jwt_secret.as_bytes())),
    });

    let public_routes = Router::new().route("/healthz", get(health::liveness));

    let protected_routes = Router::new()
        .route("/api/videos", post(videos::create_video))
        .route("/api/videos/{video_id}", get(videos::get_video))
        .route("/api/videos/{video_id}/upload", post(videos::upload_video))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ));

    let concurrency = std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(DEFAULT_HTTP_CONCURRENCY)
        .max(1);

    // RequestBodyLimitLayer takes over from axum's default body cap so the
    // configured ceiling is the only one in effect.
    public_routes
        .merge(protected_routes)
        .layer(ConcurrencyLimitLayer::new(concurrency))
        .layer(RequestBodyLimitLayer::new(state.config.max_upload_bytes))
        .layer(DefaultBodyLimit::disable())
        .layer(setup_cors(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn setup_cors(config: &Config) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];

    if config.cors_origins.iter().any(|o| o == "*") {
        // Config validation already refuses this in production.
        tracing::warn!("CORS allows any origin");
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(Any)
}
