//! HTTP surface: public status routes plus bearer-protected weather look-ups.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;

use crate::archive::client::GranuleArchive;
use crate::server::auth::TokenValidator;
use crate::server::error::ApiError;
use crate::weather::MerraWeather;
use axum::extract::{Extension, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Builds the service router.
pub fn create_router<A: GranuleArchive + 'static>(
    weather: Arc<MerraWeather<A>>,
    tokens: Arc<TokenValidator>,
) -> Router {
    let protected = Router::new()
        .route("/auth_check", get(handlers::auth_check))
        .route("/weather_check", post(handlers::weather_check::<A>))
        .route_layer(middleware::from_fn(require_bearer));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .merge(protected)
        .layer(Extension(weather))
        .layer(Extension(tokens))
        .layer(CorsLayer::permissive())
}

/// Rejects requests without a valid bearer token and hands the claims on.
async fn require_bearer(
    Extension(tokens): Extension<Arc<TokenValidator>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = tokens.authorize(request.headers())?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}
