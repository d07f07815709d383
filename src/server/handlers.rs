use crate::archive::client::GranuleArchive;
use crate::server::auth::Claims;
use crate::server::error::ApiError;
use crate::types::query::{WeatherCheckRequest, WeatherQuery};
use crate::types::report::WeatherReport;
use crate::weather::MerraWeather;
use crate::error::WeatherError;
use axum::extract::rejection::JsonRejection;
use axum::extract::Extension;
use axum::Json;
use chrono::Utc;
use log::info;
use serde::Serialize;
use std::sync::Arc;

pub const SERVICE_NAME: &str = "Weather Analysis Microservice";

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct AuthStatus {
    pub valid: bool,
    pub exp: u64,
}

/// GET /
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
    })
}

/// GET /health
pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// GET /auth_check, reached only with a valid token.
pub async fn auth_check(Extension(claims): Extension<Claims>) -> Json<AuthStatus> {
    Json(AuthStatus {
        valid: true,
        exp: claims.exp,
    })
}

/// POST /weather_check
pub async fn weather_check<A: GranuleArchive + 'static>(
    Extension(weather): Extension<Arc<MerraWeather<A>>>,
    body: Result<Json<WeatherCheckRequest>, JsonRejection>,
) -> Result<Json<WeatherReport>, ApiError> {
    let Json(request) = body.map_err(|rejection| ApiError::InvalidBody(rejection.body_text()))?;
    let query = WeatherQuery::try_from(request).map_err(WeatherError::from)?;
    info!(
        "Weather check at ({}, {}) within {} m for {}",
        query.location.0,
        query.location.1,
        query.radius_m,
        query.window.describe()
    );
    let report = weather.check(&query).await?;
    Ok(Json(report))
}
