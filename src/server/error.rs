use crate::archive::error::ArchiveError;
use crate::dataset::error::DatasetError;
use crate::error::WeatherError;
use crate::server::auth::AuthError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{error, warn};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Weather(#[from] WeatherError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Auth(AuthError::Expired) => StatusCode::UNAUTHORIZED,
            ApiError::Auth(AuthError::Invalid) => StatusCode::FORBIDDEN,
            ApiError::InvalidBody(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Weather(e) if e.is_validation() => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Weather(WeatherError::Dataset(DatasetError::NoGridPointWithinRadius { .. })) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Weather(WeatherError::Archive(
                ArchiveError::UnknownSearch(_)
                | ArchiveError::Login(_)
                | ArchiveError::NetworkRequest(..)
                | ArchiveError::HttpStatus { .. }
                | ArchiveError::NoDataLink(_)
                | ArchiveError::DownloadIo(..),
            )) => StatusCode::BAD_GATEWAY,
            ApiError::Weather(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {:?}", self);
        } else if status != StatusCode::FORBIDDEN && status != StatusCode::UNAUTHORIZED {
            warn!("Request rejected: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
