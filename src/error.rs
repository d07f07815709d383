use crate::archive::error::ArchiveError;
use crate::dataset::error::DatasetError;
use crate::types::error::QueryError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to determine cache directory")]
    CacheDirResolution(#[source] std::io::Error),
}

impl WeatherError {
    /// Errors caused by the request itself rather than by the service.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            WeatherError::Query(_) | WeatherError::Archive(ArchiveError::InvalidLatitude(_))
        )
    }
}
