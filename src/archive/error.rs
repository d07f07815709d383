use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The search service rejected the point because its latitude is out of range.
    #[error("Latitude must be within -90 and 90: {0}")]
    InvalidLatitude(String),

    #[error("Granule search failed: {0}")]
    UnknownSearch(String),

    #[error("Earthdata login failed: {0}")]
    Login(String),

    #[error("No Earthdata credentials found, set EARTHDATA_TOKEN or EARTHDATA_USERNAME and EARTHDATA_PASSWORD")]
    MissingCredentials,

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Granule '{0}' has no downloadable data link")]
    NoDataLink(String),

    #[error("Failed to write granule file '{0}'")]
    DownloadIo(PathBuf, #[source] std::io::Error),

    #[error("Failed to create cache directory '{0}'")]
    CacheDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to read cache directory '{0}'")]
    CacheRead(PathBuf, #[source] std::io::Error),
}

impl ArchiveError {
    /// Wraps a reqwest error raised for `url`, keeping the HTTP status when there is one.
    pub(crate) fn from_response_error(url: String, error: reqwest::Error) -> Self {
        match error.status() {
            Some(status) => ArchiveError::HttpStatus {
                url,
                status,
                source: error,
            },
            None => ArchiveError::NetworkRequest(url, error),
        }
    }
}
