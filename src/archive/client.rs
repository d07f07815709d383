//! Granule search and download against NASA Earthdata (CMR + GES DISC).

use crate::archive::error::ArchiveError;
use crate::archive::granule::{CmrErrors, CmrResponse, Granule};
use crate::archive::session::EarthdataSession;
use crate::weather::LatLon;
use chrono::NaiveDate;
use futures_util::TryStreamExt;
use log::{info, warn};
use reqwest::Client;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tokio_util::io::StreamReader;

/// MERRA-2 daily statistics of single-level diagnostics.
pub const COLLECTION_SHORT_NAME: &str = "M2SDNXSLV";
pub const CMR_URL: &str = "https://cmr.earthdata.nasa.gov";
const PAGE_SIZE: usize = 2000;

/// Granules overlapping a circle around `location` between two dates (inclusive).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchRequest {
    pub location: LatLon,
    pub radius_m: u32,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// A remote archive of granules.
pub trait GranuleArchive: Send + Sync {
    fn search(
        &self,
        request: &SearchRequest,
    ) -> impl Future<Output = Result<Vec<Granule>, ArchiveError>> + Send;

    /// Downloads every granule into `directory`, returning the written paths.
    fn download(
        &self,
        granules: &[Granule],
        directory: &Path,
    ) -> impl Future<Output = Result<Vec<PathBuf>, ArchiveError>> + Send;
}

pub struct EarthdataArchive {
    client: Client,
    cmr_url: String,
    session: Arc<EarthdataSession>,
}

impl EarthdataArchive {
    pub fn new(session: Arc<EarthdataSession>) -> Self {
        Self::with_cmr_url(session, CMR_URL)
    }

    pub fn with_cmr_url(session: Arc<EarthdataSession>, cmr_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            cmr_url: cmr_url.into().trim_end_matches('/').to_string(),
            session,
        }
    }

    async fn download_one(&self, granule: &Granule, directory: &Path) -> Result<PathBuf, ArchiveError> {
        let url = granule
            .data_url()
            .ok_or_else(|| ArchiveError::NoDataLink(granule.id.clone()))?
            .to_string();
        let target = directory.join(granule.file_name());
        let token = self.session.bearer_token().await?;

        info!("Downloading {}", url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ArchiveError::NetworkRequest(url.clone(), e))?;
        let response = response.error_for_status().map_err(|e| {
            warn!("HTTP error for {}: {:?}", url, e);
            ArchiveError::from_response_error(url.clone(), e)
        })?;

        // Written next to the target so the final rename stays on one filesystem.
        let temp_file = NamedTempFile::new_in(directory)
            .map_err(|e| ArchiveError::DownloadIo(target.clone(), e))?;
        let (std_file, temp_path) = temp_file.into_parts();
        let mut file = tokio::fs::File::from_std(std_file);

        let stream = response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
        let mut reader = StreamReader::new(stream);
        let bytes = tokio::io::copy(&mut reader, &mut file)
            .await
            .map_err(|e| ArchiveError::DownloadIo(target.clone(), e))?;
        file.flush()
            .await
            .map_err(|e| ArchiveError::DownloadIo(target.clone(), e))?;
        drop(file);

        temp_path
            .persist(&target)
            .map_err(|e| ArchiveError::DownloadIo(target.clone(), e.error))?;
        info!("Stored {} bytes in {}", bytes, target.display());
        Ok(target)
    }
}

impl GranuleArchive for EarthdataArchive {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Granule>, ArchiveError> {
        let url = format!("{}/search/granules.json", self.cmr_url);
        let LatLon(lat, lon) = request.location;
        let temporal = format!(
            "{}T00:00:00Z,{}T23:59:59Z",
            request.start.format("%Y-%m-%d"),
            request.end.format("%Y-%m-%d")
        );
        let circle = format!("{},{},{}", lon, lat, request.radius_m);
        let page_size = PAGE_SIZE.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("short_name", COLLECTION_SHORT_NAME),
                ("temporal", temporal.as_str()),
                ("circle", circle.as_str()),
                ("page_size", page_size.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                warn!("Granule search request to {} failed: {:?}", url, e);
                ArchiveError::UnknownSearch(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.map_err(|e| {
                ArchiveError::UnknownSearch(format!("search failed with status {status}: {e}"))
            })?;
            warn!("Granule search failed with status {}: {}", status, body);
            return Err(classify_search_failure(&body));
        }

        let parsed: CmrResponse = response
            .json()
            .await
            .map_err(|e| ArchiveError::UnknownSearch(e.to_string()))?;
        Ok(parsed.into_granules())
    }

    async fn download(
        &self,
        granules: &[Granule],
        directory: &Path,
    ) -> Result<Vec<PathBuf>, ArchiveError> {
        let mut paths = Vec::with_capacity(granules.len());
        for granule in granules {
            paths.push(self.download_one(granule, directory).await?);
        }
        info!("Downloaded {} files to {}", paths.len(), directory.display());
        Ok(paths)
    }
}

/// Maps a rejected search to the error the caller can act on.
pub(crate) fn classify_search_failure(body: &str) -> ArchiveError {
    let message = serde_json::from_str::<CmrErrors>(body)
        .ok()
        .filter(|errors| !errors.errors.is_empty())
        .map(|errors| errors.errors.join("; "))
        .unwrap_or_else(|| body.trim().to_string());
    if message.contains("within -90 and 90") {
        ArchiveError::InvalidLatitude(message)
    } else {
        ArchiveError::UnknownSearch(message)
    }
}
