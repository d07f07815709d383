//! Main entry point: look up historical MERRA-2 weather around a point.
//!
//! A [`MerraWeather`] client searches the archive for the granules covering a
//! query, reuses the local cache when it already holds all of them, reads the
//! nearest grid point and returns one [`YearlyRecord`] per requested year.

use crate::archive::cache::GranuleCache;
use crate::archive::client::{EarthdataArchive, GranuleArchive, SearchRequest};
use crate::archive::session::EarthdataSession;
use crate::dataset::error::DatasetError;
use crate::dataset::extractor::{extract_years, PointSeries};
use crate::dataset::reader::GriddedDataset;
use crate::error::WeatherError;
use crate::types::query::{DateWindow, WeatherQuery, YearSpan};
use crate::types::report::{WeatherReport, YearlyRecord};
use crate::utils::{ensure_cache_dir_exists, get_cache_dir};
use bon::bon;
use log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task;

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
///
/// # Examples
///
/// ```
/// use merra_weather::LatLon;
///
/// let oviedo = LatLon(43.36, -5.84);
/// assert_eq!(oviedo.0, 43.36); // Latitude
/// assert_eq!(oviedo.1, -5.84); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon(pub f64, pub f64);

/// The client for historical weather look-ups.
///
/// Generic over the [`GranuleArchive`] it downloads from; the server uses
/// [`EarthdataArchive`]. Downloaded granules are kept in a cache directory
/// and reused by later queries covering the same days.
pub struct MerraWeather<A> {
    archive: A,
    cache: GranuleCache,
    archive_years: YearSpan,
}

#[bon]
impl<A: GranuleArchive> MerraWeather<A> {
    /// Creates a client storing granules in `cache_folder`, which is created
    /// if missing. The archive years default to [`YearSpan::default`].
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::CacheDirCreation`] if the directory cannot be created.
    pub async fn with_cache_folder(archive: A, cache_folder: PathBuf) -> Result<Self, WeatherError> {
        ensure_cache_dir_exists(&cache_folder)
            .await
            .map_err(|e| WeatherError::CacheDirCreation(cache_folder.clone(), e))?;
        Ok(Self {
            archive,
            cache: GranuleCache::new(cache_folder),
            archive_years: YearSpan::default(),
        })
    }

    /// Restricts look-ups to the years the archive is known to hold.
    pub fn with_archive_years(mut self, archive_years: YearSpan) -> Self {
        self.archive_years = archive_years;
        self
    }

    pub fn archive(&self) -> &A {
        &self.archive
    }

    pub fn cache_dir(&self) -> &Path {
        self.cache.cache_dir()
    }

    pub fn archive_years(&self) -> YearSpan {
        self.archive_years
    }

    /// Looks up the daily values of `window` near `location`.
    ///
    /// This method uses a builder pattern.
    ///
    /// * `.location(LatLon)`: **Required.** The point to look up.
    /// * `.radius_m(u32)`: **Required.** Search radius in meters; the nearest
    ///   grid point must lie within it.
    /// * `.window(DateWindow)`: **Required.** Days and years to return.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::Query`] if the location or radius is invalid,
    /// [`WeatherError::Archive`] if searching or downloading fails and
    /// [`WeatherError::Dataset`] if the granules cannot be read or no grid
    /// point lies within the radius.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use merra_weather::{DateWindow, EarthdataSession, LatLon, MerraWeather, WeatherError};
    /// # use std::sync::Arc;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), WeatherError> {
    /// let session = Arc::new(EarthdataSession::from_env()?);
    /// let client = MerraWeather::new(session).await?;
    ///
    /// let report = client
    ///     .weather_check()
    ///     .location(LatLon(43.36, -5.84))
    ///     .radius_m(30_000)
    ///     .window(DateWindow::single_year(2020, 8, 12, 14)?)
    ///     .call()
    ///     .await?;
    /// println!("{}", report.date_range);
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn weather_check(
        &self,
        location: LatLon,
        radius_m: u32,
        window: DateWindow,
    ) -> Result<WeatherReport, WeatherError> {
        let query = WeatherQuery::new(location, radius_m, window)?;
        self.check(&query).await
    }

    /// Runs an already validated query.
    pub async fn check(&self, query: &WeatherQuery) -> Result<WeatherReport, WeatherError> {
        let archived = query.window.archived_years(self.archive_years);
        let mut records = if archived.is_empty() {
            info!("No archived years in {} for this query", self.archive_years);
            Vec::new()
        } else {
            let files = self.acquire(query, &archived).await?;
            if files.is_empty() {
                info!("No granules found for this query");
                Vec::new()
            } else {
                Self::extract(files, *query, archived).await?
            }
        };

        for year in query.window.requested_years(self.archive_years) {
            if !records.iter().any(|record| record.year == year) {
                records.push(YearlyRecord::empty(year));
            }
        }
        Ok(WeatherReport::assemble(query, records))
    }

    /// Searches every year, then reuses the cache or downloads the granules.
    async fn acquire(&self, query: &WeatherQuery, years: &[i32]) -> Result<Vec<PathBuf>, WeatherError> {
        let mut granules = Vec::new();
        for year in years {
            let Some((start, end)) = query.window.dates_in_year(*year) else {
                continue;
            };
            info!("Searching year {}...", year);
            let request = SearchRequest {
                location: query.location,
                radius_m: query.radius_m,
                start,
                end,
            };
            granules.extend(self.archive.search(&request).await?);
        }
        info!("Found {} total granules", granules.len());

        let resolution = self
            .cache
            .resolve(&self.archive, &granules, &query.window, years)
            .await?;
        Ok(resolution.into_files())
    }

    /// Reads the files on a blocking thread; the dataset is closed before returning.
    async fn extract(
        files: Vec<PathBuf>,
        query: WeatherQuery,
        years: Vec<i32>,
    ) -> Result<Vec<YearlyRecord>, DatasetError> {
        task::spawn_blocking(move || {
            let dataset = GriddedDataset::open(&files)?;
            let point = dataset.nearest_grid_point(query.location, query.radius_m)?;
            info!(
                "Selected grid point ({}, {}) {:.0} m from the target",
                point.lat, point.lon, point.distance_m
            );
            let series = PointSeries::new(dataset.point_series(&point)?);
            extract_years(&series, &query.window, &years)
        })
        .await?
    }
}

impl MerraWeather<EarthdataArchive> {
    /// Creates a client for NASA Earthdata using the default cache directory
    /// (e.g. `~/.cache/merra_weather_cache` on Linux).
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::CacheDirResolution`] if the default cache directory cannot be found.
    /// Returns [`WeatherError::CacheDirCreation`] if it cannot be created.
    pub async fn new(session: Arc<EarthdataSession>) -> Result<Self, WeatherError> {
        let cache_folder = get_cache_dir().map_err(WeatherError::CacheDirResolution)?;
        Self::with_cache_folder(EarthdataArchive::new(session), cache_folder).await
    }
}
