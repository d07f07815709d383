use crate::archive::client::GranuleArchive;
use crate::archive::error::ArchiveError;
use crate::archive::granule::Granule;
use crate::types::calendar::dates_between;
use crate::types::query::DateWindow;
use log::{info, warn};
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

const GRANULE_EXTENSION: &str = "nc4";

/// Files that will be opened for a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Every granule was already cached.
    Cached(Vec<PathBuf>),
    /// The full granule set was downloaded.
    Downloaded(Vec<PathBuf>),
}

impl Resolution {
    pub fn files(&self) -> &[PathBuf] {
        match self {
            Resolution::Cached(files) | Resolution::Downloaded(files) => files,
        }
    }

    pub fn into_files(self) -> Vec<PathBuf> {
        match self {
            Resolution::Cached(files) | Resolution::Downloaded(files) => files,
        }
    }
}

/// Directory of downloaded granules, recognised by their `.YYYYMMDD.nc4` suffix.
///
/// The cache is never pruned and file presence is taken at face value.
#[derive(Debug, Clone)]
pub struct GranuleCache {
    cache_dir: PathBuf,
}

impl GranuleCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Date stamps (`YYYYMMDD`) of every day of `window` in each of `years`.
    pub fn expected_stamps(window: &DateWindow, years: &[i32]) -> BTreeSet<String> {
        years
            .iter()
            .filter_map(|year| window.dates_in_year(*year))
            .flat_map(|(start, end)| dates_between(start, end))
            .map(|date| date.format("%Y%m%d").to_string())
            .collect()
    }

    /// Cached files whose stamp is in `stamps`, sorted by path.
    pub async fn cached_files(&self, stamps: &BTreeSet<String>) -> Result<Vec<PathBuf>, ArchiveError> {
        let mut entries = match fs::read_dir(&self.cache_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ArchiveError::CacheRead(self.cache_dir.clone(), e)),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ArchiveError::CacheRead(self.cache_dir.clone(), e))?
        {
            let path = entry.path();
            let matches = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(file_stamp)
                .is_some_and(|stamp| stamps.contains(stamp));
            if matches {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Uses the cached files when there is one for every granule, otherwise
    /// downloads the whole granule set again.
    pub async fn resolve<A: GranuleArchive>(
        &self,
        archive: &A,
        granules: &[Granule],
        window: &DateWindow,
        years: &[i32],
    ) -> Result<Resolution, ArchiveError> {
        fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|e| ArchiveError::CacheDirCreation(self.cache_dir.clone(), e))?;

        let stamps = Self::expected_stamps(window, years);
        let existing = self.cached_files(&stamps).await?;

        if existing.len() == granules.len() {
            info!(
                "Cache hit: {} granule files found in {}",
                existing.len(),
                self.cache_dir.display()
            );
            return Ok(Resolution::Cached(existing));
        }

        warn!(
            "Cache miss: {} of {} granule files present in {}, downloading",
            existing.len(),
            granules.len(),
            self.cache_dir.display()
        );
        let downloaded = archive.download(granules, &self.cache_dir).await?;
        Ok(Resolution::Downloaded(downloaded))
    }
}

/// The `YYYYMMDD` part of `name.YYYYMMDD.nc4`.
fn file_stamp(file_name: &str) -> Option<&str> {
    let stem = file_name.strip_suffix(GRANULE_EXTENSION)?.strip_suffix('.')?;
    let (_, stamp) = stem.rsplit_once('.')?;
    (stamp.len() == 8 && stamp.bytes().all(|b| b.is_ascii_digit())).then_some(stamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{granule_file_name, DayValues, FakeArchive};
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_file_stamp() {
        assert_eq!(
            file_stamp("MERRA2_400.statD_2d_slv_Nx.20200812.nc4"),
            Some("20200812")
        );
        assert_eq!(file_stamp("MERRA2_400.statD_2d_slv_Nx.2020081.nc4"), None);
        assert_eq!(file_stamp("MERRA2_400.statD_2d_slv_Nx.20200812.nc"), None);
        assert_eq!(file_stamp("20200812.nc4"), None);
    }

    #[test]
    fn test_expected_stamps_cross_months_and_clamp_leap_day() {
        let window = DateWindow::new(
            crate::types::query::MonthDay::new(2, 29).unwrap(),
            crate::types::query::MonthDay::new(3, 1).unwrap(),
            crate::types::query::YearSelection::Archive,
        )
        .unwrap();
        let stamps = GranuleCache::expected_stamps(&window, &[2020, 2021]);
        let stamps: Vec<_> = stamps.into_iter().collect();
        assert_eq!(stamps, vec!["20200229", "20200301", "20210228", "20210301"]);
    }

    #[tokio::test]
    async fn test_cached_files_ignores_unrelated_names() {
        let dir = tempdir().unwrap();
        for name in [
            granule_file_name(date(2020, 8, 12)),
            granule_file_name(date(2020, 8, 13)),
            granule_file_name(date(2019, 8, 12)),
            "notes.txt".to_string(),
        ] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let cache = GranuleCache::new(dir.path());
        let window = DateWindow::single_year(2020, 8, 12, 13).unwrap();
        let stamps = GranuleCache::expected_stamps(&window, &[2020]);

        let files = cache.cached_files(&stamps).await.unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0] < files[1]);
    }

    #[tokio::test]
    async fn test_cached_files_of_missing_directory_is_empty() {
        let dir = tempdir().unwrap();
        let cache = GranuleCache::new(dir.path().join("absent"));
        let stamps = BTreeSet::from(["20200812".to_string()]);
        assert!(cache.cached_files(&stamps).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_downloads_then_reuses_cache() {
        let dir = tempdir().unwrap();
        let cache = GranuleCache::new(dir.path().join("granules"));
        let archive = FakeArchive::new(
            date(2020, 8, 10)..=date(2020, 8, 20),
            DayValues::default(),
        );
        let window = DateWindow::single_year(2020, 8, 12, 14).unwrap();
        let granules = archive.granules_between(date(2020, 8, 12), date(2020, 8, 14));

        let first = cache.resolve(&archive, &granules, &window, &[2020]).await.unwrap();
        assert!(matches!(first, Resolution::Downloaded(_)));
        assert_eq!(first.files().len(), 3);
        assert_eq!(archive.download_calls(), 1);

        let second = cache.resolve(&archive, &granules, &window, &[2020]).await.unwrap();
        assert!(matches!(second, Resolution::Cached(_)));
        assert_eq!(second.files().len(), 3);
        assert_eq!(archive.download_calls(), 1);
    }

    #[tokio::test]
    async fn test_partial_cache_triggers_full_download() {
        let dir = tempdir().unwrap();
        let cache = GranuleCache::new(dir.path());
        std::fs::write(dir.path().join(granule_file_name(date(2020, 8, 12))), b"").unwrap();
        let archive = FakeArchive::new(
            date(2020, 8, 12)..=date(2020, 8, 13),
            DayValues::default(),
        );
        let window = DateWindow::single_year(2020, 8, 12, 13).unwrap();
        let granules = archive.granules_between(date(2020, 8, 12), date(2020, 8, 13));

        let resolution = cache.resolve(&archive, &granules, &window, &[2020]).await.unwrap();
        assert!(matches!(resolution, Resolution::Downloaded(_)));
        assert_eq!(archive.downloaded_granules(), 2);
    }
}
