//! Fixtures shared by the unit tests: MERRA-2 shaped granule files and an
//! in-memory archive serving them.

use crate::archive::client::{GranuleArchive, SearchRequest};
use crate::archive::error::ArchiveError;
use crate::archive::granule::Granule;
use crate::dataset::variables::{Field, LATITUDE, LONGITUDE, TIME};
use crate::types::calendar::dates_between;
use chrono::NaiveDate;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

pub(crate) const GRID_LATS: [f64; 3] = [43.0, 43.5, 44.0];
pub(crate) const GRID_LONS: [f64; 3] = [-6.25, -5.625, -5.0];
pub(crate) const MERRA_FILL_VALUE: f32 = 1.0e15;

/// Value of every grid cell for one day. Stored as `float`, like real granules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct DayValues {
    pub t2mmean: f32,
    pub t2mmax: f32,
    pub t2mmin: f32,
    pub tprecmax: f32,
    pub hournorain: f32,
}

impl Default for DayValues {
    fn default() -> Self {
        Self {
            t2mmean: 290.15,
            t2mmax: 295.15,
            t2mmin: 285.15,
            tprecmax: 0.0001,
            hournorain: 43_200.0,
        }
    }
}

impl DayValues {
    fn get(&self, field: Field) -> f32 {
        match field {
            Field::MeanTemperature => self.t2mmean,
            Field::MaxTemperature => self.t2mmax,
            Field::MinTemperature => self.t2mmin,
            Field::MaxPrecipitation => self.tprecmax,
            Field::DryTime => self.hournorain,
        }
    }
}

pub(crate) fn granule_file_name(date: NaiveDate) -> String {
    format!("MERRA2_400.statD_2d_slv_Nx.{}.nc4", date.format("%Y%m%d"))
}

/// Writes a one-day granule on the test grid.
pub(crate) fn write_granule(dir: &Path, date: NaiveDate, values: &DayValues) -> PathBuf {
    let path = dir.join(granule_file_name(date));
    let mut file = netcdf::create(&path).unwrap();
    file.add_dimension(TIME, 1).unwrap();
    file.add_dimension(LATITUDE, GRID_LATS.len()).unwrap();
    file.add_dimension(LONGITUDE, GRID_LONS.len()).unwrap();

    {
        let units = format!("minutes since {} 00:30:00", date.format("%Y-%m-%d"));
        let mut time = file.add_variable::<f64>(TIME, &[TIME]).unwrap();
        time.put_attribute("units", units.as_str()).unwrap();
        time.put_values(&[690.0], ..).unwrap();
    }
    {
        let mut lat = file.add_variable::<f64>(LATITUDE, &[LATITUDE]).unwrap();
        lat.put_attribute("units", "degrees_north").unwrap();
        lat.put_values(&GRID_LATS, ..).unwrap();
    }
    {
        let mut lon = file.add_variable::<f64>(LONGITUDE, &[LONGITUDE]).unwrap();
        lon.put_attribute("units", "degrees_east").unwrap();
        lon.put_values(&GRID_LONS, ..).unwrap();
    }
    for field in Field::ALL {
        let mut var = file
            .add_variable::<f32>(field.variable(), &[TIME, LATITUDE, LONGITUDE])
            .unwrap();
        var.put_attribute("_FillValue", MERRA_FILL_VALUE).unwrap();
        let cells = vec![values.get(field); GRID_LATS.len() * GRID_LONS.len()];
        var.put_values(&cells, ..).unwrap();
    }
    path
}

/// Archive holding one granule per day of `available`.
pub(crate) struct FakeArchive {
    available: RangeInclusive<NaiveDate>,
    values: DayValues,
    download_calls: AtomicUsize,
    downloaded_granules: AtomicUsize,
}

impl FakeArchive {
    pub fn new(available: RangeInclusive<NaiveDate>, values: DayValues) -> Self {
        Self {
            available,
            values,
            download_calls: AtomicUsize::new(0),
            downloaded_granules: AtomicUsize::new(0),
        }
    }

    pub fn granules_between(&self, start: NaiveDate, end: NaiveDate) -> Vec<Granule> {
        let start = start.max(*self.available.start());
        let end = end.min(*self.available.end());
        dates_between(start, end)
            .map(|date| {
                let name = granule_file_name(date);
                Granule::new(
                    format!("G{}-FAKE", date.format("%Y%m%d")),
                    name.clone(),
                    vec![format!("https://data.example.test/MERRA2/{name}")],
                )
            })
            .collect()
    }

    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }

    pub fn downloaded_granules(&self) -> usize {
        self.downloaded_granules.load(Ordering::SeqCst)
    }
}

impl GranuleArchive for FakeArchive {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Granule>, ArchiveError> {
        let lat = request.location.0;
        if !(-90.0..=90.0).contains(&lat) {
            return Err(ArchiveError::InvalidLatitude(format!(
                "[{lat}] is not a valid latitude, it must be within -90 and 90.0"
            )));
        }
        Ok(self.granules_between(request.start, request.end))
    }

    async fn download(&self, granules: &[Granule], directory: &Path) -> Result<Vec<PathBuf>, ArchiveError> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        let paths = granules
            .iter()
            .map(|granule| {
                let name = granule.file_name();
                let stamp = name.split('.').nth(2).unwrap();
                let date = NaiveDate::parse_from_str(stamp, "%Y%m%d").unwrap();
                write_granule(directory, date, &self.values)
            })
            .collect::<Vec<_>>();
        self.downloaded_granules.fetch_add(paths.len(), Ordering::SeqCst);
        Ok(paths)
    }
}
