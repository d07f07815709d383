use crate::dataset::error::DatasetError;
use crate::dataset::time_axis::decode_dates;
use crate::dataset::variables::{Field, DATE_COLUMN, LATITUDE, LONGITUDE, TIME};
use crate::weather::LatLon;
use chrono::NaiveDate;
use haversine::{distance, Location as HaversineLocation, Units};
use log::debug;
use netcdf::types::{FloatType, NcVariableType};
use netcdf::AttributeValue;
use ordered_float::OrderedFloat;
use polars::prelude::*;
use std::path::{Path, PathBuf};

/// A cell of the dataset grid.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GridPoint {
    pub lat_index: usize,
    pub lon_index: usize,
    pub lat: f64,
    pub lon: f64,
    pub distance_m: f64,
}

/// Granule files opened together and read as one time series. All files are
/// expected to share the same latitude/longitude grid.
///
/// The `netcdf::File` handles stay open for the lifetime of the value and
/// close when `files` is dropped.
pub struct GriddedDataset {
    files: Vec<(PathBuf, netcdf::File)>,
}

impl GriddedDataset {
    pub fn open(paths: &[PathBuf]) -> Result<Self, DatasetError> {
        if paths.is_empty() {
            return Err(DatasetError::EmptyDataset);
        }
        let files = paths
            .iter()
            .map(|path| {
                netcdf::open(path)
                    .map(|file| (path.clone(), file))
                    .map_err(|e| DatasetError::Open(path.clone(), e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Opened {} dataset files", files.len());
        Ok(Self { files })
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Nearest cell of the grid to `target`, no farther than `radius_m`.
    pub fn nearest_grid_point(&self, target: LatLon, radius_m: u32) -> Result<GridPoint, DatasetError> {
        let (path, file) = self.files.first().ok_or(DatasetError::EmptyDataset)?;
        let lats = read_all(path, file, LATITUDE)?;
        let lons = read_all(path, file, LONGITUDE)?;
        nearest_grid_point(&lats, &lons, target, radius_m)
    }

    /// Daily values at `point` across every file: a `date` column followed by
    /// one nullable column per [`Field`], in file order.
    ///
    /// A field stored as `float` everywhere stays `Float32`, so callers can do
    /// arithmetic in the stored precision. Anything else becomes `Float64`.
    pub fn point_series(&self, point: &GridPoint) -> Result<DataFrame, DatasetError> {
        let mut dates: Vec<NaiveDate> = Vec::new();
        let mut values: Vec<FieldColumn> = Field::ALL.iter().map(|_| FieldColumn::default()).collect();

        for (path, file) in &self.files {
            let time = variable(path, file, TIME)?;
            let units = string_attribute(&time, "units")
                .ok_or_else(|| DatasetError::TimeUnits(format!("missing in '{}'", path.display())))?;
            let file_dates = decode_dates(&read_values(path, &time, ..)?, &units)?;

            for (field, column) in Field::ALL.iter().zip(values.iter_mut()) {
                let var = variable(path, file, field.variable())?;
                let fill = missing_markers(&var);
                let samples = read_samples(path, &var, (.., point.lat_index, point.lon_index))?;
                if samples.len() != file_dates.len() {
                    return Err(DatasetError::TimeUnits(format!(
                        "'{}' has {} time steps but {} has {}",
                        path.display(),
                        file_dates.len(),
                        field,
                        samples.len()
                    )));
                }
                column.push(samples, &fill);
            }
            dates.extend(file_dates);
        }

        let mut columns = Vec::with_capacity(Field::ALL.len() + 1);
        columns.push(Column::new(DATE_COLUMN.into(), dates));
        for (field, column) in Field::ALL.iter().zip(values) {
            columns.push(column.into_column(field.variable()));
        }
        Ok(DataFrame::new(columns)?)
    }
}

/// Values of one variable at a grid point, in the type they are stored as.
enum Samples {
    Single(Vec<f32>),
    Double(Vec<f64>),
}

impl Samples {
    fn len(&self) -> usize {
        match self {
            Samples::Single(values) => values.len(),
            Samples::Double(values) => values.len(),
        }
    }
}

/// Accumulates one field across files. Widens to `f64` as soon as a file
/// stores the field in anything but `float`.
enum FieldColumn {
    Single(Vec<Option<f32>>),
    Double(Vec<Option<f64>>),
}

impl Default for FieldColumn {
    fn default() -> Self {
        FieldColumn::Single(Vec::new())
    }
}

impl FieldColumn {
    fn push(&mut self, samples: Samples, fill: &[f64]) {
        let keep = |v: f64| v.is_finite() && !fill.iter().any(|f| is_marker(v, *f));
        match samples {
            Samples::Single(values) => match self {
                FieldColumn::Single(column) => {
                    column.extend(values.into_iter().map(|v| keep(f64::from(v)).then_some(v)));
                }
                FieldColumn::Double(column) => {
                    column.extend(values.into_iter().map(f64::from).map(|v| keep(v).then_some(v)));
                }
            },
            Samples::Double(values) => {
                if let FieldColumn::Single(column) = self {
                    let widened = column.iter().map(|v| v.map(f64::from)).collect();
                    *self = FieldColumn::Double(widened);
                }
                if let FieldColumn::Double(column) = self {
                    column.extend(values.into_iter().map(|v| keep(v).then_some(v)));
                }
            }
        }
    }

    fn into_column(self, name: &str) -> Column {
        match self {
            FieldColumn::Single(values) => Column::new(name.into(), values),
            FieldColumn::Double(values) => Column::new(name.into(), values),
        }
    }
}

fn variable<'f>(path: &Path, file: &'f netcdf::File, name: &str) -> Result<netcdf::Variable<'f>, DatasetError> {
    file.variable(name)
        .ok_or_else(|| DatasetError::MissingVariable {
            file: path.to_path_buf(),
            variable: name.to_string(),
        })
}

fn read_all(path: &Path, file: &netcdf::File, name: &str) -> Result<Vec<f64>, DatasetError> {
    let var = variable(path, file, name)?;
    read_values(path, &var, ..)
}

/// Reads a variable as `f64` whatever its stored numeric type.
fn read_values<E>(path: &Path, var: &netcdf::Variable, extents: E) -> Result<Vec<f64>, DatasetError>
where
    E: TryInto<netcdf::Extents> + Clone,
    E::Error: Into<netcdf::Error>,
{
    let source = match var.get_values::<f64, _>(extents.clone()) {
        Ok(values) => return Ok(values),
        Err(e) => e,
    };
    if let Ok(values) = var.get_values::<f32, _>(extents.clone()) {
        return Ok(values.into_iter().map(f64::from).collect());
    }
    if let Ok(values) = var.get_values::<i32, _>(extents) {
        return Ok(values.into_iter().map(f64::from).collect());
    }
    Err(DatasetError::Read {
        file: path.to_path_buf(),
        variable: var.name(),
        source,
    })
}

/// Reads a data variable, keeping `float` variables in single precision.
fn read_samples<E>(path: &Path, var: &netcdf::Variable, extents: E) -> Result<Samples, DatasetError>
where
    E: TryInto<netcdf::Extents> + Clone,
    E::Error: Into<netcdf::Error>,
{
    if matches!(var.vartype(), NcVariableType::Float(FloatType::F32)) {
        return var
            .get_values::<f32, _>(extents)
            .map(Samples::Single)
            .map_err(|source| DatasetError::Read {
                file: path.to_path_buf(),
                variable: var.name(),
                source,
            });
    }
    read_values(path, var, extents).map(Samples::Double)
}

fn string_attribute(var: &netcdf::Variable, name: &str) -> Option<String> {
    match var.attribute_value(name)?.ok()? {
        AttributeValue::Str(value) => Some(value),
        AttributeValue::Strs(values) => values.into_iter().next(),
        _ => None,
    }
}

fn numeric_attribute(var: &netcdf::Variable, name: &str) -> Option<f64> {
    match var.attribute_value(name)?.ok()? {
        AttributeValue::Double(value) => Some(value),
        AttributeValue::Float(value) => Some(f64::from(value)),
        AttributeValue::Int(value) => Some(f64::from(value)),
        AttributeValue::Short(value) => Some(f64::from(value)),
        _ => None,
    }
}

fn missing_markers(var: &netcdf::Variable) -> Vec<f64> {
    ["_FillValue", "missing_value"]
        .iter()
        .filter_map(|name| numeric_attribute(var, name))
        .collect()
}

/// Fill values are stored as `f32`, so compare with a relative tolerance.
fn is_marker(value: f64, marker: f64) -> bool {
    (value - marker).abs() <= marker.abs() * 1e-6
}

/// Picks the grid cell closest to `target` by great-circle distance.
///
/// Only the two nearest coordinates along each axis can hold the closest
/// cell, so at most four distances are computed.
pub fn nearest_grid_point(
    lats: &[f64],
    lons: &[f64],
    target: LatLon,
    radius_m: u32,
) -> Result<GridPoint, DatasetError> {
    let LatLon(lat, lon) = target;
    let lat_candidates = closest_indices(lats, |value| (value - lat).abs());
    let lon_candidates = closest_indices(lons, |value| longitude_gap(value, lon));

    let nearest = lat_candidates
        .iter()
        .flat_map(|lat_index| lon_candidates.iter().map(move |lon_index| (*lat_index, *lon_index)))
        .map(|(lat_index, lon_index)| {
            let distance_km = distance(
                HaversineLocation {
                    latitude: lat,
                    longitude: lon,
                },
                HaversineLocation {
                    latitude: lats[lat_index],
                    longitude: lons[lon_index],
                },
                Units::Kilometers,
            );
            (OrderedFloat(distance_km), lat_index, lon_index)
        })
        .min()
        .ok_or(DatasetError::EmptyDataset)?;

    let (OrderedFloat(distance_km), lat_index, lon_index) = nearest;
    let distance_m = distance_km * 1000.0;
    if distance_m > f64::from(radius_m) {
        return Err(DatasetError::NoGridPointWithinRadius {
            lat,
            lon,
            radius_m,
            distance_m,
        });
    }
    Ok(GridPoint {
        lat_index,
        lon_index,
        lat: lats[lat_index],
        lon: lons[lon_index],
        distance_m,
    })
}

fn closest_indices(coords: &[f64], gap: impl Fn(f64) -> f64) -> Vec<usize> {
    let mut indexed: Vec<(OrderedFloat<f64>, usize)> = coords
        .iter()
        .enumerate()
        .filter(|(_, value)| value.is_finite())
        .map(|(index, value)| (OrderedFloat(gap(*value)), index))
        .collect();
    indexed.sort();
    indexed.into_iter().take(2).map(|(_, index)| index).collect()
}

/// Angular gap between two longitudes, accounting for the antimeridian.
fn longitude_gap(a: f64, b: f64) -> f64 {
    let gap = (a - b).rem_euclid(360.0);
    gap.min(360.0 - gap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{write_granule, DayValues, GRID_LATS, GRID_LONS, MERRA_FILL_VALUE};
    use tempfile::tempdir;

    #[test]
    fn test_nearest_grid_point_within_radius() {
        let point = nearest_grid_point(&GRID_LATS, &GRID_LONS, LatLon(43.36, -5.84), 30_000).unwrap();
        assert_eq!((point.lat_index, point.lon_index), (1, 1));
        assert_eq!((point.lat, point.lon), (43.5, -5.625));
        assert!(point.distance_m < 30_000.0);
    }

    #[test]
    fn test_nearest_grid_point_rejects_far_points() {
        let result = nearest_grid_point(&GRID_LATS, &GRID_LONS, LatLon(43.36, -5.84), 1_000);
        assert!(matches!(
            result,
            Err(DatasetError::NoGridPointWithinRadius { radius_m: 1_000, .. })
        ));
    }

    #[test]
    fn test_nearest_grid_point_wraps_antimeridian() {
        let lons = [-180.0, -90.0, 0.0, 90.0, 179.375];
        let point = nearest_grid_point(&[0.0], &lons, LatLon(0.0, 179.9), 100_000).unwrap();
        assert_eq!(point.lon_index, 0);
    }

    #[test]
    fn test_empty_grid() {
        assert!(matches!(
            nearest_grid_point(&[], &GRID_LONS, LatLon(0.0, 0.0), 1),
            Err(DatasetError::EmptyDataset)
        ));
    }

    #[test]
    fn test_open_without_files() {
        assert!(matches!(GriddedDataset::open(&[]), Err(DatasetError::EmptyDataset)));
    }

    #[test]
    fn test_point_series_reads_every_file() {
        let dir = tempdir().unwrap();
        let first = write_granule(
            dir.path(),
            NaiveDate::from_ymd_opt(2020, 8, 12).unwrap(),
            &DayValues::default(),
        );
        let second = write_granule(
            dir.path(),
            NaiveDate::from_ymd_opt(2020, 8, 13).unwrap(),
            &DayValues {
                t2mmax: MERRA_FILL_VALUE,
                ..DayValues::default()
            },
        );

        let dataset = GriddedDataset::open(&[first, second]).unwrap();
        assert_eq!(dataset.file_count(), 2);
        let point = dataset.nearest_grid_point(LatLon(43.36, -5.84), 30_000).unwrap();
        let frame = dataset.point_series(&point).unwrap();

        assert_eq!(frame.height(), 2);
        assert_eq!(frame.width(), 6);
        let max = frame.column("T2MMAX").unwrap().f32().unwrap();
        assert_eq!(max.get(0), Some(295.15_f32));
        assert_eq!(max.get(1), None);
        let mean = frame.column("T2MMEAN").unwrap().f32().unwrap();
        assert_eq!(mean.get(0), Some(290.15_f32));
    }

    #[test]
    fn test_double_precision_fields_stay_f64() {
        let mut values = FieldColumn::default();
        values.push(Samples::Single(vec![290.15, 1.0e15]), &[1.0e15]);
        values.push(Samples::Double(vec![291.5]), &[1.0e15]);
        let column = values.into_column("T2MMEAN");

        let series = column.f64().unwrap();
        assert_eq!(series.get(0), Some(f64::from(290.15_f32)));
        assert_eq!(series.get(1), None);
        assert_eq!(series.get(2), Some(291.5));
    }

    #[test]
    fn test_missing_variable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("MERRA2_400.statD_2d_slv_Nx.20200812.nc4");
        {
            let mut file = netcdf::create(&path).unwrap();
            file.add_dimension("lat", 1).unwrap();
            file.add_variable::<f64>("lat", &["lat"]).unwrap();
        }
        let dataset = GriddedDataset::open(&[path]).unwrap();
        assert!(matches!(
            dataset.nearest_grid_point(LatLon(0.0, 0.0), 1),
            Err(DatasetError::MissingVariable { .. })
        ));
    }
}
