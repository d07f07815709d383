use crate::dataset::error::DatasetError;
use crate::dataset::variables::{Field, DATE_COLUMN};
use crate::types::query::DateWindow;
use crate::types::report::{RainRecord, YearlyRecord};
use chrono::NaiveDate;
use log::info;
use polars::prelude::*;

pub const KELVIN_OFFSET: f64 = 273.15;
const KELVIN_OFFSET_F32: f32 = 273.15;
const SECONDS_PER_HOUR: f64 = 3_600.0;
const HOURS_PER_DAY: f64 = 24.0;

const COL_MEAN_TEMP: &str = "mean_temp";
const COL_MAX_TEMP: &str = "max_temp";
const COL_MIN_TEMP: &str = "min_temp";
const COL_RAIN_QUANTITY: &str = "rain_quantity";
const COL_DRY_SECONDS: &str = "dry_seconds";

/// Hours of the day with precipitation, given the seconds without any.
pub fn hours_with_rain(dry_seconds: f64) -> f64 {
    (HOURS_PER_DAY - dry_seconds / SECONDS_PER_HOUR).clamp(0.0, HOURS_PER_DAY)
}

/// Daily values at one grid point, ordered by date.
#[derive(Clone)]
pub struct PointSeries {
    frame: LazyFrame,
}

impl PointSeries {
    /// `frame` needs a `date` column plus one column per [`Field`].
    pub fn new(frame: DataFrame) -> Self {
        Self {
            frame: frame
                .lazy()
                .sort([DATE_COLUMN], SortMultipleOptions::default()),
        }
    }

    /// Rows with `start <= date <= end`.
    pub fn get_range(&self, start: NaiveDate, end: NaiveDate) -> LazyFrame {
        self.frame.clone().filter(
            col(DATE_COLUMN)
                .gt_eq(lit(start))
                .and(col(DATE_COLUMN).lt_eq(lit(end))),
        )
    }

    /// The window's days in `year`, converted for the response.
    pub fn year_record(&self, year: i32, window: &DateWindow) -> Result<YearlyRecord, DatasetError> {
        let Some((start, end)) = window.dates_in_year(year) else {
            return Ok(YearlyRecord::empty(year));
        };

        let df = self
            .get_range(start, end)
            .select([
                col(Field::MeanTemperature.variable()).alias(COL_MEAN_TEMP),
                col(Field::MaxTemperature.variable()).alias(COL_MAX_TEMP),
                col(Field::MinTemperature.variable()).alias(COL_MIN_TEMP),
                col(Field::MaxPrecipitation.variable())
                    .cast(DataType::Float64)
                    .alias(COL_RAIN_QUANTITY),
                col(Field::DryTime.variable())
                    .cast(DataType::Float64)
                    .alias(COL_DRY_SECONDS),
            ])
            .collect()?;

        if df.height() == 0 {
            info!("No data found for {}", year);
            return Ok(YearlyRecord::empty(year));
        }

        let hours = float_values(&df, COL_DRY_SECONDS)?
            .into_iter()
            .map(|seconds| seconds.map(hours_with_rain))
            .collect();

        Ok(YearlyRecord {
            year,
            mean_temp: celsius_values(&df, COL_MEAN_TEMP)?,
            max_temp: celsius_values(&df, COL_MAX_TEMP)?,
            min_temp: celsius_values(&df, COL_MIN_TEMP)?,
            rain: RainRecord {
                quantity: float_values(&df, COL_RAIN_QUANTITY)?,
                hours,
            },
        })
    }
}

fn float_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, DatasetError> {
    Ok(df.column(name)?.f64()?.into_iter().collect())
}

/// Kelvin to Celsius in the column's own precision: 290.15 K stored as
/// `float` gives exactly 17 °C.
fn celsius_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, DatasetError> {
    let column = df.column(name)?;
    if column.dtype() == &DataType::Float32 {
        return Ok(column
            .f32()?
            .into_iter()
            .map(|kelvin| kelvin.map(|k| f64::from(k - KELVIN_OFFSET_F32)))
            .collect());
    }
    Ok(column
        .cast(&DataType::Float64)?
        .f64()?
        .into_iter()
        .map(|kelvin| kelvin.map(|k| k - KELVIN_OFFSET))
        .collect())
}

/// One record per year, ascending.
pub fn extract_years(
    series: &PointSeries,
    window: &DateWindow,
    years: &[i32],
) -> Result<Vec<YearlyRecord>, DatasetError> {
    let mut years = years.to_vec();
    years.sort_unstable();
    years.dedup();
    years
        .into_iter()
        .map(|year| {
            let record = series.year_record(year, window)?;
            info!("Year {} completed: {} days of data", year, record.days());
            Ok(record)
        })
        .collect()
}
