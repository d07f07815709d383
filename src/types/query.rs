//! Request-side types: the validated [`WeatherQuery`], the calendar window it
//! covers and the two wire forms accepted by `POST /weather_check`.

use crate::types::calendar::{clamped_date, days_in_month};
use crate::types::error::QueryError;
use crate::weather::LatLon;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::ops::RangeInclusive;

/// Wire format of the date-pair request form, e.g. `"12/08/2020, 00:00:00"`.
pub const REQUEST_DATETIME_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";

/// A calendar day without a year.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthDay {
    pub month: u32,
    pub day: u32,
}

impl MonthDay {
    /// 29 February is accepted; [`MonthDay::in_year`] clamps it in common years.
    pub fn new(month: u32, day: u32) -> Result<Self, QueryError> {
        let last_day = days_in_month(2000, month)
            .ok_or_else(|| QueryError::InvalidDate(format!("month {month}")))?;
        if day == 0 || day > last_day {
            return Err(QueryError::InvalidDate(format!("day {day} of month {month}")));
        }
        Ok(Self { month, day })
    }

    pub fn in_year(self, year: i32) -> Option<NaiveDate> {
        clamped_date(year, self.month, self.day)
    }
}

impl From<NaiveDate> for MonthDay {
    fn from(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            day: date.day(),
        }
    }
}

impl Display for MonthDay {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

/// An inclusive range of years, e.g. the years held by the archive.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct YearSpan {
    first: i32,
    last: i32,
}

impl YearSpan {
    pub fn new(first: i32, last: i32) -> Result<Self, QueryError> {
        if first > last {
            return Err(QueryError::EmptyYearRange { first, last });
        }
        Ok(Self { first, last })
    }

    pub fn single(year: i32) -> Self {
        Self {
            first: year,
            last: year,
        }
    }

    pub fn contains(self, year: i32) -> bool {
        (self.first..=self.last).contains(&year)
    }

    pub fn iter(self) -> RangeInclusive<i32> {
        self.first..=self.last
    }
}

impl Default for YearSpan {
    /// MERRA-2 years served by the original deployment.
    fn default() -> Self {
        Self {
            first: 2015,
            last: 2025,
        }
    }
}

impl Display for YearSpan {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:04}", self.first, self.last)
    }
}

/// Which years a [`DateWindow`] applies to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum YearSelection {
    /// Only the given year.
    Single(i32),
    /// Every year the archive holds.
    Archive,
}

/// A month/day window repeated over a selection of years.
///
/// The window never wraps around the new year: `start` must not come after
/// `end` within a calendar year.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DateWindow {
    start: MonthDay,
    end: MonthDay,
    years: YearSelection,
}

impl DateWindow {
    pub fn new(start: MonthDay, end: MonthDay, years: YearSelection) -> Result<Self, QueryError> {
        if start > end {
            return Err(QueryError::StartAfterEnd {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end, years })
    }

    /// The legacy request form: one month of one year, `start_day..=end_day`.
    pub fn single_year(
        year: i32,
        month: u32,
        start_day: u32,
        end_day: u32,
    ) -> Result<Self, QueryError> {
        let start = NaiveDate::from_ymd_opt(year, month, start_day)
            .ok_or_else(|| QueryError::InvalidDate(format!("{year}-{month:02}-{start_day:02}")))?;
        let end = NaiveDate::from_ymd_opt(year, month, end_day)
            .ok_or_else(|| QueryError::InvalidDate(format!("{year}-{month:02}-{end_day:02}")))?;
        Self::new(start.into(), end.into(), YearSelection::Single(year))
    }

    /// The date-pair request form. Only month and day are kept; the window is
    /// looked up in every archived year.
    pub fn from_datetimes(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, QueryError> {
        Self::new(
            start.date().into(),
            end.date().into(),
            YearSelection::Archive,
        )
    }

    /// Years reported back to the caller, ascending.
    pub fn requested_years(&self, archive: YearSpan) -> Vec<i32> {
        match self.years {
            YearSelection::Single(year) => vec![year],
            YearSelection::Archive => archive.iter().collect(),
        }
    }

    /// Requested years the archive can actually serve.
    pub fn archived_years(&self, archive: YearSpan) -> Vec<i32> {
        self.requested_years(archive)
            .into_iter()
            .filter(|year| archive.contains(*year))
            .collect()
    }

    /// Inclusive first and last date of the window in `year`.
    pub fn dates_in_year(&self, year: i32) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.start.in_year(year)?, self.end.in_year(year)?))
    }

    /// Human readable range echoed in responses.
    pub fn describe(&self) -> String {
        match self.years {
            YearSelection::Single(year) => format!(
                "{year:04}-{} to {year:04}-{}",
                self.start, self.end
            ),
            YearSelection::Archive => format!("{} to {}", self.start, self.end),
        }
    }
}

/// A validated weather look-up.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WeatherQuery {
    pub location: LatLon,
    pub radius_m: u32,
    pub window: DateWindow,
}

impl WeatherQuery {
    pub fn new(location: LatLon, radius_m: u32, window: DateWindow) -> Result<Self, QueryError> {
        let LatLon(lat, lon) = location;
        if !(-90.0..=90.0).contains(&lat) {
            return Err(QueryError::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(QueryError::LongitudeOutOfRange(lon));
        }
        if radius_m == 0 {
            return Err(QueryError::InvalidRadius);
        }
        Ok(Self {
            location,
            radius_m,
            window,
        })
    }
}

/// Body of `POST /weather_check`. Both historical request shapes are accepted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WeatherCheckRequest {
    DatePair {
        lat: f64,
        lon: f64,
        radius: u32,
        #[serde(alias = "startDate")]
        start_date: String,
        #[serde(alias = "endDate")]
        end_date: String,
    },
    SingleYear {
        lat: f64,
        lon: f64,
        radius: u32,
        year: i32,
        month: u32,
        #[serde(alias = "startDay")]
        start_day: u32,
        #[serde(alias = "endDay")]
        end_day: u32,
    },
}

impl TryFrom<WeatherCheckRequest> for WeatherQuery {
    type Error = QueryError;

    fn try_from(request: WeatherCheckRequest) -> Result<Self, Self::Error> {
        match request {
            WeatherCheckRequest::DatePair {
                lat,
                lon,
                radius,
                start_date,
                end_date,
            } => {
                let start = parse_request_datetime(&start_date)?;
                let end = parse_request_datetime(&end_date)?;
                WeatherQuery::new(LatLon(lat, lon), radius, DateWindow::from_datetimes(start, end)?)
            }
            WeatherCheckRequest::SingleYear {
                lat,
                lon,
                radius,
                year,
                month,
                start_day,
                end_day,
            } => WeatherQuery::new(
                LatLon(lat, lon),
                radius,
                DateWindow::single_year(year, month, start_day, end_day)?,
            ),
        }
    }
}

/// Parses a request date: the `"%d/%m/%Y, %H:%M:%S"` wire format first, then
/// RFC 3339 and plain `YYYY-MM-DD`.
pub fn parse_request_datetime(value: &str) -> Result<NaiveDateTime, QueryError> {
    let value = value.trim();
    if let Ok(datetime) = NaiveDateTime::parse_from_str(value, REQUEST_DATETIME_FORMAT) {
        return Ok(datetime);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Ok(datetime.naive_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| QueryError::InvalidDate(value.to_string()))
}
