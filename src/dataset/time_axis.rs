//! Decoding of CF time coordinates (`"<unit> since <datetime>"`).

use crate::dataset::error::DatasetError;
use chrono::{Duration, NaiveDate, NaiveDateTime};

const ORIGIN_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TimeUnits {
    seconds_per_step: f64,
    origin: NaiveDateTime,
}

impl TimeUnits {
    pub fn parse(units: &str) -> Result<Self, DatasetError> {
        let invalid = || DatasetError::TimeUnits(units.to_string());
        let (step, origin) = units.trim().split_once(" since ").ok_or_else(invalid)?;
        let seconds_per_step = match step.trim().to_ascii_lowercase().as_str() {
            "seconds" | "second" | "secs" | "s" => 1.0,
            "minutes" | "minute" | "mins" | "min" => 60.0,
            "hours" | "hour" | "hrs" | "h" => 3_600.0,
            "days" | "day" | "d" => 86_400.0,
            _ => return Err(invalid()),
        };
        let origin = parse_origin(origin.trim()).ok_or_else(invalid)?;
        Ok(Self {
            seconds_per_step,
            origin,
        })
    }

    pub fn datetime(&self, value: f64) -> Option<NaiveDateTime> {
        let seconds = value * self.seconds_per_step;
        if !seconds.is_finite() {
            return None;
        }
        let offset = Duration::try_milliseconds((seconds * 1000.0).round() as i64)?;
        self.origin.checked_add_signed(offset)
    }

    pub fn date(&self, value: f64) -> Option<NaiveDate> {
        self.datetime(value).map(|datetime| datetime.date())
    }
}

fn parse_origin(origin: &str) -> Option<NaiveDateTime> {
    // Trailing zone markers such as "UTC" or "Z" are ignored; MERRA-2 is UTC.
    let origin = origin
        .trim_end_matches(" UTC")
        .trim_end_matches('Z')
        .trim();
    ORIGIN_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(origin, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(origin, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Calendar dates of every value of a time coordinate.
pub fn decode_dates(values: &[f64], units: &str) -> Result<Vec<NaiveDate>, DatasetError> {
    let units_parsed = TimeUnits::parse(units)?;
    values
        .iter()
        .map(|value| {
            units_parsed
                .date(*value)
                .ok_or_else(|| DatasetError::TimeUnits(format!("{value} {units}")))
        })
        .collect()
}
