use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum QueryError {
    #[error("Latitude must be between -90 and 90, got {0}")]
    LatitudeOutOfRange(f64),

    #[error("Longitude must be between -180 and 180, got {0}")]
    LongitudeOutOfRange(f64),

    #[error("Radius must be a positive number of meters")]
    InvalidRadius,

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Start of the date range ({start}) is after its end ({end})")]
    StartAfterEnd { start: String, end: String },

    #[error("Year range {first}-{last} is empty")]
    EmptyYearRange { first: i32, last: i32 },
}
