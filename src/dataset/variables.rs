use std::fmt;
use std::fmt::{Display, Formatter};

pub const TIME: &str = "time";
pub const LATITUDE: &str = "lat";
pub const LONGITUDE: &str = "lon";

/// Frame column holding the calendar date of each sample.
pub const DATE_COLUMN: &str = "date";

/// Daily statistics read from each granule.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Field {
    /// Daily mean 2 m air temperature (K).
    MeanTemperature,
    /// Daily maximum 2 m air temperature (K).
    MaxTemperature,
    /// Daily minimum 2 m air temperature (K).
    MinTemperature,
    /// Maximum precipitation rate during the day (kg m-2 s-1).
    MaxPrecipitation,
    /// Time during the day without precipitation (s).
    DryTime,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::MeanTemperature,
        Field::MaxTemperature,
        Field::MinTemperature,
        Field::MaxPrecipitation,
        Field::DryTime,
    ];

    /// Variable name in the granule, also used as the frame column name.
    pub fn variable(self) -> &'static str {
        match self {
            Field::MeanTemperature => "T2MMEAN",
            Field::MaxTemperature => "T2MMAX",
            Field::MinTemperature => "T2MMIN",
            Field::MaxPrecipitation => "TPRECMAX",
            Field::DryTime => "HOURNORAIN",
        }
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.variable())
    }
}
