mod archive;
mod dataset;
mod error;
pub mod server;
mod types;
mod utils;
mod weather;

#[cfg(test)]
mod test_support;

pub use error::WeatherError;
pub use weather::*;

pub use archive::cache::{GranuleCache, Resolution};
pub use archive::client::{
    EarthdataArchive, GranuleArchive, SearchRequest, CMR_URL, COLLECTION_SHORT_NAME,
};
pub use archive::granule::Granule;
pub use archive::session::{Credentials, EarthdataSession};

pub use dataset::extractor::{extract_years, hours_with_rain, PointSeries, KELVIN_OFFSET};
pub use dataset::reader::{nearest_grid_point, GridPoint, GriddedDataset};
pub use dataset::time_axis::{decode_dates, TimeUnits};
pub use dataset::variables::Field;

pub use types::query::{
    parse_request_datetime, DateWindow, MonthDay, WeatherCheckRequest, WeatherQuery,
    YearSelection, YearSpan,
};
pub use types::report::{Location, RainRecord, WeatherReport, YearlyRecord};

pub use archive::error::ArchiveError;
pub use dataset::error::DatasetError;
pub use types::error::QueryError;
