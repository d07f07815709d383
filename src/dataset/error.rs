use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to open dataset file '{0}'")]
    Open(PathBuf, #[source] netcdf::Error),

    #[error("Variable '{variable}' not found in '{file}'")]
    MissingVariable { file: PathBuf, variable: String },

    #[error("Unsupported time units '{0}'")]
    TimeUnits(String),

    #[error("Failed to read variable '{variable}' from '{file}'")]
    Read {
        file: PathBuf,
        variable: String,
        #[source]
        source: netcdf::Error,
    },

    #[error("Dataset contains no files")]
    EmptyDataset,

    #[error("No grid point within {radius_m} m of ({lat}, {lon}), nearest is {distance_m:.0} m away")]
    NoGridPointWithinRadius {
        lat: f64,
        lon: f64,
        radius_m: u32,
        distance_m: f64,
    },

    #[error("Failed processing DataFrame: {0}")]
    Polars(#[from] PolarsError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
