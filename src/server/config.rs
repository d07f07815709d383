use crate::archive::client::CMR_URL;
use crate::types::error::QueryError;
use crate::types::query::YearSpan;
use crate::utils::get_cache_dir;
use clap::Parser;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Server settings, read from the command line with environment fallbacks.
/// A `.env` file is loaded first by the binary.
#[derive(Parser, Debug, Clone)]
#[command(name = "merra-weather-server")]
#[command(about = "Historical MERRA-2 weather look-ups over HTTP")]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "WEATHER_LISTEN_ADDR", default_value = "0.0.0.0:8000")]
    pub listen_addr: SocketAddr,

    /// Directory for downloaded granules (default: OS cache dir)
    #[arg(long, env = "WEATHER_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// First year held by the archive
    #[arg(long, env = "WEATHER_FIRST_YEAR", default_value = "2015")]
    pub first_year: i32,

    /// Last year held by the archive
    #[arg(long, env = "WEATHER_LAST_YEAR", default_value = "2025")]
    pub last_year: i32,

    /// Base URL of the CMR search service
    #[arg(long, env = "CMR_URL", default_value = CMR_URL)]
    pub cmr_url: String,

    /// Key the bearer tokens are signed with (HS256)
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// Value expected in the tokens' `secret` claim
    #[arg(long, env = "API_SECRET", hide_env_values = true)]
    pub api_secret: String,
}

impl ServerConfig {
    pub fn archive_years(&self) -> Result<YearSpan, QueryError> {
        YearSpan::new(self.first_year, self.last_year)
    }

    pub fn resolve_cache_dir(&self) -> io::Result<PathBuf> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => get_cache_dir(),
        }
    }
}
