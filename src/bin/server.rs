//! HTTP server for historical MERRA-2 weather look-ups.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use merra_weather::server::auth::TokenValidator;
use merra_weather::server::config::ServerConfig;
use merra_weather::server::create_router;
use merra_weather::{EarthdataArchive, EarthdataSession, MerraWeather};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let config = ServerConfig::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let session = Arc::new(EarthdataSession::from_env().context("Earthdata credentials")?);
    let archive = EarthdataArchive::with_cmr_url(session, config.cmr_url.clone());
    let cache_dir = config
        .resolve_cache_dir()
        .context("Failed to determine cache directory")?;
    let weather = MerraWeather::with_cache_folder(archive, cache_dir)
        .await?
        .with_archive_years(config.archive_years()?);
    info!(
        "Serving years {} from cache {}",
        weather.archive_years(),
        weather.cache_dir().display()
    );

    let tokens = Arc::new(TokenValidator::new(&config.jwt_secret, config.api_secret.clone()));
    let app = create_router(Arc::new(weather), tokens);

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    info!("Listening on {}", config.listen_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
