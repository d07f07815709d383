use merra_weather::{DateWindow, EarthdataSession, LatLon, MerraWeather, WeatherError};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), WeatherError> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let session = Arc::new(EarthdataSession::from_env()?);
    let client = MerraWeather::new(session).await?;

    let report = client
        .weather_check()
        .location(LatLon(43.36, -5.84))
        .radius_m(30_000)
        .window(DateWindow::single_year(2020, 8, 12, 14)?)
        .call()
        .await?;

    println!("{} at ({}, {})", report.date_range, report.location.lat, report.location.lon);
    for year in &report.years {
        println!(
            "{}: mean {:?} max {:?} min {:?} rain hours {:?}",
            year.year, year.mean_temp, year.max_temp, year.min_temp, year.rain.hours
        );
    }
    Ok(())
}
