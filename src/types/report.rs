use crate::types::query::WeatherQuery;
use serde::Serialize;

/// Precipitation summary for one year's window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RainRecord {
    /// Daily maximum precipitation rate, as stored in the granules.
    pub quantity: Vec<Option<f64>>,
    /// Hours with rain per day, between 0 and 24.
    pub hours: Vec<Option<f64>>,
}

/// Daily values of one year inside the requested window, in date order.
///
/// Temperatures are degrees Celsius. Missing values serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyRecord {
    pub year: i32,
    pub mean_temp: Vec<Option<f64>>,
    pub max_temp: Vec<Option<f64>>,
    pub min_temp: Vec<Option<f64>>,
    pub rain: RainRecord,
}

impl YearlyRecord {
    /// A year with no data, e.g. outside the archive.
    pub fn empty(year: i32) -> Self {
        Self {
            year,
            mean_temp: Vec::new(),
            max_temp: Vec::new(),
            min_temp: Vec::new(),
            rain: RainRecord::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.mean_temp.is_empty()
            && self.max_temp.is_empty()
            && self.min_temp.is_empty()
            && self.rain.quantity.is_empty()
            && self.rain.hours.is_empty()
    }

    pub fn days(&self) -> usize {
        self.mean_temp.len()
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

/// Response body of a weather check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    pub location: Location,
    pub date_range: String,
    pub years: Vec<YearlyRecord>,
}

impl WeatherReport {
    /// Echoes the query's location and window around the per-year records.
    pub fn assemble(query: &WeatherQuery, mut years: Vec<YearlyRecord>) -> Self {
        years.sort_by_key(|record| record.year);
        Self {
            location: Location {
                lat: query.location.0,
                lon: query.location.1,
            },
            date_range: query.window.describe(),
            years,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::query::DateWindow;
    use crate::LatLon;
    use serde_json::json;

    #[test]
    fn test_report_serializes_camel_case_with_nulls() {
        let query = WeatherQuery::new(
            LatLon(43.36, -5.84),
            30_000,
            DateWindow::single_year(2020, 8, 12, 12).unwrap(),
        )
        .unwrap();
        let record = YearlyRecord {
            year: 2020,
            mean_temp: vec![Some(17.0)],
            max_temp: vec![None],
            min_temp: vec![Some(12.5)],
            rain: RainRecord {
                quantity: vec![Some(0.0)],
                hours: vec![Some(24.0)],
            },
        };
        let report = WeatherReport::assemble(&query, vec![record]);

        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({
                "location": {"lat": 43.36, "lon": -5.84},
                "dateRange": "2020-08-12 to 2020-08-12",
                "years": [{
                    "year": 2020,
                    "meanTemp": [17.0],
                    "maxTemp": [null],
                    "minTemp": [12.5],
                    "rain": {"quantity": [0.0], "hours": [24.0]}
                }]
            })
        );
    }

    #[test]
    fn test_assemble_orders_years() {
        let query = WeatherQuery::new(
            LatLon(0.0, 0.0),
            1,
            DateWindow::single_year(2020, 1, 1, 1).unwrap(),
        )
        .unwrap();
        let report = WeatherReport::assemble(
            &query,
            vec![YearlyRecord::empty(2021), YearlyRecord::empty(2019)],
        );
        let years: Vec<_> = report.years.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2019, 2021]);
        assert!(report.years[0].is_empty());
    }
}
