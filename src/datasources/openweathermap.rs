use crate::config::{ForecastQuery, OpenWeatherMapConfig};
use crate::error::{CropOpsError, Result};
use crate::models::forecast::{
    DailyObservation, ForecastLocation, WeatherCondition, WeatherForecast,
};
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;

const API_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

pub struct OpenWeatherMapClient {
    client: reqwest::Client,
    config: OpenWeatherMapConfig,
    base_url: String,
}

// OpenWeatherMap API response structures
#[derive(Debug, Deserialize)]
struct OwmForecastResponse {
    list: Vec<OwmForecastItem>,
    city: OwmCity,
}

#[derive(Debug, Deserialize)]
struct OwmForecastItem {
    dt: i64,
    main: OwmMain,
    #[serde(default)]
    weather: Vec<OwmWeather>,
    wind: OwmWind,
    #[serde(default)]
    rain: Option<OwmPrecipitation>,
    #[serde(default)]
    snow: Option<OwmPrecipitation>,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OwmWeather {
    id: u32,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwmPrecipitation {
    #[serde(rename = "3h", default)]
    three_hour: f64,
}

#[derive(Debug, Deserialize)]
struct OwmCity {
    name: String,
    #[serde(default)]
    country: String,
    coord: OwmCoord,
}

#[derive(Debug, Deserialize)]
struct OwmCoord {
    lat: f64,
    lon: f64,
}

impl OpenWeatherMapClient {
    pub fn new(config: OpenWeatherMapConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            config,
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Point the client at another host, e.g. a local mock
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Build an endpoint URL with metric units and the configured location
    fn endpoint(&self, path: &str) -> Result<Url> {
        let mut params: Vec<(&str, String)> = match self.config.query()? {
            ForecastQuery::Coordinates {
                latitude,
                longitude,
            } => vec![("lat", latitude.to_string()), ("lon", longitude.to_string())],
            ForecastQuery::Place(place) => vec![("q", place)],
        };
        params.push(("appid", self.config.api_key.clone()));
        params.push(("units", "metric".to_string()));

        Url::parse_with_params(&format!("{}/{}", self.base_url, path), &params)
            .map_err(|e| CropOpsError::Config(format!("Invalid OpenWeatherMap URL: {}", e)))
    }

    /// Fetch 5-day/3-hour forecast from OpenWeatherMap
    pub async fn fetch_forecast(&self) -> Result<WeatherForecast> {
        let url = self.endpoint("forecast")?;

        let response =
            self.client.get(url).send().await.map_err(|e| {
                CropOpsError::DataSourceUnavailable(format!("OpenWeatherMap: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CropOpsError::DataSourceUnavailable(format!(
                "OpenWeatherMap returned {}: {}",
                status, body
            )));
        }

        let owm_response: OwmForecastResponse = response.json().await.map_err(|e| {
            CropOpsError::DataSourceUnavailable(format!(
                "Failed to parse OpenWeatherMap response: {}",
                e
            ))
        })?;

        let forecast = convert_response(owm_response);
        tracing::debug!(
            location = %forecast.location.name,
            samples = forecast.observations.len(),
            "Forecast fetched"
        );
        Ok(forecast)
    }

    /// Test connection to OpenWeatherMap API
    pub async fn test_connection(&self) -> Result<bool> {
        let url = self.endpoint("weather")?;

        let response =
            self.client.get(url).send().await.map_err(|e| {
                CropOpsError::DataSourceUnavailable(format!("OpenWeatherMap: {}", e))
            })?;

        Ok(response.status().is_success())
    }
}

fn convert_response(response: OwmForecastResponse) -> WeatherForecast {
    let location = ForecastLocation {
        name: response.city.name,
        country: response.city.country,
        latitude: response.city.coord.lat,
        longitude: response.city.coord.lon,
    };

    let mut observations: Vec<DailyObservation> =
        response.list.iter().map(convert_forecast_item).collect();
    observations.sort_by_key(|o| o.timestamp);

    WeatherForecast {
        fetched_at: Utc::now(),
        location,
        observations,
    }
}

fn convert_forecast_item(item: &OwmForecastItem) -> DailyObservation {
    let timestamp = DateTime::from_timestamp(item.dt, 0).unwrap_or_else(Utc::now);

    let condition = item
        .weather
        .first()
        .map(|w| WeatherCondition::from_owm_id(w.id))
        .unwrap_or_default();

    // Rain and snow both count towards the interval's water input
    let rain_3h_mm = match (&item.rain, &item.snow) {
        (None, None) => None,
        (rain, snow) => Some(
            rain.as_ref().map(|r| r.three_hour).unwrap_or(0.0)
                + snow.as_ref().map(|s| s.three_hour).unwrap_or(0.0),
        ),
    };

    DailyObservation {
        timestamp,
        temp_c: item.main.temp,
        humidity_percent: item.main.humidity,
        wind_speed_ms: item.wind.speed,
        rain_3h_mm,
        condition,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> OpenWeatherMapConfig {
        OpenWeatherMapConfig {
            api_key: "test_key".to_string(),
            latitude: Some(-29.17),
            longitude: Some(-51.52),
            place: None,
            enabled: true,
            timeout_secs: 5,
        }
    }

    const RESPONSE: &str = r#"{
        "list": [
            {"dt": 1767236400, "main": {"temp": 21.4, "humidity": 77},
             "weather": [{"id": 500}], "wind": {"speed": 2.1}, "rain": {"3h": 0.8}},
            {"dt": 1767225600, "main": {"temp": 18.0, "humidity": 88},
             "weather": [{"id": 803}], "wind": {"speed": 1.2}},
            {"dt": 1767247200, "main": {"temp": 1.0, "humidity": 95},
             "weather": [{"id": 601}], "wind": {"speed": 3.0},
             "rain": {"3h": 0.2}, "snow": {"3h": 1.1}}
        ],
        "city": {"name": "Bento Goncalves", "country": "BR",
                 "coord": {"lat": -29.17, "lon": -51.52}}
    }"#;

    #[test]
    fn client_creation() {
        let client = OpenWeatherMapClient::new(sample_config()).unwrap();
        assert!(client.is_enabled());
    }

    #[test]
    fn endpoint_uses_metric_units_and_coordinates() {
        let client = OpenWeatherMapClient::new(sample_config()).unwrap();
        let url = client.endpoint("forecast").unwrap();
        let query = url.query().unwrap();
        assert!(url.path().ends_with("/forecast"));
        assert!(query.contains("lat=-29.17"));
        assert!(query.contains("units=metric"));
        assert!(!query.contains("q="));
    }

    #[test]
    fn endpoint_falls_back_to_place() {
        let mut config = sample_config();
        config.latitude = None;
        config.place = Some("Bento Goncalves,BR".into());
        let client = OpenWeatherMapClient::new(config).unwrap();
        let url = client.endpoint("forecast").unwrap();
        assert!(url.query().unwrap().contains("q=Bento+Goncalves%2CBR"));
    }

    #[test]
    fn response_is_converted_in_time_order() {
        let response: OwmForecastResponse = serde_json::from_str(RESPONSE).unwrap();
        let forecast = convert_response(response);

        assert_eq!(forecast.location.name, "Bento Goncalves");
        assert_eq!(forecast.observations.len(), 3);

        let first = &forecast.observations[0];
        assert_eq!(first.temp_c, 18.0);
        assert_eq!(first.rain_3h_mm, None);
        assert_eq!(first.rainfall_mm(), 0.0);
        assert_eq!(first.condition, WeatherCondition::Clouds);

        assert_eq!(forecast.observations[1].rain_3h_mm, Some(0.8));

        let snowy = &forecast.observations[2];
        assert!((snowy.rainfall_mm() - 1.3).abs() < 1e-9);
        assert_eq!(snowy.condition, WeatherCondition::Snow);
    }
}
