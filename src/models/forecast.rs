use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw 3-hourly forecast as delivered by the weather collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherForecast {
    pub fetched_at: DateTime<Utc>,
    pub location: ForecastLocation,
    pub observations: Vec<DailyObservation>, // 3-hour intervals, ordered
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastLocation {
    pub name: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// A single 3-hour forecast sample
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyObservation {
    pub timestamp: DateTime<Utc>,
    pub temp_c: f64,
    pub humidity_percent: f64,
    pub wind_speed_ms: f64,
    /// Rain + snow over the 3-hour interval; absent when the feed omits it
    pub rain_3h_mm: Option<f64>,
    pub condition: WeatherCondition,
}

impl DailyObservation {
    /// Rainfall for the interval, with a missing value counted as zero
    pub fn rainfall_mm(&self) -> f64 {
        self.rain_3h_mm.unwrap_or(0.0)
    }
}

/// Weather condition categories from OpenWeatherMap condition codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WeatherCondition {
    #[default]
    Clear,
    Clouds,
    Rain,
    Drizzle,
    Thunderstorm,
    Snow,
    Mist,
    Other,
}

impl WeatherCondition {
    pub fn from_owm_id(id: u32) -> Self {
        match id {
            200..=232 => WeatherCondition::Thunderstorm,
            300..=321 => WeatherCondition::Drizzle,
            500..=531 => WeatherCondition::Rain,
            600..=622 => WeatherCondition::Snow,
            701..=781 => WeatherCondition::Mist,
            800 => WeatherCondition::Clear,
            801..=804 => WeatherCondition::Clouds,
            _ => WeatherCondition::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherCondition::Clear => "Clear",
            WeatherCondition::Clouds => "Cloudy",
            WeatherCondition::Rain => "Rain",
            WeatherCondition::Drizzle => "Drizzle",
            WeatherCondition::Thunderstorm => "Storm",
            WeatherCondition::Snow => "Snow",
            WeatherCondition::Mist => "Mist",
            WeatherCondition::Other => "Other",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            WeatherCondition::Clear => "☀",
            WeatherCondition::Clouds => "☁",
            WeatherCondition::Rain => "🌧",
            WeatherCondition::Drizzle => "🌦",
            WeatherCondition::Thunderstorm => "⛈",
            WeatherCondition::Snow => "❄",
            WeatherCondition::Mist => "🌫",
            WeatherCondition::Other => "?",
        }
    }
}

impl std::fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
