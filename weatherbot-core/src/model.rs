use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

/// Number of samples requested from the forecast endpoint (5 days x 8 slots).
pub const FORECAST_SAMPLE_COUNT: usize = 40;

/// Addresses a weather query.
#[derive(Debug, Clone, PartialEq)]
pub enum Locator {
    City(String),
    Coordinates { lat: f64, lon: f64 },
}

impl Locator {
    pub fn city(name: impl Into<String>) -> Self {
        Locator::City(name.into())
    }

    /// Query parameters understood by the provider.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        match self {
            Locator::City(name) => vec![("q", name.clone())],
            Locator::Coordinates { lat, lon } => {
                vec![("lat", lat.to_string()), ("lon", lon.to_string())]
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionCode {
    Clear,
    Clouds,
    Rain,
    Drizzle,
    Thunderstorm,
    Snow,
    Mist,
    Other,
}

impl ConditionCode {
    /// Map the provider's `weather[].main` group name.
    pub fn from_main(main: &str) -> Self {
        match main {
            "Clear" => ConditionCode::Clear,
            "Clouds" => ConditionCode::Clouds,
            "Rain" => ConditionCode::Rain,
            "Drizzle" => ConditionCode::Drizzle,
            "Thunderstorm" => ConditionCode::Thunderstorm,
            "Snow" => ConditionCode::Snow,
            "Mist" => ConditionCode::Mist,
            _ => ConditionCode::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionCode::Clear => "Clear",
            ConditionCode::Clouds => "Clouds",
            ConditionCode::Rain => "Rain",
            ConditionCode::Drizzle => "Drizzle",
            ConditionCode::Thunderstorm => "Thunderstorm",
            ConditionCode::Snow => "Snow",
            ConditionCode::Mist => "Mist",
            ConditionCode::Other => "Other",
        }
    }
}

impl std::fmt::Display for ConditionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observation or forecast slot. The timestamp is the provider's wall-clock
/// value; no timezone conversion is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSample {
    pub timestamp: NaiveDateTime,
    pub temperature_c: f64,
    pub condition: ConditionCode,
    pub condition_text: String,
}

impl WeatherSample {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub location_name: String,
    pub sample: WeatherSample,
    pub humidity_pct: u8,
    pub pressure_hpa: f64,
    pub wind_speed_mps: f64,
    /// Sunrise and sunset carry the queried location's UTC offset.
    pub sunrise: DateTime<FixedOffset>,
    pub sunset: DateTime<FixedOffset>,
}

impl CurrentConditions {
    /// Never negative: the provider client rejects responses where sunset
    /// precedes sunrise.
    pub fn day_length(&self) -> TimeDelta {
        self.sunset - self.sunrise
    }
}

/// Forecast samples in provider order (chronologically non-decreasing).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastWindow {
    pub samples: Vec<WeatherSample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub average_temperature_c: f64,
    pub dominant_condition: String,
}
