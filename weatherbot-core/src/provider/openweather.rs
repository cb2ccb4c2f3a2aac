use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::{
    error::{Result, WeatherError},
    model::{
        ConditionCode, CurrentConditions, FORECAST_SAMPLE_COUNT, ForecastWindow, Locator,
        WeatherSample,
    },
};

use super::WeatherProvider;

const FORECAST_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Locator parameters, credentials and metric units, then `extra`.
    fn request_query(
        &self,
        locator: &Locator,
        extra: &[(&'static str, String)],
    ) -> Vec<(&'static str, String)> {
        let mut query = locator.query_params();
        query.push(("appid", self.api_key.clone()));
        query.push(("units", "metric".to_string()));
        query.extend_from_slice(extra);
        query
    }

    fn forecast_extra() -> [(&'static str, String); 1] {
        [("cnt", FORECAST_SAMPLE_COUNT.to_string())]
    }

    async fn get_body(
        &self,
        endpoint: &str,
        locator: &Locator,
        extra: &[(&'static str, String)],
    ) -> Result<String> {
        let url = format!("{}/{endpoint}", self.base_url);
        let query = self.request_query(locator, extra);

        let res = self.http.get(&url).query(&query).send().await?;
        let status = res.status();
        let body = res.text().await?;

        tracing::debug!(%endpoint, %status, bytes = body.len(), "OpenWeather response");

        Ok(body)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch_current(&self, locator: &Locator) -> Result<CurrentConditions> {
        let body = self.get_body("weather", locator, &[]).await?;
        parse_current(&body)
    }

    async fn fetch_forecast(&self, locator: &Locator) -> Result<ForecastWindow> {
        let body = self.get_body("forecast", locator, &Self::forecast_extra()).await?;
        parse_forecast(&body)
    }
}

/// The `cod` field is a number on the current endpoint and a string on the
/// forecast endpoint. Each endpoint is checked against its own form.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(untagged)]
enum OwCod {
    Number(i64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct OwStatus {
    cod: Option<OwCod>,
    message: Option<serde_json::Value>,
}

impl OwStatus {
    fn describe(&self) -> String {
        let cod = match &self.cod {
            Some(OwCod::Number(n)) => n.to_string(),
            Some(OwCod::Text(s)) => s.clone(),
            None => "<missing>".to_string(),
        };
        match &self.message {
            Some(serde_json::Value::String(msg)) => format!("status {cod}: {}", truncate_body(msg)),
            _ => format!("status {cod}"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentMain {
    temp: f64,
    humidity: u8,
    pressure: f64,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    dt: i64,
    #[serde(default)]
    timezone: i32,
    main: OwCurrentMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    sys: OwSys,
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt_txt: String,
    main: OwForecastMain,
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastEntry>,
}

fn first_weather(weather: &[OwWeather]) -> Result<&OwWeather> {
    weather
        .first()
        .ok_or_else(|| WeatherError::Transport("response contained no weather entry".into()))
}

fn local_instant(ts: i64, offset: FixedOffset) -> Result<DateTime<FixedOffset>> {
    DateTime::from_timestamp(ts, 0)
        .map(|utc| utc.with_timezone(&offset))
        .ok_or_else(|| WeatherError::Transport(format!("timestamp out of range: {ts}")))
}

/// Normalize a current conditions body. Success requires a numeric `cod` of 200.
pub fn parse_current(body: &str) -> Result<CurrentConditions> {
    let status: OwStatus = serde_json::from_str(body)?;
    if status.cod != Some(OwCod::Number(200)) {
        return Err(WeatherError::LocationNotFound(status.describe()));
    }

    let parsed: OwCurrentResponse = serde_json::from_str(body)?;
    let weather = first_weather(&parsed.weather)?;

    let offset = FixedOffset::east_opt(parsed.timezone).ok_or_else(|| {
        WeatherError::Transport(format!("timezone offset out of range: {}", parsed.timezone))
    })?;
    let observed = local_instant(parsed.dt, offset)?;
    let sunrise = local_instant(parsed.sys.sunrise, offset)?;
    let sunset = local_instant(parsed.sys.sunset, offset)?;

    if sunset < sunrise {
        return Err(WeatherError::Transport("sunset precedes sunrise".into()));
    }

    Ok(CurrentConditions {
        location_name: parsed.name,
        sample: WeatherSample {
            timestamp: observed.naive_local(),
            temperature_c: parsed.main.temp,
            condition: ConditionCode::from_main(&weather.main),
            condition_text: weather.description.clone(),
        },
        humidity_pct: parsed.main.humidity,
        pressure_hpa: parsed.main.pressure,
        wind_speed_mps: parsed.wind.speed,
        sunrise,
        sunset,
    })
}

/// Normalize a forecast body. Success requires the string `cod` "200".
pub fn parse_forecast(body: &str) -> Result<ForecastWindow> {
    let status: OwStatus = serde_json::from_str(body)?;
    if !matches!(&status.cod, Some(OwCod::Text(cod)) if cod == "200") {
        return Err(WeatherError::ForecastUnavailable(status.describe()));
    }

    let parsed: OwForecastResponse = serde_json::from_str(body)?;

    let samples = parsed
        .list
        .iter()
        .take(FORECAST_SAMPLE_COUNT)
        .map(|entry| -> Result<WeatherSample> {
            let timestamp = NaiveDateTime::parse_from_str(&entry.dt_txt, FORECAST_TIMESTAMP_FORMAT)
                .map_err(|err| {
                    WeatherError::Transport(format!("bad forecast timestamp {:?}: {err}", entry.dt_txt))
                })?;
            let weather = first_weather(&entry.weather)?;

            Ok(WeatherSample {
                timestamp,
                temperature_c: entry.main.temp,
                condition: ConditionCode::from_main(&weather.main),
                condition_text: weather.description.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ForecastWindow { samples })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeDelta, Timelike};

    const CURRENT_OK: &str = r#"{
        "coord": {"lon": 30.52, "lat": 50.45},
        "weather": [{"id": 800, "main": "Clear", "description": "clear sky", "icon": "01d"}],
        "main": {"temp": 21.4, "feels_like": 20.9, "pressure": 1015, "humidity": 48},
        "wind": {"speed": 3.6, "deg": 200},
        "dt": 1717236000,
        "sys": {"country": "UA", "sunrise": 1717207200, "sunset": 1717266300},
        "timezone": 10800,
        "name": "Kyiv",
        "cod": 200
    }"#;

    fn forecast_body(cod: &str, count: usize) -> String {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let entries: Vec<String> = (0..count)
            .map(|i| {
                let ts = start + TimeDelta::hours(3 * i as i64);
                format!(
                    r#"{{"dt": {}, "dt_txt": "{}", "main": {{"temp": {}.5, "humidity": 60}},
                        "weather": [{{"main": "Rain", "description": "light rain"}}]}}"#,
                    ts.and_utc().timestamp(),
                    ts.format(FORECAST_TIMESTAMP_FORMAT),
                    i
                )
            })
            .collect();
        format!(
            r#"{{"cod": {cod}, "message": 0, "cnt": {count}, "list": [{}], "city": {{"name": "Kyiv"}}}}"#,
            entries.join(",")
        )
    }

    #[test]
    fn parses_current_conditions() {
        let current = parse_current(CURRENT_OK).unwrap();

        assert_eq!(current.location_name, "Kyiv");
        assert_eq!(current.sample.condition, ConditionCode::Clear);
        assert_eq!(current.sample.condition_text, "clear sky");
        assert_eq!(current.humidity_pct, 48);
        assert_eq!(current.pressure_hpa, 1015.0);
        assert_eq!(current.sunrise.offset().local_minus_utc(), 10800);
        assert_eq!(current.sunrise.hour(), 5);
        assert_eq!(current.day_length(), TimeDelta::seconds(59100));
    }

    #[test]
    fn current_with_string_cod_is_location_not_found() {
        let body = r#"{"cod": "404", "message": "city not found"}"#;

        match parse_current(body) {
            Err(WeatherError::LocationNotFound(msg)) => assert!(msg.contains("city not found")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn current_success_requires_numeric_cod() {
        let body = CURRENT_OK.replace(r#""cod": 200"#, r#""cod": "200""#);
        assert!(matches!(parse_current(&body), Err(WeatherError::LocationNotFound(_))));
    }

    #[test]
    fn current_with_inverted_sun_times_is_malformed() {
        let body = CURRENT_OK.replace("1717266300", "1717200000");
        assert!(matches!(parse_current(&body), Err(WeatherError::Transport(_))));
    }

    #[test]
    fn non_json_body_is_transport_error() {
        assert!(matches!(parse_current("<html>502</html>"), Err(WeatherError::Transport(_))));
        assert!(matches!(parse_forecast(""), Err(WeatherError::Transport(_))));
    }

    #[test]
    fn parses_forecast_window() {
        let window = parse_forecast(&forecast_body("\"200\"", 40)).unwrap();

        assert_eq!(window.samples.len(), 40);
        assert_eq!(window.samples[1].timestamp.hour(), 3);
        assert_eq!(window.samples[1].condition, ConditionCode::Rain);
        assert_eq!(window.samples[1].condition_text, "light rain");
    }

    #[test]
    fn forecast_is_capped_at_forty_samples() {
        let window = parse_forecast(&forecast_body("\"200\"", 45)).unwrap();
        assert_eq!(window.samples.len(), FORECAST_SAMPLE_COUNT);
    }

    #[test]
    fn forecast_success_requires_string_cod() {
        let numeric = forecast_body("200", 8);
        assert!(matches!(parse_forecast(&numeric), Err(WeatherError::ForecastUnavailable(_))));

        let body = r#"{"cod": "401", "message": "Invalid API key"}"#;
        assert!(matches!(parse_forecast(body), Err(WeatherError::ForecastUnavailable(_))));
    }

    #[test]
    fn bad_forecast_timestamp_is_transport_error() {
        let body = forecast_body("\"200\"", 2).replace("2024-06-01 03:00:00", "tomorrow");
        assert!(matches!(parse_forecast(&body), Err(WeatherError::Transport(_))));
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "й".repeat(250);
        let short = truncate_body(&long);

        assert!(short.ends_with("..."));
        assert_eq!(short.chars().count(), 203);
    }

    fn provider(base_url: &str, timeout: Duration) -> OpenWeatherProvider {
        OpenWeatherProvider::new("KEY".into(), base_url, timeout).unwrap()
    }

    #[test]
    fn current_query_by_city_carries_key_and_units() {
        let ow = provider(crate::config::DEFAULT_BASE_URL, Duration::from_secs(10));

        let query = ow.request_query(&Locator::city("Kyiv"), &[]);

        assert_eq!(
            query,
            vec![
                ("q", "Kyiv".to_string()),
                ("appid", "KEY".to_string()),
                ("units", "metric".to_string()),
            ]
        );
    }

    #[test]
    fn forecast_query_by_coordinates_asks_for_forty_samples() {
        let ow = provider(crate::config::DEFAULT_BASE_URL, Duration::from_secs(10));
        let here = Locator::Coordinates { lat: 50.45, lon: 30.52 };

        let query = ow.request_query(&here, &OpenWeatherProvider::forecast_extra());

        assert_eq!(
            query,
            vec![
                ("lat", "50.45".to_string()),
                ("lon", "30.52".to_string()),
                ("appid", "KEY".to_string()),
                ("units", "metric".to_string()),
                ("cnt", "40".to_string()),
            ]
        );
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let ow = provider("http://localhost:9/data/2.5/", Duration::from_secs(1));
        assert_eq!(ow.base_url, "http://localhost:9/data/2.5");
    }

    #[tokio::test]
    async fn silent_server_times_out_as_transport_error() {
        // Accepted by the kernel backlog, never answered.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}/data/2.5", listener.local_addr().unwrap());
        let ow = provider(&base_url, Duration::from_millis(200));

        let started = std::time::Instant::now();
        let result = ow.fetch_current(&Locator::city("Kyiv")).await;

        match result {
            Err(WeatherError::Transport(msg)) => assert!(msg.contains("timed out"), "{msg}"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(started.elapsed() < Duration::from_secs(5));
        drop(listener);
    }

    #[tokio::test]
    async fn refused_connection_is_transport_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let ow = provider(&format!("http://127.0.0.1:{port}"), Duration::from_secs(2));

        let result = ow.fetch_forecast(&Locator::city("Kyiv")).await;

        assert!(matches!(result, Err(WeatherError::Transport(_))));
    }
}
