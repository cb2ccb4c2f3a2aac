//! In-process provider double for flow tests.

use async_trait::async_trait;
use chrono::{FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use std::{
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use crate::{
    error::{Result, WeatherError},
    model::{ConditionCode, CurrentConditions, ForecastWindow, Locator, WeatherSample},
    provider::WeatherProvider,
};

/// Answers from canned closures and records every locator it was asked about.
pub struct FakeProvider {
    current: Box<dyn Fn(&Locator) -> Result<CurrentConditions> + Send + Sync>,
    forecast: Box<dyn Fn(&Locator) -> Result<ForecastWindow> + Send + Sync>,
    pub calls: AtomicUsize,
    pub seen: Mutex<Vec<Locator>>,
}

impl std::fmt::Debug for FakeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeProvider").field("calls", &self.calls).finish()
    }
}

impl FakeProvider {
    /// Knows only "Kyiv" (any case) and any coordinates.
    pub fn new() -> Self {
        Self {
            current: Box::new(|locator: &Locator| match locator {
                Locator::City(name) if name.eq_ignore_ascii_case("kyiv") => Ok(current("Kyiv")),
                Locator::City(name) => Err(WeatherError::LocationNotFound(format!("no city {name}"))),
                Locator::Coordinates { .. } => Ok(current("Obolon")),
            }),
            forecast: Box::new(|locator: &Locator| match locator {
                Locator::City(name) if !name.eq_ignore_ascii_case("kyiv") => {
                    Err(WeatherError::ForecastUnavailable("status 404".into()))
                }
                _ => Ok(window(6)),
            }),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Every request fails with a transport error.
    pub fn offline() -> Self {
        Self {
            current: Box::new(|_: &Locator| Err(WeatherError::Transport("request timed out".into()))),
            forecast: Box::new(|_: &Locator| Err(WeatherError::Transport("request timed out".into()))),
            ..Self::new()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self, locator: &Locator) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(locator.clone());
    }
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WeatherProvider for FakeProvider {
    async fn fetch_current(&self, locator: &Locator) -> Result<CurrentConditions> {
        self.record(locator);
        (self.current)(locator)
    }

    async fn fetch_forecast(&self, locator: &Locator) -> Result<ForecastWindow> {
        self.record(locator);
        (self.forecast)(locator)
    }
}

/// Holds every request for `delay` and tracks how many overlap.
#[derive(Debug)]
pub struct SlowProvider {
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl SlowProvider {
    pub fn new(delay: Duration) -> Self {
        Self { delay, in_flight: AtomicUsize::new(0), peak: AtomicUsize::new(0) }
    }

    /// Highest number of requests observed in flight at once.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    async fn hold(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl WeatherProvider for SlowProvider {
    async fn fetch_current(&self, _locator: &Locator) -> Result<CurrentConditions> {
        self.hold().await;
        Ok(current("Kyiv"))
    }

    async fn fetch_forecast(&self, _locator: &Locator) -> Result<ForecastWindow> {
        self.hold().await;
        Ok(window(5))
    }
}

pub fn fixed_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(9, 15, 0).unwrap()
}

pub fn current(name: &str) -> CurrentConditions {
    let tz = FixedOffset::east_opt(3 * 3600).unwrap();
    CurrentConditions {
        location_name: name.to_string(),
        sample: WeatherSample {
            timestamp: fixed_now(),
            temperature_c: 19.0,
            condition: ConditionCode::Clouds,
            condition_text: "broken clouds".into(),
        },
        humidity_pct: 55,
        pressure_hpa: 1009.0,
        wind_speed_mps: 4.1,
        sunrise: tz.with_ymd_and_hms(2024, 6, 1, 4, 48, 0).unwrap(),
        sunset: tz.with_ymd_and_hms(2024, 6, 1, 21, 2, 0).unwrap(),
    }
}

/// Eight 3-hourly samples per day for `days` consecutive days from 2024-06-01.
pub fn window(days: u64) -> ForecastWindow {
    let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let samples = (0..days)
        .flat_map(|d| {
            (0..8).map(move |slot| WeatherSample {
                timestamp: (start + chrono::Days::new(d)).and_hms_opt(slot * 3, 0, 0).unwrap(),
                temperature_c: 10.0 + d as f64,
                condition: ConditionCode::Rain,
                condition_text: "light rain".into(),
            })
        })
        .collect();

    ForecastWindow { samples }
}
