use crate::{
    Config,
    error::Result,
    model::{CurrentConditions, ForecastWindow, Locator},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

/// Remote weather data source.
///
/// Implementations perform exactly one request per call and never retry.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch_current(&self, locator: &Locator) -> Result<CurrentConditions>;

    /// Up to [`crate::model::FORECAST_SAMPLE_COUNT`] samples in provider order.
    async fn fetch_forecast(&self, locator: &Locator) -> Result<ForecastWindow>;
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let api_key = config.api_key()?;
    let provider = OpenWeatherProvider::new(api_key, &config.base_url, config.timeout())?;

    Ok(Arc::new(provider))
}
