//! Single-shot command-line report: current conditions, then the forecast.

use chrono::NaiveDateTime;

use crate::{
    aggregate::summarize_days,
    error::WeatherError,
    model::Locator,
    provider::WeatherProvider,
    report::{self, Markup},
};

/// Produce the console report for the text typed at the city prompt.
///
/// Returns the blocks to print, in order. Blank input yields a single warning
/// and issues no query. Each half fails on its own; neither failure stops the
/// other.
pub async fn console_report(
    provider: &dyn WeatherProvider,
    input: &str,
    now: NaiveDateTime,
) -> Vec<String> {
    let city = input.trim();
    if city.is_empty() {
        return vec![report::NO_CITY_ENTERED.to_string()];
    }
    let locator = Locator::city(city);

    let current = match provider.fetch_current(&locator).await {
        Ok(current) => report::format_current(&current, now, Markup::Plain),
        Err(err) => {
            tracing::error!(error = %err, "current weather request failed");
            format!("❌ Error: {err}\n{}", report::CHECK_CITY_NAME)
        }
    };

    let forecast = match provider.fetch_forecast(&locator).await {
        Ok(window) => {
            let days = summarize_days(&window.samples);
            report::format_forecast(&report::title_case(city), &days, Markup::Plain)
        }
        Err(err @ WeatherError::ForecastUnavailable(_)) => {
            tracing::warn!(error = %err, "forecast rejected by provider");
            report::FORECAST_NOT_AVAILABLE.to_string()
        }
        Err(err) => {
            tracing::error!(error = %err, "forecast request failed");
            format!("❌ Error while getting forecast: {err}")
        }
    };

    vec![
        "📌 Current Weather:".to_string(),
        current,
        "📌 5-Day Forecast:".to_string(),
        forecast,
    ]
}
