//! Text rendering shared by the console and chat surfaces.

use chrono::{NaiveDateTime, TimeDelta};
use std::fmt::Write;

use crate::model::{ConditionCode, CurrentConditions, DailySummary};

pub const CITY_NOT_FOUND: &str = "⚠️ City not found or wrong input. Please try again.";
pub const LOCATION_FAILED: &str = "❌ Failed to get weather for your location.";
pub const FORECAST_NOT_AVAILABLE: &str = "⚠️ Forecast not available.";
pub const FORECAST_FAILED: &str = "❌ Failed to get forecast data.";
pub const CHOOSE_MODE: &str = "❓ Please choose forecast type using /start";
pub const NO_CITY_ENTERED: &str = "⚠️ No city entered.";
pub const CHECK_CITY_NAME: &str = "⚠️ Check the city name.";

/// How headers are emphasized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Markup {
    /// `<b>` tags, for chat transports that parse HTML.
    Html,
    /// Plain console text.
    Plain,
}

impl Markup {
    fn header(self, text: &str) -> String {
        match self {
            Markup::Html => format!("<b>{}</b>", escape_html(text)),
            Markup::Plain => format!("*** {text} ***"),
        }
    }

    fn text(self, text: &str) -> String {
        match self {
            Markup::Html => escape_html(text),
            Markup::Plain => text.to_string(),
        }
    }
}

pub fn condition_emoji(code: ConditionCode) -> &'static str {
    match code {
        ConditionCode::Clear => "☀️",
        ConditionCode::Clouds => "☁️",
        ConditionCode::Rain => "🌧",
        ConditionCode::Drizzle => "🌦",
        ConditionCode::Thunderstorm => "⚡️",
        ConditionCode::Snow => "❄️",
        ConditionCode::Mist => "🌫",
        ConditionCode::Other => "🤷",
    }
}

fn condition_label(code: ConditionCode) -> String {
    match code {
        ConditionCode::Other => format!("{} Look outside!", condition_emoji(code)),
        _ => format!("{} {code}", condition_emoji(code)),
    }
}

/// `H:MM:SS`, hours unbounded.
pub fn format_day_length(length: TimeDelta) -> String {
    let secs = length.num_seconds().max(0);
    format!("{}:{:02}:{:02}", secs / 3600, secs % 3600 / 60, secs % 60)
}

/// Single report for current conditions. `now` is the local time the report
/// is produced at.
pub fn format_current(current: &CurrentConditions, now: NaiveDateTime, markup: Markup) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "📅 {}", markup.header(&now.format("%Y-%m-%d %H:%M").to_string()));
    let _ = writeln!(out, "📍 {}", markup.header(&format!("Weather in: {}", current.location_name)));
    let _ = writeln!(
        out,
        "🌡 Temperature: {}°C {}",
        current.sample.temperature_c,
        condition_label(current.sample.condition)
    );
    let _ = writeln!(out, "💧 Humidity: {}%", current.humidity_pct);
    let _ = writeln!(out, "🔵 Pressure: {} hPa", current.pressure_hpa);
    let _ = writeln!(out, "💨 Wind speed: {} m/s", current.wind_speed_mps);
    let _ = writeln!(out, "🌅 Sunrise: {}", current.sunrise.format("%H:%M:%S"));
    let _ = writeln!(out, "🌇 Sunset: {}", current.sunset.format("%H:%M:%S"));
    let _ = writeln!(out, "🕒 Day length: {}", format_day_length(current.day_length()));
    out.push('\n');
    out.push_str("✅ Have a nice day!");
    out
}

/// Multi-day report, one block per summary.
pub fn format_forecast(location: &str, days: &[DailySummary], markup: Markup) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", markup.header(&format!("🗓 5-day forecast for {location}:")));
    out.push('\n');

    if days.is_empty() {
        out.push_str("No forecast entries returned.");
        return out;
    }

    for day in days {
        let _ = writeln!(out, "📅 {}:", day.date.format("%A, %d %B"));
        let _ = writeln!(out, "🌤 {}", markup.text(&day.dominant_condition));
        let _ = writeln!(out, "🌡 Avg Temp: {:.1}°C", day.average_temperature_c);
        out.push('\n');
    }

    out.truncate(out.trim_end().len());
    out
}

/// Uppercase every letter that follows a non-letter, lowercase the rest.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut word_start = true;
    for c in text.chars() {
        if word_start {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        word_start = !c.is_alphabetic();
    }
    out
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
