//! Reduction of a 3-hourly forecast window into per-day summaries.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::model::{DailySummary, WeatherSample};

/// Maximum number of days emitted for one forecast window.
pub const MAX_FORECAST_DAYS: usize = 5;

/// Group samples by calendar date and reduce each date to one summary.
///
/// Dates are emitted in the order they first appear in `samples` and only the
/// first [`MAX_FORECAST_DAYS`] dates are kept. Samples of later dates are
/// dropped without error.
pub fn summarize_days(samples: &[WeatherSample]) -> Vec<DailySummary> {
    let mut order: Vec<NaiveDate> = Vec::new();
    let mut buckets: HashMap<NaiveDate, Vec<&WeatherSample>> = HashMap::new();

    for sample in samples {
        let date = sample.date();
        buckets
            .entry(date)
            .or_insert_with(|| {
                order.push(date);
                Vec::new()
            })
            .push(sample);
    }

    order
        .into_iter()
        .take(MAX_FORECAST_DAYS)
        .filter_map(|date| buckets.get(&date).map(|bucket| summarize_bucket(date, bucket)))
        .collect()
}

fn summarize_bucket(date: NaiveDate, bucket: &[&WeatherSample]) -> DailySummary {
    let total: f64 = bucket.iter().map(|s| s.temperature_c).sum();
    let average_temperature_c = total / bucket.len() as f64;

    DailySummary {
        date,
        average_temperature_c,
        dominant_condition: capitalize(dominant_text(bucket)),
    }
}

/// Most frequent condition text. Ties go to the text seen first in the bucket.
fn dominant_text<'a>(bucket: &[&'a WeatherSample]) -> &'a str {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for sample in bucket {
        let text = sample.condition_text.as_str();
        match counts.iter_mut().find(|(seen, _)| *seen == text) {
            Some((_, count)) => *count += 1,
            None => counts.push((text, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (text, count) in counts {
        if best.is_none_or(|(_, top)| count > top) {
            best = Some((text, count));
        }
    }

    best.map(|(text, _)| text).unwrap_or_default()
}

/// Upper-case the first character and lower-case the rest ("light Rain" ->
/// "Light rain").
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
