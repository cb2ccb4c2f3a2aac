//! Core library for the `weatherbot` CLI and chat surfaces.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The weather provider abstraction and its OpenWeather implementation
//! - Forecast aggregation into daily summaries
//! - Per-user conversation mode and the chat interaction router
//! - The known-cities ledger and the text presentation layer
//!
//! It is used by `weatherbot-cli`, but a chat transport adapter can drive
//! [`InteractionRouter`] the same way.

pub mod aggregate;
pub mod config;
pub mod console;
pub mod error;
pub mod ledger;
pub mod model;
pub mod provider;
pub mod report;
pub mod router;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregate::summarize_days;
pub use config::Config;
pub use console::console_report;
pub use error::WeatherError;
pub use ledger::KnownCitiesLedger;
pub use model::{CurrentConditions, DailySummary, ForecastWindow, Locator, WeatherSample};
pub use provider::{WeatherProvider, provider_from_config};
pub use router::{EventKind, InboundEvent, InteractionRouter, Keyboard, OutboundMessage, RouterOptions};
pub use state::{ConversationMode, InMemoryModeStore, ModeStore, UserId};
