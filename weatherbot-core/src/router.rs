//! Conversational state machine: turns chat events into outbound messages.
//!
//! The router owns no transport. A chat adapter decodes its updates into
//! [`InboundEvent`]s, calls [`InteractionRouter::handle`] and delivers the
//! returned [`OutboundMessage`]s.

use chrono::{Local, NaiveDateTime};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use crate::{
    aggregate::summarize_days,
    error::WeatherError,
    ledger::KnownCitiesLedger,
    model::Locator,
    provider::WeatherProvider,
    report::{self, Markup},
    state::{ConversationMode, ModeStore, UserId},
};

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// `/start`: present mode choice and location sharing.
    Start,
    ModeSelection(ConversationMode),
    /// A typed city name or a shared location.
    LocationInput(Locator),
}

impl EventKind {
    /// Decode an inline button payload.
    pub fn from_button(data: &str) -> Self {
        EventKind::ModeSelection(ConversationMode::from_button(data).unwrap_or(ConversationMode::Unset))
    }

    /// Decode a free-text message.
    pub fn from_text(text: &str) -> Self {
        if text.trim() == "/start" {
            EventKind::Start
        } else {
            EventKind::LocationInput(Locator::City(text.to_string()))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    pub user: UserId,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub label: &'static str,
    pub data: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// One button per row, answered with a button payload.
    Inline(Vec<InlineButton>),
    /// One-time keyboard asking the client to share its location.
    RequestLocation { label: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub text: String,
    pub keyboard: Option<Keyboard>,
    /// Quote the inbound message when delivering.
    pub reply: bool,
}

impl OutboundMessage {
    fn answer(text: impl Into<String>) -> Self {
        Self { text: text.into(), keyboard: None, reply: false }
    }

    fn reply(text: impl Into<String>) -> Self {
        Self { text: text.into(), keyboard: None, reply: true }
    }

    fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

pub fn mode_keyboard() -> Keyboard {
    Keyboard::Inline(vec![
        InlineButton { label: "🌤 Now", data: "now" },
        InlineButton { label: "📆 5-day Forecast", data: "week" },
    ])
}

#[derive(Debug, Clone, Copy)]
pub struct RouterOptions {
    /// Handle events of one user strictly one after another. When off, two
    /// rapid events from the same user may interleave their mode reads and
    /// writes.
    pub serialize_per_user: bool,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self { serialize_per_user: true }
    }
}

type UserLock = Arc<tokio::sync::Mutex<()>>;

pub struct InteractionRouter {
    provider: Arc<dyn WeatherProvider>,
    modes: Arc<dyn ModeStore>,
    ledger: Option<KnownCitiesLedger>,
    options: RouterOptions,
    user_locks: Mutex<HashMap<UserId, UserLock>>,
    clock: fn() -> NaiveDateTime,
}

impl InteractionRouter {
    pub fn new(provider: Arc<dyn WeatherProvider>, modes: Arc<dyn ModeStore>) -> Self {
        Self {
            provider,
            modes,
            ledger: None,
            options: RouterOptions::default(),
            user_locks: Mutex::new(HashMap::new()),
            clock: || Local::now().naive_local(),
        }
    }

    pub fn with_ledger(mut self, ledger: KnownCitiesLedger) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn with_options(mut self, options: RouterOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the source of the report timestamp.
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    fn user_lock(&self, user: UserId) -> UserLock {
        let mut locks = self.user_locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(user).or_default().clone()
    }

    /// Drop the user's lock once no event holds or awaits it. Clones are only
    /// taken under the map mutex, so a count of one means the map is the sole
    /// owner.
    fn release_user_lock(&self, user: UserId) {
        let mut locks = self.user_locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks.get(&user).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(&user);
        }
    }

    /// Handle one event. Failures never escape: each flow answers with its
    /// own apology instead.
    pub async fn handle(&self, event: InboundEvent) -> Vec<OutboundMessage> {
        if !self.options.serialize_per_user {
            return self.dispatch(event).await;
        }

        let user = event.user;
        let guard = self.user_lock(user).lock_owned().await;
        let replies = self.dispatch(event).await;
        drop(guard);
        self.release_user_lock(user);

        replies
    }

    async fn dispatch(&self, event: InboundEvent) -> Vec<OutboundMessage> {
        match event.kind {
            EventKind::Start => vec![
                OutboundMessage::answer("Hello! Choose type of weather forecast:")
                    .with_keyboard(mode_keyboard()),
                OutboundMessage::answer("Or send your location:")
                    .with_keyboard(Keyboard::RequestLocation { label: "📍 Send location" }),
            ],
            EventKind::ModeSelection(mode) => match self.modes.set(event.user, mode) {
                Ok(()) => vec![OutboundMessage::answer("Great! Now enter the city name 🌇")],
                Err(err) => {
                    tracing::warn!(user = event.user, error = %err, "rejected mode selection");
                    vec![OutboundMessage::answer(report::CHOOSE_MODE)]
                }
            },
            EventKind::LocationInput(locator) => self.handle_location(event.user, locator).await,
        }
    }

    async fn handle_location(&self, user: UserId, locator: Locator) -> Vec<OutboundMessage> {
        let locator = match locator {
            Locator::City(text) => {
                let city = text.trim().to_string();
                if city.is_empty() {
                    return vec![OutboundMessage::reply(report::NO_CITY_ENTERED)];
                }
                self.remember_city(&city).await;
                Locator::City(city)
            }
            coords => coords,
        };

        let message = match self.modes.get(user) {
            ConversationMode::Now => self.current_report(&locator).await,
            ConversationMode::Forecast => self.forecast_report(&locator).await,
            ConversationMode::Unset => OutboundMessage::answer(report::CHOOSE_MODE),
        };

        vec![message]
    }

    /// Ledger failures are logged and otherwise ignored.
    async fn remember_city(&self, city: &str) {
        let Some(ledger) = self.ledger.clone() else {
            return;
        };
        let city = city.to_string();

        match tokio::task::spawn_blocking(move || ledger.record(&city)).await {
            Ok(Ok(_)) => {}
            Ok(Err(err)) => tracing::warn!(error = %err, "failed to record city"),
            Err(err) => tracing::warn!(error = %err, "city recording task failed"),
        }
    }

    async fn current_report(&self, locator: &Locator) -> OutboundMessage {
        match self.provider.fetch_current(locator).await {
            Ok(current) => {
                OutboundMessage::reply(report::format_current(&current, (self.clock)(), Markup::Html))
            }
            Err(err) => {
                tracing::error!(error = %err, "current weather request failed");
                match locator {
                    Locator::City(_) => OutboundMessage::reply(report::CITY_NOT_FOUND),
                    Locator::Coordinates { .. } => OutboundMessage::reply(report::LOCATION_FAILED),
                }
            }
        }
    }

    async fn forecast_report(&self, locator: &Locator) -> OutboundMessage {
        match self.provider.fetch_forecast(locator).await {
            Ok(window) => {
                let days = summarize_days(&window.samples);
                let title = match locator {
                    Locator::City(city) => report::title_case(city),
                    Locator::Coordinates { .. } => "your location".to_string(),
                };
                OutboundMessage::answer(report::format_forecast(&title, &days, Markup::Html))
            }
            Err(err @ WeatherError::ForecastUnavailable(_)) => {
                tracing::warn!(error = %err, "forecast rejected by provider");
                OutboundMessage::answer(report::FORECAST_NOT_AVAILABLE)
            }
            Err(err) => {
                tracing::error!(error = %err, "forecast request failed");
                OutboundMessage::answer(report::FORECAST_FAILED)
            }
        }
    }
}
