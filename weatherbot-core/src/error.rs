use thiserror::Error;

/// Failure kinds surfaced by weather queries.
///
/// Every user-facing flow catches these at its own boundary and maps each kind
/// to an apology message; none of them is retried.
#[derive(Error, Debug)]
pub enum WeatherError {
    /// The provider did not recognise the location (non-success status on the
    /// current conditions endpoint).
    #[error("location not found: {0}")]
    LocationNotFound(String),

    /// The forecast endpoint answered with a non-success status.
    #[error("forecast unavailable: {0}")]
    ForecastUnavailable(String),

    /// Timeout, network failure or a body that could not be understood.
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            WeatherError::Transport(format!("request timed out: {err}"))
        } else {
            WeatherError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for WeatherError {
    fn from(err: serde_json::Error) -> Self {
        WeatherError::Transport(format!("malformed response body: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, WeatherError>;
