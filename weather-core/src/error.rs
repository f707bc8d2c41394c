use thiserror::Error;

/// Why a temperature lookup produced no reading.
///
/// Adapter failures and aggregator failures share this type so a failure
/// travels unchanged from the adapter that raised it up to the caller.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("{provider}: request failed: {source}")]
    Transport {
        provider: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider}: upstream returned status {status}: {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("{provider}: unexpected response body: {source}")]
    Decode {
        provider: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{provider}: cannot build request url from '{url}'")]
    InvalidUrl { provider: String, url: String },

    #[error("{provider}: provider crashed: {message}")]
    Panicked { provider: String, message: String },

    #[error("no weather providers configured")]
    NoProviders,

    /// Producers went away without reporting; only seen during runtime shutdown.
    #[error("lookup abandoned after {received} of {expected} providers reported")]
    Abandoned { expected: usize, received: usize },
}

impl WeatherError {
    /// Name of the provider that failed, if the failure came from one.
    pub fn provider(&self) -> Option<&str> {
        match self {
            WeatherError::Transport { provider, .. }
            | WeatherError::Status { provider, .. }
            | WeatherError::Decode { provider, .. }
            | WeatherError::InvalidUrl { provider, .. }
            | WeatherError::Panicked { provider, .. } => Some(provider),
            WeatherError::NoProviders | WeatherError::Abandoned { .. } => None,
        }
    }
}
