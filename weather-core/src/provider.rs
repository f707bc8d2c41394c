use crate::{
    Config, MultiProvider, WeatherError,
    provider::{
        forecastio::ForecastIoProvider, openweathermap::OpenWeatherMapProvider,
        weatherunderground::WeatherUndergroundProvider,
    },
};
use async_trait::async_trait;
use reqwest::Client;
use std::{convert::TryFrom, fmt::Debug, sync::Arc};

pub mod forecastio;
pub(crate) mod http;
pub mod openweathermap;
pub mod weatherunderground;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenWeatherMap,
    WeatherUnderground,
    ForecastIo,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenWeatherMap => "openweathermap",
            ProviderId::WeatherUnderground => "weatherunderground",
            ProviderId::ForecastIo => "forecastio",
        }
    }

    /// All providers, in the order the aggregator queries them.
    pub const fn all() -> &'static [ProviderId] {
        &[
            ProviderId::OpenWeatherMap,
            ProviderId::WeatherUnderground,
            ProviderId::ForecastIo,
        ]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweathermap" => Ok(ProviderId::OpenWeatherMap),
            "weatherunderground" => Ok(ProviderId::WeatherUnderground),
            "forecastio" => Ok(ProviderId::ForecastIo),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openweathermap, weatherunderground, forecastio."
            )),
        }
    }
}

/// A single source of current temperatures.
///
/// Implementations convert their source's native unit to Kelvin before
/// returning, and must tolerate being called from many tasks at once.
#[async_trait]
pub trait TemperatureProvider: Send + Sync + Debug {
    /// Short source name used in logs and error messages.
    fn name(&self) -> &str;

    /// Current temperature in `city`, in Kelvin.
    async fn temperature(&self, city: &str) -> Result<f64, WeatherError>;
}

/// Emit the per-invocation log line every provider produces.
pub(crate) fn trace_outcome(provider: &str, city: &str, outcome: &Result<f64, WeatherError>) {
    match outcome {
        Ok(kelvin) => tracing::info!(provider, city, kelvin = %format!("{kelvin:.2}"), "temperature reading"),
        Err(err) => tracing::warn!(provider, city, error = %err, "temperature lookup failed"),
    }
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
    http: &Client,
) -> anyhow::Result<Arc<dyn TemperatureProvider>> {
    let api_key = config.provider_api_key(id).ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: run `weather configure {id}` and enter your API key."
        )
    })?;

    let provider: Arc<dyn TemperatureProvider> = match id {
        ProviderId::OpenWeatherMap => Arc::new(
            OpenWeatherMapProvider::new(api_key.to_owned()).with_client(http.clone()),
        ),
        ProviderId::WeatherUnderground => Arc::new(
            WeatherUndergroundProvider::new(api_key.to_owned()).with_client(http.clone()),
        ),
        ProviderId::ForecastIo => {
            let mut provider =
                ForecastIoProvider::new(api_key.to_owned()).with_client(http.clone());
            if let Some(coordinates) = config.provider_coordinates(id) {
                provider = provider.with_coordinates(coordinates);
            }
            Arc::new(provider)
        }
    };

    Ok(provider)
}

/// Build an aggregator over every provider that has credentials in `config`.
pub fn aggregator_from_config(config: &Config) -> anyhow::Result<MultiProvider> {
    let ids = config.configured_providers();
    if ids.is_empty() {
        return Err(anyhow::anyhow!(
            "No weather providers configured.\n\
             Hint: run `weather configure <provider>` (e.g. `weather configure openweathermap`) first."
        ));
    }

    let http = config.http_client()?;
    let providers = ids
        .into_iter()
        .map(|id| provider_from_config(id, config, &http))
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(MultiProvider::new(providers))
}
