use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::{error::WeatherError, model::celsius_to_kelvin};

use super::{
    TemperatureProvider,
    http::{endpoint, get_json},
    trace_outcome,
};

const NAME: &str = "weatherunderground";
const DEFAULT_BASE_URL: &str = "http://api.wunderground.com";

#[derive(Debug, Clone)]
pub struct WeatherUndergroundProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherUndergroundProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http: Client::new(),
        }
    }

    pub fn with_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// `{base}/api/{key}/conditions/q/{city}.json`, with the city percent-encoded.
    fn conditions_url(&self, city: &str) -> Result<Url, WeatherError> {
        let file = format!("{city}.json");
        endpoint(
            NAME,
            &self.base_url,
            ["api", self.api_key.as_str(), "conditions", "q", file.as_str()],
        )
    }

    async fn fetch(&self, city: &str) -> Result<f64, WeatherError> {
        let url = self.conditions_url(city)?;
        let parsed: WuResponse = get_json(NAME, self.http.get(url)).await?;
        Ok(parsed.kelvin())
    }
}

#[derive(Debug, Deserialize)]
struct WuObservation {
    temp_c: f64,
}

#[derive(Debug, Deserialize)]
struct WuResponse {
    current_observation: WuObservation,
}

impl WuResponse {
    fn kelvin(&self) -> f64 {
        celsius_to_kelvin(self.current_observation.temp_c)
    }
}

#[async_trait]
impl TemperatureProvider for WeatherUndergroundProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn temperature(&self, city: &str) -> Result<f64, WeatherError> {
        let outcome = self.fetch(city).await;
        trace_outcome(NAME, city, &outcome);
        outcome
    }
}
