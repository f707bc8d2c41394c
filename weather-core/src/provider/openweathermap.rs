use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::WeatherError;

use super::{
    TemperatureProvider,
    http::{endpoint, get_json},
    trace_outcome,
};

const NAME: &str = "openweathermap";
const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// Current weather from OpenWeatherMap, which reports Kelvin by default.
#[derive(Debug, Clone)]
pub struct OpenWeatherMapProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherMapProvider {
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

    async fn fetch(&self, city: &str) -> Result<f64, WeatherError> {
        let url = endpoint(NAME, &self.base_url, ["data", "2.5", "weather"])?;

        let request = self
            .http
            .get(url)
            .query(&[("q", city), ("appid", self.api_key.as_str())]);

        let parsed: OwmResponse = get_json(NAME, request).await?;
        Ok(parsed.kelvin())
    }
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwmResponse {
    main: OwmMain,
}

impl OwmResponse {
    // Standard units are already Kelvin.
    fn kelvin(&self) -> f64 {
        self.main.temp
    }
}

#[async_trait]
impl TemperatureProvider for OpenWeatherMapProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn temperature(&self, city: &str) -> Result<f64, WeatherError> {
        let outcome = self.fetch(city).await;
        trace_outcome(NAME, city, &outcome);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::http::{decode_body, stub};
    use reqwest::StatusCode;

    const SAMPLE: &str = r#"{
        "coord": {"lon": 139.69, "lat": 35.69},
        "weather": [{"id": 801, "main": "Clouds", "description": "few clouds"}],
        "main": {"temp": 289.92, "feels_like": 289.5, "pressure": 1016, "humidity": 72},
        "name": "Tokyo"
    }"#;

    #[test]
    fn reads_kelvin_without_conversion() {
        let parsed: OwmResponse = decode_body(NAME, StatusCode::OK, SAMPLE).expect("decodes");
        assert_eq!(parsed.kelvin(), 289.92);
    }

    #[test]
    fn missing_main_block_is_rejected() {
        let err = decode_body::<OwmResponse>(NAME, StatusCode::OK, r#"{"name":"Tokyo"}"#)
            .unwrap_err();
        assert!(matches!(err, WeatherError::Decode { .. }));
    }

    #[tokio::test]
    async fn queries_city_and_key() {
        let (base_url, request_line) = stub::serve_once(200, SAMPLE).await;
        let provider = OpenWeatherMapProvider::new("KEY".into())
            .with_client(stub::client())
            .with_base_url(base_url);

        let kelvin = provider.temperature("New York").await.expect("stub answers");

        assert_eq!(kelvin, 289.92);
        assert_eq!(
            request_line.await.expect("stub finishes"),
            "GET /data/2.5/weather?q=New+York&appid=KEY HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn rejected_key_is_a_status_error() {
        let (base_url, _request_line) =
            stub::serve_once(401, r#"{"cod":401,"message":"Invalid API key"}"#).await;
        let provider = OpenWeatherMapProvider::new("BAD".into())
            .with_client(stub::client())
            .with_base_url(base_url);

        let err = provider.temperature("Tokyo").await.unwrap_err();
        match err {
            WeatherError::Status { status, body, .. } => {
                assert_eq!(status, 401);
                assert!(body.contains("Invalid API key"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unusable_base_url_is_reported() {
        let provider = OpenWeatherMapProvider::new("KEY".into()).with_base_url("not a url");

        let err = provider.temperature("Tokyo").await.unwrap_err();
        assert!(matches!(err, WeatherError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        let provider = OpenWeatherMapProvider::new("KEY".into()).with_base_url("http://127.0.0.1:1");

        let err = provider.temperature("Tokyo").await.unwrap_err();
        assert!(matches!(err, WeatherError::Transport { .. }));
        assert_eq!(err.provider(), Some(NAME));
    }
}
