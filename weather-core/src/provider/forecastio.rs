use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::{error::WeatherError, model::celsius_to_kelvin};

use super::{
    TemperatureProvider,
    http::{endpoint, get_json},
    trace_outcome,
};

const NAME: &str = "forecastio";
const DEFAULT_BASE_URL: &str = "https://api.forecast.io";

/// Point on the globe the forecast.io API is queried for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for Coordinates {
    /// Tokyo.
    fn default() -> Self {
        Self {
            latitude: 35.6895,
            longitude: 139.6917,
        }
    }
}

/// forecast.io only answers for coordinates, so every city resolves to the
/// configured point.
// TODO: geocode the requested city instead of using fixed coordinates.
#[derive(Debug, Clone)]
pub struct ForecastIoProvider {
    api_key: String,
    coordinates: Coordinates,
    base_url: String,
    http: Client,
}

impl ForecastIoProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            coordinates: Coordinates::default(),
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

    pub fn with_coordinates(mut self, coordinates: Coordinates) -> Self {
        self.coordinates = coordinates;
        self
    }

    /// `{base}/forecast/{key}/{lat},{lon}`.
    fn forecast_url(&self) -> Result<Url, WeatherError> {
        let point = format!(
            "{:.6},{:.6}",
            self.coordinates.latitude, self.coordinates.longitude
        );
        endpoint(
            NAME,
            &self.base_url,
            ["forecast", self.api_key.as_str(), point.as_str()],
        )
    }

    async fn fetch(&self) -> Result<f64, WeatherError> {
        // SI units so `temperature` comes back in Celsius rather than Fahrenheit.
        let request = self.http.get(self.forecast_url()?).query(&[("units", "si")]);

        let parsed: FioResponse = get_json(NAME, request).await?;
        Ok(parsed.kelvin())
    }
}

#[derive(Debug, Deserialize)]
struct FioCurrently {
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct FioResponse {
    currently: FioCurrently,
}

impl FioResponse {
    fn kelvin(&self) -> f64 {
        celsius_to_kelvin(self.currently.temperature)
    }
}

#[async_trait]
impl TemperatureProvider for ForecastIoProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn temperature(&self, city: &str) -> Result<f64, WeatherError> {
        let outcome = self.fetch().await;
        trace_outcome(NAME, city, &outcome);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::http::{decode_body, stub};
    use reqwest::StatusCode;

    #[test]
    fn converts_celsius_to_kelvin() {
        let body = r#"{
            "latitude": 35.6895,
            "longitude": 139.6917,
            "timezone": "Asia/Tokyo",
            "currently": {"time": 1700000000, "summary": "Clear", "temperature": 26.85}
        }"#;
        let parsed: FioResponse = decode_body(NAME, StatusCode::OK, body).expect("decodes");
        assert!((parsed.kelvin() - 300.0).abs() < 1e-9);
    }

    #[test]
    fn forecast_url_uses_key_and_coordinates() {
        let provider = ForecastIoProvider::new("SECRET".into())
            .with_base_url("http://localhost:9000/")
            .with_coordinates(Coordinates {
                latitude: 51.5,
                longitude: -0.12,
            });

        assert_eq!(
            provider.forecast_url().expect("valid url").as_str(),
            "http://localhost:9000/forecast/SECRET/51.500000,-0.120000"
        );
    }

    #[test]
    fn api_key_is_percent_encoded() {
        let provider = ForecastIoProvider::new("a/b?c".into());
        let url = provider.forecast_url().expect("valid url");
        assert_eq!(url.path(), "/forecast/a%2Fb%3Fc/35.689500,139.691700");
        assert_eq!(url.query(), None);
    }

    #[tokio::test]
    async fn requests_si_units_for_tokyo_by_default() {
        let (base_url, request_line) =
            stub::serve_once(200, r#"{"currently": {"temperature": 26.85}}"#).await;
        let provider = ForecastIoProvider::new("K".into())
            .with_client(stub::client())
            .with_base_url(base_url);

        let kelvin = provider.temperature("Tokyo").await.expect("stub answers");

        assert!((kelvin - 300.0).abs() < 1e-9);
        assert_eq!(
            request_line.await.expect("stub finishes"),
            "GET /forecast/K/35.689500,139.691700?units=si HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn unusable_base_url_is_reported() {
        let provider = ForecastIoProvider::new("K".into()).with_base_url("not a url");

        let err = provider.temperature("Tokyo").await.unwrap_err();
        assert!(matches!(err, WeatherError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        let provider = ForecastIoProvider::new("KEY".into()).with_base_url("http://127.0.0.1:1");

        let err = provider.temperature("Tokyo").await.unwrap_err();
        assert!(matches!(err, WeatherError::Transport { .. }));
    }
}
