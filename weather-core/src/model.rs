use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Offset between the Celsius and Kelvin scales.
pub const ZERO_CELSIUS_IN_KELVIN: f64 = 273.15;

pub fn celsius_to_kelvin(celsius: f64) -> f64 {
    celsius + ZERO_CELSIUS_IN_KELVIN
}

/// Result of one successful lookup, in the shape printed to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureReport {
    /// City exactly as it was requested.
    pub city: String,
    /// Mean temperature across all providers, in Kelvin.
    pub temp: f64,
    /// Wall-clock duration of the lookup, e.g. `"412.07ms"`.
    pub took: String,
}

impl TemperatureReport {
    pub fn new(city: impl Into<String>, kelvin: f64, took: Duration) -> Self {
        Self {
            city: city.into(),
            temp: kelvin,
            took: format!("{took:?}"),
        }
    }
}
