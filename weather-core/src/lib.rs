//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Adapters for individual weather sources, behind [`TemperatureProvider`]
//! - [`MultiProvider`], which queries every adapter concurrently and averages the readings
//! - Configuration & credentials handling
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;

pub use aggregate::MultiProvider;
pub use config::{Config, ProviderConfig};
pub use error::WeatherError;
pub use model::TemperatureReport;
pub use provider::{ProviderId, TemperatureProvider, aggregator_from_config};
