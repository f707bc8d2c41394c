//! Fan-out/fan-in over several temperature providers.
//!
//! A lookup spawns one task per provider and reads outcomes back from two
//! lookup-scoped channels, one for readings and one for failures. Both
//! channels have room for every provider's outcome, so a provider task never
//! waits on the aggregator, even after the aggregator has returned early.
//!
//! The first failure observed aborts the lookup (fail-fast). Providers still
//! in flight at that point are not cancelled; they run to completion and
//! their outcomes are dropped with the channels.

use std::{any::Any, sync::Arc, time::Instant};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::{error::WeatherError, model::TemperatureReport, provider::TemperatureProvider};

/// Averages the readings of a fixed set of providers.
#[derive(Debug, Clone, Default)]
pub struct MultiProvider {
    providers: Vec<Arc<dyn TemperatureProvider>>,
}

impl MultiProvider {
    pub fn new(providers: Vec<Arc<dyn TemperatureProvider>>) -> Self {
        Self { providers }
    }

    pub fn providers(&self) -> &[Arc<dyn TemperatureProvider>] {
        &self.providers
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Mean temperature in `city` across every provider, in Kelvin.
    ///
    /// All providers are queried concurrently. Any single failure is returned
    /// as-is without waiting for the remaining providers; with no providers
    /// the lookup fails with [`WeatherError::NoProviders`].
    pub async fn lookup(&self, city: &str) -> Result<f64, WeatherError> {
        let expected = self.providers.len();
        if expected == 0 {
            return Err(WeatherError::NoProviders);
        }

        let (temps_tx, mut temps) = mpsc::channel::<f64>(expected);
        let (errs_tx, mut errs) = mpsc::channel::<WeatherError>(expected);

        for provider in &self.providers {
            let provider = Arc::clone(provider);
            let city = city.to_owned();
            let temps_tx = temps_tx.clone();
            let errs_tx = errs_tx.clone();

            tokio::spawn(async move {
                let outcome = call_isolated(provider, city).await;

                // Capacity covers every provider, so `try_send` only fails
                // once the lookup has returned and dropped its receivers.
                let delivered = match outcome {
                    Ok(kelvin) => temps_tx.try_send(kelvin).is_ok(),
                    Err(err) => errs_tx.try_send(err).is_ok(),
                };
                if !delivered {
                    debug!("discarding outcome of abandoned lookup");
                }
            });
        }

        // Only the spawned tasks hold senders now; both channels close once
        // they have all finished.
        drop(temps_tx);
        drop(errs_tx);

        collect_mean(city, expected, &mut temps, &mut errs).await
    }

    /// Run [`lookup`](Self::lookup) and record how long it took.
    pub async fn report(&self, city: &str) -> Result<TemperatureReport, WeatherError> {
        let begin = Instant::now();
        let kelvin = self.lookup(city).await?;
        Ok(TemperatureReport::new(city, kelvin, begin.elapsed()))
    }
}

#[async_trait]
impl TemperatureProvider for MultiProvider {
    fn name(&self) -> &str {
        "aggregate"
    }

    async fn temperature(&self, city: &str) -> Result<f64, WeatherError> {
        self.lookup(city).await
    }
}

/// Wait for `expected` outcomes and average them, returning the first failure seen.
///
/// Both channels closing before `expected` outcomes arrive means some producer
/// was dropped without reporting, which only happens while the runtime is
/// shutting down; that ends the lookup with [`WeatherError::Abandoned`].
async fn collect_mean(
    city: &str,
    expected: usize,
    temps: &mut mpsc::Receiver<f64>,
    errs: &mut mpsc::Receiver<WeatherError>,
) -> Result<f64, WeatherError> {
    let mut sum = 0.0;
    for received in 0..expected {
        tokio::select! {
            Some(kelvin) = temps.recv() => sum += kelvin,
            Some(err) = errs.recv() => {
                debug!(city, error = %err, "aborting lookup on first failure");
                return Err(err);
            }
            else => return Err(WeatherError::Abandoned { expected, received }),
        }
    }

    Ok(sum / expected as f64)
}

/// Run one provider call in its own task so a panic surfaces as an error.
async fn call_isolated(
    provider: Arc<dyn TemperatureProvider>,
    city: String,
) -> Result<f64, WeatherError> {
    let name = provider.name().to_owned();

    match tokio::spawn(async move { provider.temperature(&city).await }).await {
        Ok(outcome) => outcome,
        Err(join_err) => {
            let message = if join_err.is_panic() {
                panic_message(join_err.into_panic())
            } else {
                join_err.to_string()
            };
            warn!(provider = %name, %message, "provider task did not complete");
            Err(WeatherError::Panicked {
                provider: name,
                message,
            })
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
