use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{CustomType, Password, PasswordDisplayMode};
use weather_core::{
    Config, ProviderId, aggregator_from_config,
    provider::forecastio::Coordinates,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Average temperature across several weather sources")]
pub struct Cli {
    /// Use this config file instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name: "openweathermap", "weatherunderground" or "forecastio".
        provider: String,
    },

    /// Print the average temperature (Kelvin) for a city as JSON.
    Show {
        /// City name, passed to every provider as-is.
        city: String,
    },

    /// List providers and whether they are configured.
    Providers,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config_path = match self.config {
            Some(path) => path,
            None => Config::config_file_path()?,
        };
        let mut config = Config::load_from(&config_path)?;

        match self.command {
            Command::Configure { provider } => {
                let id = ProviderId::try_from(provider.as_str())?;
                configure(&mut config, id)?;
                config.save_to(&config_path)?;
                println!("Saved {id} credentials to {}", config_path.display());
            }
            Command::Show { city } => {
                let aggregator = aggregator_from_config(&config)?;
                let report = aggregator.report(&city).await?;
                println!(
                    "{}",
                    serde_json::to_string(&report).context("Failed to encode report")?
                );
            }
            Command::Providers => {
                for id in ProviderId::all() {
                    let state = if config.is_provider_configured(*id) {
                        "configured"
                    } else {
                        "not configured"
                    };
                    println!("{id:<20}{state}");
                }
            }
        }

        Ok(())
    }
}

fn configure(config: &mut Config, id: ProviderId) -> anyhow::Result<()> {
    let api_key = Password::new(&format!("{id} API key:"))
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let api_key = api_key.trim();
    if api_key.is_empty() {
        anyhow::bail!("API key must not be empty");
    }
    config.upsert_provider_api_key(id, api_key.to_string());

    if id == ProviderId::ForecastIo {
        let current = config.provider_coordinates(id).unwrap_or_default();

        let latitude = CustomType::<f64>::new("Latitude:")
            .with_default(current.latitude)
            .with_error_message("Please enter a number")
            .prompt()
            .context("Failed to read latitude")?;
        let longitude = CustomType::<f64>::new("Longitude:")
            .with_default(current.longitude)
            .with_error_message("Please enter a number")
            .prompt()
            .context("Failed to read longitude")?;

        config.set_provider_coordinates(id, Coordinates { latitude, longitude })?;
    }

    Ok(())
}
