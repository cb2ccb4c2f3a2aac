use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode, Text};
use std::sync::Arc;
use weatherbot_core::{
    Config, InMemoryModeStore, InteractionRouter, KnownCitiesLedger, RouterOptions,
    console_report, provider_from_config,
};

use crate::chat;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherbot", version, about = "Current weather and 5-day forecast")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key.
    Configure,

    /// Print current weather and the 5-day forecast for a city.
    Show {
        /// City name. Prompted for when omitted.
        city: Option<String>,
    },

    /// Talk to the bot in the terminal, the way a chat client would.
    Chat {
        /// User id the terminal session speaks as.
        #[arg(long, default_value_t = 1)]
        user_id: u64,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load()?;

        match self.command {
            Command::Configure => {
                let api_key = Password::new("OpenWeather API key:")
                    .with_display_mode(PasswordDisplayMode::Masked)
                    .without_confirmation()
                    .prompt()
                    .context("Failed to read API key")?;

                config.set_api_key(api_key.trim().to_string());
                config.save()?;

                println!("Saved configuration to {}", Config::config_file_path()?.display());
            }
            Command::Show { city } => {
                let city = match city {
                    Some(city) => city,
                    None => Text::new("🌍 Enter city name:").prompt().context("Failed to read city name")?,
                };

                let provider = provider_from_config(&config)?;
                let blocks = console_report(provider.as_ref(), &city, Local::now().naive_local()).await;

                println!("{}", blocks.join("\n\n"));
            }
            Command::Chat { user_id } => {
                let provider = provider_from_config(&config)?;
                let ledger = KnownCitiesLedger::new(config.ledger_path()?);
                tracing::info!(path = %ledger.path().display(), "recording queried cities");

                let router = InteractionRouter::new(provider, Arc::new(InMemoryModeStore::new()))
                    .with_ledger(ledger)
                    .with_options(RouterOptions { serialize_per_user: config.serialize_per_user });

                chat::run(&router, user_id).await?;
            }
        }

        Ok(())
    }
}
