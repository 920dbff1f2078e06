// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Palaver - a WhatsApp webhook bridge to a stateful conversational pipeline.
//!
//! This is the binary entry point for the Palaver server.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use palaver_config::{ConfigError, PalaverConfig};

mod serve;

/// Palaver - a WhatsApp webhook bridge to a stateful conversational pipeline.
#[derive(Parser, Debug)]
#[command(name = "palaver", version, about, long_about = None)]
struct Cli {
    /// Explicit config file path, bypassing the XDG hierarchy.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the webhook bridge server.
    Serve,
    /// Print the resolved configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            palaver_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.server.log_level);

    let result = match cli.command {
        Some(Commands::Config) => print_config(&config),
        Some(Commands::Serve) | None => serve::run(config).await,
    };

    if let Err(err) = result {
        tracing::error!(error = %err, "palaver exited with an error");
        std::process::exit(1);
    }
}

/// Load configuration from the explicit path or the XDG hierarchy.
fn load(path: Option<&Path>) -> Result<PalaverConfig, Vec<ConfigError>> {
    match path {
        Some(path) => match palaver_config::load_config_from_path(path) {
            Ok(config) => {
                palaver_config::validation::validate_config(&config)?;
                Ok(config)
            }
            Err(err) => Err(palaver_config::diagnostic::figment_to_config_errors(err)),
        },
        None => palaver_config::load_and_validate(),
    }
}

fn print_config(config: &PalaverConfig) -> Result<(), palaver_core::PalaverError> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| palaver_core::PalaverError::Config(format!("failed to render config: {e}")))?;
    println!("{rendered}");
    Ok(())
}

fn init_tracing(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn binary_loads_config_defaults() {
        let config = load(None).expect("default config should be valid");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn resolved_config_renders_as_toml() {
        let config = PalaverConfig::default();
        assert!(print_config(&config).is_ok());
    }
}
