//! Glimpse CLI - describe photos with cloud AI vision providers.
//!
//! Glimpse decodes an image, sends it to the selected provider (Claude or
//! Gemini) and prints the natural-language description.
//!
//! # Usage
//!
//! ```bash
//! # Describe a photo with the default provider
//! glimpse analyze photo.jpg
//!
//! # Use a specific provider and print JSON
//! glimpse analyze photo.jpg --provider gemini --json
//!
//! # Show which providers have keys
//! glimpse providers
//!
//! # View configuration
//! glimpse config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Glimpse - describe photos with cloud AI vision providers.
#[derive(Parser, Debug)]
#[command(name = "glimpse")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Describe an image with the selected AI provider
    Analyze(cli::analyze::AnalyzeArgs),

    /// List providers and whether a key is configured
    Providers,

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so use eprintln for config warnings.
    let config = match glimpse_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `glimpse config path`."
            );
            glimpse_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Glimpse v{}", glimpse_core::VERSION);

    match cli.command {
        Commands::Analyze(args) => cli::analyze::execute(args, &config).await,
        Commands::Providers => cli::providers::execute(&config),
        Commands::Config(args) => cli::config::execute(args, &config).await,
    }
}
