//! `glimpse config`: inspect and create the config file.
//!
//! Keys are secrets. Anything printed here goes through
//! [`Config::redacted`], so literal keys are masked and `${VAR}`
//! references are shown as written.

use anyhow::Context;
use clap::{Args, Subcommand};
use glimpse_core::{Config, ProviderId};
use std::path::Path;

/// Arguments for the `config` command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration with literal keys masked
    Show,

    /// Print the config file location
    Path,

    /// Write a default config file that reads keys from the environment
    Init {
        /// Replace an existing config file
        #[arg(long)]
        force: bool,
    },
}

pub async fn execute(args: ConfigArgs, config: &Config) -> anyhow::Result<()> {
    let path = Config::default_path();
    match args.command {
        ConfigCommand::Show => print!("{}", render(config, &path)?),
        ConfigCommand::Path => println!("{}", path.display()),
        ConfigCommand::Init { force } => {
            init(&path, force).await?;
            println!("Configuration initialized at: {}", path.display());
        }
    }
    Ok(())
}

/// Effective config as TOML, headed by its source and each provider's key status.
fn render(config: &Config, path: &Path) -> anyhow::Result<String> {
    let mut out = if path.exists() {
        format!("# Config file: {}\n", path.display())
    } else {
        format!("# Config file: {} (not found, defaults shown)\n", path.display())
    };
    for provider in ProviderId::ALL {
        let status = match config.providers.get(provider).resolve() {
            Some(_) => "key resolved".to_string(),
            None => format!("no key (set {})", provider.credential_env_var()),
        };
        out.push_str(&format!("# {}: {status}\n", provider.as_str()));
    }
    out.push('\n');
    out.push_str(&config.redacted().to_toml()?);
    Ok(out)
}

/// Write the default config to `path`, refusing to clobber unless `force`.
async fn init(path: &Path, force: bool) -> anyhow::Result<()> {
    if !force && tokio::fs::try_exists(path).await? {
        anyhow::bail!(
            "Config file already exists at: {}\nUse --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    tokio::fs::write(path, Config::default().to_toml()?)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::info!("Config file created at: {}", path.display());
    Ok(())
}
