//! The `glimpse analyze` command: describe one image.

use anyhow::Context;
use clap::Args;
use glimpse_core::{AnalysisCoordinator, AnalysisResult, Config, CoordinatorState, ProviderId};
use image::DynamicImage;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tokio::sync::watch;

/// Arguments for the `analyze` command.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Image file to describe
    pub image: PathBuf,

    /// Provider to use (claude, gemini); defaults to `analysis.default_provider`
    #[arg(short, long)]
    pub provider: Option<ProviderId>,

    /// Print the result as JSON instead of plain text
    #[arg(long)]
    pub json: bool,
}

/// JSON shape printed with `--json`.
#[derive(Serialize)]
struct AnalysisOutput<'a> {
    provider: ProviderId,
    text: &'a str,
    /// Seconds since the Unix epoch
    timestamp: f64,
}

impl<'a> From<&'a AnalysisResult> for AnalysisOutput<'a> {
    fn from(result: &'a AnalysisResult) -> Self {
        Self {
            provider: result.provider,
            text: &result.text,
            timestamp: result
                .timestamp
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs_f64())
                .unwrap_or_default(),
        }
    }
}

/// Execute the analyze command.
pub async fn execute(args: AnalyzeArgs, config: &Config) -> anyhow::Result<()> {
    let coordinator = AnalysisCoordinator::from_config(config);
    if let Some(provider) = args.provider {
        coordinator.select_provider(provider);
    }
    if !coordinator.has_any_provider() {
        tracing::warn!("Add a key with `glimpse config init` or set it in the environment");
    }

    let image = load_image(&args.image).await?;

    let renderer = tokio::spawn(render_state(coordinator.subscribe()));
    let outcome = coordinator.analyze(&image).await;
    // Dropping the coordinator closes the state channel and ends the renderer.
    drop(coordinator);
    if let Err(e) = renderer.await {
        tracing::debug!("State renderer ended abnormally: {e}");
    }

    let result = outcome?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&AnalysisOutput::from(&result))?);
    } else {
        println!("{}", result.text);
    }

    Ok(())
}

/// Decode an image file off the async runtime.
async fn load_image(path: &Path) -> anyhow::Result<DynamicImage> {
    let expanded = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned());
    let shown = expanded.display().to_string();

    let image = tokio::task::spawn_blocking(move || image::open(&expanded))
        .await
        .context("image decoding task failed")?
        .with_context(|| format!("Failed to decode image {shown}"))?;

    tracing::debug!("Loaded {shown} ({}x{})", image.width(), image.height());
    Ok(image)
}

/// Log each published coordinator transition until the coordinator is dropped.
async fn render_state(mut rx: watch::Receiver<CoordinatorState>) {
    while rx.changed().await.is_ok() {
        let state = rx.borrow_and_update().clone();
        if state.is_analyzing {
            tracing::info!("Analyzing with {}...", state.selected_provider);
        } else if let Some(error) = &state.last_error {
            tracing::debug!(kind = ?error.kind, "Analysis failed: {}", error.message);
        } else if let Some(result) = &state.last_result {
            tracing::debug!("Description received from {}", result.provider);
        }
    }
}
