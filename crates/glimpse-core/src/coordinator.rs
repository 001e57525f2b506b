//! Analysis coordinator: provider selection, request lifecycle and the
//! published state a presentation layer renders.
//!
//! All state lives in a single [`watch`] channel. Every transition is one
//! `send_*` call, so a subscriber never observes a half-applied update.
//! Each `analyze` call takes a new generation; only the newest generation
//! may publish its outcome, so a slow superseded response cannot overwrite
//! a newer one.

use crate::analyzer::{Analyzer, AnalyzerRegistry};
use crate::config::Config;
use crate::error::{AnalysisError, ErrorInfo};
use crate::types::{AnalysisResult, ProviderId};
use image::DynamicImage;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

/// Snapshot of everything the presentation layer renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinatorState {
    /// An analysis is in flight
    pub is_analyzing: bool,

    /// Outcome of the last successful analysis
    pub last_result: Option<AnalysisResult>,

    /// Outcome of the last failed analysis
    pub last_error: Option<ErrorInfo>,

    /// Provider the next `analyze` call will use
    pub selected_provider: ProviderId,

    /// Providers with a configured key, fixed at construction
    pub available_providers: BTreeSet<ProviderId>,
}

impl CoordinatorState {
    pub fn has_any_provider(&self) -> bool {
        !self.available_providers.is_empty()
    }
}

/// Single entry point for analysing images with the selected provider.
pub struct AnalysisCoordinator {
    registry: AnalyzerRegistry,
    state: watch::Sender<CoordinatorState>,
    generation: AtomicU64,
}

impl AnalysisCoordinator {
    /// Create a coordinator over the given adapters.
    ///
    /// `preferred` is selected when available; otherwise the first available
    /// provider is. With no providers at all, `preferred` is kept as an
    /// advisory selection and every `analyze` call fails fast.
    pub fn new(registry: AnalyzerRegistry, preferred: ProviderId) -> Self {
        let available_providers = registry.providers();
        let selected_provider = if available_providers.contains(&preferred) {
            preferred
        } else {
            available_providers.first().copied().unwrap_or(preferred)
        };

        if available_providers.is_empty() {
            tracing::warn!(
                "No AI provider configured. Set {} or {}.",
                ProviderId::Claude.credential_env_var(),
                ProviderId::Gemini.credential_env_var()
            );
        } else if selected_provider != preferred {
            tracing::info!("{preferred} unavailable, selecting {selected_provider}");
        }

        let (state, _) = watch::channel(CoordinatorState {
            is_analyzing: false,
            last_result: None,
            last_error: None,
            selected_provider,
            available_providers,
        });

        Self {
            registry,
            state,
            generation: AtomicU64::new(0),
        }
    }

    /// Build the registry from config and start with the configured default provider.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            AnalyzerRegistry::from_config(config),
            config.analysis.default_provider,
        )
    }

    /// Receive every state transition.
    pub fn subscribe(&self) -> watch::Receiver<CoordinatorState> {
        self.state.subscribe()
    }

    /// Current state snapshot.
    pub fn state(&self) -> CoordinatorState {
        self.state.borrow().clone()
    }

    pub fn is_analyzing(&self) -> bool {
        self.state.borrow().is_analyzing
    }

    pub fn selected_provider(&self) -> ProviderId {
        self.state.borrow().selected_provider
    }

    pub fn available_providers(&self) -> BTreeSet<ProviderId> {
        self.state.borrow().available_providers.clone()
    }

    pub fn has_any_provider(&self) -> bool {
        self.state.borrow().has_any_provider()
    }

    /// Record the provider for subsequent calls.
    ///
    /// Unavailable providers are accepted; `analyze` then fails with
    /// [`AnalysisError::MissingCredential`].
    pub fn select_provider(&self, provider: ProviderId) {
        self.state.send_if_modified(|s| {
            if s.selected_provider == provider {
                return false;
            }
            s.selected_provider = provider;
            true
        });
    }

    pub fn clear_result(&self) {
        self.state.send_if_modified(|s| s.last_result.take().is_some());
    }

    pub fn dismiss_error(&self) {
        self.state.send_if_modified(|s| s.last_error.take().is_some());
    }

    /// Describe an image with the selected provider.
    ///
    /// The adapter's outcome is always returned. It is published to
    /// subscribers only if no newer call started in the meantime.
    pub async fn analyze(&self, image: &DynamicImage) -> Result<AnalysisResult, AnalysisError> {
        let provider = self.selected_provider();
        let Some(analyzer) = self.registry.get(provider) else {
            let err = AnalysisError::MissingCredential(provider);
            tracing::warn!("{err}");
            self.state.send_modify(|s| s.last_error = Some(ErrorInfo::from(&err)));
            return Err(err);
        };

        let in_flight = self.begin();
        tracing::info!(
            "Analyzing {}x{} image with {provider} (request {})",
            image.width(),
            image.height(),
            in_flight.generation
        );

        let outcome = analyzer.analyze(image).await;
        match &outcome {
            Ok(result) => tracing::info!("{provider} analysis complete ({} chars)", result.text.len()),
            Err(e) => tracing::warn!("{provider} analysis failed: {e}"),
        }

        in_flight.settle(&outcome);
        outcome
    }

    /// Start a new generation: mark in flight and clear both outcomes.
    fn begin(&self) -> InFlight<'_> {
        let mut generation = 0;
        self.state.send_modify(|s| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            s.is_analyzing = true;
            s.last_result = None;
            s.last_error = None;
        });
        InFlight {
            coordinator: self,
            generation,
            settled: false,
        }
    }

    /// Apply the end of a generation if it is still the newest one.
    ///
    /// `None` means the call was abandoned before the adapter returned.
    fn finish(
        &self,
        generation: u64,
        outcome: Option<&Result<AnalysisResult, AnalysisError>>,
    ) -> bool {
        self.state.send_if_modified(|s| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            s.is_analyzing = false;
            match outcome {
                Some(Ok(result)) => {
                    s.last_result = Some(result.clone());
                    s.last_error = None;
                }
                Some(Err(e)) => {
                    s.last_result = None;
                    s.last_error = Some(ErrorInfo::from(e));
                }
                None => {}
            }
            true
        })
    }
}

impl std::fmt::Debug for AnalysisCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisCoordinator")
            .field("registry", &self.registry)
            .field("state", &*self.state.borrow())
            .finish()
    }
}

/// Marks one generation in flight; resets `is_analyzing` if dropped unsettled.
struct InFlight<'a> {
    coordinator: &'a AnalysisCoordinator,
    generation: u64,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(mut self, outcome: &Result<AnalysisResult, AnalysisError>) {
        self.settled = true;
        if !self.coordinator.finish(self.generation, Some(outcome)) {
            tracing::debug!(
                "Discarding stale outcome of request {} (superseded)",
                self.generation
            );
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled && self.coordinator.finish(self.generation, None) {
            tracing::debug!("Request {} abandoned before completion", self.generation);
        }
    }
}
