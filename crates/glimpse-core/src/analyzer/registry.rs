//! Registry mapping each configured provider to its adapter.

use super::{Analyzer, ClaudeAnalyzer, GeminiAnalyzer};
use crate::codec::ImageCodec;
use crate::config::{AnalyzerConfig, Config};
use crate::types::ProviderId;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

/// Adapters keyed by provider, built once at startup.
///
/// Only providers with a usable credential are registered.
#[derive(Clone, Default)]
pub struct AnalyzerRegistry {
    analyzers: BTreeMap<ProviderId, Arc<dyn Analyzer>>,
}

impl AnalyzerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build adapters for every provider whose key resolves to a non-empty value.
    ///
    /// No network calls are made here.
    pub fn from_config(config: &Config) -> Self {
        let codec = ImageCodec::new(&config.image);
        let timeout = config.analysis.request_timeout_secs.map(Duration::from_secs);

        let mut registry = Self::new();
        for provider in ProviderId::ALL {
            match config.providers.get(provider).resolve() {
                Some(analyzer_config) => {
                    tracing::debug!(
                        "{provider} configured with model {}",
                        analyzer_config.model
                    );
                    registry.insert(build(provider, analyzer_config, codec.clone(), timeout));
                }
                None => tracing::debug!(
                    "{provider} unavailable: {} not set",
                    provider.credential_env_var()
                ),
            }
        }
        registry
    }

    /// Register an adapter under its own provider id, replacing any previous one.
    ///
    /// Adapters are expected to carry a credential; registering one is what
    /// makes its provider available.
    pub fn insert(&mut self, analyzer: Arc<dyn Analyzer>) {
        self.analyzers.insert(analyzer.provider(), analyzer);
    }

    pub fn with(mut self, analyzer: Arc<dyn Analyzer>) -> Self {
        self.insert(analyzer);
        self
    }

    pub fn get(&self, provider: ProviderId) -> Option<Arc<dyn Analyzer>> {
        self.analyzers.get(&provider).cloned()
    }

    /// Providers with a registered adapter.
    pub fn providers(&self) -> BTreeSet<ProviderId> {
        self.analyzers.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.analyzers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.analyzers.len()
    }
}

impl std::fmt::Debug for AnalyzerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.analyzers.iter().map(|(id, a)| (id, a.model())))
            .finish()
    }
}

fn build(
    provider: ProviderId,
    config: AnalyzerConfig,
    codec: ImageCodec,
    timeout: Option<Duration>,
) -> Arc<dyn Analyzer> {
    match provider {
        ProviderId::Claude => {
            let mut analyzer = ClaudeAnalyzer::new(config).with_codec(codec);
            if let Some(timeout) = timeout {
                analyzer = analyzer.with_timeout(timeout);
            }
            Arc::new(analyzer)
        }
        ProviderId::Gemini => {
            let mut analyzer = GeminiAnalyzer::new(config).with_codec(codec);
            if let Some(timeout) = timeout {
                analyzer = analyzer.with_timeout(timeout);
            }
            Arc::new(analyzer)
        }
    }
}
