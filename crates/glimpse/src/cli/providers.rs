//! The `glimpse providers` command.

use glimpse_core::{Analyzer, AnalyzerRegistry, Config, ProviderId};

/// One line of the providers listing.
fn describe(provider: ProviderId, registry: &AnalyzerRegistry, default: ProviderId) -> String {
    let marker = if provider == default { "*" } else { " " };
    match registry.get(provider) {
        Some(analyzer) => format!(
            "{marker} {:<8} available    model {}",
            provider.as_str(),
            analyzer.model()
        ),
        None => format!(
            "{marker} {:<8} unavailable  set {}",
            provider.as_str(),
            provider.credential_env_var()
        ),
    }
}

/// Execute the providers command.
pub fn execute(config: &Config) -> anyhow::Result<()> {
    let registry = AnalyzerRegistry::from_config(config);
    for provider in ProviderId::ALL {
        println!(
            "{}",
            describe(provider, &registry, config.analysis.default_provider)
        );
    }
    if registry.is_empty() {
        tracing::warn!("No provider has an API key configured");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_available_and_missing() {
        let mut config = Config::default();
        config.providers.claude.api_key = String::new();
        config.providers.gemini.api_key = "gm-key".to_string();
        let registry = AnalyzerRegistry::from_config(&config);

        let claude = describe(ProviderId::Claude, &registry, ProviderId::Claude);
        assert!(claude.starts_with('*'));
        assert!(claude.contains("unavailable"));
        assert!(claude.contains("CLAUDE_API_KEY"));

        let gemini = describe(ProviderId::Gemini, &registry, ProviderId::Claude);
        assert!(gemini.contains("available"));
        assert!(gemini.contains("gemini-2.0-flash-exp"));
        assert!(!gemini.contains("gm-key"));
    }
}
