//! Sub-configuration structs with their defaults.

use crate::types::ProviderId;
use serde::{Deserialize, Serialize};

/// Coordinator behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Provider selected at startup when it has a key
    pub default_provider: ProviderId,

    /// Per-request HTTP timeout. Unset means the transport default applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_provider: ProviderId::Claude,
            request_timeout_secs: None,
        }
    }
}

/// Image preparation before upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Longest edge after downscaling, in pixels
    pub max_dimension: u32,

    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_dimension: 1024,
            jpeg_quality: 80,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Per-provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub claude: ProviderConfig,
    pub gemini: ProviderConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            claude: ProviderConfig::default_for(ProviderId::Claude),
            gemini: ProviderConfig::default_for(ProviderId::Gemini),
        }
    }
}

impl ProvidersConfig {
    /// Settings for a single provider.
    pub fn get(&self, provider: ProviderId) -> &ProviderConfig {
        match provider {
            ProviderId::Claude => &self.claude,
            ProviderId::Gemini => &self.gemini,
        }
    }
}

/// Placeholder shown instead of a literal key.
pub const REDACTED_KEY: &str = "<set>";

/// Settings for one provider as written in the config file.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model name
    pub model: String,

    /// Output token cap sent with each request, if the provider takes one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl ProviderConfig {
    /// Defaults for the given provider.
    pub fn default_for(provider: ProviderId) -> Self {
        match provider {
            ProviderId::Claude => Self {
                api_key: format!("${{{}}}", provider.credential_env_var()),
                model: "claude-3-5-sonnet-20241022".to_string(),
                max_output_tokens: Some(1024),
            },
            ProviderId::Gemini => Self {
                api_key: format!("${{{}}}", provider.credential_env_var()),
                model: "gemini-2.0-flash-exp".to_string(),
                max_output_tokens: None,
            },
        }
    }

    /// Resolve the key into an adapter config.
    ///
    /// Returns `None` when the key is empty or names an unset variable,
    /// i.e. the provider is unconfigured.
    pub fn resolve(&self) -> Option<AnalyzerConfig> {
        let api_key = resolve_env_var(&self.api_key)?;
        if api_key.trim().is_empty() {
            return None;
        }
        Some(AnalyzerConfig {
            api_key,
            model: self.model.clone(),
            max_output_tokens: self.max_output_tokens,
        })
    }

    /// `${VAR}` references are kept; a literal key becomes [`REDACTED_KEY`].
    pub fn redacted(&self) -> Self {
        let api_key = if is_env_reference(&self.api_key) || self.api_key.is_empty() {
            self.api_key.clone()
        } else {
            REDACTED_KEY.to_string()
        };
        Self {
            api_key,
            ..self.clone()
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &self.redacted().api_key)
            .field("model", &self.model)
            .field("max_output_tokens", &self.max_output_tokens)
            .finish()
    }
}

/// Resolved, immutable configuration handed to an adapter.
#[derive(Clone, PartialEq, Eq)]
pub struct AnalyzerConfig {
    pub api_key: String,
    pub model: String,
    pub max_output_tokens: Option<u32>,
}

impl AnalyzerConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            max_output_tokens: None,
        }
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    /// True when the adapter has a usable credential.
    pub fn has_credential(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

// Keys never end up in logs.
impl std::fmt::Debug for AnalyzerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyzerConfig")
            .field("api_key", &if self.has_credential() { REDACTED_KEY } else { "<empty>" })
            .field("model", &self.model)
            .field("max_output_tokens", &self.max_output_tokens)
            .finish()
    }
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if is_env_reference(value) {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok()
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn is_env_reference(value: &str) -> bool {
    value.starts_with("${") && value.ends_with('}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_env_var() {
        assert_eq!(resolve_env_var("plain-key"), Some("plain-key".to_string()));
        assert_eq!(resolve_env_var(""), None);
        assert_eq!(resolve_env_var("${DEFINITELY_NOT_SET_GLIMPSE_123}"), None);
    }

    #[test]
    fn test_provider_config_resolve_literal_key() {
        let cfg = ProviderConfig {
            api_key: "sk-test".to_string(),
            model: "claude-test".to_string(),
            max_output_tokens: Some(256),
        };
        let resolved = cfg.resolve().unwrap();
        assert_eq!(resolved.api_key, "sk-test");
        assert_eq!(resolved.model, "claude-test");
        assert_eq!(resolved.max_output_tokens, Some(256));
    }

    #[test]
    fn test_provider_config_blank_key_is_unconfigured() {
        let mut cfg = ProviderConfig::default_for(ProviderId::Gemini);
        cfg.api_key = "   ".to_string();
        assert!(cfg.resolve().is_none());
        cfg.api_key = "${DEFINITELY_NOT_SET_GLIMPSE_456}".to_string();
        assert!(cfg.resolve().is_none());
    }

    #[test]
    fn test_provider_defaults() {
        let claude = ProviderConfig::default_for(ProviderId::Claude);
        assert_eq!(claude.api_key, "${CLAUDE_API_KEY}");
        assert_eq!(claude.max_output_tokens, Some(1024));

        let gemini = ProviderConfig::default_for(ProviderId::Gemini);
        assert_eq!(gemini.api_key, "${GEMINI_API_KEY}");
        assert_eq!(gemini.model, "gemini-2.0-flash-exp");
        assert!(gemini.max_output_tokens.is_none());
    }

    #[test]
    fn test_analyzer_config_debug_hides_key() {
        let cfg = AnalyzerConfig::new("sk-secret", "m");
        let debug = format!("{cfg:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<set>"));
    }

    #[test]
    fn test_provider_config_redacted() {
        let mut cfg = ProviderConfig::default_for(ProviderId::Claude);
        assert_eq!(cfg.redacted().api_key, "${CLAUDE_API_KEY}");

        cfg.api_key = "sk-ant-literal".to_string();
        let redacted = cfg.redacted();
        assert_eq!(redacted.api_key, REDACTED_KEY);
        assert_eq!(redacted.model, cfg.model);
        assert!(!format!("{cfg:?}").contains("sk-ant-literal"));

        cfg.api_key = String::new();
        assert_eq!(cfg.redacted().api_key, "");
    }
}
