//! Core data types shared by the adapters and the coordinator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

/// A cloud AI vision provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Claude,
    Gemini,
}

impl ProviderId {
    /// Every known provider, in display order.
    pub const ALL: [ProviderId; 2] = [ProviderId::Claude, ProviderId::Gemini];

    /// Lowercase identifier used in config files and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::Gemini => "gemini",
        }
    }

    /// Human-facing provider name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Claude => "Claude",
            Self::Gemini => "Gemini",
        }
    }

    /// Environment variable that conventionally holds this provider's key.
    pub fn credential_env_var(&self) -> &'static str {
        match self {
            Self::Claude => "CLAUDE_API_KEY",
            Self::Gemini => "GEMINI_API_KEY",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "claude" | "anthropic" => Ok(Self::Claude),
            "gemini" | "google" => Ok(Self::Gemini),
            other => Err(format!(
                "Unknown provider '{other}' (expected one of: claude, gemini)"
            )),
        }
    }
}

/// A successful description of one image.
///
/// Created only from a successful adapter response and never mutated;
/// each new analysis replaces the previous result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Description text as returned by the provider
    pub text: String,

    /// Provider that produced the description
    pub provider: ProviderId,

    /// When the response was parsed
    pub timestamp: SystemTime,
}

impl AnalysisResult {
    pub fn new(text: impl Into<String>, provider: ProviderId) -> Self {
        Self {
            text: text.into(),
            provider,
            timestamp: SystemTime::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_id_parse() {
        assert_eq!("claude".parse::<ProviderId>(), Ok(ProviderId::Claude));
        assert_eq!("Gemini".parse::<ProviderId>(), Ok(ProviderId::Gemini));
        assert!("openai".parse::<ProviderId>().is_err());
    }

    #[test]
    fn test_provider_id_serde_lowercase() {
        let json = serde_json::to_string(&ProviderId::Gemini).unwrap();
        assert_eq!(json, "\"gemini\"");
        let parsed: ProviderId = serde_json::from_str("\"claude\"").unwrap();
        assert_eq!(parsed, ProviderId::Claude);
    }

    #[test]
    fn test_provider_id_credential_vars() {
        assert_eq!(ProviderId::Claude.credential_env_var(), "CLAUDE_API_KEY");
        assert_eq!(ProviderId::Gemini.credential_env_var(), "GEMINI_API_KEY");
    }

    #[test]
    fn test_analysis_result_timestamped_now() {
        let before = SystemTime::now();
        let result = AnalysisResult::new("A cat on a sofa.", ProviderId::Claude);
        let after = SystemTime::now();
        assert!(result.timestamp >= before && result.timestamp <= after);
        assert_eq!(result.provider, ProviderId::Claude);
    }
}
