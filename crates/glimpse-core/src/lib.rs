//! Glimpse Core - describe photos with interchangeable cloud AI vision providers.
//!
//! A captured bitmap goes through one coordinator, which routes it to the
//! selected provider adapter and publishes the request lifecycle for a UI:
//!
//! ```text
//! UI → AnalysisCoordinator::analyze → Analyzer (Claude | Gemini) → HTTP → AnalysisResult → state
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use glimpse_core::{AnalysisCoordinator, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load()?;
//!     let coordinator = AnalysisCoordinator::from_config(&config);
//!
//!     let image = image::open("photo.jpg").expect("decodable image");
//!     let result = coordinator.analyze(&image).await?;
//!     println!("{}: {}", result.provider, result.text);
//!     Ok(())
//! }
//! ```

pub mod analyzer;
pub mod codec;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod types;

pub use analyzer::{Analyzer, AnalyzerRegistry, ClaudeAnalyzer, GeminiAnalyzer, DESCRIBE_PROMPT};
pub use codec::{EncodedImage, ImageCodec};
pub use config::{AnalyzerConfig, Config};
pub use coordinator::{AnalysisCoordinator, CoordinatorState};
pub use error::{AnalysisError, ConfigError, ErrorInfo, ErrorKind};
pub use types::{AnalysisResult, ProviderId};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_coordinator_from_default_config_makes_no_calls() {
        let mut config = Config::default();
        config.providers.claude.api_key = String::new();
        config.providers.gemini.api_key = "gm-key".to_string();
        let coordinator = AnalysisCoordinator::from_config(&config);
        assert_eq!(coordinator.selected_provider(), ProviderId::Gemini);
        assert!(!coordinator.is_analyzing());
    }
}
