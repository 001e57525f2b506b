//! Configuration validation with range checks.

use crate::error::ConfigError;
use crate::types::ProviderId;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.image.max_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "image.max_dimension must be > 0".into(),
            ));
        }
        if !(1..=100).contains(&self.image.jpeg_quality) {
            return Err(ConfigError::ValidationError(
                "image.jpeg_quality must be between 1 and 100".into(),
            ));
        }
        if self.analysis.request_timeout_secs == Some(0) {
            return Err(ConfigError::ValidationError(
                "analysis.request_timeout_secs must be > 0 when set".into(),
            ));
        }
        for provider in ProviderId::ALL {
            let cfg = self.providers.get(provider);
            if cfg.model.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "providers.{}.model must not be empty",
                    provider.as_str()
                )));
            }
            if cfg.max_output_tokens == Some(0) {
                return Err(ConfigError::ValidationError(format!(
                    "providers.{}.max_output_tokens must be > 0 when set",
                    provider.as_str()
                )));
            }
        }
        Ok(())
    }
}
