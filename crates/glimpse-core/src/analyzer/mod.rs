//! Provider adapters for image description.
//!
//! Every vendor adapter implements [`Analyzer`]; the [`AnalyzerRegistry`]
//! maps each configured [`ProviderId`] to its adapter so the coordinator
//! can treat providers uniformly.

pub(crate) mod claude;
pub(crate) mod gemini;
pub(crate) mod registry;

pub use claude::ClaudeAnalyzer;
pub use gemini::GeminiAnalyzer;
pub use registry::AnalyzerRegistry;

use crate::codec::{EncodedImage, ImageCodec};
use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;
use crate::types::{AnalysisResult, ProviderId};
use async_trait::async_trait;
use image::DynamicImage;
use std::time::Duration;

/// Instruction sent alongside every image.
pub const DESCRIBE_PROMPT: &str = "Describe what you see in this image captured from \
     smart glasses. Be concise and focus on the most important elements.";

/// Trait that all provider adapters implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (the registry stores `Arc<dyn Analyzer>`).
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Which provider this adapter talks to.
    fn provider(&self) -> ProviderId;

    /// Model identifier sent with each request.
    fn model(&self) -> &str;

    /// Describe a decoded bitmap.
    async fn analyze(&self, image: &DynamicImage) -> Result<AnalysisResult, AnalysisError>;
}

/// The normalized request every adapter translates into its wire format.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub image: EncodedImage,
    pub prompt: &'static str,
}

impl AnalysisRequest {
    /// Prepare a bitmap with the fixed description prompt.
    pub fn describe(codec: &ImageCodec, image: &DynamicImage) -> Result<Self, AnalysisError> {
        Ok(Self {
            image: codec.encode(image)?,
            prompt: DESCRIBE_PROMPT,
        })
    }
}

/// Build the shared HTTP client for an adapter.
pub(crate) fn http_client(timeout: Option<Duration>) -> reqwest::Client {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().unwrap_or_else(|e| {
        tracing::warn!("Failed to build configured HTTP client ({e}), using defaults");
        reqwest::Client::new()
    })
}

/// Fail fast when the adapter was built without a key.
pub(crate) fn require_credential(
    provider: ProviderId,
    config: &AnalyzerConfig,
) -> Result<(), AnalysisError> {
    if config.has_credential() {
        Ok(())
    } else {
        Err(AnalysisError::MissingCredential(provider))
    }
}

/// Send a prepared request and return the body of a 2xx response.
///
/// Transport failures map to [`AnalysisError::Network`], any other status
/// to [`AnalysisError::Api`] with the raw body kept for diagnostics.
pub(crate) async fn send(
    provider: ProviderId,
    request: reqwest::RequestBuilder,
) -> Result<String, AnalysisError> {
    let resp = request.send().await.map_err(transport_error)?;

    let status = resp.status();
    let body = resp.text().await.map_err(transport_error)?;
    if !status.is_success() {
        tracing::warn!("{provider} returned HTTP {}", status.as_u16());
        return Err(AnalysisError::Api {
            status: status.as_u16(),
            body,
        });
    }

    Ok(body)
}

/// Strip the request URL: some providers carry the key in the query string.
fn transport_error(error: reqwest::Error) -> AnalysisError {
    AnalysisError::Network(error.without_url())
}

/// Deserialize a provider body, mapping any shape mismatch to
/// [`AnalysisError::InvalidResponse`].
pub(crate) fn parse_body<T: serde::de::DeserializeOwned>(
    provider: ProviderId,
    body: &str,
) -> Result<T, AnalysisError> {
    serde_json::from_str(body).map_err(|e| {
        AnalysisError::InvalidResponse(format!("unexpected {provider} response shape: {e}"))
    })
}

/// Reject absent or blank text.
pub(crate) fn non_blank(
    provider: ProviderId,
    text: Option<String>,
    path: &str,
) -> Result<String, AnalysisError> {
    match text {
        Some(text) if !text.trim().is_empty() => Ok(text),
        Some(_) => Err(AnalysisError::InvalidResponse(format!(
            "{provider} returned blank text at {path}"
        ))),
        None => Err(AnalysisError::InvalidResponse(format!(
            "{provider} response has no text at {path}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_request_uses_fixed_prompt() {
        let request =
            AnalysisRequest::describe(&ImageCodec::default(), &DynamicImage::new_rgb8(8, 8))
                .unwrap();
        assert!(request.prompt.starts_with("Describe what you see"));
        assert!(request.prompt.contains("captured from smart glasses"));
        assert_eq!(request.image.media_type, "image/jpeg");
    }

    #[test]
    fn test_require_credential() {
        let ok = AnalyzerConfig::new("key", "model");
        assert!(require_credential(ProviderId::Claude, &ok).is_ok());

        let empty = AnalyzerConfig::new("", "model");
        let err = require_credential(ProviderId::Claude, &empty).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingCredential(ProviderId::Claude)));
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(
            non_blank(ProviderId::Gemini, Some("hi".into()), "x").unwrap(),
            "hi"
        );
        assert!(matches!(
            non_blank(ProviderId::Gemini, Some("  ".into()), "x"),
            Err(AnalysisError::InvalidResponse(_))
        ));
        assert!(matches!(
            non_blank(ProviderId::Gemini, None, "x"),
            Err(AnalysisError::InvalidResponse(_))
        ));
    }
}
