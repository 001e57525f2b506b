//! Gemini adapter using the Generative Language `generateContent` API.
//!
//! The key travels in the query string; the image is an `inline_data` part
//! next to the text prompt.

use super::{non_blank, parse_body, require_credential, send, AnalysisRequest, Analyzer};
use crate::codec::ImageCodec;
use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;
use crate::types::{AnalysisResult, ProviderId};
use async_trait::async_trait;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini provider using `models/<model>:generateContent`.
pub struct GeminiAnalyzer {
    config: AnalyzerConfig,
    codec: ImageCodec,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self {
            config,
            codec: ImageCodec::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client: super::http_client(None),
        }
    }

    /// Use a different image codec (max dimension, JPEG quality).
    pub fn with_codec(mut self, codec: ImageCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Point at a different API host, e.g. a local mock server.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Apply a per-request timeout instead of the transport default.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = super::http_client(Some(timeout));
        self
    }

    /// Endpoint without the key; the key is attached as a query parameter.
    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.config.model
        )
    }

    fn request_body<'a>(&self, request: &'a AnalysisRequest) -> GenerateRequest<'a> {
        GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: request.prompt,
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: request.image.media_type,
                            data: &request.image.data,
                        },
                    },
                ],
            }],
            generation_config: self
                .config
                .max_output_tokens
                .map(|max_output_tokens| GenerationConfig { max_output_tokens }),
        }
    }
}

// --- Request types ---

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    InlineData { inline_data: InlineData<'a> },
}

#[derive(Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

// --- Response types ---

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    // Absent when the candidate was blocked.
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

/// Pull the first text part of the first candidate out of a response body.
pub(crate) fn extract_text(body: &str) -> Result<String, AnalysisError> {
    let resp: GenerateResponse = parse_body(ProviderId::Gemini, body)?;
    let text = resp
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|content| content.parts.into_iter().find_map(|p| p.text));
    non_blank(ProviderId::Gemini, text, "candidates[0].content.parts[].text")
}

#[async_trait]
impl Analyzer for GeminiAnalyzer {
    fn provider(&self) -> ProviderId {
        ProviderId::Gemini
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn analyze(&self, image: &DynamicImage) -> Result<AnalysisResult, AnalysisError> {
        require_credential(ProviderId::Gemini, &self.config)?;

        let request = AnalysisRequest::describe(&self.codec, image)?;
        let body = self.request_body(&request);

        tracing::debug!(
            model = %self.config.model,
            width = request.image.width,
            height = request.image.height,
            "Sending image to Gemini"
        );
        let start = Instant::now();

        let http = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.config.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(&body);
        let text = extract_text(&send(ProviderId::Gemini, http).await?)?;

        tracing::debug!(
            "Gemini responded in {}ms ({} chars)",
            start.elapsed().as_millis(),
            text.len()
        );

        Ok(AnalysisResult::new(text, ProviderId::Gemini))
    }
}
