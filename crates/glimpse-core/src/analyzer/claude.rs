//! Claude adapter using the Anthropic Messages API.
//!
//! Sends the image as a base64 content block followed by the text prompt.

use super::{non_blank, parse_body, require_credential, send, AnalysisRequest, Analyzer};
use crate::codec::ImageCodec;
use crate::config::AnalyzerConfig;
use crate::error::AnalysisError;
use crate::types::{AnalysisResult, ProviderId};
use async_trait::async_trait;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Claude provider using the Messages API.
pub struct ClaudeAnalyzer {
    config: AnalyzerConfig,
    codec: ImageCodec,
    endpoint: String,
    client: reqwest::Client,
}

impl ClaudeAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self {
            config,
            codec: ImageCodec::default(),
            endpoint: messages_endpoint(DEFAULT_BASE_URL),
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
        self.endpoint = messages_endpoint(base_url);
        self
    }

    /// Apply a per-request timeout instead of the transport default.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = super::http_client(Some(timeout));
        self
    }

    fn request_body<'a>(&'a self, request: &'a AnalysisRequest) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_output_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            messages: vec![Message {
                role: "user",
                content: vec![
                    ContentBlock::Image {
                        source: ImageSource {
                            source_type: "base64",
                            media_type: request.image.media_type,
                            data: &request.image.data,
                        },
                    },
                    ContentBlock::Text {
                        text: request.prompt,
                    },
                ],
            }],
        }
    }
}

fn messages_endpoint(base_url: &str) -> String {
    format!("{}/v1/messages", base_url.trim_end_matches('/'))
}

// --- Request types ---

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: Vec<ContentBlock<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ContentBlock<'a> {
    #[serde(rename = "image")]
    Image { source: ImageSource<'a> },
    #[serde(rename = "text")]
    Text { text: &'a str },
}

#[derive(Serialize)]
struct ImageSource<'a> {
    #[serde(rename = "type")]
    source_type: &'static str,
    media_type: &'a str,
    data: &'a str,
}

// --- Response types ---

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    text: Option<String>,
}

/// Pull the first text block out of a Messages API response body.
pub(crate) fn extract_text(body: &str) -> Result<String, AnalysisError> {
    let resp: MessagesResponse = parse_body(ProviderId::Claude, body)?;
    let text = resp.content.into_iter().find_map(|c| c.text);
    non_blank(ProviderId::Claude, text, "content[].text")
}

#[async_trait]
impl Analyzer for ClaudeAnalyzer {
    fn provider(&self) -> ProviderId {
        ProviderId::Claude
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn analyze(&self, image: &DynamicImage) -> Result<AnalysisResult, AnalysisError> {
        require_credential(ProviderId::Claude, &self.config)?;

        let request = AnalysisRequest::describe(&self.codec, image)?;
        let body = self.request_body(&request);

        tracing::debug!(
            model = %self.config.model,
            width = request.image.width,
            height = request.image.height,
            "Sending image to Claude"
        );
        let start = Instant::now();

        let http = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body);
        let text = extract_text(&send(ProviderId::Claude, http).await?)?;

        tracing::debug!(
            "Claude responded in {}ms ({} chars)",
            start.elapsed().as_millis(),
            text.len()
        );

        Ok(AnalysisResult::new(text, ProviderId::Claude))
    }
}
