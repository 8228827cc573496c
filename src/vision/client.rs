//! Vision API clients for scene inference
//!
//! Sends exactly one image plus one text prompt per request and returns the
//! model's text. Gemini is the default backend; Claude is supported as an
//! alternative.

use std::str::FromStr;

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::camera::Frame;
use crate::{Error, Result};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Remote model that answers a prompt about one image
#[async_trait]
pub trait SceneModel: Send + Sync {
    /// Run one prompt + image request
    ///
    /// # Errors
    ///
    /// Returns error on network failure, API error, or an empty response
    async fn generate(&self, prompt: &str, frame: &Frame) -> Result<String>;
}

/// Vision provider backend
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisionProvider {
    Gemini,
    Anthropic,
}

impl VisionProvider {
    /// Model used when none is configured
    #[must_use]
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::Gemini => "gemini-2.5-flash",
            Self::Anthropic => "claude-sonnet-4-20250514",
        }
    }
}

impl FromStr for VisionProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            other => Err(Error::Config(format!("unknown vision provider: {other}"))),
        }
    }
}

/// Vision client for scene analysis
pub struct VisionClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    provider: VisionProvider,
}

/// Gemini `generateContent` request
#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    role: &'a str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiPart<'a> {
    Text { text: &'a str },
    InlineData { inline_data: GeminiBlob<'a> },
}

#[derive(Debug, Serialize)]
struct GeminiBlob<'a> {
    mime_type: &'a str,
    data: String,
}

/// Gemini `generateContent` response
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

/// Anthropic message request
#[derive(Debug, Serialize)]
struct MessageRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

/// A message in the request
#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: Vec<ContentBlock<'a>>,
}

/// Content block (text or image)
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ContentBlock<'a> {
    #[serde(rename = "text")]
    Text { text: &'a str },
    #[serde(rename = "image")]
    Image { source: ImageSource<'a> },
}

/// Image source
#[derive(Debug, Serialize)]
struct ImageSource<'a> {
    #[serde(rename = "type")]
    source_type: &'a str,
    media_type: &'a str,
    data: String,
}

/// Anthropic message response
#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Vec<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    text: Option<String>,
}

impl VisionClient {
    /// Create a new vision client
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(provider: VisionProvider, api_key: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(format!(
                "{provider:?} API key required for vision"
            )));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: provider.default_model().to_string(),
            max_tokens: 300,
            provider,
        })
    }

    /// Create with a specific model
    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    /// Cap response length (Anthropic only; Gemini budgets its own thinking tokens)
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    async fn generate_gemini(&self, prompt: &str, frame: &Frame) -> Result<String> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![
                    GeminiPart::Text { text: prompt },
                    GeminiPart::InlineData {
                        inline_data: GeminiBlob {
                            mime_type: frame.mime_type(),
                            data: encode(frame),
                        },
                    },
                ],
            }],
        };

        let url = format!("{GEMINI_API_URL}/{}:generateContent", self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Vision(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Vision(format!("Gemini API error {status}: {body}")));
        }

        let result: GeminiResponse = response
            .json()
            .await
            .map_err(|e| Error::Vision(format!("Parse error: {e}")))?;

        Ok(result
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect::<String>())
    }

    async fn generate_anthropic(&self, prompt: &str, frame: &Frame) -> Result<String> {
        let request = MessageRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user",
                content: vec![
                    ContentBlock::Image {
                        source: ImageSource {
                            source_type: "base64",
                            media_type: frame.mime_type(),
                            data: encode(frame),
                        },
                    },
                    ContentBlock::Text { text: prompt },
                ],
            }],
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Vision(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Vision(format!("Anthropic API error {status}: {body}")));
        }

        let result: MessageResponse = response
            .json()
            .await
            .map_err(|e| Error::Vision(format!("Parse error: {e}")))?;

        Ok(result
            .content
            .into_iter()
            .filter_map(|c| c.text)
            .collect::<Vec<_>>()
            .join(" "))
    }
}

#[async_trait]
impl SceneModel for VisionClient {
    async fn generate(&self, prompt: &str, frame: &Frame) -> Result<String> {
        let text = match self.provider {
            VisionProvider::Gemini => self.generate_gemini(prompt, frame).await?,
            VisionProvider::Anthropic => self.generate_anthropic(prompt, frame).await?,
        };

        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(Error::Vision("Empty response from vision API".to_string()));
        }

        tracing::debug!(provider = ?self.provider, model = %self.model, "scene described");
        Ok(text)
    }
}

fn encode(frame: &Frame) -> String {
    base64::engine::general_purpose::STANDARD.encode(frame.data())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parse() {
        assert_eq!("Gemini".parse::<VisionProvider>().unwrap(), VisionProvider::Gemini);
        assert_eq!(" claude ".parse::<VisionProvider>().unwrap(), VisionProvider::Anthropic);
        assert!("llava".parse::<VisionProvider>().is_err());
    }

    #[test]
    fn test_missing_key_rejected() {
        assert!(VisionClient::new(VisionProvider::Gemini, String::new()).is_err());
    }

    #[test]
    fn test_gemini_request_shape() {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![
                    GeminiPart::Text { text: "Describe scene." },
                    GeminiPart::InlineData {
                        inline_data: GeminiBlob {
                            mime_type: "image/jpeg",
                            data: "AAAA".to_string(),
                        },
                    },
                ],
            }],
        };

        let json = serde_json::to_value(&request).unwrap();
        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "Describe scene.");
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/jpeg");
        assert_eq!(parts[1]["inline_data"]["data"], "AAAA");
    }

    #[test]
    fn test_gemini_response_joins_parts() {
        let response: GeminiResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Found keys "},{"text":"on the table."}]}}]}"#,
        )
        .unwrap();

        let text: String = response
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect();
        assert_eq!(text, "Found keys on the table.");
    }

    #[test]
    fn test_gemini_blocked_response_is_empty() {
        let response: GeminiResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert!(response.candidates.is_empty());
    }
}
