use base64::prelude::*;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::artifact_store::ArtifactStore;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Failed to read input image: {0}")]
    ReadInput(#[from] std::io::Error),
    #[error("Gemini request failed: {0}")]
    Http(reqwest::Error),
    #[error("Gemini API error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("Gemini returned no text{}", blocked_suffix(.0))]
    EmptyResponse(Option<String>),
}

impl GenerationError {
    /// Wrap a transport error without the request URL, which callers may see.
    fn transport(e: reqwest::Error) -> Self {
        GenerationError::Http(e.without_url())
    }
}

fn blocked_suffix(reason: &Option<String>) -> String {
    match reason {
        Some(reason) => format!(" (blocked: {reason})"),
        None => String::new(),
    }
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
    pub role: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct InlineData {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub data: String, // base64 encoded data
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GenerationConfig {
    pub temperature: f32,
    #[serde(rename = "topP")]
    pub top_p: f32,
    #[serde(rename = "topK")]
    pub top_k: u32,
    #[serde(rename = "maxOutputTokens")]
    pub max_output_tokens: u32,
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
}

impl GenerationConfig {
    /// Fixed parameters used for image + prompt requests.
    pub fn image_prompt() -> Self {
        Self {
            temperature: 1.0,
            top_p: 0.95,
            top_k: 64,
            max_output_tokens: 8192,
            response_mime_type: Some("text/plain".to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(rename = "promptFeedback")]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
    #[serde(rename = "finishReason")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PromptFeedback {
    #[serde(rename = "blockReason")]
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| match part {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

impl GeminiClient {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GenerationError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(GenerationError::transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let response_text = response.text().await.map_err(GenerationError::transport)?;
        tracing::debug!(
            "Gemini API response (truncated): {}...",
            response_text.chars().take(500).collect::<String>()
        );
        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!("Failed to parse Gemini response: {}", e);
            GenerationError::Api {
                status: status.as_u16(),
                body: format!("error decoding response body: {e}"),
            }
        })
    }

    /// Describe an uploaded image with the given prompt.
    ///
    /// The file at `image_path` is deleted afterwards whether or not the
    /// request succeeded.
    pub async fn generate_from_image(
        &self,
        store: &ArtifactStore,
        image_path: &Path,
        prompt: &str,
    ) -> Result<String, GenerationError> {
        let result = self.describe_image(store, image_path, prompt).await;
        store.delete(image_path).await;

        if let Err(ref e) = result {
            tracing::error!("Error in generate_from_image: {}", e);
        }
        result
    }

    async fn describe_image(
        &self,
        store: &ArtifactStore,
        image_path: &Path,
        prompt: &str,
    ) -> Result<String, GenerationError> {
        let bytes = store.read(image_path).await?;

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: prompt.to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/jpeg".to_string(),
                            data: BASE64_STANDARD.encode(&bytes),
                        },
                    },
                ],
                role: Some("user".to_string()),
            }],
            generation_config: Some(GenerationConfig::image_prompt()),
        };

        let response = self.generate_content(&request).await?;
        response.text().ok_or_else(|| {
            GenerationError::EmptyResponse(
                response
                    .prompt_feedback
                    .as_ref()
                    .and_then(|f| f.block_reason.clone()),
            )
        })
    }
}
