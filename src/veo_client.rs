// src/veo_client.rs
//! Veo 3 video generation API (kie.ai) wire protocol.
//!
//! Every call is a single request; retry and pacing live in the job
//! orchestrator, not here.

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Provider-level `code` value signalling success.
pub const SUCCESS_CODE: i64 = 200;

/// Index of the rendition requested from the HD endpoint.
pub const HD_VIDEO_INDEX: u32 = 0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Veo3Error {
    #[error("Video submission failed: {0}")]
    Submission(String),
    #[error("Task status check failed: {0}")]
    Poll(String),
    #[error("Video download failed: {0}")]
    Download(String),
    #[error("HD video fetch failed: {0}")]
    HdVideo(String),
    #[error("Credit check failed: {0}")]
    CreditCheck(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum VideoModel {
    #[default]
    #[serde(rename = "veo3")]
    Veo3,
    #[serde(rename = "veo3_fast")]
    Veo3Fast,
}

impl VideoModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoModel::Veo3 => "veo3",
            VideoModel::Veo3Fast => "veo3_fast",
        }
    }
}

impl FromStr for VideoModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "veo3" => Ok(VideoModel::Veo3),
            "veo3_fast" => Ok(VideoModel::Veo3Fast),
            other => Err(format!("Unsupported model: {other}")),
        }
    }
}

impl fmt::Display for VideoModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "Auto")]
    Auto,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Auto => "Auto",
        }
    }

    /// Only landscape renders have a 1080p variant.
    pub fn supports_hd(&self) -> bool {
        matches!(self, AspectRatio::Landscape)
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "16:9" => Ok(AspectRatio::Landscape),
            "9:16" => Ok(AspectRatio::Portrait),
            "Auto" => Ok(AspectRatio::Auto),
            other => Err(format!("Unsupported aspect ratio: {other}")),
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of the submit call. Optional keys are omitted when empty.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideoRequest {
    pub prompt: String,
    pub model: VideoModel,
    pub aspect_ratio: AspectRatio,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watermark: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_urls: Option<Vec<String>>,
}

impl GenerateVideoRequest {
    pub fn new(
        prompt: impl Into<String>,
        model: VideoModel,
        aspect_ratio: AspectRatio,
        watermark: Option<String>,
        image_urls: Option<Vec<String>>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            model,
            aspect_ratio,
            watermark: watermark.filter(|w| !w.is_empty()),
            image_urls: image_urls.filter(|urls| !urls.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitData {
    task_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HdVideoData {
    result_url: String,
}

/// Status payload returned by the record-info endpoint.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub success_flag: i64,
    #[serde(default)]
    pub response: Option<TaskResponse>,
    #[serde(default)]
    pub complete_time: Option<Value>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    #[serde(default)]
    pub result_urls: Option<Vec<String>>,
}

/// Provider tri-state progress signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessFlag {
    Pending,
    Done,
    Failed(i64),
}

impl From<i64> for SuccessFlag {
    fn from(raw: i64) -> Self {
        match raw {
            0 => SuccessFlag::Pending,
            1 => SuccessFlag::Done,
            other => SuccessFlag::Failed(other),
        }
    }
}

impl TaskRecord {
    pub fn flag(&self) -> SuccessFlag {
        SuccessFlag::from(self.success_flag)
    }

    pub fn first_result_url(&self) -> Option<&str> {
        self.response
            .as_ref()?
            .result_urls
            .as_ref()?
            .first()
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CreditBalance {
    pub remaining: serde_json::Number,
}

#[derive(Debug, Clone)]
pub struct Veo3Client {
    client: Client,
    api_key: String,
    base_url: String,
    request_timeout: Option<Duration>,
}

impl Veo3Client {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout: None,
        }
    }

    /// Bound every authenticated API call (not result downloads) by `timeout`.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header("Authorization", format!("Bearer {}", self.api_key));
        match self.request_timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    }

    /// Submit a generation job and return the provider's task id.
    pub async fn submit(&self, request: &GenerateVideoRequest) -> Result<String, Veo3Error> {
        info!(
            "🎬 Submitting Veo3 generation (model={}, aspect_ratio={})",
            request.model, request.aspect_ratio
        );

        let response = self
            .authed(self.client.post(format!("{}/veo/generate", self.base_url)))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| Veo3Error::Submission(e.to_string()))?;

        let data: SubmitData = read_envelope(response, Veo3Error::Submission).await?;
        info!(task_id = %data.task_id, "✅ Veo3 task accepted");
        Ok(data.task_id)
    }

    /// Fetch the current status of a task.
    pub async fn poll(&self, task_id: &str) -> Result<TaskRecord, Veo3Error> {
        let response = self
            .authed(self.client.get(format!("{}/veo/record-info", self.base_url)))
            .query(&[("taskId", task_id)])
            .send()
            .await
            .map_err(|e| Veo3Error::Poll(e.to_string()))?;

        let record: TaskRecord = read_envelope(response, Veo3Error::Poll).await?;
        debug!(task_id, success_flag = record.success_flag, "Veo3 task status");
        Ok(record)
    }

    /// Request the 1080p rendition of a finished task.
    pub async fn fetch_hd_video(&self, task_id: &str, index: u32) -> Result<String, Veo3Error> {
        let response = self
            .authed(self.client.get(format!("{}/veo/get-1080p-video", self.base_url)))
            .query(&[("taskId", task_id.to_string()), ("index", index.to_string())])
            .send()
            .await
            .map_err(|e| Veo3Error::HdVideo(e.to_string()))?;

        let data: HdVideoData = read_envelope(response, Veo3Error::HdVideo).await?;
        Ok(data.result_url)
    }

    /// Download a result file. Result URLs are pre-signed, so no auth header is sent.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, Veo3Error> {
        info!("⬇️ Downloading generated video: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Veo3Error::Download(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Veo3Error::Download(format!(
                "Failed to download video: {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Veo3Error::Download(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    pub async fn check_credits(&self) -> Result<CreditBalance, Veo3Error> {
        let response = self
            .authed(self.client.get(format!("{}/chat/credit", self.base_url)))
            .send()
            .await
            .map_err(|e| Veo3Error::CreditCheck(e.to_string()))?;

        let remaining: serde_json::Number = read_envelope(response, Veo3Error::CreditCheck).await?;
        Ok(CreditBalance { remaining })
    }
}

/// Check the HTTP status and the provider `code`, then unwrap `data`.
async fn read_envelope<T, F>(response: Response, fail: F) -> Result<T, Veo3Error>
where
    T: DeserializeOwned,
    F: Fn(String) -> Veo3Error,
{
    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(fail(format!("HTTP {}: {}", status.as_u16(), error_text)));
    }

    let envelope: ApiEnvelope<T> = response
        .json()
        .await
        .map_err(|e| fail(format!("error decoding response body: {e}")))?;

    if envelope.code != SUCCESS_CODE {
        return Err(fail(format!(
            "API error {}: {}",
            envelope.code,
            envelope.msg.unwrap_or_else(|| "Unknown error".to_string())
        )));
    }

    envelope
        .data
        .ok_or_else(|| fail("response is missing data".to_string()))
}
