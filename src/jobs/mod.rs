// src/jobs/mod.rs
//! Video generation jobs: the in-memory job record and its polling state machine.
//!
//! A job lives only for the duration of one `run` call; nothing here is persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::veo_client::{AspectRatio, GenerateVideoRequest, SuccessFlag, Veo3Error, VideoModel};

pub mod video_job;

pub use video_job::VideoJobOrchestrator;

/// Opaque handle issued by the provider.
pub type TaskId = String;

#[derive(Error, Debug)]
pub enum VideoJobError {
    #[error(transparent)]
    Provider(#[from] Veo3Error),
    #[error("Video generation failed: {0}")]
    JobFailed(String),
    #[error("Video generation timed out after {attempts} polling attempts")]
    TimedOut { attempts: u32 },
    #[error("Video generation completed but no result URL was returned")]
    MissingResultUrl,
    #[error("Failed to save video: {0}")]
    Storage(#[from] std::io::Error),
}

/// Caller-facing knobs for a generation request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoOptions {
    pub model: VideoModel,
    pub aspect_ratio: AspectRatio,
    pub watermark: Option<String>,
    pub image_urls: Option<Vec<String>>,
    /// Falls back to `video_<submission millis>.mp4`.
    pub output_filename: Option<String>,
}

/// Coarse status exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Succeeded,
    Failed,
}

/// Polling state machine.
///
/// `Submitted` and `Polling` are the only non-terminal states; `on_poll`
/// never leaves a terminal state.
#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    Submitted,
    Polling { attempts: u32 },
    Completed,
    Failed { message: String },
    TimedOut { attempts: u32 },
}

impl JobState {
    /// Apply one poll result. `attempts` counts pending answers seen so far.
    pub fn on_poll(self, flag: SuccessFlag, error_message: Option<&str>, max_attempts: u32) -> JobState {
        let attempts = match self {
            JobState::Submitted => 0,
            JobState::Polling { attempts } => attempts,
            terminal => return terminal,
        };

        match flag {
            SuccessFlag::Done => JobState::Completed,
            SuccessFlag::Pending => {
                let attempts = attempts + 1;
                if attempts >= max_attempts {
                    JobState::TimedOut { attempts }
                } else {
                    JobState::Polling { attempts }
                }
            }
            SuccessFlag::Failed(code) => JobState::Failed {
                message: error_message
                    .filter(|m| !m.trim().is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("provider reported status flag {code}")),
            },
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobState::Submitted | JobState::Polling { .. })
    }

    pub fn status(&self) -> JobStatus {
        match self {
            JobState::Submitted | JobState::Polling { .. } => JobStatus::Pending,
            JobState::Completed => JobStatus::Succeeded,
            JobState::Failed { .. } | JobState::TimedOut { .. } => JobStatus::Failed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub task_id: TaskId,
    pub prompt: String,
    pub model: VideoModel,
    pub aspect_ratio: AspectRatio,
    pub watermark: Option<String>,
    pub source_image_urls: Option<Vec<String>>,
    pub output_filename: String,
    pub state: JobState,
    pub created_at: DateTime<Utc>,
}

impl GenerationJob {
    pub fn new(
        task_id: TaskId,
        request: GenerateVideoRequest,
        output_filename: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            task_id,
            prompt: request.prompt,
            model: request.model,
            aspect_ratio: request.aspect_ratio,
            watermark: request.watermark,
            source_image_urls: request.image_urls,
            output_filename,
            state: JobState::Submitted,
            created_at,
        }
    }

    pub fn status(&self) -> JobStatus {
        self.state.status()
    }
}

/// Default artifact name for a job submitted at `submitted_at`.
pub fn default_output_filename(submitted_at: DateTime<Utc>) -> String {
    format!("video_{}.mp4", submitted_at.timestamp_millis())
}

/// Final payload returned to the caller of a successful run.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoResult {
    pub success: bool,
    pub task_id: TaskId,
    pub video_path: String,
    pub video_url: String,
    pub hd_video_url: Option<String>,
    pub message: String,
    pub complete_time: Option<Value>,
}
