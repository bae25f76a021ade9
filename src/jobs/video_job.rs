// src/jobs/video_job.rs
//! Submit → poll → download orchestration for a single video generation.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use super::{
    default_output_filename, GenerationJob, JobState, VideoJobError, VideoOptions, VideoResult,
};
use crate::artifact_store::ArtifactStore;
use crate::clock::{Sleeper, TokioSleeper};
use crate::config::VideoJobConfig;
use crate::veo_client::{GenerateVideoRequest, TaskRecord, Veo3Client, HD_VIDEO_INDEX};

/// Drives one generation job at a time per call; independent runs share no
/// mutable state.
#[derive(Clone)]
pub struct VideoJobOrchestrator {
    client: Veo3Client,
    store: ArtifactStore,
    config: VideoJobConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl VideoJobOrchestrator {
    pub fn new(client: Veo3Client, store: ArtifactStore, config: VideoJobConfig) -> Self {
        Self {
            client,
            store,
            config,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn config(&self) -> &VideoJobConfig {
        &self.config
    }

    pub async fn run(&self, prompt: &str, options: VideoOptions) -> Result<VideoResult, VideoJobError> {
        let submitted_at = Utc::now();
        let output_filename = options
            .output_filename
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| default_output_filename(submitted_at));
        // Reject an unusable name before any provider credits are spent
        self.store.path_for(&output_filename)?;

        let request = GenerateVideoRequest::new(
            prompt,
            options.model,
            options.aspect_ratio,
            options.watermark,
            options.image_urls,
        );
        let task_id = self.client.submit(&request).await?;
        let mut job = GenerationJob::new(task_id, request, output_filename, submitted_at);

        let record = self.wait_for_completion(&mut job).await?;
        self.retrieve(&job, record).await
    }

    /// Poll until the job leaves the pending states, sleeping only between polls.
    async fn wait_for_completion(&self, job: &mut GenerationJob) -> Result<TaskRecord, VideoJobError> {
        let max_attempts = self.config.max_poll_attempts;

        loop {
            let record = self.client.poll(&job.task_id).await?;
            let state = std::mem::replace(&mut job.state, JobState::Submitted);
            job.state = state.on_poll(record.flag(), record.error_message.as_deref(), max_attempts);

            match &job.state {
                JobState::Completed => {
                    info!(task_id = %job.task_id, "✅ Video generation completed");
                    return Ok(record);
                }
                JobState::Failed { message } => {
                    warn!(task_id = %job.task_id, "❌ Video generation failed: {}", message);
                    return Err(VideoJobError::JobFailed(message.clone()));
                }
                JobState::TimedOut { attempts } => {
                    warn!(task_id = %job.task_id, attempts, "⏰ Video generation timed out");
                    return Err(VideoJobError::TimedOut {
                        attempts: *attempts,
                    });
                }
                JobState::Submitted | JobState::Polling { .. } => {
                    info!(
                        task_id = %job.task_id,
                        "Video generation in progress... (attempt {}/{})",
                        attempts_of(&job.state),
                        max_attempts
                    );
                    self.sleeper.sleep(self.config.poll_interval).await;
                }
            }
        }
    }

    async fn retrieve(&self, job: &GenerationJob, record: TaskRecord) -> Result<VideoResult, VideoJobError> {
        let video_url = record
            .first_result_url()
            .ok_or(VideoJobError::MissingResultUrl)?
            .to_string();

        let bytes = self.client.download(&video_url).await?;
        let video_path = self.store.write(&job.output_filename, &bytes).await?;
        info!(
            task_id = %job.task_id,
            "💾 Saved video ({} bytes) to {}",
            bytes.len(),
            video_path.display()
        );

        let hd_video_url = if job.aspect_ratio.supports_hd() {
            match self.client.fetch_hd_video(&job.task_id, HD_VIDEO_INDEX).await {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!(task_id = %job.task_id, "HD video unavailable: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Ok(VideoResult {
            success: true,
            task_id: job.task_id.clone(),
            video_path: video_path.display().to_string(),
            video_url,
            hd_video_url,
            message: "Video generated successfully".to_string(),
            complete_time: record.complete_time,
        })
    }
}

fn attempts_of(state: &JobState) -> u32 {
    match state {
        JobState::Polling { attempts } | JobState::TimedOut { attempts } => *attempts,
        _ => 0,
    }
}
