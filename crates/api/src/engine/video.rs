//! Video pipeline: render, poll, optional narration voiceover, mux.

use lumina_core::error::CoreError;
use lumina_core::types::DbId;
use lumina_core::{credits, sanitize, speech, video};
use lumina_db::models::generation::{Generation, GenerationKind, NewGeneration};
use lumina_provider::mux;
use serde::Deserialize;

use crate::error::AppResult;

use super::{Engine, JobAssets, PipelineError, SubmitReceipt, DEMO_VIDEO_URL};

/// Submission payload for a video generation.
#[derive(Debug, Deserialize)]
pub struct VideoRequest {
    pub title: Option<String>,
    pub prompt: String,
    pub narration: Option<String>,
    pub voice_id: Option<String>,
    pub duration: Option<i32>,
    pub resolution: Option<String>,
    pub model: Option<String>,
}

impl Engine {
    /// Submit a video generation.
    ///
    /// Narrated videos cost more and are rejected up front when the
    /// narration cannot be spoken within the clip even at maximum
    /// playback speed.
    pub async fn submit_video(
        &self,
        user_id: DbId,
        request: VideoRequest,
    ) -> AppResult<SubmitReceipt> {
        let prompt = sanitize::clean(&request.prompt);
        if prompt.is_empty() {
            return Err(CoreError::Validation("prompt is required".into()).into());
        }

        let narration = request.narration.as_deref().and_then(sanitize::clean_opt);
        let cost = credits::video_cost(narration.is_some());
        self.check_user_credits(user_id, cost).await?;

        let duration_secs = match request.duration {
            Some(d) if d > 0 => d,
            _ => video::DEFAULT_DURATION_SECS,
        };

        // Reject impossible narrations before creating any state. The
        // pipeline recomputes the exact speed later against the clamped
        // clip length.
        if let Some(narration) = &narration {
            speech::calculate_optimal_speed(narration, duration_secs)?;
        }

        let new = NewGeneration {
            kind: GenerationKind::Video,
            title: request.title.as_deref().and_then(sanitize::clean_opt),
            prompt,
            lyrics: None,
            narration,
            voice_id: request.voice_id.as_deref().and_then(sanitize::clean_opt),
            style: None,
            duration_secs: Some(duration_secs),
            resolution: Some(
                request
                    .resolution
                    .as_deref()
                    .and_then(sanitize::clean_opt)
                    .unwrap_or_else(|| video::DEFAULT_RESOLUTION.to_string()),
            ),
            model: Some(
                request
                    .model
                    .as_deref()
                    .and_then(sanitize::clean_opt)
                    .unwrap_or_else(|| video::DEFAULT_MODEL.to_string()),
            ),
            credits_cost: cost,
        };
        let generation = self.store.create_job(user_id, &new).await?;
        self.cache.invalidate_user(user_id).await;
        self.notify_started(&generation).await;

        if !self.is_live() {
            let generation = self.complete_demo(generation, DEMO_VIDEO_URL, None).await?;
            return Ok(SubmitReceipt {
                generation,
                demo: true,
            });
        }

        let engine = self.clone();
        let job = generation.clone();
        self.spawn_pipeline(generation.clone(), async move {
            engine.run_video_pipeline(job).await;
        });

        Ok(SubmitReceipt {
            generation,
            demo: false,
        })
    }

    /// Drive one video job from `Processing` to a terminal state.
    async fn run_video_pipeline(&self, mut generation: Generation) {
        let total_steps = if generation.narration.is_some() { 3 } else { 2 };

        tracing::info!(
            generation_id = generation.id,
            model = generation.model.as_deref().unwrap_or(video::DEFAULT_MODEL),
            narrated = generation.narration.is_some(),
            "Starting video pipeline",
        );
        self.notify_progress(&generation, 1, total_steps, "Generating video...")
            .await;

        match self.video_assets(&mut generation, total_steps).await {
            Ok(assets) => self.complete_job(generation, assets).await,
            Err(e) => self.fail_job(generation, e.to_string()).await,
        }
    }

    /// Render the clip, then (for narrated jobs) synthesize the voiceover
    /// and mux it in.
    ///
    /// The rendered clip is mandatory; the voiceover and mux steps degrade
    /// softly -- on failure the silent clip is delivered and the reason is
    /// recorded on the job.
    async fn video_assets(
        &self,
        generation: &mut Generation,
        total_steps: u32,
    ) -> Result<JobAssets, PipelineError> {
        let model = generation
            .model
            .as_deref()
            .unwrap_or(video::DEFAULT_MODEL)
            .to_string();
        let duration_secs = generation
            .duration_secs
            .unwrap_or(video::DEFAULT_DURATION_SECS);
        let resolution = generation.resolution.clone().unwrap_or_default();

        let task_id = self
            .provider
            .generate_video(&generation.prompt, duration_secs, &resolution, &model)
            .await?;
        self.store
            .record_provider_task(generation.id, &task_id)
            .await?;
        generation.provider_task_id = Some(task_id.clone());

        let outcome = self
            .provider
            .wait_for_task(&task_id, video::poll_timeout(&model))
            .await?;
        let mut output_url = outcome.download_url.ok_or(PipelineError::MissingOutput)?;

        let mut soft_error = None;
        if let Some(narration) = generation.narration.clone() {
            self.notify_progress(generation, 2, total_steps, "Synthesizing narration...")
                .await;

            // Pace the voiceover to end just before the clip does. The
            // clip length may have been clamped since submission, so this
            // can still come out unspeakable.
            match speech::calculate_optimal_speed(&narration, duration_secs) {
                Err(e) => {
                    tracing::warn!(generation_id = generation.id, error = %e, "Narration skipped");
                    soft_error = Some(format!("Voiceover skipped: {e}"));
                }
                Ok(playback_speed) => {
                    let voice_id = generation.voice_id.clone().unwrap_or_default();
                    match self
                        .provider
                        .generate_speech(&narration, &voice_id, playback_speed)
                        .await
                    {
                        Err(e) => {
                            tracing::warn!(
                                generation_id = generation.id,
                                error = %e,
                                "Voiceover synthesis failed; delivering silent video",
                            );
                            soft_error = Some(format!("Voiceover generation failed: {e}"));
                        }
                        Ok(payload) => {
                            self.notify_progress(
                                generation,
                                3,
                                total_steps,
                                "Combining video and narration...",
                            )
                            .await;

                            let file_name = format!("{}_with_audio.mp4", generation.id);
                            let output_path = self.upload_root.join("video").join(&file_name);
                            match mux::combine_video_with_audio(
                                &output_url,
                                &payload.audio_hex,
                                &output_path,
                            )
                            .await
                            {
                                Err(e) => {
                                    tracing::warn!(
                                        generation_id = generation.id,
                                        error = %e,
                                        "Mux failed; delivering silent video",
                                    );
                                    soft_error =
                                        Some(format!("Combining video and narration failed: {e}"));
                                }
                                Ok(()) => {
                                    output_url = format!("/uploads/video/{file_name}");
                                }
                            }
                        }
                    }
                }
            }
        }

        Ok(JobAssets {
            output_url,
            thumbnail_url: None,
            metadata: None,
            soft_error,
        })
    }
}
