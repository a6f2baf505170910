//! Music pipeline: track generation, cover art, credit debit.

use lumina_core::error::CoreError;
use lumina_core::types::DbId;
use lumina_core::{credits, sanitize};
use lumina_db::models::generation::{Generation, GenerationKind, NewGeneration};
use lumina_provider::types::decode_audio_payload;
use serde::Deserialize;

use crate::error::AppResult;

use super::{Engine, JobAssets, PipelineError, SubmitReceipt, DEMO_MUSIC_URL};

/// Default music model when the request does not choose one.
const DEFAULT_MUSIC_MODEL: &str = "music-2.0";

/// Default output format and bitrate for rendered tracks.
const DEFAULT_FORMAT: &str = "mp3";
const DEFAULT_BITRATE: i32 = 256_000;

/// Submission payload for a music generation.
#[derive(Debug, Deserialize)]
pub struct MusicRequest {
    pub title: Option<String>,
    pub prompt: String,
    pub lyrics: String,
    pub style: Option<String>,
    pub model: Option<String>,
    pub format: Option<String>,
    pub bitrate: Option<i32>,
}

/// Resolved provider parameters, fixed at submission time.
#[derive(Debug)]
struct MusicParams {
    /// Style-prefixed prompt sent to the provider.
    full_prompt: String,
    lyrics: String,
    model: String,
    format: String,
    bitrate: i32,
}

impl Engine {
    /// Submit a music generation.
    ///
    /// Validates the request, checks credits, creates the `Processing`
    /// row, then hands off to a background pipeline (or completes
    /// immediately in demo mode).
    pub async fn submit_music(
        &self,
        user_id: DbId,
        request: MusicRequest,
    ) -> AppResult<SubmitReceipt> {
        self.check_user_credits(user_id, credits::MUSIC_COST).await?;

        let prompt = sanitize::clean(&request.prompt);
        if prompt.is_empty() {
            return Err(CoreError::Validation("prompt is required".into()).into());
        }
        let lyrics = sanitize::clean(&request.lyrics);
        if lyrics.is_empty() {
            return Err(CoreError::Validation("lyrics are required".into()).into());
        }

        let title = request.title.as_deref().and_then(sanitize::clean_opt);
        let style = request.style.as_deref().and_then(sanitize::clean_opt);
        let model = request
            .model
            .as_deref()
            .and_then(sanitize::clean_opt)
            .unwrap_or_else(|| DEFAULT_MUSIC_MODEL.to_string());

        let new = NewGeneration {
            kind: GenerationKind::Music,
            title,
            prompt: prompt.clone(),
            lyrics: Some(lyrics.clone()),
            narration: None,
            voice_id: None,
            style: style.clone(),
            duration_secs: None,
            resolution: None,
            model: Some(model.clone()),
            credits_cost: credits::MUSIC_COST,
        };
        let generation = self.store.create_job(user_id, &new).await?;
        self.cache.invalidate_user(user_id).await;
        self.notify_started(&generation).await;

        if !self.is_live() {
            let thumbnail = credits::placeholder_art_url(generation.id);
            let generation = self
                .complete_demo(generation, DEMO_MUSIC_URL, Some(thumbnail))
                .await?;
            return Ok(SubmitReceipt {
                generation,
                demo: true,
            });
        }

        let params = MusicParams {
            full_prompt: match &style {
                Some(style) => format!("{style}, {prompt}"),
                None => prompt,
            },
            lyrics,
            model,
            format: request
                .format
                .as_deref()
                .and_then(sanitize::clean_opt)
                .unwrap_or_else(|| DEFAULT_FORMAT.to_string()),
            bitrate: match request.bitrate {
                Some(b) if b > 0 => b,
                _ => DEFAULT_BITRATE,
            },
        };

        let engine = self.clone();
        let job = generation.clone();
        self.spawn_pipeline(generation.clone(), async move {
            engine.run_music_pipeline(job, params).await;
        });

        Ok(SubmitReceipt {
            generation,
            demo: false,
        })
    }

    /// Drive one music job from `Processing` to a terminal state.
    async fn run_music_pipeline(&self, generation: Generation, params: MusicParams) {
        tracing::info!(
            generation_id = generation.id,
            model = %params.model,
            "Starting music pipeline",
        );
        self.notify_progress(&generation, 1, 2, "Generating your track...")
            .await;

        match self.music_assets(&generation, &params).await {
            Ok(assets) => self.complete_job(generation, assets).await,
            Err(e) => self.fail_job(generation, e.to_string()).await,
        }
    }

    /// Produce the track and its cover art.
    ///
    /// The track is mandatory; cover art degrades to a deterministic
    /// placeholder when image generation fails.
    async fn music_assets(
        &self,
        generation: &Generation,
        params: &MusicParams,
    ) -> Result<JobAssets, PipelineError> {
        let payload = self
            .provider
            .generate_music(
                &params.full_prompt,
                &params.lyrics,
                &params.format,
                &params.model,
                params.bitrate,
            )
            .await?;

        if payload.audio.is_empty() {
            return Err(PipelineError::EmptyAudio);
        }

        // The provider returns either a hosted URL or inline hex bytes.
        let output_url = if payload.audio.starts_with("http") {
            payload.audio
        } else {
            let bytes = decode_audio_payload(&payload.audio)?;
            let file_name = format!("{}.{}", generation.id, params.format);
            let path = self.upload_root.join("audio").join(&file_name);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, &bytes).await?;
            format!("/uploads/audio/{file_name}")
        };

        self.notify_progress(generation, 2, 2, "Designing cover art...")
            .await;

        let art_prompt = cover_art_prompt(generation);
        let thumbnail_url = match self.provider.generate_image(&art_prompt).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(
                    generation_id = generation.id,
                    error = %e,
                    "Cover art generation failed; using placeholder",
                );
                credits::placeholder_art_url(generation.id)
            }
        };

        Ok(JobAssets {
            output_url,
            thumbnail_url: Some(thumbnail_url),
            metadata: payload.extra_info.map(|v| v.to_string()),
            soft_error: None,
        })
    }
}

/// Prompt for the cover art image, derived from the track's own fields.
fn cover_art_prompt(generation: &Generation) -> String {
    let style = generation.style.as_deref().unwrap_or("modern");
    let title = generation.title.as_deref().unwrap_or(&generation.prompt);
    format!(
        "Album cover art, {style} music, \"{title}\", professional artwork, high quality, beautiful colors"
    )
}
