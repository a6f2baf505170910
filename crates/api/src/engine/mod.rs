//! Generation pipeline engine.
//!
//! The engine owns the full life of a job: pre-flight checks and row
//! creation on the request path, then a spawned background pipeline that
//! talks to the provider, stores outputs, debits credits, and pushes
//! progress over WebSocket. Submission never waits for the pipeline; the
//! HTTP caller gets the `Processing` row back immediately.
//!
//! Once a row exists, pipeline faults never surface as HTTP errors --
//! errors and panics alike are recorded on the job and announced to the
//! owner's sockets.
//!
//! Persistence and the provider sit behind the [`JobStore`] and
//! [`MediaProvider`] seams so the pipelines are testable end to end
//! without Postgres or the network.

mod music;
mod provider;
mod store;
mod video;

pub use music::MusicRequest;
pub use provider::MediaProvider;
pub use store::{JobStore, PgStore};
pub use video::VideoRequest;

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::ws::Message;
use futures::FutureExt;
use lumina_core::error::CoreError;
use lumina_core::job_events;
use lumina_core::types::DbId;
use lumina_db::models::generation::{Generation, GenerationKind, GenerationStatus};
use lumina_db::models::user::User;
use lumina_db::repositories::CompleteGeneration;
use lumina_provider::ProviderError;
use serde_json::json;

use crate::cache::ListingCache;
use crate::error::AppResult;
use crate::ws::WsManager;

/// Placeholder track served when no provider key is configured.
const DEMO_MUSIC_URL: &str = "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-1.mp3";

/// Placeholder clip served when no provider key is configured.
const DEMO_VIDEO_URL: &str = "https://www.w3schools.com/html/mov_bbb.mp4";

/// Failure message recorded when a pipeline task panics.
const PIPELINE_CRASH_MESSAGE: &str = "Generation pipeline crashed";

/// What a submission call hands back to the HTTP layer.
#[derive(Debug)]
pub struct SubmitReceipt {
    /// The created job row. In demo mode it is already `Completed`.
    pub generation: Generation,
    /// Whether the job was short-circuited by demo mode.
    pub demo: bool,
}

/// Everything a pipeline produces for a completed job.
#[derive(Debug)]
struct JobAssets {
    output_url: String,
    thumbnail_url: Option<String>,
    metadata: Option<String>,
    /// Non-fatal error from a degraded completion (e.g. the voiceover
    /// step failed but the silent video was kept).
    soft_error: Option<String>,
}

/// Errors that terminate a running pipeline.
#[derive(Debug, thiserror::Error)]
enum PipelineError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("provider returned no audio data")]
    EmptyAudio,

    #[error("task completed without an output file")]
    MissingOutput,

    #[error("failed to store output file: {0}")]
    Storage(#[from] std::io::Error),

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Generation pipeline engine. Cheap to clone; every background pipeline
/// runs on its own clone.
#[derive(Clone)]
pub struct Engine {
    store: Arc<dyn JobStore>,
    ws: Arc<WsManager>,
    cache: ListingCache,
    provider: Arc<dyn MediaProvider>,
    upload_root: PathBuf,
}

impl Engine {
    pub fn new(
        store: Arc<dyn JobStore>,
        ws: Arc<WsManager>,
        cache: ListingCache,
        provider: Arc<dyn MediaProvider>,
        upload_root: PathBuf,
    ) -> Self {
        Self {
            store,
            ws,
            cache,
            provider,
            upload_root,
        }
    }

    /// Whether submissions run against the real provider.
    pub fn is_live(&self) -> bool {
        self.provider.is_configured()
    }

    // -----------------------------------------------------------------------
    // Shared pre-flight checks
    // -----------------------------------------------------------------------

    /// Load the submitting user and verify they can afford the job.
    ///
    /// The balance check here is advisory (the debit itself re-reads the
    /// balance under a row lock); it exists to reject obviously
    /// unaffordable jobs before any work starts.
    async fn check_user_credits(&self, user_id: DbId, cost: i32) -> AppResult<User> {
        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "user",
                id: user_id,
            })?;

        if user.credits < cost {
            return Err(CoreError::InsufficientCredits {
                required: cost,
                available: user.credits,
            }
            .into());
        }

        Ok(user)
    }

    // -----------------------------------------------------------------------
    // Pipeline spawning
    // -----------------------------------------------------------------------

    /// Spawn a pipeline behind a crash barrier.
    ///
    /// The pipeline body converts its own `Err` into a `Failed`
    /// transition; this wrapper covers the remaining hole -- a panic
    /// inside the task must also land the job in `Failed` with a
    /// notification, never strand it in `Processing`.
    fn spawn_pipeline<F>(&self, generation: Generation, pipeline: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let engine = self.clone();
        tokio::spawn(async move {
            if AssertUnwindSafe(pipeline).catch_unwind().await.is_err() {
                tracing::error!(generation_id = generation.id, "Pipeline task panicked");
                engine
                    .fail_job(generation, PIPELINE_CRASH_MESSAGE.to_string())
                    .await;
            }
        });
    }

    // -----------------------------------------------------------------------
    // Terminal transitions
    // -----------------------------------------------------------------------

    /// Complete a demo-mode job synchronously with a placeholder output.
    /// Demo jobs are free: no ledger entry is written.
    async fn complete_demo(
        &self,
        mut generation: Generation,
        output_url: &str,
        thumbnail_url: Option<String>,
    ) -> AppResult<Generation> {
        let fields = CompleteGeneration {
            output_url,
            thumbnail_url: thumbnail_url.as_deref(),
            metadata: None,
            error_message: None,
        };
        self.store.mark_completed(generation.id, &fields).await?;

        generation.status = GenerationStatus::Completed;
        generation.output_url = Some(output_url.to_string());
        generation.thumbnail_url = thumbnail_url;

        self.cache.invalidate_user(generation.user_id).await;
        self.notify_completed(&generation).await;
        tracing::info!(generation_id = generation.id, "Demo generation completed");

        Ok(generation)
    }

    /// Mark a job `Completed`, debit its cost, and notify the owner.
    async fn complete_job(&self, mut generation: Generation, assets: JobAssets) {
        let fields = CompleteGeneration {
            output_url: &assets.output_url,
            thumbnail_url: assets.thumbnail_url.as_deref(),
            metadata: assets.metadata.as_deref(),
            error_message: assets.soft_error.as_deref(),
        };
        if let Err(e) = self.store.mark_completed(generation.id, &fields).await {
            tracing::error!(generation_id = generation.id, error = %e, "Failed to record completion");
            self.fail_job(generation, "Failed to record completion".to_string())
                .await;
            return;
        }

        generation.status = GenerationStatus::Completed;
        generation.output_url = Some(assets.output_url);
        generation.thumbnail_url = assets.thumbnail_url;
        generation.metadata = assets.metadata;
        generation.error_message = assets.soft_error;

        self.cache.invalidate_user(generation.user_id).await;

        // Credits are charged on delivery, never for a failed job. A debit
        // failure here is logged but does not un-complete the job.
        let description = match generation.kind {
            GenerationKind::Music => "Music generation",
            GenerationKind::Video => "Video generation",
        };
        if let Err(e) = self
            .store
            .debit_credits(
                generation.user_id,
                generation.credits_cost,
                generation.id,
                description,
            )
            .await
        {
            tracing::error!(
                generation_id = generation.id,
                user_id = generation.user_id,
                error = %e,
                "Credit debit failed for completed generation",
            );
        }

        self.notify_completed(&generation).await;
        tracing::info!(
            generation_id = generation.id,
            kind = generation.kind.as_str(),
            "Generation completed",
        );
    }

    /// Mark a job `Failed` and notify the owner. No credits are charged.
    async fn fail_job(&self, mut generation: Generation, message: String) {
        match self.store.mark_failed(generation.id, &message).await {
            Ok(true) => {}
            Ok(false) => {
                // Already terminal (e.g. a crash after completion was
                // recorded); nothing to announce.
                tracing::warn!(
                    generation_id = generation.id,
                    "Job already terminal; failure not recorded",
                );
                return;
            }
            Err(e) => {
                tracing::error!(generation_id = generation.id, error = %e, "Failed to record failure");
            }
        }

        generation.status = GenerationStatus::Failed;
        generation.error_message = Some(message.clone());

        self.cache.invalidate_user(generation.user_id).await;
        self.notify_failed(&generation, &message).await;
        tracing::warn!(
            generation_id = generation.id,
            kind = generation.kind.as_str(),
            error = %message,
            "Generation failed",
        );
    }

    // -----------------------------------------------------------------------
    // WebSocket notifications
    // -----------------------------------------------------------------------

    /// Push a JSON message to every socket of the job's owner. Losing the
    /// message (user offline) is fine; the job row is the source of truth.
    async fn notify(&self, user_id: DbId, payload: serde_json::Value) {
        let sent = self
            .ws
            .send_to_user(user_id, Message::Text(payload.to_string().into()))
            .await;
        tracing::trace!(user_id, sent, "Job notification dispatched");
    }

    async fn notify_started(&self, generation: &Generation) {
        self.notify(
            generation.user_id,
            json!({
                "type": job_events::MSG_TYPE_GENERATION_STARTED,
                "generation": generation,
            }),
        )
        .await;
    }

    async fn notify_progress(
        &self,
        generation: &Generation,
        step: u32,
        total_steps: u32,
        message: &str,
    ) {
        self.notify(
            generation.user_id,
            json!({
                "type": job_events::MSG_TYPE_GENERATION_PROGRESS,
                "generation_id": generation.id,
                "step": step,
                "total_steps": total_steps,
                "message": message,
            }),
        )
        .await;
    }

    async fn notify_completed(&self, generation: &Generation) {
        self.notify(
            generation.user_id,
            json!({
                "type": job_events::MSG_TYPE_GENERATION_COMPLETED,
                "generation": generation,
                "output_url": generation.output_url,
            }),
        )
        .await;
    }

    async fn notify_failed(&self, generation: &Generation, error: &str) {
        self.notify(
            generation.user_id,
            json!({
                "type": job_events::MSG_TYPE_GENERATION_FAILED,
                "generation": generation,
                "error": error,
            }),
        )
        .await;
    }
}
