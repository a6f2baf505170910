//! End-to-end pipeline tests for the generation engine.
//!
//! These run the real submission and pipeline code against an in-memory
//! job store and a scripted provider, and observe outcomes the way a
//! client would: through the job row and the WebSocket events. They pin
//! down the credit rules -- a completed job is debited exactly once, a
//! failed job is never charged -- and that every job reaches a terminal
//! state even when the pipeline task itself crashes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::ws::Message;
use chrono::Utc;
use lumina_api::cache::ListingCache;
use lumina_api::engine::{Engine, JobStore, MediaProvider, MusicRequest, VideoRequest};
use lumina_api::error::AppError;
use lumina_api::ws::WsManager;
use lumina_core::error::CoreError;
use lumina_core::job_events::{MSG_TYPE_GENERATION_COMPLETED, MSG_TYPE_GENERATION_FAILED};
use lumina_core::types::DbId;
use lumina_db::models::generation::{Generation, GenerationStatus, NewGeneration};
use lumina_db::models::user::User;
use lumina_db::repositories::CompleteGeneration;
use lumina_provider::poller::TaskOutcome;
use lumina_provider::types::{MusicPayload, SpeechPayload};
use lumina_provider::ProviderError;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedReceiver;

const USER_ID: DbId = 7;

// ---------------------------------------------------------------------------
// In-memory job store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct StoreState {
    credits: i32,
    next_id: DbId,
    jobs: HashMap<DbId, Generation>,
    /// One entry per ledger debit: (generation_id, amount).
    debits: Vec<(DbId, i32)>,
}

struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    fn with_credits(credits: i32) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(StoreState {
                credits,
                next_id: 1,
                ..StoreState::default()
            }),
        })
    }

    fn credits(&self) -> i32 {
        self.state.lock().unwrap().credits
    }

    fn debits(&self) -> Vec<(DbId, i32)> {
        self.state.lock().unwrap().debits.clone()
    }

    fn job(&self, id: DbId) -> Generation {
        self.state.lock().unwrap().jobs[&id].clone()
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn find_user(&self, id: DbId) -> Result<Option<User>, sqlx::Error> {
        if id != USER_ID {
            return Ok(None);
        }
        let credits = self.state.lock().unwrap().credits;
        Ok(Some(User {
            id,
            email: "test@example.com".into(),
            name: "Test User".into(),
            role: "user".into(),
            plan: "free".into(),
            credits,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }))
    }

    async fn create_job(
        &self,
        user_id: DbId,
        input: &NewGeneration,
    ) -> Result<Generation, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        let generation = Generation {
            id,
            user_id,
            kind: input.kind,
            status: GenerationStatus::Processing,
            title: input.title.clone(),
            prompt: input.prompt.clone(),
            lyrics: input.lyrics.clone(),
            narration: input.narration.clone(),
            voice_id: input.voice_id.clone(),
            style: input.style.clone(),
            duration_secs: input.duration_secs,
            resolution: input.resolution.clone(),
            model: input.model.clone(),
            output_url: None,
            thumbnail_url: None,
            provider_task_id: None,
            error_message: None,
            metadata: None,
            credits_cost: input.credits_cost,
            is_favorite: false,
            is_public: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        state.jobs.insert(id, generation.clone());
        Ok(generation)
    }

    async fn record_provider_task(&self, id: DbId, task_id: &str) -> Result<(), sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        if let Some(job) = state.jobs.get_mut(&id) {
            job.provider_task_id = Some(task_id.to_string());
        }
        Ok(())
    }

    async fn mark_completed(
        &self,
        id: DbId,
        fields: &CompleteGeneration<'_>,
    ) -> Result<(), sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        if let Some(job) = state.jobs.get_mut(&id) {
            job.status = GenerationStatus::Completed;
            job.output_url = Some(fields.output_url.to_string());
            job.thumbnail_url = fields.thumbnail_url.map(str::to_string);
            job.metadata = fields.metadata.map(str::to_string);
            job.error_message = fields.error_message.map(str::to_string);
        }
        Ok(())
    }

    async fn mark_failed(&self, id: DbId, error: &str) -> Result<bool, sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        let Some(job) = state.jobs.get_mut(&id) else {
            return Ok(false);
        };
        if job.status != GenerationStatus::Processing {
            return Ok(false);
        }
        job.status = GenerationStatus::Failed;
        job.error_message = Some(error.to_string());
        Ok(true)
    }

    async fn debit_credits(
        &self,
        _user_id: DbId,
        cost: i32,
        generation_id: DbId,
        _description: &str,
    ) -> Result<(), sqlx::Error> {
        let mut state = self.state.lock().unwrap();
        state.credits -= cost;
        state.debits.push((generation_id, cost));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Scripted provider
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum MusicScript {
    Succeed,
    Fail,
    Crash,
}

struct StubProvider {
    configured: bool,
    music: MusicScript,
}

impl StubProvider {
    fn healthy() -> Arc<Self> {
        Arc::new(Self {
            configured: true,
            music: MusicScript::Succeed,
        })
    }

    fn failing_music() -> Arc<Self> {
        Arc::new(Self {
            configured: true,
            music: MusicScript::Fail,
        })
    }

    fn crashing_music() -> Arc<Self> {
        Arc::new(Self {
            configured: true,
            music: MusicScript::Crash,
        })
    }

    fn unconfigured() -> Arc<Self> {
        Arc::new(Self {
            configured: false,
            music: MusicScript::Succeed,
        })
    }
}

#[async_trait]
impl MediaProvider for StubProvider {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn generate_music(
        &self,
        _prompt: &str,
        _lyrics: &str,
        _format: &str,
        _model: &str,
        _bitrate: i32,
    ) -> Result<MusicPayload, ProviderError> {
        match self.music {
            MusicScript::Succeed => Ok(MusicPayload {
                audio: "https://cdn.example.com/track.mp3".into(),
                extra_info: None,
            }),
            MusicScript::Fail => Err(ProviderError::JobFailed {
                message: "render failed".into(),
            }),
            MusicScript::Crash => panic!("stub provider crash"),
        }
    }

    async fn generate_image(&self, _prompt: &str) -> Result<String, ProviderError> {
        Ok("https://cdn.example.com/cover.png".into())
    }

    async fn generate_video(
        &self,
        _prompt: &str,
        _duration_secs: i32,
        _resolution: &str,
        _model: &str,
    ) -> Result<String, ProviderError> {
        Ok("task-1".into())
    }

    async fn generate_speech(
        &self,
        _text: &str,
        _voice_id: &str,
        _speed: f64,
    ) -> Result<SpeechPayload, ProviderError> {
        Ok(SpeechPayload {
            audio_hex: "49443303".into(),
        })
    }

    async fn wait_for_task(
        &self,
        _task_id: &str,
        _timeout: Duration,
    ) -> Result<TaskOutcome, ProviderError> {
        Ok(TaskOutcome {
            download_url: Some("https://cdn.example.com/clip.mp4".into()),
        })
    }
}

// ---------------------------------------------------------------------------
// Harness helpers
// ---------------------------------------------------------------------------

async fn engine_with(
    store: Arc<MemoryStore>,
    provider: Arc<StubProvider>,
) -> (Engine, UnboundedReceiver<Message>) {
    let ws = Arc::new(WsManager::new());
    let rx = ws.add("test-conn".to_string(), USER_ID).await;
    let engine = Engine::new(
        store,
        ws,
        ListingCache::disabled(),
        provider,
        std::env::temp_dir(),
    );
    (engine, rx)
}

/// Drain job events until the job reaches a terminal state.
async fn terminal_event(rx: &mut UnboundedReceiver<Message>) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for a job event")
            .expect("event channel closed before a terminal event");
        let Message::Text(text) = msg else {
            continue;
        };
        let event: Value = serde_json::from_str(text.as_str()).expect("event is not valid JSON");
        match event["type"].as_str() {
            Some(t) if t == MSG_TYPE_GENERATION_COMPLETED || t == MSG_TYPE_GENERATION_FAILED => {
                return event;
            }
            _ => {}
        }
    }
}

fn music_request() -> MusicRequest {
    MusicRequest {
        title: Some("Test Track".into()),
        prompt: "dreamy synthwave".into(),
        lyrics: "la la la".into(),
        style: None,
        model: None,
        format: None,
        bitrate: None,
    }
}

fn video_request() -> VideoRequest {
    VideoRequest {
        title: None,
        prompt: "a city at dawn".into(),
        narration: None,
        voice_id: None,
        duration: None,
        resolution: None,
        model: None,
    }
}

// ---------------------------------------------------------------------------
// Test: a completed music job is debited exactly once
// ---------------------------------------------------------------------------

#[tokio::test]
async fn completed_music_job_debits_exactly_once() {
    let store = MemoryStore::with_credits(10);
    let (engine, mut rx) = engine_with(Arc::clone(&store), StubProvider::healthy()).await;

    let receipt = engine.submit_music(USER_ID, music_request()).await.unwrap();
    assert!(!receipt.demo);
    assert_eq!(receipt.generation.status, GenerationStatus::Processing);
    let id = receipt.generation.id;

    let event = terminal_event(&mut rx).await;
    assert_eq!(event["type"], MSG_TYPE_GENERATION_COMPLETED);
    assert_eq!(event["generation"]["id"], id);
    assert_eq!(
        event["output_url"].as_str(),
        Some("https://cdn.example.com/track.mp3")
    );

    let job = store.job(id);
    assert_eq!(job.status, GenerationStatus::Completed);
    assert_eq!(
        job.output_url.as_deref(),
        Some("https://cdn.example.com/track.mp3")
    );

    assert_eq!(store.credits(), 9);
    assert_eq!(store.debits(), vec![(id, 1)]);
}

// ---------------------------------------------------------------------------
// Test: a failed job is never charged
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_music_job_is_not_charged() {
    let store = MemoryStore::with_credits(10);
    let (engine, mut rx) = engine_with(Arc::clone(&store), StubProvider::failing_music()).await;

    let receipt = engine.submit_music(USER_ID, music_request()).await.unwrap();
    let id = receipt.generation.id;

    let event = terminal_event(&mut rx).await;
    assert_eq!(event["type"], MSG_TYPE_GENERATION_FAILED);

    let job = store.job(id);
    assert_eq!(job.status, GenerationStatus::Failed);
    assert!(job.error_message.unwrap().contains("render failed"));

    assert_eq!(store.credits(), 10);
    assert!(store.debits().is_empty());
}

// ---------------------------------------------------------------------------
// Test: a panicking pipeline still lands the job in Failed
// ---------------------------------------------------------------------------

#[tokio::test]
async fn panicking_pipeline_fails_the_job_and_notifies() {
    let store = MemoryStore::with_credits(10);
    let (engine, mut rx) = engine_with(Arc::clone(&store), StubProvider::crashing_music()).await;

    let receipt = engine.submit_music(USER_ID, music_request()).await.unwrap();
    let id = receipt.generation.id;

    let event = terminal_event(&mut rx).await;
    assert_eq!(event["type"], MSG_TYPE_GENERATION_FAILED);
    assert_eq!(event["error"], "Generation pipeline crashed");

    let job = store.job(id);
    assert_eq!(job.status, GenerationStatus::Failed);
    assert_eq!(
        job.error_message.as_deref(),
        Some("Generation pipeline crashed")
    );

    assert_eq!(store.credits(), 10);
    assert!(store.debits().is_empty());
}

// ---------------------------------------------------------------------------
// Test: a completed video job records its task handle and costs 2
// ---------------------------------------------------------------------------

#[tokio::test]
async fn completed_video_job_records_task_and_costs_two() {
    let store = MemoryStore::with_credits(10);
    let (engine, mut rx) = engine_with(Arc::clone(&store), StubProvider::healthy()).await;

    let receipt = engine.submit_video(USER_ID, video_request()).await.unwrap();
    let id = receipt.generation.id;

    let event = terminal_event(&mut rx).await;
    assert_eq!(event["type"], MSG_TYPE_GENERATION_COMPLETED);

    let job = store.job(id);
    assert_eq!(job.status, GenerationStatus::Completed);
    assert_eq!(job.provider_task_id.as_deref(), Some("task-1"));
    assert_eq!(
        job.output_url.as_deref(),
        Some("https://cdn.example.com/clip.mp4")
    );

    assert_eq!(store.credits(), 8);
    assert_eq!(store.debits(), vec![(id, 2)]);
}

// ---------------------------------------------------------------------------
// Test: demo mode completes inline and is free
// ---------------------------------------------------------------------------

#[tokio::test]
async fn demo_submission_completes_inline_without_charge() {
    let store = MemoryStore::with_credits(10);
    let (engine, mut rx) = engine_with(Arc::clone(&store), StubProvider::unconfigured()).await;

    let receipt = engine.submit_music(USER_ID, music_request()).await.unwrap();
    assert!(receipt.demo);
    assert_eq!(receipt.generation.status, GenerationStatus::Completed);

    let event = terminal_event(&mut rx).await;
    assert_eq!(event["type"], MSG_TYPE_GENERATION_COMPLETED);

    assert_eq!(store.credits(), 10);
    assert!(store.debits().is_empty());
}

// ---------------------------------------------------------------------------
// Test: submission is rejected up front when credits are short
// ---------------------------------------------------------------------------

#[tokio::test]
async fn broke_user_is_rejected_before_any_job_exists() {
    let store = MemoryStore::with_credits(0);
    let (engine, _rx) = engine_with(Arc::clone(&store), StubProvider::healthy()).await;

    let err = engine
        .submit_music(USER_ID, music_request())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Core(CoreError::InsufficientCredits {
            required: 1,
            available: 0,
        })
    ));

    assert!(store.state.lock().unwrap().jobs.is_empty());
}
