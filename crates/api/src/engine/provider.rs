//! Provider seam for the pipelines.

use std::time::Duration;

use async_trait::async_trait;
use lumina_provider::poller::{self, TaskOutcome};
use lumina_provider::types::{MusicPayload, SpeechPayload};
use lumina_provider::{MiniMaxClient, ProviderError};

/// The generation provider as the pipelines consume it. Implemented by
/// [`MiniMaxClient`]; stub implementations drive the engine tests.
#[async_trait]
pub trait MediaProvider: Send + Sync {
    /// Whether an API key is present. When false, submissions run in demo
    /// mode and never reach the network.
    fn is_configured(&self) -> bool;

    async fn generate_music(
        &self,
        prompt: &str,
        lyrics: &str,
        format: &str,
        model: &str,
        bitrate: i32,
    ) -> Result<MusicPayload, ProviderError>;

    async fn generate_image(&self, prompt: &str) -> Result<String, ProviderError>;

    async fn generate_video(
        &self,
        prompt: &str,
        duration_secs: i32,
        resolution: &str,
        model: &str,
    ) -> Result<String, ProviderError>;

    async fn generate_speech(
        &self,
        text: &str,
        voice_id: &str,
        speed: f64,
    ) -> Result<SpeechPayload, ProviderError>;

    /// Poll a submitted task to completion and resolve its download URL.
    async fn wait_for_task(
        &self,
        task_id: &str,
        timeout: Duration,
    ) -> Result<TaskOutcome, ProviderError>;
}

#[async_trait]
impl MediaProvider for MiniMaxClient {
    fn is_configured(&self) -> bool {
        MiniMaxClient::is_configured(self)
    }

    async fn generate_music(
        &self,
        prompt: &str,
        lyrics: &str,
        format: &str,
        model: &str,
        bitrate: i32,
    ) -> Result<MusicPayload, ProviderError> {
        MiniMaxClient::generate_music(self, prompt, lyrics, format, model, bitrate).await
    }

    async fn generate_image(&self, prompt: &str) -> Result<String, ProviderError> {
        MiniMaxClient::generate_image(self, prompt).await
    }

    async fn generate_video(
        &self,
        prompt: &str,
        duration_secs: i32,
        resolution: &str,
        model: &str,
    ) -> Result<String, ProviderError> {
        MiniMaxClient::generate_video(self, prompt, duration_secs, resolution, model).await
    }

    async fn generate_speech(
        &self,
        text: &str,
        voice_id: &str,
        speed: f64,
    ) -> Result<SpeechPayload, ProviderError> {
        MiniMaxClient::generate_speech(self, text, voice_id, speed).await
    }

    async fn wait_for_task(
        &self,
        task_id: &str,
        timeout: Duration,
    ) -> Result<TaskOutcome, ProviderError> {
        poller::wait_for_completion(self, task_id, timeout).await
    }
}
