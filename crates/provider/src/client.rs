//! REST client for the MiniMax generation endpoints.
//!
//! Wraps music, image, video, speech, task-status, and file-retrieval
//! calls using [`reqwest`]. An empty API key puts the client in
//! unconfigured (demo) mode; callers check [`MiniMaxClient::is_configured`]
//! before launching a pipeline.

use lumina_core::video;

use crate::error::ProviderError;
use crate::types::{
    AudioSetting, FileRetrieveResponse, ImageGenerationRequest, ImageResponse,
    MusicGenerationRequest, MusicPayload, MusicResponse, SpeechAudioSetting, SpeechPayload,
    SpeechRequest, SpeechResponse, TaskStatusResponse, VideoGenerationRequest, VideoResponse,
    VoiceSetting,
};

/// Production API host.
const DEFAULT_BASE_URL: &str = "https://api.minimaxi.chat/v1";

/// Image model used for cover art.
const IMAGE_MODEL: &str = "image-01";

/// TTS model used for narration voiceovers.
const SPEECH_MODEL: &str = "speech-01-turbo";

/// Default narrator voice when the request does not choose one.
const DEFAULT_VOICE_ID: &str = "male-qn-qingse";

/// HTTP client for the MiniMax API.
pub struct MiniMaxClient {
    http: reqwest::Client,
    api_key: String,
    group_id: String,
    base_url: String,
}

impl MiniMaxClient {
    /// Create a client. An empty `api_key` yields an unconfigured client.
    pub fn new(api_key: String, group_id: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            group_id,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Override the API host (tests, staging).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Whether an API key is present. When false, submissions run in demo
    /// mode and never reach the network.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Generate a music track. Returns either a direct URL or hex-encoded
    /// audio bytes in [`MusicPayload::audio`].
    pub async fn generate_music(
        &self,
        prompt: &str,
        lyrics: &str,
        format: &str,
        model: &str,
        bitrate: i32,
    ) -> Result<MusicPayload, ProviderError> {
        self.require_configured()?;

        let body = MusicGenerationRequest {
            model: model.to_string(),
            prompt: prompt.to_string(),
            lyrics: if lyrics.is_empty() {
                None
            } else {
                Some(lyrics.to_string())
            },
            audio_setting: AudioSetting {
                channel: 2,
                sample_rate: 44100,
                bitrate,
                format: format.to_string(),
            },
        };

        let response: MusicResponse = self
            .http
            .post(format!("{}/music_generation", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;
        response.base_resp.check()?;

        Ok(MusicPayload {
            audio: response.data.audio,
            extra_info: response.extra_info,
        })
    }

    /// Generate a single square image and return its URL.
    pub async fn generate_image(&self, prompt: &str) -> Result<String, ProviderError> {
        self.require_configured()?;

        let body = ImageGenerationRequest {
            model: IMAGE_MODEL.to_string(),
            prompt: prompt.to_string(),
            aspect_ratio: "1:1".to_string(),
        };

        let response: ImageResponse = self
            .http
            .post(format!(
                "{}/image_generation?GroupId={}",
                self.base_url, self.group_id
            ))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;
        response.base_resp.check()?;

        response
            .data
            .image_urls
            .into_iter()
            .next()
            .ok_or(ProviderError::JobFailed {
                message: "no image generated".to_string(),
            })
    }

    /// Start a video generation task and return its task handle.
    ///
    /// Duration and resolution are clamped to what the model supports; see
    /// [`lumina_core::video::clamp_video_params`].
    pub async fn generate_video(
        &self,
        prompt: &str,
        duration_secs: i32,
        resolution: &str,
        model: &str,
    ) -> Result<String, ProviderError> {
        self.require_configured()?;

        let model = if model.is_empty() {
            video::DEFAULT_MODEL
        } else {
            model
        };
        let params = video::clamp_video_params(model, duration_secs, resolution);

        tracing::info!(
            model,
            duration_secs = params.duration_secs,
            resolution = params.resolution.as_deref().unwrap_or("-"),
            "Submitting video generation",
        );

        let body = VideoGenerationRequest {
            model: model.to_string(),
            prompt: prompt.to_string(),
            duration: params.duration_secs,
            resolution: params.resolution,
        };

        let response: VideoResponse = self
            .http
            .post(format!(
                "{}/video_generation?GroupId={}",
                self.base_url, self.group_id
            ))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;
        response.base_resp.check()?;

        Ok(response.task_id)
    }

    /// Synthesize narration audio at the given playback speed.
    ///
    /// Speed is clamped to the provider's accepted 0.5..=2.0 range; an
    /// empty voice id falls back to the default narrator.
    pub async fn generate_speech(
        &self,
        text: &str,
        voice_id: &str,
        speed: f64,
    ) -> Result<SpeechPayload, ProviderError> {
        self.require_configured()?;

        let voice_id = if voice_id.is_empty() {
            DEFAULT_VOICE_ID
        } else {
            voice_id
        };
        let speed = speed.clamp(0.5, 2.0);

        tracing::info!(speed, text_len = text.len(), "Synthesizing narration");

        let body = SpeechRequest {
            model: SPEECH_MODEL.to_string(),
            text: text.to_string(),
            voice_setting: VoiceSetting {
                voice_id: voice_id.to_string(),
                speed,
                vol: 1.0,
                pitch: 0,
            },
            audio_setting: SpeechAudioSetting {
                sample_rate: 32000,
                bitrate: 128000,
                format: "mp3".to_string(),
            },
        };

        let response: SpeechResponse = self
            .http
            .post(format!("{}/t2a_v2?GroupId={}", self.base_url, self.group_id))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;
        response.base_resp.check()?;

        Ok(SpeechPayload {
            audio_hex: response.data.audio,
        })
    }

    /// Query the status of a video generation task.
    pub async fn get_task_status(
        &self,
        task_id: &str,
    ) -> Result<TaskStatusResponse, ProviderError> {
        self.require_configured()?;

        let response: TaskStatusResponse = self
            .http
            .get(format!(
                "{}/query/video_generation?task_id={}",
                self.base_url, task_id
            ))
            .bearer_auth(&self.api_key)
            .send()
            .await?
            .json()
            .await?;
        response.base_resp.check()?;

        Ok(response)
    }

    /// Resolve an indirect file id into a download URL.
    pub async fn retrieve_file_url(&self, file_id: &str) -> Result<String, ProviderError> {
        self.require_configured()?;

        let response: FileRetrieveResponse = self
            .http
            .get(format!(
                "{}/files/retrieve?file_id={}",
                self.base_url, file_id
            ))
            .bearer_auth(&self.api_key)
            .send()
            .await?
            .json()
            .await?;
        response.base_resp.check()?;

        Ok(response.file.download_url)
    }

    fn require_configured(&self) -> Result<(), ProviderError> {
        if !self.is_configured() {
            return Err(ProviderError::NotConfigured);
        }
        Ok(())
    }
}
