//! Wire types for the MiniMax HTTP API.

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct AudioSetting {
    pub channel: i32,
    pub sample_rate: i32,
    pub bitrate: i32,
    pub format: String,
}

#[derive(Debug, Serialize)]
pub struct MusicGenerationRequest {
    pub model: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lyrics: Option<String>,
    pub audio_setting: AudioSetting,
}

#[derive(Debug, Serialize)]
pub struct ImageGenerationRequest {
    pub model: String,
    pub prompt: String,
    pub aspect_ratio: String,
}

#[derive(Debug, Serialize)]
pub struct VideoGenerationRequest {
    pub model: String,
    pub prompt: String,
    pub duration: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VoiceSetting {
    pub voice_id: String,
    pub speed: f64,
    pub vol: f64,
    pub pitch: i32,
}

#[derive(Debug, Serialize)]
pub struct SpeechAudioSetting {
    pub sample_rate: i32,
    pub bitrate: i32,
    pub format: String,
}

#[derive(Debug, Serialize)]
pub struct SpeechRequest {
    pub model: String,
    pub text: String,
    pub voice_setting: VoiceSetting,
    pub audio_setting: SpeechAudioSetting,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Response envelope present on every provider reply.
#[derive(Debug, Default, Deserialize)]
pub struct BaseResp {
    #[serde(default)]
    pub status_code: i32,
    #[serde(default)]
    pub status_msg: String,
}

impl BaseResp {
    /// A non-zero status code means the provider rejected the job.
    pub fn check(&self) -> Result<(), ProviderError> {
        if self.status_code != 0 {
            return Err(ProviderError::JobFailed {
                message: self.status_msg.clone(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MusicData {
    #[serde(default)]
    pub audio: String,
}

#[derive(Debug, Deserialize)]
pub struct MusicResponse {
    #[serde(default)]
    pub base_resp: BaseResp,
    #[serde(default)]
    pub data: MusicData,
    #[serde(default)]
    pub extra_info: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ImageData {
    #[serde(default)]
    pub image_urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImageResponse {
    #[serde(default)]
    pub base_resp: BaseResp,
    #[serde(default)]
    pub data: ImageData,
}

#[derive(Debug, Deserialize)]
pub struct VideoResponse {
    #[serde(default)]
    pub base_resp: BaseResp,
    #[serde(default)]
    pub task_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SpeechData {
    #[serde(default)]
    pub audio: String,
}

#[derive(Debug, Deserialize)]
pub struct SpeechResponse {
    #[serde(default)]
    pub base_resp: BaseResp,
    #[serde(default)]
    pub data: SpeechData,
}

#[derive(Debug, Default, Deserialize)]
pub struct FileInfo {
    #[serde(default)]
    pub download_url: String,
}

#[derive(Debug, Deserialize)]
pub struct TaskStatusResponse {
    #[serde(default)]
    pub base_resp: BaseResp,
    #[serde(default)]
    pub status: String,
    /// Indirect file reference; needs one more lookup to resolve a URL.
    #[serde(default)]
    pub file_id: String,
    #[serde(default)]
    pub file: FileInfo,
}

#[derive(Debug, Deserialize)]
pub struct FileRetrieveResponse {
    #[serde(default)]
    pub base_resp: BaseResp,
    #[serde(default)]
    pub file: FileInfo,
}

// ---------------------------------------------------------------------------
// Outputs handed to the pipeline
// ---------------------------------------------------------------------------

/// Result of a music generation call: either a URL or hex-encoded bytes.
#[derive(Debug)]
pub struct MusicPayload {
    pub audio: String,
    pub extra_info: Option<serde_json::Value>,
}

/// Result of a speech synthesis call: hex-encoded mp3 bytes.
#[derive(Debug)]
pub struct SpeechPayload {
    pub audio_hex: String,
}

/// Decode a hex-encoded inline audio payload into raw bytes.
pub fn decode_audio_payload(audio_hex: &str) -> Result<Vec<u8>, ProviderError> {
    Ok(hex::decode(audio_hex)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn non_zero_status_code_is_a_job_failure() {
        let base = BaseResp {
            status_code: 1002,
            status_msg: "rate limited".into(),
        };
        let err = base.check().unwrap_err();
        assert_matches!(err, ProviderError::JobFailed { message } if message == "rate limited");
    }

    #[test]
    fn zero_status_code_passes() {
        assert!(BaseResp::default().check().is_ok());
    }

    #[test]
    fn audio_payload_round_trips_hex() {
        assert_eq!(decode_audio_payload("49443303").unwrap(), b"ID3\x03");
        assert_matches!(
            decode_audio_payload("not hex"),
            Err(ProviderError::Decode(_))
        );
    }
}
