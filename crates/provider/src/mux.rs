//! Combine a rendered video with a narration track via ffmpeg.

use std::path::{Path, PathBuf};

use crate::error::ProviderError;
use crate::types::decode_audio_payload;

/// Download `video_url`, decode the hex `audio_hex` payload, and mux them
/// into `output_path` (video stream copied, audio re-encoded to AAC,
/// trimmed to the shorter input).
///
/// Temp files live in a per-invocation directory under the system temp
/// root and are removed on the way out, success or failure.
pub async fn combine_video_with_audio(
    video_url: &str,
    audio_hex: &str,
    output_path: &Path,
) -> Result<(), ProviderError> {
    let temp_dir = std::env::temp_dir().join(format!("lumina_mux_{}", uuid::Uuid::new_v4()));
    tokio::fs::create_dir_all(&temp_dir).await?;

    let result = mux_in(&temp_dir, video_url, audio_hex, output_path).await;

    if let Err(e) = tokio::fs::remove_dir_all(&temp_dir).await {
        tracing::warn!(path = %temp_dir.display(), error = %e, "Failed to clean mux temp dir");
    }

    result
}

async fn mux_in(
    temp_dir: &PathBuf,
    video_url: &str,
    audio_hex: &str,
    output_path: &Path,
) -> Result<(), ProviderError> {
    let video_path = temp_dir.join("video.mp4");
    let video_bytes = reqwest::get(video_url).await?.bytes().await?;
    tokio::fs::write(&video_path, &video_bytes).await?;

    let audio_path = temp_dir.join("audio.mp3");
    let audio_bytes = decode_audio_payload(audio_hex)?;
    tokio::fs::write(&audio_path, &audio_bytes).await?;

    if let Some(parent) = output_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let output = tokio::process::Command::new("ffmpeg")
        .arg("-y")
        .arg("-i")
        .arg(&video_path)
        .arg("-i")
        .arg(&audio_path)
        .args(["-c:v", "copy", "-c:a", "aac", "-shortest"])
        .arg(output_path)
        .output()
        .await?;

    if !output.status.success() {
        return Err(ProviderError::EncodingFailed {
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    Ok(())
}
