/// Errors from the generation provider layer.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// No API key configured; callers should have checked `is_configured`.
    #[error("provider API key is not configured")]
    NotConfigured,

    /// The HTTP request itself failed (network, DNS, TLS, body decode).
    #[error("provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider accepted the request but reported a failure: either a
    /// non-zero status code in the response envelope, or a task that
    /// reached a terminal failure state.
    #[error("provider job failed: {message}")]
    JobFailed { message: String },

    /// The poll deadline elapsed without the task reaching a terminal state.
    #[error("timed out waiting for provider task")]
    Timeout,

    /// An inline audio payload was not valid hex.
    #[error("failed to decode audio payload: {0}")]
    Decode(#[from] hex::FromHexError),

    /// ffmpeg exited non-zero while combining video and audio.
    #[error("ffmpeg encoding failed: {stderr}")]
    EncodingFailed { stderr: String },

    /// Local file I/O during download or mux.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
