//! HTTP client for the MiniMax generation provider, plus the task poller
//! and the ffmpeg mux helper used by the video pipeline.

pub mod client;
pub mod error;
pub mod mux;
pub mod poller;
pub mod types;

pub use client::MiniMaxClient;
pub use error::ProviderError;
