use std::path::PathBuf;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT token configuration (secret, validation).
    pub jwt: JwtConfig,
    /// Provider API key. Empty means demo mode: submissions complete
    /// immediately with placeholder outputs and never reach the network.
    pub minimax_api_key: String,
    /// Provider group id, appended to image/video/speech endpoints.
    pub minimax_group_id: String,
    /// Redis URL for the listing cache. Absent means caching is disabled.
    pub redis_url: Option<String>,
    /// Root directory for locally stored generation outputs
    /// (default: `./uploads`).
    pub upload_path: PathBuf,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `MINIMAX_API_KEY`      | `` (demo mode)             |
    /// | `MINIMAX_GROUP_ID`     | ``                         |
    /// | `REDIS_URL`            | unset (cache disabled)     |
    /// | `UPLOAD_PATH`          | `./uploads`                |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let jwt = JwtConfig::from_env();

        let minimax_api_key = std::env::var("MINIMAX_API_KEY").unwrap_or_default();
        let minimax_group_id = std::env::var("MINIMAX_GROUP_ID").unwrap_or_default();

        let redis_url = std::env::var("REDIS_URL").ok().filter(|s| !s.is_empty());

        let upload_path =
            PathBuf::from(std::env::var("UPLOAD_PATH").unwrap_or_else(|_| "./uploads".into()));

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt,
            minimax_api_key,
            minimax_group_id,
            redis_url,
            upload_path,
        }
    }
}
