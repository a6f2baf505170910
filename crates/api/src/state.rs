use std::sync::Arc;

use crate::cache::ListingCache;
use crate::config::ServerConfig;
use crate::engine::Engine;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: lumina_db::DbPool,
    /// Server configuration (accessed by middleware and handlers).
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager (browser clients).
    pub ws_manager: Arc<WsManager>,
    /// Redis-backed listing cache.
    pub cache: ListingCache,
    /// Generation pipeline engine (submission + background execution).
    pub engine: Engine,
}
