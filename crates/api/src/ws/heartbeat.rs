//! Keepalive and stale-connection sweeping for the notification hub.

use std::sync::Arc;
use std::time::Duration;

use crate::ws::manager::WsManager;

/// Interval between keepalive sweeps.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Spawn the hub keepalive task.
///
/// Every tick it pings all connected clients and then drops connections
/// whose channels have gone dead, so per-user fan-out never wastes sends
/// on sockets that already vanished. Runs until aborted via the returned
/// handle (shutdown path).
pub fn start_heartbeat(ws_manager: Arc<WsManager>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(HEARTBEAT_INTERVAL);

        loop {
            interval.tick().await;
            ws_manager.ping_all().await;

            let dropped = ws_manager.sweep_closed().await;
            let remaining = ws_manager.connection_count().await;
            if dropped > 0 {
                tracing::info!(dropped, remaining, "Swept dead WebSocket connections");
            } else {
                tracing::debug!(remaining, "WebSocket heartbeat ping");
            }
        }
    })
}
