//! Unit tests for `WsManager`.
//!
//! These tests exercise the WebSocket connection manager directly, without
//! performing any HTTP upgrades. They verify add/remove semantics,
//! per-user delivery, and graceful shutdown behaviour.

use axum::extract::ws::Message;
use lumina_api::ws::WsManager;

fn text(s: &str) -> Message {
    Message::Text(s.to_string().into())
}

// ---------------------------------------------------------------------------
// Test: new manager starts with zero connections
// ---------------------------------------------------------------------------

#[tokio::test]
async fn new_manager_has_zero_connections() {
    let manager = WsManager::new();

    assert_eq!(manager.connection_count().await, 0);
}

// ---------------------------------------------------------------------------
// Test: add() / remove() track the connection count
// ---------------------------------------------------------------------------

#[tokio::test]
async fn add_and_remove_track_connection_count() {
    let manager = WsManager::new();

    let _rx = manager.add("conn-1".to_string(), 1).await;
    assert_eq!(manager.connection_count().await, 1);

    manager.remove("conn-1").await;
    assert_eq!(manager.connection_count().await, 0);
}

// ---------------------------------------------------------------------------
// Test: remove() with unknown ID is a no-op
// ---------------------------------------------------------------------------

#[tokio::test]
async fn remove_unknown_id_is_noop() {
    let manager = WsManager::new();

    let _rx = manager.add("conn-1".to_string(), 1).await;
    manager.remove("nonexistent").await;

    assert_eq!(manager.connection_count().await, 1);
}

// ---------------------------------------------------------------------------
// Test: send_to_user() reaches every connection of that user, nobody else
// ---------------------------------------------------------------------------

#[tokio::test]
async fn send_to_user_reaches_all_of_that_users_connections() {
    let manager = WsManager::new();

    let mut rx_a1 = manager.add("a-1".to_string(), 7).await;
    let mut rx_a2 = manager.add("a-2".to_string(), 7).await;
    let mut rx_b = manager.add("b-1".to_string(), 8).await;

    let sent = manager.send_to_user(7, text("job done")).await;
    assert_eq!(sent, 2);

    assert_eq!(rx_a1.recv().await, Some(text("job done")));
    assert_eq!(rx_a2.recv().await, Some(text("job done")));
    assert!(rx_b.try_recv().is_err(), "other users must not receive");
}

// ---------------------------------------------------------------------------
// Test: send_to_user() with no connections sends nothing and does not error
// ---------------------------------------------------------------------------

#[tokio::test]
async fn send_to_offline_user_is_silently_dropped() {
    let manager = WsManager::new();

    let _rx = manager.add("a-1".to_string(), 7).await;

    let sent = manager.send_to_user(99, text("nobody home")).await;
    assert_eq!(sent, 0);
}

// ---------------------------------------------------------------------------
// Test: a dropped receiver does not block delivery to live connections
// ---------------------------------------------------------------------------

#[tokio::test]
async fn dead_connection_does_not_block_others() {
    let manager = WsManager::new();

    let rx_dead = manager.add("dead".to_string(), 7).await;
    let mut rx_live = manager.add("live".to_string(), 7).await;

    // Simulate a disconnected client whose cleanup has not run yet.
    drop(rx_dead);

    manager.send_to_user(7, text("still here")).await;
    assert_eq!(rx_live.recv().await, Some(text("still here")));
}

// ---------------------------------------------------------------------------
// Test: sweep_closed() drops dead connections and keeps live ones
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sweep_closed_drops_only_dead_connections() {
    let manager = WsManager::new();

    let rx_dead = manager.add("dead".to_string(), 7).await;
    let mut rx_live = manager.add("live".to_string(), 7).await;
    drop(rx_dead);

    let dropped = manager.sweep_closed().await;
    assert_eq!(dropped, 1);
    assert_eq!(manager.connection_count().await, 1);

    // The surviving connection still receives.
    let sent = manager.send_to_user(7, text("after sweep")).await;
    assert_eq!(sent, 1);
    assert_eq!(rx_live.recv().await, Some(text("after sweep")));

    // A second sweep finds nothing to do.
    assert_eq!(manager.sweep_closed().await, 0);
}

// ---------------------------------------------------------------------------
// Test: shutdown_all() sends Close and clears all connections
// ---------------------------------------------------------------------------

#[tokio::test]
async fn shutdown_all_sends_close_and_clears() {
    let manager = WsManager::new();

    let mut rx1 = manager.add("conn-1".to_string(), 1).await;
    let mut rx2 = manager.add("conn-2".to_string(), 2).await;
    assert_eq!(manager.connection_count().await, 2);

    manager.shutdown_all().await;

    // Connection count should be zero after shutdown.
    assert_eq!(manager.connection_count().await, 0);

    // Both receivers should have received a Close message.
    assert!(matches!(rx1.recv().await, Some(Message::Close(None))));
    assert!(matches!(rx2.recv().await, Some(Message::Close(None))));
}
