//! Redis-backed cache for generation listings.
//!
//! Listing pages are cached briefly so history polling does not hammer the
//! database; any mutation to a user's job set invalidates every cached page
//! for that user via a key-pattern scan. The cache is strictly an
//! accelerator: when Redis is unreachable or unconfigured every operation
//! degrades to a no-op and reads fall through to the database.

use lumina_core::types::DbId;
use lumina_db::models::generation::GenerationListQuery;
use lumina_db::repositories::page_bounds;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// How long a cached listing page stays valid.
pub const LISTING_TTL_SECS: u64 = 30;

/// Shared cache handle. Cheap to clone; `None` means caching is disabled.
#[derive(Clone)]
pub struct ListingCache {
    conn: Option<ConnectionManager>,
}

impl ListingCache {
    /// Connect to Redis. A missing URL or a failed connection yields a
    /// disabled cache rather than an error.
    pub async fn connect(redis_url: Option<&str>) -> Self {
        let Some(url) = redis_url else {
            tracing::info!("REDIS_URL not set; listing cache disabled");
            return Self::disabled();
        };

        let client = match redis::Client::open(url) {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid Redis URL; listing cache disabled");
                return Self::disabled();
            }
        };

        match client.get_connection_manager().await {
            Ok(conn) => {
                tracing::info!("Connected to Redis for listing cache");
                Self { conn: Some(conn) }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Redis unreachable; listing cache disabled");
                Self::disabled()
            }
        }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self { conn: None }
    }

    /// Cache key for one page of a user's listing. Filter values are part
    /// of the key so different filter combinations never collide, and
    /// page/limit are normalised the same way the query itself clamps them
    /// so equivalent requests share one entry.
    pub fn listing_key(user_id: DbId, params: &GenerationListQuery) -> String {
        let (limit, offset) = page_bounds(params.page, params.limit);
        let page = offset / limit + 1;
        format!(
            "generations:{}:{}:{}:{}:{}",
            user_id,
            page,
            limit,
            params.kind.map(|k| k.as_str()).unwrap_or("all"),
            params.status.map(|s| s.as_str()).unwrap_or("all"),
        )
    }

    /// Fetch and deserialize a cached value. Any miss, error, or decode
    /// failure reads as a plain miss.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut conn = self.conn.clone()?;

        let raw: Option<String> = match conn.get(key).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!(key, error = %e, "Cache read failed");
                return None;
            }
        };

        raw.and_then(|raw| serde_json::from_str(&raw).ok())
    }

    /// Serialize and store a value with a TTL. Failures are logged and
    /// otherwise ignored.
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl_secs: u64) {
        let Some(mut conn) = self.conn.clone() else {
            return;
        };

        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!(key, error = %e, "Cache serialization failed");
                return;
            }
        };

        if let Err(e) = conn.set_ex::<_, _, ()>(key, raw, ttl_secs).await {
            tracing::debug!(key, error = %e, "Cache write failed");
        }
    }

    /// Drop every cached listing page for a user.
    pub async fn invalidate_user(&self, user_id: DbId) {
        let Some(mut conn) = self.conn.clone() else {
            return;
        };

        let pattern = format!("generations:{user_id}:*");
        let keys: Vec<String> = {
            let mut iter = match conn.scan_match::<_, String>(&pattern).await {
                Ok(iter) => iter,
                Err(e) => {
                    tracing::debug!(user_id, error = %e, "Cache scan failed");
                    return;
                }
            };
            let mut keys = Vec::new();
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
            keys
        };

        if keys.is_empty() {
            return;
        }

        if let Err(e) = conn.del::<_, ()>(&keys).await {
            tracing::debug!(user_id, error = %e, "Cache invalidation failed");
        } else {
            tracing::debug!(user_id, count = keys.len(), "Invalidated cached listings");
        }
    }
}
