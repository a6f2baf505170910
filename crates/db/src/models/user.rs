use lumina_core::types::{DbId, Timestamp};
use serde::Serialize;

/// A platform user. Only `id`, `name`, and `credits` are touched by the
/// generation engine; the rest is owned by the (out-of-scope) account
/// management surface.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: DbId,
    pub email: String,
    pub name: String,
    pub role: String,
    pub plan: String,
    pub credits: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
