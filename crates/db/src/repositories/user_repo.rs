use lumina_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::User;

/// Column list for `users` queries.
const COLUMNS: &str = "id, email, name, role, plan, credits, created_at, updated_at";

/// Read access to user accounts. Account mutation lives outside the
/// generation core; the engine only reads balances and identities.
pub struct UserRepo;

impl UserRepo {
    /// Find a user by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
