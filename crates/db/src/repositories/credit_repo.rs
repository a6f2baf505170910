//! Repository for the append-only credit ledger.

use lumina_core::types::DbId;
use sqlx::PgPool;

use crate::models::credit::{CreditTransaction, NewCreditEntry};

/// Column list for `credit_transactions` queries.
const COLUMNS: &str = "\
    id, user_id, amount, reason, description, generation_id, \
    balance_before, balance_after, created_at";

/// Ledgered credit debits. Every balance change goes through here so the
/// `balance_after = balance_before + amount` invariant holds for all rows.
pub struct CreditRepo;

impl CreditRepo {
    /// Atomically debit a completed generation's cost.
    ///
    /// Re-reads the live balance under `SELECT ... FOR UPDATE` so two jobs
    /// completing at once for the same user cannot both observe the same
    /// stale balance. The balance update and the ledger append commit in
    /// one transaction. Never called for a failed job.
    pub async fn debit_for_generation(
        pool: &PgPool,
        user_id: DbId,
        cost: i32,
        generation_id: DbId,
        description: &str,
    ) -> Result<CreditTransaction, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let balance: i32 =
            sqlx::query_scalar("SELECT credits FROM users WHERE id = $1 FOR UPDATE")
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await?;

        sqlx::query("UPDATE users SET credits = credits - $2, updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .bind(cost)
            .execute(&mut *tx)
            .await?;

        let entry = NewCreditEntry::debit(
            cost,
            lumina_core::credits::REASON_USAGE,
            description,
            Some(generation_id),
            balance,
        );

        let query = format!(
            "INSERT INTO credit_transactions \
                 (user_id, amount, reason, description, generation_id, \
                  balance_before, balance_after) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, CreditTransaction>(&query)
            .bind(user_id)
            .bind(entry.amount)
            .bind(&entry.reason)
            .bind(&entry.description)
            .bind(entry.generation_id)
            .bind(entry.balance_before)
            .bind(entry.balance_after)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(
            user_id,
            generation_id,
            amount = row.amount,
            balance_after = row.balance_after,
            "Credit debit committed",
        );

        Ok(row)
    }
}
