//! Credit ledger entries.

use lumina_core::types::{DbId, Timestamp};
use serde::Serialize;

/// One immutable credit balance change, always tied to a cause.
///
/// Invariant: `balance_after = balance_before + amount`; a user's live
/// balance equals the `balance_after` of their most recent entry.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CreditTransaction {
    pub id: DbId,
    pub user_id: DbId,
    pub amount: i32,
    pub reason: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_id: Option<DbId>,
    pub balance_before: i32,
    pub balance_after: i32,
    pub created_at: Timestamp,
}

/// Insert payload for a ledger entry. Construct via [`NewCreditEntry::debit`]
/// so the balance arithmetic cannot drift from the invariant.
#[derive(Debug, Clone)]
pub struct NewCreditEntry {
    pub amount: i32,
    pub reason: String,
    pub description: String,
    pub generation_id: Option<DbId>,
    pub balance_before: i32,
    pub balance_after: i32,
}

impl NewCreditEntry {
    /// A debit of `cost` credits against a known prior balance.
    pub fn debit(
        cost: i32,
        reason: &str,
        description: &str,
        generation_id: Option<DbId>,
        balance_before: i32,
    ) -> Self {
        let amount = -cost;
        Self {
            amount,
            reason: reason.to_string(),
            description: description.to_string(),
            generation_id,
            balance_before,
            balance_after: balance_before + amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debit_entry_satisfies_balance_invariant() {
        let entry = NewCreditEntry::debit(3, "usage", "Video generation", Some(7), 10);
        assert_eq!(entry.amount, -3);
        assert_eq!(entry.balance_before, 10);
        assert_eq!(entry.balance_after, 7);
        assert_eq!(entry.balance_after, entry.balance_before + entry.amount);
    }
}
