//! Persistence seam for the pipelines.
//!
//! The engine only ever touches the database through [`JobStore`], so
//! pipeline behaviour (terminal transitions, debit-on-delivery) can be
//! tested against an in-memory store.

use async_trait::async_trait;
use lumina_core::types::DbId;
use lumina_db::models::generation::{Generation, NewGeneration};
use lumina_db::models::user::User;
use lumina_db::repositories::{CompleteGeneration, CreditRepo, GenerationRepo, UserRepo};
use lumina_db::DbPool;

/// Job persistence as the engine consumes it. Implemented by [`PgStore`];
/// an in-memory stub drives the engine tests.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn find_user(&self, id: DbId) -> Result<Option<User>, sqlx::Error>;

    async fn create_job(
        &self,
        user_id: DbId,
        input: &NewGeneration,
    ) -> Result<Generation, sqlx::Error>;

    async fn record_provider_task(&self, id: DbId, task_id: &str) -> Result<(), sqlx::Error>;

    async fn mark_completed(
        &self,
        id: DbId,
        fields: &CompleteGeneration<'_>,
    ) -> Result<(), sqlx::Error>;

    /// Transition a `Processing` job to `Failed`. Returns whether the row
    /// transitioned; already-terminal rows are left untouched.
    async fn mark_failed(&self, id: DbId, error: &str) -> Result<bool, sqlx::Error>;

    /// Debit a completed job's cost against its owner's balance, with a
    /// matching ledger entry.
    async fn debit_credits(
        &self,
        user_id: DbId,
        cost: i32,
        generation_id: DbId,
        description: &str,
    ) -> Result<(), sqlx::Error>;
}

/// The production store: thin delegation to the sqlx repositories.
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgStore {
    async fn find_user(&self, id: DbId) -> Result<Option<User>, sqlx::Error> {
        UserRepo::find_by_id(&self.pool, id).await
    }

    async fn create_job(
        &self,
        user_id: DbId,
        input: &NewGeneration,
    ) -> Result<Generation, sqlx::Error> {
        GenerationRepo::create(&self.pool, user_id, input).await
    }

    async fn record_provider_task(&self, id: DbId, task_id: &str) -> Result<(), sqlx::Error> {
        GenerationRepo::set_provider_task(&self.pool, id, task_id).await
    }

    async fn mark_completed(
        &self,
        id: DbId,
        fields: &CompleteGeneration<'_>,
    ) -> Result<(), sqlx::Error> {
        GenerationRepo::complete(&self.pool, id, fields).await
    }

    async fn mark_failed(&self, id: DbId, error: &str) -> Result<bool, sqlx::Error> {
        GenerationRepo::fail(&self.pool, id, error).await
    }

    async fn debit_credits(
        &self,
        user_id: DbId,
        cost: i32,
        generation_id: DbId,
        description: &str,
    ) -> Result<(), sqlx::Error> {
        CreditRepo::debit_for_generation(&self.pool, user_id, cost, generation_id, description)
            .await?;
        Ok(())
    }
}
