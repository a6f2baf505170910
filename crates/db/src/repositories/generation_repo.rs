//! Repository for the `generations` table.
//!
//! Status transitions are driven exclusively by the pipeline engine:
//! rows are created in `Processing` and move once to `Completed` or
//! `Failed`. Terminal states are never re-entered.

use lumina_core::types::DbId;
use sqlx::PgPool;

use crate::models::generation::{
    Generation, GenerationKind, GenerationListQuery, GenerationStatus, NewGeneration,
    PublicGeneration,
};

/// Column list for `generations` queries.
const COLUMNS: &str = "\
    id, user_id, kind, status, title, prompt, lyrics, narration, voice_id, \
    style, duration_secs, resolution, model, output_url, thumbnail_url, \
    provider_task_id, error_message, metadata, credits_cost, \
    is_favorite, is_public, created_at, updated_at";

/// Maximum page size for listings.
const MAX_LIMIT: i64 = 100;

/// Default page size for listings.
const DEFAULT_LIMIT: i64 = 20;

/// Fields written when a job reaches `Completed`.
#[derive(Debug, Clone)]
pub struct CompleteGeneration<'a> {
    pub output_url: &'a str,
    pub thumbnail_url: Option<&'a str>,
    pub metadata: Option<&'a str>,
    /// Non-fatal error recorded during a degraded completion (e.g. the
    /// voiceover step failed but the silent video was kept).
    pub error_message: Option<&'a str>,
}

/// CRUD and state transitions for generation jobs.
pub struct GenerationRepo;

impl GenerationRepo {
    /// Create a job directly in `Processing` status with its cost fixed.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        input: &NewGeneration,
    ) -> Result<Generation, sqlx::Error> {
        let query = format!(
            "INSERT INTO generations \
                 (user_id, kind, status, title, prompt, lyrics, narration, voice_id, \
                  style, duration_secs, resolution, model, credits_cost) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Generation>(&query)
            .bind(user_id)
            .bind(input.kind)
            .bind(GenerationStatus::Processing)
            .bind(&input.title)
            .bind(&input.prompt)
            .bind(&input.lyrics)
            .bind(&input.narration)
            .bind(&input.voice_id)
            .bind(&input.style)
            .bind(input.duration_secs)
            .bind(&input.resolution)
            .bind(&input.model)
            .bind(input.credits_cost)
            .fetch_one(pool)
            .await
    }

    /// Find a job owned by the given user.
    pub async fn find_by_id_for_user(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<Generation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM generations WHERE id = $1 AND user_id = $2");
        sqlx::query_as::<_, Generation>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's jobs, newest first, with optional kind/status filters.
    /// Returns the page plus the total match count for pagination.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        params: &GenerationListQuery,
    ) -> Result<(Vec<Generation>, i64), sqlx::Error> {
        let (limit, offset) = page_bounds(params.page, params.limit);

        let mut conditions = vec!["user_id = $1".to_string()];
        let mut bind_idx: u32 = 2;

        if params.kind.is_some() {
            conditions.push(format!("kind = ${bind_idx}"));
            bind_idx += 1;
        }
        if params.status.is_some() {
            conditions.push(format!("status = ${bind_idx}"));
            bind_idx += 1;
        }

        let where_clause = conditions.join(" AND ");

        let count_query = format!("SELECT COUNT(*) FROM generations WHERE {where_clause}");
        let mut cq = sqlx::query_scalar::<_, i64>(&count_query).bind(user_id);
        if let Some(kind) = params.kind {
            cq = cq.bind(kind);
        }
        if let Some(status) = params.status {
            cq = cq.bind(status);
        }
        let total = cq.fetch_one(pool).await?;

        let query = format!(
            "SELECT {COLUMNS} FROM generations \
             WHERE {where_clause} \
             ORDER BY created_at DESC \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1,
        );
        let mut q = sqlx::query_as::<_, Generation>(&query).bind(user_id);
        if let Some(kind) = params.kind {
            q = q.bind(kind);
        }
        if let Some(status) = params.status {
            q = q.bind(status);
        }
        let rows = q.bind(limit).bind(offset).fetch_all(pool).await?;

        Ok((rows, total))
    }

    /// List completed public jobs with their creator's name, newest first.
    pub async fn list_public(
        pool: &PgPool,
        kind: Option<GenerationKind>,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<(Vec<PublicGeneration>, i64), sqlx::Error> {
        let (limit, offset) = page_bounds(page, limit);

        let kind_clause = if kind.is_some() { " AND g.kind = $1" } else { "" };

        let count_query = format!(
            "SELECT COUNT(*) FROM generations g \
             WHERE g.is_public AND g.status = 'completed'{kind_clause}"
        );
        let mut cq = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(kind) = kind {
            cq = cq.bind(kind);
        }
        let total = cq.fetch_one(pool).await?;

        let (limit_idx, offset_idx) = if kind.is_some() { (2, 3) } else { (1, 2) };
        let query = format!(
            "SELECT g.id, g.kind, g.title, g.style, g.lyrics, g.duration_secs, \
                    g.output_url, g.thumbnail_url, u.name AS creator_name, g.created_at \
             FROM generations g \
             JOIN users u ON u.id = g.user_id \
             WHERE g.is_public AND g.status = 'completed'{kind_clause} \
             ORDER BY g.created_at DESC \
             LIMIT ${limit_idx} OFFSET ${offset_idx}"
        );
        let mut q = sqlx::query_as::<_, PublicGeneration>(&query);
        if let Some(kind) = kind {
            q = q.bind(kind);
        }
        let rows = q.bind(limit).bind(offset).fetch_all(pool).await?;

        Ok((rows, total))
    }

    /// Record the provider's task handle as soon as it is known, so a job
    /// interrupted mid-poll still carries its external reference.
    pub async fn set_provider_task(
        pool: &PgPool,
        id: DbId,
        task_id: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE generations SET provider_task_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(task_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Transition a job to `Completed` with its output references.
    pub async fn complete(
        pool: &PgPool,
        id: DbId,
        fields: &CompleteGeneration<'_>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE generations \
             SET status = $2, output_url = $3, thumbnail_url = $4, metadata = $5, \
                 error_message = $6, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(GenerationStatus::Completed)
        .bind(fields.output_url)
        .bind(fields.thumbnail_url)
        .bind(fields.metadata)
        .bind(fields.error_message)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Transition a `Processing` job to `Failed` with an error message.
    /// Terminal; no retry exists. Returns whether the row transitioned --
    /// already-terminal rows are left untouched.
    pub async fn fail(pool: &PgPool, id: DbId, error: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE generations \
             SET status = $2, error_message = $3, updated_at = NOW() \
             WHERE id = $1 AND status = $4",
        )
        .bind(id)
        .bind(GenerationStatus::Failed)
        .bind(error)
        .bind(GenerationStatus::Processing)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Flip the favorite flag. Independent of pipeline state.
    pub async fn toggle_favorite(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<Generation>, sqlx::Error> {
        let query = format!(
            "UPDATE generations \
             SET is_favorite = NOT is_favorite, updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Generation>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Flip the public flag. Independent of pipeline state.
    pub async fn toggle_public(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<Generation>, sqlx::Error> {
        let query = format!(
            "UPDATE generations \
             SET is_public = NOT is_public, updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Generation>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Delete a job owned by the given user. Returns whether a row existed.
    pub async fn delete(pool: &PgPool, id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM generations WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Normalise page/limit query values into SQL LIMIT/OFFSET. Also used by
/// the API layer so response pagination matches what was queried.
pub fn page_bounds(page: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let limit = match limit {
        Some(l) if (1..=MAX_LIMIT).contains(&l) => l,
        _ => DEFAULT_LIMIT,
    };
    (limit, (page - 1) * limit)
}

#[cfg(test)]
mod tests {
    use super::page_bounds;

    #[test]
    fn page_bounds_defaults_and_clamps() {
        assert_eq!(page_bounds(None, None), (20, 0));
        assert_eq!(page_bounds(Some(3), Some(10)), (10, 20));
        assert_eq!(page_bounds(Some(0), Some(500)), (20, 0));
        assert_eq!(page_bounds(Some(-2), Some(-5)), (20, 0));
    }
}
