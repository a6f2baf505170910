//! HTTP handlers for generation jobs: submission, history, and the
//! favorite/public/delete mutations.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lumina_core::error::CoreError;
use lumina_core::types::DbId;
use lumina_db::models::generation::{GenerationKind, GenerationListQuery};
use lumina_db::repositories::{page_bounds, GenerationRepo};
use serde::Deserialize;
use serde_json::json;

use crate::auth::AuthUser;
use crate::cache::{ListingCache, LISTING_TTL_SECS};
use crate::engine::{MusicRequest, VideoRequest};
use crate::error::AppResult;
use crate::response::Pagination;
use crate::state::AppState;

/// POST /generations/music -- submit a music generation.
///
/// Returns `202 Accepted` with the `Processing` row; in demo mode the job
/// completes inline and this returns `200 OK`.
pub async fn submit_music(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<MusicRequest>,
) -> AppResult<Response> {
    let receipt = state.engine.submit_music(user.user_id, request).await?;

    let (status, message) = if receipt.demo {
        (StatusCode::OK, "Music generated in demo mode")
    } else {
        (StatusCode::ACCEPTED, "Music generation started")
    };

    Ok((
        status,
        Json(json!({
            "message": message,
            "generation": receipt.generation,
        })),
    )
        .into_response())
}

/// POST /generations/video -- submit a video generation.
pub async fn submit_video(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<VideoRequest>,
) -> AppResult<Response> {
    let receipt = state.engine.submit_video(user.user_id, request).await?;

    let (status, message) = if receipt.demo {
        (StatusCode::OK, "Video generated in demo mode")
    } else {
        (StatusCode::ACCEPTED, "Video generation started")
    };

    Ok((
        status,
        Json(json!({
            "message": message,
            "generation": receipt.generation,
        })),
    )
        .into_response())
}

/// GET /generations -- the caller's job history, newest first.
///
/// Pages are served from the listing cache when possible; a miss reads the
/// database and primes the cache for the next poll.
pub async fn list_generations(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<GenerationListQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let key = ListingCache::listing_key(user.user_id, &params);
    if let Some(cached) = state.cache.get_json::<serde_json::Value>(&key).await {
        tracing::debug!(user_id = user.user_id, "Listing served from cache");
        return Ok(Json(cached));
    }

    let (rows, total) = GenerationRepo::list_for_user(&state.pool, user.user_id, &params).await?;

    let (limit, offset) = page_bounds(params.page, params.limit);
    let body = json!({
        "generations": rows,
        "pagination": Pagination::new(offset / limit + 1, limit, total),
    });

    state.cache.set_json(&key, &body, LISTING_TTL_SECS).await;
    Ok(Json(body))
}

/// GET /generations/{id} -- one job, owner only.
pub async fn get_generation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let generation = GenerationRepo::find_by_id_for_user(&state.pool, id, user.user_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "generation",
            id,
        })?;

    Ok(Json(json!({ "generation": generation })))
}

/// DELETE /generations/{id} -- remove a job from history.
pub async fn delete_generation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let deleted = GenerationRepo::delete(&state.pool, id, user.user_id).await?;
    if !deleted {
        return Err(CoreError::NotFound {
            entity: "generation",
            id,
        }
        .into());
    }

    state.cache.invalidate_user(user.user_id).await;
    Ok(Json(json!({ "message": "Generation deleted" })))
}

/// POST /generations/{id}/favorite -- flip the favorite flag.
pub async fn toggle_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let generation = GenerationRepo::toggle_favorite(&state.pool, id, user.user_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "generation",
            id,
        })?;

    state.cache.invalidate_user(user.user_id).await;
    Ok(Json(json!({ "generation": generation })))
}

/// POST /generations/{id}/public -- flip the public flag.
pub async fn toggle_public(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let generation = GenerationRepo::toggle_public(&state.pool, id, user.user_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "generation",
            id,
        })?;

    state.cache.invalidate_user(user.user_id).await;
    Ok(Json(json!({ "generation": generation })))
}

/// Query parameters for the public explore listing.
#[derive(Debug, Default, Deserialize)]
pub struct PublicListQuery {
    pub kind: Option<GenerationKind>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// GET /public/generations -- completed public jobs from all users.
/// Unauthenticated.
pub async fn list_public_generations(
    State(state): State<AppState>,
    Query(params): Query<PublicListQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let (rows, total) =
        GenerationRepo::list_public(&state.pool, params.kind, params.page, params.limit).await?;

    let (limit, offset) = page_bounds(params.page, params.limit);
    Ok(Json(json!({
        "generations": rows,
        "pagination": Pagination::new(offset / limit + 1, limit, total),
    })))
}
