//! Generation job rows and the DTOs used to create and list them.

use lumina_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};

/// What kind of media a job produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "generation_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GenerationKind {
    Music,
    Video,
}

impl GenerationKind {
    /// Lowercase database label, also used in cache keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationKind::Music => "music",
            GenerationKind::Video => "video",
        }
    }
}

/// Job lifecycle status.
///
/// `Pending -> Processing -> {Completed | Failed}`. Pending is collapsed
/// into Processing at creation; both terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "generation_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl GenerationStatus {
    /// Lowercase database label, also used in cache keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStatus::Pending => "pending",
            GenerationStatus::Processing => "processing",
            GenerationStatus::Completed => "completed",
            GenerationStatus::Failed => "failed",
        }
    }
}

/// One user-requested generation, tracked through a terminal state.
///
/// The request payload fields are immutable once created; `credits_cost`
/// is fixed at creation and debited at most once, on completion.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Generation {
    pub id: DbId,
    pub user_id: DbId,
    pub kind: GenerationKind,
    pub status: GenerationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lyrics: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub narration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    pub credits_cost: i32,
    pub is_favorite: bool,
    pub is_public: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert payload for a new generation row. The row is created directly in
/// `Processing` status with its cost fixed.
#[derive(Debug, Clone)]
pub struct NewGeneration {
    pub kind: GenerationKind,
    pub title: Option<String>,
    pub prompt: String,
    pub lyrics: Option<String>,
    pub narration: Option<String>,
    pub voice_id: Option<String>,
    pub style: Option<String>,
    pub duration_secs: Option<i32>,
    pub resolution: Option<String>,
    pub model: Option<String>,
    pub credits_cost: i32,
}

/// Query parameters for listing a user's generations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationListQuery {
    pub kind: Option<GenerationKind>,
    pub status: Option<GenerationStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// A public generation with its creator's display name, for the explore
/// listing.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PublicGeneration {
    pub id: DbId,
    pub kind: GenerationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lyrics: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub creator_name: String,
    pub created_at: Timestamp,
}
