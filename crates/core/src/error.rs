use crate::types::DbId;

/// Domain-level errors surfaced by generation submission.
///
/// All of these are pre-flight errors: they are returned synchronously from
/// the submit path and mutate nothing. Mid-pipeline failures are recorded on
/// the job record instead and never reach the HTTP caller.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Insufficient credits: {required} required, {available} available")]
    InsufficientCredits { required: i32, available: i32 },

    #[error("Narration has {words} words, max ~{max_words} words for a {duration_secs}s video")]
    NarrationTooLong {
        words: usize,
        max_words: usize,
        duration_secs: i32,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
