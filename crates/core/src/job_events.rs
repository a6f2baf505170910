//! WebSocket message type constants for generation lifecycle events.
//!
//! Used by the pipeline engine when broadcasting job updates to a user's
//! connected clients. Within one job the order is always
//! `started -> progress* -> completed | failed`.

/// A generation job was accepted and its record created.
pub const MSG_TYPE_GENERATION_STARTED: &str = "generation_started";

/// Progress update during pipeline execution (step / total_steps).
pub const MSG_TYPE_GENERATION_PROGRESS: &str = "generation_progress";

/// Generation completed successfully.
pub const MSG_TYPE_GENERATION_COMPLETED: &str = "generation_completed";

/// Generation failed with an error.
pub const MSG_TYPE_GENERATION_FAILED: &str = "generation_failed";
