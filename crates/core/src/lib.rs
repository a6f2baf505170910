//! Pure domain logic for the Lumina generation backend.
//!
//! This crate has no internal dependencies and no I/O. Everything here is
//! deterministic and unit-testable: error taxonomy, credit cost rules,
//! narration speed estimation, video parameter clamping, and the websocket
//! message-type constants shared between the engine and its clients.

pub mod credits;
pub mod error;
pub mod job_events;
pub mod sanitize;
pub mod speech;
pub mod types;
pub mod video;
