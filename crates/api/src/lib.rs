//! Lumina API server library.
//!
//! Exposes the core building blocks (config, state, error handling, routes,
//! WebSocket infrastructure, the pipeline engine) so integration tests and
//! the binary entrypoint can both access them.

pub mod auth;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod state;
pub mod ws;
