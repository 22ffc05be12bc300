//! handmouse-daemon - Engine-side control endpoint for Hand Mouse OS
//!
//! This crate provides the piece the engine embeds to be controllable:
//! - Unix socket listener with stale-socket cleanup and single-owner locking
//! - One request/one response per connection using the core record codec
//! - A reference command handler over the engine's live values

pub mod handler;
pub mod server;

pub use handler::{CommandHandler, EngineControls, EngineSnapshot};
pub use server::{ControlServer, ServerError};
