//! handmouse-core - Control-plane library for Hand Mouse OS
//!
//! This crate provides everything a client needs to talk to the engine:
//! - JSON record codec over a Unix socket
//! - Control client with connect retry and typed commands
//! - Live status view loop for dashboards
//! - Configuration management

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod live;
pub mod protocol;

pub use client::{Client, Connection, RetryPolicy};
pub use config::Config;
pub use error::{ControlError, ErrorKind, Result};
pub use live::{DisplayState, Frontend, LiveView, Screen, StatusSource, ViewInput};
pub use protocol::{Argument, FeatureState, Request, Response, Status, StatusReport};
