//! swapHere real-time relay: presence, call signaling and chat relay.
//!
//! Layers:
//! - `domain`: value objects, entities and ports
//! - `usecase`: one use case per relay operation
//! - `infrastructure`: registry, pusher, JWT, user directories, wire DTOs
//! - `ui`: axum router and handlers

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
