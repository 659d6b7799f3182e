//! swapHere call client.
//!
//! Talks to the relay over WebSocket and drives one call at a time through a
//! [`call::CallController`].

pub mod call;
pub mod command;
pub mod config;
pub mod domain;
pub mod error;
pub mod formatter;
pub mod router;
mod runner;
mod session;
mod ui;

pub use runner::run_client;
