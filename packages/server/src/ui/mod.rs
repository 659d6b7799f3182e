//! UI layer: the axum router, request handlers and shared state.

pub mod handler;
pub mod server;
pub mod signal;
pub mod state;

pub use server::Server;
