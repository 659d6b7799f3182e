//! Request handlers.

pub mod http;
pub mod websocket;

pub use http::{get_online_users, get_user_presence, health_check};
pub use websocket::websocket_handler;
