//! Infrastructure layer
//!
//! ドメイン層が定義するポートの具体的な実装と、通信用の DTO。

pub mod auth;
pub mod directory;
pub mod dto;
pub mod message_pusher;
pub mod registry;
