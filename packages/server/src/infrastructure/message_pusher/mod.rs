//! メッセージ送信（通知）の実装
//!
//! ## 実装
//!
//! - `websocket`: Registry に登録された WebSocket 接続に送る実装

pub mod websocket;

pub use websocket::WebSocketMessagePusher;
