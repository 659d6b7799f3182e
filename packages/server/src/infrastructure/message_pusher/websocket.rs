//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 宛先ユーザーの現在の接続を Registry から解決する
//! - 接続ハンドル（WebSocket 送信タスクへの `UnboundedSender`）にメッセージを渡す
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は Registry に登録された送信チャンネルを使ってメッセージを送るだけです。

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{ConnectionRegistry, MessagePushError, MessagePusher, UserId};

/// WebSocket を使った MessagePusher 実装
pub struct WebSocketMessagePusher {
    registry: Arc<dyn ConnectionRegistry>,
}

impl WebSocketMessagePusher {
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn push_to(&self, user_id: &UserId, content: &str) -> Result<(), MessagePushError> {
        let handle = self
            .registry
            .lookup(user_id)
            .await
            .ok_or_else(|| MessagePushError::ClientNotFound(user_id.as_str().to_string()))?;

        handle.push(content)?;
        tracing::debug!("Pushed message to '{}' via {}", user_id, handle.id());
        Ok(())
    }
}
