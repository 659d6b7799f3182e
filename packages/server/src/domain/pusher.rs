//! MessagePusher trait 定義
//!
//! ユーザー ID を宛先としたメッセージ送信（通知）のインターフェース。

use async_trait::async_trait;

use super::{error::MessagePushError, value_object::UserId};

/// MessagePusher trait
///
/// UseCase 層はこの trait に依存し、WebSocket などの具体的な送信手段には依存しない。
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 特定のユーザーの現在の接続にメッセージを送信
    ///
    /// オフラインなら `MessagePushError::ClientNotFound`。
    async fn push_to(&self, user_id: &UserId, content: &str) -> Result<(), MessagePushError>;
}
