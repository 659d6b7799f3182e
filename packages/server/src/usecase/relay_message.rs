//! UseCase: チャットメッセージの中継
//!
//! ルーム ID の 2 人のうち送信者ではない方に `message` を届ける。通話状態とは独立している。
//! 相手がオフラインならキューせずに破棄する。

use std::sync::Arc;

use crate::{
    domain::{ChatMessage, DeliveryOutcome, MessagePusher, UserId},
    infrastructure::dto::websocket::{ChatMessageDto, ServerEvent},
};

use super::error::RelayError;

/// メッセージ中継のユースケース
pub struct RelayMessageUseCase {
    message_pusher: Arc<dyn MessagePusher>,
}

impl RelayMessageUseCase {
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    /// メッセージ中継を実行
    ///
    /// # Arguments
    ///
    /// * `sender` - 認証済みの送信者。メッセージの `sender_id` はこの値で上書きする
    /// * `message` - 中継するメッセージ
    pub async fn execute(
        &self,
        sender: &UserId,
        mut message: ChatMessage,
    ) -> Result<DeliveryOutcome, RelayError> {
        message.sender_id = sender.clone();

        let recipient = message
            .recipient()
            .cloned()
            .ok_or_else(|| RelayError::NotAMember {
                user: sender.to_string(),
                room: message.room_id.to_string(),
            })?;

        let event = ServerEvent::Message(ChatMessageDto::from(message));
        let json = serde_json::to_string(&event).map_err(|e| RelayError::Encode(e.to_string()))?;

        match self.message_pusher.push_to(&recipient, &json).await {
            Ok(()) => {
                tracing::debug!("Relayed message from '{}' to '{}'", sender, recipient);
                Ok(DeliveryOutcome::Delivered)
            }
            Err(e) => {
                tracing::debug!("Dropped message from '{}': {}", sender, e);
                Ok(DeliveryOutcome::PeerUnreachable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ConnectionRegistry, MessageText, RoomId, Timestamp},
        infrastructure::{
            message_pusher::WebSocketMessagePusher, registry::InMemoryConnectionRegistry,
        },
        usecase::ConnectUserUseCase,
    };

    fn user(id: &str) -> UserId {
        UserId::try_from(id).unwrap()
    }

    fn message(sender: &str, room: &str, text: &str) -> ChatMessage {
        ChatMessage {
            sender_id: user(sender),
            sender_name: "Ada".to_string(),
            text: MessageText::new(text.to_string()).unwrap(),
            timestamp: Timestamp::new(1_714_557_600_000),
            room_id: RoomId::parse(room).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_relay_message_to_peer() {
        // テスト項目: メッセージがルームの相手に届く
        // given (前提条件):
        let registry: Arc<dyn ConnectionRegistry> = Arc::new(InMemoryConnectionRegistry::new());
        let connect = ConnectUserUseCase::new(registry.clone());
        let (tx1, mut rx1) = tokio::sync::mpsc::unbounded_channel();
        let (tx2, mut rx2) = tokio::sync::mpsc::unbounded_channel();
        connect.execute(user("u1"), tx1).await;
        connect.execute(user("u2"), tx2).await;
        let usecase = RelayMessageUseCase::new(Arc::new(WebSocketMessagePusher::new(registry)));

        // when (操作):
        let outcome = usecase
            .execute(&user("u1"), message("u1", "u1:u2", "hi"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(outcome, DeliveryOutcome::Delivered);
        let received: serde_json::Value =
            serde_json::from_str(&rx2.recv().await.unwrap()).unwrap();
        assert_eq!(received["event"], "message");
        assert_eq!(received["data"]["senderId"], "u1");
        assert_eq!(received["data"]["text"], "hi");
        assert_eq!(received["data"]["roomId"], "u1:u2");
        assert!(rx1.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_relay_forces_authenticated_sender() {
        // テスト項目: ペイロードの送信者 ID は認証済みユーザーで上書きされる
        // given (前提条件):
        let registry: Arc<dyn ConnectionRegistry> = Arc::new(InMemoryConnectionRegistry::new());
        let connect = ConnectUserUseCase::new(registry.clone());
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        connect.execute(user("u1"), tx).await;
        let usecase = RelayMessageUseCase::new(Arc::new(WebSocketMessagePusher::new(registry)));

        // when (操作): u2 が u1 を名乗って送信する
        let outcome = usecase
            .execute(&user("u2"), message("u1", "u1:u2", "spoof"))
            .await
            .unwrap();

        // then (期待する結果): 宛先は u1、送信者は u2 として届く
        assert_eq!(outcome, DeliveryOutcome::Delivered);
        let received: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(received["data"]["senderId"], "u2");
    }

    #[tokio::test]
    async fn test_relay_rejects_non_member() {
        // テスト項目: ルームのメンバーでない送信者のメッセージは拒否される
        // given (前提条件):
        let registry: Arc<dyn ConnectionRegistry> = Arc::new(InMemoryConnectionRegistry::new());
        let usecase = RelayMessageUseCase::new(Arc::new(WebSocketMessagePusher::new(registry)));

        // when (操作):
        let result = usecase
            .execute(&user("u3"), message("u3", "u1:u2", "hello"))
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RelayError::NotAMember {
                user: "u3".to_string(),
                room: "u1:u2".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_relay_to_offline_peer_is_dropped() {
        // テスト項目: 相手がオフラインならメッセージは破棄され、エラーにはならない
        // given (前提条件):
        let registry: Arc<dyn ConnectionRegistry> = Arc::new(InMemoryConnectionRegistry::new());
        let usecase = RelayMessageUseCase::new(Arc::new(WebSocketMessagePusher::new(registry)));

        // when (操作):
        let outcome = usecase
            .execute(&user("u1"), message("u1", "u1:u2", "anyone?"))
            .await;

        // then (期待する結果):
        assert_eq!(outcome, Ok(DeliveryOutcome::PeerUnreachable));
    }
}
