//! UseCase: ユーザー接続処理
//!
//! 認証済みユーザーの接続を Registry に登録する。
//! 同じユーザーが再接続した場合は新しい接続が古い接続を置き換える（last-write-wins）。
//! 置き換えられた接続の送信チャンネルはここで破棄され、古いソケットは閉じられる。

use std::sync::Arc;

use crate::domain::{ConnectionHandle, ConnectionId, ConnectionRegistry, PusherChannel, UserId};

/// ユーザー接続のユースケース
pub struct ConnectUserUseCase {
    registry: Arc<dyn ConnectionRegistry>,
}

impl ConnectUserUseCase {
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// 接続を登録し、切断時に使う接続 ID を返す
    pub async fn execute(&self, user_id: UserId, sender: PusherChannel) -> ConnectionId {
        let handle = ConnectionHandle::new(sender);
        let connection_id = handle.id();

        if let Some(superseded) = self.registry.register(user_id.clone(), handle).await {
            tracing::info!(
                "Closing superseded connection {} of '{}'",
                superseded.id(),
                user_id
            );
        }

        connection_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::registry::InMemoryConnectionRegistry;

    #[tokio::test]
    async fn test_connect_user_registers_connection() {
        // テスト項目: 接続したユーザーが Registry に登録される
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let usecase = ConnectUserUseCase::new(registry.clone());
        let alice = UserId::try_from("alice").unwrap();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();

        // when (操作):
        let connection_id = usecase.execute(alice.clone(), tx).await;

        // then (期待する結果):
        let handle = registry.lookup(&alice).await.unwrap();
        assert_eq!(handle.id(), connection_id);
    }

    #[tokio::test]
    async fn test_reconnect_closes_superseded_channel() {
        // テスト項目: 再接続すると古い接続の送信チャンネルが閉じられる
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let usecase = ConnectUserUseCase::new(registry.clone());
        let alice = UserId::try_from("alice").unwrap();
        let (tx1, mut rx1) = tokio::sync::mpsc::unbounded_channel();
        let (tx2, _rx2) = tokio::sync::mpsc::unbounded_channel();
        let first = usecase.execute(alice.clone(), tx1).await;

        // when (操作):
        let second = usecase.execute(alice.clone(), tx2).await;

        // then (期待する結果):
        assert_ne!(first, second);
        assert_eq!(registry.lookup(&alice).await.unwrap().id(), second);
        assert!(rx1.recv().await.is_none());
    }
}
