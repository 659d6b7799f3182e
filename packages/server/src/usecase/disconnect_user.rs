//! UseCase: ユーザー切断処理

use std::sync::Arc;

use crate::domain::{ConnectionId, ConnectionRegistry, UserId};

/// ユーザー切断のユースケース
pub struct DisconnectUserUseCase {
    registry: Arc<dyn ConnectionRegistry>,
}

impl DisconnectUserUseCase {
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// 切断を実行
    ///
    /// 登録中の接続が `connection_id` と一致する場合だけ削除する。
    /// 既に新しい接続に置き換えられていれば何もしない。
    ///
    /// # Returns
    ///
    /// 実際に登録を削除したかどうか
    pub async fn execute(&self, user_id: &UserId, connection_id: ConnectionId) -> bool {
        let removed = self.registry.unregister(user_id, connection_id).await;
        if !removed {
            tracing::debug!(
                "Connection {} of '{}' was already superseded",
                connection_id,
                user_id
            );
        }
        removed
    }
}
