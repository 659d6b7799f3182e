//! UseCase: オンライン状態の取得

use std::sync::Arc;

use crate::domain::{ConnectionRegistry, UserId};

pub struct GetPresenceUseCase {
    registry: Arc<dyn ConnectionRegistry>,
}

impl GetPresenceUseCase {
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// 接続中のユーザー一覧（ID 順）
    pub async fn online_users(&self) -> Vec<UserId> {
        self.registry.online_users().await
    }

    pub async fn is_online(&self, user_id: &UserId) -> bool {
        self.registry.is_online(user_id).await
    }
}
