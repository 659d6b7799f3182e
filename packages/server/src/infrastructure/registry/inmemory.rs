//! InMemory Connection Registry 実装
//!
//! ドメイン層が定義する ConnectionRegistry trait の具体的な実装。
//! `tokio::sync::Mutex<HashMap>` で保護し、複数の接続処理タスクから安全に使える。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionHandle, ConnectionId, ConnectionRegistry, UserId};

/// インメモリ Connection Registry 実装
#[derive(Default)]
pub struct InMemoryConnectionRegistry {
    /// Key: user_id, Value: 現在有効な接続ハンドル
    connections: Mutex<HashMap<UserId, ConnectionHandle>>,
}

impl InMemoryConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    async fn register(
        &self,
        user_id: UserId,
        handle: ConnectionHandle,
    ) -> Option<ConnectionHandle> {
        let mut connections = self.connections.lock().await;
        let connection_id = handle.id();
        let previous = connections.insert(user_id.clone(), handle);
        match &previous {
            Some(old) => tracing::info!(
                "User '{}' reconnected: connection {} supersedes {}",
                user_id,
                connection_id,
                old.id()
            ),
            None => tracing::debug!("User '{}' registered as {}", user_id, connection_id),
        }
        previous
    }

    async fn lookup(&self, user_id: &UserId) -> Option<ConnectionHandle> {
        let connections = self.connections.lock().await;
        connections.get(user_id).cloned()
    }

    async fn unregister(&self, user_id: &UserId, connection_id: ConnectionId) -> bool {
        let mut connections = self.connections.lock().await;
        match connections.get(user_id) {
            Some(current) if current.id() == connection_id => {
                connections.remove(user_id);
                tracing::debug!("User '{}' unregistered ({})", user_id, connection_id);
                true
            }
            Some(current) => {
                tracing::debug!(
                    "Ignoring stale unregister for '{}': {} is no longer current ({} is)",
                    user_id,
                    connection_id,
                    current.id()
                );
                false
            }
            None => false,
        }
    }

    async fn online_users(&self) -> Vec<UserId> {
        let connections = self.connections.lock().await;
        let mut users: Vec<UserId> = connections.keys().cloned().collect();
        users.sort();
        users
    }
}
