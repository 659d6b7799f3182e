//! Connection Registry の定義
//!
//! 認証済みユーザー ID → 現在有効な接続ハンドル のマップ。
//! 1 ユーザーにつき有効なハンドルは最大 1 つ（後勝ち）。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{
    error::MessagePushError,
    value_object::{ConnectionId, UserId},
};

/// クライアントへのメッセージ送信チャンネル
///
/// 実体は WebSocket の送信タスクにつながる `UnboundedSender`。
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// 接続ハンドル
///
/// `ConnectionId` で新旧の接続を区別する。クローンしても同じ接続を指す。
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    sender: PusherChannel,
}

impl ConnectionHandle {
    pub fn new(sender: PusherChannel) -> Self {
        Self {
            id: ConnectionId::generate(),
            sender,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// この接続にメッセージを送る
    pub fn push(&self, content: &str) -> Result<(), MessagePushError> {
        self.sender
            .send(content.to_string())
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))
    }
}

/// Connection Registry trait
///
/// 複数の接続処理タスクから同時に呼ばれるため、実装はスレッドセーフであること。
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// ハンドルを登録する（既存の登録は上書き）
    ///
    /// 上書きされた古いハンドルがあれば返す。
    async fn register(&self, user_id: UserId, handle: ConnectionHandle)
    -> Option<ConnectionHandle>;

    /// 現在のハンドルを取得する。オフラインなら `None`。
    async fn lookup(&self, user_id: &UserId) -> Option<ConnectionHandle>;

    /// 登録を削除する
    ///
    /// 現在のハンドルの `ConnectionId` が一致する場合のみ削除し、削除したかどうかを返す。
    /// 古い接続の切断処理が新しい接続を消してしまうことを防ぐ。
    async fn unregister(&self, user_id: &UserId, connection_id: ConnectionId) -> bool;

    /// オンラインのユーザー ID 一覧（ソート済み）
    async fn online_users(&self) -> Vec<UserId>;

    async fn is_online(&self, user_id: &UserId) -> bool {
        self.lookup(user_id).await.is_some()
    }
}
