//! エンティティ
//!
//! どれも一時的なもので、永続化はしない。

use serde::Serialize;

use super::value_object::{MessageText, RoomId, Timestamp, UserId};

/// ユーザーのプロフィール（ユーザーディレクトリから取得する）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub profession: Option<String>,
}

impl UserProfile {
    pub fn new(id: UserId, name: String) -> Self {
        Self {
            id,
            name,
            email: None,
            avatar: None,
            profession: None,
        }
    }

    /// ID 以外の情報を持たないプロフィール（表示名 = ID）
    pub fn minimal(id: UserId) -> Self {
        let name = id.as_str().to_string();
        Self::new(id, name)
    }
}

/// チャットメッセージ（リレー中とクライアントの表示中のみ存在する）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub sender_id: UserId,
    pub sender_name: String,
    pub text: MessageText,
    pub timestamp: Timestamp,
    pub room_id: RoomId,
}

impl ChatMessage {
    /// 宛先 = ルームの 2 人のうち送信者ではない方
    pub fn recipient(&self) -> Option<&UserId> {
        self.room_id.peer_of(&self.sender_id)
    }
}

/// 通話シグナルの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// `call-user` → `incoming-call`
    Invite,
    /// `call-joined` → `call-accepted`
    Joined,
    /// `end-call` → `call-ended`
    End,
}

impl SignalKind {
    /// Name of the inbound event that carries this signal.
    pub fn inbound_event(&self) -> &'static str {
        match self {
            SignalKind::Invite => "call-user",
            SignalKind::Joined => "call-joined",
            SignalKind::End => "end-call",
        }
    }
}

/// 2 人のユーザー間の通話シグナル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSignal {
    pub kind: SignalKind,
    pub from: UserId,
    pub to: UserId,
    pub room_id: RoomId,
}

/// 1 件のリレーの結果
///
/// 相手がオフラインなのは正常な結果であり、エラーではない。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    PeerUnreachable,
}
