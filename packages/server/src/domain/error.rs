//! ドメイン層のエラー型

use thiserror::Error;

/// 値オブジェクトの生成・検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("user id must not be empty")]
    EmptyUserId,

    #[error("user id exceeds {max} characters")]
    UserIdTooLong { max: usize },

    #[error("user id contains invalid character {0:?}")]
    InvalidUserIdCharacter(char),

    #[error("room id '{0}' is not a pair of user ids")]
    MalformedRoomId(String),

    #[error("user '{0}' cannot share a room with themself")]
    SelfPairing(String),

    #[error("message text must not be empty")]
    EmptyMessage,

    #[error("message text exceeds {max} characters")]
    MessageTooLong { max: usize },

    #[error("timestamp '{0}' is not RFC 3339")]
    InvalidTimestamp(String),
}

/// メッセージ送信（通知）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    /// 宛先ユーザーが Registry に存在しない（オフライン）
    #[error("user '{0}' is not connected")]
    ClientNotFound(String),

    /// 接続は存在するが送信チャンネルが閉じている
    #[error("failed to push message: {0}")]
    PushFailed(String),
}

/// 認証トークン検証のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(String),
}
