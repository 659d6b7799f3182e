//! 値オブジェクト
//!
//! - `UserId`: ユーザー識別子（ルーム ID の区切り文字を含まないことを保証）
//! - `RoomId`: 2 人のユーザーから決定的に導出されるルーム識別子
//! - `ConnectionId`: WebSocket 接続ごとの識別子
//! - `MessageText`: チャットメッセージ本文
//! - `Timestamp`: UTC の Unix ミリ秒

use std::fmt;

use serde::{Deserialize, Serialize};
use swaphere_shared::time::{parse_rfc3339_millis, timestamp_to_rfc3339};
use uuid::Uuid;

use super::error::ValueObjectError;

/// ルーム ID の区切り文字。`UserId` の文字集合には含まれない。
pub const ROOM_SEPARATOR: char = ':';

/// Prefix of every video widget room name.
const WIDGET_ROOM_PREFIX: &str = "swapHere";

// ========================================
// UserId
// ========================================

/// ユーザー識別子
///
/// 英数字と `-` `_` `.` のみ、1〜64 文字。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    pub const MAX_LEN: usize = 64;

    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.is_empty() {
            return Err(ValueObjectError::EmptyUserId);
        }
        if value.chars().count() > Self::MAX_LEN {
            return Err(ValueObjectError::UserIdTooLong { max: Self::MAX_LEN });
        }
        if let Some(invalid) = value
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        {
            return Err(ValueObjectError::InvalidUserIdCharacter(invalid));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for UserId {
    type Error = ValueObjectError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ========================================
// RoomId
// ========================================

/// 2 人のユーザーのルーム識別子
///
/// 常に `min(a, b)` + `:` + `max(a, b)` の正規形で保持するため、
/// 発信側・着信側のどちらが計算しても同じ値になる。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomId {
    low: UserId,
    high: UserId,
}

impl RoomId {
    /// 2 人のユーザーからルーム ID を生成する（引数の順序に依存しない）
    pub fn for_pair(a: &UserId, b: &UserId) -> Result<Self, ValueObjectError> {
        if a == b {
            return Err(ValueObjectError::SelfPairing(a.as_str().to_string()));
        }
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        Ok(Self {
            low: low.clone(),
            high: high.clone(),
        })
    }

    /// 文字列表現を解析する
    ///
    /// どちらの順序で連結されていても正規形に揃える。
    pub fn parse(value: &str) -> Result<Self, ValueObjectError> {
        let malformed = || ValueObjectError::MalformedRoomId(value.to_string());
        let (left, right) = value.split_once(ROOM_SEPARATOR).ok_or_else(malformed)?;
        let left = UserId::try_from(left).map_err(|_| malformed())?;
        let right = UserId::try_from(right).map_err(|_| malformed())?;
        Self::for_pair(&left, &right)
    }

    /// ルームの 2 人のメンバー（正規順）
    pub fn members(&self) -> (&UserId, &UserId) {
        (&self.low, &self.high)
    }

    pub fn contains(&self, user_id: &UserId) -> bool {
        &self.low == user_id || &self.high == user_id
    }

    /// `user_id` ではない方のメンバーを返す。`user_id` がメンバーでなければ `None`。
    pub fn peer_of(&self, user_id: &UserId) -> Option<&UserId> {
        if &self.low == user_id {
            Some(&self.high)
        } else if &self.high == user_id {
            Some(&self.low)
        } else {
            None
        }
    }

    /// Room name for the external video widget.
    ///
    /// The widget only accepts ASCII alphanumerics, so everything else is stripped.
    pub fn widget_room_name(&self) -> String {
        format!("{}{}", WIDGET_ROOM_PREFIX, self)
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect()
    }
}

impl TryFrom<String> for RoomId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomId> for String {
    fn from(value: RoomId) -> Self {
        value.to_string()
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.low, ROOM_SEPARATOR, self.high)
    }
}

// ========================================
// ConnectionId
// ========================================

/// WebSocket 接続の識別子
///
/// 同じユーザーの新旧の接続を区別するために使う。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ========================================
// MessageText
// ========================================

/// チャットメッセージ本文
///
/// 空白のみのメッセージは不可。本文自体はトリムせずそのまま保持する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageText(String);

impl MessageText {
    pub const MAX_LEN: usize = 2000;

    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.trim().is_empty() {
            return Err(ValueObjectError::EmptyMessage);
        }
        if value.chars().count() > Self::MAX_LEN {
            return Err(ValueObjectError::MessageTooLong { max: Self::MAX_LEN });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for MessageText {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

// ========================================
// Timestamp
// ========================================

/// UTC の Unix タイムスタンプ（ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn parse_rfc3339(value: &str) -> Result<Self, ValueObjectError> {
        parse_rfc3339_millis(value)
            .map(Self)
            .ok_or_else(|| ValueObjectError::InvalidTimestamp(value.to_string()))
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn to_rfc3339(&self) -> String {
        timestamp_to_rfc3339(self.0)
    }
}
