//! 認証まわりのポート
//!
//! - `TokenVerifier`: 認証トークンの署名・有効期限の検証
//! - `UserDirectory`: ユーザー ID からプロフィールを引く外部サービス

use async_trait::async_trait;

use super::{entity::UserProfile, error::TokenError, value_object::UserId};

/// 検証済みトークンの内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    /// トークンが発行されたユーザーの ID（未検証の文字列）
    pub subject: String,
    /// 有効期限（Unix 秒）
    pub expires_at: u64,
}

/// 認証トークンの検証
#[cfg_attr(test, mockall::automock)]
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<VerifiedToken, TokenError>;
}

/// ユーザーディレクトリ（外部のユーザー情報サービス）
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// ユーザーを検索する。存在しなければ `None`。
    async fn find_user(&self, user_id: &UserId) -> Option<UserProfile>;
}
