//! UseCase: 接続時の認証
//!
//! WebSocket のアップグレード前に資格情報を検証し、接続してよいユーザーを確定する。
//!
//! 1. トークンを取り出す（クエリ `token` → `Authorization: Bearer` → Cookie `token=` の順）
//! 2. 署名と有効期限を検証する
//! 3. ユーザーディレクトリでユーザーを解決する
//! 4. トークンの subject とクエリの `userId` が一致することを確認する

use std::sync::Arc;

use crate::domain::{TokenError, TokenVerifier, UserDirectory, UserId, UserProfile};

use super::error::AuthError;

/// 接続要求に付随する資格情報の候補
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCredentials {
    /// `?token=` クエリパラメータ
    pub query_token: Option<String>,
    /// `Authorization` ヘッダーの値
    pub authorization: Option<String>,
    /// `Cookie` ヘッダーの値
    pub cookie: Option<String>,
}

impl SessionCredentials {
    /// Picks the bearer token following the precedence query > header > cookie.
    pub fn token(&self) -> Option<&str> {
        if let Some(token) = non_empty(self.query_token.as_deref()) {
            return Some(token);
        }

        if let Some(token) = self
            .authorization
            .as_deref()
            .and_then(|value| value.strip_prefix("Bearer "))
            .and_then(|token| non_empty(Some(token)))
        {
            return Some(token);
        }

        self.cookie.as_deref().and_then(|cookie| {
            cookie
                .split(';')
                .filter_map(|pair| pair.trim().split_once('='))
                .find(|(name, _)| *name == "token")
                .and_then(|(_, value)| non_empty(Some(value)))
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// 接続認証のユースケース
pub struct AuthenticateSessionUseCase {
    verifier: Arc<dyn TokenVerifier>,
    directory: Arc<dyn UserDirectory>,
}

impl AuthenticateSessionUseCase {
    pub fn new(verifier: Arc<dyn TokenVerifier>, directory: Arc<dyn UserDirectory>) -> Self {
        Self {
            verifier,
            directory,
        }
    }

    /// 接続認証を実行
    ///
    /// # Arguments
    ///
    /// * `claimed_user_id` - クエリパラメータ `userId` の値
    /// * `credentials` - 接続要求から取り出した資格情報
    ///
    /// # Returns
    ///
    /// * `Ok(UserProfile)` - 認証済みユーザーのプロフィール
    /// * `Err(AuthError)` - 接続を拒否する理由
    pub async fn execute(
        &self,
        claimed_user_id: &str,
        credentials: &SessionCredentials,
    ) -> Result<UserProfile, AuthError> {
        let claimed = UserId::try_from(claimed_user_id).map_err(AuthError::InvalidUserId)?;

        let token = credentials.token().ok_or(AuthError::MissingToken)?;

        let verified = self.verifier.verify(token).map_err(|e| match e {
            TokenError::Expired => AuthError::Expired,
            TokenError::Invalid(reason) => AuthError::InvalidToken(reason),
        })?;

        let subject = UserId::try_from(verified.subject.as_str())
            .map_err(|e| AuthError::InvalidToken(format!("bad subject: {}", e)))?;

        let profile = self
            .directory
            .find_user(&subject)
            .await
            .ok_or_else(|| AuthError::UserNotFound(subject.to_string()))?;

        if profile.id != claimed {
            return Err(AuthError::IdentityMismatch {
                claimed: claimed.into_string(),
                subject: subject.into_string(),
            });
        }

        tracing::debug!("Authenticated '{}'", profile.id);
        Ok(profile)
    }
}
