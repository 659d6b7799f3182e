//! HS256 JWT による TokenVerifier 実装
//!
//! The token is the one the platform's REST login issues: its payload carries
//! the user id under `id` and a standard `exp`. Tokens are also minted here
//! for local development (`swaphere-server issue-token`) and tests.

use std::time::Duration;

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use swaphere_shared::time::now_utc_millis;

use crate::domain::{TokenError, TokenVerifier, UserId, VerifiedToken};

/// `id` is the platform's claim; tokens from standard issuers may carry `sub`
/// as well or instead. `id` wins when both are present.
#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sub: Option<String>,
    #[serde(default)]
    iat: u64,
    exp: u64,
}

/// JWT の検証と発行
pub struct JwtTokenVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtTokenVerifier {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// `ttl` の間有効なトークンを発行する
    pub fn issue(&self, user_id: &UserId, ttl: Duration) -> Result<String, TokenError> {
        let expires_at = now_secs().saturating_add(ttl.as_secs());
        self.issue_with_expiry(user_id, expires_at)
    }

    /// 有効期限（Unix 秒）を指定してトークンを発行する
    pub fn issue_with_expiry(&self, user_id: &UserId, expires_at: u64) -> Result<String, TokenError> {
        let claims = SessionClaims {
            id: Some(user_id.as_str().to_string()),
            sub: None,
            iat: now_secs(),
            exp: expires_at,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Invalid(e.to_string()))
    }
}

impl TokenVerifier for JwtTokenVerifier {
    fn verify(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            },
        )?;

        let claims = data.claims;
        let subject = claims
            .id
            .or(claims.sub)
            .ok_or_else(|| TokenError::Invalid("token carries neither `id` nor `sub`".to_string()))?;

        Ok(VerifiedToken {
            subject,
            expires_at: claims.exp,
        })
    }
}

fn now_secs() -> u64 {
    u64::try_from(now_utc_millis() / 1000).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret";

    fn user(id: &str) -> UserId {
        UserId::try_from(id).unwrap()
    }

    #[test]
    fn test_issued_token_verifies() {
        // テスト項目: 発行したトークンが同じシークレットで検証できる
        // given (前提条件):
        let verifier = JwtTokenVerifier::new(SECRET);
        let token = verifier
            .issue(&user("u1"), Duration::from_secs(3600))
            .unwrap();

        // when (操作):
        let verified = verifier.verify(&token).unwrap();

        // then (期待する結果):
        assert_eq!(verified.subject, "u1");
        assert!(verified.expires_at > now_secs());
    }

    #[test]
    fn test_token_signed_with_other_secret_is_invalid() {
        // テスト項目: 別のシークレットで署名されたトークンは拒否される
        // given (前提条件):
        let forger = JwtTokenVerifier::new(b"other-secret");
        let verifier = JwtTokenVerifier::new(SECRET);
        let token = forger.issue(&user("u1"), Duration::from_secs(3600)).unwrap();

        // when (操作):
        let result = verifier.verify(&token);

        // then (期待する結果):
        assert!(matches!(result, Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        // テスト項目: 有効期限切れのトークンは Expired として拒否される
        // given (前提条件):
        let verifier = JwtTokenVerifier::new(SECRET);
        let an_hour_ago = now_secs() - 3600;
        let token = verifier
            .issue_with_expiry(&user("u1"), an_hour_ago)
            .unwrap();

        // when (操作):
        let result = verifier.verify(&token);

        // then (期待する結果):
        assert_eq!(result, Err(TokenError::Expired));
    }

    #[test]
    fn test_garbage_token_is_invalid() {
        // テスト項目: JWT として解釈できない文字列は拒否される
        // given (前提条件):
        let verifier = JwtTokenVerifier::new(SECRET);

        // when (操作):
        let result = verifier.verify("not-a-jwt");

        // then (期待する結果):
        assert!(matches!(result, Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_sub_claim_is_accepted_as_user_id() {
        // テスト項目: `id` の代わりに標準の `sub` クレームを使ったトークンも受け付ける
        // given (前提条件):
        #[derive(Serialize)]
        struct StandardClaims {
            sub: String,
            exp: u64,
        }
        let verifier = JwtTokenVerifier::new(SECRET);
        let claims = StandardClaims {
            sub: "u9".to_string(),
            exp: now_secs() + 600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        // when (操作):
        let verified = verifier.verify(&token).unwrap();

        // then (期待する結果):
        assert_eq!(verified.subject, "u9");
    }

    fn sign(claims: &serde_json::Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap()
    }

    #[test]
    fn test_token_with_both_id_and_sub_is_accepted() {
        // テスト項目: `id` と `sub` の両方を持つトークンも受け付け、`id` を優先する
        // given (前提条件):
        let verifier = JwtTokenVerifier::new(SECRET);
        let token = sign(&serde_json::json!({
            "id": "u1",
            "sub": "auth0|u1",
            "iat": 1,
            "exp": now_secs() + 600,
        }));

        // when (操作):
        let verified = verifier.verify(&token).unwrap();

        // then (期待する結果):
        assert_eq!(verified.subject, "u1");
    }

    #[test]
    fn test_token_without_subject_is_invalid() {
        // テスト項目: `id` も `sub` もないトークンは拒否される
        // given (前提条件):
        let verifier = JwtTokenVerifier::new(SECRET);
        let token = sign(&serde_json::json!({"exp": now_secs() + 600}));

        // when (操作):
        let result = verifier.verify(&token);

        // then (期待する結果):
        assert!(matches!(result, Err(TokenError::Invalid(_))));
    }
}
