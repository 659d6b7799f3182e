//! 認証トークンの実装
//!
//! - `jwt`: 共有シークレット（HS256）で署名された JWT

pub mod jwt;

pub use jwt::JwtTokenVerifier;
