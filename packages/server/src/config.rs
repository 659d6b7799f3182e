//! Server configuration.

use std::path::PathBuf;

use axum::http::HeaderValue;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("JWT secret must not be empty")]
    EmptyJwtSecret,

    #[error("client url '{0}' is not a valid http(s) origin")]
    InvalidClientUrl(String),
}

/// Validated settings for one relay process.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    /// Browser origin allowed by CORS (credentials enabled).
    pub client_origin: HeaderValue,
    /// JSON array of user profiles. `None` admits any valid user id.
    pub users_file: Option<PathBuf>,
    /// Report `peer-unreachable` back to the caller when a signal cannot be delivered.
    pub notify_unreachable: bool,
}

impl ServerConfig {
    pub fn new(
        host: String,
        port: u16,
        jwt_secret: String,
        client_url: &str,
        users_file: Option<PathBuf>,
        notify_unreachable: bool,
    ) -> Result<Self, ConfigError> {
        if jwt_secret.trim().is_empty() {
            return Err(ConfigError::EmptyJwtSecret);
        }
        Ok(Self {
            host,
            port,
            jwt_secret,
            client_origin: parse_origin(client_url)?,
            users_file,
            notify_unreachable,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Origins never carry a path, so a trailing slash is dropped.
fn parse_origin(client_url: &str) -> Result<HeaderValue, ConfigError> {
    let origin = client_url.trim().trim_end_matches('/');
    let has_host = origin
        .strip_prefix("http://")
        .or_else(|| origin.strip_prefix("https://"))
        .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'));
    if !has_host {
        return Err(ConfigError::InvalidClientUrl(client_url.to_string()));
    }
    HeaderValue::from_str(origin).map_err(|_| ConfigError::InvalidClientUrl(client_url.to_string()))
}
