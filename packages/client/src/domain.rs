//! Domain logic for client-side operations.
//!
//! This module contains pure functions that implement business logic
//! without side effects, making them easy to test.

use crate::error::ClientError;

/// Check if the client should exit immediately based on the error type.
///
/// # Returns
///
/// `true` if the error requires immediate exit (the session must sign in again),
/// `false` otherwise
pub fn should_exit_immediately(error: &ClientError) -> bool {
    matches!(error, ClientError::AuthRejected(_))
}

/// Check if the client should attempt to reconnect.
///
/// # Arguments
///
/// * `error` - The client error that occurred
/// * `current_attempt` - The current reconnection attempt count (0-indexed)
/// * `max_attempts` - The maximum number of reconnection attempts allowed
pub fn should_attempt_reconnect(
    error: &ClientError,
    current_attempt: u32,
    max_attempts: u32,
) -> bool {
    // Don't reconnect if the error requires immediate exit
    if should_exit_immediately(error) {
        return false;
    }

    // Don't reconnect if we've exhausted all attempts
    current_attempt < max_attempts
}

/// Reconnection attempts used so far after `error`.
///
/// A drop of an established connection starts a fresh series, so a client
/// that stays connected for hours between drops never runs out of attempts.
pub fn next_reconnect_count(error: &ClientError, current_attempt: u32) -> u32 {
    match error {
        ClientError::ConnectionLost(_) => 1,
        _ => current_attempt.saturating_add(1),
    }
}

/// HTTP base URL of the relay derived from its WebSocket endpoint.
///
/// `ws://host:5000/ws` becomes `http://host:5000`.
pub fn http_base_url(ws_url: &str) -> Option<String> {
    let (scheme, rest) = if let Some(rest) = ws_url.strip_prefix("ws://") {
        ("http", rest)
    } else if let Some(rest) = ws_url.strip_prefix("wss://") {
        ("https", rest)
    } else {
        return None;
    };
    let authority = rest.split(['/', '?']).next().filter(|a| !a.is_empty())?;
    Some(format!("{}://{}", scheme, authority))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_exit_immediately_with_auth_rejected() {
        // テスト項目: AuthRejected エラーの場合、即座に終了すべきと判定される
        // given (前提条件):
        let error = ClientError::AuthRejected("token expired".to_string());

        // when (操作):
        let result = should_exit_immediately(&error);

        // then (期待する結果):
        assert!(result);
    }

    #[test]
    fn test_should_exit_immediately_with_connection_error() {
        // テスト項目: ConnectionError の場合、即座に終了すべきではないと判定される
        // given (前提条件):
        let error = ClientError::ConnectionError("network error".to_string());

        // when (操作):
        let result = should_exit_immediately(&error);

        // then (期待する結果):
        assert!(!result);
    }

    #[test]
    fn test_should_attempt_reconnect_with_auth_rejected() {
        // テスト項目: AuthRejected エラーの場合、再接続すべきではないと判定される
        // given (前提条件):
        let error = ClientError::AuthRejected("missing token".to_string());

        // when (操作):
        let result = should_attempt_reconnect(&error, 0, 5);

        // then (期待する結果):
        assert!(!result);
    }

    #[test]
    fn test_should_attempt_reconnect_within_limit() {
        // テスト項目: 再接続回数が上限未満の場合、再接続すべきと判定される
        // given (前提条件):
        let error = ClientError::ConnectionError("network error".to_string());

        // when (操作):
        // then (期待する結果):
        assert!(should_attempt_reconnect(&error, 0, 5));
        assert!(should_attempt_reconnect(&error, 4, 5));
    }

    #[test]
    fn test_should_attempt_reconnect_at_limit() {
        // テスト項目: 再接続回数が上限に達した場合、再接続すべきではないと判定される
        // given (前提条件):
        let error = ClientError::ConnectionError("network error".to_string());

        // when (操作):
        let result = should_attempt_reconnect(&error, 5, 5);

        // then (期待する結果):
        assert!(!result);
    }

    #[test]
    fn test_next_reconnect_count_restarts_after_established_connection() {
        // テスト項目: 確立済みの接続が切れた場合は再接続回数が 1 からやり直しになる
        // given (前提条件):
        let lost = ClientError::ConnectionLost("relay closed the connection".to_string());
        let refused = ClientError::ConnectionError("connection refused".to_string());

        // when (操作):
        // then (期待する結果):
        assert_eq!(next_reconnect_count(&lost, 4), 1);
        assert!(should_attempt_reconnect(&lost, next_reconnect_count(&lost, 4), 5));
        assert_eq!(next_reconnect_count(&refused, 4), 5);
        assert!(!should_attempt_reconnect(&refused, next_reconnect_count(&refused, 4), 5));
    }

    #[test]
    fn test_http_base_url() {
        // テスト項目: WebSocket の URL から HTTP のベース URL が導出される
        // given (前提条件):
        // when (操作):
        // then (期待する結果):
        assert_eq!(
            http_base_url("ws://127.0.0.1:5000/ws").as_deref(),
            Some("http://127.0.0.1:5000")
        );
        assert_eq!(
            http_base_url("wss://relay.example?x=1").as_deref(),
            Some("https://relay.example")
        );
        assert_eq!(http_base_url("http://127.0.0.1/ws"), None);
        assert_eq!(http_base_url("ws:///ws"), None);
    }
}
