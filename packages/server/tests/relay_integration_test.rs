//! Integration tests for the relay server.
//!
//! The router is served in-process on an ephemeral port and driven with real
//! WebSocket clients.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use swaphere_server::{
    domain::{UserId, UserProfile},
    infrastructure::{
        auth::JwtTokenVerifier, directory::InMemoryUserDirectory,
        message_pusher::WebSocketMessagePusher, registry::InMemoryConnectionRegistry,
    },
    ui::Server,
    usecase::{
        AuthenticateSessionUseCase, CallSignalingUseCase, ConnectUserUseCase,
        DisconnectUserUseCase, GetPresenceUseCase, RelayMessageUseCase,
    },
};
use swaphere_shared::time::now_utc_millis;
use tokio::{net::TcpStream, task::JoinHandle};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{self, Message, client::IntoClientRequest},
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const SECRET: &[u8] = b"integration-secret";

/// Relay server running on a background task
struct TestServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
    issuer: JwtTokenVerifier,
}

impl TestServer {
    async fn start() -> Self {
        Self::start_with(false).await
    }

    async fn start_with(notify_unreachable: bool) -> Self {
        let profiles = ["u1", "u2", "u3"].map(|id| {
            let mut profile = UserProfile::new(
                UserId::try_from(id).unwrap(),
                format!("User {}", id.to_uppercase()),
            );
            profile.profession = Some("Engineer".to_string());
            profile
        });
        let directory = Arc::new(InMemoryUserDirectory::new(profiles));

        let registry = Arc::new(InMemoryConnectionRegistry::new());
        let message_pusher = Arc::new(WebSocketMessagePusher::new(registry.clone()));
        let server = Server::new(
            Arc::new(AuthenticateSessionUseCase::new(
                Arc::new(JwtTokenVerifier::new(SECRET)),
                directory,
            )),
            Arc::new(ConnectUserUseCase::new(registry.clone())),
            Arc::new(DisconnectUserUseCase::new(registry.clone())),
            Arc::new(CallSignalingUseCase::new(
                message_pusher.clone(),
                notify_unreachable,
            )),
            Arc::new(RelayMessageUseCase::new(message_pusher)),
            Arc::new(GetPresenceUseCase::new(registry)),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let _ = server.serve(listener).await;
        });

        TestServer {
            addr,
            handle,
            issuer: JwtTokenVerifier::new(SECRET),
        }
    }

    fn token(&self, user_id: &str) -> String {
        self.issuer
            .issue(&UserId::try_from(user_id).unwrap(), Duration::from_secs(3600))
            .unwrap()
    }

    fn ws_url(&self, user_id: &str, token: &str) -> String {
        format!("ws://{}/ws?userId={}&token={}", self.addr, user_id, token)
    }

    fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Connects with a valid token and waits until the registry lists the user.
    async fn connect(&self, user_id: &str) -> WsStream {
        let (ws, _) = connect_async(self.ws_url(user_id, &self.token(user_id)))
            .await
            .unwrap();
        self.wait_for_presence(user_id, true).await;
        ws
    }

    /// Expects the upgrade to be refused and returns the HTTP status.
    async fn connect_rejected(&self, url: String) -> u16 {
        match connect_async(url).await {
            Err(tungstenite::Error::Http(response)) => response.status().as_u16(),
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("connection was accepted"),
        }
    }

    async fn presence(&self, user_id: &str) -> bool {
        let body: Value = reqwest::get(self.http_url(&format!("/api/presence/{}", user_id)))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        body["online"].as_bool().unwrap()
    }

    async fn wait_for_presence(&self, user_id: &str, online: bool) {
        for _ in 0..100 {
            if self.presence(user_id).await == online {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("'{}' never became online={}", user_id, online);
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn send_event(ws: &mut WsStream, event: &str, data: Value) {
    let frame = json!({"event": event, "data": data}).to_string();
    ws.send(Message::Text(frame.into())).await.unwrap();
}

/// Next text frame as JSON, failing after two seconds.
async fn recv_event(ws: &mut WsStream) -> Value {
    let deadline = Duration::from_secs(2);
    loop {
        let msg = tokio::time::timeout(deadline, ws.next())
            .await
            .expect("timed out waiting for an event")
            .expect("stream ended")
            .unwrap();
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn assert_silent(ws: &mut WsStream) {
    let next = tokio::time::timeout(Duration::from_millis(200), ws.next()).await;
    assert!(next.is_err(), "unexpected frame: {:?}", next);
}

#[tokio::test]
async fn test_full_call_and_chat_flow() {
    // テスト項目: 発信、応答、チャット、終了が相手に順に届く
    // given (前提条件):
    let server = TestServer::start().await;
    let mut u1 = server.connect("u1").await;
    let mut u2 = server.connect("u2").await;

    // when (操作): u1 が u2 に発信する
    send_event(
        &mut u1,
        "call-user",
        json!({"from": {"id": "u1", "name": "spoofed"}, "to": "u2", "roomId": "u1:u2"}),
    )
    .await;

    // then (期待する結果): u2 にディレクトリのプロフィール付きで incoming-call が届く
    let incoming = recv_event(&mut u2).await;
    assert_eq!(incoming["event"], "incoming-call");
    assert_eq!(incoming["data"]["from"]["id"], "u1");
    assert_eq!(incoming["data"]["from"]["name"], "User U1");
    assert_eq!(incoming["data"]["roomId"], "u1:u2");

    // when (操作): u2 が応答する
    send_event(
        &mut u2,
        "call-joined",
        json!({"from": "u2", "to": "u1", "roomId": "u1:u2"}),
    )
    .await;

    // then (期待する結果):
    let accepted = recv_event(&mut u1).await;
    assert_eq!(accepted["event"], "call-accepted");
    assert_eq!(accepted["data"]["from"], "u2");

    // when (操作): u1 がメッセージを送る
    send_event(
        &mut u1,
        "send-message",
        json!({
            "senderId": "u1",
            "senderName": "User U1",
            "text": "hi",
            "timestamp": "2024-05-01T10:00:00.000Z",
            "roomId": "u1:u2"
        }),
    )
    .await;

    // then (期待する結果):
    let message = recv_event(&mut u2).await;
    assert_eq!(message["event"], "message");
    assert_eq!(message["data"]["text"], "hi");
    assert_eq!(message["data"]["senderId"], "u1");

    // when (操作): u2 が終了する
    send_event(
        &mut u2,
        "end-call",
        json!({"from": "u2", "to": "u1", "roomId": "u1:u2"}),
    )
    .await;

    // then (期待する結果):
    let ended = recv_event(&mut u1).await;
    assert_eq!(ended["event"], "call-ended");
    assert_eq!(ended["data"]["roomId"], "u1:u2");
    assert_silent(&mut u2).await;
}

#[tokio::test]
async fn test_minimal_payloads_are_relayed() {
    // テスト項目: from が ID だけの発信や、本文とルーム ID だけのメッセージも中継される
    // given (前提条件):
    let server = TestServer::start().await;
    let mut u1 = server.connect("u1").await;
    let mut u2 = server.connect("u2").await;

    // when (操作):
    send_event(
        &mut u1,
        "call-user",
        json!({"from": "u1", "to": "u2", "roomId": "u1:u2"}),
    )
    .await;
    send_event(&mut u1, "send-message", json!({"text": "hi", "roomId": "u1:u2"})).await;

    // then (期待する結果): 送信者とタイムスタンプはサーバーが補う
    let incoming = recv_event(&mut u2).await;
    assert_eq!(incoming["event"], "incoming-call");
    assert_eq!(incoming["data"]["from"]["id"], "u1");
    assert_eq!(incoming["data"]["from"]["name"], "User U1");

    let message = recv_event(&mut u2).await;
    assert_eq!(message["event"], "message");
    assert_eq!(message["data"]["text"], "hi");
    assert_eq!(message["data"]["senderId"], "u1");
    assert_eq!(message["data"]["senderName"], "User U1");
    assert!(message["data"]["timestamp"].is_string());
}

#[tokio::test]
async fn test_call_to_offline_user_delivers_nothing() {
    // テスト項目: オフラインのユーザーへの発信は何も届かず、サーバーは動き続ける
    // given (前提条件):
    let server = TestServer::start().await;
    let mut u1 = server.connect("u1").await;

    // when (操作):
    send_event(
        &mut u1,
        "call-user",
        json!({"from": {"id": "u1", "name": "Ada"}, "to": "u3", "roomId": "u1:u3"}),
    )
    .await;

    // then (期待する結果):
    assert_silent(&mut u1).await;
    let health: Value = reqwest::get(server.http_url("/api/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_call_after_peer_disconnects_is_dropped() {
    // テスト項目: 切断したユーザーへの発信は何も届かず、エラーにもならない
    // given (前提条件):
    let server = TestServer::start().await;
    let mut u1 = server.connect("u1").await;
    let mut u2 = server.connect("u2").await;
    u1.close(None).await.unwrap();
    server.wait_for_presence("u1", false).await;

    // when (操作):
    send_event(
        &mut u2,
        "call-user",
        json!({"from": {"id": "u2", "name": "Grace"}, "to": "u1", "roomId": "u1:u2"}),
    )
    .await;

    // then (期待する結果):
    assert_silent(&mut u2).await;
    assert!(server.presence("u2").await);
}

#[tokio::test]
async fn test_notify_unreachable_reports_to_caller() {
    // テスト項目: notify_unreachable 有効時は発信者に peer-unreachable が返る
    // given (前提条件):
    let server = TestServer::start_with(true).await;
    let mut u1 = server.connect("u1").await;

    // when (操作):
    send_event(
        &mut u1,
        "call-user",
        json!({"from": {"id": "u1", "name": "Ada"}, "to": "u2", "roomId": "u1:u2"}),
    )
    .await;

    // then (期待する結果):
    let report = recv_event(&mut u1).await;
    assert_eq!(report["event"], "peer-unreachable");
    assert_eq!(report["data"], json!({"to": "u2", "roomId": "u1:u2"}));
}

#[tokio::test]
async fn test_malformed_frames_are_skipped() {
    // テスト項目: 不正なフレームは無視され、接続は維持される
    // given (前提条件):
    let server = TestServer::start().await;
    let mut u1 = server.connect("u1").await;
    let mut u2 = server.connect("u2").await;

    // when (操作): 壊れた JSON、未知のイベント、ペアと一致しないルームを送った後に正しいメッセージを送る
    u1.send(Message::Text("not json".into())).await.unwrap();
    send_event(&mut u1, "format-disk", json!({})).await;
    send_event(
        &mut u1,
        "end-call",
        json!({"from": "u1", "to": "u2", "roomId": "u2:u3"}),
    )
    .await;
    send_event(
        &mut u1,
        "end-call",
        json!({"from": "u1", "to": "u2", "roomId": "u1:u2"}),
    )
    .await;

    // then (期待する結果): 正しいシグナルだけが届く
    let ended = recv_event(&mut u2).await;
    assert_eq!(ended["event"], "call-ended");
    assert_eq!(ended["data"]["from"], "u1");
    assert_silent(&mut u2).await;
}

#[tokio::test]
async fn test_reconnect_supersedes_previous_connection() {
    // テスト項目: 同じユーザーが再接続すると古い接続は閉じられ、新しい接続に配送される
    // given (前提条件):
    let server = TestServer::start().await;
    let mut first = server.connect("u1").await;
    let mut u2 = server.connect("u2").await;

    // when (操作):
    let mut second = server.connect("u1").await;

    // then (期待する結果): 古い接続は閉じられる
    let closed = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match first.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "superseded connection was not closed");

    // 新しい接続にだけ配送される
    send_event(
        &mut u2,
        "end-call",
        json!({"from": "u2", "to": "u1", "roomId": "u1:u2"}),
    )
    .await;
    let ended = recv_event(&mut second).await;
    assert_eq!(ended["event"], "call-ended");
    assert!(server.presence("u1").await);
}

#[tokio::test]
async fn test_authentication_rejections() {
    // テスト項目: トークンなし、偽造、期限切れ、未登録ユーザー、ID 不一致はすべて 401 で拒否される
    // given (前提条件):
    let server = TestServer::start().await;
    let forged = JwtTokenVerifier::new(b"another-secret")
        .issue(&UserId::try_from("u1").unwrap(), Duration::from_secs(3600))
        .unwrap();
    let expired = JwtTokenVerifier::new(SECRET)
        .issue_with_expiry(
            &UserId::try_from("u1").unwrap(),
            (now_utc_millis() / 1000) as u64 - 3600,
        )
        .unwrap();
    let unknown = server.token("ghost");

    // when (操作):
    // then (期待する結果):
    assert_eq!(
        server
            .connect_rejected(format!("ws://{}/ws?userId=u1", server.addr))
            .await,
        401
    );
    assert_eq!(server.connect_rejected(server.ws_url("u1", &forged)).await, 401);
    assert_eq!(server.connect_rejected(server.ws_url("u1", &expired)).await, 401);
    assert_eq!(server.connect_rejected(server.ws_url("ghost", &unknown)).await, 401);
    assert_eq!(
        server
            .connect_rejected(server.ws_url("u2", &server.token("u1")))
            .await,
        401
    );
    assert!(!server.presence("u1").await);
}

#[tokio::test]
async fn test_token_from_authorization_header() {
    // テスト項目: Authorization ヘッダーのトークンで接続できる
    // given (前提条件):
    let server = TestServer::start().await;
    let mut request = format!("ws://{}/ws?userId=u3", server.addr)
        .into_client_request()
        .unwrap();
    request.headers_mut().insert(
        "Authorization",
        format!("Bearer {}", server.token("u3")).parse().unwrap(),
    );

    // when (操作):
    let result = connect_async(request).await;

    // then (期待する結果):
    assert!(result.is_ok());
    server.wait_for_presence("u3", true).await;
}

#[tokio::test]
async fn test_presence_endpoints() {
    // テスト項目: オンライン一覧は ID 順に返り、不正な ID は 400 になる
    // given (前提条件):
    let server = TestServer::start().await;
    let _u2 = server.connect("u2").await;
    let _u1 = server.connect("u1").await;

    // when (操作):
    let online: Value = reqwest::get(server.http_url("/api/presence"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let invalid = reqwest::get(server.http_url("/api/presence/bad%20id"))
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(online, json!({"online": ["u1", "u2"]}));
    assert_eq!(invalid.status().as_u16(), 400);
    assert!(!server.presence("u3").await);
}
