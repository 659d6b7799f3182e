//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{
        HeaderMap, HeaderName, StatusCode,
        header::{AUTHORIZATION, COOKIE},
    },
    response::{IntoResponse, Response},
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::{
    domain::{ChatMessage, DeliveryOutcome, RoomId, UserId, UserProfile, ValueObjectError},
    infrastructure::dto::websocket::{ClientEvent, UserRef},
    ui::state::AppState,
    usecase::{RelayError, SessionCredentials, SignalError},
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    #[serde(rename = "userId", default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

/// Why an inbound frame was dropped.
#[derive(Debug, Error)]
enum InboundError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid payload: {0}")]
    Payload(#[from] ValueObjectError),

    #[error(transparent)]
    Signal(#[from] SignalError),

    #[error(transparent)]
    Relay(#[from] RelayError),
}

/// Authenticates the connection attempt, then upgrades it.
///
/// Rejected attempts get `401` with the reason as body and are never upgraded.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
    headers: HeaderMap,
) -> Response {
    let credentials = SessionCredentials {
        query_token: query.token,
        authorization: header_value(&headers, AUTHORIZATION),
        cookie: header_value(&headers, COOKIE),
    };
    let claimed_user_id = query.user_id.unwrap_or_default();

    match state
        .authenticate_session_usecase
        .execute(&claimed_user_id, &credentials)
        .await
    {
        Ok(profile) => {
            tracing::info!("User '{}' authenticated, upgrading", profile.id);
            ws.on_upgrade(move |socket| handle_socket(socket, state, profile))
        }
        Err(e) => {
            tracing::warn!("Rejected connection for '{}': {}", claimed_user_id, e);
            (StatusCode::UNAUTHORIZED, e.to_string()).into_response()
        }
    }
}

fn header_value(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Spawns a task that drains the connection's outbound channel into the WebSocket.
///
/// The task ends when the channel closes, which happens when the registry drops the
/// handle because a newer connection of the same user replaced it.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, profile: UserProfile) {
    let (sender, mut receiver) = socket.split();
    let user_id = profile.id.clone();

    let (tx, rx) = mpsc::unbounded_channel();
    let connection_id = state
        .connect_user_usecase
        .execute(user_id.clone(), tx)
        .await;
    tracing::info!("User '{}' connected ({})", user_id, connection_id);

    let state_clone = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error from '{}': {}", profile.id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    if let Err(e) = dispatch(&state_clone, &profile, text.as_str()).await {
                        tracing::warn!("Dropped frame from '{}': {}", profile.id, e);
                    }
                }
                Message::Close(_) => {
                    tracing::info!("User '{}' requested close", profile.id);
                    break;
                }
                _ => {}
            }
        }
    });

    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    if state
        .disconnect_user_usecase
        .execute(&user_id, connection_id)
        .await
    {
        tracing::info!("User '{}' disconnected ({})", user_id, connection_id);
    }
}

/// Routes one inbound frame to its use case.
async fn dispatch(
    state: &AppState,
    profile: &UserProfile,
    text: &str,
) -> Result<DeliveryOutcome, InboundError> {
    let event: ClientEvent = serde_json::from_str(text)?;
    tracing::debug!("'{}' sent {}", profile.id, event.name());

    let outcome = match event {
        ClientEvent::CallUser(payload) => {
            let (to, room_id) = parse_target(&payload.to, &payload.room_id)?;
            let caller = caller_card(profile, payload.from.into());
            state
                .call_signaling_usecase
                .call_user(&caller, to, room_id)
                .await?
        }
        ClientEvent::CallJoined(payload) => {
            let (to, room_id) = parse_target(&payload.to, &payload.room_id)?;
            state
                .call_signaling_usecase
                .call_joined(&profile.id, to, room_id)
                .await?
        }
        ClientEvent::EndCall(payload) => {
            let (to, room_id) = parse_target(&payload.to, &payload.room_id)?;
            state
                .call_signaling_usecase
                .end_call(&profile.id, to, room_id)
                .await?
        }
        ClientEvent::SendMessage(mut payload) => {
            // The sender is the session's user whatever the frame says.
            payload.sender_id = profile.id.to_string();
            if payload.sender_name.trim().is_empty() {
                payload.sender_name = profile.name.clone();
            }
            let message = ChatMessage::try_from(payload)?;
            state
                .relay_message_usecase
                .execute(&profile.id, message)
                .await?
        }
    };
    Ok(outcome)
}

fn parse_target(to: &str, room_id: &str) -> Result<(UserId, RoomId), ValueObjectError> {
    Ok((UserId::try_from(to)?, RoomId::parse(room_id)?))
}

/// Caller card shown on the peer's incoming-call notice.
///
/// A directory profile wins. When the directory only knows the bare id, the
/// client-supplied card is used with its id forced to the authenticated one.
fn caller_card(session: &UserProfile, claimed: UserRef) -> UserProfile {
    if session.name != session.id.as_str() {
        return session.clone();
    }
    match UserProfile::try_from(claimed) {
        Ok(mut card) => {
            card.id = session.id.clone();
            card
        }
        Err(_) => session.clone(),
    }
}
